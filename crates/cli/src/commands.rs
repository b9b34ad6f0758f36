use std::fs;
use std::io::Write;

use anyhow::Context;
use log::{error, info, warn};
use meshbridge::{dispatch, DispatchError, ParameterBag, Registry, Request, ResultPayload};

use crate::args::{RunArgs, StlArgs};

pub fn list_command<W: Write>(registry: &Registry, out: &mut W) -> anyhow::Result<()> {
    for name in registry.names() {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

/// Returns `false` when the request itself failed; the error report is still
/// written where the result would have gone.
pub fn run_command<W: Write>(
    registry: &Registry,
    args: RunArgs,
    out: &mut W,
) -> anyhow::Result<bool> {
    let json = fs::read_to_string(&args.request_path)
        .with_context(|| format!("reading {}", args.request_path.display()))?;
    let request = Request::from_json(&json)
        .with_context(|| format!("parsing {}", args.request_path.display()))?;

    let (body, ok) = match dispatch(registry, request) {
        Ok(payload) => (serde_json::to_string_pretty(&payload)?, true),
        Err(err) => {
            report(&err);
            (serde_json::to_string_pretty(&err.report())?, false)
        }
    };

    match args.output {
        Some(path) => fs::write(&path, body + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => writeln!(out, "{}", body)?,
    }
    Ok(ok)
}

pub fn stl_command<W: Write>(
    registry: &Registry,
    args: StlArgs,
    out: &mut W,
) -> anyhow::Result<bool> {
    let mesh = meshbridge_stl::read_stl(&args.stl_path)
        .with_context(|| format!("reading {}", args.stl_path.display()))?;
    info!(
        "{}: {} vertices, {} faces",
        args.stl_path.display(),
        mesh.vertex_count(),
        mesh.face_count()
    );

    let request = Request {
        operation: args.operation,
        parameters: args.params.into_iter().collect::<ParameterBag>(),
        mesh: Some(mesh.into()),
    };
    let payload = match dispatch(registry, request) {
        Ok(payload) => payload,
        Err(err) => {
            report(&err);
            writeln!(out, "{}", serde_json::to_string_pretty(&err.report())?)?;
            return Ok(false);
        }
    };

    summarize(&payload, out)?;
    if let Some(mesh) = payload.mesh() {
        match &args.output {
            Some(path) => {
                meshbridge_stl::write_stl(path, mesh)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("wrote {}", path.display());
            }
            None => warn!("result carries a mesh; pass --output to save it"),
        }
    }
    Ok(true)
}

fn report(err: &DispatchError) {
    error!("{} request failed: {}", err.kind(), err);
}

// Everything but the bulky arrays.
fn summarize<W: Write>(payload: &ResultPayload, out: &mut W) -> anyhow::Result<()> {
    let tags: Vec<String> = payload
        .tags()
        .iter()
        .map(|t| serde_json::to_string(t).map(|s| s.trim_matches('"').to_string()))
        .collect::<Result<_, _>>()?;
    writeln!(out, "output_tag: {}", tags.join(", "))?;
    if let Some(text) = payload.result_text() {
        writeln!(out, "{}", text)?;
    }
    if let Some(mesh) = payload.mesh() {
        writeln!(
            out,
            "mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        )?;
    }
    if let Some(colors) = payload.colors() {
        writeln!(out, "colors: {} faces", colors.len() / 4)?;
    }
    Ok(())
}
