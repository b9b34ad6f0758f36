use std::path::PathBuf;

use clap::{Parser, Subcommand};
use meshbridge::ParamValue;

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// JSON request with `operation`, `parameters` and optionally `vertices`/`faces`.
    pub request_path: PathBuf,

    /// Write the JSON result here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct StlArgs {
    pub stl_path: PathBuf,

    #[arg(long)]
    pub operation: String,

    /// Operation parameter as `key=value`. May be repeated.
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, ParamValue)>,

    /// Output path for a returned mesh.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the registered operations.
    List,
    /// Dispatch a JSON request.
    Run(RunArgs),
    /// Dispatch an operation over a binary STL file.
    Stl(StlArgs),
}

/// Reads a literal as a bool, then an integer, then a float, else as text.
pub fn parse_literal(s: &str) -> ParamValue {
    if let Ok(b) = s.parse::<bool>() {
        ParamValue::Bool(b)
    } else if let Ok(i) = s.parse::<i64>() {
        ParamValue::Integer(i)
    } else if let Ok(x) = s.parse::<f64>() {
        ParamValue::Float(x)
    } else {
        ParamValue::Text(s.to_string())
    }
}

pub fn parse_param(s: &str) -> Result<(String, ParamValue), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), parse_literal(value))),
        _ => Err(format!("expected key=value, got `{}`", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(parse_literal("true"), ParamValue::Bool(true));
        assert_eq!(parse_literal("5"), ParamValue::Integer(5));
        assert_eq!(parse_literal("0.25"), ParamValue::Float(0.25));
        assert_eq!(parse_literal("SEGMENTS_COLOR"), ParamValue::from("SEGMENTS_COLOR"));
    }

    #[test]
    fn params() {
        assert_eq!(
            parse_param("clusters=4"),
            Ok(("clusters".to_string(), ParamValue::Integer(4)))
        );
        assert_eq!(
            parse_param("expr=a=b"),
            Ok(("expr".to_string(), ParamValue::from("a=b")))
        );
        assert!(parse_param("clusters").is_err());
        assert!(parse_param("=4").is_err());
    }

    #[test]
    fn command_line() {
        let args = Args::try_parse_from([
            "meshbridge",
            "-v",
            "stl",
            "cube.stl",
            "--operation",
            "segmentation",
            "-p",
            "clusters=3",
            "-p",
            "smoothness=0.3",
        ])
        .unwrap();
        assert!(args.verbose);
        let Commands::Stl(stl) = args.command else {
            panic!("expected stl command");
        };
        assert_eq!(stl.operation, "segmentation");
        assert_eq!(stl.params.len(), 2);
        assert_eq!(stl.output, None);
    }
}
