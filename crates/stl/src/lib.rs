use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use meshbridge_mesh::{MeshDescriptor, Triangle, Vector3};
use ordered_float::OrderedFloat;

const HEADER: &[u8] = b"meshbridge binary STL";

// Upper bound for the up-front allocation; a corrupt count must not reserve gigabytes.
const MAX_RESERVED_TRIANGLES: usize = 1 << 20;

type VertexKey = [OrderedFloat<f32>; 3];

fn read_point<T: Read>(f: &mut T) -> std::io::Result<[f32; 3]> {
    Ok([
        f.read_f32::<LittleEndian>()?,
        f.read_f32::<LittleEndian>()?,
        f.read_f32::<LittleEndian>()?,
    ])
}

fn read_binary<T: Read + Seek>(f: &mut T) -> std::io::Result<MeshDescriptor> {
    // Binary files start with an 80 byte header. There is no defined structure for this
    // header but some implementations will stash some metadata in this header. For now
    // we'll just skip the header and load the geometry.
    f.seek(std::io::SeekFrom::Start(80))?;

    // Immediately following the header is an unsigned 32-bit integer that indicates the
    // number of triangles that follow.
    let n_triangles = f.read_u32::<LittleEndian>()? as usize;

    // STL repeats every corner in each triangle that uses it. Corners with bit-identical
    // coordinates are welded into one vertex so the faces share indices again.
    let mut index: HashMap<VertexKey, u32> = HashMap::new();
    let mut mesh = MeshDescriptor::new(
        Vec::new(),
        Vec::with_capacity(n_triangles.min(MAX_RESERVED_TRIANGLES) * 3),
    );
    for _ in 0..n_triangles {
        // The stored normal is ignored; corners are expected in counter-clockwise order
        // and the normal may well be (0, 0, 0).
        let _normal = read_point(f)?;
        for _ in 0..3 {
            let p = read_point(f)?;
            let key = p.map(OrderedFloat);
            let i = *index.entry(key).or_insert_with(|| {
                mesh.vertices.extend(p.map(f64::from));
                (mesh.vertices.len() / 3 - 1) as u32
            });
            mesh.faces.push(i);
        }
        // After the triangle geometry there is a 2-byte unsigned integer called the
        // "attribute byte count". There is no standard structure of this field, but
        // some applications use this for color data.
        let _attribute_byte_count = f.read_u16::<LittleEndian>()?;
    }
    debug!(
        "read {} triangles, {} distinct vertices",
        n_triangles,
        mesh.vertex_count()
    );
    Ok(mesh)
}

fn write_binary<T: Write>(f: &mut T, mesh: &MeshDescriptor) -> std::io::Result<()> {
    mesh.validate()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let mut header = [0u8; 80];
    header[..HEADER.len()].copy_from_slice(HEADER);
    f.write_all(&header)?;
    f.write_u32::<LittleEndian>(mesh.face_count() as u32)?;

    let point = |i: u32| {
        let p = &mesh.vertices[i as usize * 3..i as usize * 3 + 3];
        Vector3::new(p[0], p[1], p[2])
    };
    for face in mesh.faces.chunks_exact(3) {
        let triangle = Triangle {
            p0: point(face[0]),
            p1: point(face[1]),
            p2: point(face[2]),
        };
        let normal = triangle.normal().unwrap_or(Vector3::new(0.0, 0.0, 0.0));
        for v in [normal, triangle.p0, triangle.p1, triangle.p2] {
            f.write_f32::<LittleEndian>(v.x as f32)?;
            f.write_f32::<LittleEndian>(v.y as f32)?;
            f.write_f32::<LittleEndian>(v.z as f32)?;
        }
        f.write_u16::<LittleEndian>(0)?;
    }
    Ok(())
}

pub fn read_stl<P: AsRef<Path>>(p: P) -> std::io::Result<MeshDescriptor> {
    let mut f = std::io::BufReader::new(std::fs::File::open(p)?);
    read_binary(&mut f)
}

pub fn parse_stl(data: &[u8]) -> std::io::Result<MeshDescriptor> {
    let mut c = std::io::Cursor::new(data);
    read_binary(&mut c)
}

/// Writes `mesh` as binary STL with a computed normal per facet.
///
/// Coordinates are narrowed to `f32`. Fails with `InvalidInput` when a face index
/// is out of range.
pub fn write_stl<P: AsRef<Path>>(p: P, mesh: &MeshDescriptor) -> std::io::Result<()> {
    let mut f = std::io::BufWriter::new(std::fs::File::create(p)?);
    write_binary(&mut f, mesh)?;
    f.flush()
}

pub trait StlReader: Read {
    fn read_stl(&mut self) -> std::io::Result<MeshDescriptor>;
}

impl<T: Read + Seek> StlReader for T {
    fn read_stl(&mut self) -> std::io::Result<MeshDescriptor> {
        read_binary(self)
    }
}

pub trait StlWriter: Write {
    fn write_stl(&mut self, mesh: &MeshDescriptor) -> std::io::Result<()>;
}

impl<T: Write> StlWriter for T {
    fn write_stl(&mut self, mesh: &MeshDescriptor) -> std::io::Result<()> {
        write_binary(self, mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_bytes(corners: [[f32; 3]; 3]) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        for x in [0.0f32; 3].iter().chain(corners.iter().flatten()) {
            out.write_f32::<LittleEndian>(*x).unwrap();
        }
        out.write_u16::<LittleEndian>(0).unwrap();
        out
    }

    #[test]
    fn welds_shared_corners() {
        let mut data = vec![0u8; 80];
        data.write_u32::<LittleEndian>(2).unwrap();
        data.extend(triangle_bytes([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]));
        data.extend(triangle_bytes([[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]));

        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(&mesh.vertices[9..], &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn truncated_input() {
        let mut data = vec![0u8; 80];
        data.write_u32::<LittleEndian>(1).unwrap();
        data.extend(&[0u8; 20]);
        let err = parse_stl(&data).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn writes_facet_normals() {
        let mesh = MeshDescriptor::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        );
        let mut out: Vec<u8> = Vec::new();
        out.write_stl(&mesh).unwrap();
        assert_eq!(out.len(), 84 + 50);
        assert_eq!(&out[..HEADER.len()], HEADER);

        let mut c = std::io::Cursor::new(&out[84..96]);
        assert_eq!(read_point(&mut c).unwrap(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_out_of_range_faces() {
        let mesh = MeshDescriptor::new(vec![0.0; 9], vec![0, 1, 5]);
        let mut out: Vec<u8> = Vec::new();
        let err = out.write_stl(&mesh).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
