use thiserror::Error;

use crate::{FaceId, VertexId};

pub type Result<T> = std::result::Result<T, MeshError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MeshError {
    #[error("vertex array has {0} values, which is not a multiple of 3")]
    VertexArrayLength(usize),

    #[error("face array has {0} values, which is not a multiple of 3")]
    FaceArrayLength(usize),

    #[error("face {face} references vertex {index} but the mesh only has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: i64,
        vertex_count: usize,
    },

    #[error("vertex {0} is not part of the mesh")]
    DeadVertex(VertexId),

    #[error("face {0} is not part of the mesh")]
    DeadFace(FaceId),

    #[error("vertex {vertex} is still referenced by {faces} faces")]
    VertexInUse { vertex: VertexId, faces: usize },

    #[error("cannot collapse vertex {0} onto itself")]
    DegenerateCollapse(VertexId),

    #[error("mesh has more {0} than u32 handles can address")]
    TooLarge(&'static str),

    /// The reindexing was built before the vertex set last changed.
    #[error("reindexing built at mesh revision {built} used at revision {current}")]
    StaleReindexing { built: u64, current: u64 },
}
