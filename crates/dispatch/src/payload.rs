use meshbridge_mesh::MeshDescriptor;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// What the host is asked to do with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTag {
    Message,
    ReplaceMesh,
    AddMesh,
    FaceColoration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Show `result_text` to the user.
    Message(String),
    /// Rebuild the input object from the returned arrays.
    ReplaceMesh(MeshDescriptor),
    /// Add a new object built from the returned arrays.
    AddMesh(MeshDescriptor),
    /// RGBA per face, in face order.
    FaceColoration(Vec<f32>),
}

impl Action {
    pub fn tag(&self) -> OutputTag {
        match self {
            Action::Message(_) => OutputTag::Message,
            Action::ReplaceMesh(_) => OutputTag::ReplaceMesh,
            Action::AddMesh(_) => OutputTag::AddMesh,
            Action::FaceColoration(_) => OutputTag::FaceColoration,
        }
    }
}

/// The result of one operation: a list of actions for the host.
///
/// The constructors only allow the combinations the host understands: one message,
/// or one mesh and/or one face coloration. A mesh action always comes before the
/// coloration that refers to its faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPayload {
    actions: Vec<Action>,
}

impl ResultPayload {
    pub fn message<S: Into<String>>(text: S) -> Self {
        Self {
            actions: vec![Action::Message(text.into())],
        }
    }

    pub fn replace_mesh(mesh: MeshDescriptor) -> Self {
        Self {
            actions: vec![Action::ReplaceMesh(mesh)],
        }
    }

    pub fn add_mesh(mesh: MeshDescriptor) -> Self {
        Self {
            actions: vec![Action::AddMesh(mesh)],
        }
    }

    pub fn face_coloration(colors: Vec<f32>) -> Self {
        Self::default().with_face_coloration(colors)
    }

    /// Appends a face coloration, replacing any previous one.
    pub fn with_face_coloration(mut self, colors: Vec<f32>) -> Self {
        self.actions
            .retain(|a| !matches!(a, Action::FaceColoration(_) | Action::Message(_)));
        self.actions.push(Action::FaceColoration(colors));
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn tags(&self) -> Vec<OutputTag> {
        self.actions.iter().map(Action::tag).collect()
    }

    pub fn has_tag(&self, tag: OutputTag) -> bool {
        self.actions.iter().any(|a| a.tag() == tag)
    }

    pub fn result_text(&self) -> Option<&str> {
        self.actions.iter().find_map(|a| match a {
            Action::Message(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The mesh of a `replace_mesh` or `add_mesh` action.
    pub fn mesh(&self) -> Option<&MeshDescriptor> {
        self.actions.iter().find_map(|a| match a {
            Action::ReplaceMesh(m) | Action::AddMesh(m) => Some(m),
            _ => None,
        })
    }

    pub fn colors(&self) -> Option<&[f32]> {
        self.actions.iter().find_map(|a| match a {
            Action::FaceColoration(c) => Some(c.as_slice()),
            _ => None,
        })
    }
}

impl Serialize for ResultPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("output_tag", &self.tags())?;
        for action in &self.actions {
            match action {
                Action::Message(text) => map.serialize_entry("result_text", text)?,
                Action::ReplaceMesh(mesh) | Action::AddMesh(mesh) => {
                    map.serialize_entry("vertices", &mesh.vertices)?;
                    map.serialize_entry("faces", &mesh.faces)?;
                }
                Action::FaceColoration(colors) => map.serialize_entry("colors", colors)?,
            }
        }
        map.end()
    }
}
