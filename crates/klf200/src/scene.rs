//! Scene types: named actuator sequences stored on the gateway

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scene slot on the gateway (the KLF-200 stores up to 32)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub u8);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, pre-programmed sequence of actuator movements stored on the
/// gateway
///
/// Scenes are read-only from the hub's point of view: they are programmed
/// on the KLF-200 itself and only activated from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene slot on the gateway
    pub id: SceneId,

    /// Name as programmed on the gateway
    pub name: String,
}

impl Scene {
    /// Create a new scene descriptor
    pub fn new(id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (scene {})", self.name, self.id)
    }
}
