//! Node types: individual actuators known to the gateway

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node slot on the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u8);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actuator position as percent closed
///
/// 0 is fully open, 100 is fully closed. Values above 100 are clamped on
/// construction; the KLF-200 itself only understands this range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8")]
pub struct Position(u8);

impl Position {
    /// Fully open
    pub const OPEN: Position = Position(0);

    /// Fully closed
    pub const CLOSED: Position = Position(100);

    /// Create a position, clamping to 0..=100
    pub fn new(percent_closed: u8) -> Self {
        Self(percent_closed.min(100))
    }

    /// Percent closed, 0..=100
    pub fn percent_closed(&self) -> u8 {
        self.0
    }

    /// Whether the actuator is fully closed
    pub fn is_closed(&self) -> bool {
        self.0 == 100
    }
}

impl From<u8> for Position {
    fn from(percent: u8) -> Self {
        Self::new(percent)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A single controllable actuator (window, blind, shutter) known to the
/// gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node slot on the gateway
    pub id: NodeId,

    /// Name as registered on the gateway
    pub name: String,

    /// Last reported position
    pub position: Position,
}

impl Node {
    /// Create a new node descriptor
    pub fn new(id: NodeId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (node {})", self.name, self.id)
    }
}
