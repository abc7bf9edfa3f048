//! Error types for gateway operations

use thiserror::Error;

use crate::{NodeId, SceneId};

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while talking to a KLF-200
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Could not reach or authenticate with the gateway
    #[error("connection to gateway at {host} failed: {reason}")]
    Connection { host: String, reason: String },

    /// An operation was attempted before the transport was connected
    #[error("gateway is not connected")]
    NotConnected,

    /// Loading scene or node metadata from the gateway failed
    #[error("failed to load {what} from gateway: {reason}")]
    LoadFailed { what: &'static str, reason: String },

    /// A command was rejected or lost on the wire
    #[error("gateway command failed: {reason}")]
    CommandFailed { reason: String },

    /// Referenced scene is not known to the gateway
    #[error("scene {0} not found on gateway")]
    SceneNotFound(SceneId),

    /// Referenced node is not known to the gateway
    #[error("node {0} not found on gateway")]
    NodeNotFound(NodeId),

    /// Disconnect did not complete cleanly
    #[error("gateway disconnect failed: {reason}")]
    DisconnectFailed { reason: String },
}
