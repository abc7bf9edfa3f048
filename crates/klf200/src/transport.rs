//! Transport seam for the KLF-200 wire protocol

use async_trait::async_trait;

use crate::{GatewayConfig, GatewayResult, Node, NodeId, Position, Scene, SceneId};

/// The wire-protocol seam
///
/// Implementations own the actual KLF-200 session (SLIP-framed TLS on port
/// 51200 for the real device; in-memory doubles in tests). The [`Gateway`]
/// facade drives this trait and never touches the wire itself.
///
/// [`Gateway`]: crate::Gateway
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// Open the session and authenticate with the gateway password
    async fn connect(&self, config: &GatewayConfig) -> GatewayResult<()>;

    /// Close the session
    ///
    /// Must be safe to call on a transport that never connected.
    async fn disconnect(&self) -> GatewayResult<()>;

    /// Fetch the scene table from the gateway
    async fn fetch_scenes(&self) -> GatewayResult<Vec<Scene>>;

    /// Fetch the node table from the gateway
    async fn fetch_nodes(&self) -> GatewayResult<Vec<Node>>;

    /// Activate a scene
    ///
    /// With `wait_for_completion` false this returns once the gateway has
    /// accepted the command, not once the actuators finish moving.
    async fn activate_scene(&self, scene: SceneId, wait_for_completion: bool) -> GatewayResult<()>;

    /// Drive a node to a target position
    async fn set_node_position(&self, node: NodeId, position: Position) -> GatewayResult<()>;

    /// Stop a node mid-travel
    async fn stop_node(&self, node: NodeId) -> GatewayResult<()>;
}
