//! Gateway facade: connection state plus cached scene and node tables

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::{GatewayError, GatewayResult, GatewayTransport, Node, NodeId, Position, Scene, SceneId};

/// Connection settings for a KLF-200
///
/// Both fields are required; the gateway refuses unauthenticated sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Network address of the gateway (hostname or IP)
    pub host: String,

    /// Gateway password (printed on the device label)
    pub password: String,
}

impl GatewayConfig {
    /// Create a new gateway configuration
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
        }
    }
}

/// Facade over a KLF-200 connection
///
/// Owns the transport and caches the scene and node tables loaded from the
/// device. One `Gateway` is shared by every consumer; loading is driven
/// externally (by the connection guard), reads hand out clones of the
/// cached tables.
pub struct Gateway {
    config: GatewayConfig,
    transport: Arc<dyn GatewayTransport>,
    connected: AtomicBool,
    scenes: RwLock<Vec<Scene>>,
    nodes: RwLock<Vec<Node>>,
}

impl Gateway {
    /// Create a gateway facade; does not touch the network
    pub fn new(config: GatewayConfig, transport: Arc<dyn GatewayTransport>) -> Self {
        Self {
            config,
            transport,
            connected: AtomicBool::new(false),
            scenes: RwLock::new(Vec::new()),
            nodes: RwLock::new(Vec::new()),
        }
    }

    /// The configured gateway host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Whether the transport session is currently open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open the transport session if it is not open already
    pub async fn connect(&self) -> GatewayResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.transport.connect(&self.config).await?;
        self.connected.store(true, Ordering::SeqCst);
        debug!(host = %self.config.host, "gateway session opened");
        Ok(())
    }

    /// Close the transport session
    ///
    /// Safe to call when never connected; the transport contract requires
    /// disconnect to tolerate that.
    pub async fn disconnect(&self) -> GatewayResult<()> {
        self.transport.disconnect().await?;
        self.connected.store(false, Ordering::SeqCst);
        debug!(host = %self.config.host, "gateway session closed");
        Ok(())
    }

    /// Load the scene table from the gateway into the cache
    pub async fn load_scenes(&self) -> GatewayResult<()> {
        self.require_connected()?;
        let scenes = self.transport.fetch_scenes().await?;
        debug!(count = scenes.len(), "loaded scenes from gateway");
        *self.scenes.write().await = scenes;
        Ok(())
    }

    /// Load the node table from the gateway into the cache
    pub async fn load_nodes(&self) -> GatewayResult<()> {
        self.require_connected()?;
        let nodes = self.transport.fetch_nodes().await?;
        debug!(count = nodes.len(), "loaded nodes from gateway");
        *self.nodes.write().await = nodes;
        Ok(())
    }

    /// Cached scene table
    pub async fn scenes(&self) -> Vec<Scene> {
        self.scenes.read().await.clone()
    }

    /// Cached node table
    pub async fn nodes(&self) -> Vec<Node> {
        self.nodes.read().await.clone()
    }

    /// Activate a scene by id
    pub async fn run_scene(&self, scene: SceneId, wait_for_completion: bool) -> GatewayResult<()> {
        self.require_connected()?;
        if !self.scenes.read().await.iter().any(|s| s.id == scene) {
            return Err(GatewayError::SceneNotFound(scene));
        }
        self.transport.activate_scene(scene, wait_for_completion).await
    }

    /// Drive a node to a target position
    pub async fn set_position(&self, node: NodeId, position: Position) -> GatewayResult<()> {
        self.require_connected()?;
        if !self.nodes.read().await.iter().any(|n| n.id == node) {
            return Err(GatewayError::NodeNotFound(node));
        }
        self.transport.set_node_position(node, position).await?;
        // Keep the cache in step with what we just commanded.
        let mut nodes = self.nodes.write().await;
        if let Some(cached) = nodes.iter_mut().find(|n| n.id == node) {
            cached.position = position;
        }
        Ok(())
    }

    /// Stop a node mid-travel
    pub async fn stop_node(&self, node: NodeId) -> GatewayResult<()> {
        self.require_connected()?;
        if !self.nodes.read().await.iter().any(|n| n.id == node) {
            return Err(GatewayError::NodeNotFound(node));
        }
        self.transport.stop_node(node).await
    }

    fn require_connected(&self) -> GatewayResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(GatewayError::NotConnected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// In-memory transport recording how often each call happened
    struct FakeTransport {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        scene_runs: AtomicUsize,
        fail_connect: bool,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                connects: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
                scene_runs: AtomicUsize::new(0),
                fail_connect: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_connect: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl GatewayTransport for FakeTransport {
        async fn connect(&self, config: &GatewayConfig) -> GatewayResult<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect {
                return Err(GatewayError::Connection {
                    host: config.host.clone(),
                    reason: "host unreachable".into(),
                });
            }
            Ok(())
        }

        async fn disconnect(&self) -> GatewayResult<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_scenes(&self) -> GatewayResult<Vec<Scene>> {
            Ok(vec![
                Scene::new(SceneId(0), "All Windows Closed"),
                Scene::new(SceneId(1), "Ventilate"),
            ])
        }

        async fn fetch_nodes(&self) -> GatewayResult<Vec<Node>> {
            Ok(vec![Node::new(NodeId(3), "Kitchen Window", Position::OPEN)])
        }

        async fn activate_scene(&self, _scene: SceneId, _wait: bool) -> GatewayResult<()> {
            self.scene_runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn set_node_position(&self, _node: NodeId, _position: Position) -> GatewayResult<()> {
            Ok(())
        }

        async fn stop_node(&self, _node: NodeId) -> GatewayResult<()> {
            Ok(())
        }
    }

    fn gateway(transport: Arc<FakeTransport>) -> Gateway {
        Gateway::new(GatewayConfig::new("klf200.local", "velux123"), transport)
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let transport = Arc::new(FakeTransport::new());
        let gw = gateway(transport.clone());

        gw.connect().await.unwrap();
        gw.connect().await.unwrap();

        assert!(gw.is_connected());
        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_disconnected() {
        let transport = Arc::new(FakeTransport::failing());
        let gw = gateway(transport);

        let err = gw.connect().await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection { .. }));
        assert!(!gw.is_connected());
    }

    #[tokio::test]
    async fn test_load_requires_connection() {
        let gw = gateway(Arc::new(FakeTransport::new()));

        assert_eq!(gw.load_scenes().await, Err(GatewayError::NotConnected));
        assert_eq!(gw.load_nodes().await, Err(GatewayError::NotConnected));
    }

    #[tokio::test]
    async fn test_load_populates_caches() {
        let gw = gateway(Arc::new(FakeTransport::new()));
        gw.connect().await.unwrap();

        gw.load_scenes().await.unwrap();
        gw.load_nodes().await.unwrap();

        assert_eq!(gw.scenes().await.len(), 2);
        assert_eq!(gw.nodes().await[0].name, "Kitchen Window");
    }

    #[tokio::test]
    async fn test_run_scene_unknown_id() {
        let gw = gateway(Arc::new(FakeTransport::new()));
        gw.connect().await.unwrap();
        gw.load_scenes().await.unwrap();

        let err = gw.run_scene(SceneId(9), false).await.unwrap_err();
        assert_eq!(err, GatewayError::SceneNotFound(SceneId(9)));
    }

    #[tokio::test]
    async fn test_run_scene_known_id() {
        let transport = Arc::new(FakeTransport::new());
        let gw = gateway(transport.clone());
        gw.connect().await.unwrap();
        gw.load_scenes().await.unwrap();

        gw.run_scene(SceneId(1), false).await.unwrap();
        assert_eq!(transport.scene_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_set_position_updates_cache() {
        let gw = gateway(Arc::new(FakeTransport::new()));
        gw.connect().await.unwrap();
        gw.load_nodes().await.unwrap();

        gw.set_position(NodeId(3), Position::new(40)).await.unwrap();
        assert_eq!(gw.nodes().await[0].position, Position::new(40));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect() {
        let transport = Arc::new(FakeTransport::new());
        let gw = gateway(transport.clone());

        gw.disconnect().await.unwrap();
        assert_eq!(transport.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_position_clamped() {
        assert_eq!(Position::new(250).percent_closed(), 100);
        assert!(Position::new(250).is_closed());
        assert_eq!(Position::OPEN.percent_closed(), 0);
    }
}
