//! Test doubles shared by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use klf200::{
    GatewayConfig, GatewayError, GatewayResult, GatewayTransport, Node, NodeId, Position, Scene,
    SceneId,
};
use tokio::sync::watch;

/// In-memory transport with call counting, an optional failure mode, and an
/// optional gate that holds fetches open until released
pub(crate) struct MockTransport {
    scenes: Vec<Scene>,
    nodes: Vec<Node>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    scene_fetches: AtomicUsize,
    scene_activations: AtomicUsize,
    fail_fetch: bool,
    gate_tx: watch::Sender<bool>,
    gate_rx: watch::Receiver<bool>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        // Gate starts open; `gated()` closes it.
        let (gate_tx, gate_rx) = watch::channel(true);
        Self {
            scenes: vec![
                Scene::new(SceneId(0), "All Windows Closed"),
                Scene::new(SceneId(1), "Ventilate"),
            ],
            nodes: vec![
                Node::new(NodeId(3), "Kitchen Window", Position::OPEN),
                Node::new(NodeId(4), "Roof Blind", Position::CLOSED),
            ],
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            scene_fetches: AtomicUsize::new(0),
            scene_activations: AtomicUsize::new(0),
            fail_fetch: false,
            gate_tx,
            gate_rx,
        }
    }

    /// Hold every fetch open until [`release`](Self::release) is called
    pub(crate) fn gated(self) -> Self {
        let _ = self.gate_tx.send(false);
        self
    }

    /// Make scene fetching fail, simulating an unreachable gateway
    pub(crate) fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Open the gate permanently
    pub(crate) fn release(&self) {
        let _ = self.gate_tx.send(true);
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub(crate) fn scene_fetches(&self) -> usize {
        self.scene_fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn scene_activations(&self) -> usize {
        self.scene_activations.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        let mut rx = self.gate_rx.clone();
        // Wait until the gate reads open; sender lives as long as self.
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl GatewayTransport for MockTransport {
    async fn connect(&self, _config: &GatewayConfig) -> GatewayResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> GatewayResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_scenes(&self) -> GatewayResult<Vec<Scene>> {
        self.pass_gate().await;
        self.scene_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(GatewayError::LoadFailed {
                what: "scenes",
                reason: "gateway unreachable".into(),
            });
        }
        Ok(self.scenes.clone())
    }

    async fn fetch_nodes(&self) -> GatewayResult<Vec<Node>> {
        self.pass_gate().await;
        Ok(self.nodes.clone())
    }

    async fn activate_scene(&self, scene: SceneId, _wait: bool) -> GatewayResult<()> {
        if !self.scenes.iter().any(|s| s.id == scene) {
            return Err(GatewayError::SceneNotFound(scene));
        }
        self.scene_activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_node_position(&self, node: NodeId, _position: Position) -> GatewayResult<()> {
        if !self.nodes.iter().any(|n| n.id == node) {
            return Err(GatewayError::NodeNotFound(node));
        }
        Ok(())
    }

    async fn stop_node(&self, node: NodeId) -> GatewayResult<()> {
        if !self.nodes.iter().any(|n| n.id == node) {
            return Err(GatewayError::NodeNotFound(node));
        }
        Ok(())
    }
}
