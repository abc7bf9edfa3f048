//! Cover platform: one entity per gateway node

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hub_core::{Entity, EntityId, Platform, PlatformError, PlatformKind, PlatformResult};
use klf200::{Gateway, GatewayResult, Node, Position};
use tracing::{info, warn};

use crate::guard::{ConnectionGuard, SetupOutcome};
use crate::PLATFORM_SETUP_TIMEOUT;

/// The velux cover platform
pub struct CoverPlatform {
    guard: Arc<ConnectionGuard>,
    setup_timeout: Duration,
}

impl CoverPlatform {
    /// Create the cover platform around the shared connection guard
    pub fn new(guard: Arc<ConnectionGuard>) -> Self {
        Self {
            guard,
            setup_timeout: PLATFORM_SETUP_TIMEOUT,
        }
    }

    /// Override the setup wait timeout
    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.setup_timeout = timeout;
        self
    }
}

#[async_trait]
impl Platform for CoverPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Cover
    }

    async fn setup(&self) -> PlatformResult {
        match self.guard.wait_ready(self.setup_timeout).await {
            Ok(SetupOutcome::Ready) => {}
            Ok(SetupOutcome::NotReady) => return Err(PlatformError::NotReady),
            Err(err) => {
                return Err(PlatformError::SetupFailed {
                    reason: err.to_string(),
                })
            }
        }

        let gateway = self.guard.gateway();
        let mut entities: Vec<Arc<dyn Entity>> = Vec::new();
        for node in gateway.nodes().await {
            match VeluxCover::new(Arc::clone(&gateway), node) {
                Ok(entity) => {
                    info!(cover = %entity.name(), "adding velux cover");
                    entities.push(Arc::new(entity));
                }
                Err(err) => {
                    warn!(error = %err, "skipping node with unusable name");
                }
            }
        }
        Ok(entities)
    }
}

/// One actuator node on the gateway, exposed as a cover entity
pub struct VeluxCover {
    entity_id: EntityId,
    node: Node,
    gateway: Arc<Gateway>,
}

impl VeluxCover {
    fn new(gateway: Arc<Gateway>, node: Node) -> Result<Self, hub_core::EntityIdError> {
        let entity_id = EntityId::from_name(PlatformKind::Cover.domain(), &node.name)?;
        Ok(Self {
            entity_id,
            node,
            gateway,
        })
    }

    /// Current position, preferring the gateway's cache over the snapshot
    /// taken at setup
    pub async fn position(&self) -> Position {
        self.gateway
            .nodes()
            .await
            .iter()
            .find(|n| n.id == self.node.id)
            .map(|n| n.position)
            .unwrap_or(self.node.position)
    }

    /// Open the cover fully
    pub async fn open(&self) -> GatewayResult<()> {
        self.set_position(Position::OPEN).await
    }

    /// Close the cover fully
    pub async fn close(&self) -> GatewayResult<()> {
        self.set_position(Position::CLOSED).await
    }

    /// Drive the cover to a target position
    pub async fn set_position(&self, position: Position) -> GatewayResult<()> {
        self.gateway.set_position(self.node.id, position).await
    }

    /// Stop the cover mid-travel
    pub async fn stop(&self) -> GatewayResult<()> {
        self.gateway.stop_node(self.node.id).await
    }
}

impl Entity for VeluxCover {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn name(&self) -> &str {
        &self.node.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;
    use klf200::GatewayConfig;

    async fn ready_platform() -> (Arc<ConnectionGuard>, CoverPlatform) {
        let gateway = Gateway::new(
            GatewayConfig::new("klf200.local", "velux123"),
            Arc::new(MockTransport::new()),
        );
        let guard = Arc::new(ConnectionGuard::new(Arc::new(gateway)));
        let platform =
            CoverPlatform::new(Arc::clone(&guard)).with_setup_timeout(Duration::from_secs(1));
        (guard, platform)
    }

    #[tokio::test]
    async fn test_setup_creates_cover_entities() {
        let (_guard, platform) = ready_platform().await;

        let entities = platform.setup().await.unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_id().to_string(), "cover.kitchen_window");
        assert_eq!(entities[1].name(), "Roof Blind");
    }

    #[tokio::test]
    async fn test_cover_movement_updates_position() {
        let (guard, platform) = ready_platform().await;
        platform.setup().await.unwrap();

        let gateway = guard.gateway();
        let node = gateway.nodes().await[0].clone();
        let cover = VeluxCover::new(gateway, node).unwrap();

        assert_eq!(cover.position().await, Position::OPEN);
        cover.close().await.unwrap();
        assert_eq!(cover.position().await, Position::CLOSED);
        cover.set_position(Position::new(25)).await.unwrap();
        assert_eq!(cover.position().await.percent_closed(), 25);
        cover.stop().await.unwrap();
    }
}
