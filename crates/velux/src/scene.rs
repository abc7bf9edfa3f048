//! Scene platform: one activatable entity per gateway scene

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hub_core::{Entity, EntityId, Platform, PlatformError, PlatformKind, PlatformResult};
use klf200::{Gateway, GatewayResult, Scene};
use tracing::{info, warn};

use crate::guard::{ConnectionGuard, SetupOutcome};
use crate::PLATFORM_SETUP_TIMEOUT;

/// The velux scene platform
pub struct ScenePlatform {
    guard: Arc<ConnectionGuard>,
    setup_timeout: Duration,
}

impl ScenePlatform {
    /// Create the scene platform around the shared connection guard
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
impl Platform for ScenePlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Scene
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
        for scene in gateway.scenes().await {
            match VeluxScene::new(Arc::clone(&gateway), scene) {
                Ok(entity) => {
                    info!(scene = %entity.name(), "adding velux scene");
                    entities.push(Arc::new(entity));
                }
                Err(err) => {
                    warn!(error = %err, "skipping scene with unusable name");
                }
            }
        }
        Ok(entities)
    }
}

/// One scene stored on the gateway, exposed as an activatable entity
pub struct VeluxScene {
    entity_id: EntityId,
    scene: Scene,
    gateway: Arc<Gateway>,
}

impl VeluxScene {
    fn new(gateway: Arc<Gateway>, scene: Scene) -> Result<Self, hub_core::EntityIdError> {
        let entity_id = EntityId::from_name(PlatformKind::Scene.domain(), &scene.name)?;
        Ok(Self {
            entity_id,
            scene,
            gateway,
        })
    }

    /// Trigger the scene, fire-and-forget
    ///
    /// Returns once the gateway has accepted the command; it does not wait
    /// for the actuators to finish moving.
    pub async fn activate(&self) -> GatewayResult<()> {
        self.gateway.run_scene(self.scene.id, false).await
    }
}

impl Entity for VeluxScene {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn name(&self) -> &str {
        &self.scene.name
    }
}
