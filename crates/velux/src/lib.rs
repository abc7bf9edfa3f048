//! VELUX KLF-200 integration
//!
//! Connects a hub runtime to a KLF-200 window-control gateway and exposes
//! the gateway's scenes and covers as entities. The gateway client is
//! created at setup but connects lazily: the first platform that needs it
//! triggers the [`ConnectionGuard`]'s single shared connection attempt,
//! and the hub-stop event tears the link down exactly once.

use std::sync::Arc;
use std::time::Duration;

use hub_core::{Discovery, EventBus, PlatformKind, PlatformLoader, HUB_STOP};
use klf200::{Gateway, GatewayTransport};
use tracing::debug;

pub mod config;
pub mod cover;
pub mod guard;
pub mod scene;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, ConfigResult, VeluxConfig};
pub use cover::{CoverPlatform, VeluxCover};
pub use guard::{AttemptHandle, ConnectionGuard, GuardError, SetupOutcome};
pub use scene::{ScenePlatform, VeluxScene};

/// Integration domain name
pub const DOMAIN: &str = "velux";

/// The platforms this integration announces
pub const SUPPORTED_PLATFORMS: [PlatformKind; 2] = [PlatformKind::Cover, PlatformKind::Scene];

/// How long a platform setup waits for the shared connection attempt
pub const PLATFORM_SETUP_TIMEOUT: Duration = Duration::from_secs(120);

/// The velux integration instance
///
/// Holds the connection guard shared by every platform. Constructed once
/// via [`VeluxComponent::setup`].
pub struct VeluxComponent {
    guard: Arc<ConnectionGuard>,
}

impl VeluxComponent {
    /// Set up the integration
    ///
    /// Creates the gateway client (unconnected), wires the one-shot
    /// hub-stop teardown hook, registers both platforms with the loader
    /// and announces them through discovery. The gateway is only contacted
    /// once a platform setup asks for it.
    pub fn setup(
        config: VeluxConfig,
        transport: Arc<dyn GatewayTransport>,
        bus: &EventBus,
        discovery: &Discovery,
        loader: &PlatformLoader,
    ) -> Arc<Self> {
        let gateway = Arc::new(Gateway::new(config.gateway_config(), transport));
        let guard = Arc::new(ConnectionGuard::new(gateway));

        let mut stop_rx = bus.subscribe(HUB_STOP);
        let stop_guard = Arc::clone(&guard);
        tokio::spawn(async move {
            if stop_rx.recv().await.is_ok() {
                debug!("hub stop received, tearing down velux gateway link");
                stop_guard.shutdown().await;
            }
        });

        loader.register(DOMAIN, Arc::new(CoverPlatform::new(Arc::clone(&guard))));
        loader.register(DOMAIN, Arc::new(ScenePlatform::new(Arc::clone(&guard))));
        for kind in SUPPORTED_PLATFORMS {
            discovery.announce(DOMAIN, kind);
        }

        Arc::new(Self { guard })
    }

    /// The connection guard shared by the platforms
    pub fn guard(&self) -> &Arc<ConnectionGuard> {
        &self.guard
    }

    /// The shared gateway client
    pub fn gateway(&self) -> Arc<Gateway> {
        self.guard.gateway()
    }
}
