//! Discovery: announcing platforms and loading them with retry

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{EntityRegistry, Platform, PlatformError, PlatformKind};

/// Default delay before a not-ready platform setup is retried
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// A request to load one platform of one integration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformRequest {
    /// Integration domain announcing the platform (e.g. "velux")
    pub integration: String,

    /// Which platform kind to load
    pub kind: PlatformKind,
}

/// Sender half of the discovery mechanism
///
/// Integrations announce their platforms here during setup; the host's
/// [`PlatformLoader`] consumes the requests asynchronously.
#[derive(Clone)]
pub struct Discovery {
    tx: mpsc::UnboundedSender<PlatformRequest>,
}

impl Discovery {
    /// Create a discovery channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlatformRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Announce a platform for asynchronous loading
    pub fn announce(&self, integration: impl Into<String>, kind: PlatformKind) {
        let request = PlatformRequest {
            integration: integration.into(),
            kind,
        };
        debug!(integration = %request.integration, platform = %request.kind, "platform announced");
        // A dropped receiver means the host is already gone; nothing to do.
        let _ = self.tx.send(request);
    }
}

/// Loads announced platforms, retrying the not-ready ones
///
/// Each request is handled on its own task: setup is attempted, a
/// [`PlatformError::NotReady`] schedules another attempt after the retry
/// interval, any other error abandons the platform. Successful setups feed
/// their entities into the shared [`EntityRegistry`].
pub struct PlatformLoader {
    platforms: DashMap<PlatformRequest, Arc<dyn Platform>>,
    entities: Arc<EntityRegistry>,
    retry_interval: Duration,
}

impl PlatformLoader {
    /// Create a loader feeding the given registry
    pub fn new(entities: Arc<EntityRegistry>) -> Self {
        Self::with_retry_interval(entities, DEFAULT_RETRY_INTERVAL)
    }

    /// Create a loader with a custom not-ready retry interval
    pub fn with_retry_interval(entities: Arc<EntityRegistry>, retry_interval: Duration) -> Self {
        Self {
            platforms: DashMap::new(),
            entities,
            retry_interval,
        }
    }

    /// Register the platform implementation behind an announcement
    pub fn register(&self, integration: impl Into<String>, platform: Arc<dyn Platform>) {
        let request = PlatformRequest {
            integration: integration.into(),
            kind: platform.kind(),
        };
        self.platforms.insert(request, platform);
    }

    /// Consume discovery requests until the channel closes
    ///
    /// Runs as the host's platform-loading task; every request spawns an
    /// independent setup task so a slow platform never blocks the others.
    pub async fn run(self: Arc<Self>, mut requests: mpsc::UnboundedReceiver<PlatformRequest>) {
        while let Some(request) = requests.recv().await {
            let Some(platform) = self.platforms.get(&request).map(|r| r.value().clone()) else {
                warn!(integration = %request.integration, platform = %request.kind,
                    "announced platform has no registered implementation");
                continue;
            };
            let loader = Arc::clone(&self);
            tokio::spawn(async move {
                loader.setup_with_retry(request, platform).await;
            });
        }
    }

    async fn setup_with_retry(&self, request: PlatformRequest, platform: Arc<dyn Platform>) {
        let mut tries: u32 = 0;
        loop {
            tries += 1;
            match platform.setup().await {
                Ok(entities) => {
                    info!(integration = %request.integration, platform = %request.kind,
                        count = entities.len(), "platform setup complete");
                    self.entities.add_entities(entities);
                    return;
                }
                Err(PlatformError::NotReady) => {
                    warn!(integration = %request.integration, platform = %request.kind,
                        tries, "platform not ready, retrying later");
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(err) => {
                    error!(integration = %request.integration, platform = %request.kind,
                        error = %err, "platform setup failed");
                    return;
                }
            }
        }
    }
}
