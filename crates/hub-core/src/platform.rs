//! Platform setup contract

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::Entity;

/// Result type for platform setup
pub type PlatformResult = Result<Vec<Arc<dyn Entity>>, PlatformError>;

/// The kinds of platform an integration can announce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    /// Window/blind/shutter covers
    Cover,
    /// Activatable scenes
    Scene,
}

impl PlatformKind {
    /// The entity domain for this platform kind
    pub fn domain(&self) -> &'static str {
        match self {
            PlatformKind::Cover => "cover",
            PlatformKind::Scene => "scene",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain())
    }
}

/// Errors a platform setup can report
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The backing device is temporarily unavailable; the host should retry
    /// setup later
    #[error("platform not ready")]
    NotReady,

    /// Setup hit a permanent, non-retryable condition
    #[error("platform setup failed: {reason}")]
    SetupFailed { reason: String },
}

/// One platform of an integration (its covers, its scenes, ...)
///
/// `setup` is called by the [`PlatformLoader`] once the platform has been
/// announced through discovery. Returning [`PlatformError::NotReady`] is a
/// retryable condition, not a failure: the loader calls setup again after
/// its retry interval.
///
/// [`PlatformLoader`]: crate::PlatformLoader
#[async_trait]
pub trait Platform: Send + Sync {
    /// Which kind of platform this is
    fn kind(&self) -> PlatformKind;

    /// Discover and return this platform's entities
    async fn setup(&self) -> PlatformResult;
}
