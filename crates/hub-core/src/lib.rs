//! Hub runtime surface for gateway integrations
//!
//! This crate provides the small slice of a home-automation hub that an
//! integration plugs into: a broadcast [`EventBus`] carrying lifecycle
//! events (most importantly [`HUB_STOP`]), validated [`EntityId`]s, the
//! [`Platform`] setup contract with its not-ready retry semantics, and the
//! [`Discovery`]/[`PlatformLoader`] pair that fans platform-load requests
//! out to the host.

mod discovery;
mod entity;
mod event_bus;
mod platform;

pub use discovery::{Discovery, PlatformLoader, PlatformRequest};
pub use entity::{slugify, Entity, EntityId, EntityIdError, EntityRegistry};
pub use event_bus::{Event, EventBus, EventType, HUB_START, HUB_STOP};
pub use platform::{Platform, PlatformError, PlatformKind, PlatformResult};
