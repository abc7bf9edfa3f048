//! Client facade for the VELUX KLF-200 gateway
//!
//! This crate provides the object model for scenes and nodes stored on a
//! KLF-200, a [`Gateway`] facade that loads and caches them, and the
//! [`GatewayTransport`] trait behind which the actual wire protocol lives.
//! The frame codec and TCP/TLS session handling are deliberately outside
//! this crate; anything that can speak to a KLF-200 (or pretend to, in
//! tests) implements the transport trait.

mod error;
mod gateway;
mod node;
mod scene;
mod transport;

pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, GatewayConfig};
pub use node::{Node, NodeId, Position};
pub use scene::{Scene, SceneId};
pub use transport::GatewayTransport;
