//! Entity ids and the entity registry

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Error type for invalid entity ids
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("object_id cannot be empty")]
    EmptyObjectId,

    #[error("'{0}' contains invalid characters (lowercase alphanumeric and non-edge underscores only)")]
    InvalidChars(String),
}

/// A `domain.object_id` pair identifying one entity on the hub
///
/// Both parts are lowercase alphanumeric with underscores; underscores may
/// not lead or trail either part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Create an entity id from validated parts
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if domain.is_empty() {
            return Err(EntityIdError::EmptyDomain);
        }
        if object_id.is_empty() {
            return Err(EntityIdError::EmptyObjectId);
        }
        if !is_valid_part(&domain) {
            return Err(EntityIdError::InvalidChars(domain));
        }
        if !is_valid_part(&object_id) {
            return Err(EntityIdError::InvalidChars(object_id));
        }

        Ok(Self { domain, object_id })
    }

    /// Build an entity id from a free-form name, slugifying the object part
    pub fn from_name(domain: &str, name: &str) -> Result<Self, EntityIdError> {
        Self::new(domain, slugify(name))
    }

    /// The domain part
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The object_id part
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

fn is_valid_part(s: &str) -> bool {
    if s.starts_with('_') || s.ends_with('_') {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Reduce a free-form name to a valid object_id
///
/// Lowercases, maps runs of non-alphanumeric characters to single
/// underscores, and trims underscores from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    slug.trim_end_matches('_').to_string()
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 2 {
            return Err(EntityIdError::InvalidFormat);
        }
        Self::new(parts[0], parts[1])
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

/// A controllable entity surfaced by a platform
pub trait Entity: Send + Sync {
    /// Unique id on the hub
    fn entity_id(&self) -> &EntityId;

    /// Human-readable name, sourced from the device
    fn name(&self) -> &str;
}

/// Registry of entities added by loaded platforms
#[derive(Default)]
pub struct EntityRegistry {
    entities: DashMap<EntityId, Arc<dyn Entity>>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch of entities produced by a platform setup
    pub fn add_entities(&self, entities: Vec<Arc<dyn Entity>>) {
        for entity in entities {
            info!(entity_id = %entity.entity_id(), name = entity.name(), "adding entity");
            self.entities.insert(entity.entity_id().clone(), entity);
        }
    }

    /// Look up an entity by id
    pub fn get(&self, entity_id: &EntityId) -> Option<Arc<dyn Entity>> {
        self.entities.get(entity_id).map(|r| r.value().clone())
    }

    /// All entity ids in a domain
    pub fn ids_in_domain(&self, domain: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|r| r.key().domain() == domain)
            .map(|r| r.key().clone())
            .collect()
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
