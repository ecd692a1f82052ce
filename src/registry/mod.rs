//! Named registries populated at startup.
//!
//! # Data Flow
//! ```text
//! MentatBuilder (explicit registration)
//!     → controller.rs / handler.rs / method.rs / model.rs records
//!     → Registry<T> keyed by name (frozen after load)
//!     → shared through AppContext
//!
//! <root>/handlers/*.toml
//!     → discovery.rs (scan, name from file stem)
//!     → extra route declarations merged into handler records
//! ```
//!
//! # Design Decisions
//! - Registration is explicit; only data files are discovered on disk
//! - Duplicate names are a startup error
//! - Records are immutable after load and shared via Arc

pub mod controller;
pub mod discovery;
pub mod handler;
pub mod method;
pub mod model;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::BootstrapError;

pub use controller::{Controller, ControllerResult};
pub use handler::Handler;
pub use method::{MethodRegistry, ServerMethod};
pub use model::{Association, AssociationKind, Model, ModelRegistry};

/// A record stored in a [`Registry`].
pub trait Named {
    fn name(&self) -> &str;
}

/// Name-keyed collection of loaded records.
#[derive(Debug)]
pub struct Registry<T> {
    kind: &'static str,
    items: BTreeMap<String, Arc<T>>,
}

impl<T: Named> Registry<T> {
    /// An empty registry; `kind` names entries in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: BTreeMap::new(),
        }
    }

    /// Add a record, rejecting a name that is already taken.
    pub fn insert(&mut self, item: T) -> Result<Arc<T>, BootstrapError> {
        let name = item.name().to_string();
        if self.items.contains_key(&name) {
            return Err(BootstrapError::DuplicateName {
                kind: self.kind,
                name,
            });
        }

        let item = Arc::new(item);
        self.items.insert(name.clone(), item.clone());
        tracing::info!(kind = self.kind, name = %name, "{} loaded: {}", self.kind, name);
        Ok(item)
    }

    /// The entry registered as `name`.
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.items.get(name).cloned()
    }

    /// Whether an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// All entries.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
