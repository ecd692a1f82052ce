//! Model registration and association wiring.
//!
//! Schema and query logic belong to the model types themselves; this module
//! only builds each model from the environment's database options, keys it by
//! name and checks that declared associations point at registered models.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::BootstrapError;

/// A data-backed entity registered at startup.
pub trait Model: Any + Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Relations to other registered models.
    fn associations(&self) -> Vec<Association> {
        Vec::new()
    }

    /// Helper to allow downcasting from the trait object.
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

/// A declared relation from one model to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub kind: AssociationKind,
    pub target: String,
    pub foreign_key: Option<String>,
}

impl Association {
    /// An association of `kind` pointing at the model named `target`.
    pub fn new(kind: AssociationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            foreign_key: None,
        }
    }

    /// This model holds a key into `target`.
    pub fn belongs_to(target: impl Into<String>) -> Self {
        Self::new(AssociationKind::BelongsTo, target)
    }

    /// `target` holds a key into this model.
    pub fn has_many(target: impl Into<String>) -> Self {
        Self::new(AssociationKind::HasMany, target)
    }

    /// Override the foreign key column.
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }
}

/// Builds a model from the environment's database options.
pub type ModelFactory = Box<dyn FnOnce(&DatabaseConfig) -> Arc<dyn Model> + Send>;

/// All registered models and their wired associations.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    database: DatabaseConfig,
    models: BTreeMap<String, Arc<dyn Model>>,
    associations: BTreeMap<String, Vec<Association>>,
}

impl ModelRegistry {
    /// Build every model, then wire associations across the full set.
    pub fn load(
        database: DatabaseConfig,
        factories: Vec<ModelFactory>,
    ) -> Result<Self, BootstrapError> {
        let mut models = BTreeMap::new();

        for factory in factories {
            let model = factory(&database);
            let name = model.name().to_string();
            if models.contains_key(&name) {
                return Err(BootstrapError::DuplicateName { kind: "model", name });
            }
            tracing::info!(name = %name, "model loaded: {}", name);
            models.insert(name, model);
        }

        let mut associations = BTreeMap::new();
        for (name, model) in &models {
            let declared = model.associations();
            if let Some(missing) = declared.iter().find(|a| !models.contains_key(&a.target)) {
                return Err(BootstrapError::UnknownAssociation {
                    model: name.clone(),
                    target: missing.target.clone(),
                });
            }
            if !declared.is_empty() {
                tracing::debug!(model = %name, count = declared.len(), "Associations wired");
                associations.insert(name.clone(), declared);
            }
        }

        Ok(Self {
            database,
            models,
            associations,
        })
    }

    /// Database options for the current environment.
    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    /// The model registered as `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get(name).cloned()
    }

    /// Look up a model and downcast it to its concrete type.
    pub fn get_as<T: Model>(&self, name: &str) -> Option<&T> {
        self.models.get(name)?.as_any().downcast_ref::<T>()
    }

    /// Associations declared by `name`; empty for unknown models.
    pub fn associations_of(&self, name: &str) -> &[Association] {
        self.associations.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Registered model names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
