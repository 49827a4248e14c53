//! Subsystem registry

use std::collections::HashMap;
use std::sync::Arc;

use common::error::{Error, Result};

use crate::subsystem::Subsystem;

/// Ordered set of uniquely named subsystems
#[derive(Debug, Clone, Default)]
pub struct SubsystemRegistry {
    /// Subsystems in registration order
    subsystems: Vec<Arc<Subsystem>>,

    /// Name -> position
    index: HashMap<String, usize>,
}

impl SubsystemRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, rejecting empty or duplicate names
    pub fn from_subsystems<I>(subsystems: I) -> Result<Self>
    where
        I: IntoIterator<Item = Subsystem>,
    {
        let mut registry = Self::new();

        for subsystem in subsystems {
            let name = subsystem.name().to_string();

            if name.trim().is_empty() {
                return Err(Error::Registration("subsystem name must not be empty".to_string()));
            }
            if registry.index.contains_key(&name) {
                return Err(Error::Registration(format!("duplicate subsystem name: {}", name)));
            }

            registry.index.insert(name, registry.subsystems.len());
            registry.subsystems.push(Arc::new(subsystem));
        }

        Ok(registry)
    }

    /// Looks up a subsystem by name
    pub fn get(&self, name: &str) -> Option<&Arc<Subsystem>> {
        self.index.get(name).map(|&i| &self.subsystems[i])
    }

    /// Returns true if a subsystem with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.subsystems.iter().map(|s| s.name().to_string()).collect()
    }

    /// Iterates in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Subsystem>> {
        self.subsystems.iter()
    }

    /// Number of registered subsystems
    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }
}
