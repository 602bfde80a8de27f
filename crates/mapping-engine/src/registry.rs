//! Name registry for one authoring session
//!
//! Every node and graph claims its name here when it is constructed. Names
//! must be unique across the whole session, because the rendered document
//! refers to definitions and instances by name only.
//!
//! # Usage
//!
//! ```ignore
//! use mapping_engine::{NameRegistry, Node, TransformType};
//!
//! let mut registry = NameRegistry::new();
//! let exp = Node::transformation(&mut registry, TransformType::Expression, "clean")?;
//! assert_eq!(exp.id(), "EXP_clean");
//! assert!(registry.contains("EXP_clean"));
//! ```

use std::collections::BTreeSet;

use crate::error::{MappingError, Result};

/// Registry of claimed names
///
/// Replaces a process-wide name list with an explicit value owned by the
/// construction session. Independent builds (and tests) use independent
/// registries, or call [`NameRegistry::clear`] between builds.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: BTreeSet<String>,
}

impl NameRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Claim a name
    ///
    /// Fails with `DuplicateIdentifier` if the name is taken; the registry is
    /// left unchanged in that case.
    pub fn claim(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(MappingError::DuplicateIdentifier(name));
        }
        log::debug!("Claimed name '{}'", name);
        self.names.insert(name);
        Ok(())
    }

    /// Claim several names at once, all or nothing
    pub fn claim_all<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut seen = BTreeSet::new();
        for name in &names {
            if self.names.contains(name) || !seen.insert(name.as_str()) {
                return Err(MappingError::DuplicateIdentifier(name.clone()));
            }
        }
        self.names.extend(names);
        Ok(())
    }

    /// Give a name back so it can be claimed again
    pub fn release(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Check if a name is claimed
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of claimed names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing has been claimed
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget every claimed name
    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// All claimed names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
