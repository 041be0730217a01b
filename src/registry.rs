//! Keyed definition storage with stable registration order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::key::{Key, Qualifier};
use crate::lifetime::Lifetime;

/// The definition store behind a [`Container`](crate::Container).
///
/// Lookups clone the `Arc<Definition>` out so construction never holds the
/// registry lock. `order` remembers registration order for diagnostics and
/// eager initialization.
pub(crate) struct Registry {
    defs: HashMap<Key, Arc<Definition>>,
    order: Vec<Key>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            defs: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Inserts a definition, rejecting duplicates.
    ///
    /// Registration never silently replaces. Remove the old definition
    /// first to re-register a key.
    pub(crate) fn insert(&mut self, definition: Definition) -> DiResult<()> {
        let key = definition.key;
        if self.defs.contains_key(&key) {
            return Err(DiError::Duplicate(key.display_name()));
        }
        self.defs.insert(key, Arc::new(definition));
        self.order.push(key);
        Ok(())
    }

    /// Removes a definition. Idempotent; returns the removed definition.
    pub(crate) fn remove(&mut self, key: &Key) -> Option<Arc<Definition>> {
        let removed = self.defs.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub(crate) fn get(&self, key: &Key) -> Option<Arc<Definition>> {
        self.defs.get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.defs.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.defs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registered names, in registration order.
    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.order.iter().map(|key| key.display_name()).collect()
    }

    /// Eager singletons, in registration order.
    pub(crate) fn eager_keys(&self) -> Vec<Key> {
        self.order
            .iter()
            .filter(|key| {
                self.defs
                    .get(key)
                    .map(|def| def.eager && def.lifetime == Lifetime::Singleton)
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }

    /// Whether any Scoped definition carries the given qualifier.
    ///
    /// A qualifier on a non-Scoped definition is inert and does not make
    /// the name scopeable.
    pub(crate) fn has_scope_qualifier(&self, qualifier: &Qualifier) -> bool {
        self.defs.values().any(|def| {
            def.lifetime == Lifetime::Scoped && def.qualifier.as_ref() == Some(qualifier)
        })
    }

    /// Distinct Scoped qualifier names, in registration order.
    pub(crate) fn scope_qualifier_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for key in &self.order {
            if let Some(def) = self.defs.get(key) {
                if def.lifetime != Lifetime::Scoped {
                    continue;
                }
                if let Some(qualifier) = def.qualifier {
                    let name = qualifier.display_name();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    /// Walks every known dependency edge and reports the first problem.
    ///
    /// Edges come from declared shapes and from shapes already discovered at
    /// runtime; definitions whose shape is still unknown contribute no
    /// edges. Detects dangling dependencies and cycles without constructing
    /// anything.
    pub(crate) fn verify(&self) -> DiResult<()> {
        let mut marks: HashMap<Key, Mark> = HashMap::new();
        for root in &self.order {
            if marks.get(root) == Some(&Mark::Done) {
                continue;
            }
            let mut path = Vec::new();
            self.visit(*root, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        key: Key,
        marks: &mut HashMap<Key, Mark>,
        path: &mut Vec<Key>,
    ) -> DiResult<()> {
        match marks.get(&key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|k| *k == key).unwrap_or(0);
                let mut cycle: Vec<&'static str> =
                    path[start..].iter().map(|k| k.display_name()).collect();
                cycle.push(key.display_name());
                return Err(DiError::Circular(cycle));
            }
            None => {}
        }

        let def = match self.defs.get(&key) {
            Some(def) => def.clone(),
            None => {
                return Err(DiError::NotFound {
                    name: key.display_name(),
                    registered: self.names(),
                })
            }
        };

        marks.insert(key, Mark::Visiting);
        path.push(key);
        if let Some(deps) = def.dependencies() {
            for dep in deps.iter() {
                self.visit(*dep, marks, path)?;
            }
        }
        path.pop();
        marks.insert(key, Mark::Done);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}
