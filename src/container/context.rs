//! The per-construction context handed to factories.
//!
//! Every factory execution gets its own [`ResolutionContext`]. It carries the
//! construction chain for cycle detection, the active scope (if any), and the
//! fetch state that checks positional fetches against a declared dependency
//! shape, or records them to infer one.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::definition::AnyArc;
use crate::error::{DiError, DiResult, InferenceCause};
use crate::key::Key;

use super::scope::Scope;
use super::{downcast_concrete, downcast_shared, Container};

/// How fetches made by the running factory are interpreted.
pub(crate) enum FetchState<'a> {
    /// The definition declared its shape; positional fetches walk it in
    /// order and must agree with it.
    Declared {
        shape: &'a [Key],
        cursor: Cell<usize>,
    },
    /// No declared shape; every fetch is recorded so the shape can be
    /// inferred from the first construction.
    Observing { seen: RefCell<Vec<Key>> },
}

/// Context passed to factory functions for fetching dependencies.
///
/// Dependencies fetched through the context participate in cycle detection
/// and shape checking. Factories should always fetch through their context
/// rather than through a captured [`Container`] handle; a captured handle
/// starts a fresh resolution that cannot see the chain it is nested in.
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, Definition};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repo { db: Arc<Database> }
///
/// let container = Container::new();
/// container.register(Definition::singleton(|_| Database)).unwrap();
/// container.register(Definition::singleton(|ctx| Repo {
///     db: ctx.get().unwrap(),
/// })).unwrap();
///
/// container.resolve::<Repo>().unwrap();
/// ```
pub struct ResolutionContext<'a> {
    pub(crate) container: &'a Container,
    pub(crate) scope: Option<&'a Scope>,
    /// Keys currently under construction, the running definition last.
    pub(crate) chain: Vec<Key>,
    pub(crate) fetches: FetchState<'a>,
    /// Display name of the running definition, for error reporting.
    pub(crate) name: &'static str,
}

impl<'a> ResolutionContext<'a> {
    pub(crate) fn new(
        container: &'a Container,
        scope: Option<&'a Scope>,
        chain: Vec<Key>,
        fetches: FetchState<'a>,
    ) -> Self {
        let name = chain
            .last()
            .map(|key| key.display_name())
            .unwrap_or("<root>");
        Self {
            container,
            scope,
            chain,
            fetches,
            name,
        }
    }

    /// Fetches the next positional dependency as a concrete type.
    ///
    /// Against a declared shape this checks the requested type against the
    /// declaration at the cursor position and advances the cursor; a
    /// disagreement fails with [`DiError::Inference`]. Without a declared
    /// shape the fetch is recorded and resolved as requested.
    pub fn next<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = self.positional(Key::of::<T>())?;
        let any = self.resolve_erased(&key)?;
        downcast_concrete(any, key.display_name())
    }

    /// Fetches the next positional dependency as a trait object.
    pub fn next_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = self.positional(Key::of_trait::<T>())?;
        let any = self.resolve_erased(&key)?;
        downcast_shared(any, key.display_name())
    }

    /// Fetches a dependency by explicit type.
    ///
    /// The explicit type wins over the declared shape, but the fetch still
    /// advances the cursor so later positional fetches stay aligned.
    pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of::<T>();
        self.note_explicit(key);
        let any = self.resolve_erased(&key)?;
        downcast_concrete(any, key.display_name())
    }

    /// Fetches a dependency by explicit trait.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of_trait::<T>();
        self.note_explicit(key);
        let any = self.resolve_erased(&key)?;
        downcast_shared(any, key.display_name())
    }

    /// Fetches a dependency by erased key.
    ///
    /// The escape hatch for dynamically registered definitions whose types
    /// are not known at the call site. Counts as an explicit fetch.
    pub fn get_key(&self, key: &Key) -> DiResult<AnyArc> {
        self.note_explicit(*key);
        self.resolve_erased(key)
    }

    /// Fetches the declared dependency at `index` without moving the cursor.
    ///
    /// Only available to definitions with a declared shape; the requested
    /// type must agree with the declaration at that position.
    pub fn next_at<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let key = self.indexed(Key::of::<T>(), index)?;
        let any = self.resolve_erased(&key)?;
        downcast_concrete(any, key.display_name())
    }

    /// Fetches the declared dependency at `index` as a trait object,
    /// without moving the cursor.
    pub fn next_at_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> DiResult<Arc<T>> {
        let key = self.indexed(Key::of_trait::<T>(), index)?;
        let any = self.resolve_erased(&key)?;
        downcast_shared(any, key.display_name())
    }

    /// The keys currently under construction, the running definition last.
    pub fn chain(&self) -> &[Key] {
        &self.chain
    }

    fn resolve_erased(&self, key: &Key) -> DiResult<AnyArc> {
        self.container.resolve_key_in(key, &self.chain, self.scope)
    }

    fn positional(&self, requested: Key) -> DiResult<Key> {
        match &self.fetches {
            FetchState::Declared { shape, cursor } => {
                let index = cursor.get();
                if index >= shape.len() {
                    return Err(DiError::Inference {
                        name: self.name,
                        cause: InferenceCause::ShapeOverrun {
                            declared: shape.len(),
                        },
                    });
                }
                cursor.set(index + 1);
                let declared = shape[index];
                if declared != requested {
                    return Err(DiError::Inference {
                        name: self.name,
                        cause: InferenceCause::ShapeMismatch {
                            index,
                            declared: declared.display_name(),
                            requested: requested.display_name(),
                        },
                    });
                }
                Ok(declared)
            }
            FetchState::Observing { seen } => {
                seen.borrow_mut().push(requested);
                Ok(requested)
            }
        }
    }

    fn indexed(&self, requested: Key, index: usize) -> DiResult<Key> {
        match &self.fetches {
            FetchState::Declared { shape, .. } => {
                if index >= shape.len() {
                    return Err(DiError::Inference {
                        name: self.name,
                        cause: InferenceCause::ShapeOverrun {
                            declared: shape.len(),
                        },
                    });
                }
                let declared = shape[index];
                if declared != requested {
                    return Err(DiError::Inference {
                        name: self.name,
                        cause: InferenceCause::ShapeMismatch {
                            index,
                            declared: declared.display_name(),
                            requested: requested.display_name(),
                        },
                    });
                }
                Ok(declared)
            }
            FetchState::Observing { .. } => Err(DiError::Inference {
                name: self.name,
                cause: InferenceCause::IndexedFetchWithoutShape { index },
            }),
        }
    }

    fn note_explicit(&self, requested: Key) {
        match &self.fetches {
            FetchState::Declared { cursor, .. } => {
                // Advances past the slot without checking it; the explicit
                // type is authoritative for this fetch.
                cursor.set(cursor.get() + 1);
            }
            FetchState::Observing { seen } => {
                seen.borrow_mut().push(requested);
            }
        }
    }
}
