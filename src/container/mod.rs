//! The container: registration surface and resolution engine.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::definition::{AnyArc, Definition, Shape};
use crate::error::{DiError, DiResult, InferenceCause};
use crate::key::{Key, Qualifier};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registry::Registry;

pub mod context;
pub mod scope;

pub use context::ResolutionContext;
pub use scope::Scope;

use context::FetchState;

/// The dependency resolution container.
///
/// Definitions are registered against a live container and resolved by type,
/// trait, or erased [`Key`]. Instances are produced according to their
/// [`Lifetime`](crate::Lifetime): singletons once per container, factories
/// on every call, scoped definitions once per matching [`Scope`].
///
/// # Thread safety
///
/// The container is fully thread-safe and cheap to clone; clones share the
/// same registry and caches. Concurrent first resolutions of a singleton run
/// its factory at most once: the winner stores the instance and the losers
/// block until they can observe it. Each resolution call carries its own
/// construction chain, so concurrent resolutions never contaminate each
/// other's cycle detection.
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, Definition};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container.register(Definition::singleton(|_| Database {
///     url: "postgres://localhost".to_string(),
/// })).unwrap();
/// container.register(Definition::factory(|ctx| UserService {
///     db: ctx.get().unwrap(),
/// })).unwrap();
///
/// let service = container.resolve::<UserService>().unwrap();
/// assert_eq!(service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    registry: RwLock<Registry>,
    observers: RwLock<Observers>,
    has_observers: AtomicBool,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: RwLock::new(Registry::new()),
                observers: RwLock::new(Observers::new()),
                has_observers: AtomicBool::new(false),
            }),
        }
    }

    /// Registers a definition.
    ///
    /// Fails with [`DiError::Duplicate`] if the key is already registered;
    /// registration never silently replaces. Remove the old definition with
    /// [`unregister`](Container::unregister) first to swap it.
    pub fn register(&self, definition: impl Into<Definition>) -> DiResult<()> {
        let definition = definition.into();
        self.inner.registry.write().unwrap().insert(definition)
    }

    /// Removes the definition for a concrete type. Idempotent.
    ///
    /// Returns whether a definition was removed. Resolutions already in
    /// flight complete against the definition they looked up; for a
    /// singleton that includes its cached instance.
    pub fn unregister<T: 'static>(&self) -> bool {
        self.unregister_key(&Key::of::<T>())
    }

    /// Removes the definition for a trait. Idempotent.
    pub fn unregister_trait<T: ?Sized + 'static>(&self) -> bool {
        self.unregister_key(&Key::of_trait::<T>())
    }

    /// Removes the definition for an erased key. Idempotent.
    pub fn unregister_key(&self, key: &Key) -> bool {
        self.inner.registry.write().unwrap().remove(key).is_some()
    }

    /// Removes a batch of definitions under one registry lock. Idempotent;
    /// keys with no definition are skipped.
    ///
    /// Returns how many definitions were removed.
    pub fn unregister_keys(&self, keys: &[Key]) -> usize {
        let mut registry = self.inner.registry.write().unwrap();
        let mut removed = 0;
        for key in keys {
            if registry.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Resolves a concrete type.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of::<T>();
        let any = self.resolve_key_in(&key, &[], None)?;
        downcast_concrete(any, key.display_name())
    }

    /// Resolves a trait object.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of_trait::<T>();
        let any = self.resolve_key_in(&key, &[], None)?;
        downcast_shared(any, key.display_name())
    }

    /// Resolves an erased key.
    ///
    /// The counterpart to [`Definition::dynamic`] for callers that only
    /// know keys at runtime. Concrete registrations come back as `Arc<T>`
    /// behind the erasure, trait registrations as `Arc<Arc<dyn Trait>>`.
    pub fn resolve_key(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_key_in(key, &[], None)
    }

    /// Creates a scope for the given qualifier.
    ///
    /// Fails with [`DiError::NotFound`] when no Scoped definition carries
    /// the qualifier; the error lists the qualifiers that are registered.
    /// The id labels the scope in diagnostics and in
    /// [`DiError::ScopeClosed`].
    pub fn create_scope(&self, qualifier: Qualifier, id: impl Into<String>) -> DiResult<Scope> {
        {
            let registry = self.inner.registry.read().unwrap();
            if !registry.has_scope_qualifier(&qualifier) {
                return Err(DiError::NotFound {
                    name: qualifier.display_name(),
                    registered: registry.scope_qualifier_names(),
                });
            }
        }
        Ok(Scope::new(self.clone(), qualifier, id.into()))
    }

    /// Constructs every eager singleton, in registration order.
    ///
    /// Stops at the first failure and returns its error; singletons already
    /// constructed stay cached.
    pub fn eager_initialize(&self) -> DiResult<()> {
        let keys = self.inner.registry.read().unwrap().eager_keys();
        for key in keys {
            self.resolve_key_in(&key, &[], None)?;
        }
        Ok(())
    }

    /// Checks every known dependency edge without constructing anything.
    ///
    /// Walks declared shapes and shapes already discovered at runtime,
    /// reporting the first dangling dependency or cycle. Definitions whose
    /// shape has not been discovered yet contribute no edges, so a clean
    /// verify is as strong as the declarations it was given.
    pub fn verify(&self) -> DiResult<()> {
        self.inner.registry.read().unwrap().verify()
    }

    /// Whether a definition exists for the concrete type.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.is_registered_key(&Key::of::<T>())
    }

    /// Whether a definition exists for the trait.
    pub fn is_registered_trait<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered_key(&Key::of_trait::<T>())
    }

    /// Whether a definition exists for the erased key.
    pub fn is_registered_key(&self, key: &Key) -> bool {
        self.inner.registry.read().unwrap().contains(key)
    }

    /// Registered names, in registration order.
    pub fn registered_names(&self) -> Vec<&'static str> {
        self.inner.registry.read().unwrap().names()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.inner.registry.read().unwrap().len()
    }

    /// Whether the container has no definitions.
    pub fn is_empty(&self) -> bool {
        self.inner.registry.read().unwrap().is_empty()
    }

    /// The dependency keys of a concrete type's definition, if known.
    ///
    /// Declared shapes are available immediately; inferred shapes only
    /// after the first construction has observed them.
    pub fn dependencies_of<T: 'static>(&self) -> Option<Arc<[Key]>> {
        self.dependencies_of_key(&Key::of::<T>())
    }

    /// The dependency keys of a trait's definition, if known.
    pub fn dependencies_of_trait<T: ?Sized + 'static>(&self) -> Option<Arc<[Key]>> {
        self.dependencies_of_key(&Key::of_trait::<T>())
    }

    /// The dependency keys of an erased key's definition, if known.
    pub fn dependencies_of_key(&self, key: &Key) -> Option<Arc<[Key]>> {
        self.inner
            .registry
            .read()
            .unwrap()
            .get(key)
            .and_then(|def| def.dependencies())
    }

    /// Adds a construction observer.
    ///
    /// Observers fire around factory executions only; cache hits are
    /// silent. See [`DiObserver`].
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) {
        self.inner.observers.write().unwrap().add(observer);
        self.inner.has_observers.store(true, Ordering::Relaxed);
    }

    /// Resolves `key` within an existing construction chain.
    ///
    /// `chain` holds the keys currently under construction in this call;
    /// the root entry points pass an empty chain.
    pub(crate) fn resolve_key_in(
        &self,
        key: &Key,
        chain: &[Key],
        scope: Option<&Scope>,
    ) -> DiResult<AnyArc> {
        let def = {
            let registry = self.inner.registry.read().unwrap();
            match registry.get(key) {
                Some(def) => def,
                None => {
                    return Err(DiError::NotFound {
                        name: key.display_name(),
                        registered: registry.names(),
                    })
                }
            }
        };

        match def.lifetime {
            Lifetime::Singleton => {
                if let Some(cached) = def.cell.get() {
                    return Ok(cached.clone());
                }
                // The cycle check must come before waiting on the cell, or
                // a self-dependent singleton would block on itself.
                self.check_cycle(key, chain)?;
                // Singleton construction severs the active scope: a shared
                // instance must never capture scope-local dependencies.
                let built = def
                    .cell
                    .get_or_try_init(|| self.construct(&def, chain, None))?;
                Ok(built.clone())
            }
            Lifetime::Factory => {
                self.check_cycle(key, chain)?;
                self.construct(&def, chain, scope)
            }
            Lifetime::Scoped => {
                let name = key.display_name();
                let required = match def.qualifier {
                    Some(required) => required,
                    None => {
                        return Err(DiError::ScopeMismatch {
                            name,
                            required: None,
                            active: scope.map(|s| s.qualifier().display_name()),
                        })
                    }
                };
                let active = match scope {
                    Some(active) => active,
                    None => {
                        return Err(DiError::ScopeMismatch {
                            name,
                            required: Some(required.display_name()),
                            active: None,
                        })
                    }
                };
                if active.qualifier() != required {
                    return Err(DiError::ScopeMismatch {
                        name,
                        required: Some(required.display_name()),
                        active: Some(active.qualifier().display_name()),
                    });
                }
                active.ensure_open()?;

                let slot = active.slot(key);
                if let Some(cached) = slot.get() {
                    return Ok(cached.clone());
                }
                self.check_cycle(key, chain)?;
                let built = slot.get_or_try_init(|| self.construct(&def, chain, scope))?;
                Ok(built.clone())
            }
        }
    }

    fn check_cycle(&self, key: &Key, chain: &[Key]) -> DiResult<()> {
        if chain.contains(key) {
            let mut path: Vec<&'static str> =
                chain.iter().map(|k| k.display_name()).collect();
            path.push(key.display_name());
            return Err(DiError::Circular(path));
        }
        Ok(())
    }

    /// Runs a definition's factory with a fresh child context.
    fn construct(
        &self,
        def: &Arc<Definition>,
        chain: &[Key],
        scope: Option<&Scope>,
    ) -> DiResult<AnyArc> {
        let key = def.key;
        let mut child_chain = Vec::with_capacity(chain.len() + 1);
        child_chain.extend_from_slice(chain);
        child_chain.push(key);

        let fetches = match &def.shape {
            Shape::Declared(keys) => FetchState::Declared {
                shape: keys.as_ref(),
                cursor: Cell::new(0),
            },
            Shape::Inferred => FetchState::Observing {
                seen: RefCell::new(Vec::new()),
            },
        };
        let ctx = ResolutionContext::new(self, scope, child_chain, fetches);

        let result = if self.inner.has_observers.load(Ordering::Relaxed) {
            let start = Instant::now();
            self.with_observers(|observers| observers.resolving(&key));
            let result = (def.ctor)(&ctx);
            match &result {
                Ok(_) => {
                    let duration = start.elapsed();
                    self.with_observers(|observers| observers.resolved(&key, duration));
                }
                Err(err) => {
                    self.with_observers(|observers| observers.resolution_failed(&key, err));
                }
            }
            result
        } else {
            (def.ctor)(&ctx)
        };
        let instance = result?;

        // A type key promises a concrete type; hold dynamic registrations
        // to that promise. Trait keys accept any conforming implementation.
        if let Key::Type(type_id, name) = key {
            if (&*instance).type_id() != type_id {
                return Err(DiError::Inference {
                    name,
                    cause: InferenceCause::WrongInstanceType { expected: name },
                });
            }
        }

        if let FetchState::Observing { seen } = &ctx.fetches {
            let observed = seen.take();
            let _ = def.discovered.set(Arc::from(observed));
        }

        Ok(instance)
    }

    fn with_observers(&self, f: impl FnOnce(&Observers)) {
        let observers = self.inner.observers.read().unwrap();
        if observers.has_observers() {
            f(&observers);
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn downcast_concrete<T: Send + Sync + 'static>(
    any: AnyArc,
    name: &'static str,
) -> DiResult<Arc<T>> {
    any.downcast::<T>().map_err(|_| DiError::Inference {
        name,
        cause: InferenceCause::WrongInstanceType {
            expected: std::any::type_name::<T>(),
        },
    })
}

pub(crate) fn downcast_shared<T: ?Sized + Send + Sync + 'static>(
    any: AnyArc,
    name: &'static str,
) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::Inference {
            name,
            cause: InferenceCause::WrongInstanceType {
                expected: std::any::type_name::<T>(),
            },
        })
}
