//! Definitions: the recipes the container resolves.
//!
//! A [`Definition`] couples a [`Key`] with a [`Lifetime`], an optional scope
//! [`Qualifier`], a dependency shape, and a type-erased constructor. The
//! [`DefinitionBuilder`] returned by the constructor families below tweaks
//! the recipe (declared dependencies, eager startup, scope qualifier) before
//! it is handed to [`Container::register`](crate::Container::register).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::ResolutionContext;
use crate::deps::DepsFn;
use crate::error::{BoxError, DiError, DiResult, InferenceCause};
use crate::key::{Key, Qualifier};
use crate::lifetime::Lifetime;

/// Type-erased instance storage.
///
/// Concrete instances are stored as `Arc<T>` behind this alias; trait
/// instances are double-wrapped as `Arc<Arc<dyn Trait>>` so the inner
/// `Arc<dyn Trait>` survives the `Any` round trip.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Erased constructor stored inside a [`Definition`].
pub(crate) type Ctor =
    Arc<dyn for<'a> Fn(&ResolutionContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// How the dependencies of a definition are known.
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    /// Registered up front, in positional order.
    Declared(Arc<[Key]>),
    /// Observed during the first construction.
    Inferred,
}

/// A registered recipe: key, lifetime, dependency shape, constructor.
///
/// Built through the associated constructor families ([`singleton`],
/// [`factory`], [`scoped`], their `try_*`, `*_with` and `*_trait` variants,
/// [`instance`] and [`dynamic`]), each of which returns a
/// [`DefinitionBuilder`].
///
/// [`singleton`]: Definition::singleton
/// [`factory`]: Definition::factory
/// [`scoped`]: Definition::scoped
/// [`instance`]: Definition::instance
/// [`dynamic`]: Definition::dynamic
pub struct Definition {
    pub(crate) key: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) qualifier: Option<Qualifier>,
    pub(crate) eager: bool,
    pub(crate) shape: Shape,
    pub(crate) ctor: Ctor,
    /// Singleton slot. Filled at most once; losers of the construction race
    /// block until the winner has stored the instance.
    pub(crate) cell: OnceCell<AnyArc>,
    /// Dependencies observed during the first construction of an
    /// [`Shape::Inferred`] definition.
    pub(crate) discovered: OnceCell<Arc<[Key]>>,
}

impl Definition {
    fn builder(key: Key, lifetime: Lifetime, ctor: Ctor) -> DefinitionBuilder {
        DefinitionBuilder {
            key,
            lifetime,
            qualifier: None,
            eager: false,
            deps: None,
            ctor,
        }
    }

    /// Registers a singleton: constructed on first resolution, then shared.
    ///
    /// The factory runs at most once, even under concurrent first
    /// resolutions; every caller receives the same `Arc`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition};
    /// use std::sync::Arc;
    ///
    /// struct Database { url: String }
    ///
    /// let container = Container::new();
    /// container.register(Definition::singleton(|_| Database {
    ///     url: "postgres://localhost".to_string(),
    /// })).unwrap();
    ///
    /// let a = container.resolve::<Database>().unwrap();
    /// let b = container.resolve::<Database>().unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn singleton<T, F>(factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> T + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        };
        Self::builder(Key::of::<T>(), Lifetime::Singleton, Arc::new(ctor))
    }

    /// Registers a factory: a fresh instance on every resolution.
    pub fn factory<T, F>(factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> T + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        };
        Self::builder(Key::of::<T>(), Lifetime::Factory, Arc::new(ctor))
    }

    /// Registers a scoped definition: one instance per scope carrying the
    /// given qualifier.
    ///
    /// Resolving it outside a matching scope fails with
    /// [`DiError::ScopeMismatch`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition, Qualifier};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(u32);
    ///
    /// let container = Container::new();
    /// container.register(Definition::scoped(Qualifier::name("request"), |_| {
    ///     RequestId(7)
    /// })).unwrap();
    ///
    /// let scope = container.create_scope(Qualifier::name("request"), "req-1").unwrap();
    /// let a = scope.resolve::<RequestId>().unwrap();
    /// let b = scope.resolve::<RequestId>().unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    ///
    /// // No scope active on the container itself.
    /// assert!(container.resolve::<RequestId>().is_err());
    /// ```
    pub fn scoped<T, F>(qualifier: Qualifier, factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> T + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        };
        Self::builder(Key::of::<T>(), Lifetime::Scoped, Arc::new(ctor)).in_scope(qualifier)
    }

    /// Registers a singleton with a fallible factory.
    ///
    /// The factory error is wrapped exactly once into
    /// [`DiError::Inference`] with its message preserved; a [`DiError`]
    /// forwarded from a context fetch with `?` passes through unchanged.
    /// A failed construction leaves the singleton slot empty, so a later
    /// resolution runs the factory again.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition, DiError};
    ///
    /// #[derive(Debug)]
    /// struct Config { port: u16 }
    ///
    /// let container = Container::new();
    /// container.register(Definition::try_singleton(|_| {
    ///     "not-a-port".parse::<u16>()
    ///         .map(|port| Config { port })
    ///         .map_err(Into::into)
    /// })).unwrap();
    ///
    /// match container.resolve::<Config>() {
    ///     Err(DiError::Inference { name, .. }) => assert!(name.contains("Config")),
    ///     other => panic!("expected Inference, got {:?}", other),
    /// }
    /// ```
    pub fn try_singleton<T, F>(factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::builder(
            Key::of::<T>(),
            Lifetime::Singleton,
            erase_fallible(Key::of::<T>().display_name(), factory),
        )
    }

    /// Registers a factory with a fallible constructor.
    pub fn try_factory<T, F>(factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::builder(
            Key::of::<T>(),
            Lifetime::Factory,
            erase_fallible(Key::of::<T>().display_name(), factory),
        )
    }

    /// Registers a scoped definition with a fallible constructor.
    pub fn try_scoped<T, F>(qualifier: Qualifier, factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::builder(
            Key::of::<T>(),
            Lifetime::Scoped,
            erase_fallible(Key::of::<T>().display_name(), factory),
        )
        .in_scope(qualifier)
    }

    /// Registers a singleton whose dependency shape is read off the factory
    /// signature.
    ///
    /// Each `Arc<T>` parameter becomes one declared dependency, in parameter
    /// order. The container fetches them positionally before the factory
    /// body runs, so a misdeclared parameter fails with a precise
    /// [`DiError::Inference`] instead of a surprise at construction depth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition};
    /// use std::sync::Arc;
    ///
    /// struct Database;
    /// struct Cache;
    /// struct Repo { db: Arc<Database>, cache: Arc<Cache> }
    ///
    /// let container = Container::new();
    /// container.register(Definition::singleton(|_| Database)).unwrap();
    /// container.register(Definition::singleton(|_| Cache)).unwrap();
    /// container.register(Definition::singleton_with(
    ///     |db: Arc<Database>, cache: Arc<Cache>| Repo { db, cache },
    /// )).unwrap();
    ///
    /// let repo = container.resolve::<Repo>().unwrap();
    /// let db = container.resolve::<Database>().unwrap();
    /// assert!(Arc::ptr_eq(&repo.db, &db));
    /// ```
    pub fn singleton_with<T, D, F>(factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: DepsFn<D, T>,
    {
        Self::with_shape(Key::of::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a factory whose dependency shape is read off its signature.
    pub fn factory_with<T, D, F>(factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: DepsFn<D, T>,
    {
        Self::with_shape(Key::of::<T>(), Lifetime::Factory, factory)
    }

    /// Registers a scoped definition whose dependency shape is read off its
    /// signature.
    pub fn scoped_with<T, D, F>(qualifier: Qualifier, factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: DepsFn<D, T>,
    {
        Self::with_shape(Key::of::<T>(), Lifetime::Scoped, factory).in_scope(qualifier)
    }

    fn with_shape<T, D, F>(key: Key, lifetime: Lifetime, factory: F) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
        F: DepsFn<D, T>,
    {
        let shape = F::shape();
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory.call(ctx)?))
        };
        let mut builder = Self::builder(key, lifetime, Arc::new(ctor));
        builder.deps = Some(shape);
        builder
    }

    /// Registers a singleton bound to a trait key.
    ///
    /// The factory returns an `Arc<dyn Trait>`; resolve it with
    /// [`Container::resolve_trait`](crate::Container::resolve_trait).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition};
    /// use std::sync::Arc;
    ///
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct StdoutLogger;
    /// impl Logger for StdoutLogger {
    ///     fn log(&self, message: &str) { println!("{}", message); }
    /// }
    ///
    /// let container = Container::new();
    /// container.register(Definition::singleton_trait::<dyn Logger, _>(|_| {
    ///     Arc::new(StdoutLogger)
    /// })).unwrap();
    ///
    /// let logger = container.resolve_trait::<dyn Logger>().unwrap();
    /// logger.log("ready");
    /// ```
    pub fn singleton_trait<T, F>(factory: F) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            // Double-wrap so the trait object survives the Any round trip.
            Ok(Arc::new(factory(ctx)))
        };
        Self::builder(Key::of_trait::<T>(), Lifetime::Singleton, Arc::new(ctor))
    }

    /// Registers a factory bound to a trait key.
    pub fn factory_trait<T, F>(factory: F) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        };
        Self::builder(Key::of_trait::<T>(), Lifetime::Factory, Arc::new(ctor))
    }

    /// Registers a scoped definition bound to a trait key.
    pub fn scoped_trait<T, F>(qualifier: Qualifier, factory: F) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)))
        };
        Self::builder(Key::of_trait::<T>(), Lifetime::Scoped, Arc::new(ctor)).in_scope(qualifier)
    }

    /// Registers a singleton bound to a trait key, with a fallible factory.
    ///
    /// Errors behave as in [`try_singleton`](Definition::try_singleton):
    /// foreign errors wrap once into [`DiError::Inference`], engine errors
    /// pass through unchanged, and a failed construction leaves the slot
    /// empty for a later retry.
    pub fn try_singleton_trait<T, F>(factory: F) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        Self::builder(
            Key::of_trait::<T>(),
            Lifetime::Singleton,
            erase_fallible(Key::of_trait::<T>().display_name(), factory),
        )
    }

    /// Registers a factory bound to a trait key, with a fallible
    /// constructor.
    pub fn try_factory_trait<T, F>(factory: F) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        Self::builder(
            Key::of_trait::<T>(),
            Lifetime::Factory,
            erase_fallible(Key::of_trait::<T>().display_name(), factory),
        )
    }

    /// Registers a scoped definition bound to a trait key, with a fallible
    /// constructor.
    pub fn try_scoped_trait<T, F>(qualifier: Qualifier, factory: F) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolutionContext<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        Self::builder(
            Key::of_trait::<T>(),
            Lifetime::Scoped,
            erase_fallible(Key::of_trait::<T>().display_name(), factory),
        )
        .in_scope(qualifier)
    }

    /// Registers an already constructed instance as a singleton.
    ///
    /// Every resolution returns the same `Arc` around the given value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition};
    ///
    /// struct Settings { workers: usize }
    ///
    /// let container = Container::new();
    /// container.register(Definition::instance(Settings { workers: 4 })).unwrap();
    /// assert_eq!(container.resolve::<Settings>().unwrap().workers, 4);
    /// ```
    pub fn instance<T>(value: T) -> DefinitionBuilder
    where
        T: Send + Sync + 'static,
    {
        let arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolutionContext<'_>| -> DiResult<AnyArc> { Ok(arc.clone()) };
        Self::builder(Key::of::<T>(), Lifetime::Singleton, Arc::new(ctor))
    }

    /// Registers an already constructed trait object as a singleton.
    pub fn instance_trait<T>(value: Arc<T>) -> DefinitionBuilder
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolutionContext<'_>| -> DiResult<AnyArc> { Ok(arc.clone()) };
        Self::builder(Key::of_trait::<T>(), Lifetime::Singleton, Arc::new(ctor))
    }

    /// Registers a raw, type-erased constructor under an explicit key.
    ///
    /// This is the escape hatch for plugin systems and registrations built
    /// at runtime, where the concrete type is not known at the registration
    /// site. The constructor must store concrete instances as `Arc<T>` and
    /// trait instances as `Arc<Arc<dyn Trait>>`; resolutions for a
    /// [`Key::Type`] verify the produced instance against the key and fail
    /// with [`DiError::Inference`] on a mismatch.
    ///
    /// For a Scoped dynamic definition, attach the qualifier with
    /// [`DefinitionBuilder::in_scope`]; without one the definition is
    /// unresolvable from any scope.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{AnyArc, Container, Definition, Key, Lifetime};
    /// use std::sync::Arc;
    ///
    /// struct Plugin { id: u32 }
    ///
    /// let container = Container::new();
    /// container.register(Definition::dynamic(
    ///     Key::of::<Plugin>(),
    ///     Lifetime::Singleton,
    ///     |_| Ok(Arc::new(Plugin { id: 1 }) as AnyArc),
    /// )).unwrap();
    ///
    /// assert_eq!(container.resolve::<Plugin>().unwrap().id, 1);
    /// ```
    pub fn dynamic<F>(key: Key, lifetime: Lifetime, ctor: F) -> DefinitionBuilder
    where
        F: for<'a> Fn(&ResolutionContext<'a>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Self::builder(key, lifetime, Arc::new(ctor))
    }

    /// The key this definition is registered under.
    pub fn key(&self) -> Key {
        self.key
    }

    /// The lifetime of instances produced by this definition.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// The scope qualifier, for Scoped definitions that carry one.
    pub fn qualifier(&self) -> Option<Qualifier> {
        self.qualifier
    }

    /// Whether this definition is constructed at startup by
    /// [`Container::eager_initialize`](crate::Container::eager_initialize).
    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// The dependency keys of this definition, if known.
    ///
    /// Declared shapes are available immediately; inferred shapes only after
    /// the first construction has observed them. Returns `None` before that.
    pub fn dependencies(&self) -> Option<Arc<[Key]>> {
        match &self.shape {
            Shape::Declared(keys) => Some(keys.clone()),
            Shape::Inferred => self.discovered.get().cloned(),
        }
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("qualifier", &self.qualifier)
            .field("eager", &self.eager)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

fn erase_fallible<T, F>(name: &'static str, factory: F) -> Ctor
where
    T: Send + Sync + 'static,
    F: Fn(&ResolutionContext<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &ResolutionContext<'_>| -> DiResult<AnyArc> {
        match factory(ctx) {
            Ok(value) => Ok(Arc::new(value)),
            // Context fetch errors forwarded with `?` stay engine errors;
            // only foreign errors get wrapped.
            Err(err) => match err.downcast::<DiError>() {
                Ok(di) => Err(*di),
                Err(other) => Err(DiError::Inference {
                    name,
                    cause: InferenceCause::FactoryFailed(other.to_string()),
                }),
            },
        }
    })
}

/// Builder returned by the [`Definition`] constructor families.
///
/// Finish it by passing it to
/// [`Container::register`](crate::Container::register), which accepts
/// `impl Into<Definition>`, or call [`build`](DefinitionBuilder::build)
/// directly.
pub struct DefinitionBuilder {
    key: Key,
    lifetime: Lifetime,
    qualifier: Option<Qualifier>,
    eager: bool,
    deps: Option<Vec<Key>>,
    ctor: Ctor,
}

impl DefinitionBuilder {
    /// Appends a concrete type to the declared dependency shape.
    ///
    /// Declaring any dependency switches the definition from inferred to
    /// declared: positional fetches inside the factory are then checked
    /// against the declaration, position by position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingot_di::{Container, Definition};
    ///
    /// struct Database;
    /// struct Repo { _db: std::sync::Arc<Database> }
    ///
    /// let container = Container::new();
    /// container.register(Definition::singleton(|_| Database)).unwrap();
    /// container.register(
    ///     Definition::singleton(|ctx| Repo { _db: ctx.next().unwrap() })
    ///         .depends_on::<Database>(),
    /// ).unwrap();
    ///
    /// container.resolve::<Repo>().unwrap();
    /// ```
    pub fn depends_on<D: 'static>(mut self) -> Self {
        self.deps.get_or_insert_with(Vec::new).push(Key::of::<D>());
        self
    }

    /// Appends a trait to the declared dependency shape.
    pub fn depends_on_trait<D: ?Sized + 'static>(mut self) -> Self {
        self.deps
            .get_or_insert_with(Vec::new)
            .push(Key::of_trait::<D>());
        self
    }

    /// Flags the definition for construction at startup.
    ///
    /// [`Container::eager_initialize`](crate::Container::eager_initialize)
    /// constructs flagged singletons in registration order. The flag has no
    /// effect on Factory and Scoped lifetimes.
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Attaches the scope qualifier of a Scoped definition.
    ///
    /// The typed `scoped*` constructors already set this; it is only needed
    /// with [`Definition::dynamic`]. A qualifier on any other lifetime is
    /// inert: resolution ignores it and it does not make the name
    /// scopeable through [`Container::create_scope`](crate::Container::create_scope).
    pub fn in_scope(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Finalizes the recipe.
    pub fn build(self) -> Definition {
        let shape = match self.deps {
            Some(keys) => Shape::Declared(Arc::from(keys)),
            None => Shape::Inferred,
        };
        Definition {
            key: self.key,
            lifetime: self.lifetime,
            qualifier: self.qualifier,
            eager: self.eager,
            shape,
            ctor: self.ctor,
            cell: OnceCell::new(),
            discovered: OnceCell::new(),
        }
    }
}

impl From<DefinitionBuilder> for Definition {
    fn from(builder: DefinitionBuilder) -> Self {
        builder.build()
    }
}
