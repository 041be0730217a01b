//! Qualified scopes for per-scope instance caching.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use crate::definition::AnyArc;
use crate::error::{DiError, DiResult};
use crate::key::{Key, Qualifier};

use super::{downcast_concrete, downcast_shared, Container};

/// A live scope created by
/// [`Container::create_scope`](crate::Container::create_scope).
///
/// Scoped definitions whose qualifier matches this scope's qualifier resolve
/// to one instance per scope, cached here. Singleton and Factory definitions
/// resolve through a scope exactly as they do through the container.
///
/// Cloning a `Scope` yields another handle to the same cache; two scopes
/// created separately never share instances, even with equal qualifiers and
/// ids. The id is a diagnostic label, not an identity.
///
/// Closing the scope is idempotent and releases every cached instance.
/// Resolving through a closed scope fails with [`DiError::ScopeClosed`].
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, Definition, DiError, Qualifier};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Session { user: String }
///
/// let container = Container::new();
/// container.register(Definition::scoped(Qualifier::name("session"), |_| Session {
///     user: "alice".to_string(),
/// })).unwrap();
///
/// let scope = container.create_scope(Qualifier::name("session"), "sess-1").unwrap();
/// let a = scope.resolve::<Session>().unwrap();
/// let b = scope.resolve::<Session>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// scope.close();
/// match scope.resolve::<Session>() {
///     Err(DiError::ScopeClosed(id)) => assert_eq!(id, "sess-1"),
///     other => panic!("expected ScopeClosed, got {:?}", other),
/// }
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    container: Container,
    qualifier: Qualifier,
    id: String,
    /// Per-key write-once slots. The slot's `Arc` is handed out so
    /// construction never holds the map lock.
    slots: Mutex<HashMap<Key, Arc<OnceCell<AnyArc>>>>,
    closed: AtomicBool,
}

impl Scope {
    pub(crate) fn new(container: Container, qualifier: Qualifier, id: String) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                container,
                qualifier,
                id,
                slots: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Resolves a concrete type through this scope.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.ensure_open()?;
        let key = Key::of::<T>();
        let any = self
            .inner
            .container
            .resolve_key_in(&key, &[], Some(self))?;
        downcast_concrete(any, key.display_name())
    }

    /// Resolves a trait object through this scope.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.ensure_open()?;
        let key = Key::of_trait::<T>();
        let any = self
            .inner
            .container
            .resolve_key_in(&key, &[], Some(self))?;
        downcast_shared(any, key.display_name())
    }

    /// The qualifier this scope was created with.
    pub fn qualifier(&self) -> Qualifier {
        self.inner.qualifier
    }

    /// The diagnostic id this scope was created with.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Whether [`close`](Scope::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Closes the scope and releases its cached instances.
    ///
    /// Idempotent. Instances resolved before the close keep working; only
    /// new resolutions through the scope are rejected.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.slots.lock().unwrap().clear();
    }

    pub(crate) fn ensure_open(&self) -> DiResult<()> {
        if self.is_closed() {
            return Err(DiError::ScopeClosed(self.inner.id.clone()));
        }
        Ok(())
    }

    /// The write-once slot for `key`, created on first use.
    pub(crate) fn slot(&self, key: &Key) -> Arc<OnceCell<AnyArc>> {
        let mut slots = self.inner.slots.lock().unwrap();
        slots
            .entry(*key)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("qualifier", &self.inner.qualifier)
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
