//! Recipe lifetime definitions.

/// Lifetimes controlling how resolved instances are created and cached.
///
/// Every [`Definition`](crate::Definition) carries exactly one lifetime.
/// The lifetime decides where the engine caches the produced instance, if
/// anywhere.
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, Definition, Qualifier};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct AuditEntry { seq: u32 }
/// struct Session { user: String }
///
/// let container = Container::new();
///
/// // Singleton: one instance for the whole container.
/// container.register(Definition::singleton(|_| Database {
///     url: "postgres://localhost".to_string(),
/// })).unwrap();
///
/// // Factory: a fresh instance on every resolve.
/// container.register(Definition::factory(|_| AuditEntry { seq: 0 })).unwrap();
///
/// // Scoped: one instance per qualified scope.
/// container.register(Definition::scoped(Qualifier::name("session"), |_| Session {
///     user: "anonymous".to_string(),
/// })).unwrap();
///
/// let db1 = container.resolve::<Database>().unwrap();
/// let db2 = container.resolve::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2)); // Same instance
///
/// let e1 = container.resolve::<AuditEntry>().unwrap();
/// let e2 = container.resolve::<AuditEntry>().unwrap();
/// assert!(!Arc::ptr_eq(&e1, &e2)); // Always fresh
///
/// let scope = container.create_scope(Qualifier::name("session"), "sess-1").unwrap();
/// let s1 = scope.resolve::<Session>().unwrap();
/// let s2 = scope.resolve::<Session>().unwrap();
/// assert!(Arc::ptr_eq(&s1, &s2)); // Same within the scope
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Single instance per container, cached forever.
    ///
    /// Singleton recipes run their factory once, on first resolve (or during
    /// [`eager_initialize`](crate::Container::eager_initialize)), and the
    /// instance is shared by every caller and every scope afterwards. Under
    /// concurrent first resolves at most one factory execution completes;
    /// the losers block and observe the winner's instance.
    Singleton,
    /// New instance per resolve, never cached.
    ///
    /// Factory recipes run their factory on every resolution, even twice in
    /// the same call chain. Other containers call this lifetime "transient".
    Factory,
    /// Single instance per qualified scope, cached for the scope's lifetime.
    ///
    /// Scoped recipes can only be resolved through a [`Scope`](crate::Scope)
    /// whose qualifier matches the one given at registration. Each scope
    /// caches its own instance; closing the scope releases it.
    Scoped,
}
