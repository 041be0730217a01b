//! # ingot-di
//!
//! Lifetime-aware dependency resolution with explicit dependency shapes and
//! qualified scopes.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton, Factory, and Scoped definitions
//! - **Declared dependency shapes**: registered up front and checked against
//!   every positional fetch, or inferred from the first construction
//! - **Qualified scopes**: per-scope instances keyed by a registration-time
//!   qualifier, with idempotent close
//! - **Thread-safe**: write-once singletons with at-most-one factory
//!   execution, isolated per-call construction chains
//! - **Precise errors**: missing definitions, duplicates, cycle paths, shape
//!   disagreements, scope mismatches, closed scopes
//!
//! ## Quick Start
//!
//! ```rust
//! use ingot_di::{Container, Definition};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container.register(Definition::singleton(|_| Database {
//!     connection_string: "postgres://localhost".to_string(),
//! })).unwrap();
//!
//! // The dependency shape is read off the factory signature.
//! container.register(Definition::factory_with(
//!     |db: Arc<Database>| UserService { db },
//! )).unwrap();
//!
//! let service = container.resolve::<UserService>().unwrap();
//! assert_eq!(service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: constructed once per container and shared; concurrent
//!   first resolutions run the factory at most once
//! - **Factory**: a fresh instance on every resolution
//! - **Scoped**: one instance per [`Scope`] whose qualifier matches the
//!   definition's qualifier
//!
//! ## Dependency shapes
//!
//! A definition either declares its dependencies or has them inferred.
//! Declared shapes come from the `*_with` constructors (read off the factory
//! signature) or from [`DefinitionBuilder::depends_on`]; positional fetches
//! with [`ResolutionContext::next`] are then checked against the declaration
//! and out-of-order fetches fail with a precise error instead of resolving
//! the wrong thing. Without a declaration, the first construction records
//! what the factory actually fetched, which later feeds
//! [`Container::dependencies_of`] and [`Container::verify`].
//!
//! ```rust
//! use ingot_di::{Container, Definition};
//! use std::sync::Arc;
//!
//! struct Database;
//! struct Cache;
//! struct Report {
//!     db: Arc<Database>,
//!     cache: Arc<Cache>,
//! }
//!
//! let container = Container::new();
//! container.register(Definition::singleton(|_| Database)).unwrap();
//! container.register(Definition::singleton(|_| Cache)).unwrap();
//! container.register(
//!     Definition::factory(|ctx| Report {
//!         db: ctx.next().unwrap(),
//!         cache: ctx.next().unwrap(),
//!     })
//!     .depends_on::<Database>()
//!     .depends_on::<Cache>(),
//! ).unwrap();
//!
//! container.resolve::<Report>().unwrap();
//! ```
//!
//! ## Trait resolution
//!
//! ```rust
//! use ingot_di::{Container, Definition};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! let container = Container::new();
//! container.register(Definition::instance_trait::<dyn Logger>(
//!     Arc::new(ConsoleLogger),
//! )).unwrap();
//!
//! let logger = container.resolve_trait::<dyn Logger>().unwrap();
//! logger.log("Hello, World!");
//! ```
//!
//! ## Qualified scopes
//!
//! ```rust
//! use ingot_di::{Container, Definition, Qualifier};
//! use std::sync::{Arc, Mutex};
//!
//! struct RequestId(String);
//!
//! let container = Container::new();
//! let counter = Arc::new(Mutex::new(0));
//! let counter_clone = counter.clone();
//!
//! container.register(Definition::scoped(Qualifier::name("request"), move |_| {
//!     let mut c = counter_clone.lock().unwrap();
//!     *c += 1;
//!     RequestId(format!("req-{}", *c))
//! })).unwrap();
//!
//! let scope1 = container.create_scope(Qualifier::name("request"), "r1").unwrap();
//! let scope2 = container.create_scope(Qualifier::name("request"), "r2").unwrap();
//!
//! let a = scope1.resolve::<RequestId>().unwrap();
//! let b = scope1.resolve::<RequestId>().unwrap();
//! let c = scope2.resolve::<RequestId>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b)); // same scope, same instance
//! assert!(!Arc::ptr_eq(&a, &c)); // different scope, different instance
//! ```
//!
//! ## Observability
//!
//! Construction events (factory start, completion with timing, failure) fan
//! out to registered [`DiObserver`]s; cache hits are silent. The built-in
//! [`LoggingObserver`] and [`MetricsObserver`] cover development needs, and
//! the trait is small enough to back with any logging stack.
//!
//! ## A note on factories and handles
//!
//! Inside a factory, fetch dependencies through the [`ResolutionContext`]
//! it receives. Resolving through a captured [`Container`] clone starts a
//! fresh chain that cannot see the construction it is nested in, which
//! disables cycle detection for that branch.

pub mod container;
pub mod definition;
pub mod deps;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;

mod registry;

pub use container::{Container, ResolutionContext, Scope};
pub use definition::{AnyArc, Definition, DefinitionBuilder};
pub use deps::DepsFn;
pub use error::{BoxError, DiError, DiResult, InferenceCause};
pub use key::{Key, Qualifier};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver, MetricsObserver};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Config {
        name: &'static str,
    }

    #[derive(Debug)]
    struct Service {
        config: Arc<Config>,
    }

    #[test]
    fn test_end_to_end_mixed_lifetimes() {
        let container = Container::new();
        container
            .register(Definition::instance(Config { name: "app" }))
            .unwrap();
        container
            .register(Definition::factory_with(|config: Arc<Config>| Service {
                config,
            }))
            .unwrap();

        let one = container.resolve::<Service>().unwrap();
        let two = container.resolve::<Service>().unwrap();
        assert_eq!(one.config.name, "app");
        assert!(!Arc::ptr_eq(&one, &two));
        assert!(Arc::ptr_eq(&one.config, &two.config));
    }

    #[test]
    fn test_missing_definition_reports_what_is_registered() {
        let container = Container::new();
        container
            .register(Definition::instance(Config { name: "app" }))
            .unwrap();

        match container.resolve::<Service>() {
            Err(DiError::NotFound { name, registered }) => {
                assert!(name.contains("Service"));
                assert_eq!(registered.len(), 1);
                assert!(registered[0].contains("Config"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_introspection() {
        let container = Container::new();
        assert!(container.is_empty());
        container
            .register(Definition::instance(Config { name: "app" }))
            .unwrap();
        assert_eq!(container.len(), 1);
        assert!(container.is_registered::<Config>());
        assert!(!container.is_registered::<Service>());
        assert!(container.unregister::<Config>());
        assert!(!container.unregister::<Config>());
        assert!(container.is_empty());
    }
}
