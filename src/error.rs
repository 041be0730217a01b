//! Error types for dependency resolution.

use std::fmt;

/// Boxed error type accepted from fallible factories.
///
/// Whatever a `try_*` factory returns is wrapped exactly once into
/// [`DiError::Inference`] with the original message preserved; engine errors
/// raised by nested fetches pass through construction boundaries unwrapped.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during registration and resolution.
///
/// # Examples
///
/// ```rust
/// use ingot_di::{Container, DiError};
///
/// #[derive(Debug)]
/// struct Missing;
///
/// let container = Container::new();
/// match container.resolve::<Missing>() {
///     Err(DiError::NotFound { name, registered }) => {
///         assert!(name.contains("Missing"));
///         assert!(registered.is_empty());
///     }
///     other => panic!("expected NotFound, got {:?}", other),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No definition is registered for the requested key (or, at scope
    /// creation, no Scoped definition carries the requested qualifier).
    /// Carries every registered name in registration order.
    NotFound {
        /// Requested key or qualifier name.
        name: &'static str,
        /// What is registered instead, in registration order.
        registered: Vec<&'static str>,
    },
    /// A definition for this key is already registered. Registration never
    /// silently replaces; unregister the old definition first.
    Duplicate(&'static str),
    /// Circular dependency chain, in resolution order. The first element is
    /// the original request and the last repeats the offending key, so
    /// `A -> B -> A` reads as the actual cycle.
    Circular(Vec<&'static str>),
    /// The type-inference family: a factory failure, a produced instance of
    /// the wrong type, or a positional fetch that disagrees with the
    /// declared dependency shape. See [`InferenceCause`].
    Inference {
        /// The definition being built when inference failed.
        name: &'static str,
        /// What exactly went wrong.
        cause: InferenceCause,
    },
    /// A Scoped definition was resolved without a matching scope.
    ScopeMismatch {
        /// The scoped definition.
        name: &'static str,
        /// Qualifier the definition was registered under. `None` means the
        /// definition was registered scoped but never given a qualifier,
        /// which makes it unresolvable from any scope.
        required: Option<&'static str>,
        /// Qualifier of the active scope, if any scope was active at all.
        active: Option<&'static str>,
    },
    /// Resolution was attempted through a scope that has been closed.
    ScopeClosed(String),
}

/// The specific failure behind [`DiError::Inference`].
#[derive(Debug, Clone)]
pub enum InferenceCause {
    /// The factory returned an error; the original message is preserved.
    FactoryFailed(String),
    /// The produced instance does not have the key's concrete type. Never
    /// raised for trait keys, where any conforming implementation passes.
    WrongInstanceType {
        /// The type the key requires.
        expected: &'static str,
    },
    /// A positional fetch ran past the end of the declared shape.
    ShapeOverrun {
        /// Length of the declared shape.
        declared: usize,
    },
    /// A positional fetch requested a different type than the shape declares
    /// at that position.
    ShapeMismatch {
        /// Zero-based position of the fetch.
        index: usize,
        /// What the shape declares there.
        declared: &'static str,
        /// What the fetch asked for.
        requested: &'static str,
    },
    /// An indexed fetch was used inside a definition with no declared shape.
    IndexedFetchWithoutShape {
        /// The index that was requested.
        index: usize,
    },
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound { name, registered } => {
                if registered.is_empty() {
                    write!(
                        f,
                        "No definition found for {} (nothing is registered). \
                         Did you forget to register it?",
                        name
                    )
                } else {
                    write!(
                        f,
                        "No definition found for {} (registered: {}). \
                         Did you forget to register it?",
                        name,
                        registered.join(", ")
                    )
                }
            }
            DiError::Duplicate(name) => {
                write!(f, "Definition for {} is already registered", name)
            }
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::Inference { name, cause } => {
                write!(f, "Type inference failed for {}: {}", name, cause)
            }
            DiError::ScopeMismatch { name, required, active } => match (required, active) {
                (None, _) => write!(
                    f,
                    "Scoped definition {} was registered without a scope qualifier",
                    name
                ),
                (Some(required), Some(active)) => write!(
                    f,
                    "Scoped definition {} requires scope qualifier '{}', \
                     but the active scope qualifier is '{}'",
                    name, required, active
                ),
                (Some(required), None) => write!(
                    f,
                    "Scoped definition {} requires scope qualifier '{}', \
                     but no scope is active",
                    name, required
                ),
            },
            DiError::ScopeClosed(scope_id) => write!(
                f,
                "Scope '{}' has been closed. Cannot resolve from a closed scope",
                scope_id
            ),
        }
    }
}

impl fmt::Display for InferenceCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceCause::FactoryFailed(message) => {
                write!(f, "factory returned an error: {}", message)
            }
            InferenceCause::WrongInstanceType { expected } => {
                write!(f, "produced instance is not a {}", expected)
            }
            InferenceCause::ShapeOverrun { declared } => {
                write!(
                    f,
                    "too many positional fetches (declared shape has {} dependencies)",
                    declared
                )
            }
            InferenceCause::ShapeMismatch { index, declared, requested } => {
                write!(
                    f,
                    "positional fetch {} requested {} but {} is declared",
                    index, requested, declared
                )
            }
            InferenceCause::IndexedFetchWithoutShape { index } => {
                write!(
                    f,
                    "indexed fetch {} requires a declared dependency shape",
                    index
                )
            }
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for dependency resolution operations.
pub type DiResult<T> = Result<T, DiError>;
