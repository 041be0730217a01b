//! Keys identifying definitions, and qualifiers identifying scopes.

use std::any::TypeId;

/// Key for definition storage and lookup.
///
/// A key uniquely identifies one definition in the registry. Concrete types
/// are keyed by `TypeId` (with the type name kept for messages); trait
/// objects are keyed by their `std::any::type_name`, which is the only
/// stable handle a `dyn Trait` has.
///
/// # Examples
///
/// ```rust
/// use ingot_di::Key;
///
/// trait Logger: Send + Sync {}
///
/// struct Database;
///
/// let by_type = Key::of::<Database>();
/// let by_trait = Key::of_trait::<dyn Logger>();
///
/// assert_eq!(by_type, Key::of::<Database>());
/// assert_ne!(by_type, by_trait);
/// assert!(by_trait.display_name().contains("Logger"));
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Key {
    /// Concrete type key: TypeId for lookup, name for diagnostics.
    Type(TypeId, &'static str),
    /// Trait-object key, by trait name.
    Trait(&'static str),
}

impl Key {
    /// Key for a concrete type.
    #[inline(always)]
    pub fn of<T: 'static>() -> Key {
        Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key for a trait object (`dyn Trait`).
    #[inline(always)]
    pub fn of_trait<T: ?Sized + 'static>() -> Key {
        Key::Trait(std::any::type_name::<T>())
    }

    /// The type or trait name, for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
        }
    }

    /// True for trait-object keys. Instance-type validation is skipped for
    /// these, since any conforming implementation is acceptable.
    pub fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(_))
    }
}

// Equality on the hot path compares TypeId only; the name is diagnostics.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a.cmp(b),
            (Key::Type(_, _), Key::Trait(_)) => Ordering::Less,
            (Key::Trait(_), Key::Type(_, _)) => Ordering::Greater,
            (Key::Trait(a), Key::Trait(b)) => a.cmp(b),
        }
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state); // Discriminant
                id.hash(state);
            }
            Key::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Qualifier naming a family of scopes.
///
/// Scoped definitions are registered under a qualifier, and a [`Scope`]
/// created with the same qualifier is the only place they resolve. A
/// qualifier is either a plain name or a marker type, so scope families can
/// be kept as type-checked as the rest of the graph.
///
/// [`Scope`]: crate::Scope
///
/// # Examples
///
/// ```rust
/// use ingot_di::Qualifier;
///
/// struct RequestScope;
///
/// let by_name = Qualifier::name("request");
/// let by_type = Qualifier::of::<RequestScope>();
///
/// assert_eq!(by_name, Qualifier::name("request"));
/// assert_ne!(by_name, by_type);
/// assert_eq!(by_name.display_name(), "request");
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Qualifier {
    /// Plain string qualifier.
    Named(&'static str),
    /// Marker-type qualifier.
    Typed(TypeId, &'static str),
}

impl Qualifier {
    /// Qualifier from a plain name.
    #[inline(always)]
    pub fn name(name: &'static str) -> Qualifier {
        Qualifier::Named(name)
    }

    /// Qualifier from a marker type.
    #[inline(always)]
    pub fn of<T: 'static>() -> Qualifier {
        Qualifier::Typed(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// The qualifier name, for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Qualifier::Named(name) => name,
            Qualifier::Typed(_, name) => name,
        }
    }
}

impl PartialEq for Qualifier {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Qualifier::Named(a), Qualifier::Named(b)) => a == b,
            (Qualifier::Typed(a, _), Qualifier::Typed(b, _)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Qualifier {}

impl std::hash::Hash for Qualifier {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Qualifier::Named(name) => {
                0u8.hash(state);
                name.hash(state);
            }
            Qualifier::Typed(id, _) => {
                1u8.hash(state);
                id.hash(state);
            }
        }
    }
}
