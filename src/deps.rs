//! Dependency shapes derived from factory signatures.
//!
//! A factory written as `|db: Arc<Database>, cache: Arc<Cache>| Repo { db, cache }`
//! already spells out what it needs and in which order. [`DepsFn`] turns that
//! parameter list into a declared dependency shape so the `*_with` registration
//! family can record the shape and drive the positional fetches itself.

use std::sync::Arc;

use crate::container::ResolutionContext;
use crate::error::DiResult;
use crate::key::Key;

/// A factory whose dependency shape is read off its parameter list.
///
/// Implemented for `Fn(Arc<A>, Arc<B>, ...) -> T` up to eight parameters.
/// Every parameter must be a concrete `Arc<T>`; trait-object dependencies go
/// through [`ResolutionContext::next_trait`] inside a plain factory instead.
pub trait DepsFn<Deps, Out>: Send + Sync + 'static {
    /// Ordered dependency keys, one per parameter.
    fn shape() -> Vec<Key>;

    /// Fetches each parameter positionally, then runs the factory.
    fn call(&self, ctx: &ResolutionContext<'_>) -> DiResult<Out>;
}

macro_rules! impl_deps_fn {
    ($($dep:ident),*) => {
        impl<Func, Out, $($dep),*> DepsFn<($($dep,)*), Out> for Func
        where
            Func: Fn($(Arc<$dep>),*) -> Out + Send + Sync + 'static,
            $($dep: Send + Sync + 'static,)*
        {
            fn shape() -> Vec<Key> {
                vec![$(Key::of::<$dep>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call(&self, ctx: &ResolutionContext<'_>) -> DiResult<Out> {
                $(let $dep = ctx.next::<$dep>()?;)*
                Ok((self)($($dep),*))
            }
        }
    };
}

impl_deps_fn!();
impl_deps_fn!(A);
impl_deps_fn!(A, B);
impl_deps_fn!(A, B, C);
impl_deps_fn!(A, B, C, D);
impl_deps_fn!(A, B, C, D, E);
impl_deps_fn!(A, B, C, D, E, F);
impl_deps_fn!(A, B, C, D, E, F, G);
impl_deps_fn!(A, B, C, D, E, F, G, H);
