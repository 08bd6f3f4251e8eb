//! Runtime support for graphs generated by Lattice.
//!
//! Generated graph implementations hold their bindings as [`Provider`]s:
//! - unscoped bindings are plain factories and construct a new value on every call
//! - scoped bindings are wrapped in a [`DoubleCheck`], constructing their value at most once per graph instance
//! - bindings on a dependency cycle are created as a [`DelegateFactory`] first and patched once the graph is complete

pub mod delegate;
pub mod double_check;
pub mod errors;
pub mod multibinding;
pub mod provider;

pub use delegate::DelegateFactory;
pub use double_check::{DoubleCheck, Lazy, ProviderOfLazy};
pub use errors::DelegateError;
pub use multibinding::{MapFactory, MapProviderFactory, SetFactory};
pub use provider::{provider_fn, InstanceFactory, Provider, SharedProvider};
