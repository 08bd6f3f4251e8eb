use std::{
    fmt::Debug,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use crate::provider::{Provider, SharedProvider};

/// Memoizing provider for scoped bindings
///
/// The wrapped provider is invoked at most once, even if [`Provider::get`] is called
/// concurrently from multiple threads. All callers observe the same value.
/// Once the value is cached the wrapped provider is released.
///
/// Note:
///
/// The wrapped provider must not call back into the same `DoubleCheck` while constructing,
/// scoped bindings on a dependency cycle have to be reached through a `Provider` or `Lazy`.
pub struct DoubleCheck<T> {
    once: OnceLock<T>,
    provider: Mutex<Option<SharedProvider<T>>>,
}
impl<T: Debug> Debug for DoubleCheck<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DoubleCheck").field(&self.once.get()).finish()
    }
}

impl<T> DoubleCheck<T> {
    pub fn new(provider: impl Provider<T> + 'static) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    pub fn from_shared(provider: SharedProvider<T>) -> Self {
        Self {
            once: OnceLock::new(),
            provider: Mutex::new(Some(provider)),
        }
    }

    /// Returns the cached value without constructing it
    pub fn cached(&self) -> Option<&T> {
        self.once.get()
    }
}

impl<T: Clone + Send + Sync> Provider<T> for DoubleCheck<T> {
    fn get(&self) -> T {
        if let Some(value) = self.once.get() {
            return value.clone();
        }

        // Lock provider, so only one caller constructs the value
        let mut provider = self.provider.lock().unwrap_or_else(PoisonError::into_inner);

        // Double check once - it might have been set while we waited for the lock
        if let Some(value) = self.once.get() {
            return value.clone();
        }

        let Some(inner) = provider.as_ref() else {
            unreachable!("provider is only released after the value was cached")
        };
        tracing::trace!("Constructing scoped {}", std::any::type_name::<T>());
        let value = inner.get();
        let value = self.once.get_or_init(|| value).clone();

        // Value is cached, the provider and everything it captured can go
        *provider = None;
        value
    }
}

/// Lazily computed value, constructed on first access and cached afterwards
pub struct Lazy<T>(Arc<DoubleCheck<T>>);
impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl<T: Debug> Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Lazy").field(&self.0.cached()).finish()
    }
}

impl<T: Clone + Send + Sync> Lazy<T> {
    pub fn new(provider: SharedProvider<T>) -> Self {
        Self(Arc::new(DoubleCheck::from_shared(provider)))
    }

    /// Accesses the value, constructing it on first access
    pub fn get(&self) -> T {
        self.0.get()
    }

    /// Returns true once the value was constructed
    pub fn is_initialized(&self) -> bool {
        self.0.cached().is_some()
    }
}

/// Provides a new [`Lazy`] for every call, all backed by the same provider
pub struct ProviderOfLazy<T> {
    provider: SharedProvider<T>,
}

impl<T> ProviderOfLazy<T> {
    pub fn new(provider: SharedProvider<T>) -> Self {
        Self { provider }
    }
}

impl<T: Clone + Send + Sync> Provider<Lazy<T>> for ProviderOfLazy<T> {
    fn get(&self) -> Lazy<T> {
        Lazy::new(self.provider.clone())
    }
}
