use std::{any::type_name, sync::OnceLock};

use crate::{
    errors::DelegateError,
    provider::{Provider, SharedProvider},
};

/// Late bound provider for bindings on a dependency cycle
///
/// A generated graph creates the delegate before any other field, hands it to every consumer
/// and patches in the real provider once all other fields exist.
pub struct DelegateFactory<T> {
    delegate: OnceLock<SharedProvider<T>>,
}
impl<T> Default for DelegateFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelegateFactory<T> {
    pub fn new() -> Self {
        Self {
            delegate: OnceLock::new(),
        }
    }

    /// Patches in the real provider
    pub fn set_delegate(&self, provider: SharedProvider<T>) -> Result<(), DelegateError> {
        tracing::trace!("Patching delegate for {}", type_name::<T>());
        self.delegate
            .set(provider)
            .map_err(|_| DelegateError::AlreadySet(type_name::<T>()))
    }

    pub fn is_set(&self) -> bool {
        self.delegate.get().is_some()
    }
}

impl<T: Clone + Send + Sync> DelegateFactory<T> {
    /// Try to get a value from the delegate
    pub fn try_get(&self) -> Result<T, DelegateError> {
        self.delegate
            .get()
            .map(|provider| provider.get())
            .ok_or(DelegateError::NotSet(type_name::<T>()))
    }
}

impl<T: Clone + Send + Sync> Provider<T> for DelegateFactory<T> {
    /// Gets a value from the delegate
    ///
    /// # Panics
    /// - When accessed before the delegate was set, which only happens if a value is requested during graph construction
    fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}
