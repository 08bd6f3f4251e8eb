use std::{fmt::Debug, sync::Arc};

/// Supplies values of `T`
///
/// Every binding of a generated graph is exposed as a provider.
/// Whether each call returns a new value depends on the binding, see [`crate::DoubleCheck`].
pub trait Provider<T>: Send + Sync {
    fn get(&self) -> T;
}

/// Shared, type erased provider as stored in generated graph fields
pub type SharedProvider<T> = Arc<dyn Provider<T>>;

impl<T, P: Provider<T> + ?Sized> Provider<T> for Arc<P> {
    fn get(&self) -> T {
        (**self).get()
    }
}

/// Provider backed by a closure
pub struct FnProvider<F>(F);

impl<T, F: Fn() -> T + Send + Sync> Provider<T> for FnProvider<F> {
    fn get(&self) -> T {
        (self.0)()
    }
}

/// Wraps a closure into a [`Provider`]
pub fn provider_fn<T, F: Fn() -> T + Send + Sync>(f: F) -> FnProvider<F> {
    FnProvider(f)
}

/// Provides an existing instance, used for bound instances and graph parameters
#[derive(Clone)]
pub struct InstanceFactory<T> {
    instance: T,
}
impl<T: Debug> Debug for InstanceFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InstanceFactory").field(&self.instance).finish()
    }
}

impl<T> InstanceFactory<T> {
    pub fn new(instance: T) -> Self {
        Self { instance }
    }
}

impl<T: Clone + Send + Sync> Provider<T> for InstanceFactory<T> {
    fn get(&self) -> T {
        self.instance.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_factory_returns_same_instance() {
        let instance = Arc::new("graph".to_string());
        let factory = InstanceFactory::new(instance.clone());

        assert!(Arc::ptr_eq(&factory.get(), &instance));
        assert!(Arc::ptr_eq(&factory.get(), &instance));
    }

    #[test]
    fn test_fn_provider_invokes_each_time() {
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let provider = provider_fn(|| counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst));

        assert_eq!(provider.get(), 0);
        assert_eq!(provider.get(), 1);
    }
}
