use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use lattice_runtime::{
    provider_fn, DelegateError, DelegateFactory, DoubleCheck, InstanceFactory, Lazy, MapFactory,
    MapProviderFactory, Provider, ProviderOfLazy, SetFactory, SharedProvider,
};

#[derive(Debug)]
struct Service {
    id: usize,
}

fn counting_provider(counter: Arc<AtomicUsize>) -> SharedProvider<Arc<Service>> {
    Arc::new(provider_fn(move || {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(Service { id })
    }))
}

#[test]
fn double_check_constructs_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let scoped = DoubleCheck::from_shared(counting_provider(counter.clone()));

    let first = scoped.get();
    let second = scoped.get();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn double_check_constructs_once_under_contention() {
    let counter = Arc::new(AtomicUsize::new(0));
    let scoped = Arc::new(DoubleCheck::from_shared(counting_provider(counter.clone())));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scoped = scoped.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                scoped.get().id
            })
        })
        .collect();

    let ids: HashSet<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(ids.len(), 1, "all threads must observe the same instance");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn unscoped_provider_constructs_every_time() {
    let counter = Arc::new(AtomicUsize::new(0));
    let unscoped = counting_provider(counter.clone());

    assert_eq!(unscoped.get().id, 0);
    assert_eq!(unscoped.get().id, 1);
}

#[test]
fn lazy_defers_construction() {
    let counter = Arc::new(AtomicUsize::new(0));
    let lazy = Lazy::new(counting_provider(counter.clone()));

    assert!(!lazy.is_initialized());
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let cloned = lazy.clone();
    assert!(Arc::ptr_eq(&lazy.get(), &cloned.get()));
    assert!(lazy.is_initialized());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn provider_of_lazy_hands_out_independent_lazies() {
    let counter = Arc::new(AtomicUsize::new(0));
    let provider = ProviderOfLazy::new(counting_provider(counter.clone()));

    let first = provider.get();
    let second = provider.get();

    assert_eq!(first.get().id, 0);
    assert_eq!(first.get().id, 0);
    assert_eq!(second.get().id, 1);
}

#[test]
fn delegate_factory_breaks_cycles() {
    let delegate: Arc<DelegateFactory<Arc<Service>>> = Arc::new(DelegateFactory::new());
    assert!(!delegate.is_set());
    assert_eq!(
        delegate.try_get().unwrap_err(),
        DelegateError::NotSet(std::any::type_name::<Arc<Service>>())
    );

    // A consumer captures the placeholder before the real provider exists
    let consumer: SharedProvider<usize> = {
        let delegate = delegate.clone();
        Arc::new(provider_fn(move || delegate.get().id + 100))
    };

    let counter = Arc::new(AtomicUsize::new(0));
    delegate
        .set_delegate(Arc::new(DoubleCheck::from_shared(counting_provider(counter))))
        .unwrap();

    assert_eq!(consumer.get(), 100);
    assert!(delegate.is_set());
}

#[test]
fn delegate_factory_can_only_be_set_once() {
    let delegate: DelegateFactory<u32> = DelegateFactory::new();
    delegate.set_delegate(Arc::new(InstanceFactory::new(1u32))).unwrap();

    let err = delegate
        .set_delegate(Arc::new(InstanceFactory::new(2u32)))
        .unwrap_err();
    assert!(matches!(err, DelegateError::AlreadySet(_)));
    assert_eq!(delegate.get(), 1);
}

#[test]
#[should_panic(expected = "accessed before it was set")]
fn delegate_factory_panics_when_unset() {
    let delegate: DelegateFactory<u32> = DelegateFactory::new();
    delegate.get();
}

#[test]
fn set_factory_collects_contributions() {
    let set = SetFactory::<String>::builder()
        .add_provider(Arc::new(InstanceFactory::new("a".to_string())))
        .add_provider(Arc::new(InstanceFactory::new("b".to_string())))
        .add_collection_provider(Arc::new(InstanceFactory::new(HashSet::from([
            "b".to_string(),
            "c".to_string(),
        ]))))
        .build();

    let expected: HashSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
    assert_eq!(set.get(), expected);
}

#[test]
fn map_factories_build_values_or_providers() {
    let counter = Arc::new(AtomicUsize::new(0));
    let entries = vec![
        ("first", counting_provider(counter.clone())),
        ("second", counting_provider(counter.clone())),
    ];

    let providers = MapProviderFactory::new(entries.clone()).get();
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert_eq!(providers.len(), 2);

    let values: HashMap<&str, Arc<Service>> = MapFactory::new(entries).get();
    assert_eq!(values.len(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
