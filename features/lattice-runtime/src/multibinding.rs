use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use crate::provider::{Provider, SharedProvider};

/// Builds a `Set` multibinding from its contributions on every call
pub struct SetFactory<T> {
    elements: Vec<SharedProvider<T>>,
    collections: Vec<SharedProvider<HashSet<T>>>,
}

impl<T> SetFactory<T> {
    pub fn builder() -> SetFactoryBuilder<T> {
        SetFactoryBuilder {
            elements: Vec::new(),
            collections: Vec::new(),
        }
    }
}

pub struct SetFactoryBuilder<T> {
    elements: Vec<SharedProvider<T>>,
    collections: Vec<SharedProvider<HashSet<T>>>,
}

impl<T> SetFactoryBuilder<T> {
    /// Contribution of a single element
    pub fn add_provider(mut self, provider: SharedProvider<T>) -> Self {
        self.elements.push(provider);
        self
    }

    /// Contribution of multiple elements at once
    pub fn add_collection_provider(mut self, provider: SharedProvider<HashSet<T>>) -> Self {
        self.collections.push(provider);
        self
    }

    pub fn build(self) -> SetFactory<T> {
        SetFactory {
            elements: self.elements,
            collections: self.collections,
        }
    }
}

impl<T: Eq + Hash + Send + Sync> Provider<HashSet<T>> for SetFactory<T> {
    fn get(&self) -> HashSet<T> {
        let mut set = HashSet::with_capacity(self.elements.len());
        set.extend(self.elements.iter().map(|provider| provider.get()));
        for collection in &self.collections {
            set.extend(collection.get());
        }
        set
    }
}

/// Builds a `Map<K, V>` multibinding from its contributions on every call
pub struct MapFactory<K, V> {
    entries: Vec<(K, SharedProvider<V>)>,
}

/// Builds a `Map<K, Provider<V>>` multibinding, values are not constructed
pub struct MapProviderFactory<K, V> {
    entries: Vec<(K, SharedProvider<V>)>,
}

impl<K, V> MapFactory<K, V> {
    pub fn new(entries: Vec<(K, SharedProvider<V>)>) -> Self {
        Self { entries }
    }
}

impl<K, V> MapProviderFactory<K, V> {
    pub fn new(entries: Vec<(K, SharedProvider<V>)>) -> Self {
        Self { entries }
    }
}

impl<K: Eq + Hash + Clone + Send + Sync, V> Provider<HashMap<K, V>> for MapFactory<K, V> {
    fn get(&self) -> HashMap<K, V> {
        self.entries
            .iter()
            .map(|(key, provider)| (key.clone(), provider.get()))
            .collect()
    }
}

impl<K: Eq + Hash + Clone + Send + Sync, V> Provider<HashMap<K, SharedProvider<V>>>
    for MapProviderFactory<K, V>
{
    fn get(&self) -> HashMap<K, SharedProvider<V>> {
        self.entries
            .iter()
            .map(|(key, provider)| (key.clone(), provider.clone()))
            .collect()
    }
}
