//! Media cache: artifact maps and in-flight sets of one editing session.
//!
//! The maps are a session cache in front of the backend's persisted files,
//! not a source of truth. Regeneration never clears an entry; the previous
//! artifact stays readable until a new one replaces it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

use storyreel_models::{Artifact, ArtifactClass, ArtifactKey, ArtifactMap, FlightClass};

/// Artifact maps plus in-flight key sets.
#[derive(Debug, Default)]
pub struct MediaCache {
    maps: RwLock<HashMap<ArtifactClass, ArtifactMap>>,
    in_flight: Mutex<HashMap<FlightClass, HashSet<ArtifactKey>>>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: ArtifactClass, key: &ArtifactKey) -> Option<Artifact> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&class).and_then(|map| map.get(key)).cloned()
    }

    pub fn contains(&self, class: ArtifactClass, key: &ArtifactKey) -> bool {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&class).is_some_and(|map| map.contains_key(key))
    }

    /// Copy of one map.
    pub fn snapshot(&self, class: ArtifactClass) -> ArtifactMap {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&class).cloned().unwrap_or_default()
    }

    pub fn len(&self, class: ArtifactClass) -> usize {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&class).map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.values().all(|map| map.is_empty())
    }

    /// Store an artifact, replacing any previous one.
    pub fn insert(
        &self,
        class: ArtifactClass,
        key: ArtifactKey,
        artifact: Artifact,
    ) -> Option<Artifact> {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        maps.entry(class).or_default().insert(key, artifact)
    }

    /// Shallow merge: incoming keys win, every other entry is kept.
    pub fn merge(&self, class: ArtifactClass, incoming: ArtifactMap) {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        maps.entry(class).or_default().extend(incoming);
    }

    /// Replace one map wholesale.
    pub fn replace(&self, class: ArtifactClass, map: ArtifactMap) {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        maps.insert(class, map);
    }

    /// Replace every map at once; classes missing from `all` end up empty.
    pub fn replace_all(&self, mut all: HashMap<ArtifactClass, ArtifactMap>) {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        maps.clear();
        for class in ArtifactClass::ALL {
            maps.insert(*class, all.remove(class).unwrap_or_default());
        }
    }

    pub fn invalidate(&self, class: ArtifactClass, key: &ArtifactKey) -> Option<Artifact> {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        maps.get_mut(&class).and_then(|map| map.remove(key))
    }

    /// Drop every cached artifact. In-flight sets are left alone.
    pub fn clear(&self) {
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        maps.clear();
    }

    /// Mark `key` as in flight. Returns `false` if it already was.
    pub fn begin(&self, class: FlightClass, key: ArtifactKey) -> bool {
        let mut sets = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        sets.entry(class).or_default().insert(key)
    }

    pub fn finish(&self, class: FlightClass, key: &ArtifactKey) {
        let mut sets = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = sets.get_mut(&class) {
            set.remove(key);
        }
    }

    pub fn is_in_flight(&self, class: FlightClass, key: &ArtifactKey) -> bool {
        let sets = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        sets.get(&class).is_some_and(|set| set.contains(key))
    }

    /// Keys currently in flight for `class`, sorted.
    pub fn in_flight(&self, class: FlightClass) -> Vec<ArtifactKey> {
        let sets = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<_> = sets
            .get(&class)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn is_busy(&self, class: FlightClass) -> bool {
        let sets = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        sets.get(&class).is_some_and(|set| !set.is_empty())
    }
}
