// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key iterators
//!
//! Both iterators borrow the mapping and never evaluate providers. They are
//! `Clone`, so a sequence can be restarted from any point.

use super::lazy_mapping::ProviderList;
use indexmap::IndexMap;
use indexmap::map;
use std::hash::Hash;
use std::iter::FusedIterator;

/// Keys registered with providers but not yet materialized, in registration order
pub struct PendingKeys<'a, K, V> {
    providers: map::Keys<'a, K, ProviderList<K, V>>,
    store: &'a IndexMap<K, V>,
}

impl<'a, K, V> PendingKeys<'a, K, V> {
    pub(crate) fn new(
        providers: &'a IndexMap<K, ProviderList<K, V>>,
        store: &'a IndexMap<K, V>,
    ) -> Self {
        Self {
            providers: providers.keys(),
            store,
        }
    }
}

impl<'a, K: Hash + Eq, V> Iterator for PendingKeys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store;
        self.providers.find(|key| !store.contains_key(*key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.providers.size_hint().1)
    }
}

impl<K: Hash + Eq, V> FusedIterator for PendingKeys<'_, K, V> {}

impl<K, V> Clone for PendingKeys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
            store: self.store,
        }
    }
}

/// Logical keys of a mapping: materialized keys in store order, then pending keys
pub struct Keys<'a, K, V> {
    materialized: map::Keys<'a, K, V>,
    pending: PendingKeys<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(
        store: &'a IndexMap<K, V>,
        providers: &'a IndexMap<K, ProviderList<K, V>>,
    ) -> Self {
        Self {
            materialized: store.keys(),
            pending: PendingKeys::new(providers, store),
        }
    }
}

impl<'a, K: Hash + Eq, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.materialized.next().or_else(|| self.pending.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (materialized, _) = self.materialized.size_hint();
        let pending = self.pending.size_hint().1;
        (materialized, pending.map(|pending| pending + materialized))
    }
}

impl<K: Hash + Eq, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            materialized: self.materialized.clone(),
            pending: self.pending.clone(),
        }
    }
}
