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

//! Lazily materialized key/value mapping
//!
//! A [`LazyMapping`] holds two tables: the *store* of materialized values and
//! a registry of [`Provider`]s for keys that have not been computed yet. Reads
//! check the store first; on a miss the key's providers are invoked in
//! registration order until one of them supplies the key. Every value in a
//! provider's bundle is materialized along the way, so one expensive lookup can
//! fill several keys, but materialized values are never overwritten by
//! provider output.
//!
//! Provider failures and bundles that omit the requested key do not fail the
//! read. They are reported to the mapping's [`DiagnosticSink`] and the next
//! provider is tried.
//!
//! ```
//! use octofhir_lazy_mapping::{Bundle, LazyMapping, Provider};
//!
//! let mut mapping: LazyMapping<&str, i64> = LazyMapping::new();
//! let lookup = Provider::named("lookup", || {
//!     Ok(Some(Bundle::from([("name_len", 5), ("rank", 1)])))
//! });
//! mapping.register_providers(["name_len", "rank"], &lookup);
//!
//! assert_eq!(mapping.len(), 2);
//! assert_eq!(mapping.get("rank"), Ok(&1));
//! assert_eq!(mapping.get_materialized("name_len"), Some(&5));
//! ```

use super::iter::{Keys, PendingKeys};
use super::stats::EvaluationStats;
use crate::config::{MappingConfig, ProviderRetention};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LOG_TARGET, LogSink};
use crate::error::{LazyMappingError, LazyMappingResult};
use crate::provider::{Bundle, Provider};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Providers registered for one key, in registration order
pub(crate) type ProviderList<K, V> = SmallVec<[Provider<K, V>; 2]>;

/// Key/value mapping whose values may be computed on first access
pub struct LazyMapping<K, V> {
    store: IndexMap<K, V>,
    providers: IndexMap<K, ProviderList<K, V>>,
    config: MappingConfig,
    sink: Arc<dyn DiagnosticSink>,
    stats: EvaluationStats,
}

impl<K, V> LazyMapping<K, V> {
    /// Create an empty mapping that reports diagnostics through `log`
    pub fn new() -> Self {
        Self::with_config(MappingConfig::default())
    }

    /// Create an empty mapping with custom configuration
    pub fn with_config(config: MappingConfig) -> Self {
        Self {
            store: IndexMap::new(),
            providers: IndexMap::new(),
            config,
            sink: Arc::new(LogSink),
            stats: EvaluationStats::default(),
        }
    }

    /// Replace the diagnostic sink
    pub fn with_diagnostic_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Replace the diagnostic sink with a shared handle
    pub fn set_diagnostic_sink(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    /// The diagnostic sink receiving provider diagnostics
    pub fn diagnostic_sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// The mapping configuration
    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Provider evaluation counters
    pub fn stats(&self) -> &EvaluationStats {
        &self.stats
    }

    /// Reset provider evaluation counters
    pub fn reset_stats(&mut self) {
        self.stats = EvaluationStats::default();
    }

    /// Iterate over materialized entries in store order
    pub fn materialized(&self) -> indexmap::map::Iter<'_, K, V> {
        self.store.iter()
    }

    /// Number of materialized entries
    pub fn materialized_len(&self) -> usize {
        self.store.len()
    }

    /// Remove every materialized value and every provider
    pub fn clear(&mut self) {
        self.store.clear();
        self.providers.clear();
    }
}

impl<K, V> LazyMapping<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    /// Materialize `value` under `key`, dropping any providers pending for it
    ///
    /// Returns the previously materialized value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.providers.shift_remove(&key).is_some() {
            log::trace!(target: LOG_TARGET, "dropped pending providers for {key:?}");
        }
        self.store.insert(key, value)
    }

    /// Read a value, evaluating providers if it is not materialized yet
    ///
    /// Fails with [`LazyMappingError::KeyNotFound`] when the key is not
    /// materialized and no provider supplies it.
    pub fn get<Q>(&mut self, key: &Q) -> LazyMappingResult<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
    {
        match self.evaluate(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) | Err(_) => Err(LazyMappingError::key_not_found(key)),
        }
    }

    /// Read a value, falling back to `default`
    ///
    /// With `eval_lazy` set to `false`, providers are never invoked and any key
    /// that is not materialized yields `default`.
    pub fn get_or_default<Q>(&mut self, key: &Q, default: V, eval_lazy: bool) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
        V: Clone,
    {
        if !eval_lazy {
            return self.store.get(key).cloned().unwrap_or(default);
        }
        self.evaluate(key)
            .ok()
            .flatten()
            .cloned()
            .unwrap_or(default)
    }

    /// Read a value with provider evaluation, falling back to `default`
    pub fn get_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
        V: Clone,
    {
        self.get_or_default(key, default, true)
    }

    /// Read a materialized value without evaluating providers
    pub fn get_materialized<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.get(key)
    }

    /// Remove a key from both the store and the provider registry
    ///
    /// Returns the materialized value, if there was one. Fails with
    /// [`LazyMappingError::KeyNotFound`] if the key is in neither table.
    pub fn remove<Q>(&mut self, key: &Q) -> LazyMappingResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
    {
        let value = self.store.shift_remove(key);
        let pending = self.providers.shift_remove(key);
        if value.is_none() && pending.is_none() {
            return Err(LazyMappingError::key_not_found(key));
        }
        Ok(value)
    }

    /// Number of logical keys: materialized keys plus pending provider keys
    pub fn len(&self) -> usize {
        self.store.len() + self.pending_keys().count()
    }

    /// Check if the mapping has no materialized value and no provider
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical keys: materialized keys first, then pending keys
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(&self.store, &self.providers)
    }

    /// Keys with registered providers that are not materialized yet
    pub fn pending_keys(&self) -> PendingKeys<'_, K, V> {
        PendingKeys::new(&self.providers, &self.store)
    }

    /// Check logical membership without evaluating providers
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.contains_key(key) || self.providers.contains_key(key)
    }

    /// Check whether a key is materialized
    pub fn is_materialized<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.contains_key(key)
    }

    /// Providers registered for a key, in the order they will be tried
    pub fn providers_for<Q>(&self, key: &Q) -> &[Provider<K, V>]
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.providers
            .get(key)
            .map(|providers| providers.as_slice())
            .unwrap_or(&[])
    }

    /// Register `provider` as a source for each of `keys`
    ///
    /// Keys that are already materialized are skipped. A provider is attached
    /// to a key at most once.
    pub fn register_providers<I>(&mut self, keys: I, provider: &Provider<K, V>)
    where
        I: IntoIterator,
        I::Item: Into<K>,
    {
        for key in keys {
            let key = key.into();
            if self.store.contains_key(&key) {
                log::trace!(
                    target: LOG_TARGET,
                    "{key:?} already materialized, not attaching provider `{}`",
                    provider.name()
                );
                continue;
            }
            self.attach_provider(key, provider);
        }
    }

    /// Merge another lazy mapping into this one
    ///
    /// Materialized values of `other` overwrite ours and clear our pending
    /// providers for those keys. Providers of `other` are appended for keys
    /// that are not materialized here, skipping ones already attached.
    pub fn merge_from(&mut self, other: &LazyMapping<K, V>)
    where
        V: Clone,
    {
        for (key, value) in &other.store {
            self.insert(key.clone(), value.clone());
        }
        self.merge_providers_from(other);
    }

    /// Merge another lazy mapping, keeping values already materialized here
    ///
    /// Only keys missing from our store take `other`'s materialized values.
    /// Providers are merged as in [`merge_from`](Self::merge_from).
    pub fn merge_missing_from(&mut self, other: &LazyMapping<K, V>)
    where
        V: Clone,
    {
        for (key, value) in &other.store {
            if !self.store.contains_key(key) {
                self.insert(key.clone(), value.clone());
            }
        }
        self.merge_providers_from(other);
    }

    /// Evaluate providers for a key
    ///
    /// An already materialized key is returned without invoking any provider.
    /// Otherwise fails with [`LazyMappingError::KeyNotFound`] if the key has no
    /// providers, and returns `Ok(None)` if every provider was tried without
    /// supplying it.
    pub fn evaluate<Q>(&mut self, key: &Q) -> LazyMappingResult<Option<&V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
    {
        if let Some(index) = self.store.get_index_of(key) {
            return Ok(self.store.get_index(index).map(|(_, value)| value));
        }

        let providers = match self.providers.get(key) {
            Some(providers) if !providers.is_empty() => providers.clone(),
            _ => return Err(LazyMappingError::key_not_found(key)),
        };

        self.stats.evaluations += 1;
        log::debug!(
            target: LOG_TARGET,
            "evaluating {key:?} with {} provider(s)",
            providers.len()
        );

        for provider in &providers {
            self.stats.provider_calls += 1;
            let bundle = match provider.call() {
                Ok(Some(bundle)) if !bundle.is_empty() => bundle,
                Ok(_) => {
                    self.stats.empty_results += 1;
                    log::trace!(
                        target: LOG_TARGET,
                        "provider `{}` had no data for {key:?}",
                        provider.name()
                    );
                    continue;
                }
                Err(err) => {
                    self.stats.provider_failures += 1;
                    self.report(Diagnostic::provider_failure(key, provider.name(), &err));
                    continue;
                }
            };

            self.materialize(bundle);

            match self.store.get_index_of(key) {
                Some(index) => {
                    return Ok(self.store.get_index(index).map(|(_, value)| value));
                }
                None => {
                    self.stats.contract_violations += 1;
                    self.report(Diagnostic::contract_violation(key, provider.name()));
                }
            }
        }

        log::debug!(target: LOG_TARGET, "no provider supplied {key:?}");
        Ok(None)
    }

    /// Evaluate providers for a key, falling back to `default`
    ///
    /// Fails only when the key is neither materialized nor has providers.
    pub fn evaluate_or<Q>(&mut self, key: &Q, default: V) -> LazyMappingResult<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
        V: Clone,
    {
        Ok(self.evaluate(key)?.cloned().unwrap_or(default))
    }

    /// Evaluate every pending key
    ///
    /// Returns the number of pending keys that ended up materialized, either
    /// directly or through another key's bundle.
    pub fn materialize_all(&mut self) -> usize {
        let pending: Vec<K> = self.pending_keys().cloned().collect();
        for key in &pending {
            if !self.store.contains_key(key) {
                let _ = self.evaluate(key);
            }
        }
        pending
            .iter()
            .filter(|key| self.store.contains_key(*key))
            .count()
    }

    fn merge_providers_from(&mut self, other: &LazyMapping<K, V>) {
        for (key, providers) in &other.providers {
            if self.store.contains_key(key) {
                continue;
            }
            for provider in providers {
                self.attach_provider(key.clone(), provider);
            }
        }
    }

    fn attach_provider(&mut self, key: K, provider: &Provider<K, V>) {
        let providers = self.providers.entry(key).or_default();
        if providers.iter().any(|existing| existing.same_as(provider)) {
            return;
        }
        providers.push(provider.clone());
    }

    /// Write bundle values that are not materialized yet; existing values win
    fn materialize(&mut self, bundle: Bundle<K, V>) {
        let prune = self.config.provider_retention == ProviderRetention::Prune;
        for (key, value) in bundle {
            if self.store.contains_key(&key) {
                continue;
            }
            if prune {
                self.providers.shift_remove(&key);
            }
            self.store.insert(key, value);
            self.stats.values_materialized += 1;
        }
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
    }
}

impl<K, V> Default for LazyMapping<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for LazyMapping<K, V> {
    /// Shallow copy: values are cloned, providers and the sink are shared
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            providers: self.providers.clone(),
            config: self.config.clone(),
            sink: Arc::clone(&self.sink),
            stats: EvaluationStats::default(),
        }
    }
}

impl<K, V> Extend<(K, V)> for LazyMapping<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for LazyMapping<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        mapping.extend(iter);
        mapping
    }
}

impl<K, V> From<IndexMap<K, V>> for LazyMapping<K, V> {
    fn from(store: IndexMap<K, V>) -> Self {
        Self {
            store,
            ..Self::new()
        }
    }
}

impl<K, V> fmt::Debug for LazyMapping<K, V>
where
    K: Hash + Eq + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyMapping")
            .field("store", &self.store)
            .field(
                "pending",
                &PendingKeys::new(&self.providers, &self.store).collect::<Vec<_>>(),
            )
            .finish()
    }
}
