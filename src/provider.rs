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

//! Provider functions that materialize mapping values on demand
//!
//! A provider is a zero-argument function returning an optional [`Bundle`] of
//! key/value pairs. One provider may be registered under several keys, so a
//! single expensive lookup can fill many fields at once. Providers are shared
//! by reference: cloning a [`Provider`] clones a handle to the same function,
//! and that shared identity is what de-duplicates registrations.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Values supplied by one provider invocation, in the order they were produced
pub type Bundle<K, V> = IndexMap<K, V>;

/// Outcome of a provider invocation
///
/// `Ok(None)` and `Ok(Some(empty))` both mean "no data".
pub type ProviderResult<K, V> = Result<Option<Bundle<K, V>>, ProviderError>;

type ProviderFn<K, V> = Arc<dyn Fn() -> ProviderResult<K, V> + Send + Sync>;

/// Failure reported by a provider
///
/// Providers are arbitrary code, so any recoverable failure they hit is
/// funneled into this one type. Panics are not caught.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    /// Create a provider error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap any error type, keeping its display message
    pub fn from_error<E: std::error::Error>(err: E) -> Self {
        Self::new(err.to_string())
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ProviderError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Shared handle to a provider function
pub struct Provider<K, V> {
    name: Arc<str>,
    func: ProviderFn<K, V>,
}

impl<K, V> Provider<K, V> {
    /// Create a provider named after the function's type
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> ProviderResult<K, V> + Send + Sync + 'static,
    {
        Self::named(std::any::type_name::<F>(), func)
    }

    /// Create a provider with an explicit name used in diagnostics
    pub fn named<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn() -> ProviderResult<K, V> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Create a provider from a function that cannot fail
    pub fn infallible<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn() -> Option<Bundle<K, V>> + Send + Sync + 'static,
    {
        Self::named(name, move || Ok(func()))
    }

    /// Name reported in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the provider function
    pub fn call(&self) -> ProviderResult<K, V> {
        (self.func)()
    }

    /// Check whether both handles refer to the same provider function
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }
}

impl<K, V> Provider<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a provider that always yields a copy of the same bundle
    pub fn constant(name: impl Into<Arc<str>>, bundle: Bundle<K, V>) -> Self {
        Self::named(name, move || Ok(Some(bundle.clone())))
    }
}

impl<K, V> Clone for Provider<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            func: Arc::clone(&self.func),
        }
    }
}

impl<K, V> PartialEq for Provider<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<K, V> Eq for Provider<K, V> {}

impl<K, V> fmt::Debug for Provider<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("name", &self.name).finish()
    }
}

impl<K, V> fmt::Display for Provider<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
