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

//! Mapping configuration options

/// What happens to a key's providers once evaluation materializes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProviderRetention {
    /// Leave the provider list in place; it is never invoked again while the
    /// key stays materialized
    #[default]
    Keep,
    /// Drop the provider list as soon as the key is materialized
    Prune,
}

/// Configuration for lazy mapping behavior
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MappingConfig {
    /// Retention policy for providers of keys materialized by evaluation
    pub provider_retention: ProviderRetention,
}

impl MappingConfig {
    /// Create a new mapping configuration
    pub fn new(provider_retention: ProviderRetention) -> Self {
        Self { provider_retention }
    }

    /// Create a configuration that prunes providers once their key materializes
    pub fn pruning() -> Self {
        Self::new(ProviderRetention::Prune)
    }

    /// Set the provider retention policy
    pub fn with_provider_retention(mut self, provider_retention: ProviderRetention) -> Self {
        self.provider_retention = provider_retention;
        self
    }

    /// Check whether providers are dropped after materialization
    pub fn prunes_providers(&self) -> bool {
        self.provider_retention == ProviderRetention::Prune
    }
}
