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

//! Lazily materialized key/value mappings
//!
//! A [`LazyMapping`] behaves like an ordered map, but some of its values can be
//! left out at construction time and computed on first access by registered
//! [`Provider`]s. Several providers may back the same key as ordered fallbacks,
//! and a single provider may supply a whole bundle of related keys at once.
//!
//! Provider problems never fail a read: they are reported as
//! [`Diagnostic`]s to the mapping's [`DiagnosticSink`], which defaults to the
//! `log` facade.

#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod provider;

// Re-export main types
pub use config::{MappingConfig, ProviderRetention};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticCode, DiagnosticSink, DiagnosticSummary, LogSink,
    NullSink, Severity,
};
pub use error::{LazyMappingError, LazyMappingResult};
pub use mapping::{EvaluationStats, Keys, LazyMapping, PendingKeys};
pub use provider::{Bundle, Provider, ProviderError, ProviderResult};
