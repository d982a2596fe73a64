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

//! Diagnostics for provider evaluation
//!
//! Provider failures and contract violations are recoverable: evaluation
//! continues with the next provider. They are reported as [`Diagnostic`]s to a
//! [`DiagnosticSink`] owned by the mapping, rather than to a global logger, so
//! callers and tests can observe them deterministically.

pub mod diagnostic;
pub mod diagnostic_reporter;
pub mod sink;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use diagnostic_reporter::DiagnosticSummary;
pub use sink::{CollectingSink, DiagnosticSink, LOG_TARGET, LogSink, NullSink};
