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

//! Diagnostic sinks
//!
//! Every [`LazyMapping`](crate::LazyMapping) owns a handle to one sink. Provider
//! failures and contract violations are delivered there instead of being
//! returned to the reader, so one broken provider never aborts a read.

use super::diagnostic::{Diagnostic, Severity};
use super::diagnostic_reporter::DiagnosticSummary;
use parking_lot::Mutex;
use std::sync::Arc;

/// Log target used by [`LogSink`]
pub const LOG_TARGET: &str = "lazy_mapping";

/// Receiver of provider diagnostics
pub trait DiagnosticSink: Send + Sync {
    /// Handle one diagnostic
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards diagnostics to the `log` facade
///
/// Warnings go to `log::warn!`, errors to `log::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!(target: LOG_TARGET, "{diagnostic}"),
            Severity::Error => log::error!(target: LOG_TARGET, "{diagnostic}"),
        }
    }
}

/// Discards every diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Records diagnostics in memory
///
/// Clones share the same buffer, so a caller can keep one handle and give
/// another to the mapping.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    /// Create an empty collecting sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded diagnostics in report order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Drain the recorded diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// Summary statistics over the recorded diagnostics
    pub fn summary(&self) -> DiagnosticSummary {
        DiagnosticSummary::from_diagnostics(&self.diagnostics.lock())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.diagnostics.lock().push(diagnostic.clone());
    }
}
