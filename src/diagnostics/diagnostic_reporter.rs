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

//! Summary statistics over collected diagnostics

use super::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use indexmap::IndexMap;
use std::fmt;

/// Summary statistics for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    /// Total number of diagnostics
    pub total_count: usize,
    /// Number of error diagnostics
    pub error_count: usize,
    /// Number of warning diagnostics
    pub warning_count: usize,
    /// Counts per code, in order of first occurrence
    pub by_code: IndexMap<DiagnosticCode, usize>,
    /// Counts per provider name, in order of first occurrence
    pub by_provider: IndexMap<String, usize>,
    /// Highest severity present, if any
    pub overall_severity: Option<Severity>,
}

impl DiagnosticSummary {
    /// Build a summary from a slice of diagnostics
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self {
            total_count: diagnostics.len(),
            ..Self::default()
        };

        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
            }

            *summary.by_code.entry(diagnostic.code).or_insert(0) += 1;
            *summary
                .by_provider
                .entry(diagnostic.provider.clone())
                .or_insert(0) += 1;

            if summary
                .overall_severity
                .is_none_or(|current| diagnostic.severity > current)
            {
                summary.overall_severity = Some(diagnostic.severity);
            }
        }

        summary
    }

    /// Check if any error diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Providers ordered by how many diagnostics they produced, most first
    pub fn noisiest_providers(&self) -> Vec<(&str, usize)> {
        let mut providers: Vec<_> = self
            .by_provider
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        providers.sort_by(|a, b| b.1.cmp(&a.1));
        providers
    }
}

impl fmt::Display for DiagnosticSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} diagnostics ({} errors, {} warnings)",
            self.total_count, self.error_count, self.warning_count
        )
    }
}
