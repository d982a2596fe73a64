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

//! Evaluation statistics

use std::fmt;

/// Counters for provider evaluation on one mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Number of evaluations that had to consult providers
    pub evaluations: u64,
    /// Total provider invocations
    pub provider_calls: u64,
    /// Invocations that returned an error
    pub provider_failures: u64,
    /// Invocations that returned no data
    pub empty_results: u64,
    /// Invocations whose bundle omitted the requested key
    pub contract_violations: u64,
    /// Values written to the store from provider bundles
    pub values_materialized: u64,
}

impl EvaluationStats {
    /// Share of provider calls that failed, as a percentage
    pub fn failure_rate(&self) -> f64 {
        if self.provider_calls == 0 {
            return 0.0;
        }
        (self.provider_failures as f64 / self.provider_calls as f64) * 100.0
    }

    /// Average number of provider calls per evaluation
    pub fn calls_per_evaluation(&self) -> f64 {
        if self.evaluations == 0 {
            return 0.0;
        }
        self.provider_calls as f64 / self.evaluations as f64
    }
}

impl fmt::Display for EvaluationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} evaluations, {} provider calls ({} failed, {} empty, {} contract violations), {} values materialized",
            self.evaluations,
            self.provider_calls,
            self.provider_failures,
            self.empty_results,
            self.contract_violations,
            self.values_materialized
        )
    }
}
