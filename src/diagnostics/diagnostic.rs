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

//! Core diagnostic types

use crate::provider::ProviderError;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Warning - a provider failed, evaluation moved on to the next one
    #[default]
    Warning,
    /// Error - a provider broke its contract
    Error,
}

/// Diagnostic codes emitted during provider evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    /// Provider returned an error
    ProviderFailure,
    /// Provider returned data without the key it was registered for
    ProviderContractViolation,
}

impl DiagnosticCode {
    /// Severity attached to this code
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::ProviderFailure => Severity::Warning,
            DiagnosticCode::ProviderContractViolation => Severity::Error,
        }
    }

    /// Short stable code string
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ProviderFailure => "L001",
            DiagnosticCode::ProviderContractViolation => "L002",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic produced while evaluating providers for a key
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Debug rendering of the key being evaluated
    pub key: String,
    /// Name of the provider involved
    pub provider: String,
    /// Human-readable message
    pub message: String,
    /// Simple contextual help message
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic; severity follows the code
    pub fn new(
        code: DiagnosticCode,
        key: impl Into<String>,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: code.severity(),
            code,
            key: key.into(),
            provider: provider.into(),
            message: message.into(),
            help: Self::generate_help(code),
        }
    }

    /// Provider invocation returned an error
    pub fn provider_failure<Q: fmt::Debug + ?Sized>(
        key: &Q,
        provider: &str,
        error: &ProviderError,
    ) -> Self {
        Self::new(
            DiagnosticCode::ProviderFailure,
            format!("{key:?}"),
            provider,
            format!("provider `{provider}` failed: {error}"),
        )
    }

    /// Provider produced a bundle that omits the requested key
    pub fn contract_violation<Q: fmt::Debug + ?Sized>(key: &Q, provider: &str) -> Self {
        Self::new(
            DiagnosticCode::ProviderContractViolation,
            format!("{key:?}"),
            provider,
            format!("provider `{provider}` did not supply promised key {key:?}"),
        )
    }

    fn generate_help(code: DiagnosticCode) -> Option<String> {
        match code {
            DiagnosticCode::ProviderFailure => None,
            DiagnosticCode::ProviderContractViolation => Some(
                "Register the provider only for keys its bundle always contains".to_string(),
            ),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            match self.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN",
            },
            self.code,
            self.message
        )?;
        if let Some(help) = &self.help {
            write!(f, " (help: {help})")?;
        }
        Ok(())
    }
}
