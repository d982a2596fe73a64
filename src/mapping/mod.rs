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

//! Lazy mapping container
//!
//! This module provides the [`LazyMapping`] container, its key iterators and
//! evaluation statistics.

pub mod iter;
pub mod lazy_mapping;
pub mod stats;

pub use iter::{Keys, PendingKeys};
pub use lazy_mapping::LazyMapping;
pub use stats::EvaluationStats;
