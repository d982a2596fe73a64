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

//! Behavioral tests for lazy mapping reads, writes and merges

use indexmap::indexmap;
use octofhir_lazy_mapping::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type Mapping = LazyMapping<String, i64>;

/// Provider that counts its invocations and returns a fixed bundle
fn counting_provider(name: &str, bundle: &[(&str, i64)]) -> (Provider<String, i64>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let bundle: Bundle<String, i64> = bundle
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect();
    let provider = Provider::named(name.to_string(), move || {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(Some(bundle.clone()))
    });
    (provider, calls)
}

fn raising_provider(name: &str) -> (Provider<String, i64>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let provider = Provider::named(name.to_string(), move || {
        seen.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::new("lookup service unavailable"))
    });
    (provider, calls)
}

fn collecting_mapping() -> (Mapping, CollectingSink) {
    let sink = CollectingSink::new();
    let mapping = Mapping::new().with_diagnostic_sink(sink.clone());
    (mapping, sink)
}

#[rstest]
#[case::no_provider(false)]
#[case::with_provider(true)]
fn set_value_wins_over_providers(#[case] with_provider: bool) {
    let mut mapping = Mapping::new();
    let (provider, calls) = counting_provider("lookup", &[("k", 1)]);
    if with_provider {
        mapping.register_providers(["k"], &provider);
    }

    mapping.insert("k".to_string(), 5);

    assert_eq!(mapping.get("k"), Ok(&5));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(mapping.providers_for("k").is_empty());
}

#[test]
fn failing_provider_falls_back_to_next() {
    let (mut mapping, sink) = collecting_mapping();
    let (p1, p1_calls) = raising_provider("primary");
    let (p2, p2_calls) = counting_provider("secondary", &[("k", 5)]);
    mapping.register_providers(["k"], &p1);
    mapping.register_providers(["k"], &p2);

    assert_eq!(mapping.get("k"), Ok(&5));

    assert_eq!(p1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(p2_calls.load(Ordering::SeqCst), 1);
    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::ProviderFailure);
    assert_eq!(diagnostics[0].provider, "primary");
    assert_eq!(diagnostics[0].key, "\"k\"");
}

#[test]
fn contract_violation_falls_back_and_keeps_side_values() {
    let (mut mapping, sink) = collecting_mapping();
    let (p1, _) = counting_provider("omits_key", &[("other_key", 1)]);
    let (p2, _) = counting_provider("supplies_key", &[("k", 7)]);
    mapping.register_providers(["k"], &p1);
    mapping.register_providers(["k"], &p2);

    assert_eq!(mapping.get("k"), Ok(&7));

    assert_eq!(mapping.get_materialized("other_key"), Some(&1));
    let diagnostics = sink.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::ProviderContractViolation);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn provider_output_never_overwrites_materialized_values() {
    let (mut mapping, _sink) = collecting_mapping();
    mapping.insert("other_key".to_string(), 100);
    let (p1, _) = counting_provider("omits_key", &[("other_key", 1)]);
    let (p2, _) = counting_provider("supplies_key", &[("k", 7), ("other_key", 2)]);
    mapping.register_providers(["k"], &p1);
    mapping.register_providers(["k"], &p2);

    assert_eq!(mapping.get("k"), Ok(&7));
    assert_eq!(mapping.get("other_key"), Ok(&100));
}

#[test]
fn default_read_without_evaluation_skips_providers() {
    let mut mapping = Mapping::new();
    let (provider, calls) = counting_provider("lookup", &[("k", 1)]);
    mapping.register_providers(["k"], &provider);

    assert_eq!(mapping.get_or_default("k", 99, false), 99);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!mapping.is_materialized("k"));
    assert_eq!(mapping.get_or_default("k", 99, true), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
#[case::materialized_only(true, false)]
#[case::pending_only(false, true)]
#[case::both(true, true)]
fn remove_clears_both_tables(#[case] materialized: bool, #[case] pending: bool) {
    let mut mapping = Mapping::new();
    let (provider, calls) = counting_provider("lookup", &[("k", 3)]);
    match (materialized, pending) {
        (true, false) => {
            mapping.insert("k".to_string(), 3);
        }
        (false, true) => mapping.register_providers(["k"], &provider),
        _ => {
            // Evaluation leaves the provider list in place next to the value
            mapping.register_providers(["k"], &provider);
            assert_eq!(mapping.evaluate("k"), Ok(Some(&3)));
            assert_eq!(mapping.providers_for("k").len(), 1);
        }
    }
    let calls_before = calls.load(Ordering::SeqCst);

    let removed = mapping.remove("k").unwrap();

    assert_eq!(removed, materialized.then_some(3));
    assert!(!mapping.contains_key("k"));
    assert!(mapping.providers_for("k").is_empty());
    assert_eq!(mapping.get_or("k", 1), 1);
    assert_eq!(calls.load(Ordering::SeqCst), calls_before);
}

#[test]
fn remove_missing_key_fails() {
    let mut mapping = Mapping::new();
    assert_eq!(
        mapping.remove("ghost"),
        Err(LazyMappingError::key_not_found("ghost"))
    );
}

#[test]
fn get_missing_key_fails() {
    let (mut mapping, sink) = collecting_mapping();
    let (provider, _) = raising_provider("broken");
    mapping.register_providers(["k"], &provider);

    let err = mapping.get("k").unwrap_err();
    assert!(err.is_key_not_found());
    assert!(mapping.get("never_registered").is_err());
    assert_eq!(sink.len(), 1);
}

/// `x` materialized by its provider (which stays attached), `y` assigned
fn mapping_with_stale_provider() -> Mapping {
    let mut mapping = Mapping::new();
    let (x_lookup, _) = counting_provider("x_lookup", &[("x", 2)]);
    mapping.register_providers(["x"], &x_lookup);
    mapping.evaluate("x").unwrap();
    mapping.insert("y".to_string(), 3);
    mapping
}

fn materialized_pairs(mapping: &Mapping) -> Vec<(&str, i64)> {
    mapping
        .materialized()
        .map(|(key, value)| (key.as_str(), *value))
        .collect()
}

#[test]
fn merge_propagates_other_values() {
    let mut a = Mapping::new();
    a.insert("x".to_string(), 1);
    let b = mapping_with_stale_provider();
    assert_eq!(b.providers_for("x").len(), 1);

    a.merge_from(&b);

    assert_eq!(materialized_pairs(&a), vec![("x", 2), ("y", 3)]);
    assert!(a.providers_for("x").is_empty());
}

#[test]
fn merge_missing_keeps_own_values() {
    let mut a = Mapping::new();
    a.insert("x".to_string(), 1);
    let b = mapping_with_stale_provider();

    a.merge_missing_from(&b);

    assert_eq!(materialized_pairs(&a), vec![("x", 1), ("y", 3)]);
    assert!(a.providers_for("x").is_empty());
    assert_eq!(a.len(), 2);
}

#[test]
fn merge_appends_providers_for_pending_keys() {
    let (p1, _) = counting_provider("p1", &[("z", 1)]);
    let (p2, _) = counting_provider("p2", &[("z", 2)]);
    let mut a = Mapping::new();
    a.register_providers(["z"], &p1);
    let mut b = Mapping::new();
    b.register_providers(["z"], &p2);
    b.register_providers(["z"], &p1);

    a.merge_from(&b);

    let names: Vec<_> = a.providers_for("z").iter().map(Provider::name).collect();
    assert_eq!(names, vec!["p1", "p2"]);
}

#[test]
fn merge_does_not_duplicate_shared_providers() {
    let (provider, calls) = counting_provider("shared", &[("k", 1)]);
    let mut a = Mapping::new();
    a.register_providers(["k"], &provider);
    let mut b = Mapping::new();
    b.register_providers(["k"], &provider);

    a.merge_from(&b);

    assert_eq!(a.providers_for("k").len(), 1);
    assert_eq!(a.get("k"), Ok(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn bundle_provider_materializes_sibling_keys() {
    let sink = CollectingSink::new();
    let mut mapping: LazyMapping<&str, Value> =
        LazyMapping::new().with_diagnostic_sink(sink.clone());
    let raises_calls = Arc::new(AtomicUsize::new(0));
    let lookup_calls = Arc::new(AtomicUsize::new(0));
    let raises = {
        let calls = Arc::clone(&raises_calls);
        Provider::named("raises", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::new("boom"))
        })
    };
    let lookup = {
        let calls = Arc::clone(&lookup_calls);
        Provider::named("lookup", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(indexmap! { "name" => json!("A"), "rank" => json!(1) }))
        })
    };
    mapping.register_providers(["name", "rank"], &raises);
    mapping.register_providers(["name", "rank"], &lookup);

    assert_eq!(mapping.get("rank"), Ok(&json!(1)));
    assert_eq!(mapping.get("name"), Ok(&json!("A")));

    assert_eq!(raises_calls.load(Ordering::SeqCst), 1);
    assert_eq!(lookup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.summary().warning_count, 1);
}

#[test]
fn evaluate_is_idempotent() {
    let mut mapping = Mapping::new();
    let (provider, calls) = counting_provider("lookup", &[("k", 1)]);
    mapping.register_providers(["k"], &provider);

    assert_eq!(mapping.evaluate("k"), Ok(Some(&1)));
    assert_eq!(mapping.evaluate("k"), Ok(Some(&1)));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(mapping.stats().evaluations, 1);
}

#[test]
fn len_counts_each_logical_key_once() {
    let mut mapping = Mapping::new();
    let (provider, _) = counting_provider("lookup", &[("a", 1), ("b", 2)]);
    mapping.register_providers(["a", "b", "c"], &provider);
    mapping.insert("d".to_string(), 4);
    assert_eq!(mapping.len(), 4);

    mapping.get("a").unwrap();

    assert_eq!(mapping.len(), 4);
    assert_eq!(
        mapping.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["d", "a", "b", "c"]
    );
}

#[test]
fn copy_is_independent() {
    let mut original = Mapping::new();
    let (provider, calls) = counting_provider("lookup", &[("k", 1)]);
    original.insert("a".to_string(), 1);
    original.register_providers(["k"], &provider);

    let mut copy = original.clone();
    copy.remove("a").unwrap();
    assert_eq!(copy.get("k"), Ok(&1));

    assert_eq!(original.get_materialized("a"), Some(&1));
    assert!(!original.is_materialized("k"));
    assert_eq!(original.get("k"), Ok(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn plain_bundle_extend_clears_pending_providers() {
    let mut mapping = Mapping::new();
    let (provider, calls) = counting_provider("lookup", &[("k", 1)]);
    mapping.register_providers(["k", "j"], &provider);

    mapping.extend(indexmap! { "k".to_string() => 10 });

    assert_eq!(mapping.get("k"), Ok(&10));
    assert_eq!(mapping.providers_for("j").len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
