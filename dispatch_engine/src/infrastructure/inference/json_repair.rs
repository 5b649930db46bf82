// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # JSON Repair
//!
//! Tolerant recovery for vision-language model output that is supposed to
//! be JSON but often isn't quite. A pure function, independent of any
//! adapter: extract a fenced ` ```json ... ``` ` block (or treat the whole
//! string as the candidate when there's no fence), then regex-extract
//! key/value pairs and one level of nested objects, fold duplicate keys
//! into arrays, group purely-numeric keys into an `entities` array, and
//! re-emit a well-formed JSON object. When nothing object-shaped can be
//! recovered, the raw input is returned as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());
static SIMPLE_KV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)":\s*"([^"]*)""#).unwrap());
static NESTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"([^"]+)":\s*\{([^{}]*(?:\{[^{}]*\}[^{}]*)*)\}"#).unwrap());
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static MULTI_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// A field is considered to belong to a numbered entity when its key
/// appears within this many characters of the entity's own numeric key in
/// the original text - proximity is the only signal available without
/// document-specific knowledge.
const RELATED_FIELD_WINDOW: i64 = 500;

/// Extract and repair JSON from `input`. Returns a JSON object on success,
/// or `Value::String(input)` unchanged when nothing could be recovered.
pub fn repair(input: &str) -> Value {
    let candidate = match FENCE_RE.captures(input) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(input).to_string(),
        None => input.to_string(),
    };
    let unescaped = candidate.replace("\\n", "\n").replace("\\\"", "\"");

    // If this text is both strictly valid JSON *and* already shaped the way
    // `repair`'s own output is shaped (normalized field names, no top-level
    // numeric keys still awaiting entity-grouping, no duplicate top-level
    // keys collapsed by the parser), pass it through unchanged rather than
    // re-running it through the regex heuristics below. Those heuristics
    // match `"key": "value"` pairs at any nesting depth, so re-running them
    // on `repair`'s own output - e.g. an `entities` array of `{"id": ...,
    // "primary_value": ...}` objects - would flatten it back into parallel
    // arrays and break `repair(repair(x)) == repair(x)` (spec §8).
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(unescaped.trim()) {
        if looks_already_repaired(&unescaped, &obj) {
            return Value::Object(obj);
        }
    }

    match generic_json_repair(&unescaped) {
        Some(map) if !map.is_empty() => Value::Object(map),
        _ => Value::String(input.to_string()),
    }
}

/// True when `obj`'s top-level shape could only have come from a prior
/// `repair` call (or input that `repair` would leave untouched anyway):
/// every key is already in normalized form, none is a still-ungrouped
/// purely-numeric entity key, and none was a duplicate the JSON parser
/// silently collapsed to its last value.
fn looks_already_repaired(text: &str, obj: &Map<String, Value>) -> bool {
    if obj.is_empty() {
        return false;
    }
    obj.keys().all(|key| {
        !(!key.is_empty() && key.chars().all(|c| c.is_ascii_digit()))
            && normalize_field_name(key) == *key
            && text.matches(&format!("\"{key}\":")).count() <= 1
    })
}

fn generic_json_repair(text: &str) -> Option<Map<String, Value>> {
    let mut all_data: Vec<(String, Value)> = Vec::new();

    for caps in SIMPLE_KV_RE.captures_iter(text) {
        let key = caps[1].trim().to_string();
        let value = caps[2].trim().to_string();
        all_data.push((key, Value::String(value)));
    }

    for caps in NESTED_RE.captures_iter(text) {
        let key = caps[1].trim().to_string();
        let content = &caps[2];
        let mut nested = Map::new();
        for ncaps in SIMPLE_KV_RE.captures_iter(content) {
            nested.insert(ncaps[1].trim().to_string(), Value::String(ncaps[2].trim().to_string()));
        }
        all_data.push((key, Value::Object(nested)));
    }

    if all_data.is_empty() {
        return None;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for (key, _) in &all_data {
        *counts.entry(key.clone()).or_insert(0) += 1;
    }

    let mut organized: Vec<(String, Value)> = Vec::new();
    for (key, value) in all_data {
        if counts[&key] > 1 {
            if let Some(existing) = organized.iter_mut().find(|(k, _)| *k == key) {
                if let Value::Array(arr) = &mut existing.1 {
                    arr.push(value);
                    continue;
                }
            }
            organized.push((key, Value::Array(vec![value])));
        } else {
            organized.push((key, value));
        }
    }

    let (numbered, regular): (Vec<_>, Vec<_>) =
        organized.into_iter().partition(|(key, _)| !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()));

    let mut final_map = Map::new();

    if !numbered.is_empty() {
        let mut numbered = numbered;
        numbered.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));

        let entities: Vec<Value> = numbered
            .iter()
            .map(|(num, value)| {
                let mut entity = Map::new();
                entity.insert("id".to_string(), Value::String(num.clone()));
                if let Value::String(s) = value {
                    entity.insert("primary_value".to_string(), Value::String(s.clone()));
                }
                for (field_key, field_value) in &regular {
                    if is_related_field(num, field_key, text) {
                        entity.insert(normalize_field_name(field_key), field_value.clone());
                    }
                }
                Value::Object(entity)
            })
            .collect();

        final_map.insert("entities".to_string(), Value::Array(entities));
    }

    for (key, value) in &regular {
        let grouped_into_entity = numbered.iter().any(|(num, _)| is_related_field(num, key, text));
        if !grouped_into_entity {
            final_map.insert(normalize_field_name(key), value.clone());
        }
    }

    Some(final_map)
}

fn is_related_field(entity_id: &str, field_key: &str, original_text: &str) -> bool {
    let entity_pattern = format!("\"{entity_id}\"");
    let field_pattern = format!("\"{field_key}\"");
    match (original_text.find(&entity_pattern), original_text.find(&field_pattern)) {
        (Some(entity_pos), Some(field_pos)) => (entity_pos as i64 - field_pos as i64).abs() < RELATED_FIELD_WINDOW,
        _ => false,
    }
}

fn normalize_field_name(field_name: &str) -> String {
    let lower = field_name.to_lowercase();
    let stripped = NON_WORD_RE.replace_all(&lower, "");
    let collapsed = WHITESPACE_RE.replace_all(stripped.trim(), "_");
    let deduped = MULTI_UNDERSCORE_RE.replace_all(&collapsed, "_");
    deduped.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_flat_object() {
        let input = "here you go:\n```json\n{\"patient name\": \"Jane Doe\", \"age\": \"42\"}\n```\nthanks";
        let repaired = repair(input);
        assert_eq!(repaired["patient_name"], "Jane Doe");
        assert_eq!(repaired["age"], "42");
    }

    #[test]
    fn treats_unfenced_input_as_candidate() {
        let input = r#"{"name": "Jane Doe"}"#;
        let repaired = repair(input);
        assert_eq!(repaired["name"], "Jane Doe");
    }

    #[test]
    fn duplicate_keys_fold_into_an_array() {
        let input = r#"```json
        {"item": "apple", "item": "pear"}
        ```"#;
        let repaired = repair(input);
        assert_eq!(repaired["item"], serde_json::json!(["apple", "pear"]));
    }

    #[test]
    fn numeric_keys_group_into_entities() {
        let input = r#"```json
        {"1": "Widget", "2": "Gadget"}
        ```"#;
        let repaired = repair(input);
        let entities = repaired["entities"].as_array().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0]["id"], "1");
        assert_eq!(entities[0]["primary_value"], "Widget");
    }

    #[test]
    fn unrecoverable_input_returns_raw_string() {
        let input = "the model just rambled, no json here";
        let repaired = repair(input);
        assert_eq!(repaired, Value::String(input.to_string()));
    }

    #[test]
    fn repair_is_idempotent_on_a_flat_object() {
        let input = "```json\n{\"first_name\": \"Jane\", \"last_name\": \"Doe\"}\n```";
        let once = repair(input);
        let serialized = once.to_string();
        let twice = repair(&serialized);
        assert_eq!(once, twice);
    }

    #[test]
    fn field_names_are_normalized() {
        let input = r#"```json
        {"Patient Name!!": "Jane Doe"}
        ```"#;
        let repaired = repair(input);
        assert_eq!(repaired["patient_name"], "Jane Doe");
    }
}

#[cfg(test)]
mod idempotency_proptest {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Spec round-trip law: repair(repair(x)) == repair(x). Keys are
        // generated already-lowercase-alnum so normalization is a no-op and
        // the re-serialized flat object is itself a valid fixed point.
        #[test]
        fn repair_is_idempotent_on_arbitrary_flat_objects(
            pairs in prop::collection::hash_map("[a-z]{3,8}", "[A-Za-z0-9 ]{0,12}", 1..6)
        ) {
            let body = pairs
                .iter()
                .map(|(k, v)| format!("\"{k}\": \"{v}\""))
                .collect::<Vec<_>>()
                .join(", ");
            let input = format!("```json\n{{{body}}}\n```");

            let once = repair(&input);
            let twice = repair(&once.to_string());
            prop_assert_eq!(once, twice);
        }

        // Same law, starting from raw numeric-keyed input: `repair`'s first
        // pass groups these into an `entities` array, and the second pass
        // must recognise that shape as already-repaired rather than
        // re-flattening the nested `id`/`primary_value` objects.
        #[test]
        fn repair_is_idempotent_on_numeric_keyed_entities(
            values in prop::collection::vec("[A-Za-z]{3,10}", 1..5)
        ) {
            let body = values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("\"{}\": \"{v}\"", i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let input = format!("```json\n{{{body}}}\n```");

            let once = repair(&input);
            let twice = repair(&once.to_string());
            prop_assert_eq!(once, twice);
        }

        // Same law for the nested-object shape `generic_json_repair` itself
        // produces for a one-level-deep `"key": {...}` input.
        #[test]
        fn repair_is_idempotent_on_nested_objects(
            outer in "[a-z]{3,8}",
            inner in prop::collection::hash_map("[a-z]{3,8}", "[A-Za-z0-9 ]{0,12}", 1..4)
        ) {
            let inner_body = inner
                .iter()
                .map(|(k, v)| format!("\"{k}\": \"{v}\""))
                .collect::<Vec<_>>()
                .join(", ");
            let input = format!("```json\n{{\"{outer}\": {{{inner_body}}}}}\n```");

            let once = repair(&input);
            let twice = repair(&once.to_string());
            prop_assert_eq!(once, twice);
        }
    }
}
