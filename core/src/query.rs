//! Query-string serialization for proxy parameters.
//!
//! # Design
//! `stringify` and `parse` speak the same dialect so one is the inverse of
//! the other: nested objects become dot-delimited paths
//! (`filter.name=x`), arrays become comma-joined values (`ids=1,2,3`),
//! and `null` values are dropped entirely. Values are emitted verbatim —
//! no percent-encoding — which keeps the fragments readable and matches
//! what the servers this proxy targets expect.
//!
//! Two accepted asymmetries: `null` values disappear on `stringify`, and
//! `parse` produces string leaves only (query strings are untyped), so a
//! round trip is exact for string-leaf mappings without nulls. A
//! single-element array collapses to a plain value on the way back for
//! the same reason a comma dialect cannot distinguish the two.

use serde_json::{Map, Value};

/// Serialize a parameter mapping into a query fragment.
///
/// Returns a `?`-prefixed string, or an empty string when nothing
/// survives serialization.
pub fn stringify(parameters: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in parameters {
        push_pairs(&mut pairs, key.clone(), value);
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn push_pairs(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, child_value) in map {
                push_pairs(pairs, format!("{key}.{child}"), child_value);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter(|item| !item.is_null())
                .map(render_scalar)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(format!("{key}={joined}"));
        }
        scalar => pairs.push(format!("{key}={}", render_scalar(scalar))),
    }
}

/// Strings are emitted bare; numbers and booleans via their JSON form.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a raw query fragment back into a parameter mapping.
///
/// Strips a leading `?` if present. Comma-delimited values become arrays,
/// dot-delimited keys become nested objects, and every leaf is a string.
pub fn parse(fragment: &str) -> Map<String, Value> {
    let raw = fragment.strip_prefix('?').unwrap_or(fragment);
    let mut parameters = Map::new();
    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = if value.contains(',') {
            Value::Array(
                value
                    .split(',')
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            )
        } else {
            Value::String(value.to_string())
        };
        insert_path(&mut parameters, key, value);
    }
    parameters
}

/// Insert `value` at a dot-delimited path, creating intermediate objects
/// as needed. A scalar sitting where an object is required is replaced.
fn insert_path(parameters: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            parameters.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = parameters
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = slot {
                insert_path(inner, rest, value);
            } else {
                let mut inner = Map::new();
                insert_path(&mut inner, rest, value);
                *slot = Value::Object(inner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn empty_mapping_produces_empty_string() {
        assert_eq!(stringify(&Map::new()), "");
    }

    #[test]
    fn flat_parameters_are_ampersand_joined_with_prefix() {
        let params = map(json!({"page": 2, "sort": "name"}));
        assert_eq!(stringify(&params), "?page=2&sort=name");
    }

    #[test]
    fn null_values_are_omitted() {
        let params = map(json!({"keep": "x", "drop": null}));
        assert_eq!(stringify(&params), "?keep=x");

        let all_null = map(json!({"drop": null}));
        assert_eq!(stringify(&all_null), "");
    }

    #[test]
    fn values_are_not_percent_encoded() {
        let params = map(json!({"q": "a b&c"}));
        assert_eq!(stringify(&params), "?q=a b&c");
    }

    #[test]
    fn nested_objects_use_dot_paths() {
        let params = map(json!({"filter": {"author": {"name": "jane"}}}));
        assert_eq!(stringify(&params), "?filter.author.name=jane");
    }

    #[test]
    fn arrays_are_comma_joined() {
        let params = map(json!({"ids": [1, 2, 3]}));
        assert_eq!(stringify(&params), "?ids=1,2,3");
    }

    #[test]
    fn parse_strips_prefix_and_splits_pairs() {
        let params = parse("?page=2&sort=name");
        assert_eq!(params["page"], "2");
        assert_eq!(params["sort"], "name");
    }

    #[test]
    fn parse_without_prefix() {
        let params = parse("a=1");
        assert_eq!(params["a"], "1");
    }

    #[test]
    fn parse_comma_values_into_arrays() {
        let params = parse("ids=1,2,3");
        assert_eq!(params["ids"], json!(["1", "2", "3"]));
    }

    #[test]
    fn parse_dot_paths_into_nested_objects() {
        let params = parse("filter.author.name=jane&filter.year=2020");
        assert_eq!(params["filter"]["author"]["name"], "jane");
        assert_eq!(params["filter"]["year"], "2020");
    }

    #[test]
    fn parse_bare_key_gets_empty_value() {
        let params = parse("flag");
        assert_eq!(params["flag"], "");
    }

    #[test]
    fn scalar_is_replaced_when_a_path_needs_an_object() {
        let params = parse("a=1&a.b=2");
        assert_eq!(params["a"]["b"], "2");
    }

    #[test]
    fn round_trip_for_string_leaf_mappings() {
        let original = map(json!({
            "sort": "name",
            "filter": {"author": {"name": "jane"}, "year": "2020"},
            "ids": ["1", "2", "3"]
        }));
        assert_eq!(parse(&stringify(&original)), original);
    }
}
