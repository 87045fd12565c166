//! Key casing conversion between the wire format (camelCase) and the
//! internal representation (snake_case).

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// One word: optional separators, a capital or digit run, then the rest of the word.
static SPLIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\-_\s]*[A-Z0-9]+[^A-Z\-_\s]+[\-_\s]*").expect("Invalid split regex")
});

/// An uppercase run followed by the start of a capitalized word, e.g. `HTTPE` + `rror`.
static ACRONYM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("Invalid acronym regex"));

/// Convert a single key to snake_case.
///
/// Numeric-only and all-uppercase strings are opaque tokens and are returned as-is.
///
/// ```
/// use tekdrive::casing::to_snake_case;
///
/// assert_eq!(to_snake_case("parentFolderId"), "parent_folder_id");
/// assert_eq!(to_snake_case("HTTPErrorCode"), "http_error_code");
/// assert_eq!(to_snake_case("FILE"), "FILE");
/// ```
pub fn to_snake_case(s: &str) -> String {
    if is_numeric(s) || is_upper(s) {
        return s.to_string();
    }
    break_words(&fix_acronyms(s)).to_lowercase()
}

/// Convert a single key to camelCase. Leading separators are kept.
pub fn to_camel_case(s: &str) -> String {
    if is_numeric(s) || is_upper(s) {
        return s.to_string();
    }

    let chars: Vec<char> = s.chars().collect();
    let keep_first = is_upper(&chars.iter().take(2).collect::<String>());
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if is_separator(c) && i > 0 && !is_separator(chars[i - 1]) {
            let start = i;
            while i < chars.len() && is_separator(chars[i]) {
                i += 1;
            }
            match chars.get(i) {
                Some(next) => {
                    out.extend(next.to_uppercase());
                    i += 1;
                }
                None => out.extend(&chars[start..]),
            }
            continue;
        }

        if i == 0 && !keep_first {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        i += 1;
    }

    out
}

/// Recursively convert every object key to snake_case. Values are left alone.
pub fn snake_case_keys(value: Value) -> Value {
    convert_keys(value, to_snake_case)
}

/// Recursively convert every object key to camelCase. Values are left alone.
pub fn camel_case_keys(value: Value) -> Value {
    convert_keys(value, to_camel_case)
}

/// [`snake_case_keys`] for a map that is already known to be an object.
pub fn snake_case_map(map: Map<String, Value>) -> Map<String, Value> {
    convert_map(map, to_snake_case)
}

fn convert_keys(value: Value, convert: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(convert_map(map, convert)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

fn convert_map(map: Map<String, Value>, convert: fn(&str) -> String) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (convert(&key), convert_keys(value, convert)))
        .collect()
}

fn fix_acronyms(s: &str) -> String {
    ACRONYM_REGEX
        .replace_all(s, |caps: &Captures| format!("{}{}", title(&caps[1]), &caps[2]))
        .into_owned()
}

fn break_words(s: &str) -> String {
    let mut pieces = Vec::new();
    let mut last = 0;

    for m in SPLIT_REGEX.find_iter(s) {
        if m.start() > last {
            pieces.push(&s[last..m.start()]);
        }
        pieces.push(m.as_str());
        last = m.end();
    }
    if last < s.len() {
        pieces.push(&s[last..]);
    }

    pieces.join("_")
}

fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_numeric)
}

/// At least one cased character and no lowercase ones.
fn is_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_snake_case_simple() {
        let cases = [
            ("snake_case", "snake_case"),
            ("camelCase", "camel_case"),
            ("PascalCase", "pascal_case"),
            ("HTTPErrorCode", "http_error_code"),
            ("404HTTPCode", "404http_code"),
            ("ownerId", "owner_id"),
            ("parentFolderId", "parent_folder_id"),
            ("ObjectID", "object_id"),
        ];
        for (input, expected) in cases {
            assert_eq!(to_snake_case(input), expected, "input: {input}");
        }
    }

    #[test]
    fn test_opaque_tokens_pass_through() {
        assert_eq!(to_snake_case("12345"), "12345");
        assert_eq!(to_snake_case("FILE"), "FILE");
        assert_eq!(to_snake_case("UPLOAD_STATE"), "UPLOAD_STATE");
        assert_eq!(to_camel_case("SHARES"), "SHARES");
        assert_eq!(to_camel_case("42"), "42");
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("parent_folder_id"), "parentFolderId");
        assert_eq!(to_camel_case("include_trashed"), "includeTrashed");
        assert_eq!(to_camel_case("name"), "name");
        assert_eq!(to_camel_case("_upload_url"), "_uploadUrl");
        assert_eq!(to_camel_case("trailing_"), "trailing_");
    }

    #[test]
    fn test_round_trip_simple_keys() {
        for key in ["parentFolderId", "uploadState", "trashedAt", "name", "itemShareCount"] {
            assert_eq!(to_camel_case(&to_snake_case(key)), key);
        }
    }

    #[test]
    fn test_snake_case_keys_dict() {
        let camel = json!({
            "trashedAt": null,
            "uploadState": "SUCCESS",
            "bytes": "100321",
            "type": "FILE",
            "parentFolderId": "33ac8720-7292-4272-bb3f-90315352a04b",
        });

        let expected = json!({
            "trashed_at": null,
            "upload_state": "SUCCESS",
            "bytes": "100321",
            "type": "FILE",
            "parent_folder_id": "33ac8720-7292-4272-bb3f-90315352a04b",
        });

        assert_eq!(snake_case_keys(camel), expected);
    }

    #[test]
    fn test_snake_case_keys_nested() {
        let camel = json!({
            "ownerId": "ea29f0df",
            "tree": {
                "id": "5f6dcf17",
                "owner": {"exampleId": "ea29f0df", "exampleUsername": "me@example.com"},
                "children": [
                    {"uploadState": "SUCCESS", "allFlags": {"foo": 1, "fooBar": {"barBaz": 2}}},
                    {"uploadState": "PENDING"}
                ]
            }
        });

        let expected = json!({
            "owner_id": "ea29f0df",
            "tree": {
                "id": "5f6dcf17",
                "owner": {"example_id": "ea29f0df", "example_username": "me@example.com"},
                "children": [
                    {"upload_state": "SUCCESS", "all_flags": {"foo": 1, "foo_bar": {"bar_baz": 2}}},
                    {"upload_state": "PENDING"}
                ]
            }
        });

        assert_eq!(snake_case_keys(camel), expected);
    }

    #[test]
    fn test_values_are_not_converted() {
        let value = json!({"fileType": "camelValue", "tags": ["someTag"]});
        assert_eq!(
            snake_case_keys(value),
            json!({"file_type": "camelValue", "tags": ["someTag"]})
        );
    }

    #[test]
    fn test_camel_case_keys() {
        let snake = json!({"folder_id": "abc", "folders_only": true, "depth": 1});
        assert_eq!(
            camel_case_keys(snake),
            json!({"folderId": "abc", "foldersOnly": true, "depth": 1})
        );
    }
}
