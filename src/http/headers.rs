//! Ordered, case-insensitive HTTP field map.
//!
//! One [`HeaderMap`] instance holds the headers of a request or response;
//! trailers are a second, independent instance of the same type and are never
//! merged into the header map they follow.
//!
//! Names are normalized to lowercase on insertion, so lookups are
//! case-insensitive by construction. Entries keep their insertion order,
//! which makes serialization deterministic.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: IndexMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: &str) {
        self.fields
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Adds `value` under `name`, joining with `", "` if the field already
    /// exists. HTTP treats repeated fields as one comma-separated list.
    pub fn append(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.fields.get_mut(&name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.fields.insert(name, value.to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Removes `name` if present. Removing an absent field is not an error.
    pub fn remove(&mut self, name: &str) {
        // shift_remove keeps the order of the remaining entries intact.
        self.fields.shift_remove(&name.to_ascii_lowercase());
    }

    /// Iterates over `(name, value)` pairs in insertion order. The iterator
    /// is restartable: calling this again yields the same sequence.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_is_case_insensitive() {
        let mut h = HeaderMap::new();
        h.set("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let mut h = HeaderMap::new();
        h.set("host", "one.example");
        h.set("Host", "two.example");
        assert_eq!(h.get("host"), Some("two.example"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn append_joins_with_comma_separator() {
        let mut h = HeaderMap::new();
        h.append("Accept", "text/html");
        h.append("accept", "application/json");
        assert_eq!(h.get("accept"), Some("text/html, application/json"));
    }

    #[test]
    fn append_on_missing_field_behaves_as_set() {
        let mut h = HeaderMap::new();
        h.append("x-token", "abc");
        assert_eq!(h.get("x-token"), Some("abc"));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut h = HeaderMap::new();
        h.set("connection", "close");
        h.remove("Connection");
        h.remove("connection");
        assert_eq!(h.get("connection"), None);
        assert!(h.is_empty());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut h = HeaderMap::new();
        h.set("b-second", "2");
        h.set("a-first", "1");
        h.set("c-third", "3");
        h.remove("a-first");
        let names: Vec<&str> = h.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b-second", "c-third"]);

        // Restartable: a fresh iterator yields the same sequence.
        let again: Vec<&str> = h.iter().map(|(n, _)| n).collect();
        assert_eq!(names, again);
    }
}
