//! Case-insensitive, case-preserving header storage.

use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// One header line: the name as it was written and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    /// Original header name casing. Optional in the CDN's wire format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Header value.
    pub value: String,
}

impl HeaderEntry {
    /// Create a new entry with the given original name.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

/// HeaderSet maps lower-cased header names to every line sent under that name.
///
/// - Lookups and replacement match names case-insensitively.
/// - Entries keep the casing they were written with.
/// - Names iterate in insertion order; values keep their order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, Vec<HeaderEntry>)>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no headers at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a header with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Get all entries for the given name.
    pub fn get(&self, name: &str) -> Option<&[HeaderEntry]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// Get the value of the first entry for the given name.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|v| v.first())
            .map(|v| v.value.as_str())
    }

    /// Append a new line, keeping any existing lines of the same name.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let entry = HeaderEntry::new(key.clone(), value);
        self.push_entry(&key, entry);
    }

    fn push_entry(&mut self, name: &str, entry: HeaderEntry) {
        match self.position(name) {
            Some(idx) => self.entries[idx].1.push(entry),
            None => self
                .entries
                .push((name.to_ascii_lowercase(), vec![entry])),
        }
    }

    /// Replace every line of this name with exactly one line.
    ///
    /// The new line keeps `key` as its casing. If the name was not present
    /// it is added at the end.
    pub fn replace(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let entry = HeaderEntry::new(key.clone(), value);
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = vec![entry],
            None => self.entries.push((key.to_ascii_lowercase(), vec![entry])),
        }
    }

    /// Remove all lines of this name, returning them.
    pub fn remove(&mut self, name: &str) -> Option<Vec<HeaderEntry>> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    /// Iterate over `(lower-cased name, entries)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HeaderEntry])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Build a new set with `signed` merged in.
    ///
    /// Every header of `signed` replaces all same-named lines of `self` with a
    /// single line. Everything else is carried over as is.
    pub fn merge(&self, signed: &SignatureResult) -> HeaderSet {
        let mut merged = self.clone();
        for (k, v) in signed.iter() {
            merged.replace(k, v);
        }
        merged
    }
}

impl Debug for HeaderSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Header values may carry credentials, only names are printed.
        f.debug_list()
            .entries(self.entries.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut hs = HeaderSet::new();
        for (k, v) in iter {
            hs.append(k, v);
        }
        hs
    }
}

impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HeaderSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeaderSetVisitor;

        impl<'de> Visitor<'de> for HeaderSetVisitor {
            type Value = HeaderSet;

            fn expecting(&self, f: &mut Formatter) -> fmt::Result {
                f.write_str("a map of header name to a list of {key, value} entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<HeaderSet, A::Error> {
                let mut hs = HeaderSet::new();
                while let Some((name, values)) =
                    access.next_entry::<String, Vec<HeaderEntry>>()?
                {
                    for entry in values {
                        hs.push_entry(&name, entry);
                    }
                }
                Ok(hs)
            }
        }

        deserializer.deserialize_map(HeaderSetVisitor)
    }
}

/// SignatureResult is the set of headers produced by signing one request.
///
/// Header names are kept exactly as the signer computed them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignatureResult {
    headers: Vec<(String, String)>,
}

impl SignatureResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing a previous value of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
    }

    /// Get a header value by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterate over `(name, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Debug for SignatureResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.headers.iter().map(|(k, _)| k))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> HeaderSet {
        let mut hs = HeaderSet::new();
        hs.append("X-Auth", "Bearer token");
        hs.append("Accept", "text/html");
        hs.append("accept", "application/json");
        hs.append("Host", "d111111abcdef8.cloudfront.net");
        hs
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let hs = sample();
        assert!(hs.contains("x-auth"));
        assert!(hs.contains("X-AUTH"));
        assert_eq!(hs.first_value("x-AUTH"), Some("Bearer token"));
        assert_eq!(hs.get("ACCEPT").map(|v| v.len()), Some(2));
        assert_eq!(hs.len(), 3);
    }

    #[test]
    fn test_storage_preserves_casing() {
        let hs = sample();
        let accept = hs.get("accept").unwrap();
        assert_eq!(accept[0].key.as_deref(), Some("Accept"));
        assert_eq!(accept[1].key.as_deref(), Some("accept"));
        let names: Vec<_> = hs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["x-auth", "accept", "host"]);
    }

    #[test]
    fn test_merge_replaces_and_preserves() {
        let hs = sample();
        let mut signed = SignatureResult::new();
        signed.insert("host", "abc.execute-api.us-east-1.amazonaws.com");
        signed.insert("authorization", "AWS4-HMAC-SHA256 Credential=...");

        let merged = hs.merge(&signed);

        // Replaced wholesale with the signer's casing.
        assert_eq!(
            merged.get("host").unwrap(),
            &[HeaderEntry::new(
                "host",
                "abc.execute-api.us-east-1.amazonaws.com"
            )]
        );
        // Added once.
        assert_eq!(merged.get("Authorization").unwrap().len(), 1);
        // Untouched, including repeated values and casing.
        assert_eq!(merged.get("accept"), hs.get("accept"));
        assert_eq!(merged.get("x-auth"), hs.get("x-auth"));
        // Source is not mutated.
        assert!(!hs.contains("authorization"));
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_merge_collapses_duplicates() {
        let mut hs = HeaderSet::new();
        hs.append("Authorization", "Basic a");
        hs.append("authorization", "Basic b");
        let mut signed = SignatureResult::new();
        signed.insert("authorization", "AWS4-HMAC-SHA256 x");

        let merged = hs.merge(&signed);
        assert_eq!(
            merged.get("authorization").unwrap(),
            &[HeaderEntry::new("authorization", "AWS4-HMAC-SHA256 x")]
        );
    }

    #[test]
    fn test_serde_shape() {
        let input = r#"{"host":[{"key":"Host","value":"example.com"}],"accept":[{"value":"a"},{"key":"Accept","value":"b"}]}"#;
        let hs: HeaderSet = serde_json::from_str(input).unwrap();
        assert_eq!(hs.get("accept").unwrap()[0].key, None);
        assert_eq!(hs.first_value("Host"), Some("example.com"));
        assert_eq!(serde_json::to_string(&hs).unwrap(), input);
    }

    #[test]
    fn test_debug_hides_values() {
        let hs = sample();
        let printed = format!("{hs:?}");
        assert!(!printed.contains("Bearer token"));
        assert!(printed.contains("x-auth"));
    }

    #[test]
    fn test_signature_result_insert_replaces() {
        let mut sr = SignatureResult::new();
        sr.insert("x-amz-date", "a");
        sr.insert("X-Amz-Date", "b");
        assert_eq!(sr.len(), 1);
        assert_eq!(sr.get("x-amz-date"), Some("b"));
    }
}
