//! HTTP header storage.

use std::fmt;

/// Insertion-ordered multimap of header fields.
///
/// Names compare case-insensitively; values are opaque bytes
/// (ISO-8859-1 on the wire). Iteration yields entries in the order they
/// were inserted, which for a decoded message is wire order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl HeaderMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn insert(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Get the first value for a name.
    pub fn get(&self, name: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Get every value for a name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Check whether any entry has this name.
    pub fn contains(&self, name: &[u8]) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Remove every entry with this name. Returns true if any was removed.
    pub fn remove(&mut self, name: &[u8]) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.entries.len() != before
    }

    /// Iterate over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(n, v)| (n.as_slice(), v.as_slice()))
    }

    /// Number of entries, counting duplicates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mutable access to the most recently inserted value for `name`, for
    /// folding continuation lines into it.
    pub(crate) fn last_value_mut(&mut self, name: &[u8]) -> Option<&mut Vec<u8>> {
        self.entries
            .iter_mut()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (n, v) in self.iter() {
            map.entry(
                &String::from_utf8_lossy(n).as_ref(),
                &String::from_utf8_lossy(v).as_ref(),
            );
        }
        map.finish()
    }
}

/// True if any Transfer-Encoding entry lists `chunked` as a token.
pub(crate) fn is_transfer_encoding_chunked(headers: &HeaderMap) -> bool {
    headers.get_all(b"transfer-encoding").any(|value| {
        value
            .split(|&b| b == b',')
            .any(|token| trim(token).eq_ignore_ascii_case(b"chunked"))
    })
}

/// Remove any `chunked` token from Transfer-Encoding, dropping entries that
/// become empty.
pub(crate) fn clear_transfer_encoding_chunked(headers: &mut HeaderMap) {
    if !is_transfer_encoding_chunked(headers) {
        return;
    }
    let mut kept = Vec::new();
    for value in headers.get_all(b"transfer-encoding") {
        let tokens: Vec<&[u8]> = value
            .split(|&b| b == b',')
            .map(trim)
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(b"chunked"))
            .collect();
        if !tokens.is_empty() {
            kept.push(tokens.join(&b", "[..]));
        }
    }
    headers.remove(b"transfer-encoding");
    for value in kept {
        headers.insert(b"transfer-encoding".to_vec(), value);
    }
}

/// Strip leading and trailing bytes at or below space.
pub(crate) fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b > b' ').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b > b' ').map_or(start, |i| i + 1);
    &bytes[start..end]
}
