//! Flat form payloads, as a browser submits them.

use conform_value::{FileEntry, FormValue};
use indexmap::IndexMap;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq)]
pub enum FormDataEntry {
    Text(String),
    File(FileEntry),
}

impl FormDataEntry {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormDataEntry::Text(s) => Some(s),
            FormDataEntry::File(_) => None,
        }
    }
}

impl From<&str> for FormDataEntry {
    fn from(s: &str) -> Self {
        FormDataEntry::Text(s.to_string())
    }
}

impl From<String> for FormDataEntry {
    fn from(s: String) -> Self {
        FormDataEntry::Text(s)
    }
}

impl From<FileEntry> for FormDataEntry {
    fn from(file: FileEntry) -> Self {
        FormDataEntry::File(file)
    }
}

impl From<FormDataEntry> for FormValue {
    fn from(entry: FormDataEntry) -> Self {
        match entry {
            FormDataEntry::Text(s) => FormValue::String(s),
            FormDataEntry::File(file) => FormValue::File(file),
        }
    }
}

/// An ordered multimap of field names to entries.
///
/// Covers both `FormData` (text and files) and `URLSearchParams` (text
/// only, see [`FormData::from_urlencoded`]).
///
/// ```
/// use conform::FormData;
///
/// let data = FormData::from_urlencoded("tag=a&email=x%40y.z&tag=b");
/// assert_eq!(data.names(), ["tag", "email"]);
/// assert_eq!(data.get_all("tag").len(), 2);
/// assert_eq!(data.get("email").and_then(|e| e.as_text()), Some("x@y.z"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FormDataEntry)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &str) -> Self {
        form_urlencoded::parse(body.as_bytes())
            .map(|(name, value)| (name.into_owned(), FormDataEntry::Text(value.into_owned())))
            .collect()
    }

    /// Encode the text entries as `application/x-www-form-urlencoded`.
    /// File entries are skipped.
    pub fn to_urlencoded(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, entry) in &self.entries {
            if let FormDataEntry::Text(value) = entry {
                serializer.append_pair(name, value);
            }
        }
        serializer.finish()
    }

    pub fn append(&mut self, name: impl Into<String>, entry: impl Into<FormDataEntry>) {
        self.entries.push((name.into(), entry.into()));
    }

    /// First entry submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&FormDataEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Every entry submitted under `name`, in submission order.
    pub fn get_all(&self, name: &str) -> Vec<&FormDataEntry> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, e)| e)
            .collect()
    }

    /// Distinct names in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        self.grouped().into_keys().collect()
    }

    /// Entries grouped by name, names in order of first appearance and
    /// entries in submission order.
    ///
    /// ```
    /// use conform::FormData;
    ///
    /// let data = FormData::from_urlencoded("tag=a&email=e&tag=b");
    /// let grouped = data.grouped();
    /// assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), ["tag", "email"]);
    /// assert_eq!(grouped["tag"].len(), 2);
    /// ```
    pub fn grouped(&self) -> IndexMap<&str, Vec<&FormDataEntry>> {
        let mut out: IndexMap<&str, Vec<&FormDataEntry>> = IndexMap::new();
        for (name, entry) in &self.entries {
            out.entry(name.as_str()).or_default().push(entry);
        }
        out
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FormDataEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<FormDataEntry>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
