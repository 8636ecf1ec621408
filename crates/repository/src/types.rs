use {
    serde::{Deserialize, Deserializer, de},
    std::fmt,
};

/// A downloadable file attached to a document.
///
/// The API emits either a bare URL string or a `{label, url}` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDownloadLink")]
pub struct DownloadLink {
    pub label: Option<String>,
    pub url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDownloadLink {
    Bare(String),
    Labeled {
        #[serde(default)]
        label: Option<String>,
        url: String,
    },
}

impl From<RawDownloadLink> for DownloadLink {
    fn from(raw: RawDownloadLink) -> Self {
        match raw {
            RawDownloadLink::Bare(url) => Self { label: None, url },
            RawDownloadLink::Labeled { label, url } => Self { label, url },
        }
    }
}

impl fmt::Display for DownloadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label}: {}", self.url),
            None => f.write_str(&self.url),
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentSummary {
    #[serde(default, deserialize_with = "string_or_number")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    /// Repository page of the document; input to the detail API.
    #[serde(default, deserialize_with = "string_or_number")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_links: Vec<DownloadLink>,
}

impl DocumentSummary {
    /// First download link, treated as the document's PDF.
    pub fn primary_download(&self) -> Option<&DownloadLink> {
        self.download_links.first()
    }
}

/// Latest search outcome for a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultSet {
    pub keyword: String,
    pub items: Vec<DocumentSummary>,
    /// Items in this page as reported by the API.
    pub returned_count: u64,
    /// Total matches in the repository.
    pub total_count: u64,
}

impl SearchResultSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Full record of one document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentDetail {
    #[serde(default, deserialize_with = "string_or_number")]
    pub title: String,
    #[serde(default, rename = "abstract", deserialize_with = "string_or_number")]
    pub abstract_text: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_links: Vec<DownloadLink>,
}

impl DocumentDetail {
    /// Authors listed under `key`, split on `"; "`.
    pub fn authors(&self, key: &str) -> Option<Vec<String>> {
        self.metadata.get(key).map(|raw| {
            raw.split("; ")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn year(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)
    }
}

/// Metadata fields in the order the API sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetadataVisitor;

        impl<'de> de::Visitor<'de> for MetadataVisitor {
            type Value = Metadata;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of metadata fields")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Metadata, E> {
                Ok(Metadata::default())
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Metadata, A::Error> {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                    fields.push((key, value_to_string(value)));
                }
                Ok(Metadata(fields))
            }
        }

        deserializer.deserialize_any(MetadataVisitor)
    }
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(value_to_string).unwrap_or_default())
}

/// `null` reads as the empty value; the API sends it for absent lists.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
