//! Bibliographic record model and attribute decoding.
//!
//! The index returns each record as a loosely-typed list of
//! `{rdfProperty, colName, value}` entries. [`RecordFields::decode`] maps that
//! list onto fixed fields through a keyed property lookup.

use serde::{Deserialize, Serialize};

/// One attribute entry from the index's property list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyEntry {
    /// RDF property name, e.g. `dc:title`
    #[serde(rename = "rdfProperty")]
    pub name: String,

    /// Language tag
    #[serde(default)]
    pub lang: String,

    /// Display column name; disambiguates overloaded properties
    #[serde(rename = "colName", default)]
    pub col_name: String,

    /// Attribute value
    #[serde(default)]
    pub value: String,
}

/// Fixed bibliographic fields decoded from the property list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFields {
    pub title: String,
    pub issue: String,
    pub download_count: u32,
    pub citation_count: u32,
    pub published: String,
    pub authors: Vec<String>,
    pub source_name: String,
    pub source_alias: String,
    pub description: String,
    pub classify_name: String,
    pub classify_code: String,
}

/// Target field a property name maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKey {
    Title,
    Issue,
    DownloadCount,
    CitationCount,
    ClassifyCode,
    Creator,
    Source,
    Date,
    Description,
}

/// Keyed lookup from property name to target field
fn field_key(property: &str) -> Option<FieldKey> {
    match property {
        "dc:title" => Some(FieldKey::Title),
        "cnki:issue" => Some(FieldKey::Issue),
        "cnki:downloadedtime" => Some(FieldKey::DownloadCount),
        "cnki:citedtime" => Some(FieldKey::CitationCount),
        "cnki:clccode" => Some(FieldKey::ClassifyCode),
        "dc:creator" => Some(FieldKey::Creator),
        "dc:source" => Some(FieldKey::Source),
        "dc:date" => Some(FieldKey::Date),
        "dc:description" => Some(FieldKey::Description),
        _ => None,
    }
}

// Column labels the index uses for the overloaded dc:source property.
// Alias columns come first, name columns second.
const SOURCE_ALIAS_COLUMNS: &[&str] = &["来源代码", "学会代码", "拼音刊名"];
const SOURCE_NAME_COLUMNS: &[&str] = &["来源", "会议名称", "中文刊名", "学位授予单位"];

impl RecordFields {
    /// Decode the property list into fixed fields.
    ///
    /// Unknown properties are ignored; repeated `dc:creator` entries
    /// accumulate into the author list.
    pub fn decode(properties: &[PropertyEntry]) -> Self {
        let mut fields = RecordFields::default();

        for entry in properties {
            let Some(key) = field_key(entry.name.to_lowercase().as_str()) else {
                continue;
            };

            match key {
                FieldKey::Title => fields.title = entry.value.clone(),
                FieldKey::Issue => fields.issue = entry.value.clone(),
                FieldKey::DownloadCount => {
                    fields.download_count = entry.value.parse().unwrap_or(0);
                }
                FieldKey::CitationCount => {
                    fields.citation_count = entry.value.parse().unwrap_or(0);
                }
                FieldKey::ClassifyCode => {
                    fields.classify_name = entry.col_name.clone();
                    fields.classify_code = entry.value.clone();
                }
                FieldKey::Creator => fields.authors.push(entry.value.clone()),
                FieldKey::Source => {
                    if SOURCE_ALIAS_COLUMNS.contains(&entry.col_name.as_str()) {
                        fields.source_alias = entry.value.clone();
                    } else if SOURCE_NAME_COLUMNS.contains(&entry.col_name.as_str()) {
                        fields.source_name = entry.value.clone();
                    }
                }
                FieldKey::Date => fields.published = entry.value.clone(),
                FieldKey::Description => fields.description = entry.value.clone(),
            }
        }

        fields
    }
}

/// A decoded bibliographic record.
///
/// The record is read-only to the navigator and transfer engine; only the
/// instance id is consumed when resolving the artifact location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Artifact instance id, e.g. `cjfd:ABC123`
    pub instance: String,

    /// RDF type reported by the index
    pub rdf_type: String,

    /// Decoded fields
    pub fields: RecordFields,
}

impl Record {
    /// Build a record from its raw attribute list
    pub fn from_properties(
        instance: impl Into<String>,
        rdf_type: impl Into<String>,
        properties: &[PropertyEntry],
    ) -> Self {
        Self {
            instance: instance.into(),
            rdf_type: rdf_type.into(),
            fields: RecordFields::decode(properties),
        }
    }
}

/// Resolved location descriptor for one artifact instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Mirror URLs in preference order; the first is used
    pub urls: Vec<String>,

    /// Declared artifact size in bytes
    pub declared_size: u64,

    /// Filename suggested by the index
    pub suggested_filename: String,
}
