//! Search API payloads
//!
//! The search endpoint takes `{fulltext, metadata.resource_type[], facets[]}`
//! and answers `{results: [{resource_type, files: [{filename, srn}]}]}`.
//! Only the file names and SRNs are kept, grouped by resource type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PlatformConfig;

/// Outbound search request. Built fresh for every incoming query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Free-text term
    pub fulltext: String,
    /// Resource-type filter
    pub metadata: SearchMetadata,
    /// Facets to compute
    pub facets: Vec<String>,
}

/// `metadata` block of a [`SearchRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMetadata {
    /// Resource types the search is restricted to
    pub resource_type: Vec<String>,
}

impl SearchRequest {
    /// Wraps `term` in the configured resource-type filter and facets.
    pub fn new(term: impl Into<String>, config: &PlatformConfig) -> Self {
        Self {
            fulltext: term.into(),
            metadata: SearchMetadata {
                resource_type: config.resource_types.clone(),
            },
            facets: config.facets.clone(),
        }
    }
}

/// Search API response; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResult {
    #[serde(default)]
    resource_type: Option<String>,
    #[serde(default)]
    files: Option<Vec<FileEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileEntry {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    srn: Option<String>,
}

/// File name and SRN of one search hit, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundFile {
    /// File name; empty when the search API omitted it
    #[serde(rename = "Filename")]
    pub filename: String,
    /// SRN; empty when the search API omitted it
    #[serde(rename = "Srn")]
    pub srn: String,
}

/// Resource type to the files found for it.
pub type FilesByResourceType = BTreeMap<String, Vec<FoundFile>>;

impl SearchResponse {
    /// Groups every file of every result under its resource type.
    ///
    /// Files keep the order in which the search API listed them. Results
    /// without a resource type are grouped under `""`; results without
    /// files contribute nothing.
    pub fn files_by_resource_type(self) -> FilesByResourceType {
        let mut grouped = FilesByResourceType::new();

        for result in self.results.unwrap_or_default() {
            let key = result.resource_type.unwrap_or_default();
            for file in result.files.unwrap_or_default() {
                let found = FoundFile {
                    filename: file.filename.unwrap_or_default(),
                    srn: file.srn.unwrap_or_default(),
                };
                tracing::debug!(
                    resource_type = %key,
                    filename = %found.filename,
                    srn = %found.srn,
                    "Adding search hit"
                );
                grouped.entry(key.clone()).or_default().push(found);
            }
        }

        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> FilesByResourceType {
        serde_json::from_value::<SearchResponse>(value)
            .unwrap()
            .files_by_resource_type()
    }

    #[test]
    fn test_search_request_serializes_envelope() {
        let request = SearchRequest::new("A05-01", &PlatformConfig::default());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "fulltext": "A05-01",
                "metadata": {
                    "resource_type": [
                        "master-data/Well",
                        "work-product-component/WellLog",
                        "work-product-component/WellborePath"
                    ]
                },
                "facets": ["resource_type"]
            })
        );
    }

    #[test]
    fn test_groups_files_by_resource_type() {
        let grouped = parse(json!({
            "results": [
                {"resource_type": "master-data/Well",
                 "files": [{"filename": "a.csv", "srn": "srn:file/csv:X:1"}]},
                {"resource_type": "work-product-component/WellLog",
                 "files": [{"filename": "b.las", "srn": "srn:file/las:Y:1"}]}
            ],
            "totalCount": 2
        }));

        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped["master-data/Well"],
            vec![FoundFile {
                filename: "a.csv".to_string(),
                srn: "srn:file/csv:X:1".to_string()
            }]
        );
        assert_eq!(grouped["work-product-component/WellLog"][0].filename, "b.las");
    }

    #[test]
    fn test_repeated_resource_type_appends_in_order() {
        let grouped = parse(json!({
            "results": [
                {"resource_type": "master-data/Well", "files": [{"filename": "1", "srn": "s1"}]},
                {"resource_type": "master-data/Well", "files": [{"filename": "2", "srn": "s2"},
                                                              {"filename": "3", "srn": "s3"}]}
            ]
        }));

        let names: Vec<&str> = grouped["master-data/Well"]
            .iter()
            .map(|f| f.filename.as_str())
            .collect();
        assert_eq!(names, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_zero_results_is_empty_mapping() {
        assert!(parse(json!({"results": []})).is_empty());
        assert!(parse(json!({})).is_empty());
        assert!(parse(json!({"results": null})).is_empty());
    }

    #[test]
    fn test_missing_fields_become_empty_strings() {
        let grouped = parse(json!({
            "results": [
                {"files": [{"srn": "srn:only"}, {"filename": "only.csv"}]}
            ]
        }));

        let files = &grouped[""];
        assert_eq!(files[0].filename, "");
        assert_eq!(files[0].srn, "srn:only");
        assert_eq!(files[1].srn, "");
    }

    #[test]
    fn test_result_without_files_adds_nothing() {
        let grouped = parse(json!({
            "results": [{"resource_type": "master-data/Well"}]
        }));
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_found_file_uses_capitalised_keys() {
        let file = FoundFile {
            filename: "a.csv".to_string(),
            srn: "srn:file/csv:X:1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(file).unwrap(),
            json!({"Filename": "a.csv", "Srn": "srn:file/csv:X:1"})
        );
    }
}
