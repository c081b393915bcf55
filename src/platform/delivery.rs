//! Delivery API payloads
//!
//! The delivery endpoint takes `{SRNS[], TargetRegionID}` and answers with a
//! pre-signed object-storage location for each resolved SRN.

use serde::{Deserialize, Serialize};

use crate::error::{QuickstartError, Result};

/// Outbound delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRequest {
    /// SRNs to resolve
    #[serde(rename = "SRNS")]
    pub srns: Vec<String>,
    /// Region the files should be delivered from
    #[serde(rename = "TargetRegionID")]
    pub target_region_id: String,
}

impl FileRequest {
    /// Request for a single SRN.
    pub fn single(srn: impl Into<String>, target_region_id: impl Into<String>) -> Self {
        Self {
            srns: vec![srn.into()],
            target_region_id: target_region_id.into(),
        }
    }
}

/// Delivery API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryResponse {
    /// One entry per resolved SRN
    #[serde(rename = "Result", default)]
    pub result: Option<Vec<DeliveryResult>>,
    /// SRNs the platform could not resolve
    #[serde(rename = "UnprocessedSRNs", default)]
    pub unprocessed_srns: Option<Vec<String>>,
}

/// Delivery details for one SRN.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryResult {
    /// SRN this entry belongs to
    #[serde(rename = "SRN", default)]
    pub srn: Option<String>,
    /// Where the file can be downloaded from
    #[serde(rename = "FileLocation", default)]
    pub file_location: Option<FileLocation>,
}

/// Pre-signed object-storage location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileLocation {
    /// Storage endpoint, including the trailing slash
    #[serde(rename = "EndPoint", default)]
    pub endpoint: Option<String>,
    /// Container or bucket name
    #[serde(rename = "Bucket", default)]
    pub bucket: Option<String>,
    /// Object key within the bucket
    #[serde(rename = "Key", default)]
    pub key: Option<String>,
    /// Credentials granting temporary read access
    #[serde(rename = "TemporaryCredentials", default)]
    pub temporary_credentials: Option<TemporaryCredentials>,
}

/// Temporary read credentials for a [`FileLocation`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemporaryCredentials {
    /// Shared access signature, appended as the URL query
    #[serde(rename = "SAS", default)]
    pub sas: Option<String>,
}

impl DeliveryResponse {
    /// File location of the first result, if any.
    pub fn first_location(&self) -> Option<&FileLocation> {
        self.result
            .as_ref()?
            .first()?
            .file_location
            .as_ref()
    }
}

impl FileLocation {
    /// Builds the pre-signed download URL: `EndPoint + Bucket + "/" + Key + "?" + SAS`.
    ///
    /// The `?SAS` suffix is left off when no signature was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::MalformedResponse`] if the endpoint,
    /// bucket or key is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use osdu_quickstart::platform::delivery::{FileLocation, TemporaryCredentials};
    ///
    /// let location = FileLocation {
    ///     endpoint: Some("https://x/".to_string()),
    ///     bucket: Some("b".to_string()),
    ///     key: Some("k".to_string()),
    ///     temporary_credentials: Some(TemporaryCredentials { sas: Some("tok".to_string()) }),
    /// };
    /// assert_eq!(location.download_url().unwrap(), "https://x/b/k?tok");
    /// ```
    pub fn download_url(&self) -> Result<String> {
        let endpoint = required("EndPoint", &self.endpoint)?;
        let bucket = required("Bucket", &self.bucket)?;
        let key = required("Key", &self.key)?;

        let mut url = format!("{endpoint}{bucket}/{key}");
        if let Some(sas) = self
            .temporary_credentials
            .as_ref()
            .and_then(|c| c.sas.as_deref())
            .filter(|s| !s.is_empty())
        {
            url.push('?');
            url.push_str(sas);
        }

        Ok(url)
    }
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(QuickstartError::MalformedResponse {
            service: "delivery",
            message: format!("file location is missing {field}"),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_request_serializes_single_srn() {
        let request = FileRequest::single("srn:file/csv:ABC:1", "");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"SRNS": ["srn:file/csv:ABC:1"], "TargetRegionID": ""})
        );
    }

    #[test]
    fn test_first_location_download_url() {
        let response: DeliveryResponse = serde_json::from_value(json!({
            "Result": [{
                "SRN": "srn:file/csv:X:1",
                "FileLocation": {
                    "EndPoint": "https://x/",
                    "Bucket": "b",
                    "Key": "k",
                    "TemporaryCredentials": {"SAS": "tok"}
                }
            }],
            "UnprocessedSRNs": []
        }))
        .unwrap();

        let location = response.first_location().expect("location");
        assert_eq!(location.download_url().unwrap(), "https://x/b/k?tok");
    }

    #[test]
    fn test_download_url_without_sas_has_no_query() {
        let location = FileLocation {
            endpoint: Some("https://x/".to_string()),
            bucket: Some("b".to_string()),
            key: Some("dir/k.csv".to_string()),
            temporary_credentials: None,
        };
        assert_eq!(location.download_url().unwrap(), "https://x/b/dir/k.csv");
    }

    #[test]
    fn test_download_url_requires_key() {
        let location = FileLocation {
            endpoint: Some("https://x/".to_string()),
            bucket: Some("b".to_string()),
            ..Default::default()
        };
        let err = location.download_url().unwrap_err();
        assert!(err.to_string().contains("missing Key"));
    }

    #[test]
    fn test_empty_result_has_no_location() {
        let response: DeliveryResponse =
            serde_json::from_value(json!({"Result": [], "UnprocessedSRNs": ["srn:x"]})).unwrap();
        assert!(response.first_location().is_none());
        assert_eq!(response.unprocessed_srns, Some(vec!["srn:x".to_string()]));

        let response: DeliveryResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.first_location().is_none());
    }
}
