//! HTTP implementation of the record store.
//!
//! Searches go to the collection endpoints as filtered queries; artifact
//! resolution is a two-step lookup where the download endpoint echoes an info
//! URL that serves an XML location descriptor.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::models::{ArtifactLocation, PropertyEntry, Record, ResultPage, SearchQuery};
use crate::store::{RecordStore, StoreError};

/// Field list requested with every search
const SEARCH_FIELDS: &str = "dc:title,cnki:issue,cnki:year,cnki:downloadedtime,dc:creator,\
                             cnki:citedtime,dc:source,dc:contributor,dc:source@py,dc:date,\
                             cnki:clccode,dc:description";

/// Record store backed by the index's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    api_base: String,
    token: String,
}

impl HttpStore {
    /// Create a store for the given API base URL and bearer token.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self, StoreError> {
        let api_base = api_base.into();
        let parsed = url::Url::parse(&api_base)
            .map_err(|e| StoreError::InvalidRequest(format!("invalid API base URL: {}", e)))?;

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: parsed.as_str().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Shared HTTP client, reused by the transfer engine
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Bearer token attached to index requests
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[async_trait::async_trait]
impl RecordStore for HttpStore {
    async fn search(&self, query: &SearchQuery, page: u32) -> Result<ResultPage, StoreError> {
        if page == 0 {
            return Err(StoreError::InvalidRequest("page index is 1-based".into()));
        }

        let url = format!("{}{}", self.api_base, query.scope.path());
        let filter = format!("{} eq {}", query.filter.wire_name(), query.keyword);
        let order = format!("{}+desc", query.order.wire_name());

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("fields", SEARCH_FIELDS),
                ("filter", filter.as_str()),
                ("order", order.as_str()),
            ]);

        // Page 1 is the implicit default; the parameter is only sent beyond it.
        if page > 1 {
            request = request.query(&[("page", page.to_string())]);
        }

        tracing::debug!(page, keyword = %query.keyword, "searching index");

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(format!("search response: {}", e)))?;

        Ok(envelope.into_page())
    }

    async fn resolve_artifact(&self, instance: &str) -> Result<ArtifactLocation, StoreError> {
        let (prefix, id) = instance.split_once(':').ok_or_else(|| {
            StoreError::InvalidRequest(format!("malformed instance id: {}", instance))
        })?;

        // Step 1: the download endpoint echoes the info URL as a quoted string.
        let url = format!("{}/file/{}/{}/download", self.api_base, prefix, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("artifact lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "artifact lookup returned status {}",
                response.status()
            )));
        }

        let info_url = rewrite_scheme(response.text().await?.trim().trim_matches('"'));

        tracing::debug!(%info_url, "fetching artifact descriptor");

        // Step 2: the info URL serves the XML location descriptor.
        let response = self
            .client
            .get(&info_url)
            .header("Request-Action", "FileInfo")
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("descriptor request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "descriptor request returned status {}",
                response.status()
            )));
        }

        let raw = response.bytes().await?;
        let descriptor: ArtifactDescriptor = quick_xml::de::from_str(&decode_descriptor(&raw))?;
        descriptor.into_location()
    }
}

/// Decode descriptor bytes. Older index nodes serve the XML in a GBK family
/// charset, declared in the prolog; everything else is treated as UTF-8.
fn decode_descriptor(raw: &[u8]) -> String {
    let prolog = String::from_utf8_lossy(&raw[..raw.len().min(128)]).to_lowercase();
    if prolog.contains("gb2312") || prolog.contains("gbk") {
        let (text, _, _) = encoding_rs::GBK.decode(raw);
        return text.into_owned();
    }
    String::from_utf8_lossy(raw).into_owned()
}

/// Rewrite the index's private URL scheme to plain HTTP
fn rewrite_scheme(url: &str) -> String {
    match url.strip_prefix("cnki://") {
        Some(rest) => format!("http://{}", rest),
        None => url.to_string(),
    }
}

/// JSON envelope of a search response
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "store", default)]
    records: Vec<RawRecord>,

    #[serde(rename = "pageSize")]
    page_size: u32,

    #[serde(rename = "pageIndex")]
    page_index: u32,

    #[serde(rename = "pageCount")]
    page_count: u32,

    #[serde(rename = "recordCount")]
    record_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    instance: String,

    #[serde(rename = "rdfType", default)]
    rdf_type: String,

    #[serde(default)]
    data: Vec<PropertyEntry>,
}

impl SearchEnvelope {
    fn into_page(self) -> ResultPage {
        let records = self
            .records
            .into_iter()
            .map(|raw| Record::from_properties(raw.instance, raw.rdf_type, &raw.data))
            .collect();

        ResultPage {
            page_index: self.page_index,
            page_size: self.page_size,
            total_pages: self.page_count,
            total_records: self.record_count,
            records,
        }
    }
}

/// XML artifact location descriptor
#[derive(Debug, Deserialize)]
struct ArtifactDescriptor {
    server: ServerSection,
    document: DocumentSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    cluster: ClusterSection,
}

#[derive(Debug, Deserialize)]
struct ClusterSection {
    #[serde(default)]
    url: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentSection {
    #[serde(default)]
    filename: String,

    #[serde(default)]
    length: u64,
}

impl ArtifactDescriptor {
    fn into_location(self) -> Result<ArtifactLocation, StoreError> {
        if self.server.cluster.url.is_empty() || self.document.filename.is_empty() {
            return Err(StoreError::Parse(
                "descriptor is missing mirror URLs or filename".into(),
            ));
        }

        let urls = self
            .server
            .cluster
            .url
            .iter()
            .map(|u| rewrite_scheme(u))
            .collect();

        Ok(ArtifactLocation {
            urls,
            declared_size: self.document.length,
            suggested_filename: self.document.filename,
        })
    }
}
