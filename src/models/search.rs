//! Search query and result page models.

use serde::{Deserialize, Serialize};

use crate::models::Record;

/// Field the search keyword is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Subject,
    Abstract,
    Author,
    Keyword,
}

impl FilterField {
    /// Wire identifier the index expects in the `filter` parameter
    pub fn wire_name(&self) -> &'static str {
        match self {
            FilterField::Subject => "dc:title",
            FilterField::Abstract => "dc:description",
            FilterField::Author => "dc:creator",
            FilterField::Keyword => "dc:title",
        }
    }

    /// Human-readable label for prompts
    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Subject => "subject",
            FilterField::Abstract => "abstract",
            FilterField::Author => "author",
            FilterField::Keyword => "keyword",
        }
    }
}

/// Which collection of the index to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseScope {
    All,
    Journals,
    DoctoralTheses,
    MastersTheses,
    Conferences,
}

impl DatabaseScope {
    /// URL path of the collection on the index server
    pub fn path(&self) -> &'static str {
        match self {
            DatabaseScope::All => "/data/literatures",
            DatabaseScope::Journals => "/data/journals",
            DatabaseScope::DoctoralTheses => "/data/doctortheses",
            DatabaseScope::MastersTheses => "/data/mastertheses",
            DatabaseScope::Conferences => "/data/conferences",
        }
    }

    /// Human-readable label for prompts
    pub fn label(&self) -> &'static str {
        match self {
            DatabaseScope::All => "all collections",
            DatabaseScope::Journals => "journals",
            DatabaseScope::DoctoralTheses => "doctoral theses",
            DatabaseScope::MastersTheses => "master's theses",
            DatabaseScope::Conferences => "conference papers",
        }
    }
}

/// Ordering of the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Relevance,
    CitationCount,
    PublishDate,
    DownloadCount,
}

impl OrderField {
    /// Wire identifier the index expects in the `order` parameter
    pub fn wire_name(&self) -> &'static str {
        match self {
            OrderField::Relevance => "dc:title",
            OrderField::CitationCount => "cnki:citedtime",
            OrderField::PublishDate => "cnki:year",
            OrderField::DownloadCount => "cnki:downloadedtime",
        }
    }

    /// Human-readable label for prompts
    pub fn label(&self) -> &'static str {
        match self {
            OrderField::Relevance => "relevance",
            OrderField::CitationCount => "citation count",
            OrderField::PublishDate => "publish date",
            OrderField::DownloadCount => "download count",
        }
    }
}

/// An immutable search query identifying one paginated result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Keyword to search for
    pub keyword: String,

    /// Field the keyword is matched against
    pub filter: FilterField,

    /// Collection scope
    pub scope: DatabaseScope,

    /// Result ordering
    pub order: OrderField,
}

impl SearchQuery {
    /// Create a query with default filter, scope and ordering
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            filter: FilterField::Subject,
            scope: DatabaseScope::All,
            order: OrderField::Relevance,
        }
    }

    /// Set the filter field
    pub fn filter(mut self, filter: FilterField) -> Self {
        self.filter = filter;
        self
    }

    /// Set the collection scope
    pub fn scope(mut self, scope: DatabaseScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the result ordering
    pub fn order(mut self, order: OrderField) -> Self {
        self.order = order;
        self
    }
}

/// One page of search results as reported by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPage {
    /// 1-based page index reported by the server
    pub page_index: u32,

    /// Number of records per page
    pub page_size: u32,

    /// Total number of pages in the result set
    pub total_pages: u32,

    /// Total number of records in the result set
    pub total_records: u64,

    /// Records on this page
    pub records: Vec<Record>,
}

impl ResultPage {
    /// Whether this page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
