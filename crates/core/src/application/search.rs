// Report search use case

use crate::domain::{SearchField, StoredReport};
use crate::error::Result;
use crate::port::JobStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NO_MATCHES_MESSAGE: &str = "No results found for your search.";
pub const NO_REPORTS_MESSAGE: &str = "There are no completed jobs in the database yet.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub field: SearchField,
    #[serde(default)]
    pub value: String,
}

impl SearchQuery {
    pub fn new(field: SearchField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Query listing every stored report
    pub fn all() -> Self {
        Self::default()
    }
}

/// Search results, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub reports: Vec<StoredReport>,
    /// True when the query had a non-empty value
    pub filtered: bool,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Operator-facing message for an empty result set
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.reports.is_empty() {
            return None;
        }
        Some(if self.filtered {
            NO_MATCHES_MESSAGE
        } else {
            NO_REPORTS_MESSAGE
        })
    }
}

/// Run a search against the job store.
///
/// A blank value lists every report; otherwise the field must match the
/// trimmed value exactly. Store failures are returned as errors, never as
/// an empty result.
pub async fn search(store: &dyn JobStore, query: &SearchQuery) -> Result<SearchResults> {
    let value = query.value.trim();
    let filtered = !value.is_empty();

    let mut reports = if filtered {
        store.query_by(query.field, value).await?
    } else {
        store.list_all().await?
    };
    reports.sort_by(|a, b| b.report.finish_time.cmp(&a.report.finish_time));

    debug!(
        field = %query.field,
        value,
        matches = reports.len(),
        "Report search completed"
    );

    Ok(SearchResults { reports, filtered })
}
