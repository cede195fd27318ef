//! Provider normalizer - converts raw provider payloads into canonical records
//!
//! Each provider's raw payload type implements [`Normalize`]. Batches are
//! normalized item by item so one malformed item never aborts the batch.

pub mod github;
pub mod gitlab;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ProviderView, Settings};
use crate::error::NormalizeError;
use crate::model::{NotificationRecord, Provider};

pub use github::RawGithubNotification;
pub use gitlab::RawGitlabTodo;

/// Comment count at which a record gets the `many-comments` fact
pub const MANY_COMMENTS_THRESHOLD: u32 = 10;
/// Reaction count at which a record gets the `many-reactions` fact
pub const MANY_REACTIONS_THRESHOLD: u32 = 10;

/// A raw provider payload item that can become a canonical record
pub trait Normalize: DeserializeOwned {
    const PROVIDER: Provider;

    fn normalize(self) -> Result<NotificationRecord, NormalizeError>;
}

/// Result of normalizing one provider batch
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<NotificationRecord>,
    /// Items dropped as malformed
    pub dropped: usize,
}

/// Normalize one raw item
pub fn normalize_item<T: Normalize>(item: &serde_json::Value) -> Result<NotificationRecord, NormalizeError> {
    let raw: T = serde_json::from_value(item.clone()).map_err(|e| NormalizeError::Malformed {
        provider: T::PROVIDER,
        message: e.to_string(),
    })?;
    raw.normalize()
}

/// Normalize a raw batch for `provider`, dropping malformed items
pub fn normalize_batch(provider: Provider, items: &[serde_json::Value]) -> NormalizedBatch {
    match provider {
        Provider::Github => normalize_all::<RawGithubNotification>(items),
        Provider::Gitlab => normalize_all::<RawGitlabTodo>(items),
    }
}

fn normalize_all<T: Normalize>(items: &[serde_json::Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for item in items {
        match normalize_item::<T>(item) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!(provider = %T::PROVIDER, error = %e, "Dropping malformed notification");
                batch.dropped += 1;
            }
        }
    }
    debug!(
        provider = %T::PROVIDER,
        normalized = batch.records.len(),
        dropped = batch.dropped,
        "Normalized provider batch"
    );
    batch
}

/// What the networking collaborator should fetch this cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub per_page: usize,
    pub github: bool,
    pub gitlab: bool,
    pub gitlab_repos: Vec<String>,
    pub gitlab_only_involved: bool,
}

impl FetchRequest {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            per_page: settings.notification_limit(),
            github: settings.provider_view != ProviderView::Gitlab,
            gitlab: settings.provider_view != ProviderView::Github,
            gitlab_repos: settings.gitlab_repos.iter().map(|r| r.id.clone()).collect(),
            gitlab_only_involved: settings.gitlab_only_involved,
        }
    }
}

/// Accepts ids given as JSON strings or numbers
pub(crate) fn id_from_value(value: &Option<serde_json::Value>) -> Option<String> {
    match value.as_ref()? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
