//! Notification engine - runs sync cycles and publishes feed snapshots
//!
//! # Cycle
//! 1. Both provider fetches run concurrently, outside the state lock.
//! 2. A failed fetch becomes [`ProviderBatch::Unavailable`].
//! 3. Under the lock: normalize, detect changes, score, merge, filter.
//! 4. One [`FeedSnapshot`] is published; a failed merge publishes nothing.
//!
//! User actions and configuration changes take the same lock, so they land
//! strictly before or after a merge.
//!
//! # Example
//! ```ignore
//! let engine = NotificationEngine::new(ConfigStore::default(), CanonicalState::default());
//! let report = engine.sync(fetch_github(), fetch_gitlab()).await?;
//! let feed = engine.snapshot();
//! ```

pub mod detector;
pub mod filter;
pub mod merger;
pub mod scorer;

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigStore, Settings};
use crate::error::EngineError;
use crate::model::{
    NotificationRecord, NotificationType, PriorityRule, Provider, RawPriorityRule, TypeFilter,
    WatchedPerson, WatchedRepo,
};
use crate::provider::{normalize_batch, FetchRequest};

pub use filter::FilterConfig;
pub use merger::{CanonicalState, MergeStats, ProviderBatch};

/// Everything observers see after a cycle or a user change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub github_notifications: Vec<NotificationRecord>,
    pub gitlab_notifications: Vec<NotificationRecord>,
    pub global_notifications: Vec<NotificationRecord>,
    pub filtered_notifications: Vec<NotificationRecord>,
    pub type_filters: Vec<TypeFilter>,
    pub watched_repos: Vec<WatchedRepo>,
    pub watched_persons: Vec<WatchedPerson>,
    /// Unread records in the global feed (tray badge)
    pub unread_count: usize,
    pub error: Option<String>,
}

/// Outcome of one sync cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub github_available: bool,
    pub gitlab_available: bool,
    /// Malformed payload items dropped by the normalizer
    pub dropped: usize,
    #[serde(flatten)]
    pub stats: MergeStats,
}

/// User-initiated mutation of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserAction {
    Pin,
    Unpin,
    MarkDone,
    MarkUndone,
    Mute,
    Unmute,
    MarkRead,
    MarkUnread,
    /// Opened in the browser
    Open,
}

/// Apply `action` to `record` under the read policies in `settings`
pub fn apply_action(record: &mut NotificationRecord, action: UserAction, settings: &Settings) {
    match action {
        UserAction::Pin => {
            record.pinned = true;
            if settings.read_when_pin {
                record.unread = false;
            }
        }
        UserAction::Unpin => record.pinned = false,
        UserAction::MarkDone => record.done = true,
        UserAction::MarkUndone => record.done = false,
        UserAction::Mute => record.muted = true,
        UserAction::Unmute => record.muted = false,
        UserAction::MarkRead => record.unread = false,
        UserAction::MarkUnread => record.unread = true,
        UserAction::Open => {
            record.opened = true;
            if settings.read_when_open_in_browser {
                record.unread = false;
            }
        }
    }
}

/// Engine state; only ever touched under the engine lock
#[derive(Debug)]
struct EngineState {
    settings: Settings,
    raw_rules: Vec<RawPriorityRule>,
    rules: Vec<PriorityRule>,
    filters: FilterConfig,
    canonical: CanonicalState,
    error: Option<String>,
}

impl EngineState {
    fn new(config: ConfigStore, canonical: CanonicalState) -> Self {
        let config = config.normalized();
        let rules = scorer::compile_rules(&config.priorities);
        Self {
            settings: config.settings,
            raw_rules: config.priorities,
            rules,
            filters: FilterConfig {
                type_filters: config.type_filters,
                watched_repos: config.watched_repos,
                watched_persons: config.watched_persons,
            },
            canonical,
            error: None,
        }
    }

    /// Re-derive global and filtered lists and build a snapshot
    fn derive(&mut self) -> FeedSnapshot {
        let global = merger::global_view(&self.canonical, &self.settings);
        let filtered = filter::apply_filters(&global, &self.settings, &mut self.filters);
        FeedSnapshot {
            github_notifications: self.canonical.github.clone(),
            gitlab_notifications: self.canonical.gitlab.clone(),
            unread_count: global.iter().filter(|r| r.unread).count(),
            global_notifications: global,
            filtered_notifications: filtered,
            type_filters: self.filters.type_filters.clone(),
            watched_repos: self.filters.watched_repos.clone(),
            watched_persons: self.filters.watched_persons.clone(),
            error: self.error.clone(),
        }
    }

    fn config(&self) -> ConfigStore {
        ConfigStore {
            settings: self.settings.clone(),
            priorities: self.raw_rules.clone(),
            type_filters: self.filters.type_filters.clone(),
            watched_repos: self.filters.watched_repos.clone(),
            watched_persons: self.filters.watched_persons.clone(),
        }
    }
}

/// Clears the in-flight flag when a cycle ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct NotificationEngine {
    state: Mutex<EngineState>,
    in_flight: AtomicBool,
    publisher: watch::Sender<Arc<FeedSnapshot>>,
}

impl NotificationEngine {
    pub fn new(config: ConfigStore, canonical: CanonicalState) -> Self {
        let mut state = EngineState::new(config, canonical);
        let snapshot = state.derive();
        let (publisher, _) = watch::channel(Arc::new(snapshot));
        Self {
            state: Mutex::new(state),
            in_flight: AtomicBool::new(false),
            publisher,
        }
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.publisher.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.publisher.borrow().clone()
    }

    fn publish(&self, snapshot: FeedSnapshot) {
        self.publisher.send_replace(Arc::new(snapshot));
    }

    /// What the networking collaborator should fetch next cycle
    pub async fn fetch_request(&self) -> FetchRequest {
        FetchRequest::from_settings(&self.state.lock().await.settings)
    }

    /// Run one full cycle with the two provider fetches.
    ///
    /// A fetch error only makes that provider unavailable for this cycle.
    pub async fn sync<G, L>(&self, github: G, gitlab: L) -> Result<CycleReport, EngineError>
    where
        G: Future<Output = anyhow::Result<Vec<serde_json::Value>>>,
        L: Future<Output = anyhow::Result<Vec<serde_json::Value>>>,
    {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Sync requested while a cycle is in flight");
            return Err(EngineError::CycleInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (github, gitlab) = tokio::join!(github, gitlab);
        let mut dropped = 0;
        let mut to_batch = |provider: Provider, fetched: anyhow::Result<Vec<serde_json::Value>>| match fetched {
            Ok(items) => {
                let batch = normalize_batch(provider, &items);
                dropped += batch.dropped;
                ProviderBatch::Fetched(batch.records)
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Provider fetch failed, keeping prior records");
                ProviderBatch::Unavailable
            }
        };
        let github = to_batch(Provider::Github, github);
        let gitlab = to_batch(Provider::Gitlab, gitlab);

        let mut report = self.merge_locked(github, gitlab).await?;
        report.dropped = dropped;
        Ok(report)
    }

    /// Run a cycle on already normalized batches
    pub async fn ingest(&self, github: ProviderBatch, gitlab: ProviderBatch) -> Result<CycleReport, EngineError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Ingest requested while a cycle is in flight");
            return Err(EngineError::CycleInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);
        self.merge_locked(github, gitlab).await
    }

    async fn merge_locked(&self, github: ProviderBatch, gitlab: ProviderBatch) -> Result<CycleReport, EngineError> {
        let mut state = self.state.lock().await;

        // providers outside the view do not feed the merger
        let view = state.settings.provider_view;
        let github = if view.includes(Provider::Github) { github } else { ProviderBatch::Unavailable };
        let gitlab = if view.includes(Provider::Gitlab) { gitlab } else { ProviderBatch::Unavailable };

        let github_available = matches!(github, ProviderBatch::Fetched(_));
        let gitlab_available = matches!(gitlab, ProviderBatch::Fetched(_));

        let ctx = merger::MergeContext {
            settings: &state.settings,
            rules: &state.rules,
        };
        let (canonical, stats) = match merger::merge(&state.canonical, github, gitlab, ctx) {
            Ok(merged) => merged,
            Err(e) => {
                error!(error = %e, "Sync cycle aborted, keeping prior state");
                state.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        state.canonical = canonical;
        let snapshot = state.derive();
        info!(
            global = snapshot.global_notifications.len(),
            filtered = snapshot.filtered_notifications.len(),
            unread = snapshot.unread_count,
            "Sync cycle published"
        );
        self.publish(snapshot);

        Ok(CycleReport {
            github_available,
            gitlab_available,
            dropped: 0,
            stats,
        })
    }

    /// Apply a user action to one record and republish
    pub async fn apply_action(&self, id: &str, action: UserAction) -> Result<NotificationRecord, EngineError> {
        let mut state = self.state.lock().await;
        let settings = state.settings.clone();
        let record = state
            .canonical
            .find_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        apply_action(record, action, &settings);
        let updated = record.clone();
        debug!(id, ?action, "Applied user action");

        let snapshot = state.derive();
        self.publish(snapshot);
        Ok(updated)
    }

    /// Mutate settings, then re-derive the feed
    pub async fn update_settings<F>(&self, update: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut state = self.state.lock().await;
        update(&mut state.settings);
        state.settings.notification_number = state.settings.notification_limit() as u32;
        let snapshot = state.derive();
        self.publish(snapshot);
    }

    /// Replace the priority rules and rescore every record
    pub async fn set_rules(&self, raw: Vec<RawPriorityRule>) {
        let mut state = self.state.lock().await;
        state.rules = scorer::compile_rules(&raw);
        state.raw_rules = raw;
        let EngineState { canonical, rules, .. } = &mut *state;
        merger::rescore(canonical, rules);
        let snapshot = state.derive();
        self.publish(snapshot);
    }

    pub async fn set_type_filter(&self, kind: NotificationType, active: bool) {
        self.update_filters(|filters| {
            match filters.type_filters.iter_mut().find(|f| f.kind == kind) {
                Some(filter) => filter.active = active,
                None => filters.type_filters.push(TypeFilter { active, ..TypeFilter::new(kind) }),
            }
        })
        .await;
    }

    /// Add or replace a watched repository (matched by id)
    pub async fn watch_repo(&self, repo: WatchedRepo) {
        self.update_filters(|filters| {
            filters.watched_repos.retain(|r| r.id != repo.id);
            filters.watched_repos.push(repo);
        })
        .await;
    }

    /// Add or replace a watched person (matched by login)
    pub async fn watch_person(&self, person: WatchedPerson) {
        self.update_filters(|filters| {
            filters.watched_persons.retain(|p| p.login != person.login);
            filters.watched_persons.push(person);
        })
        .await;
    }

    pub async fn unwatch_repo(&self, id: &str) -> bool {
        let mut removed = false;
        self.update_filters(|filters| {
            let before = filters.watched_repos.len();
            filters.watched_repos.retain(|r| r.id != id);
            removed = filters.watched_repos.len() != before;
        })
        .await;
        removed
    }

    pub async fn unwatch_person(&self, login: &str) -> bool {
        let mut removed = false;
        self.update_filters(|filters| {
            let before = filters.watched_persons.len();
            filters.watched_persons.retain(|p| p.login != login);
            removed = filters.watched_persons.len() != before;
        })
        .await;
        removed
    }

    async fn update_filters<F>(&self, update: F)
    where
        F: FnOnce(&mut FilterConfig),
    {
        let mut state = self.state.lock().await;
        update(&mut state.filters);
        let snapshot = state.derive();
        self.publish(snapshot);
    }

    /// Last fatal cycle error, if any
    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn clear_error(&self) {
        let mut state = self.state.lock().await;
        if state.error.take().is_some() {
            let snapshot = state.derive();
            self.publish(snapshot);
        }
    }

    /// Current configuration and canonical state, for persistence
    pub async fn export(&self) -> (ConfigStore, CanonicalState) {
        let state = self.state.lock().await;
        (state.config(), state.canonical.clone())
    }
}
