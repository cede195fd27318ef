//! Filter pipeline - derives the displayed list from the global feed
//!
//! Pure apart from one side effect: the `number` counters on type filters
//! and watched entities are recomputed on every run.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::model::{NotificationRecord, TypeFilter, WatchedPerson, WatchedRepo};

/// Filter configuration whose counters the pipeline maintains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub type_filters: Vec<TypeFilter>,
    pub watched_repos: Vec<WatchedRepo>,
    pub watched_persons: Vec<WatchedPerson>,
}

impl FilterConfig {
    fn type_active(&self, record: &NotificationRecord) -> bool {
        // a type without a filter entry is shown
        self.type_filters
            .iter()
            .find(|f| f.kind == record.kind)
            .map_or(true, |f| f.active)
    }

    fn has_active_watch(&self) -> bool {
        self.watched_repos.iter().any(|r| r.active) || self.watched_persons.iter().any(|p| p.active)
    }

    fn watched_repo(&self, record: &NotificationRecord) -> Option<&WatchedRepo> {
        self.watched_repos.iter().find(|r| repo_matches(r, record))
    }

    fn watched_person(&self, record: &NotificationRecord) -> Option<&WatchedPerson> {
        self.watched_persons.iter().find(|p| person_matches(p, record))
    }

    /// Watch predicate: never a muted match; an active unmuted match when any watch is active
    fn passes_watch(&self, record: &NotificationRecord) -> bool {
        let repo = self.watched_repo(record);
        let person = self.watched_person(record);

        if repo.is_some_and(|r| r.muted) || person.is_some_and(|p| p.muted) {
            return false;
        }
        if !self.has_active_watch() {
            return true;
        }
        repo.is_some_and(|r| r.active) || person.is_some_and(|p| p.active)
    }
}

fn repo_matches(repo: &WatchedRepo, record: &NotificationRecord) -> bool {
    repo.id == record.repo_id
}

fn person_matches(person: &WatchedPerson, record: &NotificationRecord) -> bool {
    record.author_login() == Some(person.login.as_str())
}

/// Whether `record` belongs in the displayed list
pub fn is_visible(record: &NotificationRecord, settings: &Settings, filters: &FilterConfig) -> bool {
    if settings.show_only_open && record.is_terminal() {
        return false;
    }
    if record.done && !settings.apply_filters_for_done {
        return true;
    }
    filters.type_active(record) && filters.passes_watch(record)
}

/// Recompute every `number` counter from the global feed
pub fn update_counters(global: &[NotificationRecord], filters: &mut FilterConfig) {
    let unread: Vec<&NotificationRecord> = global.iter().filter(|r| r.unread).collect();

    for filter in &mut filters.type_filters {
        filter.number = unread.iter().filter(|r| r.kind == filter.kind).count();
    }
    for repo in &mut filters.watched_repos {
        repo.number = unread.iter().filter(|r| repo_matches(repo, r)).count();
    }
    for person in &mut filters.watched_persons {
        person.number = unread.iter().filter(|r| person_matches(person, r)).count();
    }
}

/// Run the pipeline: refresh counters, then keep visible records in global order
pub fn apply_filters(
    global: &[NotificationRecord],
    settings: &Settings,
    filters: &mut FilterConfig,
) -> Vec<NotificationRecord> {
    update_counters(global, filters);
    global
        .iter()
        .filter(|r| is_visible(r, settings, filters))
        .cloned()
        .collect()
}
