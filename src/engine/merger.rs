//! State merger - folds one sync's records into the canonical collection
//!
//! ## Merge rules
//! 1. Records are matched by `id` within their provider partition.
//! 2. `pinned`, `muted`, `done` and `opened` always carry over from the prior record.
//! 3. `unread` stays cleared across syncs unless the content changed; opened or
//!    pinned records are kept read when the read policies say so.
//! 4. Records missing from an authoritative batch are evicted unless pinned or
//!    done; kept ones are marked stale and frozen.
//! 5. An unavailable provider keeps its prior partition untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::detector::detect_changes;
use super::scorer::score;
use crate::config::Settings;
use crate::error::MergeError;
use crate::model::{NotificationRecord, NotificationType, PriorityRule, Provider};

/// One provider's input to a merge
#[derive(Debug, Clone)]
pub enum ProviderBatch {
    /// Authoritative list of the provider's current notifications
    Fetched(Vec<NotificationRecord>),
    /// No authoritative data this cycle (fetch failed or provider not in view)
    Unavailable,
}

/// Canonical collection, partitioned by provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalState {
    pub github: Vec<NotificationRecord>,
    pub gitlab: Vec<NotificationRecord>,
}

impl CanonicalState {
    pub fn partition(&self, provider: Provider) -> &[NotificationRecord] {
        match provider {
            Provider::Github => &self.github,
            Provider::Gitlab => &self.gitlab,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.github.iter().chain(self.gitlab.iter())
    }

    pub fn find(&self, id: &str) -> Option<&NotificationRecord> {
        self.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut NotificationRecord> {
        self.github
            .iter_mut()
            .chain(self.gitlab.iter_mut())
            .find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.github.len() + self.gitlab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inputs shared by the per-record stages of a merge
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub settings: &'a Settings,
    pub rules: &'a [PriorityRule],
}

/// What a merge did, by record id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    pub merged: usize,
    pub evicted: Vec<String>,
    pub retained_stale: Vec<String>,
    pub changed: Vec<String>,
    /// New or changed records that are unread
    pub fresh: Vec<String>,
}

/// Merge both provider batches into a new canonical state.
///
/// On error nothing is produced and `prior` stays authoritative.
pub fn merge(
    prior: &CanonicalState,
    github: ProviderBatch,
    gitlab: ProviderBatch,
    ctx: MergeContext<'_>,
) -> Result<(CanonicalState, MergeStats), MergeError> {
    let limit = ctx.settings.notification_limit();
    let github = prepare_batch(Provider::Github, github, limit)?;
    let gitlab = prepare_batch(Provider::Gitlab, gitlab, limit)?;

    // ids must be unique across providers after the merge
    let github_ids = resulting_ids(&github, &prior.github);
    let gitlab_ids = resulting_ids(&gitlab, &prior.gitlab);
    for (id, (gh_kind, _)) in &github_ids {
        if let Some((gl_kind, _)) = gitlab_ids.get(id) {
            return Err(MergeError::KeyCollision {
                id: id.clone(),
                first_provider: Provider::Github,
                first_kind: *gh_kind,
                second_provider: Provider::Gitlab,
                second_kind: *gl_kind,
            });
        }
    }

    let mut stats = MergeStats::default();
    let state = CanonicalState {
        github: merge_partition(&prior.github, github, ctx, &mut stats),
        gitlab: merge_partition(&prior.gitlab, gitlab, ctx, &mut stats),
    };

    info!(
        merged = stats.merged,
        evicted = stats.evicted.len(),
        stale = stats.retained_stale.len(),
        changed = stats.changed.len(),
        "Merged sync cycle"
    );
    Ok((state, stats))
}

/// Deduplicate, order and bound a fetched batch
fn prepare_batch(
    provider: Provider,
    batch: ProviderBatch,
    limit: usize,
) -> Result<Option<Vec<NotificationRecord>>, MergeError> {
    let records = match batch {
        ProviderBatch::Fetched(records) => records,
        ProviderBatch::Unavailable => return Ok(None),
    };

    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<NotificationRecord> = Vec::with_capacity(records.len());
    for record in records {
        if record.provider != provider {
            return Err(MergeError::KeyCollision {
                id: record.id.clone(),
                first_provider: provider,
                first_kind: record.kind,
                second_provider: record.provider,
                second_kind: record.kind,
            });
        }
        match by_id.get(&record.id) {
            Some(&index) => {
                let existing = &unique[index];
                if existing.kind != record.kind {
                    return Err(MergeError::KeyCollision {
                        id: record.id.clone(),
                        first_provider: provider,
                        first_kind: existing.kind,
                        second_provider: provider,
                        second_kind: record.kind,
                    });
                }
                debug!(id = %record.id, "Duplicate id in batch, keeping newest");
                if record.time > existing.time {
                    unique[index] = record;
                }
            }
            None => {
                by_id.insert(record.id.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    sort_by_time(&mut unique);
    if unique.len() > limit {
        warn!(provider = %provider, received = unique.len(), limit, "Batch exceeds notification number, truncating");
        unique.truncate(limit);
    }
    Ok(Some(unique))
}

fn resulting_ids(
    batch: &Option<Vec<NotificationRecord>>,
    prior: &[NotificationRecord],
) -> HashMap<String, (NotificationType, Provider)> {
    let mut ids = HashMap::new();
    let mut insert = |r: &NotificationRecord| {
        ids.insert(r.id.clone(), (r.kind, r.provider));
    };
    match batch {
        Some(records) => {
            records.iter().for_each(&mut insert);
            prior.iter().filter(|r| r.pinned || r.done).for_each(&mut insert);
        }
        None => prior.iter().for_each(&mut insert),
    }
    ids
}

fn merge_partition(
    prior: &[NotificationRecord],
    batch: Option<Vec<NotificationRecord>>,
    ctx: MergeContext<'_>,
    stats: &mut MergeStats,
) -> Vec<NotificationRecord> {
    let Some(incoming) = batch else {
        return prior.to_vec();
    };

    let prior_index: HashMap<&str, &NotificationRecord> =
        prior.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut merged = Vec::with_capacity(incoming.len());
    for record in incoming {
        let previous = prior_index.get(record.id.as_str()).copied();
        let mut record = detect_changes(record, previous);
        record.priority = score(&record, ctx.rules);
        record.stale = false;

        let changed = record.previously.is_some();
        if let Some(previous) = previous {
            carry_user_state(&mut record, previous, ctx.settings);
        }
        if changed {
            stats.changed.push(record.id.clone());
        }
        if (previous.is_none() || changed) && record.unread {
            stats.fresh.push(record.id.clone());
        }
        stats.merged += 1;
        merged.push(record);
    }

    let present: std::collections::HashSet<&str> = merged.iter().map(|r| r.id.as_str()).collect();
    let mut retained = Vec::new();
    for record in prior {
        if present.contains(record.id.as_str()) {
            continue;
        }
        if record.pinned || record.done {
            let mut kept = record.clone();
            kept.stale = true;
            kept.previously = None;
            stats.retained_stale.push(kept.id.clone());
            retained.push(kept);
        } else {
            stats.evicted.push(record.id.clone());
        }
    }

    merged.extend(retained);
    sort_by_time(&mut merged);
    merged
}

/// Carry user-owned flags from the prior record onto the incoming one
fn carry_user_state(record: &mut NotificationRecord, prior: &NotificationRecord, settings: &Settings) {
    record.pinned = prior.pinned;
    record.muted = prior.muted;
    record.done = prior.done;
    record.opened = prior.opened;

    if record.previously.is_some() {
        record.unread = true;
        return;
    }
    let read_by_policy =
        (settings.read_when_open_in_browser && record.opened) || (settings.read_when_pin && record.pinned);
    record.unread = prior.unread && record.unread && !read_by_policy;
}

/// Re-apply priority rules to every record
pub fn rescore(state: &mut CanonicalState, rules: &[PriorityRule]) {
    for record in state.github.iter_mut().chain(state.gitlab.iter_mut()) {
        record.priority = score(record, rules);
    }
}

/// Stable sort, newest first
pub fn sort_by_time(records: &mut [NotificationRecord]) {
    records.sort_by(|a, b| b.time.cmp(&a.time));
}

/// Union of the providers in view, in display order
pub fn global_view(state: &CanonicalState, settings: &Settings) -> Vec<NotificationRecord> {
    let mut global: Vec<NotificationRecord> = state
        .iter()
        .filter(|r| settings.provider_view.includes(r.provider))
        .cloned()
        .collect();

    sort_by_time(&mut global);
    if settings.priority_sorting {
        global.sort_by(|a, b| {
            let a_value = a.priority.as_ref().map_or(i32::MIN, |p| p.value);
            let b_value = b.priority.as_ref().map_or(i32::MIN, |p| p.value);
            b_value.cmp(&a_value).then_with(|| b.time.cmp(&a.time))
        });
    }
    global
}
