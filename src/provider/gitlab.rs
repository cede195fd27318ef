//! GitLab to-do items (`/todos`)

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{id_from_value, Normalize, MANY_COMMENTS_THRESHOLD, MANY_REACTIONS_THRESHOLD};
use crate::engine::detector::derive_icon;
use crate::error::NormalizeError;
use crate::model::{
    Label, NotificationRecord, NotificationType, PriorityFacts, Provider, SubjectState, User,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RawGitlabTodo {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub action_name: String,
    pub target_type: String,
    #[serde(default)]
    pub target: Option<RawGitlabTarget>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// `pending` or `done`
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub author: Option<RawGitlabUser>,
    #[serde(default)]
    pub project: Option<RawGitlabProject>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGitlabTarget {
    #[serde(default)]
    pub iid: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    /// `opened`, `closed`, `merged` or `locked`
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub work_in_progress: bool,
    #[serde(default)]
    pub user_notes_count: u32,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub author: Option<RawGitlabUser>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGitlabUser {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl From<RawGitlabUser> for User {
    fn from(raw: RawGitlabUser) -> Self {
        User {
            name: raw.name,
            login: raw.username,
            avatar: raw.avatar_url,
            bot: raw.bot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGitlabProject {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub namespace: Option<RawGitlabNamespace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGitlabNamespace {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn notification_type(action_name: &str, target_type: &str) -> Option<NotificationType> {
    if action_name == "build_failed" {
        return Some(NotificationType::Workflow);
    }
    match target_type {
        "MergeRequest" => Some(NotificationType::Pr),
        "Issue" | "WorkItem" => Some(NotificationType::Issue),
        "Commit" => Some(NotificationType::Commit),
        _ => None,
    }
}

fn subject_state(kind: NotificationType, target: &RawGitlabTarget) -> Option<SubjectState> {
    match kind {
        NotificationType::Workflow => Some(SubjectState::Failure),
        NotificationType::Pr => match target.state.as_deref() {
            Some("opened") if target.draft || target.work_in_progress => Some(SubjectState::Draft),
            Some("opened") => Some(SubjectState::Open),
            Some("merged") => Some(SubjectState::Merged),
            Some("closed") | Some("locked") => Some(SubjectState::Closed),
            _ => None,
        },
        NotificationType::Issue => match target.state.as_deref() {
            Some("opened") => Some(SubjectState::Open),
            Some("closed") | Some("locked") => Some(SubjectState::Closed),
            _ => None,
        },
        _ => None,
    }
}

fn action_description(action_name: &str) -> &'static str {
    match action_name {
        "assigned" => "You were assigned",
        "mentioned" => "You were mentioned",
        "directly_addressed" => "You were addressed directly",
        "build_failed" => "Pipeline failed",
        "marked" => "Added to your to-do list",
        "approval_required" => "Your approval is required",
        "review_requested" => "Your review was requested",
        "unmergeable" => "Merge request can no longer be merged",
        "merge_train_removed" => "Removed from the merge train",
        _ => "New activity",
    }
}

impl Normalize for RawGitlabTodo {
    const PROVIDER: Provider = Provider::Gitlab;

    fn normalize(self) -> Result<NotificationRecord, NormalizeError> {
        let todo_id = id_from_value(&self.id).ok_or(NormalizeError::MissingField {
            provider: Provider::Gitlab,
            field: "id",
        })?;
        let time = self.updated_at.or(self.created_at).ok_or(NormalizeError::MissingField {
            provider: Provider::Gitlab,
            field: "updated_at",
        })?;
        let kind = notification_type(&self.action_name, &self.target_type).ok_or_else(|| {
            NormalizeError::UnsupportedType {
                provider: Provider::Gitlab,
                kind: self.target_type.clone(),
            }
        })?;
        let project = self.project.ok_or(NormalizeError::MissingField {
            provider: Provider::Gitlab,
            field: "project",
        })?;

        let target = self.target.unwrap_or_default();
        let state = subject_state(kind, &target);

        let description = self
            .body
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| action_description(&self.action_name).to_string());
        let title = target.title.clone().unwrap_or_else(|| description.clone());

        let facts = PriorityFacts {
            many_comments: target.user_notes_count >= MANY_COMMENTS_THRESHOLD,
            many_reactions: target.upvotes >= MANY_REACTIONS_THRESHOLD,
            assigned: self.action_name == "assigned",
            mentioned: matches!(self.action_name.as_str(), "mentioned" | "directly_addressed"),
            review_requested: matches!(
                self.action_name.as_str(),
                "review_requested" | "approval_required"
            ),
        };

        let namespace = project.namespace;
        let owner = namespace
            .as_ref()
            .and_then(|n| n.full_path.clone().or_else(|| n.path.clone()))
            .unwrap_or_default();
        let owner_avatar = project
            .avatar_url
            .or_else(|| namespace.and_then(|n| n.avatar_url))
            .unwrap_or_default();
        let repo = project.path.unwrap_or(project.name);
        let repo_id = id_from_value(&project.id).unwrap_or_else(|| format!("{}/{}", owner, repo));

        let mut record = NotificationRecord::new(
            format!("gitlab:{}", todo_id),
            Provider::Gitlab,
            kind,
            title,
            time,
        )
        .with_description(description)
        .with_repo(owner, repo, repo_id)
        .with_facts(facts);

        record.unread = self.state.as_deref() != Some("done");
        record.author = self.author.map(User::from);
        record.creator = target.author.map(User::from);
        record.state = state;
        record.icon = derive_icon(kind, state, None);
        record.owner_avatar = owner_avatar;
        record.number = target.iid;
        record.url = self.target_url.or(target.web_url);
        record.labels = target.labels.into_iter().map(Label::new).collect();

        Ok(record)
    }
}
