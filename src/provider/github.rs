//! GitHub notification threads
//!
//! The networking collaborator fetches `/notifications` threads and may attach
//! a `details` object with fields of the subject (pull request, issue, check
//! suite, ...). Without `details` only thread-level data is available.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::{id_from_value, Normalize, MANY_COMMENTS_THRESHOLD, MANY_REACTIONS_THRESHOLD};
use crate::engine::detector::derive_icon;
use crate::error::NormalizeError;
use crate::model::{
    Label, NotificationRecord, NotificationType, PriorityFacts, Provider, SubjectState, User,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RawGithubNotification {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default = "default_unread")]
    pub unread: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub subject: RawGithubSubject,
    pub repository: RawGithubRepository,
    #[serde(default)]
    pub details: Option<RawGithubDetails>,
}

fn default_unread() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGithubSubject {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGithubRepository {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub name: String,
    pub owner: RawGithubUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGithubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<RawGithubUser> for User {
    fn from(raw: RawGithubUser) -> Self {
        let bot = raw.kind.as_deref() == Some("Bot") || raw.login.ends_with("[bot]");
        User {
            name: raw.name,
            login: raw.login,
            avatar: raw.avatar_url,
            bot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGithubLabel {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGithubComment {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: Option<RawGithubUser>,
}

/// Subject fields attached by the fetcher
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGithubDetails {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_reason: Option<String>,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub draft: bool,
    /// Check suite / workflow run conclusion
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub comments: u32,
    #[serde(default)]
    pub reactions: u32,
    #[serde(default)]
    pub user: Option<RawGithubUser>,
    #[serde(default)]
    pub labels: Vec<RawGithubLabel>,
    #[serde(default)]
    pub latest_comment: Option<RawGithubComment>,
}

fn subject_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(?:pulls|issues|discussions)/(\d+)$").expect("valid subject url regex")
    })
}

fn notification_type(kind: &str) -> Option<NotificationType> {
    match kind {
        "PullRequest" => Some(NotificationType::Pr),
        "Issue" => Some(NotificationType::Issue),
        "Commit" => Some(NotificationType::Commit),
        "CheckSuite" | "WorkflowRun" => Some(NotificationType::Workflow),
        "Discussion" => Some(NotificationType::Discussion),
        "Release" => Some(NotificationType::Release),
        _ => None,
    }
}

fn subject_state(kind: NotificationType, title: &str, details: Option<&RawGithubDetails>) -> Option<SubjectState> {
    match kind {
        NotificationType::Pr => {
            let d = details?;
            if d.merged {
                Some(SubjectState::Merged)
            } else {
                match d.state.as_deref() {
                    Some("open") if d.draft => Some(SubjectState::Draft),
                    Some("open") => Some(SubjectState::Open),
                    Some("closed") => Some(SubjectState::Closed),
                    _ => None,
                }
            }
        }
        NotificationType::Issue => {
            let d = details?;
            match (d.state.as_deref(), d.state_reason.as_deref()) {
                (Some("open"), _) => Some(SubjectState::Open),
                (Some("closed"), Some("completed")) => Some(SubjectState::Completed),
                (Some("closed"), _) => Some(SubjectState::Closed),
                _ => None,
            }
        }
        NotificationType::Workflow => {
            let conclusion = details.and_then(|d| d.conclusion.as_deref());
            match conclusion {
                Some("success") => Some(SubjectState::Success),
                Some("failure") | Some("timed_out") | Some("startup_failure") => {
                    Some(SubjectState::Failure)
                }
                Some(_) => None,
                None => {
                    let title = title.to_lowercase();
                    if title.contains("failed") {
                        Some(SubjectState::Failure)
                    } else if title.contains("succeeded") {
                        Some(SubjectState::Success)
                    } else {
                        None
                    }
                }
            }
        }
        _ => None,
    }
}

fn reason_description(reason: &str) -> &'static str {
    match reason {
        "assign" => "You were assigned",
        "author" => "Activity on a thread you created",
        "comment" => "New comment",
        "ci_activity" => "Workflow run completed",
        "manual" => "You subscribed to this thread",
        "mention" => "You were mentioned",
        "team_mention" => "Your team was mentioned",
        "review_requested" => "Your review was requested",
        "security_alert" => "Security alert",
        "state_change" => "State changed",
        _ => "New activity",
    }
}

impl Normalize for RawGithubNotification {
    const PROVIDER: Provider = Provider::Github;

    fn normalize(self) -> Result<NotificationRecord, NormalizeError> {
        let thread_id = id_from_value(&self.id).ok_or(NormalizeError::MissingField {
            provider: Provider::Github,
            field: "id",
        })?;
        let time = self.updated_at.ok_or(NormalizeError::MissingField {
            provider: Provider::Github,
            field: "updated_at",
        })?;
        let kind = notification_type(&self.subject.kind).ok_or_else(|| NormalizeError::UnsupportedType {
            provider: Provider::Github,
            kind: self.subject.kind.clone(),
        })?;

        let details = self.details.unwrap_or_default();
        let state = subject_state(kind, &self.subject.title, Some(&details));

        let number = details.number.or_else(|| {
            self.subject
                .url
                .as_deref()
                .and_then(|url| subject_number_regex().captures(url))
                .and_then(|caps| caps[1].parse().ok())
        });

        let creator: Option<User> = details.user.map(User::from);
        let (description, author) = match details.latest_comment {
            Some(comment) if !comment.body.trim().is_empty() => {
                let author = comment.user.map(User::from).or_else(|| creator.clone());
                (comment.body, author)
            }
            _ => (reason_description(&self.reason).to_string(), creator.clone()),
        };

        let facts = PriorityFacts {
            many_comments: details.comments >= MANY_COMMENTS_THRESHOLD,
            many_reactions: details.reactions >= MANY_REACTIONS_THRESHOLD,
            assigned: self.reason == "assign",
            mentioned: matches!(self.reason.as_str(), "mention" | "team_mention"),
            review_requested: self.reason == "review_requested",
        };

        let repo_id = id_from_value(&self.repository.id)
            .unwrap_or_else(|| format!("{}/{}", self.repository.owner.login, self.repository.name));

        let mut record = NotificationRecord::new(
            format!("github:{}", thread_id),
            Provider::Github,
            kind,
            self.subject.title,
            time,
        )
        .with_description(description)
        .with_repo(self.repository.owner.login, self.repository.name, repo_id)
        .with_facts(facts);

        record.unread = self.unread;
        record.author = author;
        record.creator = creator;
        record.state = state;
        record.icon = derive_icon(kind, state, None);
        record.owner_avatar = self.repository.owner.avatar_url.unwrap_or_default();
        record.number = number;
        record.url = details.html_url;
        record.labels = details
            .labels
            .into_iter()
            .map(|l| Label { name: l.name, color: l.color })
            .collect();

        Ok(record)
    }
}
