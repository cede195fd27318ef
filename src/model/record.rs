//! Canonical notification record shared by every engine stage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Source-control platform a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Gitlab,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Gitlab => "gitlab",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(Provider::Github),
            "gitlab" => Ok(Provider::Gitlab),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Notification kind; drives the icon and the type filter bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Pr,
    Issue,
    Commit,
    Workflow,
    Discussion,
    Release,
}

impl NotificationType {
    pub const ALL: [NotificationType; 6] = [
        NotificationType::Pr,
        NotificationType::Issue,
        NotificationType::Commit,
        NotificationType::Workflow,
        NotificationType::Discussion,
        NotificationType::Release,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Pr => "pr",
            NotificationType::Issue => "issue",
            NotificationType::Commit => "commit",
            NotificationType::Workflow => "workflow",
            NotificationType::Discussion => "discussion",
            NotificationType::Release => "release",
        }
    }

    /// Display name used by the type filter list
    pub fn display_name(&self) -> &'static str {
        match self {
            NotificationType::Pr => "Pull requests",
            NotificationType::Issue => "Issues",
            NotificationType::Commit => "Commits",
            NotificationType::Workflow => "Workflow",
            NotificationType::Discussion => "Discussions",
            NotificationType::Release => "Releases",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown notification type: {}", s))
    }
}

/// Display hint derived from type and subject state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationIcon {
    Commit,
    OpenIssue,
    CompletedIssue,
    ClosedIssue,
    DraftPr,
    OpenPr,
    MergedPr,
    ClosedPr,
    Release,
    Discussion,
    WorkflowFail,
    WorkflowSuccess,
    Unsupported,
}

/// State of the subject behind a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectState {
    Open,
    Draft,
    Merged,
    Closed,
    Completed,
    Success,
    Failure,
}

/// Coarse open/closed status used by `showOnlyOpen` and the `state` criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenStatus {
    Open,
    Closed,
}

impl SubjectState {
    /// Workflow outcomes have no open/closed status.
    pub fn status(&self) -> Option<OpenStatus> {
        match self {
            SubjectState::Open | SubjectState::Draft => Some(OpenStatus::Open),
            SubjectState::Merged | SubjectState::Closed | SubjectState::Completed => {
                Some(OpenStatus::Closed)
            }
            SubjectState::Success | SubjectState::Failure => None,
        }
    }
}

impl FromStr for OpenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OpenStatus::Open),
            "closed" => Ok(OpenStatus::Closed),
            other => Err(format!("unknown state: {}", other)),
        }
    }
}

impl std::fmt::Display for OpenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenStatus::Open => write!(f, "open"),
            OpenStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Identity reference (author, creator, watched person)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            name: None,
            login: login.into(),
            avatar: None,
            bot: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }
}

/// Score assigned by the first matching priority rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub label: String,
    pub value: i32,
}

/// Prior content of a record whose description or author just changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Previously {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub description: String,
}

/// Boolean facts read by the priority criteria that are not plain record fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriorityFacts {
    pub many_comments: bool,
    pub many_reactions: bool,
    pub assigned: bool,
    pub mentioned: bool,
    pub review_requested: bool,
}

/// Canonical notification record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub provider: Provider,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub unread: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub opened: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<User>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub time: DateTime<Utc>,
    pub icon: NotificationIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SubjectState>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub repo_id: String,
    #[serde(default)]
    pub owner_avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub facts: PriorityFacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previously: Option<Previously>,
    #[serde(default)]
    pub stale: bool,
}

impl NotificationRecord {
    /// Fresh record with default user state (unread, nothing else set)
    pub fn new(
        id: impl Into<String>,
        provider: Provider,
        kind: NotificationType,
        title: impl Into<String>,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            kind,
            unread: true,
            pinned: false,
            done: false,
            muted: false,
            opened: false,
            author: None,
            creator: None,
            title: title.into(),
            description: String::new(),
            time,
            icon: NotificationIcon::Unsupported,
            state: None,
            owner: String::new(),
            repo: String::new(),
            repo_id: String::new(),
            owner_avatar: String::new(),
            number: None,
            url: None,
            labels: Vec::new(),
            facts: PriorityFacts::default(),
            priority: None,
            previously: None,
            stale: false,
        }
    }

    pub fn with_author(mut self, author: User) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_state(mut self, state: SubjectState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Label::new).collect();
        self
    }

    pub fn with_repo(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        repo_id: impl Into<String>,
    ) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self.repo_id = repo_id.into();
        self
    }

    pub fn with_facts(mut self, facts: PriorityFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn author_login(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.login.as_str())
    }

    pub fn status(&self) -> Option<OpenStatus> {
        self.state.and_then(|s| s.status())
    }

    /// Closed, merged, completed or marked done
    pub fn is_terminal(&self) -> bool {
        self.done || self.status() == Some(OpenStatus::Closed)
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NotificationRecord {
        NotificationRecord::new(
            "github:1",
            Provider::Github,
            NotificationType::Pr,
            "Fix the parser",
            "2026-03-01T10:00:00Z".parse().unwrap(),
        )
    }

    #[test]
    fn test_new_record_defaults() {
        let record = sample();
        assert!(record.unread);
        assert!(!record.pinned && !record.done && !record.muted && !record.opened);
        assert!(record.priority.is_none());
        assert!(record.previously.is_none());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = sample().with_repo("acme", "widgets", "42");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "pr");
        assert_eq!(json["repoId"], "42");
        assert_eq!(json["icon"], "unsupported");
        assert!(json.get("priority").is_none());
    }

    #[test]
    fn test_record_backward_compat_missing_optional_fields() {
        let json = r#"{"id":"gitlab:7","provider":"gitlab","type":"issue","unread":true,
            "title":"t","time":"2026-03-01T10:00:00Z","icon":"open-issue"}"#;
        let record: NotificationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, NotificationType::Issue);
        assert!(!record.pinned);
        assert!(record.labels.is_empty());
        assert!(!record.stale);
    }

    #[test]
    fn test_terminal_states() {
        assert!(sample().with_state(SubjectState::Merged).is_terminal());
        assert!(!sample().with_state(SubjectState::Draft).is_terminal());
        let mut done = sample();
        done.done = true;
        assert!(done.is_terminal());
        // workflow outcomes carry no open/closed status
        assert!(!sample().with_state(SubjectState::Failure).is_terminal());
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("workflow".parse::<NotificationType>(), Ok(NotificationType::Workflow));
        assert!("pull".parse::<NotificationType>().is_err());
    }
}
