//! User-curated filter entities and their maintained counters

use serde::{Deserialize, Serialize};

use super::record::NotificationType;

/// One entry per notification type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub active: bool,
    #[serde(default)]
    pub number: usize,
}

impl TypeFilter {
    pub fn new(kind: NotificationType) -> Self {
        Self {
            name: kind.display_name().to_string(),
            kind,
            active: true,
            number: 0,
        }
    }

    /// All six types, all active
    pub fn defaults() -> Vec<TypeFilter> {
        NotificationType::ALL.iter().map(|t| TypeFilter::new(*t)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedRepo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub owner_avatar: String,
    #[serde(default)]
    pub number: usize,
    pub active: bool,
    #[serde(default)]
    pub muted: bool,
}

impl WatchedRepo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_name: owner_name.into(),
            owner_avatar: String::new(),
            number: 0,
            active: true,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedPerson {
    pub login: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub number: usize,
    pub active: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub bot: bool,
}

impl WatchedPerson {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            avatar: String::new(),
            number: 0,
            active: true,
            muted: false,
            bot: false,
        }
    }
}
