//! Config store: user settings plus filter and priority configuration
//!
//! Everything here is plain serde data. Persistence lives in [`crate::store`].

use serde::{Deserialize, Serialize};

use crate::model::{RawPriorityRule, TypeFilter, WatchedPerson, WatchedRepo};

/// Upper bound for `notificationNumber`
pub const MAX_NOTIFICATION_NUMBER: u32 = 100;

/// Which provider collections feed the global feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderView {
    Github,
    Gitlab,
    #[default]
    Both,
}

impl ProviderView {
    pub fn includes(&self, provider: crate::model::Provider) -> bool {
        use crate::model::Provider;
        match (self, provider) {
            (ProviderView::Both, _) => true,
            (ProviderView::Github, Provider::Github) => true,
            (ProviderView::Gitlab, Provider::Gitlab) => true,
            _ => false,
        }
    }
}

/// UI layout, passed through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    List,
    #[default]
    Kanban,
    #[serde(rename = "Kanban (vertical)")]
    KanbanVertical,
}

/// Personal access token for one GitHub owner; opaque to the engine
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pat {
    pub owner: String,
    pub token: String,
}

impl std::fmt::Debug for Pat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pat")
            .field("owner", &self.owner)
            .field("token", &"***")
            .finish()
    }
}

/// GitLab project scoping the todo fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitlabRepo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub activate_notifications: bool,
    pub show_notifications_sync_timer: bool,
    pub read_when_open_in_browser: bool,
    pub read_when_pin: bool,
    pub show_notifications_repo: bool,
    pub notification_number: u32,
    pub sidebar_hidden: bool,
    pub show_only_open: bool,
    pub pats: Vec<Pat>,
    pub priority_sorting: bool,
    pub show_priority: bool,
    pub provider_view: ProviderView,
    pub apply_filters_for_done: bool,
    pub view_mode: ViewMode,
    pub active_tray: bool,
    pub gitlab_repos: Vec<GitlabRepo>,
    pub gitlab_only_involved: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            activate_notifications: true,
            show_notifications_sync_timer: true,
            read_when_open_in_browser: true,
            read_when_pin: false,
            show_notifications_repo: true,
            notification_number: 50,
            sidebar_hidden: false,
            show_only_open: false,
            pats: Vec::new(),
            priority_sorting: true,
            show_priority: true,
            provider_view: ProviderView::Both,
            apply_filters_for_done: false,
            view_mode: ViewMode::Kanban,
            active_tray: true,
            gitlab_repos: Vec::new(),
            gitlab_only_involved: true,
        }
    }
}

impl Settings {
    /// Per-provider record bound, clamped to `1..=MAX_NOTIFICATION_NUMBER`
    pub fn notification_limit(&self) -> usize {
        self.notification_number.clamp(1, MAX_NOTIFICATION_NUMBER) as usize
    }

    /// Apply a single `camelCase` key from a JSON value, validating the result
    pub fn set_key(&mut self, key: &str, value: serde_json::Value) -> anyhow::Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        let map = json
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("settings are not a JSON object"))?;
        if !map.contains_key(key) {
            anyhow::bail!("unknown setting: {}", key);
        }
        map.insert(key.to_string(), value);
        let mut updated: Settings = serde_json::from_value(json)?;
        updated.notification_number = updated.notification_limit() as u32;
        *self = updated;
        Ok(())
    }
}

/// Everything the user configures, persisted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigStore {
    pub settings: Settings,
    pub priorities: Vec<RawPriorityRule>,
    pub type_filters: Vec<TypeFilter>,
    pub watched_repos: Vec<WatchedRepo>,
    pub watched_persons: Vec<WatchedPerson>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            priorities: Vec::new(),
            type_filters: TypeFilter::defaults(),
            watched_repos: Vec::new(),
            watched_persons: Vec::new(),
        }
    }
}

impl ConfigStore {
    /// Add any type filter missing from an older config file
    pub fn normalized(mut self) -> Self {
        for default in TypeFilter::defaults() {
            if !self.type_filters.iter().any(|f| f.kind == default.kind) {
                self.type_filters.push(default);
            }
        }
        self.settings.notification_number = self.settings.notification_limit() as u32;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationType, Provider};

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.notification_number, 50);
        assert!(settings.priority_sorting);
        assert!(!settings.apply_filters_for_done);
        assert_eq!(settings.provider_view, ProviderView::Both);
    }

    #[test]
    fn test_settings_camel_case_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{"readWhenPin":true,"providerView":"gitlab","viewMode":"Kanban (vertical)"}"#,
        )
        .unwrap();
        assert!(settings.read_when_pin);
        assert_eq!(settings.provider_view, ProviderView::Gitlab);
        assert_eq!(settings.view_mode, ViewMode::KanbanVertical);
    }

    #[test]
    fn test_notification_limit_clamped() {
        let mut settings = Settings::default();
        settings.notification_number = 0;
        assert_eq!(settings.notification_limit(), 1);
        settings.notification_number = 10_000;
        assert_eq!(settings.notification_limit(), MAX_NOTIFICATION_NUMBER as usize);
    }

    #[test]
    fn test_set_key() {
        let mut settings = Settings::default();
        settings.set_key("showOnlyOpen", serde_json::json!(true)).unwrap();
        assert!(settings.show_only_open);

        settings.set_key("notificationNumber", serde_json::json!(500)).unwrap();
        assert_eq!(settings.notification_number, MAX_NOTIFICATION_NUMBER);

        assert!(settings.set_key("noSuchKey", serde_json::json!(1)).is_err());
        // a wrongly typed value leaves settings untouched
        assert!(settings.set_key("showOnlyOpen", serde_json::json!("yes")).is_err());
        assert!(settings.show_only_open);
    }

    #[test]
    fn test_provider_view_includes() {
        assert!(ProviderView::Both.includes(Provider::Gitlab));
        assert!(ProviderView::Github.includes(Provider::Github));
        assert!(!ProviderView::Github.includes(Provider::Gitlab));
    }

    #[test]
    fn test_pat_debug_redacts_token() {
        let pat = Pat { owner: "acme".to_string(), token: "ghp_secret".to_string() };
        let debug = format!("{:?}", pat);
        assert!(debug.contains("acme"));
        assert!(!debug.contains("ghp_secret"));
    }

    #[test]
    fn test_config_normalized_restores_type_filters() {
        let config: ConfigStore =
            serde_json::from_str(r#"{"typeFilters":[{"name":"Issues","type":"issue","active":false}]}"#)
                .unwrap();
        let config = config.normalized();
        assert_eq!(config.type_filters.len(), 6);
        let issue = config.type_filters.iter().find(|f| f.kind == NotificationType::Issue).unwrap();
        assert!(!issue.active);
    }
}
