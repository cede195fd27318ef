//! gitfeed - unified GitHub/GitLab notification feed engine
//!
//! Raw provider payloads are normalized, compared against the previous sync,
//! scored by priority rules, merged into a canonical collection and filtered
//! into the displayed list. See [`engine::NotificationEngine`].

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use config::{ConfigStore, ProviderView, Settings, ViewMode};
pub use engine::{
    CanonicalState, CycleReport, FeedSnapshot, FilterConfig, MergeStats, NotificationEngine, ProviderBatch,
    UserAction,
};
pub use error::{EngineError, MergeError, NormalizeError, RuleError};
pub use model::{
    Criteria, NotificationIcon, NotificationRecord, NotificationType, PriorityRule, Provider, RawPriorityRule,
    SubjectState, TypeFilter, User, WatchedPerson, WatchedRepo,
};
pub use provider::{normalize_batch, FetchRequest, NormalizedBatch};
pub use store::StateStore;
