//! Engine error taxonomy
//!
//! - `NormalizeError`: one malformed payload item; the item is dropped.
//! - `RuleError`: a priority rule that cannot be compiled; the rule is skipped.
//! - `MergeError`: a merge invariant violation; the current cycle is aborted.
//! - `EngineError`: what engine operations return to callers.

use thiserror::Error;

use crate::model::{NotificationType, Provider};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("payload item is not a valid {provider} notification: {message}")]
    Malformed { provider: Provider, message: String },

    #[error("{provider} notification is missing required field `{field}`")]
    MissingField { provider: Provider, field: &'static str },

    #[error("unsupported {provider} notification type: {kind}")]
    UnsupportedType { provider: Provider, kind: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("unknown priority criteria: {0}")]
    UnknownCriteria(String),

    #[error("priority criteria `{0}` requires a specifier")]
    MissingSpecifier(String),

    #[error("invalid specifier `{specifier}` for priority criteria `{criteria}`")]
    InvalidSpecifier { criteria: String, specifier: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("merge key collision on `{id}`: {first_provider}/{first_kind} vs {second_provider}/{second_kind}")]
    KeyCollision {
        id: String,
        first_provider: Provider,
        first_kind: NotificationType,
        second_provider: Provider,
        second_kind: NotificationType,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a sync cycle is already in progress")]
    CycleInProgress,

    #[error("sync cycle aborted: {0}")]
    Merge(#[from] MergeError),

    #[error("notification not found: {0}")]
    NotFound(String),
}
