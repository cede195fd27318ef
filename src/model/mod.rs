//! Data model: notification records, filters, watched entities and priority rules

pub mod priority;
pub mod record;
pub mod watched;

pub use priority::{Criteria, PriorityRule, RawPriorityRule};
pub use record::{
    Label, NotificationIcon, NotificationRecord, NotificationType, OpenStatus, Previously,
    Priority, PriorityFacts, Provider, SubjectState, User,
};
pub use watched::{TypeFilter, WatchedPerson, WatchedRepo};
