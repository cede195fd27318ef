//! `gitfeed mark` - user actions on one record

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::output::format_records;
use crate::engine::UserAction;
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarkAction {
    Pin,
    Unpin,
    Done,
    Undone,
    Mute,
    Unmute,
    Read,
    Unread,
    Open,
}

impl From<MarkAction> for UserAction {
    fn from(action: MarkAction) -> Self {
        match action {
            MarkAction::Pin => UserAction::Pin,
            MarkAction::Unpin => UserAction::Unpin,
            MarkAction::Done => UserAction::MarkDone,
            MarkAction::Undone => UserAction::MarkUndone,
            MarkAction::Mute => UserAction::Mute,
            MarkAction::Unmute => UserAction::Unmute,
            MarkAction::Read => UserAction::MarkRead,
            MarkAction::Unread => UserAction::MarkUnread,
            MarkAction::Open => UserAction::Open,
        }
    }
}

#[derive(Args, Debug)]
pub struct MarkArgs {
    pub action: MarkAction,
    /// Record id, e.g. github:123
    pub id: String,
}

pub async fn handle_mark(store: &StateStore, args: MarkArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    let record = engine.apply_action(&args.id, args.action.into()).await?;
    engine.persist().await?;

    println!("{}", format_records(std::slice::from_ref(&record), false, true));
    if args.action == MarkAction::Open {
        if let Some(url) = &record.url {
            println!("{}", url);
        }
    }
    Ok(())
}
