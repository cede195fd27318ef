//! `gitfeed list` and `gitfeed counts`

use anyhow::Result;
use clap::Args;

use super::output::{format_counts, format_json, format_records};
use crate::model::Provider;
use crate::store::StateStore;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show the global feed instead of the filtered one
    #[arg(long, conflicts_with = "provider")]
    pub all: bool,
    /// Show one provider's collection
    #[arg(long)]
    pub provider: Option<Provider>,
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_list(store: &StateStore, args: ListArgs) -> Result<()> {
    let engine = super::open_engine(store)?;
    let snapshot = engine.snapshot();
    let records = match args.provider {
        Some(Provider::Github) => &snapshot.github_notifications,
        Some(Provider::Gitlab) => &snapshot.gitlab_notifications,
        None if args.all => &snapshot.global_notifications,
        None => &snapshot.filtered_notifications,
    };

    if args.json {
        println!("{}", format_json(records));
    } else {
        let (config, _) = engine.export().await;
        println!(
            "{}",
            format_records(records, config.settings.show_priority, config.settings.show_notifications_repo)
        );
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct CountsArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_counts(store: &StateStore, args: CountsArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    let snapshot = engine.snapshot();
    // counters are derived, persist them so config.json matches
    engine.persist().await?;

    if args.json {
        println!(
            "{}",
            format_json(&serde_json::json!({
                "unreadCount": snapshot.unread_count,
                "typeFilters": snapshot.type_filters,
                "watchedRepos": snapshot.watched_repos,
                "watchedPersons": snapshot.watched_persons,
            }))
        );
    } else {
        println!("{}", format_counts(&snapshot));
    }
    Ok(())
}
