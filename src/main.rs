//! gitfeed CLI
//!
//! Drives the notification engine from payload files and a local data directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use gitfeed::cli::{
    handle_counts, handle_filter, handle_list, handle_mark, handle_rule_add, handle_rule_remove, handle_rules,
    handle_set, handle_settings, handle_sync, handle_unwatch, handle_watch_person, handle_watch_repo,
    CountsArgs, FilterArgs, ListArgs, MarkArgs, RuleAddArgs, RuleRemoveArgs, SetArgs, SettingsArgs, SyncArgs,
    UnwatchArgs, WatchPersonArgs, WatchRepoArgs,
};
use gitfeed::StateStore;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "gitfeed")]
#[command(about = "Unified GitHub and GitLab notification feed")]
#[command(version)]
struct Cli {
    /// Data directory (default: ~/.config/gitfeed)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync cycle over provider payload files
    Sync(SyncArgs),
    /// List notifications (filtered by default)
    List(ListArgs),
    /// Pin, mark done, mute, mark read or open a notification
    Mark(MarkArgs),
    /// Show settings
    Settings(SettingsArgs),
    /// Change one setting
    Set(SetArgs),
    /// Show or hide a notification type
    Filter(FilterArgs),
    /// Watch or mute a repository
    WatchRepo(WatchRepoArgs),
    /// Watch or mute a person
    WatchPerson(WatchPersonArgs),
    /// Stop watching a repository or person
    Unwatch(UnwatchArgs),
    /// List priority rules in evaluation order
    Rules,
    /// Append a priority rule
    RuleAdd(RuleAddArgs),
    /// Remove a priority rule by index
    RuleRemove(RuleRemoveArgs),
    /// Show unread counters
    Counts(CountsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitfeed=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let store = StateStore::new(cli.data_dir.unwrap_or_else(StateStore::default_dir));
    debug!(dir = %store.dir().display(), "Using data directory");

    match cli.command {
        Commands::Sync(args) => handle_sync(&store, args).await,
        Commands::List(args) => handle_list(&store, args).await,
        Commands::Mark(args) => handle_mark(&store, args).await,
        Commands::Settings(args) => handle_settings(&store, args).await,
        Commands::Set(args) => handle_set(&store, args).await,
        Commands::Filter(args) => handle_filter(&store, args).await,
        Commands::WatchRepo(args) => handle_watch_repo(&store, args).await,
        Commands::WatchPerson(args) => handle_watch_person(&store, args).await,
        Commands::Unwatch(args) => handle_unwatch(&store, args).await,
        Commands::Rules => handle_rules(&store).await,
        Commands::RuleAdd(args) => handle_rule_add(&store, args).await,
        Commands::RuleRemove(args) => handle_rule_remove(&store, args).await,
        Commands::Counts(args) => handle_counts(&store, args).await,
    }
}
