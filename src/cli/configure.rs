//! Configuration commands: settings, type filters, watch lists, priority rules

use anyhow::{bail, Result};
use clap::{ArgGroup, Args};

use super::output::format_json;
use crate::model::{NotificationType, PriorityRule, RawPriorityRule, WatchedPerson, WatchedRepo};
use crate::store::StateStore;

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_settings(store: &StateStore, args: SettingsArgs) -> Result<()> {
    let config = store.load_config()?;
    let json = format_json(&config.settings);
    if args.json {
        println!("{}", json);
        return Ok(());
    }

    // flat `key = value` listing
    let value: serde_json::Value = serde_json::to_value(&config.settings)?;
    if let Some(map) = value.as_object() {
        for (key, value) in map {
            if key == "pats" {
                let owners: Vec<&str> = config.settings.pats.iter().map(|p| p.owner.as_str()).collect();
                println!("{} = {:?}", key, owners);
            } else {
                println!("{} = {}", key, value);
            }
        }
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Setting key (camelCase), e.g. notificationNumber
    pub key: String,
    /// JSON value; bare words are taken as strings
    pub value: String,
}

/// Parse a CLI value as JSON, falling back to a string
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

pub async fn handle_set(store: &StateStore, args: SetArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    let (config, _) = engine.export().await;

    let mut settings = config.settings;
    settings.set_key(&args.key, parse_value(&args.value))?;
    engine.update_settings(|s| *s = settings).await;
    engine.persist().await?;

    println!("Set {}", args.key);
    Ok(())
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("toggle").required(true).args(["on", "off"])))]
pub struct FilterArgs {
    /// pr, issue, commit, workflow, discussion or release
    pub kind: NotificationType,
    #[arg(long)]
    pub on: bool,
    #[arg(long)]
    pub off: bool,
}

pub async fn handle_filter(store: &StateStore, args: FilterArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    engine.set_type_filter(args.kind, args.on).await;
    engine.persist().await?;

    println!("{} {}", args.kind.display_name(), if args.on { "shown" } else { "hidden" });
    Ok(())
}

#[derive(Args, Debug)]
pub struct WatchRepoArgs {
    /// Repository id as reported by the provider
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub owner: String,
    /// Hide the repository instead of following it
    #[arg(long)]
    pub muted: bool,
}

pub async fn handle_watch_repo(store: &StateStore, args: WatchRepoArgs) -> Result<()> {
    let mut repo = WatchedRepo::new(&args.id, &args.name, &args.owner);
    if args.muted {
        repo.active = false;
        repo.muted = true;
    }

    let engine = super::LockedEngine::open(store)?;
    engine.watch_repo(repo).await;
    engine.persist().await?;

    println!("{} {}/{}", if args.muted { "Muted" } else { "Watching" }, args.owner, args.name);
    Ok(())
}

#[derive(Args, Debug)]
pub struct WatchPersonArgs {
    pub login: String,
    /// Hide the person instead of following them
    #[arg(long)]
    pub muted: bool,
}

pub async fn handle_watch_person(store: &StateStore, args: WatchPersonArgs) -> Result<()> {
    let mut person = WatchedPerson::new(&args.login);
    if args.muted {
        person.active = false;
        person.muted = true;
    }

    let engine = super::LockedEngine::open(store)?;
    engine.watch_person(person).await;
    engine.persist().await?;

    println!("{} {}", if args.muted { "Muted" } else { "Watching" }, args.login);
    Ok(())
}

#[derive(Args, Debug)]
pub struct UnwatchArgs {
    /// Repository id or person login
    pub key: String,
}

pub async fn handle_unwatch(store: &StateStore, args: UnwatchArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    let removed = engine.unwatch_repo(&args.key).await || engine.unwatch_person(&args.key).await;
    if !removed {
        bail!("Not watched: {}", args.key);
    }
    engine.persist().await?;

    println!("Unwatched {}", args.key);
    Ok(())
}

pub async fn handle_rules(store: &StateStore) -> Result<()> {
    let config = store.load_config()?;
    if config.priorities.is_empty() {
        println!("No priority rules");
        return Ok(());
    }
    for (index, raw) in config.priorities.iter().enumerate() {
        match PriorityRule::try_from(raw) {
            Ok(rule) => println!("{:>2}. [{:>3}] {}", index, rule.value, rule.description()),
            Err(e) => println!("{:>2}. [{:>3}] invalid: {}", index, raw.value, e),
        }
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct RuleAddArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub value: i32,
    /// many-comments, many-reactions, assigned, mentioned, review-request, label, state or type
    #[arg(long)]
    pub criteria: String,
    /// Label name, open|closed, or notification type
    #[arg(long)]
    pub specifier: Option<String>,
}

pub async fn handle_rule_add(store: &StateStore, args: RuleAddArgs) -> Result<()> {
    let raw = RawPriorityRule::new(args.value, args.criteria, args.specifier.as_deref());
    // reject misconfigured rules up front rather than storing them
    let rule = PriorityRule::try_from(&raw)?;

    let engine = super::LockedEngine::open(store)?;
    let (config, _) = engine.export().await;
    let mut rules = config.priorities;
    rules.push(raw);
    engine.set_rules(rules).await;
    engine.persist().await?;

    println!("Added rule: {} ({})", rule.description(), rule.value);
    Ok(())
}

#[derive(Args, Debug)]
pub struct RuleRemoveArgs {
    pub index: usize,
}

pub async fn handle_rule_remove(store: &StateStore, args: RuleRemoveArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    let (config, _) = engine.export().await;
    let mut rules = config.priorities;
    if args.index >= rules.len() {
        bail!("No rule at index {} ({} rules)", args.index, rules.len());
    }
    let removed = rules.remove(args.index);
    engine.set_rules(rules).await;
    engine.persist().await?;

    println!("Removed rule {}: {} {}", args.index, removed.value, removed.criteria);
    Ok(())
}
