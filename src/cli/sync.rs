//! `gitfeed sync` - run one cycle over payload files

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::output::format_json;
use crate::engine::CycleReport;
use crate::store::StateStore;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// GitHub notifications payload (JSON array); omitted means unavailable
    #[arg(long)]
    pub github: Option<PathBuf>,
    /// GitLab todos payload (JSON array); omitted means unavailable
    #[arg(long)]
    pub gitlab: Option<PathBuf>,
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

/// Read a payload file as a list of raw items
pub async fn load_payload(path: Option<PathBuf>, flag: &str) -> Result<Vec<serde_json::Value>> {
    let path = path.ok_or_else(|| anyhow!("no --{} payload given", flag))?;
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<serde_json::Value> =
        serde_json::from_str(&content).with_context(|| format!("{} is not a JSON array", path.display()))?;
    Ok(items)
}

fn format_report(report: &CycleReport) -> String {
    let availability = |ok: bool| if ok { "fetched" } else { "unavailable" };
    let mut lines = vec![
        format!(
            "github: {}, gitlab: {}",
            availability(report.github_available),
            availability(report.gitlab_available)
        ),
        format!(
            "merged {}, dropped {}, evicted {}, stale {}, changed {}",
            report.stats.merged,
            report.dropped,
            report.stats.evicted.len(),
            report.stats.retained_stale.len(),
            report.stats.changed.len()
        ),
    ];
    for id in &report.stats.fresh {
        lines.push(format!("new: {}", id));
    }
    lines.join("\n")
}

pub async fn handle_sync(store: &StateStore, args: SyncArgs) -> Result<()> {
    let engine = super::LockedEngine::open(store)?;
    let request = engine.fetch_request().await;
    info!(per_page = request.per_page, "Starting sync cycle");

    let report = engine
        .sync(load_payload(args.github, "github"), load_payload(args.gitlab, "gitlab"))
        .await?;
    engine.persist().await?;

    let (config, _) = engine.export().await;
    let mut report = report;
    if !config.settings.activate_notifications {
        report.stats.fresh.clear();
    }

    if args.json {
        println!("{}", format_json(&report));
    } else {
        println!("{}", format_report(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_payload_missing_flag_is_unavailable() {
        assert!(load_payload(None, "github").await.is_err());
    }

    #[tokio::test]
    async fn test_load_payload_reads_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gh.json");
        std::fs::write(&path, r#"[{"id": "1"}, {"id": "2"}]"#).unwrap();
        assert_eq!(load_payload(Some(path), "github").await.unwrap().len(), 2);
    }

    #[test]
    fn test_format_report_lists_fresh() {
        let mut report = CycleReport {
            github_available: true,
            ..Default::default()
        };
        report.stats.fresh.push("github:1".to_string());
        let text = format_report(&report);
        assert!(text.contains("github: fetched, gitlab: unavailable"));
        assert!(text.ends_with("new: github:1"));
    }
}
