//! Output formatting for CLI commands

use serde::Serialize;

use crate::engine::FeedSnapshot;
use crate::model::NotificationRecord;

/// Pretty JSON for `--json` output
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Flag column: unread, pinned, done, muted, stale
fn flags(record: &NotificationRecord) -> String {
    [
        (record.unread, '*'),
        (record.pinned, 'P'),
        (record.done, 'D'),
        (record.muted, 'M'),
        (record.stale, 'S'),
    ]
    .iter()
    .map(|&(set, c)| if set { c } else { '.' })
    .collect()
}

/// One line per record, newest or highest priority first as given
pub fn format_records(records: &[NotificationRecord], show_priority: bool, show_repo: bool) -> String {
    if records.is_empty() {
        return "No notifications".to_string();
    }

    let mut lines = Vec::with_capacity(records.len());
    for record in records {
        let mut line = format!(
            "{} {:<16} {:<10} {}",
            flags(record),
            record.id,
            record.kind.as_str(),
            record.time.format("%Y-%m-%d %H:%M"),
        );
        if show_priority {
            match &record.priority {
                Some(p) => line.push_str(&format!(" [{:>3}]", p.value)),
                None => line.push_str("      "),
            }
        }
        if show_repo && !record.repo.is_empty() {
            line.push_str(&format!(" {}/{}", record.owner, record.repo));
        }
        line.push_str(&format!("  {}", record.title));
        if let Some(previously) = &record.previously {
            line.push_str(&format!("\n    was: {}", previously.description));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Counters for type filters and watched entities
pub fn format_counts(snapshot: &FeedSnapshot) -> String {
    let mut lines = vec![format!("Unread: {}", snapshot.unread_count)];

    lines.push("Types:".to_string());
    for filter in &snapshot.type_filters {
        let mark = if filter.active { "on " } else { "off" };
        lines.push(format!("  {} {:<14} {}", mark, filter.name, filter.number));
    }

    if !snapshot.watched_repos.is_empty() {
        lines.push("Repos:".to_string());
        for repo in &snapshot.watched_repos {
            let mark = if repo.muted { "mute" } else if repo.active { "on  " } else { "off " };
            lines.push(format!("  {} {}/{} ({}) {}", mark, repo.owner_name, repo.name, repo.id, repo.number));
        }
    }
    if !snapshot.watched_persons.is_empty() {
        lines.push("Persons:".to_string());
        for person in &snapshot.watched_persons {
            let mark = if person.muted { "mute" } else if person.active { "on  " } else { "off " };
            lines.push(format!("  {} {} {}", mark, person.login, person.number));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationType, Priority, Provider, TypeFilter};

    fn record() -> NotificationRecord {
        let mut record = NotificationRecord::new(
            "github:1",
            Provider::Github,
            NotificationType::Pr,
            "Add cache",
            "2026-03-01T10:00:00Z".parse().unwrap(),
        )
        .with_repo("acme", "widgets", "1");
        record.pinned = true;
        record.priority = Some(Priority { label: "Assigned".to_string(), value: 7 });
        record
    }

    #[test]
    fn test_format_records_line() {
        let text = format_records(&[record()], true, true);
        assert!(text.starts_with("*P..."));
        assert!(text.contains("github:1"));
        assert!(text.contains("[  7]"));
        assert!(text.contains("acme/widgets"));
        assert!(text.ends_with("Add cache"));
    }

    #[test]
    fn test_format_records_empty() {
        assert_eq!(format_records(&[], true, true), "No notifications");
    }

    #[test]
    fn test_format_counts() {
        let snapshot = FeedSnapshot {
            unread_count: 3,
            type_filters: TypeFilter::defaults(),
            ..Default::default()
        };
        let text = format_counts(&snapshot);
        assert!(text.starts_with("Unread: 3"));
        assert!(text.contains("Pull requests"));
        assert!(!text.contains("Repos:"));
    }
}
