//! Sync cycle behaviour through the public engine API

use gitfeed::{
    CanonicalState, ConfigStore, EngineError, NotificationEngine, NotificationIcon, NotificationType,
    RawPriorityRule, StateStore, SubjectState, UserAction, WatchedRepo,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn github(id: u64, kind: &str, minutes: u32, comment: &str, commenter: &str) -> Value {
    json!({
        "id": id.to_string(),
        "unread": true,
        "reason": "subscribed",
        "updated_at": format!("2026-03-01T10:{:02}:00Z", minutes),
        "subject": {
            "title": format!("{} {}", kind, id),
            "type": kind,
            "url": format!("https://api.github.com/repos/acme/widgets/issues/{}", id)
        },
        "repository": {"id": 100, "name": "widgets", "owner": {"login": "acme"}},
        "details": {
            "state": "open",
            "labels": [],
            "latest_comment": {"body": comment, "user": {"login": commenter}}
        }
    })
}

fn gitlab(id: u64, minutes: u32, body: &str) -> Value {
    json!({
        "id": id,
        "action_name": "mentioned",
        "target_type": "Issue",
        "target": {"iid": id, "title": format!("Bug {}", id), "state": "opened"},
        "body": body,
        "state": "pending",
        "author": {"username": "gl-user"},
        "project": {"id": 200, "name": "Core", "path": "core", "namespace": {"full_path": "platform"}},
        "updated_at": format!("2026-03-01T09:{:02}:00Z", minutes)
    })
}

async fn ok(items: Vec<Value>) -> anyhow::Result<Vec<Value>> {
    Ok(items)
}

async fn unavailable() -> anyhow::Result<Vec<Value>> {
    Err(anyhow::anyhow!("HTTP 502"))
}

fn engine() -> NotificationEngine {
    NotificationEngine::new(ConfigStore::default(), CanonicalState::default())
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let engine = engine();
    let payload = || vec![github(1, "PullRequest", 5, "lgtm", "bob"), github(2, "Issue", 3, "+1", "carol")];
    let gl = || vec![gitlab(7, 30, "ping")];

    engine.sync(ok(payload()), ok(gl())).await.unwrap();
    let first = engine.snapshot();
    let report = engine.sync(ok(payload()), ok(gl())).await.unwrap();
    let second = engine.snapshot();

    assert_eq!(first.global_notifications, second.global_notifications);
    assert_eq!(first.filtered_notifications, second.filtered_notifications);
    assert!(report.stats.changed.is_empty());
    assert!(report.stats.fresh.is_empty());
}

#[tokio::test]
async fn test_state_survives_payloads_without_details() {
    let pr = |details: Value| {
        json!({
            "id": "5",
            "unread": true,
            "reason": "subscribed",
            "updated_at": "2026-03-01T10:00:00Z",
            "subject": {"title": "Add cache", "type": "PullRequest"},
            "repository": {"id": 100, "name": "widgets", "owner": {"login": "acme"}},
            "details": details
        })
    };
    let engine = engine();

    engine.sync(ok(vec![pr(json!({"state": "open"}))]), ok(vec![])).await.unwrap();
    engine.sync(ok(vec![pr(Value::Null)]), ok(vec![])).await.unwrap();
    let second = engine.snapshot().github_notifications[0].clone();
    engine.sync(ok(vec![pr(Value::Null)]), ok(vec![])).await.unwrap();
    let third = engine.snapshot().github_notifications[0].clone();

    assert_eq!(second.icon, NotificationIcon::OpenPr);
    assert_eq!(third.icon, NotificationIcon::OpenPr);
    assert_eq!(third.state, Some(SubjectState::Open));
    assert_eq!(second, third);
}

#[tokio::test]
async fn test_user_flags_survive_sync() {
    let engine = engine();
    let payload = || vec![github(1, "PullRequest", 5, "lgtm", "bob")];
    engine.sync(ok(payload()), unavailable()).await.unwrap();

    engine.apply_action("github:1", UserAction::MarkDone).await.unwrap();
    engine.apply_action("github:1", UserAction::Mute).await.unwrap();
    let opened = engine.apply_action("github:1", UserAction::Open).await.unwrap();
    assert!(!opened.unread, "default settings read on open");

    engine.sync(ok(payload()), unavailable()).await.unwrap();
    let snapshot = engine.snapshot();
    let record = &snapshot.github_notifications[0];
    assert!(record.done && record.muted && record.opened);
    assert!(!record.unread);
}

#[tokio::test]
async fn test_change_detection_across_three_syncs() {
    let engine = engine();

    engine.sync(ok(vec![github(1, "Issue", 0, "A", "alice")]), ok(vec![])).await.unwrap();
    assert!(engine.snapshot().github_notifications[0].previously.is_none());
    engine.apply_action("github:1", UserAction::MarkRead).await.unwrap();

    let report = engine.sync(ok(vec![github(1, "Issue", 1, "B", "alice")]), ok(vec![])).await.unwrap();
    let snapshot = engine.snapshot();
    let record = &snapshot.github_notifications[0];
    assert_eq!(record.previously.as_ref().unwrap().description, "A");
    assert!(record.unread, "changed content is unread again");
    assert_eq!(report.stats.changed, vec!["github:1".to_string()]);

    engine.sync(ok(vec![github(1, "Issue", 1, "B", "alice")]), ok(vec![])).await.unwrap();
    assert!(engine.snapshot().github_notifications[0].previously.is_none());

    // same text, different author is a change too
    engine.sync(ok(vec![github(1, "Issue", 2, "B", "mallory")]), ok(vec![])).await.unwrap();
    let snapshot = engine.snapshot();
    let previously = snapshot.github_notifications[0].previously.as_ref().unwrap();
    assert_eq!(previously.author.as_ref().unwrap().login, "alice");
}

#[tokio::test]
async fn test_priority_ordering_is_deterministic() {
    let mut config = ConfigStore::default();
    config.priorities = vec![
        RawPriorityRule::new(10, "type", Some("pr")),
        RawPriorityRule::new(5, "mentioned", None),
    ];
    let engine = NotificationEngine::new(config, CanonicalState::default());

    let gh = || vec![github(1, "Issue", 50, "x", "a"), github(2, "PullRequest", 1, "y", "b")];
    engine.sync(ok(gh()), ok(vec![gitlab(3, 0, "z")])).await.unwrap();

    let order = |engine: &NotificationEngine| {
        engine
            .snapshot()
            .global_notifications
            .iter()
            .map(|r| (r.id.clone(), r.priority.as_ref().map(|p| p.value)))
            .collect::<Vec<_>>()
    };
    let expected = vec![
        ("github:2".to_string(), Some(10)),
        ("gitlab:3".to_string(), Some(5)),
        ("github:1".to_string(), None),
    ];
    assert_eq!(order(&engine), expected);

    engine.sync(ok(gh()), ok(vec![gitlab(3, 0, "z")])).await.unwrap();
    assert_eq!(order(&engine), expected);
}

#[tokio::test]
async fn test_counts_match_unread_records() {
    let engine = engine();
    engine
        .sync(
            ok(vec![
                github(1, "PullRequest", 1, "a", "a"),
                github(2, "PullRequest", 2, "b", "b"),
                github(3, "Release", 3, "c", "c"),
            ]),
            ok(vec![gitlab(4, 0, "d")]),
        )
        .await
        .unwrap();
    engine.apply_action("github:2", UserAction::MarkRead).await.unwrap();
    engine.set_type_filter(NotificationType::Release, false).await;

    let snapshot = engine.snapshot();
    for filter in &snapshot.type_filters {
        let unread = snapshot
            .global_notifications
            .iter()
            .filter(|r| r.kind == filter.kind && r.unread)
            .count();
        assert_eq!(filter.number, unread, "{}", filter.name);
    }
    assert_eq!(snapshot.unread_count, 3);
    assert!(snapshot.filtered_notifications.iter().all(|r| r.kind != NotificationType::Release));
    assert!(snapshot
        .filtered_notifications
        .iter()
        .all(|r| snapshot.global_notifications.contains(r)));
}

#[tokio::test]
async fn test_watched_repo_restricts_filtered_list() {
    let engine = engine();
    engine
        .sync(ok(vec![github(1, "Issue", 1, "a", "a")]), ok(vec![gitlab(2, 0, "b")]))
        .await
        .unwrap();

    engine.watch_repo(WatchedRepo::new("200", "core", "platform")).await;
    let snapshot = engine.snapshot();
    let ids: Vec<&str> = snapshot.filtered_notifications.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["gitlab:2"]);
    assert_eq!(snapshot.watched_repos[0].number, 1);

    assert!(engine.unwatch_repo("200").await);
    assert_eq!(engine.snapshot().filtered_notifications.len(), 2);
}

#[tokio::test]
async fn test_eviction_keeps_pinned_and_done() {
    let engine = engine();
    engine
        .sync(
            ok(vec![
                github(1, "Issue", 1, "a", "a"),
                github(2, "Issue", 2, "b", "b"),
                github(3, "Issue", 3, "c", "c"),
            ]),
            ok(vec![]),
        )
        .await
        .unwrap();
    engine.apply_action("github:1", UserAction::Pin).await.unwrap();
    engine.apply_action("github:2", UserAction::MarkDone).await.unwrap();

    let report = engine.sync(ok(vec![]), ok(vec![])).await.unwrap();
    assert_eq!(report.stats.evicted, vec!["github:3".to_string()]);

    let snapshot = engine.snapshot();
    let ids: Vec<&str> = snapshot.github_notifications.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["github:2", "github:1"]);
    assert!(snapshot.github_notifications.iter().all(|r| r.stale));
}

#[tokio::test]
async fn test_unavailable_provider_keeps_records() {
    let engine = engine();
    engine.sync(ok(vec![]), ok(vec![gitlab(1, 0, "a"), gitlab(2, 1, "b")])).await.unwrap();

    let report = engine.sync(ok(vec![github(9, "Issue", 0, "x", "x")]), unavailable()).await.unwrap();
    assert!(!report.gitlab_available);
    assert!(report.stats.evicted.is_empty());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.gitlab_notifications.len(), 2);
    assert_eq!(snapshot.global_notifications.len(), 3);
    assert!(engine.error().await.is_none());
}

#[tokio::test]
async fn test_malformed_items_are_dropped() {
    let engine = engine();
    let mut no_time = github(2, "Issue", 0, "b", "b");
    no_time.as_object_mut().unwrap().remove("updated_at");

    let report = engine
        .sync(
            ok(vec![github(1, "Issue", 0, "a", "a"), no_time, json!("not an object")]),
            ok(vec![json!({"id": 5, "target_type": "Snippet", "project": {"name": "x"}})]),
        )
        .await
        .unwrap();
    assert_eq!(report.dropped, 3);
    assert_eq!(engine.snapshot().global_notifications.len(), 1);
}

#[tokio::test]
async fn test_notification_number_bounds_each_provider() {
    let engine = engine();
    engine.update_settings(|s| s.notification_number = 1).await;
    engine
        .sync(
            ok(vec![github(1, "Issue", 1, "a", "a"), github(2, "Issue", 2, "b", "b")]),
            ok(vec![gitlab(3, 0, "c"), gitlab(4, 1, "d")]),
        )
        .await
        .unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.github_notifications[0].id, "github:2");
    assert_eq!(snapshot.gitlab_notifications[0].id, "gitlab:4");
    assert_eq!(snapshot.global_notifications.len(), 2);
    assert_eq!(engine.fetch_request().await.per_page, 1);
}

#[tokio::test]
async fn test_unknown_record_action() {
    let engine = engine();
    let err = engine.apply_action("gitlab:1", UserAction::Pin).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(id) if id == "gitlab:1"));
}

#[tokio::test]
async fn test_state_survives_store_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = StateStore::new(temp.path());

    let engine = engine();
    engine.sync(ok(vec![github(1, "Issue", 0, "a", "a")]), ok(vec![])).await.unwrap();
    engine.apply_action("github:1", UserAction::Pin).await.unwrap();
    let (config, canonical) = engine.export().await;
    store.save(&config, &canonical).unwrap();

    let (config, canonical) = store.load().unwrap();
    let restored = NotificationEngine::new(config, canonical);
    assert_eq!(
        restored.snapshot().global_notifications,
        engine.snapshot().global_notifications
    );
    assert!(restored.snapshot().github_notifications[0].pinned);
}
