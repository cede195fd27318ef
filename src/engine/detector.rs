//! Change detection between consecutive syncs, and icon derivation

use crate::model::{NotificationIcon, NotificationRecord, NotificationType, Previously, SubjectState};

/// Map `(type, state, previous state)` to a display icon.
///
/// Total over its inputs: a missing current state falls back to the previous
/// one, and anything without a mapping is `Unsupported`.
pub fn derive_icon(
    kind: NotificationType,
    state: Option<SubjectState>,
    previous_state: Option<SubjectState>,
) -> NotificationIcon {
    use NotificationIcon as I;
    use SubjectState as S;

    let state = state.or(previous_state);
    match (kind, state) {
        (NotificationType::Pr, Some(S::Draft)) => I::DraftPr,
        (NotificationType::Pr, Some(S::Open)) => I::OpenPr,
        (NotificationType::Pr, Some(S::Merged)) => I::MergedPr,
        (NotificationType::Pr, Some(S::Closed)) => I::ClosedPr,
        (NotificationType::Issue, Some(S::Open)) => I::OpenIssue,
        (NotificationType::Issue, Some(S::Completed)) => I::CompletedIssue,
        (NotificationType::Issue, Some(S::Closed)) => I::ClosedIssue,
        (NotificationType::Workflow, Some(S::Failure)) => I::WorkflowFail,
        (NotificationType::Workflow, Some(S::Success)) => I::WorkflowSuccess,
        (NotificationType::Commit, _) => I::Commit,
        (NotificationType::Release, _) => I::Release,
        (NotificationType::Discussion, _) => I::Discussion,
        _ => I::Unsupported,
    }
}

/// True when `description` or the author's login differ
pub fn content_changed(incoming: &NotificationRecord, prior: &NotificationRecord) -> bool {
    incoming.description != prior.description || incoming.author_login() != prior.author_login()
}

/// Annotate `incoming` against the prior canonical record with the same id.
///
/// `previously` is set only when the record was already known and its
/// content changed; otherwise it is cleared, so a snapshot lives exactly one
/// cycle.
pub fn detect_changes(mut incoming: NotificationRecord, prior: Option<&NotificationRecord>) -> NotificationRecord {
    // a payload without subject state keeps the last known one
    let previous_state = prior.and_then(|p| p.state);
    incoming.state = incoming.state.or(previous_state);
    incoming.icon = derive_icon(incoming.kind, incoming.state, previous_state);

    incoming.previously = match prior {
        Some(prior) if content_changed(&incoming, prior) => Some(Previously {
            author: prior.author.clone(),
            description: prior.description.clone(),
        }),
        _ => None,
    };
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Provider, User};

    fn record(description: &str, author: &str) -> NotificationRecord {
        NotificationRecord::new(
            "github:1",
            Provider::Github,
            NotificationType::Issue,
            "Crash on start",
            "2026-03-01T10:00:00Z".parse().unwrap(),
        )
        .with_description(description)
        .with_author(User::new(author))
    }

    #[test]
    fn test_first_sighting_has_no_snapshot() {
        let out = detect_changes(record("A", "alice"), None);
        assert!(out.previously.is_none());
    }

    #[test]
    fn test_description_change_snapshots_prior() {
        let prior = record("A", "alice");
        let out = detect_changes(record("B", "alice"), Some(&prior));
        let previously = out.previously.unwrap();
        assert_eq!(previously.description, "A");
        assert_eq!(previously.author.unwrap().login, "alice");
    }

    #[test]
    fn test_author_compared_by_login_only() {
        let mut prior = record("A", "alice");
        prior.author.as_mut().unwrap().name = Some("Alice".to_string());
        let out = detect_changes(record("A", "alice"), Some(&prior));
        assert!(out.previously.is_none());

        let out = detect_changes(record("A", "bob"), Some(&prior));
        assert!(out.previously.is_some());
    }

    #[test]
    fn test_unchanged_record_clears_old_snapshot() {
        let mut prior = record("B", "alice");
        prior.previously = Some(Previously { author: None, description: "A".to_string() });
        let mut incoming = record("B", "alice");
        incoming.previously = prior.previously.clone();

        let out = detect_changes(incoming, Some(&prior));
        assert!(out.previously.is_none());
    }

    #[test]
    fn test_missing_state_is_carried_forward() {
        let mut first = record("A", "alice").with_state(SubjectState::Open);
        first.kind = NotificationType::Pr;
        let first = detect_changes(first, None);

        let mut bare = record("A", "alice");
        bare.kind = NotificationType::Pr;
        let second = detect_changes(bare.clone(), Some(&first));
        assert_eq!(second.state, Some(SubjectState::Open));
        assert_eq!(second.icon, NotificationIcon::OpenPr);

        let third = detect_changes(bare, Some(&second));
        assert_eq!(third.state, Some(SubjectState::Open));
        assert_eq!(third.icon, NotificationIcon::OpenPr);
        assert_eq!(third, second);
    }

    #[test]
    fn test_icon_transitions() {
        assert_eq!(
            derive_icon(NotificationType::Pr, Some(SubjectState::Merged), Some(SubjectState::Open)),
            NotificationIcon::MergedPr
        );
        assert_eq!(
            derive_icon(NotificationType::Workflow, Some(SubjectState::Failure), Some(SubjectState::Success)),
            NotificationIcon::WorkflowFail
        );
        // unknown current state keeps the previous icon
        assert_eq!(
            derive_icon(NotificationType::Pr, None, Some(SubjectState::Draft)),
            NotificationIcon::DraftPr
        );
        assert_eq!(derive_icon(NotificationType::Issue, None, None), NotificationIcon::Unsupported);
        assert_eq!(
            derive_icon(NotificationType::Issue, Some(SubjectState::Merged), None),
            NotificationIcon::Unsupported
        );
    }

    #[test]
    fn test_icon_is_total() {
        let states = [
            None,
            Some(SubjectState::Open),
            Some(SubjectState::Draft),
            Some(SubjectState::Merged),
            Some(SubjectState::Closed),
            Some(SubjectState::Completed),
            Some(SubjectState::Success),
            Some(SubjectState::Failure),
        ];
        for kind in NotificationType::ALL {
            for state in states {
                for previous in states {
                    let icon = derive_icon(kind, state, previous);
                    assert_eq!(icon, derive_icon(kind, state, previous));
                }
            }
        }
        for kind in [NotificationType::Commit, NotificationType::Release, NotificationType::Discussion] {
            assert_ne!(derive_icon(kind, None, None), NotificationIcon::Unsupported);
        }
    }
}
