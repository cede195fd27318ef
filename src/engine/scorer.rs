//! Priority scoring: ordered rules, first match wins

use tracing::warn;

use crate::model::{Criteria, NotificationRecord, Priority, PriorityRule, RawPriorityRule};

/// Compile configured rules, skipping misconfigured ones
pub fn compile_rules(raw: &[RawPriorityRule]) -> Vec<PriorityRule> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, rule)| match PriorityRule::try_from(rule) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!(index, error = %e, "Skipping priority rule");
                None
            }
        })
        .collect()
}

pub fn matches(rule: &PriorityRule, record: &NotificationRecord) -> bool {
    match &rule.criteria {
        Criteria::ManyComments => record.facts.many_comments,
        Criteria::ManyReactions => record.facts.many_reactions,
        Criteria::Assigned => record.facts.assigned,
        Criteria::Mentioned => record.facts.mentioned,
        Criteria::ReviewRequest => record.facts.review_requested,
        Criteria::Label(name) => record.has_label(name),
        Criteria::State(status) => record.status() == Some(*status),
        Criteria::Type(kind) => record.kind == *kind,
    }
}

/// Priority of `record` under `rules`, or `None` when nothing matches
pub fn score(record: &NotificationRecord, rules: &[PriorityRule]) -> Option<Priority> {
    rules.iter().find(|rule| matches(rule, record)).map(|rule| Priority {
        label: rule.description(),
        value: rule.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationType, OpenStatus, PriorityFacts, Provider, SubjectState};

    fn issue() -> NotificationRecord {
        NotificationRecord::new(
            "github:7",
            Provider::Github,
            NotificationType::Issue,
            "Flaky test",
            "2026-03-01T10:00:00Z".parse().unwrap(),
        )
    }

    fn rules() -> Vec<PriorityRule> {
        compile_rules(&[
            RawPriorityRule::new(10, "label", Some("urgent")),
            RawPriorityRule::new(5, "type", Some("issue")),
        ])
    }

    #[test]
    fn test_first_match_wins() {
        let both = issue().with_labels(["urgent"]);
        assert_eq!(score(&both, &rules()).map(|p| p.value), Some(10));

        let only_type = issue();
        let priority = score(&only_type, &rules()).unwrap();
        assert_eq!(priority.value, 5);
        assert_eq!(priority.label, "Type: issue");

        let mut neither = issue();
        neither.kind = NotificationType::Commit;
        assert_eq!(score(&neither, &rules()), None);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let record = issue().with_labels(["urgent"]);
        let rules = rules();
        assert_eq!(score(&record, &rules), score(&record, &rules));
    }

    #[test]
    fn test_misconfigured_rules_are_skipped() {
        let rules = compile_rules(&[
            RawPriorityRule::new(99, "stars", None),
            RawPriorityRule::new(50, "label", None),
            RawPriorityRule::new(3, "mentioned", None),
        ]);
        assert_eq!(rules.len(), 1);

        let record = issue().with_facts(PriorityFacts { mentioned: true, ..Default::default() });
        assert_eq!(score(&record, &rules).map(|p| p.value), Some(3));
    }

    #[test]
    fn test_state_criteria_uses_open_closed_status() {
        let rule = vec![PriorityRule::new(4, Criteria::State(OpenStatus::Closed))];
        assert!(score(&issue().with_state(SubjectState::Completed), &rule).is_some());
        assert!(score(&issue().with_state(SubjectState::Open), &rule).is_none());
        // no status at all never matches
        assert!(score(&issue(), &rule).is_none());
    }

    #[test]
    fn test_fact_criteria() {
        let facts = PriorityFacts {
            many_comments: true,
            review_requested: true,
            ..Default::default()
        };
        let record = issue().with_facts(facts);
        let rules = vec![
            PriorityRule::new(1, Criteria::Assigned),
            PriorityRule::new(2, Criteria::ReviewRequest),
            PriorityRule::new(3, Criteria::ManyComments),
        ];
        assert_eq!(
            score(&record, &rules),
            Some(Priority { label: "Review request".to_string(), value: 2 })
        );
    }
}
