//! Guide selection: which catalog entry, if any, should be on deck.
//!
//! 1. If any required target is missing, the guide can't show.
//! 2. If the URL asks for the assistant, seen guides still show.
//! 3. Without the assistant feature, nothing shows.
//! 4. Seen guides don't show.
//! 5. Guides with extra checks (the alert reminder) must pass them.
//! 6. Otherwise the first guide in key order wins.

use std::collections::BTreeSet;

use crate::config::{ASSISTANT_FEATURE, Config};
use crate::gating::ALERT_REMINDER;
use crate::model::{Catalog, User};

/// Outcome of consulting the alert-reminder gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertGate {
    /// Gating data is still on its way.
    Pending,

    /// Data is in; `due` says whether the reminder applies.
    Ready { due: bool },
}

/// Keys of guides that may be shown, in lexicographic order.
pub fn candidate_keys<'a>(
    guides: &'a Catalog,
    available: &BTreeSet<String>,
    force_show: bool,
    config: &Config,
) -> Vec<&'a str> {
    let mut keys: Vec<&str> = guides
        .iter()
        .filter(|(_, guide)| guide.targets_available(available))
        .map(|(key, _)| key.as_str())
        .collect();

    if !force_show {
        if config.has_feature(ASSISTANT_FEATURE) {
            keys.retain(|key| guides.get(*key).is_some_and(|g| !g.seen));
        } else {
            keys.clear();
        }
    }

    keys
}

/// Walk `candidates` and return the first eligible key.
///
/// `alert_gate` is consulted only when the walk reaches the alert reminder.
/// A pending gate stops the walk: later guides wait behind it.
pub fn select_best<'a>(
    candidates: &[&'a str],
    user: Option<&User>,
    mut alert_gate: impl FnMut() -> AlertGate,
) -> Option<&'a str> {
    for &key in candidates {
        if key == ALERT_REMINDER {
            match alert_gate() {
                AlertGate::Pending => {
                    tracing::debug!("waiting on alert reminder data");
                    return None;
                }
                // Superusers only for now.
                AlertGate::Ready { due } => {
                    if due && user.is_some_and(|u| u.is_superuser) {
                        return Some(key);
                    }
                }
            }
        } else if user.is_some_and(User::in_experiment_cohort) {
            return Some(key);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::GuideDefinition;

    fn guide(id: &str, required: &[&str], seen: bool) -> GuideDefinition {
        GuideDefinition {
            id: id.into(),
            required_targets: required.iter().map(|s| (*s).to_string()).collect(),
            steps: Vec::new(),
            guide_type: crate::model::GuideType::Default,
            seen,
            cue: None,
        }
    }

    fn targets(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn assistant() -> Config {
        Config::default().with_feature(ASSISTANT_FEATURE)
    }

    fn cohort_user() -> User {
        User {
            is_superuser: false,
            date_joined: Some("2019-01-01T00:00:00Z".parse().unwrap()),
        }
    }

    fn superuser() -> User {
        User {
            is_superuser: true,
            date_joined: None,
        }
    }

    #[test]
    fn candidates_are_sorted_and_need_targets() {
        let catalog = Catalog::from([
            ("zeta".to_string(), guide("1", &[], false)),
            ("alpha".to_string(), guide("2", &[], false)),
            ("tags".to_string(), guide("3", &["tags"], false)),
        ]);

        let keys = candidate_keys(&catalog, &targets(&[]), false, &assistant());
        assert_eq!(keys, vec!["alpha", "zeta"]);

        let keys = candidate_keys(&catalog, &targets(&["tags"]), false, &assistant());
        assert_eq!(keys, vec!["alpha", "tags", "zeta"]);
    }

    #[test]
    fn no_feature_means_no_candidates() {
        let catalog = Catalog::from([("a".to_string(), guide("1", &[], false))]);
        assert!(candidate_keys(&catalog, &targets(&[]), false, &Config::default()).is_empty());
    }

    #[test]
    fn force_show_ignores_feature_and_seen() {
        let catalog = Catalog::from([("a".to_string(), guide("1", &[], true))]);
        let keys = candidate_keys(&catalog, &targets(&[]), true, &Config::default());
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn seen_guides_are_dropped() {
        let catalog = Catalog::from([
            ("a".to_string(), guide("1", &[], true)),
            ("b".to_string(), guide("2", &[], false)),
        ]);
        let keys = candidate_keys(&catalog, &targets(&[]), false, &assistant());
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn first_cohort_guide_wins() {
        let user = cohort_user();
        let best = select_best(&["a", "b"], Some(&user), || AlertGate::Pending);
        assert_eq!(best, Some("a"));
    }

    #[test]
    fn users_outside_cohort_see_nothing() {
        let user = User {
            is_superuser: false,
            date_joined: Some("2017-01-01T00:00:00Z".parse().unwrap()),
        };
        assert_eq!(select_best(&["a"], Some(&user), || AlertGate::Pending), None);
        assert_eq!(select_best(&["a"], None, || AlertGate::Pending), None);
    }

    #[test]
    fn pending_alert_reminder_blocks_later_guides() {
        let user = superuser();
        let mut consulted = 0;
        let best = select_best(&[ALERT_REMINDER, "issue"], Some(&user), || {
            consulted += 1;
            AlertGate::Pending
        });
        assert_eq!(best, None);
        assert_eq!(consulted, 1);
    }

    #[test]
    fn earlier_guides_win_before_gate_is_consulted() {
        let user = superuser();
        let mut consulted = false;
        let best = select_best(&["a", ALERT_REMINDER], Some(&user), || {
            consulted = true;
            AlertGate::Pending
        });
        assert_eq!(best, Some("a"));
        assert!(!consulted);
    }

    #[test]
    fn due_alert_reminder_is_superuser_only() {
        let gate = || AlertGate::Ready { due: true };
        assert_eq!(
            select_best(&[ALERT_REMINDER], Some(&superuser()), gate),
            Some(ALERT_REMINDER)
        );
        assert_eq!(select_best(&[ALERT_REMINDER], Some(&cohort_user()), gate), None);
    }

    #[test]
    fn ready_but_not_due_falls_through() {
        let best = select_best(&[ALERT_REMINDER, "issue"], Some(&superuser()), || {
            AlertGate::Ready { due: false }
        });
        assert_eq!(best, Some("issue"));
    }
}
