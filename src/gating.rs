//! Gating data for the alert-reminder tip.
//!
//! Whether to remind a user about alert rules depends on two facts about the
//! current project that the catalog doesn't carry: how many events it
//! received in the last 30 days, and whether its alert rules were changed
//! from the defaults. Both are fetched lazily, once per project, and
//! memoized on the store for the rest of the session.

use std::collections::{BTreeMap, BTreeSet};

use jiff::Timestamp;

use crate::api::{ApiRequest, Endpoint, STATS_WINDOW_SECONDS};
use crate::model::{AlertRule, Organization, Project, is_default_rule_set};

/// Catalog key of the guide that waits on gating data.
pub const ALERT_REMINDER: &str = "alert_reminder_1";

/// The reminder only shows for projects above this many events in 30 days.
pub const EVENT_THRESHOLD: u64 = 1000;

/// Tracks which gating fetches are queued or in flight.
///
/// A fetch is issued at most once per (project, endpoint). Successful
/// fetches are settled; failed ones stay marked so they are never retried.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    in_flight: BTreeSet<(u64, Endpoint)>,
    outbox: Vec<ApiRequest>,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the data needed to judge the alert-reminder tip is present.
    ///
    /// Queues any missing fetch that isn't already outstanding.
    pub fn check_alert_tip_data(
        &mut self,
        org: Option<&Organization>,
        project: Option<&Project>,
        project_stats: &BTreeMap<u64, u64>,
        project_rules: &BTreeMap<u64, bool>,
    ) -> bool {
        let (Some(org), Some(project)) = (org, project) else {
            return false;
        };
        let Some(project_id) = project.numeric_id() else {
            tracing::debug!(project = %project.id, "project id is not numeric, alert data unavailable");
            return false;
        };

        let mut ready = true;

        if !project_stats.contains_key(&project_id) {
            ready = false;
            if self.mark(project_id, Endpoint::ProjectStats) {
                let since = Timestamp::now().as_second() - STATS_WINDOW_SECONDS;
                self.outbox
                    .push(ApiRequest::project_stats(org, project, project_id, since));
            }
        }

        if !project_rules.contains_key(&project_id) {
            ready = false;
            if self.mark(project_id, Endpoint::ProjectRules) {
                self.outbox
                    .push(ApiRequest::project_rules(org, project, project_id));
            }
        }

        ready
    }

    /// Drain requests queued since the last call.
    pub fn take_requests(&mut self) -> Vec<ApiRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn is_outstanding(&self, project_id: u64, endpoint: Endpoint) -> bool {
        self.in_flight.contains(&(project_id, endpoint))
    }

    /// Clear the outstanding mark after a successful fetch.
    pub fn settle(&mut self, project_id: u64, endpoint: Endpoint) {
        self.in_flight.remove(&(project_id, endpoint));
    }

    /// Returns true if the fetch was not already outstanding.
    fn mark(&mut self, project_id: u64, endpoint: Endpoint) -> bool {
        let fresh = self.in_flight.insert((project_id, endpoint));
        if fresh {
            tracing::debug!(project_id, %endpoint, "queueing gating fetch");
        }
        fresh
    }
}

/// Whether a project's rules count as customized.
pub fn rules_customized(rules: &[AlertRule]) -> bool {
    !is_default_rule_set(rules)
}

/// Whether a project's gating data calls for the alert reminder.
///
/// Busy enough (strictly more than [`EVENT_THRESHOLD`] events) and with
/// non-default alert rules. Missing data never qualifies.
pub fn alert_reminder_due(events: Option<u64>, customized: Option<bool>) -> bool {
    events.is_some_and(|n| n > EVENT_THRESHOLD) && customized == Some(true)
}
