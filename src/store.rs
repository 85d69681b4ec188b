//! The guide store: decides which guide is on deck and tells subscribers.
//!
//! All inputs (catalog, anchors, context, gating data, URL fragment) feed
//! one recomputation, [`GuideStore::update_current_guide`], that re-derives
//! the current guide and step from scratch and notifies every subscriber
//! with the full state. Only [`GuideStore::advance_step`] mutates the step
//! without recomputing, so opening a guide doesn't reset its progress.
//!
//! The store is single-threaded. Gating fetches leave as [`ApiRequest`]s
//! through [`GuideStore::take_requests`] and come back through
//! [`GuideStore::resolve`] or [`GuideStore::reject`].

use std::collections::BTreeMap;

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::anchor::{AnchorId, AnchorSet};
use crate::api::{ApiError, ApiRequest, ApiResponse};
use crate::config::Config;
use crate::gating::{self, Fetcher};
use crate::health::total_events;
use crate::model::{Catalog, GuideDefinition, GuideType, Organization, Project};
use crate::select::{self, AlertGate};

/// URL fragment that forces the assistant open.
pub const FORCE_SHOW_FRAGMENT: &str = "#assistant";

/// Everything the store knows. Delivered whole to subscribers.
#[derive(Debug, Clone, Default)]
pub struct GuideState {
    /// All guides returned by the server, keyed by guide key.
    pub guides: Catalog,

    /// All anchors that are currently mounted.
    pub anchors: AnchorSet,

    /// The "on deck" guide, with unanchored steps removed.
    pub current_guide: Option<GuideDefinition>,

    /// 1-indexed step of the current guide. 0 if there is no guide or it is
    /// cued but not opened.
    pub current_step: u32,

    pub org: Option<Organization>,
    pub project: Option<Project>,

    /// Events received per project in the last 30 days.
    pub project_stats: BTreeMap<u64, u64>,

    /// Whether each project has customized alert rules.
    pub project_rules: BTreeMap<u64, bool>,

    /// Set when the URL fragment is [`FORCE_SHOW_FRAGMENT`].
    pub force_show: bool,

    /// The last guide that was selected.
    pub prev_guide: Option<GuideDefinition>,
}

/// Handle returned by [`GuideStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&GuideState)>;

pub struct GuideStore {
    state: GuideState,
    config: Config,
    fetcher: Fetcher,
    analytics: Box<dyn Analytics>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl GuideStore {
    /// Creates an empty store reading flags and user from `config`.
    pub fn new(config: Config, analytics: impl Analytics + 'static) -> Self {
        Self {
            state: GuideState::default(),
            config,
            fetcher: Fetcher::new(),
            analytics: Box::new(analytics),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &GuideState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ── Subscriptions ──

    /// Registers `listener` to receive the state after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&GuideState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn trigger(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    // ── Actions ──

    /// Replaces the catalog with what the server returned.
    pub fn fetch_succeeded(&mut self, guides: Catalog) {
        self.state.guides = guides;
        self.update_current_guide();
    }

    pub fn set_active_organization(&mut self, org: Option<Organization>) {
        self.state.org = org;
        self.update_current_guide();
    }

    pub fn set_active_project(&mut self, project: Option<Project>) {
        self.state.project = project;
        self.update_current_guide();
    }

    /// Handles an organization slug rename.
    ///
    /// Stores `next` as the active organization regardless of which
    /// organization was renamed.
    pub fn change_organization_slug(&mut self, prev: &Organization, next: Organization) {
        tracing::debug!(from = %prev.slug, to = %next.slug, "organization slug changed");
        self.state.org = Some(next);
        self.update_current_guide();
    }

    /// Mounts an anchor for `target`.
    pub fn register_anchor(&mut self, target: impl Into<String>) -> AnchorId {
        let id = self.state.anchors.register(target);
        self.update_current_guide();
        id
    }

    /// Unmounts an anchor. Unknown handles change nothing.
    pub fn unregister_anchor(&mut self, id: AnchorId) {
        if self.state.anchors.unregister(id).is_none() {
            tracing::debug!(%id, "unregistering unknown anchor");
        }
        self.update_current_guide();
    }

    /// Dismisses the current guide for the rest of the session.
    pub fn close_guide(&mut self) {
        if let Some(current) = &self.state.current_guide {
            let id = current.id.clone();
            match self.state.guides.values_mut().find(|g| g.id == id) {
                Some(guide) => guide.seen = true,
                None => tracing::debug!(guide = %id, "closed guide is no longer in the catalog"),
            }
        }
        // Don't keep force-showing once the user dismissed the guide.
        self.state.force_show = false;
        self.update_current_guide();
    }

    /// Moves the current guide one step forward.
    pub fn advance_step(&mut self) {
        self.state.current_step += 1;
        self.trigger();
        if self.state.current_step == 1
            && let Some(guide) = &self.state.current_guide
        {
            self.analytics.record(&AnalyticsEvent::GuideOpened {
                guide: guide.id.clone(),
            });
        }
    }

    /// Reacts to a change of the URL fragment (including the initial load).
    pub fn on_url_fragment_change(&mut self, fragment: &str) {
        self.state.force_show = fragment == FORCE_SHOW_FRAGMENT;
        self.update_current_guide();
    }

    /// Replaces feature flags and user.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        self.update_current_guide();
    }

    // ── Gating fetches ──

    /// Requests queued by recomputation since the last call.
    pub fn take_requests(&mut self) -> Vec<ApiRequest> {
        self.fetcher.take_requests()
    }

    /// Memoizes a completed gating fetch and recomputes.
    pub fn resolve(&mut self, response: ApiResponse) {
        let project_id = response.project_id();
        let endpoint = response.endpoint();
        match response {
            ApiResponse::ProjectStats { points, .. } => {
                self.state
                    .project_stats
                    .insert(project_id, total_events(&points));
            }
            ApiResponse::ProjectRules { rules, .. } => {
                self.state
                    .project_rules
                    .insert(project_id, gating::rules_customized(&rules));
            }
        }
        self.fetcher.settle(project_id, endpoint);
        self.update_current_guide();
    }

    /// Records a failed gating fetch. It is not retried.
    pub fn reject(&mut self, request: &ApiRequest, error: &ApiError) {
        tracing::warn!(
            project_id = request.project_id,
            endpoint = %request.endpoint,
            path = %request.path,
            "gating fetch failed: {error}"
        );
    }

    // ── Recomputation ──

    /// Re-derives the current guide and step, then notifies subscribers.
    pub fn update_current_guide(&mut self) {
        let available = self.state.anchors.targets();
        let state = &self.state;
        let fetcher = &mut self.fetcher;

        let candidates =
            select::candidate_keys(&state.guides, &available, state.force_show, &self.config);

        let best_key = select::select_best(&candidates, self.config.user.as_ref(), || {
            if !fetcher.check_alert_tip_data(
                state.org.as_ref(),
                state.project.as_ref(),
                &state.project_stats,
                &state.project_rules,
            ) {
                return AlertGate::Pending;
            }
            let project_id = state.project.as_ref().and_then(Project::numeric_id);
            let due = project_id.is_some_and(|id| {
                gating::alert_reminder_due(
                    state.project_stats.get(&id).copied(),
                    state.project_rules.get(&id).copied(),
                )
            });
            AlertGate::Ready { due }
        });

        let best = best_key
            .and_then(|key| state.guides.get(key))
            .map(|guide| guide.with_available_steps(&available));

        tracing::debug!(
            candidates = candidates.len(),
            selected = best_key,
            force_show = state.force_show,
            "recomputed current guide"
        );

        if let Some(guide) = &best {
            self.update_prev_guide(guide);
        }

        self.state.current_step = match &best {
            Some(guide) if self.state.force_show || guide.guide_type == GuideType::Tip => 1,
            _ => 0,
        };
        self.state.current_guide = best;
        self.trigger();
    }

    fn update_prev_guide(&mut self, best: &GuideDefinition) {
        if self
            .state
            .prev_guide
            .as_ref()
            .is_some_and(|prev| prev.id == best.id)
        {
            return;
        }
        self.analytics.record(&AnalyticsEvent::GuideCued {
            guide: best.id.clone(),
            cue: best.cue.clone(),
        });
        self.state.prev_guide = Some(best.clone());
    }
}
