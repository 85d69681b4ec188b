//! Core data model for guidepost.
//!
//! These types mirror what the backend hands us: guide definitions and
//! their steps, the organization/project/user context a guide is shown in,
//! and the alert rules that gate the alert-reminder tip.

mod context;
mod guide;
mod rule;

pub use context::{Organization, Project, User, experiment_cutoff};
pub use guide::{GuideDefinition, GuideType, Step, StepTarget};
pub use rule::{AlertRule, RuleComponent, is_default_rule_set};

use std::collections::BTreeMap;

/// Guide catalog keyed by guide key (e.g. `"issue"`, `"alert_reminder_1"`).
///
/// Ordered, so iterating yields keys in lexicographic order.
pub type Catalog = BTreeMap<String, GuideDefinition>;
