//! Alert rules, as returned by the project rules endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Condition id of the rule every new project starts with.
pub const FIRST_SEEN_EVENT_CONDITION: &str =
    "sentry.rules.conditions.first_seen_event.FirstSeenEventCondition";

/// Action id of the rule every new project starts with.
pub const NOTIFY_EVENT_ACTION: &str = "sentry.rules.actions.notify_event.NotifyEventAction";

/// A project alert rule.
///
/// Every field is optional and decoded leniently: a value of the wrong type
/// reads as absent, so an unexpected payload still decodes and simply fails
/// to match the default rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    #[serde(default, deserialize_with = "lenient")]
    pub action_match: Option<String>,

    /// Minutes between notifications.
    #[serde(default, deserialize_with = "lenient")]
    pub frequency: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    pub conditions: Option<Vec<RuleComponent>>,

    #[serde(default, deserialize_with = "lenient")]
    pub actions: Option<Vec<RuleComponent>>,
}

impl AlertRule {
    /// Decode one element of a rules payload. Non-objects become an empty rule.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// A condition or action attached to a rule. Only the id matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleComponent {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RuleComponent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            rest: Map::new(),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Whether `rules` is exactly the default rule set a project is created with.
///
/// One rule, match-all, 30 minute frequency, a single first-seen condition
/// and a single notify action. Anything else counts as customized.
pub fn is_default_rule_set(rules: &[AlertRule]) -> bool {
    let [rule] = rules else {
        return false;
    };

    rule.action_match.as_deref() == Some("all")
        && rule.frequency == Some(30)
        && has_single(rule.conditions.as_deref(), FIRST_SEEN_EVENT_CONDITION)
        && has_single(rule.actions.as_deref(), NOTIFY_EVENT_ACTION)
}

fn has_single(components: Option<&[RuleComponent]>, id: &str) -> bool {
    matches!(components, Some([c]) if c.id.as_deref() == Some(id))
}
