//! Guide types: the tooltip sequences the assistant can show.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A multi-step contextual guide, as received from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideDefinition {
    /// Backend identifier. Sent as a number or a string; kept as a string.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Anchor targets that must all be mounted before the guide can show.
    #[serde(default)]
    pub required_targets: BTreeSet<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    #[serde(default)]
    pub guide_type: GuideType,

    /// Set locally once the user dismisses the guide.
    #[serde(default)]
    pub seen: bool,

    /// Why the guide was cued, recorded with the `guide_cued` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
}

impl GuideDefinition {
    /// Whether every required target is among `available`.
    pub fn targets_available(&self, available: &BTreeSet<String>) -> bool {
        self.required_targets.is_subset(available)
    }

    /// A fresh copy of this guide keeping only steps that can be anchored.
    #[must_use]
    pub fn with_available_steps(&self, available: &BTreeSet<String>) -> Self {
        let mut guide = self.clone();
        guide.steps.retain(|step| step.is_available(available));
        guide
    }
}

/// How a guide opens once selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideType {
    /// Cued only; waits for the user to open it.
    #[default]
    Default,

    /// Opens immediately at step 1.
    Tip,
}

/// One step of a guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "StepTarget::is_missing")]
    pub target: StepTarget,

    /// Everything else the backend sent (title, message, ...), untouched.
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Step {
    pub fn is_available(&self, available: &BTreeSet<String>) -> bool {
        match &self.target {
            StepTarget::Anywhere => true,
            StepTarget::Anchor(target) => !target.is_empty() && available.contains(target),
            StepTarget::Missing => false,
        }
    }
}

/// Where a step attaches.
///
/// Only an explicit `null` means "no anchor needed". A step without a
/// `target` key, or with an empty one, never finds its anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StepTarget {
    /// No `target` key at all.
    #[default]
    Missing,

    /// `"target": null`: shows regardless of anchors.
    Anywhere,

    /// Attaches to the anchor with this target.
    Anchor(String),
}

impl StepTarget {
    pub fn anchor(target: impl Into<String>) -> Self {
        Self::Anchor(target.into())
    }

    pub fn as_anchor(&self) -> Option<&str> {
        match self {
            Self::Anchor(target) => Some(target),
            Self::Missing | Self::Anywhere => None,
        }
    }

    fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl Serialize for StepTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing | Self::Anywhere => serializer.serialize_none(),
            Self::Anchor(target) => serializer.serialize_str(target),
        }
    }
}

impl<'de> Deserialize<'de> for StepTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(target) => Self::Anchor(target),
            None => Self::Anywhere,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

/// Accept either `"12"` or `12` and normalize to a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
