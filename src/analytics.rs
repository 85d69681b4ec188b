//! Observability events emitted by the guide store.
//!
//! Delivery is fire-and-forget: the store records an event and moves on.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

/// Something worth reporting about the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum AnalyticsEvent {
    /// A guide became the selected guide.
    #[serde(rename = "assistant.guide_cued")]
    GuideCued { guide: String, cue: Option<String> },

    /// The user opened the selected guide.
    #[serde(rename = "assistant.guide_opened")]
    GuideOpened { guide: String },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GuideCued { .. } => "assistant.guide_cued",
            Self::GuideOpened { .. } => "assistant.guide_opened",
        }
    }

    pub fn guide(&self) -> &str {
        match self {
            Self::GuideCued { guide, .. } | Self::GuideOpened { guide } => guide,
        }
    }
}

/// Where analytics events go.
pub trait Analytics {
    fn record(&self, event: &AnalyticsEvent);
}

/// Emits each event as a `tracing` info event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn record(&self, event: &AnalyticsEvent) {
        match event {
            AnalyticsEvent::GuideCued { guide, cue } => {
                tracing::info!(event = event.name(), guide = guide.as_str(), cue = cue.as_deref(), "analytics");
            }
            AnalyticsEvent::GuideOpened { guide } => {
                tracing::info!(event = event.name(), guide = guide.as_str(), "analytics");
            }
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<AnalyticsEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Analytics for Recorder {
    fn record(&self, event: &AnalyticsEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_clones_share_events() {
        let recorder = Recorder::new();
        let handle = recorder.clone();
        recorder.record(&AnalyticsEvent::GuideOpened { guide: "1".into() });
        assert_eq!(handle.events().len(), 1);
        assert_eq!(handle.events()[0].guide(), "1");
        handle.clear();
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn serializes_with_event_name() {
        let event = AnalyticsEvent::GuideCued {
            guide: "4".into(),
            cue: Some("Tags".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "assistant.guide_cued");
        assert_eq!(json["guide"], "4");
        assert_eq!(json["cue"], "Tags");
        assert_eq!(event.name(), "assistant.guide_cued");
    }
}
