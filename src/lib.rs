//! guidepost: decides which onboarding guide to show, and when.
//!
//! A [`GuideStore`] holds the guide catalog, the mounted anchors, and the
//! organization/project context, and re-derives the single guide that
//! should be on deck whenever any of them change. A [`Session`] pairs a
//! store with a [`Client`] that answers the store's gating fetches.

pub mod analytics;
pub mod anchor;
pub mod api;
pub mod config;
pub mod gating;
pub mod health;
pub mod model;
pub mod select;
pub mod session;
pub mod store;

pub use analytics::{Analytics, AnalyticsEvent, Recorder, TracingAnalytics};
pub use anchor::{AnchorId, AnchorSet};
pub use api::{ApiError, ApiRequest, ApiResponse, Client, FixtureClient};
pub use config::{Config, ConfigError};
pub use session::Session;
pub use store::{FORCE_SHOW_FRAGMENT, GuideState, GuideStore, SubscriptionId};
