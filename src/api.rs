//! The API seam: what the engine asks the backend for, and what comes back.
//!
//! The engine never performs I/O itself. It queues [`ApiRequest`]s; the host
//! performs them through a [`Client`] and feeds the decoded [`ApiResponse`]
//! back into the store.

mod fixture;

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use serde_json::Value;

use crate::health::StatsPoint;
use crate::model::{AlertRule, Organization, Project};

pub use fixture::FixtureClient;

/// Query parameters, sorted by key.
pub type Query = BTreeMap<String, String>;

/// Length of the event-count window for the alert-reminder tip.
pub const STATS_WINDOW_SECONDS: i64 = 3600 * 24 * 30;

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A blocking API client.
pub trait Client {
    /// Perform a GET against `path` and return the decoded JSON body.
    fn request(&self, path: &str, query: &Query) -> Result<Value, ApiError>;
}

/// Which gating endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint {
    /// 30-day event counts for a project.
    ProjectStats,

    /// A project's alert rules.
    ProjectRules,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectStats => f.write_str("project stats"),
            Self::ProjectRules => f.write_str("project rules"),
        }
    }
}

/// A request the engine wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub project_id: u64,
    pub path: String,
    pub query: Query,
}

impl ApiRequest {
    /// Event counts for `project` since `since` (epoch seconds).
    pub fn project_stats(org: &Organization, project: &Project, project_id: u64, since: i64) -> Self {
        let mut query = Query::new();
        query.insert("since".into(), since.to_string());
        Self {
            endpoint: Endpoint::ProjectStats,
            project_id,
            path: format!("/projects/{}/{}/stats/", org.slug, project.slug),
            query,
        }
    }

    /// Alert rules configured on `project`.
    pub fn project_rules(org: &Organization, project: &Project, project_id: u64) -> Self {
        Self {
            endpoint: Endpoint::ProjectRules,
            project_id,
            path: format!("/projects/{}/{}/rules/", org.slug, project.slug),
            query: Query::new(),
        }
    }

    /// Decode a response body for this request.
    pub fn decode(&self, body: Value) -> Result<ApiResponse, ApiError> {
        let project_id = self.project_id;
        Ok(match self.endpoint {
            Endpoint::ProjectStats => ApiResponse::ProjectStats {
                project_id,
                points: serde_json::from_value(body)?,
            },
            Endpoint::ProjectRules => {
                let raw: Vec<Value> = serde_json::from_value(body)?;
                ApiResponse::ProjectRules {
                    project_id,
                    rules: raw.into_iter().map(AlertRule::from_value).collect(),
                }
            }
        })
    }

    /// Perform this request with `client` and decode the result.
    pub fn send(&self, client: &impl Client) -> Result<ApiResponse, ApiError> {
        let body = client.request(&self.path, &self.query)?;
        self.decode(body)
    }
}

/// A decoded response to an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    ProjectStats {
        project_id: u64,
        points: Vec<StatsPoint>,
    },
    ProjectRules {
        project_id: u64,
        rules: Vec<AlertRule>,
    },
}

impl ApiResponse {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::ProjectStats { .. } => Endpoint::ProjectStats,
            Self::ProjectRules { .. } => Endpoint::ProjectRules,
        }
    }

    pub fn project_id(&self) -> u64 {
        match self {
            Self::ProjectStats { project_id, .. } | Self::ProjectRules { project_id, .. } => {
                *project_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn context() -> (Organization, Project) {
        (Organization::new("acme"), Project::new("42", "web"))
    }

    #[test]
    fn builds_gating_paths() {
        let (org, project) = context();

        let stats = ApiRequest::project_stats(&org, &project, 42, 1_000);
        assert_eq!(stats.path, "/projects/acme/web/stats/");
        assert_eq!(stats.query["since"], "1000");
        assert_eq!(stats.endpoint, Endpoint::ProjectStats);

        let rules = ApiRequest::project_rules(&org, &project, 42);
        assert_eq!(rules.path, "/projects/acme/web/rules/");
        assert!(rules.query.is_empty());
    }

    #[test]
    fn decodes_stats_points() {
        let (org, project) = context();
        let request = ApiRequest::project_stats(&org, &project, 42, 0);

        let response = request.decode(json!([[1_500_000_000, 3], [1_500_086_400, 4]])).unwrap();
        assert_eq!(
            response,
            ApiResponse::ProjectStats {
                project_id: 42,
                points: vec![(1_500_000_000, 3), (1_500_086_400, 4)],
            }
        );
        assert_eq!(response.endpoint(), Endpoint::ProjectStats);
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let (org, project) = context();
        let request = ApiRequest::project_rules(&org, &project, 42);
        let err = request.decode(json!({"detail": "nope"})).unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
    }

    #[test]
    fn decodes_odd_rules_instead_of_failing() {
        let (org, project) = context();
        let request = ApiRequest::project_rules(&org, &project, 42);
        let response = request
            .decode(json!([{"actionMatch": "any", "frequency": null}, 7]))
            .unwrap();
        let ApiResponse::ProjectRules { rules, .. } = response else {
            panic!("expected rules");
        };
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].action_match.as_deref(), Some("any"));
        assert_eq!(rules[0].frequency, None);
        assert_eq!(rules[1], AlertRule::default());
    }
}
