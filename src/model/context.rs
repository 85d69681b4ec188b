//! Who is looking, and where: organization, project, and user context.

use jiff::Timestamp;
use jiff::civil::date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use super::guide::string_or_number;

/// The active organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Organization {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: None,
        }
    }
}

/// The active project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Backend id. Sent as a number or a string.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    pub slug: String,
}

impl Project {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
        }
    }

    /// The id as an integer, used as the key for per-project gating data.
    ///
    /// `None` when the backend id isn't numeric.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.trim().parse().ok()
    }
}

/// The viewing user, as far as guide eligibility cares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    #[serde(default, alias = "isSuperuser")]
    pub is_superuser: bool,

    #[serde(default, alias = "dateJoined")]
    pub date_joined: Option<Timestamp>,
}

impl User {
    /// Whether the user falls in the assistant experiment cohort.
    ///
    /// Superusers always do; everyone else must have joined after
    /// [`experiment_cutoff`].
    pub fn in_experiment_cohort(&self) -> bool {
        self.is_superuser
            || self
                .date_joined
                .is_some_and(|joined| joined > experiment_cutoff())
    }
}

/// Users who joined after this instant are in the experiment cohort.
pub fn experiment_cutoff() -> Timestamp {
    date(2018, 5, 10)
        .to_zoned(TimeZone::UTC)
        .map(|z| z.timestamp())
        .unwrap_or(Timestamp::UNIX_EPOCH)
}
