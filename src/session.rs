//! A guide store paired with the client that answers its gating fetches.

use crate::api::Client;
use crate::store::GuideStore;

pub struct Session<C> {
    store: GuideStore,
    client: C,
}

impl<C: Client> Session<C> {
    pub fn new(store: GuideStore, client: C) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &GuideStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GuideStore {
        &mut self.store
    }

    pub fn into_store(self) -> GuideStore {
        self.store
    }

    /// Perform every queued request and feed the results back, until the
    /// store stops asking. Returns how many requests were performed.
    ///
    /// Terminates: a request is queued at most once per project and
    /// endpoint, whether it succeeds or fails.
    pub fn pump(&mut self) -> usize {
        let mut performed = 0;
        loop {
            let requests = self.store.take_requests();
            if requests.is_empty() {
                return performed;
            }
            for request in requests {
                performed += 1;
                match request.send(&self.client) {
                    Ok(response) => self.store.resolve(response),
                    Err(e) => self.store.reject(&request, &e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    use serde_json::{Value, json};

    use crate::analytics::Recorder;
    use crate::api::{ApiError, Query};
    use crate::config::{ASSISTANT_FEATURE, Config};
    use crate::model::{Catalog, Organization, Project, User};

    /// Answers from a fixed table and counts calls per path.
    struct TableClient {
        answers: Vec<(&'static str, Value)>,
        calls: RefCell<Vec<String>>,
    }

    impl Client for TableClient {
        fn request(&self, path: &str, _query: &Query) -> Result<Value, ApiError> {
            self.calls.borrow_mut().push(path.to_string());
            self.answers
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(_, body)| body.clone())
                .ok_or_else(|| ApiError::NotFound(path.to_string()))
        }
    }

    fn store() -> GuideStore {
        let config = Config::default()
            .with_feature(ASSISTANT_FEATURE)
            .with_user(User {
                is_superuser: true,
                date_joined: None,
            });
        let mut store = GuideStore::new(config, Recorder::new());
        let catalog: Catalog = serde_json::from_value(json!({
            "alert_reminder_1": {"id": 5, "guide_type": "tip"},
            "issue": {"id": 6}
        }))
        .unwrap();
        store.fetch_succeeded(catalog);
        store.set_active_organization(Some(Organization::new("acme")));
        store.set_active_project(Some(Project::new("42", "web")));
        store
    }

    #[test]
    fn pump_resolves_gating_data() {
        let client = TableClient {
            answers: vec![
                ("/projects/acme/web/stats/", json!([[1, 800], [2, 800]])),
                (
                    "/projects/acme/web/rules/",
                    json!([{"actionMatch": "any", "frequency": 60, "conditions": [], "actions": []}]),
                ),
            ],
            calls: RefCell::new(Vec::new()),
        };
        let mut session = Session::new(store(), client);

        assert_eq!(session.pump(), 2);
        let state = session.store().state();
        assert_eq!(state.project_stats[&42_u64], 1600);
        assert!(state.project_rules[&42_u64]);
        assert_eq!(state.current_guide.as_ref().unwrap().id, "5");

        assert_eq!(session.pump(), 0);
    }

    #[test]
    fn failures_leave_reminder_pending() {
        let client = TableClient {
            answers: vec![("/projects/acme/web/stats/", json!([[1, 5000]]))],
            calls: RefCell::new(Vec::new()),
        };
        let mut session = Session::new(store(), client);

        assert_eq!(session.pump(), 2);
        session.store_mut().register_anchor("x");
        assert_eq!(session.pump(), 0);

        let store = session.into_store();
        assert!(store.state().current_guide.is_none());
        assert!(!store.state().project_rules.contains_key(&42_u64));
    }
}
