//! Health time series: request parameters and response shaping.
//!
//! The health endpoints return either a time series (`[timestamp, rows]`
//! pairs, where each row carries a count and a tag object) or a flat list
//! of rows. Charts want one named series per tag category with a value for
//! every timestamp, so the shaping here fills gaps with zero.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{ApiError, Client, Query};
use crate::model::Organization;

/// One `[timestamp, count]` point from a project stats series.
pub type StatsPoint = (i64, u64);

/// Sum of counts across a stats series.
pub fn total_events(points: &[StatsPoint]) -> u64 {
    points.iter().map(|(_, count)| count).sum()
}

/// Parameters for a health request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthQuery {
    /// Tag to group by (e.g. `"release"`, `"user"`).
    pub tag: String,
    pub projects: Vec<String>,
    pub environments: Vec<String>,

    /// Relative period, e.g. `24h`, `7d`, `30d`.
    pub period: String,

    /// Bucket size, e.g. `1d`, `1h`.
    pub interval: String,
    pub include_previous: bool,
    pub timeseries: bool,
    pub topk: Option<u32>,
}

impl HealthQuery {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            projects: Vec::new(),
            environments: Vec::new(),
            period: "7d".into(),
            interval: "1d".into(),
            include_previous: true,
            timeseries: true,
            topk: None,
        }
    }

    pub fn path(&self, org: &Organization) -> String {
        format!("/organizations/{}/health/{}/", org.slug, self.tag)
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        query.insert("tag".into(), self.tag.clone());
        query.insert("statsPeriod".into(), self.period.clone());
        query.insert("interval".into(), self.interval.clone());
        query.insert("includePrevious".into(), self.include_previous.to_string());
        query.insert("timeseries".into(), self.timeseries.to_string());
        if !self.projects.is_empty() {
            query.insert("project".into(), self.projects.join(","));
        }
        if !self.environments.is_empty() {
            query.insert("environment".into(), self.environments.join(","));
        }
        if let Some(topk) = self.topk {
            query.insert("topk".into(), topk.to_string());
        }
        query
    }
}

/// A single row: a count plus the tag object it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRow {
    pub count: u64,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HealthRow {
    /// Category of this row for `tag`.
    ///
    /// The tag object's `value` when it has one, otherwise the object itself.
    pub fn category(&self, tag: &str) -> String {
        match self.fields.get(tag) {
            Some(Value::Object(obj)) => match obj.get("value") {
                Some(value) => render(value),
                None => render(&Value::Object(obj.clone())),
            },
            Some(value) => render(value),
            None => "null".to_string(),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A point in a chart series. `name` is the timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub name: i64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub series_name: String,
    pub data: Vec<SeriesPoint>,
}

/// Raw health payload, in the shape the request asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthData {
    Timeseries(Vec<(i64, Option<Vec<HealthRow>>)>),
    Totals(Vec<HealthRow>),
}

impl HealthData {
    /// Decode `data` as `[timestamp, rows]` pairs when a time series was
    /// requested, otherwise as a flat list of rows.
    pub fn decode(data: Value, timeseries: bool) -> Result<Self, serde_json::Error> {
        if timeseries {
            serde_json::from_value(data).map(Self::Timeseries)
        } else {
            serde_json::from_value(data).map(Self::Totals)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HealthEnvelope {
    data: Value,
    #[serde(default)]
    totals: Option<Value>,
}

/// Shaped health result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Shaped {
    Series(Vec<Series>),
    Totals(Vec<(String, u64)>),
}

/// One series per category, in first-seen order, zero-filled.
pub fn transform_timeseries(data: &[(i64, Option<Vec<HealthRow>>)], tag: &str) -> Vec<Series> {
    let mut categories: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<(i64, String), u64> = HashMap::new();

    for (timestamp, rows) in data {
        for row in rows.iter().flatten() {
            let category = row.category(tag);
            if seen.insert(category.clone()) {
                categories.push(category.clone());
            }
            counts.insert((*timestamp, category), row.count);
        }
    }

    categories
        .into_iter()
        .map(|series_name| {
            let data = data
                .iter()
                .map(|(timestamp, _)| SeriesPoint {
                    name: timestamp * 1000,
                    value: counts
                        .get(&(*timestamp, series_name.clone()))
                        .copied()
                        .unwrap_or(0),
                })
                .collect();
            Series { series_name, data }
        })
        .collect()
}

/// `(category, count)` pairs for a non-timeseries payload.
pub fn transform_totals(rows: &[HealthRow], tag: &str) -> Vec<(String, u64)> {
    rows.iter().map(|row| (row.category(tag), row.count)).collect()
}

/// Shape a payload for charting.
pub fn shape(data: &HealthData, tag: &str) -> Shaped {
    match data {
        HealthData::Timeseries(points) => Shaped::Series(transform_timeseries(points, tag)),
        HealthData::Totals(rows) => Shaped::Totals(transform_totals(rows, tag)),
    }
}

/// Result of a health request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResult {
    pub data: Shaped,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<Value>,
}

/// Fetch health data for `org` and shape it.
pub fn fetch_health(
    client: &impl Client,
    org: &Organization,
    query: &HealthQuery,
) -> Result<HealthResult, ApiError> {
    let body = client.request(&query.path(org), &query.to_query())?;
    let envelope: HealthEnvelope = serde_json::from_value(body)?;
    let data = HealthData::decode(envelope.data, query.timeseries)?;
    tracing::debug!(tag = %query.tag, timeseries = query.timeseries, "fetched health data");
    Ok(HealthResult {
        data: shape(&data, &query.tag),
        totals: envelope.totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn rows(value: Value) -> Vec<HealthRow> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn sums_stats_points() {
        assert_eq!(total_events(&[(1, 400), (2, 601)]), 1001);
        assert_eq!(total_events(&[]), 0);
    }

    #[test]
    fn category_prefers_value_field() {
        let r = rows(json!([
            {"count": 1, "release": {"value": "1.0", "_health_id": "release:1.0"}},
            {"count": 2, "release": "bare"},
            {"count": 3, "release": {"id": 7}},
            {"count": 4}
        ]));
        assert_eq!(r[0].category("release"), "1.0");
        assert_eq!(r[1].category("release"), "bare");
        assert_eq!(r[2].category("release"), r#"{"id":7}"#);
        assert_eq!(r[3].category("release"), "null");
    }

    #[test]
    fn timeseries_is_zero_filled_per_category() {
        let data = vec![
            (100, Some(rows(json!([{"count": 5, "os": {"value": "linux"}}])))),
            (200, None),
            (
                300,
                Some(rows(json!([
                    {"count": 2, "os": {"value": "mac"}},
                    {"count": 1, "os": {"value": "linux"}}
                ]))),
            ),
        ];

        let series = transform_timeseries(&data, "os");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].series_name, "linux");
        assert_eq!(series[1].series_name, "mac");

        let linux: Vec<_> = series[0].data.iter().map(|p| (p.name, p.value)).collect();
        assert_eq!(linux, vec![(100_000, 5), (200_000, 0), (300_000, 1)]);

        let mac: Vec<_> = series[1].data.iter().map(|p| p.value).collect();
        assert_eq!(mac, vec![0, 0, 2]);
    }

    #[test]
    fn totals_keep_row_order() {
        let r = rows(json!([
            {"count": 9, "user": {"value": "b"}},
            {"count": 3, "user": {"value": "a"}}
        ]));
        assert_eq!(
            transform_totals(&r, "user"),
            vec![("b".to_string(), 9), ("a".to_string(), 3)]
        );
    }

    #[test]
    fn query_defaults() {
        let query = HealthQuery::new("release");
        assert_eq!(
            query.path(&Organization::new("acme")),
            "/organizations/acme/health/release/"
        );
        let q = query.to_query();
        assert_eq!(q["statsPeriod"], "7d");
        assert_eq!(q["interval"], "1d");
        assert_eq!(q["includePrevious"], "true");
        assert_eq!(q["timeseries"], "true");
        assert!(!q.contains_key("topk"));
        assert!(!q.contains_key("project"));
    }

    #[test]
    fn payload_decoded_as_requested() {
        let series = HealthData::decode(
            json!([[100, [{"count": 1, "os": "linux"}]], [200, null]]),
            true,
        )
        .unwrap();
        assert!(matches!(series, HealthData::Timeseries(ref p) if p.len() == 2));

        let totals = HealthData::decode(json!([{"count": 1, "os": "linux"}]), false).unwrap();
        assert_eq!(
            shape(&totals, "os"),
            Shaped::Totals(vec![("linux".to_string(), 1)])
        );

        assert!(HealthData::decode(json!([{"count": 1, "os": "linux"}]), true).is_err());
    }

    struct Canned(Value);

    impl Client for Canned {
        fn request(&self, _path: &str, _query: &Query) -> Result<Value, ApiError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn empty_payload_follows_requested_mode() {
        let org = Organization::new("acme");
        let client = Canned(json!({"data": [], "totals": {"count": 0}}));

        let mut query = HealthQuery::new("os");
        query.timeseries = false;
        let result = fetch_health(&client, &org, &query).unwrap();
        assert_eq!(result.data, Shaped::Totals(Vec::new()));

        query.timeseries = true;
        let result = fetch_health(&client, &org, &query).unwrap();
        assert_eq!(result.data, Shaped::Series(Vec::new()));
        assert_eq!(result.totals, Some(json!({"count": 0})));
    }
}
