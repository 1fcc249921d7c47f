//! Client for the C-Site citizen-report platform.
//!
//! Topics are fetched by keyword and filtered locally by distance from a
//! reference point. Results for a given point and filter are cached for the
//! configured TTL.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use utoipa::ToSchema;

use crate::cache::TtlCache;
use crate::config::CSiteConfig;
use crate::errors::AppError;
use crate::models::TopicFilter;
use crate::proximity::{locate_record, within_radius, Coordinate, CoordinateKey, Nearby, DEFAULT_RECORD_FIELDS};

const TOPIC_LIST_PATH: &str = "/externaltopic/get_topic_list";
const TOPIC_URL_BASE: &str = "https://www.csitereport.com/topic";

/// A C-Site topic reshaped for the map client.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CitizenReport {
    pub id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub location: Option<Coordinate>,
    #[schema(value_type = Object)]
    pub images: Value,
    #[schema(value_type = Object)]
    pub videos: Value,
    #[schema(value_type = Object)]
    pub tags: Value,
    pub external_url: String,
}

type NearbyKey = (CoordinateKey, TopicFilter);

pub struct CSiteClient {
    http: reqwest::Client,
    config: CSiteConfig,
    cache: TtlCache<NearbyKey, Vec<Nearby<CitizenReport>>>,
}

impl CSiteClient {
    pub fn new(http: reqwest::Client, config: CSiteConfig, ttl: Duration) -> Self {
        Self {
            http,
            config,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.config.radius_km
    }

    /// Topics within the configured radius of `center`, nearest first.
    pub async fn nearby(
        &self,
        center: Coordinate,
        filter: &TopicFilter,
    ) -> Result<Vec<Nearby<CitizenReport>>, AppError> {
        let key = (center.key(), filter.clone());
        let reports = self
            .cache
            .get_or_try_fetch(key, move || async move {
                let topics = self.fetch_topics(filter).await?;
                let total = topics.len();
                let nearby = within_radius(
                    center,
                    topics.iter().filter_map(to_citizen_report),
                    self.config.radius_km,
                    |r| r.location,
                );
                log::info!(
                    "C-Site: {} of {total} topics within {} km of {center}",
                    nearby.len(),
                    self.config.radius_km
                );
                Ok::<_, AppError>(nearby)
            })
            .await?;
        log::debug!("C-Site cache holds {} entries", self.cache.len());
        Ok(reports)
    }

    /// Every topic matching the keyword, without location filtering.
    pub async fn all(&self, filter: &TopicFilter) -> Result<Vec<CitizenReport>, AppError> {
        let topics = self.fetch_topics(filter).await?;
        Ok(topics.iter().filter_map(to_citizen_report).collect())
    }

    async fn fetch_topics(&self, filter: &TopicFilter) -> Result<Vec<Value>, AppError> {
        let url = format!("{}{TOPIC_LIST_PATH}", self.config.base_url.trim_end_matches('/'));
        let form = topic_form(&self.config, filter);

        log::debug!("C-Site request: keyword={}", self.config.keyword);
        let response = self.http.post(&url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "C-Site API responded with status: {}",
                status.as_u16()
            )));
        }

        let body: Value = response.json().await?;
        Ok(topics_from_envelope(body))
    }
}

/// Form fields for the topic list. A missing or zero limit falls back to the
/// configured default.
fn topic_form(config: &CSiteConfig, filter: &TopicFilter) -> Vec<(&'static str, String)> {
    let limit = filter
        .limit
        .filter(|&l| l > 0)
        .unwrap_or(config.default_limit);

    let mut form = vec![
        ("token", config.token.clone()),
        ("keyword", config.keyword.clone()),
    ];
    if let Some(from) = &filter.datefrom {
        form.push(("datefrom", from.clone()));
    }
    if let Some(to) = &filter.dateto {
        form.push(("dateto", to.clone()));
    }
    form.push(("limit", limit.to_string()));
    form
}

/// Accepts a bare array or an object wrapping one in `topics` or `data`.
pub fn topics_from_envelope(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            for key in ["topics", "data"] {
                if let Some(Value::Array(items)) = obj.remove(key) {
                    return items;
                }
            }
            log::warn!(
                "C-Site: unexpected response shape with keys {:?}",
                obj.keys().collect::<Vec<_>>()
            );
            Vec::new()
        }
        other => {
            log::warn!("C-Site: unexpected response body {other}");
            Vec::new()
        }
    }
}

/// Topics without a `post_id` are dropped; a missing location is kept as `None`.
pub fn to_citizen_report(topic: &Value) -> Option<CitizenReport> {
    let id = text(topic, "post_id")?;
    Some(CitizenReport {
        external_url: format!("{TOPIC_URL_BASE}/{id}"),
        title: text(topic, "post_header"),
        content: text(topic, "post_detail"),
        date: text(topic, "post_create_date"),
        author: text(topic, "member_displayname"),
        location: locate_record(topic, DEFAULT_RECORD_FIELDS),
        images: list_or_empty(topic, "img"),
        videos: list_or_empty(topic, "vdo"),
        tags: list_or_empty(topic, "tag"),
        id,
    })
}

fn text(topic: &Value, key: &str) -> Option<String> {
    match topic.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn list_or_empty(topic: &Value, key: &str) -> Value {
    match topic.get(key) {
        Some(Value::Null) | None => Value::Array(Vec::new()),
        Some(v) => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn topic(id: Value, lat: Value, lng: Value) -> Value {
        json!({
            "post_id": id,
            "post_header": "น้ำขุ่นผิดปกติ",
            "post_detail": "พบน้ำในลำห้วยเปลี่ยนสี",
            "post_create_date": "2025-01-15 10:30:00",
            "member_displayname": "ชาวบ้าน",
            "post_latitude": lat,
            "post_longitude": lng,
            "img": ["https://cdn.example/1.jpg"],
            "tag": null
        })
    }

    #[test]
    fn envelope_shapes() {
        assert_eq!(topics_from_envelope(json!([{ "post_id": 1 }])).len(), 1);
        assert_eq!(topics_from_envelope(json!({ "topics": [{}, {}] })).len(), 2);
        assert_eq!(topics_from_envelope(json!({ "data": [{}] })).len(), 1);
        assert!(topics_from_envelope(json!({ "status": "error" })).is_empty());
        assert!(topics_from_envelope(json!({ "data": "nope" })).is_empty());
        assert!(topics_from_envelope(json!("oops")).is_empty());
    }

    #[test]
    fn topic_is_transformed() {
        let report = to_citizen_report(&topic(json!(981), json!("13.80"), json!("100.55"))).unwrap();
        assert_eq!(report.id, "981");
        assert_eq!(report.external_url, "https://www.csitereport.com/topic/981");
        assert_eq!(report.title.as_deref(), Some("น้ำขุ่นผิดปกติ"));
        assert_eq!(report.author.as_deref(), Some("ชาวบ้าน"));
        let loc = report.location.unwrap();
        assert_eq!((loc.lat(), loc.lng()), (13.80, 100.55));
        assert_eq!(report.images, json!(["https://cdn.example/1.jpg"]));
        assert_eq!(report.videos, json!([]));
        assert_eq!(report.tags, json!([]));
    }

    #[test]
    fn missing_coordinates_stay_null() {
        let report = to_citizen_report(&topic(json!("a1"), json!(""), Value::Null)).unwrap();
        assert!(report.location.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["location"].is_null());
        assert_eq!(json["externalUrl"], "https://www.csitereport.com/topic/a1");
    }

    #[test]
    fn topic_without_id_is_dropped() {
        assert!(to_citizen_report(&json!({ "post_header": "x" })).is_none());
    }

    #[test]
    fn nearby_pipeline_filters_topics() {
        let topics = vec![
            topic(json!(1), json!("13.80"), json!("100.55")),
            topic(json!(2), json!("14.5"), json!("101.5")),
            topic(json!(3), json!("abc"), json!("def")),
        ];
        let center = Coordinate::new(13.7563, 100.5018).unwrap();
        let nearby = within_radius(
            center,
            topics.iter().filter_map(to_citizen_report),
            30.0,
            |r| r.location,
        );
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].item.id, "1");
        let json = serde_json::to_value(&nearby[0]).unwrap();
        assert_eq!(json["id"], "1");
        assert!((json["distance"].as_f64().unwrap() - 7.12).abs() < 0.1);
    }

    fn config() -> CSiteConfig {
        CSiteConfig {
            base_url: "http://csite.test".into(),
            token: "t".into(),
            keyword: "เหมือง".into(),
            radius_km: 30.0,
            default_limit: 100,
        }
    }

    fn limit_sent(filter: &TopicFilter) -> String {
        topic_form(&config(), filter)
            .into_iter()
            .find(|(k, _)| *k == "limit")
            .map(|(_, v)| v)
            .unwrap()
    }

    #[test]
    fn zero_or_missing_limit_uses_default() {
        assert_eq!(limit_sent(&TopicFilter::default()), "100");
        let zero = TopicFilter { limit: Some(0), ..TopicFilter::default() };
        assert_eq!(limit_sent(&zero), "100");
        let five = TopicFilter { limit: Some(5), ..TopicFilter::default() };
        assert_eq!(limit_sent(&five), "5");
    }

    #[test]
    fn date_range_is_forwarded_only_when_set() {
        let filter = TopicFilter {
            datefrom: Some("2025-01-01".into()),
            ..TopicFilter::default()
        };
        let form = topic_form(&config(), &filter);
        assert!(form.contains(&("datefrom", "2025-01-01".to_string())));
        assert!(!form.iter().any(|(k, _)| *k == "dateto"));
    }
}
