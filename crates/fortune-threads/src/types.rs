//! Wire types for the Threads Graph API.

use chrono::{DateTime, Utc};
use fortune_core::PostMetrics;
use serde::Deserialize;

/// `{ "data": [...] }` envelope used by list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// A post as returned by `GET /{user_id}/threads`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl MediaItem {
    /// Publication time; Graph API timestamps use a `+0000` style offset.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?;
        DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// One metric from `GET /{media_id}/insights`.
///
/// Lifetime metrics carry `values[0].value`; some carry `total_value.value`.
#[derive(Debug, Deserialize)]
pub(crate) struct InsightMetric {
    pub name: String,
    #[serde(default)]
    pub values: Vec<InsightValue>,
    #[serde(default)]
    pub total_value: Option<InsightValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightValue {
    #[serde(default)]
    pub value: u64,
}

impl InsightMetric {
    fn value(&self) -> u64 {
        self.values
            .first()
            .or(self.total_value.as_ref())
            .map_or(0, |v| v.value)
    }
}

/// Flatten an insights list into [`PostMetrics`]; unknown names are ignored
/// and absent metrics stay zero.
pub(crate) fn metrics_from_insights(insights: &[InsightMetric]) -> PostMetrics {
    let mut metrics = PostMetrics::default();
    for insight in insights {
        let slot = match insight.name.as_str() {
            "views" => &mut metrics.views,
            "likes" => &mut metrics.likes,
            "replies" => &mut metrics.replies,
            "reposts" => &mut metrics.reposts,
            "shares" => &mut metrics.shares,
            _ => continue,
        };
        *slot = insight.value();
    }
    metrics
}

/// Graph API error body: `{ "error": { "message": ... } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item(timestamp: Option<&str>) -> MediaItem {
        MediaItem {
            id: "1".to_string(),
            media_type: None,
            text: None,
            permalink: None,
            timestamp: timestamp.map(String::from),
        }
    }

    #[test]
    fn created_at_parses_graph_api_offset() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            item(Some("2024-01-15T10:30:00+0000")).created_at(),
            Some(expected)
        );
        assert_eq!(
            item(Some("2024-01-15T10:30:00Z")).created_at(),
            Some(expected)
        );
    }

    #[test]
    fn created_at_tolerates_missing_or_garbage() {
        assert_eq!(item(None).created_at(), None);
        assert_eq!(item(Some("yesterday")).created_at(), None);
    }

    #[test]
    fn insights_flatten_by_name() {
        let json = serde_json::json!([
            { "name": "views", "values": [{ "value": 1000 }] },
            { "name": "likes", "total_value": { "value": 50 } },
            { "name": "quotes", "values": [{ "value": 7 }] },
            { "name": "replies", "values": [] }
        ]);
        let insights: Vec<InsightMetric> = serde_json::from_value(json).unwrap();
        let metrics = metrics_from_insights(&insights);
        assert_eq!(metrics.views, 1000);
        assert_eq!(metrics.likes, 50);
        assert_eq!(metrics.replies, 0);
        assert_eq!(metrics.shares, 0);
    }
}
