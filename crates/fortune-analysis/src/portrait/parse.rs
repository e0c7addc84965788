//! Strict decoding of the model's portrait JSON.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use super::types::{Archetype, Portrait};

#[derive(Debug, Error)]
pub enum PortraitParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("invalid portrait JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown archetype: {0:?}")]
    UnknownArchetype(String),

    #[error("field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("content_dna is empty")]
    EmptyContentDna,

    #[error("content_dna value for {category:?} is not a percentage: {value:?}")]
    InvalidPercentage { category: String, value: String },
}

#[derive(Deserialize)]
struct RawPortrait {
    archetype: String,
    content_dna: BTreeMap<String, RawPercent>,
    posting_spirit: String,
    engagement_insight: String,
    creator_level: String,
    mystical_advice: String,
    shareable_quote: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPercent {
    Number(f64),
    Text(String),
}

/// The outermost `{ ... }` span of `text`, ignoring code fences or prose around it.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(category: &str, raw: RawPercent) -> Result<u32, PortraitParseError> {
    let value = match raw {
        RawPercent::Number(n) => n,
        RawPercent::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| PortraitParseError::InvalidPercentage {
                category: category.to_string(),
                value: s.clone(),
            })?,
    };
    if !value.is_finite() {
        return Err(PortraitParseError::InvalidPercentage {
            category: category.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value.clamp(0.0, 100.0).round() as u32)
}

fn non_empty(field: &'static str, value: String) -> Result<String, PortraitParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortraitParseError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Decode model output into a [`Portrait`].
///
/// `total_posts` and `avg_engagement` are left at zero for the caller to fill.
///
/// # Errors
///
/// Returns [`PortraitParseError`] if no JSON object can be found, a field is
/// missing, empty or mistyped, or the archetype is not one of
/// [`Archetype::ALL`].
pub fn parse_portrait(text: &str) -> Result<Portrait, PortraitParseError> {
    let json = extract_json_object(text).ok_or(PortraitParseError::NoJsonObject)?;
    let raw: RawPortrait = serde_json::from_str(json)?;

    let archetype = Archetype::from_label(&raw.archetype)
        .ok_or_else(|| PortraitParseError::UnknownArchetype(raw.archetype.clone()))?;

    if raw.content_dna.is_empty() {
        return Err(PortraitParseError::EmptyContentDna);
    }
    let content_dna = raw
        .content_dna
        .into_iter()
        .map(|(category, value)| {
            let key = category.trim().to_lowercase();
            to_percent(&key, value).map(|pct| (key, pct))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(Portrait {
        archetype,
        content_dna,
        posting_spirit: non_empty("posting_spirit", raw.posting_spirit)?,
        engagement_insight: non_empty("engagement_insight", raw.engagement_insight)?,
        creator_level: non_empty("creator_level", raw.creator_level)?,
        mystical_advice: non_empty("mystical_advice", raw.mystical_advice)?,
        shareable_quote: non_empty("shareable_quote", raw.shareable_quote)?,
        total_posts: 0,
        avg_engagement: 0.0,
    })
}
