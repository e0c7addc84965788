use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// The fixed set of creator personas a portrait can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    AuthenticStoryteller,
    KnowledgeSage,
    JoyfulEntertainer,
    CommunityWeaver,
    VisionaryTrendsetter,
    ThoughtfulPhilosopher,
    CreativeAlchemist,
    EmergingCreator,
}

impl Archetype {
    pub const ALL: [Archetype; 8] = [
        Archetype::AuthenticStoryteller,
        Archetype::KnowledgeSage,
        Archetype::JoyfulEntertainer,
        Archetype::CommunityWeaver,
        Archetype::VisionaryTrendsetter,
        Archetype::ThoughtfulPhilosopher,
        Archetype::CreativeAlchemist,
        Archetype::EmergingCreator,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AuthenticStoryteller => "The Authentic Storyteller",
            Self::KnowledgeSage => "The Knowledge Sage",
            Self::JoyfulEntertainer => "The Joyful Entertainer",
            Self::CommunityWeaver => "The Community Weaver",
            Self::VisionaryTrendsetter => "The Visionary Trendsetter",
            Self::ThoughtfulPhilosopher => "The Thoughtful Philosopher",
            Self::CreativeAlchemist => "The Creative Alchemist",
            Self::EmergingCreator => "The Emerging Creator",
        }
    }

    /// One-line persona description used in the portrait prompt.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::AuthenticStoryteller => "shares personal experiences with raw honesty",
            Self::KnowledgeSage => "teaches, explains and breaks down ideas",
            Self::JoyfulEntertainer => "brings humor, play and lightness",
            Self::CommunityWeaver => "starts conversations and connects people",
            Self::VisionaryTrendsetter => "spots what is next before everyone else",
            Self::ThoughtfulPhilosopher => "asks deep questions and reflects",
            Self::CreativeAlchemist => "mixes formats and experiments boldly",
            Self::EmergingCreator => "is still discovering a signature voice",
        }
    }

    /// Match a label case-insensitively; the leading "The " is optional.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize(label);
        Self::ALL
            .into_iter()
            .find(|a| normalize(a.label()) == wanted)
    }
}

fn normalize(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    lowered
        .strip_prefix("the ")
        .unwrap_or(&lowered)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Archetype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A creator personality summary for a batch of posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portrait {
    pub archetype: Archetype,
    /// Content category to percentage. Advisory; need not sum to 100.
    pub content_dna: BTreeMap<String, u32>,
    pub posting_spirit: String,
    pub engagement_insight: String,
    pub creator_level: String,
    pub mystical_advice: String,
    pub shareable_quote: String,
    pub total_posts: usize,
    pub avg_engagement: f64,
}

impl Portrait {
    /// The canonical portrait returned for empty input or any generation failure.
    #[must_use]
    pub fn default_portrait() -> Self {
        let content_dna = [("personal", 50), ("educational", 25), ("entertainment", 25)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Self {
            archetype: Archetype::EmergingCreator,
            content_dna,
            posting_spirit: "Digital Wanderer".to_string(),
            engagement_insight: "Your audience is still discovering your voice".to_string(),
            creator_level: "Rising Star ⭐".to_string(),
            mystical_advice: "The universe rewards consistency over perfection".to_string(),
            shareable_quote: "✨ Your creative energy is unique ✨".to_string(),
            total_posts: 0,
            avg_engagement: 0.0,
        }
    }

    /// The content category with the highest share, ties to the alphabetically first.
    #[must_use]
    pub fn top_content_category(&self) -> Option<(&str, u32)> {
        self.content_dna
            .iter()
            .fold(None, |best: Option<(&str, u32)>, (k, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((k.as_str(), v)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_label() {
        for archetype in Archetype::ALL {
            assert_eq!(Archetype::from_label(archetype.label()), Some(archetype));
        }
    }

    #[test]
    fn from_label_is_lenient_about_case_and_article() {
        assert_eq!(
            Archetype::from_label("knowledge   sage"),
            Some(Archetype::KnowledgeSage)
        );
        assert_eq!(
            Archetype::from_label("  THE JOYFUL ENTERTAINER "),
            Some(Archetype::JoyfulEntertainer)
        );
        assert_eq!(Archetype::from_label("The Midnight Poet"), None);
    }

    #[test]
    fn archetype_serializes_as_label() {
        let json = serde_json::to_value(Archetype::CommunityWeaver).unwrap();
        assert_eq!(json, "The Community Weaver");
    }

    #[test]
    fn default_portrait_shape() {
        let p = Portrait::default_portrait();
        assert_eq!(p.archetype, Archetype::EmergingCreator);
        assert_eq!(p.content_dna["personal"], 50);
        assert_eq!(p.content_dna["educational"], 25);
        assert_eq!(p.content_dna["entertainment"], 25);
        assert_eq!(p.total_posts, 0);
        assert_eq!(p.avg_engagement, 0.0);
    }

    #[test]
    fn top_category_prefers_highest_then_alphabetical() {
        let p = Portrait::default_portrait();
        assert_eq!(p.top_content_category(), Some(("personal", 50)));

        let mut tied = Portrait::default_portrait();
        tied.content_dna.insert("personal".to_string(), 25);
        assert_eq!(tied.top_content_category(), Some(("educational", 25)));
    }
}
