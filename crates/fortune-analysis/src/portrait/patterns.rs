//! Keyword classification and engagement banding for a post batch.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use fortune_core::Post;
use regex::Regex;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid word regex"));

const PERSONAL_KEYWORDS: &[&str] = &[
    "i", "i'm", "me", "my", "myself", "feel", "felt", "life", "journey", "family", "grateful",
    "personal", "story",
];
const EDUCATIONAL_KEYWORDS: &[&str] = &[
    "how", "why", "tip", "tips", "learn", "learned", "guide", "tutorial", "explained", "lesson",
    "lessons", "framework", "steps", "mistakes",
];
const ENTERTAINMENT_KEYWORDS: &[&str] = &[
    "lol", "lmao", "haha", "funny", "joke", "meme", "fun", "game", "movie", "music", "vibes",
];

/// The bucket a single post falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContentCategory {
    Personal,
    Educational,
    Entertainment,
    General,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::Personal,
        ContentCategory::Educational,
        ContentCategory::Entertainment,
        ContentCategory::General,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Educational => "educational",
            Self::Entertainment => "entertainment",
            Self::General => "general",
        }
    }

    /// Classify `content` by keyword membership, checked in priority order
    /// personal, educational, entertainment; no match is general.
    #[must_use]
    pub fn classify(content: &str) -> Self {
        let lowered = content.to_lowercase();
        let words: Vec<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();
        let hits = |keywords: &[&str]| words.iter().any(|w| keywords.contains(w));

        if hits(PERSONAL_KEYWORDS) {
            Self::Personal
        } else if hits(EDUCATIONAL_KEYWORDS) {
            Self::Educational
        } else if hits(ENTERTAINMENT_KEYWORDS) {
            Self::Entertainment
        } else {
            Self::General
        }
    }
}

/// Percentage of `posts` in each category, rounded to the nearest integer.
///
/// Every category is present. Empty input yields all zeroes.
#[must_use]
pub fn content_distribution(posts: &[Post]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<ContentCategory, usize> =
        ContentCategory::ALL.into_iter().map(|c| (c, 0)).collect();
    for post in posts {
        *counts.entry(ContentCategory::classify(&post.content)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(category, count)| (category.key().to_string(), percentage(count, posts.len())))
        .collect()
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 * 100.0 / total as f64).round() as u32
}

/// Engagement band of a batch by its average rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementPattern {
    HighVibrational,
    Steady,
    Emerging,
}

impl EngagementPattern {
    /// `> 5` is high-vibrational, `> 2` steady, anything else emerging.
    #[must_use]
    pub fn from_average(avg_engagement: f64) -> Self {
        if avg_engagement > 5.0 {
            Self::HighVibrational
        } else if avg_engagement > 2.0 {
            Self::Steady
        } else {
            Self::Emerging
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HighVibrational => "high-vibrational",
            Self::Steady => "steady",
            Self::Emerging => "emerging",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::HighVibrational => {
                "High-vibrational energy: the audience reacts strongly and often"
            }
            Self::Steady => "Steady glow: a loyal audience that shows up consistently",
            Self::Emerging => "Emerging spark: engagement is quiet but building",
        }
    }
}
