use std::collections::BTreeMap;
use std::fmt::Write as _;

use fortune_core::Post;

use super::patterns::EngagementPattern;
use super::types::Archetype;
use crate::text::truncate_chars;

const TOP_POSTS_IN_PROMPT: usize = 5;
const SNIPPET_CHARS: usize = 120;

/// Aggregates fed into the portrait prompt.
#[derive(Debug, Clone)]
pub(crate) struct BatchProfile {
    pub total_posts: usize,
    pub avg_engagement: f64,
    pub content_dna: BTreeMap<String, u32>,
    pub pattern: EngagementPattern,
}

pub(crate) fn build_portrait_prompt(profile: &BatchProfile, posts: &[Post]) -> String {
    let mut prompt = String::from(
        "You are a playful but insightful creator-personality reader. \
         Based on this Threads creator's posts, write their creator portrait.\n\n",
    );

    let _ = writeln!(prompt, "Posts analyzed: {}", profile.total_posts);
    let _ = writeln!(
        prompt,
        "Average engagement rate: {:.2}%",
        profile.avg_engagement
    );
    let _ = writeln!(prompt, "Engagement pattern: {}", profile.pattern.description());
    let dna = profile
        .content_dna
        .iter()
        .map(|(k, v)| format!("{k} {v}%"))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(prompt, "Observed content mix: {dna}");

    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| b.engagement_rate().total_cmp(&a.engagement_rate()));
    prompt.push_str("\nTop posts:\n");
    for post in ranked.into_iter().take(TOP_POSTS_IN_PROMPT) {
        let _ = writeln!(
            prompt,
            "- ({:.2}%) {}",
            post.engagement_rate(),
            truncate_chars(&post.content, SNIPPET_CHARS).replace('\n', " ")
        );
    }

    prompt.push_str("\nChoose exactly one archetype from this list:\n");
    for archetype in Archetype::ALL {
        let _ = writeln!(prompt, "- {}: {}", archetype.label(), archetype.description());
    }

    prompt.push_str(
        "\nRespond with ONLY a JSON object, no prose, with these keys:\n\
         {\n\
         \x20 \"archetype\": one archetype name from the list,\n\
         \x20 \"content_dna\": {\"personal\": 0-100, \"educational\": 0-100, \"entertainment\": 0-100},\n\
         \x20 \"posting_spirit\": a 2-4 word posting style label,\n\
         \x20 \"engagement_insight\": one sentence about how the audience responds,\n\
         \x20 \"creator_level\": a short encouraging level label with an emoji,\n\
         \x20 \"mystical_advice\": one sentence of advice,\n\
         \x20 \"shareable_quote\": a short quote framed with ✨\n\
         }",
    );

    prompt
}
