//! Share text and platform intent URLs.

use fortune_analysis::Portrait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

const THREADS_INTENT: &str = "https://threads.net/intent/post?text=";
const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet?text=";
const TWEET_MAX_CHARS: usize = 280;

/// Ready-made share links plus the raw text for copy-to-clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareUrls {
    pub threads: String,
    pub twitter: String,
    pub copy_text: String,
}

/// The post text a creator shares after seeing their portrait.
#[must_use]
pub fn threads_post_text(portrait: &Portrait) -> String {
    let (category, pct) = portrait.top_content_category().unwrap_or(("personal", 50));

    format!(
        "🔮 Just discovered my Creator DNA! ✨\n\
         \n\
         {quote}\n\
         \n\
         My digital aura reveals:\n\
         🎭 Archetype: {archetype}\n\
         📱 Content DNA: {pct}% {category}\n\
         🌙 Posting Spirit: {spirit}\n\
         \n\
         What's YOUR creator personality? \n\
         \n\
         Find out your mystical creator portrait 👇\n\
         threadsfortune.app\n\
         \n\
         #CreatorDNA #ThreadsPersonality #ContentCreator #CreatorQuiz",
        quote = portrait.shareable_quote,
        archetype = portrait.archetype,
        category = title_case(category),
        spirit = portrait.posting_spirit,
    )
}

/// Threads and Twitter intent links for [`threads_post_text`].
///
/// The Twitter text is cut to its first 280 characters before encoding.
#[must_use]
pub fn share_urls(portrait: &Portrait) -> ShareUrls {
    let text = threads_post_text(portrait);
    let tweet: String = text.chars().take(TWEET_MAX_CHARS).collect();

    ShareUrls {
        threads: format!("{THREADS_INTENT}{}", utf8_percent_encode(&text, NON_ALPHANUMERIC)),
        twitter: format!("{TWITTER_INTENT}{}", utf8_percent_encode(&tweet, NON_ALPHANUMERIC)),
        copy_text: text,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
