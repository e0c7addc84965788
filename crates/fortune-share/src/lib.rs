//! Shareable artifacts for a creator portrait: the story card image and the
//! share text with its platform intent links.

pub mod story;
pub mod text;

pub use story::{
    ImageRenderer, RenderError, RenderedImage, StoryCardRenderer, STORY_HEIGHT, STORY_WIDTH,
};
pub use text::{share_urls, threads_post_text, ShareUrls};
