//! Story-card rendering for creator portraits.
//!
//! A 1080×1920 PNG with a purple-to-blue gradient and a scatter of stars in
//! the top third, carrying the archetype, content DNA and quote of the
//! portrait in an embedded DejaVu Sans Bold. Rendering never fails: any error
//! yields the plain purple fallback card instead.

use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use fortune_analysis::Portrait;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusttype::{point, Font, Scale};
use thiserror::Error;

pub const STORY_WIDTH: u32 = 1080;
pub const STORY_HEIGHT: u32 = 1920;

const COSMIC_PURPLE: Rgb<u8> = Rgb([0x6B, 0x46, 0xC1]);
const MYSTIC_BLUE: Rgb<u8> = Rgb([0x3B, 0x82, 0xF6]);
const STELLAR_PINK: Rgb<u8> = Rgb([0xEC, 0x48, 0x99]);
const GOLDEN_YELLOW: Rgb<u8> = Rgb([0xF5, 0x9E, 0x0B]);
const WHITE: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

const STAR_COUNT: usize = 50;
const DNA_LINES: usize = 5;
const QUOTE_WRAP: usize = 30;
const QUOTE_LINES: usize = 12;

static CARD_FONT: LazyLock<Option<Font<'static>>> =
    LazyLock::new(|| Font::try_from_bytes(include_bytes!("../assets/DejaVuSans-Bold.ttf")));

/// 1×1 transparent PNG used if even the plain card cannot be encoded.
const LAST_RESORT_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0xfc, 0xff, 0x9f, 0xa1,
    0x1e, 0x00, 0x07, 0x82, 0x02, 0x7f, 0x3d, 0xc8, 0x48, 0xef, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("embedded card font could not be parsed")]
    Font,

    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Encoded PNG bytes and whether they are the fallback card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub fallback: bool,
}

impl RenderedImage {
    /// `data:image/png;base64,...` URL for embedding in JSON or HTML.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

/// Turns a portrait into a shareable image; always returns some image.
pub trait ImageRenderer: Send + Sync {
    fn render(&self, portrait: &Portrait) -> RenderedImage;
}

/// The vertical story card.
#[derive(Debug, Clone, Copy)]
pub struct StoryCardRenderer {
    width: u32,
    height: u32,
    seed: Option<u64>,
}

impl Default for StoryCardRenderer {
    fn default() -> Self {
        Self {
            width: STORY_WIDTH,
            height: STORY_HEIGHT,
            seed: None,
        }
    }
}

impl StoryCardRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the star layout, for reproducible output.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override the canvas size. Text positions and sizes scale with it.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn canvas(&self, portrait: &Portrait) -> Result<RgbImage, RenderError> {
        let font = CARD_FONT.as_ref().ok_or(RenderError::Font)?;
        let (w, h) = (self.width, self.height);
        let mut img = RgbImage::from_fn(w, h, |_, y| {
            blend(COSMIC_PURPLE, MYSTIC_BLUE, f64::from(y) / f64::from(h.max(1)))
        });

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };
        for _ in 0..STAR_COUNT {
            let x = rng.random_range(0..w.max(1));
            let y = rng.random_range(0..(h / 3).max(1));
            let radius = rng.random_range(2..=6);
            fill_disc(&mut img, x, y, radius + 1, GOLDEN_YELLOW);
            fill_disc(&mut img, x, y, radius, WHITE);
        }

        let text = Typesetter::new(font, w, h);
        text.line(&mut img, "🔮 Your Creator DNA", WHITE, 64.0, 200.0);
        text.line(&mut img, portrait.archetype.label(), GOLDEN_YELLOW, 56.0, 300.0);

        let mut y = 450.0;
        for (category, pct) in portrait.content_dna.iter().take(DNA_LINES) {
            let entry = format!("{}: {pct}%", title_case(category));
            text.line(&mut img, &entry, WHITE, 40.0, y);
            y += 50.0;
        }

        let mut y = 700.0;
        for quote_line in wrap(&printable(font, &portrait.shareable_quote), QUOTE_WRAP)
            .iter()
            .take(QUOTE_LINES)
        {
            text.line(&mut img, quote_line, STELLAR_PINK, 44.0, y);
            y += 56.0;
        }

        text.line(&mut img, "Discover your Creator DNA", WHITE, 44.0, 1600.0);
        text.line(&mut img, "threadsfortune.app", GOLDEN_YELLOW, 44.0, 1650.0);

        Ok(img)
    }

    /// Solid purple card; carries its tagline whenever the font is usable.
    fn fallback_canvas(&self) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, COSMIC_PURPLE);
        if let Some(font) = CARD_FONT.as_ref() {
            let text = Typesetter::new(font, self.width, self.height);
            text.line(&mut img, "🔮 Creator DNA", WHITE, 64.0, 960.0);
            text.line(&mut img, "Discover your mystical", WHITE, 44.0, 1020.0);
            text.line(&mut img, "creator personality", WHITE, 44.0, 1060.0);
        }
        img
    }

    fn draw(&self, portrait: &Portrait) -> Result<Vec<u8>, RenderError> {
        encode_png(&self.canvas(portrait)?)
    }

    fn draw_fallback(&self) -> Result<Vec<u8>, RenderError> {
        encode_png(&self.fallback_canvas())
    }
}

impl ImageRenderer for StoryCardRenderer {
    fn render(&self, portrait: &Portrait) -> RenderedImage {
        match self.draw(portrait) {
            Ok(png) => RenderedImage {
                png,
                fallback: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "story card rendering failed, using fallback image");
                let png = self.draw_fallback().unwrap_or_else(|e| {
                    tracing::error!(error = %e, "fallback image rendering failed");
                    LAST_RESORT_PNG.to_vec()
                });
                RenderedImage {
                    png,
                    fallback: true,
                }
            }
        }
    }
}

/// Centred text placed on the 1080×1920 reference grid, scaled to the canvas.
struct Typesetter<'f> {
    font: &'f Font<'static>,
    sx: f32,
    sy: f32,
    width: f32,
}

impl<'f> Typesetter<'f> {
    #[allow(clippy::cast_precision_loss)]
    fn new(font: &'f Font<'static>, width: u32, height: u32) -> Self {
        Self {
            font,
            sx: width as f32 / STORY_WIDTH as f32,
            sy: height as f32 / STORY_HEIGHT as f32,
            width: width as f32,
        }
    }

    /// Draws `text` centred on reference row `y`, shrunk to fit 90 % of the width.
    #[allow(clippy::cast_possible_truncation)]
    fn line(&self, img: &mut RgbImage, text: &str, color: Rgb<u8>, size: f32, y: f32) {
        let text = printable(self.font, text);
        let px = size * self.sx;
        if text.is_empty() || px < 1.0 {
            return;
        }

        let mut scale = Scale::uniform(px);
        let natural = line_width(self.font, scale, &text);
        let max_width = self.width * 0.9;
        if natural > max_width {
            scale = Scale::uniform(px * max_width / natural);
        }

        let width = line_width(self.font, scale, &text);
        let v = self.font.v_metrics(scale);
        let left = (self.width - width) / 2.0;
        let top = y * self.sy - (v.ascent - v.descent) / 2.0;
        draw_text_mut(
            img,
            color,
            left.round() as i32,
            top.round() as i32,
            scale,
            self.font,
            &text,
        );
    }
}

fn line_width(font: &Font<'_>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map_or(0.0, |g| {
            g.position().x + g.unpositioned().h_metrics().advance_width
        })
}

/// Drops characters the font has no glyph for (emoji) and flattens whitespace.
fn printable(font: &Font<'_>, text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|&c| font.glyph(c).id().0 != 0)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Greedy word wrap at `width` characters; longer words are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line: Vec<char> = Vec::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(line.drain(..).collect());
            }
            lines.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(line.drain(..).collect());
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line.into_iter().collect());
    }
    lines
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)?;
    Ok(buf)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(from: Rgb<u8>, to: Rgb<u8>, alpha: f64) -> Rgb<u8> {
    let mix = |a: u8, b: u8| (f64::from(a) * (1.0 - alpha) + f64::from(b) * alpha) as u8;
    Rgb([
        mix(from[0], to[0]),
        mix(from[1], to[1]),
        mix(from[2], to[2]),
    ])
}

fn fill_disc(img: &mut RgbImage, cx: u32, cy: u32, r: u32, color: Rgb<u8>) {
    let r_sq = i64::from(r) * i64::from(r);
    for py in cy.saturating_sub(r)..=cy.saturating_add(r) {
        for px in cx.saturating_sub(r)..=cx.saturating_add(r) {
            if px >= img.width() || py >= img.height() {
                continue;
            }
            let dx = i64::from(px) - i64::from(cx);
            let dy = i64::from(py) - i64::from(cy);
            if dx * dx + dy * dy <= r_sq {
                img.put_pixel(px, py, color);
            }
        }
    }
}
