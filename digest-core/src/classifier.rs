//! Meme and humor detection for a single post.
//!
//! All matching is literal substring containment on lowercased text, so a
//! short keyword like `jk` also matches inside longer words. Stored
//! classification results depend on that behavior.

use crate::types::Post;
use once_cell::sync::Lazy;

pub const MEME_KEYWORDS: &[&str] = &[
    "meme",
    "joke",
    "funny",
    "lol",
    "lmao",
    "rofl",
    "humor",
    "humour",
    "shitpost",
    "shit post",
    "memeing",
    "jk",
    "just kidding",
    "trolling",
];

pub const MEME_FLAIR_KEYWORDS: &[&str] = &["meme", "humor", "funny"];

pub const IMAGE_POST_HINT: &str = "image";

pub const IMAGE_EXTENSIONS: &[&str] = &[".gif", ".jpg", ".jpeg", ".png"];

/// Image posts with at least this many body characters count as writeups.
pub const IMAGE_BODY_MIN_CHARS: usize = 100;

static STANDARD_RULES: Lazy<NoiseRules> = Lazy::new(NoiseRules::default);

/// Which rule flagged a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseSignal<'r> {
    Keyword(&'r str),
    Flair(&'r str),
    ImageDrop,
}

/// Keyword and heuristic tables used to classify noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseRules {
    keywords: Vec<String>,
    flair_keywords: Vec<String>,
    image_hint: String,
    image_extensions: Vec<String>,
    image_body_min_chars: usize,
}

impl Default for NoiseRules {
    fn default() -> Self {
        Self::new(
            MEME_KEYWORDS.iter().copied(),
            MEME_FLAIR_KEYWORDS.iter().copied(),
        )
    }
}

impl NoiseRules {
    pub fn new<'a>(
        keywords: impl IntoIterator<Item = &'a str>,
        flair_keywords: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            keywords: keywords.into_iter().map(str::to_lowercase).collect(),
            flair_keywords: flair_keywords.into_iter().map(str::to_lowercase).collect(),
            image_hint: IMAGE_POST_HINT.to_string(),
            image_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            image_body_min_chars: IMAGE_BODY_MIN_CHARS,
        }
    }

    /// Shared instance built from the default tables.
    pub fn standard() -> &'static NoiseRules {
        &STANDARD_RULES
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_noise(&self, post: &Post) -> bool {
        self.classify(post).is_some()
    }

    /// Returns the first rule that matches, checking keywords, then flair,
    /// then the image heuristic.
    pub fn classify(&self, post: &Post) -> Option<NoiseSignal<'_>> {
        let title = post.title.to_lowercase();
        let body = post.selftext.to_lowercase();

        if let Some(keyword) = self
            .keywords
            .iter()
            .find(|k| title.contains(k.as_str()) || body.contains(k.as_str()))
        {
            return Some(NoiseSignal::Keyword(keyword.as_str()));
        }

        let flair = post.flair().to_lowercase();
        if let Some(keyword) = self
            .flair_keywords
            .iter()
            .find(|k| flair.contains(k.as_str()))
        {
            return Some(NoiseSignal::Flair(keyword.as_str()));
        }

        if post.hint() == self.image_hint {
            let url = post.url.to_lowercase();
            let is_image_link = self
                .image_extensions
                .iter()
                .any(|ext| url.contains(ext.as_str()));
            if is_image_link && body.chars().count() < self.image_body_min_chars {
                return Some(NoiseSignal::ImageDrop);
            }
        }

        None
    }
}

/// Classifies a post with the standard rules.
pub fn is_noise(post: &Post) -> bool {
    NoiseRules::standard().is_noise(post)
}
