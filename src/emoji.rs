//! `:shortcode:` substitution for outgoing text.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SHORTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":([A-Za-z0-9_+\-]+):").expect("shortcode pattern is valid")
});

/// Replaces known `:shortcode:` markers with their emoji.
///
/// Unknown markers are left as written, and text without any marker is
/// returned borrowed.
pub fn emojify(text: &str) -> Cow<'_, str> {
    SHORTCODE.replace_all(text, |caps: &Captures<'_>| {
        match emojis::get_by_shortcode(&caps[1]) {
            Some(emoji) => emoji.as_str().to_string(),
            None => caps[0].to_string(),
        }
    })
}
