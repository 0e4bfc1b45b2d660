// src/synth/slug.rs
//! URL-safe slugs for post filenames.

pub const SLUG_MAX_LEN: usize = 60;
const FALLBACK_SLUG: &str = "post";

/// Derive a slug: lower-case ASCII alphanumerics separated by single hyphens,
/// at most 60 chars, never starting or ending with a hyphen. Idempotent.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len().min(SLUG_MAX_LEN * 2));
    let mut pending_sep = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_sep = true;
        }
        // Anything else (punctuation, non-ASCII) is dropped without separating.
    }

    if out.len() > SLUG_MAX_LEN {
        out.truncate(SLUG_MAX_LEN);
        while out.ends_with('-') {
            out.pop();
        }
    }

    if out.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        out
    }
}
