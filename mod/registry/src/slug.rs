//! Slug normalization for students and courses.
//!
//! A slug is the URL-safe public identifier of a record: lowercase
//! ASCII alphanumerics separated by single hyphens. Uniqueness and
//! suffix disambiguation live in the service layer; this module is the
//! pure string transform.

/// Normalize a base string into slug form.
///
/// Every run of non-alphanumeric characters collapses into a single
/// hyphen; leading and trailing hyphens are trimmed. Returns an empty
/// string when nothing survives — callers substitute their placeholder.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Truncate a slug to at most `max_len` characters without leaving a
/// trailing hyphen.
pub fn truncate(slug: &str, max_len: usize) -> String {
    let cut: String = slug.chars().take(max_len).collect();
    cut.trim_end_matches('-').to_string()
}

/// The nth candidate for a taken base: `base` itself for n = 1, then
/// `base-2`, `base-3`, ...
pub fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}
