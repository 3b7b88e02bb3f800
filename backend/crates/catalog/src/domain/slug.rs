//! URL slugs

use platform::crypto::random_hex;

/// Lowercase ASCII words joined by single dashes. Other characters are dropped.
///
/// ```
/// assert_eq!(catalog::domain::slug::slugify("  Rust & Axum: 2nd Ed. "), "rust-axum-2nd-ed");
/// ```
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '&' || ch == '.' || ch == ':' {
            pending_dash = true;
        }
    }
    slug
}

/// Slug with a short random suffix, for names that need not be unique.
pub fn unique_slug(raw: &str) -> String {
    let base = slugify(raw);
    let suffix = random_hex(3);
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("E-books & Guides"), "e-books-guides");
        assert_eq!(slugify("--Trim--"), "trim");
        assert_eq!(slugify("Café Music"), "caf-music");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_unique_slug_suffix() {
        let slug = unique_slug("Design Kit");
        assert!(slug.starts_with("design-kit-"));
        assert_eq!(slug.len(), "design-kit-".len() + 6);
        assert_eq!(unique_slug("***").len(), 6);
    }
}
