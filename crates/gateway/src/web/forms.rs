//! Form field normalization

use regex_lite::Regex;
use std::sync::OnceLock;
use url::Url;
use uuid::Uuid;

/// Split a comma-separated list of names
pub fn split_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

fn tmdb_poster_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^https://image\.tmdb\.org/t/p/w500/(.+)$").ok())
        .as_ref()
}

/// Poster value stored for a URL typed into the form
///
/// TMDB w500 image URLs are stored as their bare path, everything else as
/// given. Fails when the input does not parse as an absolute URL.
pub fn poster_from_url(input: &str) -> Result<String, &'static str> {
    let input = input.trim();
    if Url::parse(input).is_err() {
        return Err("The poster URL is not a valid URL.");
    }

    let rewritten = tmdb_poster_pattern()
        .and_then(|pattern| pattern.captures(input))
        .and_then(|captures| captures.get(1))
        .map(|path| format!("/{}", path.as_str()));

    Ok(rewritten.unwrap_or_else(|| input.to_string()))
}

/// File extension for an accepted poster content type
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Lowercase ASCII slug; runs of anything else collapse to one dash
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Unique name for an uploaded poster, keeping a readable stem
pub fn poster_file_name(original: &str, extension: &str) -> String {
    let stem = original
        .rsplit_once('.')
        .map_or(original, |(stem, _)| stem);
    let slug = slugify(stem);
    let slug = if slug.is_empty() { "poster".to_string() } else { slug };

    format!("{}-{}.{}", slug, Uuid::new_v4().simple(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names(" Al Pacino, Robert De Niro ,, "),
            vec!["Al Pacino".to_string(), "Robert De Niro".to_string()]
        );
        assert!(split_names("").is_empty());
    }

    #[test]
    fn test_tmdb_poster_url_is_shortened() {
        assert_eq!(
            poster_from_url("https://image.tmdb.org/t/p/w500/abc123.jpg"),
            Ok("/abc123.jpg".to_string())
        );
    }

    #[test]
    fn test_other_poster_urls_kept() {
        assert_eq!(
            poster_from_url("https://example.com/p.png"),
            Ok("https://example.com/p.png".to_string())
        );
        assert_eq!(
            poster_from_url("https://image.tmdb.org/t/p/original/abc.jpg"),
            Ok("https://image.tmdb.org/t/p/original/abc.jpg".to_string())
        );
    }

    #[test]
    fn test_invalid_poster_url() {
        assert_err!(poster_from_url("not a url"));
        assert_err!(poster_from_url("/relative/path.jpg"));
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("image/webp"), None);
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[test]
    fn test_poster_file_name() {
        let name = poster_file_name("My Poster (Final).JPG", "jpg");
        assert!(name.starts_with("my-poster-final-"));
        assert!(name.ends_with(".jpg"));

        let name = poster_file_name("....", "png");
        assert!(name.starts_with("poster-"));
    }
}
