// Hashtag extraction for post content

const TAG_MARKER: char = '#';

/// Extract hashtags from `content`.
///
/// Tokens are whitespace separated. A token is a tag when it starts with `#`
/// and something follows the marker; the tag value is that remainder,
/// lower-cased. Tags come back in order of appearance and repeated tags are
/// kept as separate entries, so `"#a #A #b"` yields `["a", "a", "b"]`.
pub fn extract_tags(content: &str) -> Vec<String> {
    content
        .split_whitespace()
        .filter_map(|token| token.strip_prefix(TAG_MARKER))
        .filter(|rest| !rest.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_in_order_and_lowercases() {
        let tags = extract_tags("Morning run #Fitness then coffee #Coffee");
        assert_eq!(tags, vec!["fitness", "coffee"]);
    }

    #[test]
    fn test_keeps_duplicates() {
        assert_eq!(extract_tags("#a #a #b"), vec!["a", "a", "b"]);
        assert_eq!(extract_tags("#Rust #rust"), vec!["rust", "rust"]);
    }

    #[test]
    fn test_bare_marker_is_not_a_tag() {
        // "##" strips one marker and keeps the second as the tag value
        assert_eq!(extract_tags("# alone and ## double"), vec!["#"]);
        assert_eq!(extract_tags("just a # sign"), Vec::<String>::new());
    }

    #[test]
    fn test_marker_must_lead_the_token() {
        assert!(extract_tags("mid#word email@x.com").is_empty());
    }

    #[test]
    fn test_non_ascii_tags() {
        assert_eq!(extract_tags("Тестовый пост #Netta #тест"), vec!["netta", "тест"]);
    }

    #[test]
    fn test_empty_content() {
        assert!(extract_tags("").is_empty());
        assert!(extract_tags("   \n\t ").is_empty());
    }
}
