//! Text primitives shared by the recipe, tag, and env-file layers.

/// Replace every occurrence of `from` with `to`, returning the new content and
/// the replacement count.
pub fn replace_token(content: &str, from: &str, to: &str) -> (String, usize) {
    let count = content.matches(from).count();
    (content.replace(from, to), count)
}

/// Parse output into non-empty lines.
pub fn lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|line| !line.is_empty())
}

/// Split a combined `owner/repo` slug. Returns None unless both parts are
/// non-empty and there is exactly one separator.
pub fn split_slug(slug: &str) -> Option<(&str, &str)> {
    let (owner, repo) = slug.split_once('/')?;
    let owner = owner.trim();
    let repo = repo.trim();
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_token_counts_replacements() {
        let (out, count) = replace_token("2025.7 and 2025.7", "2025.7", "2025.8");
        assert_eq!(out, "2025.8 and 2025.8");
        assert_eq!(count, 2);
    }

    #[test]
    fn replace_token_no_match_is_zero() {
        let (out, count) = replace_token("unchanged", "2025.7", "2025.8");
        assert_eq!(out, "unchanged");
        assert_eq!(count, 0);
    }

    #[test]
    fn lines_filters_empty() {
        let output = "line1\n\nline2\n";
        let result: Vec<&str> = lines(output).collect();
        assert_eq!(result, vec!["line1", "line2"]);
    }

    #[test]
    fn split_slug_accepts_owner_repo() {
        assert_eq!(split_slug("acme/widgets"), Some(("acme", "widgets")));
    }

    #[test]
    fn split_slug_rejects_extra_segments() {
        assert_eq!(split_slug("acme/widgets/extra"), None);
        assert_eq!(split_slug("no-separator"), None);
        assert_eq!(split_slug("/repo"), None);
        assert_eq!(split_slug("owner/"), None);
    }
}
