//! `Link` header parsing for Canvas pagination.

/// Extract the `rel="next"` target from a `Link` header value.
///
/// Canvas sends several comma-separated links (`current`, `next`, `prev`,
/// `first`, `last`); only `next` matters for walking a collection.
#[must_use]
pub fn parse_next(header: &str) -> Option<&str> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_ascii_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        (is_next && !target.is_empty()).then_some(target)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canvas_style_header() {
        let header = "<https://canvas.example.edu/api/v1/courses?page=1&per_page=100>; rel=\"current\",\
                      <https://canvas.example.edu/api/v1/courses?page=2&per_page=100>; rel=\"next\",\
                      <https://canvas.example.edu/api/v1/courses?page=1&per_page=100>; rel=\"first\",\
                      <https://canvas.example.edu/api/v1/courses?page=3&per_page=100>; rel=\"last\"";
        assert_eq!(
            parse_next(header),
            Some("https://canvas.example.edu/api/v1/courses?page=2&per_page=100")
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let header = "<https://c.example/api/v1/x?page=3>; rel=\"current\", \
                      <https://c.example/api/v1/x?page=1>; rel=\"first\", \
                      <https://c.example/api/v1/x?page=3>; rel=\"last\"";
        assert_eq!(parse_next(header), None);
    }

    #[test]
    fn test_unquoted_and_multi_rel() {
        assert_eq!(parse_next("<https://a/b?page=2>; rel=next"), Some("https://a/b?page=2"));
        assert_eq!(
            parse_next("<https://a/b?page=2>; rel=\"next last\""),
            Some("https://a/b?page=2")
        );
        assert_eq!(parse_next("https://a/b?page=2; rel=\"next\""), None);
        assert_eq!(parse_next(""), None);
    }

    proptest! {
        #[test]
        fn next_link_is_found_among_others(page in 2u32..10_000, before in 0usize..3, after in 0usize..3) {
            let next = format!("https://canvas.example.edu/api/v1/courses/1/modules?page={page}");
            let mut links: Vec<String> = (0..before)
                .map(|i| format!("<https://canvas.example.edu/p{i}>; rel=\"prev\""))
                .collect();
            links.push(format!("<{next}>; rel=\"next\""));
            links.extend((0..after).map(|i| format!("<https://canvas.example.edu/l{i}>; rel=\"last\"")));

            let header = links.join(",");
            prop_assert_eq!(parse_next(&header), Some(next.as_str()));
        }
    }
}
