/// Finds the first `marker [ID]` in `error` and returns the trimmed `ID`.
///
/// An empty marker accepts any bracketed identifier. Empty brackets never match.
pub(crate) fn bracketed_id<'a>(error: &'a str, marker: &str) -> Option<&'a str> {
    let mut rest = error;
    loop {
        let after = if marker.is_empty() {
            let pos = rest.find('[')?;
            &rest[pos..]
        } else {
            let pos = rest.find(marker)?;
            &rest[pos + marker.len()..]
        };

        if let Some(id) = leading_bracket(after) {
            return Some(id);
        }

        rest = if marker.is_empty() { &after[1..] } else { after };
    }
}

fn leading_bracket(s: &str) -> Option<&str> {
    let inner = s.trim_start().strip_prefix('[')?;
    let end = inner.find(']')?;
    let id = inner[..end].trim();
    (!id.is_empty()).then_some(id)
}
