//! Display path codec
//!
//! Display paths are the `/`-separated, human-facing names used for shell
//! completion and navigation ("by Genre/Jazz/Kind of Blue"). A literal `/`
//! inside a name is written `%2F` and a literal `:` is written `%3A`, so a
//! raw `/` is always a separator. `%` itself is written `%25`, which keeps
//! [`unescape`] an exact inverse of [`escape`] for every input.
//!
//! Round-trip law: `parse(&build(s)) == s` for any segment list without
//! empty strings. The other direction only holds up to normalization:
//! `build(&parse(p))` drops empty segments (leading, trailing and doubled
//! slashes) and re-escapes each name canonically, so it equals `p` only when
//! `p` was already in that form.

/// Escape a single name for use as a path segment
pub fn escape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]; unknown `%` sequences are left as they are
pub fn unescape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(..3) {
            Some(seq) if seq.eq_ignore_ascii_case("%2F") => Some('/'),
            Some(seq) if seq.eq_ignore_ascii_case("%3A") => Some(':'),
            Some("%25") => Some('%'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split a display path into unescaped segments, dropping empty ones
pub fn parse(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(unescape)
        .collect()
}

/// Escape each segment and join with `/`
pub fn build<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| escape(s.as_ref()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Append a child name to an escaped parent path
pub fn join(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        escape(name)
    } else {
        format!("{}/{}", parent, escape(name))
    }
}

/// Split text typed at a completion prompt into the parent path to browse and
/// the partial name to filter by.
///
/// `"by Genre/"` browses into "by Genre" with no filter, `"by Genre/Ja"`
/// filters the children of "by Genre" by "Ja". The parent keeps its escaping.
pub fn split_partial(input: &str) -> (&str, String) {
    match input.rfind('/') {
        Some(pos) => (&input[..pos], unescape(&input[pos + 1..])),
        None => ("", unescape(input)),
    }
}
