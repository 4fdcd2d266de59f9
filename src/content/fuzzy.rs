//! Subsequence matching for interactive filtering and index search

/// True if every character of `pattern` occurs in `candidate` in the same
/// order, not necessarily contiguous. Case-insensitive; an empty pattern
/// always matches. No score is produced.
pub fn fuzzy_match(candidate: &str, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let mut wanted = pattern.chars().peekable();

    for c in candidate.to_lowercase().chars() {
        match wanted.peek() {
            None => return true,
            Some(&p) if p == c => {
                wanted.next();
            }
            Some(_) => {}
        }
    }

    wanted.peek().is_none()
}
