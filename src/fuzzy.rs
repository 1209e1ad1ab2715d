//! Subsequence scoring for fuzzy lookups.

/// Score `candidate` against `query`. Returns `None` when the query's
/// characters do not all appear in order. Higher is better.
///
/// Matching is case-insensitive. Consecutive matches, matches at the start,
/// and matches right after a hierarchy separator (`.`, `-`, `_`, space) earn
/// bonuses; gaps cost one point each.
pub fn score(query: &str, candidate: &str) -> Option<i64> {
    let query: Vec<char> = query.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    if query.is_empty() {
        return Some(0);
    }
    let candidate: Vec<char> = candidate.to_lowercase().chars().collect();

    let mut total = 0i64;
    let mut qi = 0;
    let mut last_match: Option<usize> = None;

    for (ci, &c) in candidate.iter().enumerate() {
        if qi == query.len() {
            break;
        }
        if c != query[qi] {
            continue;
        }
        total += 1;
        if ci == 0 {
            total += 8;
        } else if matches!(candidate[ci - 1], '.' | '-' | '_' | ' ') {
            total += 2;
        }
        match last_match {
            Some(prev) if prev + 1 == ci => total += 8,
            Some(prev) => total -= (ci - prev - 1) as i64,
            None => {}
        }
        last_match = Some(ci);
        qi += 1;
    }

    (qi == query.len()).then_some(total)
}
