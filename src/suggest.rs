// ==============================================================================
// "Did You Mean" Suggestions
// ==============================================================================
//
// Edit-distance helpers used by the catalog loader (unknown type names in field
// declarations) and the CLI (unknown `--root` names).

/// Compute the Levenshtein edit distance between two strings.
///
/// Uses the standard dynamic programming algorithm with a two-row buffer.
/// Type names are short, so nothing cleverer is needed.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr_row[j + 1] = (prev_row[j] + cost) // substitution
                .min(prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1); // insertion
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b_len]
}

/// Maximum edit distance for a suggestion to be considered "close enough".
///
/// Short names (length <= 4) only tolerate a single edit, to keep noise down.
pub(crate) fn max_edit_distance(name_len: usize) -> usize {
    if name_len <= 4 { 1 } else { 2 }
}

/// Candidates within the edit-distance threshold of `name`, closest first.
/// Ties keep candidate order. At most three suggestions are returned.
///
/// Candidates are also compared on their simple name, so `Ordr` suggests
/// `shop.Order`.
pub(crate) fn similar_names<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let limit = max_edit_distance(name.chars().count());
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter(|candidate| *candidate != name)
        .filter_map(|candidate| {
            let full = levenshtein(name, candidate);
            let simple = levenshtein(name, crate::model::catalog::simple_name_of(candidate));
            let distance = full.min(simple);
            (distance <= limit).then_some((distance, candidate))
        })
        .collect();
    scored.sort_by_key(|(distance, _)| *distance);
    scored
        .into_iter()
        .take(3)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
