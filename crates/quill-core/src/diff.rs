//! Line-level unified diff between two line sequences.
//!
//! The diff is computed from a longest-common-subsequence edit script
//! and rendered in unified format with three lines of context, so every
//! evolution leaves a byte-reproducible audit trail. [`patch`] re-applies
//! a diff and is the inverse of [`unified`].

/// Context lines around each hunk.
const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

/// One step of the edit script. The cursors are the positions in `a`
/// and `b` before the step consumes its line(s).
#[derive(Debug, Clone, Copy)]
struct Edit {
    tag: Tag,
    a_cursor: usize,
    b_cursor: usize,
}

/// Compute an LCS edit script between two line sequences.
fn edit_script(a: &[String], b: &[String]) -> Vec<Edit> {
    let n = a.len();
    let m = b.len();

    // lcs[i][j] = length of the LCS of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut script = Vec::with_capacity(n.max(m));
    let mut i = 0;
    let mut j = 0;
    while i < n && j < m {
        if a[i] == b[j] {
            script.push(Edit {
                tag: Tag::Equal,
                a_cursor: i,
                b_cursor: j,
            });
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            script.push(Edit {
                tag: Tag::Delete,
                a_cursor: i,
                b_cursor: j,
            });
            i += 1;
        } else {
            script.push(Edit {
                tag: Tag::Insert,
                a_cursor: i,
                b_cursor: j,
            });
            j += 1;
        }
    }
    while i < n {
        script.push(Edit {
            tag: Tag::Delete,
            a_cursor: i,
            b_cursor: j,
        });
        i += 1;
    }
    while j < m {
        script.push(Edit {
            tag: Tag::Insert,
            a_cursor: i,
            b_cursor: j,
        });
        j += 1;
    }
    script
}

/// Render a unified diff between `a` (original) and `b` (evolved).
///
/// Returns an empty vec when the sequences are identical. Hunk headers
/// use the form `@@ -start,count +start,count @@` with 1-based starts
/// (0 when a side contributes no lines).
pub fn unified(a: &[String], b: &[String]) -> Vec<String> {
    let script = edit_script(a, b);
    let changes: Vec<usize> = script
        .iter()
        .enumerate()
        .filter(|(_, edit)| edit.tag != Tag::Equal)
        .map(|(idx, _)| idx)
        .collect();
    if changes.is_empty() {
        return Vec::new();
    }

    let mut out = vec!["--- original".to_string(), "+++ evolved".to_string()];

    // Group nearby changes into hunk ranges over the script
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut start = changes[0].saturating_sub(CONTEXT);
    let mut end = (changes[0] + CONTEXT + 1).min(script.len());
    for &idx in &changes[1..] {
        if idx.saturating_sub(CONTEXT) <= end {
            end = (idx + CONTEXT + 1).min(script.len());
        } else {
            ranges.push((start, end));
            start = idx.saturating_sub(CONTEXT);
            end = (idx + CONTEXT + 1).min(script.len());
        }
    }
    ranges.push((start, end));

    for (start, end) in ranges {
        let hunk = &script[start..end];
        let a_count = hunk.iter().filter(|e| e.tag != Tag::Insert).count();
        let b_count = hunk.iter().filter(|e| e.tag != Tag::Delete).count();
        let a_start = if a_count == 0 {
            hunk[0].a_cursor
        } else {
            hunk[0].a_cursor + 1
        };
        let b_start = if b_count == 0 {
            hunk[0].b_cursor
        } else {
            hunk[0].b_cursor + 1
        };
        out.push(format!("@@ -{a_start},{a_count} +{b_start},{b_count} @@"));
        for edit in hunk {
            match edit.tag {
                Tag::Equal => out.push(format!(" {}", a[edit.a_cursor])),
                Tag::Delete => out.push(format!("-{}", a[edit.a_cursor])),
                Tag::Insert => out.push(format!("+{}", b[edit.b_cursor])),
            }
        }
    }
    out
}

/// Apply a diff produced by [`unified`] back onto `original`.
///
/// Returns `None` if the diff does not match the original (out-of-range
/// hunk, context or deletion mismatch, malformed header).
pub fn patch(original: &[String], diff: &[String]) -> Option<Vec<String>> {
    if diff.is_empty() {
        return Some(original.to_vec());
    }

    let mut out = Vec::new();
    let mut cursor = 0usize;
    let mut i = 0usize;
    while i < diff.len() {
        if let Some(header) = diff[i].strip_prefix("@@ -") {
            let (a_start, a_count) = parse_range(header)?;
            let hunk_start = if a_count == 0 {
                a_start
            } else {
                a_start.checked_sub(1)?
            };
            if hunk_start < cursor || hunk_start > original.len() {
                return None;
            }
            out.extend_from_slice(&original[cursor..hunk_start]);
            cursor = hunk_start;
            i += 1;
            while i < diff.len() && !diff[i].starts_with("@@") {
                let body = &diff[i];
                if let Some(text) = body.strip_prefix(' ') {
                    if original.get(cursor)? != text {
                        return None;
                    }
                    out.push(text.to_string());
                    cursor += 1;
                } else if let Some(text) = body.strip_prefix('-') {
                    if original.get(cursor)? != text {
                        return None;
                    }
                    cursor += 1;
                } else if let Some(text) = body.strip_prefix('+') {
                    out.push(text.to_string());
                } else {
                    return None;
                }
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    out.extend_from_slice(&original[cursor..]);
    Some(out)
}

/// Parse the `-start,count` side of a hunk header.
fn parse_range(header: &str) -> Option<(usize, usize)> {
    let token = header.split_whitespace().next()?;
    let (start, count) = token.split_once(',')?;
    Some((start.parse().ok()?, count.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_sequences_produce_empty_diff() {
        let a = lines(&["# Title", "body"]);
        assert!(unified(&a, &a).is_empty());
    }

    #[test]
    fn test_single_replacement() {
        let a = lines(&["# Title", "old", "", "tail"]);
        let b = lines(&["# Title", "new", "", "tail"]);
        let diff = unified(&a, &b);

        assert_eq!(diff[0], "--- original");
        assert_eq!(diff[1], "+++ evolved");
        assert!(diff.contains(&"-old".to_string()));
        assert!(diff.contains(&"+new".to_string()));
        // Title is context, not a change
        assert!(diff.contains(&" # Title".to_string()));
    }

    #[test]
    fn test_distant_changes_get_separate_hunks() {
        let mut a: Vec<String> = (0..20).map(|n| format!("line {n}")).collect();
        let mut b = a.clone();
        a[0] = "first old".to_string();
        b[0] = "first new".to_string();
        a[19] = "last old".to_string();
        b[19] = "last new".to_string();

        let diff = unified(&a, &b);
        let hunks = diff.iter().filter(|l| l.starts_with("@@")).count();
        assert_eq!(hunks, 2);
    }

    #[test]
    fn test_patch_round_trip_replacement() {
        let a = lines(&["# Title", "old", "", "tail"]);
        let b = lines(&["# Title", "new", "", "tail"]);
        let diff = unified(&a, &b);
        assert_eq!(patch(&a, &diff), Some(b));
    }

    #[test]
    fn test_patch_round_trip_insert_and_delete() {
        let a = lines(&["one", "two", "three"]);
        let b = lines(&["one", "three", "four"]);
        let diff = unified(&a, &b);
        assert_eq!(patch(&a, &diff), Some(b));
    }

    #[test]
    fn test_patch_rejects_mismatched_original() {
        let a = lines(&["one", "two"]);
        let b = lines(&["one", "changed"]);
        let diff = unified(&a, &b);

        let other = lines(&["completely", "different"]);
        assert_eq!(patch(&other, &diff), None);
    }

    #[test]
    fn test_empty_diff_is_identity_patch() {
        let a = lines(&["one", "two"]);
        assert_eq!(patch(&a, &[]), Some(a.clone()));
    }

    proptest! {
        #[test]
        fn prop_patch_inverts_unified(
            a in proptest::collection::vec("[abc]{0,3}", 0..12),
            b in proptest::collection::vec("[abc]{0,3}", 0..12),
        ) {
            let diff = unified(&a, &b);
            prop_assert_eq!(patch(&a, &diff), Some(b));
        }
    }
}
