//! Line-level comparison of two canonical texts.

use std::collections::HashMap;
use std::fmt::Write;

/// Largest differing region, in old lines times new lines, that is aligned
/// with the full LCS table. Beyond it lines are matched by count only.
pub const MAX_ALIGNMENT_CELLS: usize = 4_000_000;

/// Lines that disappeared from and appeared in a page between two
/// observations, in alignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Keep,
    Remove(usize),
    Add(usize),
}

impl LineDiff {
    /// Align `old` and `new` line by line using a longest common
    /// subsequence and keep only the lines unique to one side.
    ///
    /// When the region left after trimming the shared prefix and suffix is
    /// larger than [`MAX_ALIGNMENT_CELLS`], a line counts as kept if it has
    /// an unused copy anywhere on the other side. Removed lines then come
    /// first in old order, followed by added lines in new order.
    pub fn between(old: &str, new: &str) -> Self {
        let old_lines: Vec<&str> = old.lines().collect();
        let new_lines: Vec<&str> = new.lines().collect();

        let mut diff = LineDiff::default();
        for edit in edit_script(&old_lines, &new_lines) {
            match edit {
                Edit::Keep => {}
                Edit::Remove(i) => diff.removed.push(old_lines[i].to_string()),
                Edit::Add(j) => diff.added.push(new_lines[j].to_string()),
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Render the report with each group cut to `max_lines` entries.
    pub fn render(&self, max_lines: usize) -> String {
        let mut out = String::new();
        render_group(&mut out, "Removed", &self.removed, '-', max_lines);
        render_group(&mut out, "Added", &self.added, '+', max_lines);
        out
    }
}

fn render_group(out: &mut String, label: &str, lines: &[String], prefix: char, max_lines: usize) {
    if lines.is_empty() {
        return;
    }

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}:", label);
    for line in lines.iter().take(max_lines) {
        let _ = writeln!(out, "  {} {}", prefix, line);
    }
    if lines.len() > max_lines {
        let _ = writeln!(out, "  ... ({} more)", lines.len() - max_lines);
    }
}

/// Forward edit script between two line sequences.
///
/// The shared prefix and suffix are peeled off before filling the LCS table
/// so that small edits to large pages stay cheap. The table is only built
/// when the remaining region fits in [`MAX_ALIGNMENT_CELLS`].
fn edit_script(old: &[&str], new: &[&str]) -> Vec<Edit> {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    let (n, m) = (old_mid.len(), new_mid.len());

    let mut script = vec![Edit::Keep; prefix];
    if n.saturating_mul(m) > MAX_ALIGNMENT_CELLS {
        script.extend(unmatched_lines(old_mid, new_mid, prefix));
    } else {
        script.extend(aligned_lines(old_mid, new_mid, prefix));
    }
    script.extend(std::iter::repeat(Edit::Keep).take(suffix));
    script
}

fn aligned_lines(old_mid: &[&str], new_mid: &[&str], offset: usize) -> Vec<Edit> {
    let (n, m) = (old_mid.len(), new_mid.len());

    // lcs[i][j] = length of the LCS of old_mid[i..] and new_mid[j..]
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old_mid[i] == new_mid[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut script = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old_mid[i] == new_mid[j] {
            script.push(Edit::Keep);
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            script.push(Edit::Remove(offset + i));
            i += 1;
        } else {
            script.push(Edit::Add(offset + j));
            j += 1;
        }
    }
    script.extend((i..n).map(|i| Edit::Remove(offset + i)));
    script.extend((j..m).map(|j| Edit::Add(offset + j)));
    script
}

/// Linear-space fallback: pair lines by value regardless of position.
fn unmatched_lines(old_mid: &[&str], new_mid: &[&str], offset: usize) -> Vec<Edit> {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for line in new_mid {
        *available.entry(*line).or_insert(0) += 1;
    }

    let mut script = Vec::with_capacity(old_mid.len() + new_mid.len());
    for (i, line) in old_mid.iter().enumerate() {
        match available.get_mut(line) {
            Some(count) if *count > 0 => {
                *count -= 1;
                script.push(Edit::Keep);
            }
            _ => script.push(Edit::Remove(offset + i)),
        }
    }

    let mut surplus: HashMap<&str, usize> = HashMap::new();
    for line in old_mid {
        *surplus.entry(*line).or_insert(0) += 1;
    }
    for (j, line) in new_mid.iter().enumerate() {
        match surplus.get_mut(line) {
            Some(count) if *count > 0 => *count -= 1,
            _ => script.push(Edit::Add(offset + j)),
        }
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_only_lines_unique_to_each_side() {
        let diff = LineDiff::between("A\nB\nC", "A\nC\nD");
        assert_eq!(diff.removed, vec!["B"]);
        assert_eq!(diff.added, vec!["D"]);
    }

    #[test]
    fn identical_texts_have_no_diff() {
        let diff = LineDiff::between("A\nB", "A\nB");
        assert!(diff.is_empty());
        assert_eq!(diff.render(10), "");
    }

    #[test]
    fn empty_old_side_adds_everything() {
        let diff = LineDiff::between("", "A\nB\nC");
        assert!(diff.removed.is_empty());
        assert_eq!(diff.added, vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_new_side_removes_everything() {
        let diff = LineDiff::between("A\nB", "");
        assert_eq!(diff.removed, vec!["A", "B"]);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn order_follows_the_alignment() {
        let old = "Status\nAPI: Operational\nWeb: Operational\nFooter";
        let new = "Status\nAPI: Outage\nWeb: Degraded\nFooter";
        let diff = LineDiff::between(old, new);
        assert_eq!(diff.removed, vec!["API: Operational", "Web: Operational"]);
        assert_eq!(diff.added, vec!["API: Outage", "Web: Degraded"]);
    }

    #[test]
    fn duplicate_lines_are_counted() {
        let diff = LineDiff::between("ok\nok", "ok\nok\nok");
        assert!(diff.removed.is_empty());
        assert_eq!(diff.added, vec!["ok"]);
    }

    #[test]
    fn renders_labelled_groups() {
        let diff = LineDiff::between("A\nB\nC", "A\nC\nD");
        assert_eq!(diff.render(40), "Removed:\n  - B\nAdded:\n  + D\n");
    }

    #[test]
    fn omits_empty_groups() {
        let diff = LineDiff::between("A", "A\nB");
        assert_eq!(diff.render(40), "Added:\n  + B\n");
    }

    #[test]
    fn truncates_each_group_independently() {
        let new = (0..100).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let diff = LineDiff::between("", &new);
        assert_eq!(diff.added.len(), 100);

        let rendered = diff.render(10);
        let shown = rendered.lines().filter(|l| l.starts_with("  + ")).count();
        assert_eq!(shown, 10);
        assert!(rendered.starts_with("Added:\n  + line 0\n"));
        assert!(rendered.ends_with("  + line 9\n  ... (90 more)\n"));
    }

    /// Two swapped lines followed by `filler` lines unique to each side, so
    /// nothing is trimmed and the region is `(filler + 2)` squared cells.
    fn swapped_pair_with_filler(filler: usize) -> (String, String) {
        let old = ["A".to_string(), "B".to_string()]
            .into_iter()
            .chain((0..filler).map(|i| format!("old {i}")))
            .collect::<Vec<_>>()
            .join("\n");
        let new = ["B".to_string(), "A".to_string()]
            .into_iter()
            .chain((0..filler).map(|i| format!("new {i}")))
            .collect::<Vec<_>>()
            .join("\n");
        (old, new)
    }

    #[test]
    fn aligns_by_position_up_to_the_cell_limit() {
        assert_eq!(2000 * 2000, MAX_ALIGNMENT_CELLS);
        let (old, new) = swapped_pair_with_filler(1998);
        let diff = LineDiff::between(&old, &new);

        // Only one of the swapped pair can stay aligned.
        assert_eq!(diff.removed.len(), 1999);
        assert_eq!(diff.added.len(), 1999);
        assert_eq!(diff.removed[0], "A");
        assert_eq!(diff.added[0], "A");
    }

    #[test]
    fn matches_by_count_past_the_cell_limit() {
        let (old, new) = swapped_pair_with_filler(1999);
        let diff = LineDiff::between(&old, &new);

        assert_eq!(diff.removed.len(), 1999);
        assert_eq!(diff.added.len(), 1999);
        assert_eq!(diff.removed[0], "old 0");
        assert_eq!(diff.added[0], "new 0");
        assert!(!diff.removed.iter().any(|l| l == "A" || l == "B"));
        assert!(!diff.added.iter().any(|l| l == "A" || l == "B"));
    }

    #[test]
    fn large_rewrites_keep_duplicate_counts() {
        let old = (0..3000).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let new = (0..3000)
            .map(|i| format!("cell {i}"))
            .chain(["row 0".to_string(), "row 0".to_string()])
            .collect::<Vec<_>>()
            .join("\n");
        let diff = LineDiff::between(&old, &new);

        assert_eq!(diff.removed.len(), 2999);
        assert_eq!(diff.removed[0], "row 1");
        assert_eq!(diff.added.len(), 3001);
        assert_eq!(diff.added.last().map(String::as_str), Some("row 0"));
    }

    #[test]
    fn no_summary_when_within_limit() {
        let diff = LineDiff::between("A\nB", "C\nD");
        let rendered = diff.render(2);
        assert!(!rendered.contains("more"));
    }
}
