//! Line-level comparison of an expected file with a fixed one.
use difference::{Changeset, Difference};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeltaKind {
    Change,
    Delete,
    Insert,
}

/// One contiguous run of differing lines. `position` is the 0-based index of
/// the first affected line in the expected text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDelta {
    pub position: usize,
    pub source_lines: Vec<String>,
    pub target_lines: Vec<String>,
}

impl ChangeDelta {
    pub fn kind(&self) -> DeltaKind {
        match (self.source_lines.is_empty(), self.target_lines.is_empty()) {
            (false, false) => DeltaKind::Change,
            (false, true) => DeltaKind::Delete,
            _ => DeltaKind::Insert,
        }
    }
}

impl fmt::Display for ChangeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind() {
            DeltaKind::Change => "ChangeDelta",
            DeltaKind::Delete => "DeleteDelta",
            DeltaKind::Insert => "InsertDelta",
        };
        write!(f, "{label}, position {}, lines:", self.position)?;
        let rows = self.source_lines.len().max(self.target_lines.len());
        for row in 0..rows {
            if row > 0 {
                f.write_str("\n")?;
            }
            if let Some(old) = self.source_lines.get(row) {
                write!(f, "\n-{old}")?;
            }
            if let Some(new) = self.target_lines.get(row) {
                write!(f, "\n+{new}")?;
            }
        }
        Ok(())
    }
}

/// Ordered deltas turning `expected` into `actual`; empty iff they are equal.
pub fn diff_lines(expected: &[String], actual: &[String]) -> Vec<ChangeDelta> {
    if expected == actual {
        return Vec::new();
    }
    if expected.is_empty() || actual.is_empty() {
        return vec![ChangeDelta {
            position: 0,
            source_lines: expected.to_vec(),
            target_lines: actual.to_vec(),
        }];
    }
    let mut ops = line_ops(expected, actual);
    slide_into_changes(&mut ops);

    let mut deltas = Vec::new();
    let mut position = 0;
    let mut pending: Option<ChangeDelta> = None;
    for (op, line) in ops {
        match op {
            LineOp::Same => {
                if let Some(delta) = pending.take() {
                    position += delta.source_lines.len();
                    deltas.push(delta);
                }
                position += 1;
            }
            LineOp::Remove => pending
                .get_or_insert_with(|| empty_delta(position))
                .source_lines
                .push(line),
            LineOp::Add => pending
                .get_or_insert_with(|| empty_delta(position))
                .target_lines
                .push(line),
        }
    }
    deltas.extend(pending);
    deltas
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOp {
    Same,
    Remove,
    Add,
}

/// One op per line. Lines are prefixed before joining so an empty line never
/// becomes an empty chunk the changeset could merge away.
fn line_ops(expected: &[String], actual: &[String]) -> Vec<(LineOp, String)> {
    let join = |lines: &[String]| {
        lines
            .iter()
            .map(|line| format!("{LINE_PREFIX}{line}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let changeset = Changeset::new(&join(expected), &join(actual), "\n");
    let mut ops = Vec::with_capacity(expected.len().max(actual.len()));
    for item in &changeset.diffs {
        let (op, text) = match item {
            Difference::Same(text) => (LineOp::Same, text),
            Difference::Rem(text) => (LineOp::Remove, text),
            Difference::Add(text) => (LineOp::Add, text),
        };
        ops.extend(text.split('\n').map(|line| {
            let line = line.strip_prefix(LINE_PREFIX).unwrap_or(line);
            (op, line.to_string())
        }));
    }
    ops
}

const LINE_PREFIX: char = '|';

/// Slide single-line insertions and removals across an identical unchanged
/// line so they join a neighbouring change. Both alignments describe the same
/// edit; this one keeps a changed line among repeated lines in one delta.
fn slide_into_changes(ops: &mut [(LineOp, String)]) {
    let is_change = |op: LineOp| op != LineOp::Same;
    for _ in 0..ops.len() {
        let mut moved = false;
        for index in 0..ops.len().saturating_sub(1) {
            let (current, next) = (&ops[index], &ops[index + 1]);
            if current.1 != next.1 {
                continue;
            }
            let before = index.checked_sub(1).map(|prev| ops[prev].0);
            let after = ops.get(index + 2).map(|op| op.0);
            // Same(t) Rem/Add(t) after a change: pull the edit left.
            let pull_left = current.0 == LineOp::Same
                && is_change(next.0)
                && before.is_some_and(is_change);
            // Rem/Add(t) Same(t) before a change, not already joined on the left.
            let push_right = is_change(current.0)
                && next.0 == LineOp::Same
                && after.is_some_and(is_change)
                && !before.is_some_and(is_change);
            if pull_left || push_right {
                ops.swap(index, index + 1);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

/// Human-readable rendering of all deltas, one block per delta.
pub fn format_deltas(deltas: &[ChangeDelta]) -> String {
    deltas
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn empty_delta(position: usize) -> ChangeDelta {
    ChangeDelta {
        position,
        source_lines: Vec::new(),
        target_lines: Vec::new(),
    }
}
