//! Indentation and newline detection
//!
//! A weighted vote over per-line indentation deltas picks the dominant
//! indentation unit, and a terminator tally picks the dominant newline.
//! Changes in leading-whitespace depth are the signal: a file indented in
//! four-space steps produces repeated deltas of four, and lines that hold a
//! depth add weight to whichever delta reached it.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::style::{DetectError, FormatStyle, IndentKind};
use crate::style::Newline;

// Leading run of spaces or of tabs, never a mix; trailing alignment spaces
// after tabs stay out of the run. Group 1 participates only for spaces.
static INDENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:( )+|\t+)").expect("indent pattern is a compile-time constant and must be valid")
});

// Alternation is leftmost-first, so a CRLF pair is consumed whole and its
// halves are never also counted as lone terminators.
static NEWLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r\n|\n|\r").expect("newline pattern is a compile-time constant and must be valid")
});

/// Bucket identity for one observed indentation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndentKey {
    kind: IndentKind,
    width: usize,
}

/// Evidence accumulated for one [`IndentKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndentStat {
    /// Lines that contributed to this key, by delta or by repeat
    used_count: usize,
    /// Consecutive lines that repeated a depth this key reached
    weight: usize,
}

/// Accumulate per-key statistics over the text's indentation changes.
///
/// The returned pairs are in first-seen order. That order is part of the
/// contract: the vote keeps the earlier key on a full tie, so the
/// accumulator must preserve it.
fn tally_indents(text: &str) -> Vec<(IndentKey, IndentStat)> {
    let mut indents: Vec<(IndentKey, IndentStat)> = Vec::new();

    // Depth and kind of the previous non-blank line
    let mut previous_size = 0usize;
    let mut previous_kind: Option<IndentKind> = None;

    // Entry the last nonzero delta selected; repeat lines reinforce it
    let mut active: Option<usize> = None;

    for line in NEWLINE_PATTERN.split(text) {
        if line.is_empty() {
            // Blank lines feed no statistics and reset nothing
            continue;
        }

        let caps = match INDENT_PATTERN.captures(line) {
            Some(caps) => caps,
            None => {
                previous_size = 0;
                previous_kind = None;
                continue;
            }
        };

        let indent = caps[0].len();
        let kind = if caps.get(1).is_some() {
            IndentKind::Space
        } else {
            IndentKind::Tab
        };

        // Tab and space run lengths are not commensurable; a kind change
        // starts depth accounting over.
        if previous_kind != Some(kind) {
            previous_size = 0;
        }
        previous_kind = Some(kind);

        let delta = indent as i64 - previous_size as i64;
        previous_size = indent;

        if delta == 0 {
            // Same depth as the previous line: corroborate whichever key
            // reached this depth. A repeat can only follow some nonzero
            // delta, so an active entry exists whenever this branch runs.
            if let Some(idx) = active {
                let stat = &mut indents[idx].1;
                stat.used_count += 1;
                stat.weight += 1;
            }
        } else {
            let key = IndentKey {
                kind,
                width: delta.unsigned_abs() as usize,
            };
            match indents.iter().position(|(k, _)| *k == key) {
                Some(idx) => {
                    indents[idx].1.used_count += 1;
                    active = Some(idx);
                }
                None => {
                    indents.push((key, IndentStat { used_count: 1, weight: 0 }));
                    active = Some(indents.len() - 1);
                }
            }
        }
    }

    indents
}

/// Pick the winning key: highest `used_count`, then highest `weight`.
///
/// The comparison is strict, so on a full tie the earlier-seen key stands.
fn most_used(indents: &[(IndentKey, IndentStat)]) -> Option<IndentKey> {
    let mut winner = None;
    let mut max_used = 0;
    let mut max_weight = 0;

    for (key, stat) in indents {
        if stat.used_count > max_used || (stat.used_count == max_used && stat.weight > max_weight) {
            max_used = stat.used_count;
            max_weight = stat.weight;
            winner = Some(*key);
        }
    }

    winner
}

/// Most frequent line terminator; a tie goes to the sequence whose first
/// occurrence appears earliest. `None` when the text has no line breaks.
fn dominant_newline(text: &str) -> Option<Newline> {
    let mut counts: Vec<(Newline, usize)> = Vec::new();

    for m in NEWLINE_PATTERN.find_iter(text) {
        let newline = match m.as_str() {
            "\r\n" => Newline::CrLf,
            "\r" => Newline::Cr,
            _ => Newline::Lf,
        };
        match counts.iter_mut().find(|(n, _)| *n == newline) {
            Some((_, count)) => *count += 1,
            None => counts.push((newline, 1)),
        }
    }

    let mut winner = None;
    let mut max = 0;
    for (newline, count) in counts {
        if count > max {
            max = count;
            winner = Some(newline);
        }
    }
    winner
}

/// Infer the dominant indentation and newline conventions of `text`.
///
/// One synchronous pass, no I/O, no retained state; calling it twice on the
/// same text yields identical results, and concurrent calls are safe. Text
/// with no usable evidence yields an empty [`FormatStyle`], never an error.
pub fn detect(text: &str) -> FormatStyle {
    let indents = tally_indents(text);
    let newline = dominant_newline(text);

    match most_used(&indents) {
        Some(key) => FormatStyle {
            amount: key.width,
            kind: Some(key.kind),
            indent: key.kind.as_char().to_string().repeat(key.width),
            newline,
        },
        None => FormatStyle {
            newline,
            ..FormatStyle::default()
        },
    }
}

/// Run [`detect`] over raw bytes, which must be UTF-8 text.
pub fn detect_bytes(data: &[u8]) -> Result<FormatStyle, DetectError> {
    let text = std::str::from_utf8(data).map_err(|_| DetectError::NotText)?;
    Ok(detect(text))
}

/// Read `path` as UTF-8 text and run [`detect`] on it.
///
/// Open and decode failures both surface as [`DetectError::Read`] with the
/// underlying cause preserved.
pub fn detect_file(path: &Path) -> Result<FormatStyle, DetectError> {
    let text = fs::read_to_string(path).map_err(|source| DetectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(detect(&text))
}

/// Probe candidate files in priority order and return the first non-empty
/// detection.
///
/// Unreadable candidates count as "no result from this candidate", not as
/// failures; when every candidate is missing or empty the returned style is
/// empty and the caller's fallbacks apply.
pub fn detect_first<I, P>(paths: I) -> FormatStyle
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for path in paths {
        let path = path.as_ref();
        match detect_file(path) {
            Ok(style) if !style.is_empty() => {
                debug!("Formatting detected from {}", path.display());
                return style;
            }
            Ok(_) => {}
            Err(err) => {
                debug!("Formatting probe skipped {}: {}", path.display(), err);
            }
        }
    }
    FormatStyle::default()
}
