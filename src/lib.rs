//! # emx-pkgmerge
//!
//! Style-preserving merging for npm `package.json` files.
//!
//! The core is a formatting detector: it infers the dominant indentation
//! convention (space or tab, and the unit width) and the dominant line
//! terminator of a text, so a merged document can be re-serialized in the
//! visual style of its source file. Around it sit a compact three-way JSON
//! merge and the glue that plugs both into `git merge` as a merge driver.
//!
//! ## Detection heuristic
//!
//! Indentation is a vote over per-line depth changes. Every change
//! ("delta") counts toward the (kind, width) bucket it exhibits, and a run
//! of lines holding one depth adds weight to the bucket that reached it:
//!
//! ```text
//! {                    no indentation
//!     "a": 1,          delta +4  -> (space, 4)
//!     "b": {           repeat    -> weight for (space, 4)
//!         "c": 2       delta +4  -> (space, 4)
//!     }                delta -4  -> (space, 4)
//! }
//! ```
//!
//! The most used bucket wins; ties fall to weight, then to first
//! appearance. Line terminators are tallied over the whole text (a `\r\n`
//! pair counts once, never as `\r` plus `\n`) and the most frequent one
//! wins.
//!
//! ## Example
//!
//! ```rust
//! use emx_pkgmerge::{detect, IndentKind, Newline};
//!
//! let style = detect("{\n\t\"a\": 1,\n\t\"b\": 2\n}\n");
//! assert_eq!(style.kind, Some(IndentKind::Tab));
//! assert_eq!(style.amount, 1);
//! assert_eq!(style.indent, "\t");
//! assert_eq!(style.newline, Some(Newline::Lf));
//! ```
//!
//! ## Merging
//!
//! [`merge`] folds local and remote changes onto their common ancestor.
//! Agreement and one-sided changes resolve structurally, competing root
//! `version` fields take the higher version, and everything else follows
//! the configured [`ConflictResolution`]. [`StyleWriter`] then writes the
//! result back in the detected style.

pub mod style;
pub mod detect;
pub mod writer;
pub mod merge;
pub mod driver;

pub use style::{
    DetectError, FormatStyle, IndentKind, Newline, DEFAULT_INDENT, DEFAULT_NEWLINE,
};
pub use detect::{detect, detect_bytes, detect_file, detect_first};
pub use writer::StyleWriter;
pub use merge::{merge, Conflict, ConflictResolution, MergeOptions, MergeOutcome};
pub use driver::{ConfigScope, DriverError};
