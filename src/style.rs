//! Formatting style data structures

use std::path::PathBuf;

// Fallbacks for absent findings (npm itself writes two-space, LF files)
pub const DEFAULT_INDENT: &str = "  ";
pub const DEFAULT_NEWLINE: &str = "\n";

/// Character class used for indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentKind {
    /// Space-indented
    Space,
    /// Tab-indented
    Tab,
}

impl IndentKind {
    /// The character this kind indents with
    pub fn as_char(&self) -> char {
        match self {
            IndentKind::Space => ' ',
            IndentKind::Tab => '\t',
        }
    }

    /// Lowercase name, e.g. for log and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            IndentKind::Space => "space",
            IndentKind::Tab => "tab",
        }
    }
}

/// Line terminator convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl Newline {
    /// The literal terminator sequence
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
            Newline::Cr => "\r",
        }
    }

    /// Lowercase name, e.g. for log and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            Newline::Lf => "lf",
            Newline::CrLf => "crlf",
            Newline::Cr => "cr",
        }
    }
}

/// Detected formatting conventions of a text
///
/// Produced by the detector, consumed by the writer to re-serialize a
/// modified document in the source file's visual style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatStyle {
    /// Width of one indentation step (0 when no indentation was found)
    pub amount: usize,
    /// Indentation character class (`None` when no indentation was found)
    pub kind: Option<IndentKind>,
    /// One indentation step: `amount` repetitions of the kind's character
    pub indent: String,
    /// Dominant line terminator (`None` when the text has no line breaks)
    pub newline: Option<Newline>,
}

impl FormatStyle {
    /// True when neither indentation nor a line terminator was detected
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.newline.is_none()
    }

    /// Indent unit to write with, falling back to [`DEFAULT_INDENT`]
    pub fn indent_or_default(&self) -> &str {
        if self.indent.is_empty() {
            DEFAULT_INDENT
        } else {
            &self.indent
        }
    }

    /// Line terminator to write with, falling back to [`DEFAULT_NEWLINE`]
    pub fn newline_or_default(&self) -> &str {
        match self.newline {
            Some(newline) => newline.as_str(),
            None => DEFAULT_NEWLINE,
        }
    }
}

/// Error type for text acquisition ahead of detection
///
/// Detection over `&str` cannot fail; these arise when raw bytes or a file
/// cannot be turned into text first.
#[derive(Debug)]
pub enum DetectError {
    /// Input is not valid UTF-8 text
    NotText,
    /// The file could not be read as UTF-8 text
    Read {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

impl std::fmt::Display for DetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectError::NotText => write!(f, "input is not valid UTF-8 text"),
            DetectError::Read { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for DetectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DetectError::Read { source, .. } => Some(source),
            DetectError::NotText => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_style_falls_back_to_defaults() {
        let style = FormatStyle::default();
        assert!(style.is_empty());
        assert_eq!(style.indent_or_default(), DEFAULT_INDENT);
        assert_eq!(style.newline_or_default(), DEFAULT_NEWLINE);
    }

    #[test]
    fn test_detected_style_wins_over_defaults() {
        let style = FormatStyle {
            amount: 4,
            kind: Some(IndentKind::Space),
            indent: "    ".to_string(),
            newline: Some(Newline::CrLf),
        };
        assert!(!style.is_empty());
        assert_eq!(style.indent_or_default(), "    ");
        assert_eq!(style.newline_or_default(), "\r\n");
    }

    #[test]
    fn test_newline_only_style_is_not_empty() {
        let style = FormatStyle {
            newline: Some(Newline::Lf),
            ..Default::default()
        };
        assert!(!style.is_empty());
        assert_eq!(style.indent_or_default(), DEFAULT_INDENT);
    }

    #[test]
    fn test_newline_literals() {
        assert_eq!(Newline::Lf.as_str(), "\n");
        assert_eq!(Newline::CrLf.as_str(), "\r\n");
        assert_eq!(Newline::Cr.as_str(), "\r");
    }
}
