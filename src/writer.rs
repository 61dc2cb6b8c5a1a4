//! Style-preserving JSON serialization

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use crate::style::FormatStyle;

/// Serializes JSON documents in a detected source style
pub struct StyleWriter {
    /// Style to write with; absent fields fall back to the library defaults
    style: FormatStyle,
}

impl StyleWriter {
    /// Create a writer that follows `style`
    pub fn new(style: FormatStyle) -> Self {
        Self { style }
    }

    /// Serialize `value` as pretty JSON in the target style
    ///
    /// The output carries no trailing terminator; [`serialize_to_file`]
    /// adds one.
    ///
    /// [`serialize_to_file`]: StyleWriter::serialize_to_file
    pub fn serialize(&self, value: &Value) -> Result<String> {
        let formatter = PrettyFormatter::with_indent(self.style.indent_or_default().as_bytes());
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        let text = String::from_utf8(buf)?;

        // The formatter separates lines with LF, and raw newlines inside
        // strings come out escaped, so rewriting every LF retargets only
        // the separators.
        let newline = self.style.newline_or_default();
        if newline == "\n" {
            Ok(text)
        } else {
            Ok(text.replace('\n', newline))
        }
    }

    /// Serialize `value` to `path`, ending with one trailing terminator
    pub fn serialize_to_file(&self, value: &Value, path: &Path) -> Result<()> {
        let mut text = self.serialize(value)?;
        text.push_str(self.style.newline_or_default());
        std::fs::write(path, text)?;
        Ok(())
    }
}
