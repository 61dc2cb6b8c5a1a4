//! Example demonstrating indentation and newline detection
//!
//! Shows how the detector reads the dominant formatting out of differently
//! styled JSON texts, and what a text with no usable evidence yields.

use emx_pkgmerge::{detect, FormatStyle, DEFAULT_INDENT, DEFAULT_NEWLINE};

fn main() {
    println!("=== Formatting Detection Example ===\n");

    // 1. The npm default: two spaces, LF
    let two_spaces = "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"test\": \"node test.js\"\n  }\n}\n";

    // 2. Tab indentation with Windows line endings
    let tabs_crlf = "{\r\n\t\"name\": \"app\",\r\n\t\"private\": true\r\n}\r\n";

    // 3. Four-space indentation
    let four_spaces = "{\n    \"name\": \"app\",\n    \"version\": \"1.0.0\"\n}\n";

    // 4. A single line carries no indentation and no terminator at all
    let single_line = "{\"name\":\"app\"}";

    let samples = [
        ("two spaces, LF", two_spaces),
        ("tabs, CRLF", tabs_crlf),
        ("four spaces, LF", four_spaces),
        ("single line", single_line),
    ];

    for (label, text) in samples {
        println!("{}:", label);
        describe(&detect(text));
        println!();
    }

    println!("✓ Detection never fails; empty findings fall back to defaults");
}

fn describe(style: &FormatStyle) {
    match style.kind {
        Some(kind) => println!("  indent:  {} x {} ({:?})", kind.name(), style.amount, style.indent),
        None => println!("  indent:  none (writer falls back to {:?})", DEFAULT_INDENT),
    }
    match style.newline {
        Some(newline) => println!("  newline: {}", newline.name()),
        None => println!("  newline: none (writer falls back to {:?})", DEFAULT_NEWLINE),
    }
}
