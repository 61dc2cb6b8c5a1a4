//! Example demonstrating a style-preserving three-way merge
//!
//! A base package.json and two divergent edits are merged, and the result
//! is re-serialized in the formatting detected from the base text.

use emx_pkgmerge::{detect, merge, ConflictResolution, MergeOptions, StyleWriter};
use serde_json::{json, Value};

fn main() -> anyhow::Result<()> {
    println!("=== Three-Way Merge Example ===\n");

    // 1. Disjoint edits combine; competing versions take the higher one
    let base_text = "{\n\t\"name\": \"demo-app\",\n\t\"version\": \"1.0.0\",\n\t\"scripts\": {\n\t\t\"build\": \"tsc\"\n\t}\n}\n";
    let base: Value = serde_json::from_str(base_text)?;

    let local = json!({
        "name": "demo-app",
        "version": "1.0.1",
        "scripts": {"build": "tsc", "test": "vitest"}
    });
    let remote = json!({
        "name": "demo-app",
        "version": "1.1.0",
        "scripts": {"build": "tsc"},
        "dependencies": {"left-pad": "^1.3.0"}
    });

    let outcome = merge(&base, &local, &remote, &MergeOptions::default());
    println!("Clean merge: {} conflict(s)", outcome.conflicts.len());

    // Re-serialize in the base file's formatting (tabs, LF)
    let writer = StyleWriter::new(detect(base_text));
    println!("{}", writer.serialize(&outcome.merged)?);

    // 2. Competing edits to one field are kept local and recorded
    let base = json!({"name": "demo-app", "license": "ISC"});
    let local = json!({"name": "demo-app", "license": "MIT"});
    let remote = json!({"name": "demo-app", "license": "Apache-2.0"});

    let outcome = merge(&base, &local, &remote, &MergeOptions::default());
    println!("\nConflicting merge: {} conflict(s)", outcome.conflicts.len());
    for conflict in &outcome.conflicts {
        println!(
            "  {} - base {}, local {}, remote {}",
            conflict.path,
            show(&conflict.base),
            show(&conflict.local),
            show(&conflict.remote)
        );
    }

    // 3. The union resolution concatenates competing arrays instead
    let base = json!({"keywords": ["cli"]});
    let local = json!({"keywords": ["cli", "merge"]});
    let remote = json!({"keywords": ["cli", "json"]});

    let opts = MergeOptions {
        resolution: ConflictResolution::Union,
        ..Default::default()
    };
    let outcome = merge(&base, &local, &remote, &opts);
    println!("\nUnion merge: {}", outcome.merged);

    println!("\n✓ Merged with the base document's tabs intact");
    Ok(())
}

fn show(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "<absent>".to_string(),
    }
}
