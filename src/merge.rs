//! Three-way merge over JSON documents
//!
//! Changes from two derived documents are folded back onto their common
//! ancestor. Agreement and one-sided changes resolve structurally; object
//! nodes merge key by key with the ancestor's key order preserved; the rest
//! is governed by [`MergeOptions`].

use serde_json::{Map, Value};
use tracing::debug;

/// How a both-sides-changed disagreement is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Keep the local value and record a conflict (default)
    KeepLocal,
    /// Take the base value, without recording a conflict
    UseBase,
    /// Take the local value, without recording a conflict
    UseLocal,
    /// Take the remote value, without recording a conflict
    UseRemote,
    /// Concatenate both sides of an array, dropping duplicates; non-array
    /// values behave like `KeepLocal`
    Union,
}

/// Options controlling a three-way merge
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Resolution applied where both sides changed a value differently
    pub resolution: ConflictResolution,
    /// Resolve the root `version` field by taking the higher version
    pub version_take_max: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            resolution: ConflictResolution::KeepLocal,
            version_take_max: true,
        }
    }
}

/// One disagreement left standing after resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    /// Pointer-style path to the disputed field (`/` for the document root)
    pub path: String,
    /// Value at the common ancestor; absent when both sides added the field
    pub base: Option<Value>,
    /// Local side's value; absent when deleted locally
    pub local: Option<Value>,
    /// Remote side's value; absent when deleted remotely
    pub remote: Option<Value>,
}

/// Result of a three-way merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged document
    pub merged: Value,
    /// Disagreements recorded under the chosen resolution
    pub conflicts: Vec<Conflict>,
}

impl MergeOutcome {
    /// True when no unresolved disagreement was recorded
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Merge changes introduced by `local` and `remote` relative to their
/// common ancestor `base`.
pub fn merge(base: &Value, local: &Value, remote: &Value, options: &MergeOptions) -> MergeOutcome {
    let mut conflicts = Vec::new();
    let merged = merge_nodes(
        Some(base),
        Some(local),
        Some(remote),
        "",
        &mut conflicts,
        options,
    )
    .unwrap_or(Value::Null);
    debug!("Merge produced {} conflict(s)", conflicts.len());
    MergeOutcome { merged, conflicts }
}

/// Merge one node. `None` stands for "no value at this path", so an agreed
/// deletion comes back as `None` and the caller drops the key.
fn merge_nodes(
    base: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
    path: &str,
    conflicts: &mut Vec<Conflict>,
    options: &MergeOptions,
) -> Option<Value> {
    // Agreement, including agreed deletion
    if local == remote {
        return local.cloned();
    }
    // One side untouched: the other side's change wins
    if local == base {
        return remote.cloned();
    }
    if remote == base {
        return local.cloned();
    }

    // Both sides changed, differently, from here on

    if path == "/version" && options.version_take_max {
        if let Some(winner) = take_max_version(local, remote) {
            debug!("Competing versions at {}; taking the higher one", path);
            return Some(winner);
        }
    }

    if let (Some(Value::Object(local_map)), Some(Value::Object(remote_map))) = (local, remote) {
        let base_map = base.and_then(Value::as_object);
        return Some(Value::Object(merge_objects(
            base_map, local_map, remote_map, path, conflicts, options,
        )));
    }

    resolve_leaf(base, local, remote, path, conflicts, options)
}

/// Key-by-key merge of two object nodes.
///
/// Key order in the result is the ancestor's keys first, then keys the
/// local side added, then keys only the remote side added.
fn merge_objects(
    base: Option<&Map<String, Value>>,
    local: &Map<String, Value>,
    remote: &Map<String, Value>,
    path: &str,
    conflicts: &mut Vec<Conflict>,
    options: &MergeOptions,
) -> Map<String, Value> {
    let empty = Map::new();
    let base = base.unwrap_or(&empty);

    let keys = base
        .keys()
        .chain(local.keys().filter(|k| !base.contains_key(*k)))
        .chain(
            remote
                .keys()
                .filter(|k| !base.contains_key(*k) && !local.contains_key(*k)),
        );

    let mut merged = Map::new();
    for key in keys {
        let child_path = format!("{}/{}", path, key);
        let value = merge_nodes(
            base.get(key),
            local.get(key),
            remote.get(key),
            &child_path,
            conflicts,
            options,
        );
        if let Some(value) = value {
            merged.insert(key.clone(), value);
        }
    }
    merged
}

/// Apply the configured resolution to a disagreement that nothing
/// structural could settle.
fn resolve_leaf(
    base: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
    path: &str,
    conflicts: &mut Vec<Conflict>,
    options: &MergeOptions,
) -> Option<Value> {
    match options.resolution {
        ConflictResolution::UseBase => base.cloned(),
        ConflictResolution::UseLocal => local.cloned(),
        ConflictResolution::UseRemote => remote.cloned(),
        ConflictResolution::Union => {
            if let (Some(Value::Array(l)), Some(Value::Array(r))) = (local, remote) {
                let mut union = l.clone();
                for item in r {
                    if !union.contains(item) {
                        union.push(item.clone());
                    }
                }
                return Some(Value::Array(union));
            }
            record_conflict(base, local, remote, path, conflicts);
            local.cloned()
        }
        ConflictResolution::KeepLocal => {
            record_conflict(base, local, remote, path, conflicts);
            local.cloned()
        }
    }
}

fn record_conflict(
    base: Option<&Value>,
    local: Option<&Value>,
    remote: Option<&Value>,
    path: &str,
    conflicts: &mut Vec<Conflict>,
) {
    let path = if path.is_empty() { "/" } else { path };
    debug!("Unresolved disagreement at {}", path);
    conflicts.push(Conflict {
        path: path.to_string(),
        base: base.cloned(),
        local: local.cloned(),
        remote: remote.cloned(),
    });
}

/// Resolve two competing version fields by taking the higher one.
///
/// Both sides must be strings; they compare as semantic versions when both
/// parse, and fall back to plain string order otherwise. Non-string values
/// yield `None` and the ordinary resolution applies.
fn take_max_version(local: Option<&Value>, remote: Option<&Value>) -> Option<Value> {
    let l = local?.as_str()?;
    let r = remote?.as_str()?;
    let higher = match (semver::Version::parse(l), semver::Version::parse(r)) {
        (Ok(lv), Ok(rv)) => {
            if lv >= rv {
                l
            } else {
                r
            }
        }
        _ => {
            if l >= r {
                l
            } else {
                r
            }
        }
    };
    Some(Value::String(higher.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merge_default(base: &Value, local: &Value, remote: &Value) -> MergeOutcome {
        merge(base, local, remote, &MergeOptions::default())
    }

    #[test]
    fn test_identical_documents_merge_cleanly() {
        let doc = json!({"name": "pkg", "version": "1.0.0"});
        let outcome = merge_default(&doc, &doc, &doc);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, doc);
    }

    #[test]
    fn test_one_sided_changes_combine() {
        let base = json!({"a": 1, "b": 2});
        let local = json!({"a": 10, "b": 2});
        let remote = json!({"a": 1, "b": 20});
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"a": 10, "b": 20}));
    }

    #[test]
    fn test_agreement_needs_no_base() {
        let base = json!({"a": 1});
        let both = json!({"a": 5});
        let outcome = merge_default(&base, &both, &both);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, both);
    }

    #[test]
    fn test_one_sided_deletion_applies() {
        let base = json!({"a": 1, "b": 2});
        let local = json!({"b": 2});
        let remote = base.clone();
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"b": 2}));
    }

    #[test]
    fn test_agreed_deletion_applies() {
        let base = json!({"a": 1, "b": 2});
        let both = json!({"b": 2});
        let outcome = merge_default(&base, &both, &both);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"b": 2}));
    }

    #[test]
    fn test_delete_versus_modify_conflicts() {
        let base = json!({"a": 1});
        let local = json!({});
        let remote = json!({"a": 3});
        let outcome = merge_default(&base, &local, &remote);
        assert_eq!(outcome.merged, json!({}));
        assert_eq!(outcome.conflicts.len(), 1);
        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.path, "/a");
        assert_eq!(conflict.base, Some(json!(1)));
        assert_eq!(conflict.local, None);
        assert_eq!(conflict.remote, Some(json!(3)));
    }

    #[test]
    fn test_competing_changes_keep_local_and_record() {
        let base = json!({"a": 1});
        let local = json!({"a": 2});
        let remote = json!({"a": 3});
        let outcome = merge_default(&base, &local, &remote);
        assert_eq!(outcome.merged, json!({"a": 2}));
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].local, Some(json!(2)));
        assert_eq!(outcome.conflicts[0].remote, Some(json!(3)));
    }

    #[test]
    fn test_silent_resolutions_record_nothing() {
        let base = json!({"a": 1});
        let local = json!({"a": 2});
        let remote = json!({"a": 3});

        let opts = MergeOptions {
            resolution: ConflictResolution::UseRemote,
            ..Default::default()
        };
        let outcome = merge(&base, &local, &remote, &opts);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"a": 3}));

        let opts = MergeOptions {
            resolution: ConflictResolution::UseBase,
            ..Default::default()
        };
        let outcome = merge(&base, &local, &remote, &opts);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"a": 1}));
    }

    #[test]
    fn test_union_concatenates_arrays_without_duplicates() {
        let base = json!({"keywords": ["a"]});
        let local = json!({"keywords": ["a", "b"]});
        let remote = json!({"keywords": ["a", "c", "b"]});

        let opts = MergeOptions {
            resolution: ConflictResolution::Union,
            ..Default::default()
        };
        let outcome = merge(&base, &local, &remote, &opts);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"keywords": ["a", "b", "c"]}));

        // The default resolution records the same disagreement instead
        let outcome = merge_default(&base, &local, &remote);
        assert_eq!(outcome.merged, json!({"keywords": ["a", "b"]}));
        assert_eq!(outcome.conflicts.len(), 1);
    }

    #[test]
    fn test_union_falls_back_on_non_arrays() {
        let base = json!({"a": 1});
        let local = json!({"a": 2});
        let remote = json!({"a": 3});
        let opts = MergeOptions {
            resolution: ConflictResolution::Union,
            ..Default::default()
        };
        let outcome = merge(&base, &local, &remote, &opts);
        assert_eq!(outcome.merged, json!({"a": 2}));
        assert_eq!(outcome.conflicts.len(), 1);
    }

    #[test]
    fn test_version_takes_the_higher_semver() {
        let base = json!({"version": "1.0.0"});
        let local = json!({"version": "1.1.0"});
        let remote = json!({"version": "1.0.5"});
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"version": "1.1.0"}));
    }

    #[test]
    fn test_version_prerelease_orders_below_release() {
        // Plain string order would pick the prerelease here
        let base = json!({"version": "0.9.0"});
        let local = json!({"version": "1.0.0-alpha"});
        let remote = json!({"version": "1.0.0"});
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"version": "1.0.0"}));
    }

    #[test]
    fn test_version_non_semver_falls_back_to_string_order() {
        let base = json!({"version": "2020.1"});
        let local = json!({"version": "2020.5"});
        let remote = json!({"version": "2020.10"});
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        assert_eq!(outcome.merged, json!({"version": "2020.5"}));
    }

    #[test]
    fn test_version_rule_can_be_disabled() {
        let base = json!({"version": "1.0.0"});
        let local = json!({"version": "1.1.0"});
        let remote = json!({"version": "1.2.0"});
        let opts = MergeOptions {
            version_take_max: false,
            ..Default::default()
        };
        let outcome = merge(&base, &local, &remote, &opts);
        assert_eq!(outcome.merged, json!({"version": "1.1.0"}));
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].path, "/version");
    }

    #[test]
    fn test_version_rule_is_root_only() {
        let base = json!({"engine": {"version": "1.0.0"}});
        let local = json!({"engine": {"version": "1.1.0"}});
        let remote = json!({"engine": {"version": "1.2.0"}});
        let outcome = merge_default(&base, &local, &remote);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].path, "/engine/version");
        assert_eq!(outcome.merged, json!({"engine": {"version": "1.1.0"}}));
    }

    #[test]
    fn test_nested_objects_merge_disjoint_changes() {
        let base = json!({"scripts": {"build": "make", "test": "check"}});
        let local = json!({"scripts": {"build": "ninja", "test": "check"}});
        let remote = json!({"scripts": {"build": "make", "test": "check --all"}});
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        assert_eq!(
            outcome.merged,
            json!({"scripts": {"build": "ninja", "test": "check --all"}})
        );
    }

    #[test]
    fn test_both_added_same_key_differently() {
        let base = json!({});
        let local = json!({"a": 1});
        let remote = json!({"a": 2});
        let outcome = merge_default(&base, &local, &remote);
        assert_eq!(outcome.merged, json!({"a": 1}));
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].path, "/a");
        assert_eq!(outcome.conflicts[0].base, None);
    }

    #[test]
    fn test_key_order_is_base_then_local_then_remote_additions() {
        let base = json!({"name": "pkg", "version": "1.0.0"});
        let local = json!({"name": "pkg", "version": "1.0.0", "scripts": {"t": "x"}});
        let remote = json!({"name": "pkg", "version": "1.0.0", "license": "MIT"});
        let outcome = merge_default(&base, &local, &remote);
        assert!(outcome.is_clean());
        let keys: Vec<&str> = outcome
            .merged
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["name", "version", "scripts", "license"]);
    }

    #[test]
    fn test_root_level_disagreement_paths_as_slash() {
        let base = json!(1);
        let local = json!(2);
        let remote = json!(3);
        let outcome = merge_default(&base, &local, &remote);
        assert_eq!(outcome.merged, json!(2));
        assert_eq!(outcome.conflicts[0].path, "/");
    }
}
