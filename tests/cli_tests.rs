use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join("objsize")
        .join(name)
}

fn objsize() -> Command {
    let mut cmd = Command::cargo_bin("objsize").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn deep_reports_default_root() {
    // Holder 32, two nodes 24 each, Node[3] 32; the sealed int[4] is skipped.
    objsize()
        .arg("deep")
        .arg(fixture("graph.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Root: @0"))
        .stdout(predicate::str::contains("Total bytes:        112"))
        .stdout(predicate::str::contains("Objects:            4"));
}

#[test]
fn deep_json_per_root() {
    let output = objsize()
        .args(["deep", "--json", "--root", "2", "--root", "3"])
        .arg(fixture("graph.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["root"], 2);
    assert_eq!(rows[0]["total_bytes"], 24);
    assert_eq!(rows[1]["root"], 3);
    assert_eq!(rows[1]["total_bytes"], 112);
    assert_eq!(rows[1]["stats"]["objects"], 4);
}

#[test]
fn deep_all_measures_every_root() {
    let output = objsize()
        .args(["deep", "--all", "--json"])
        .arg(fixture("graph.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let totals: Vec<u64> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["total_bytes"].as_u64().unwrap())
        .collect();
    assert_eq!(totals, vec![112, 112, 24, 112, 32]);
}

#[test]
fn uncompressed_layout_changes_sizes() {
    // Holder 56, nodes 32 each, Node[3] 48
    objsize()
        .args(["deep", "--uncompressed"])
        .arg(fixture("graph.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Total bytes:        168"));
}

#[test]
fn layout_file_is_applied() {
    objsize()
        .arg("deep")
        .arg("--layout")
        .arg(fixture("layout_wide.json"))
        .arg(fixture("graph.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Total bytes:        176"));
}

#[test]
fn invalid_layout_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let layout = dir.path().join("layout.json");
    std::fs::write(&layout, r#"{ "alignment": 6 }"#).unwrap();

    objsize()
        .arg("deep")
        .arg("--layout")
        .arg(&layout)
        .arg(fixture("graph.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid layout config"));
}

#[test]
fn no_provider_measures_zero() {
    objsize()
        .args(["deep", "--no-provider"])
        .arg(fixture("graph.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Total bytes:        0"))
        .stdout(predicate::str::contains("Objects:            4"));
}

#[test]
fn shallow_lists_every_object() {
    objsize()
        .arg("shallow")
        .arg(fixture("graph.json"))
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"@0\s+Holder\s+32").unwrap())
        .stdout(predicate::str::is_match(r"@3\s+Node\[\]\s+32").unwrap())
        .stdout(predicate::str::is_match(r"@4\s+int\[\]\s+32").unwrap());
}

#[test]
fn fields_most_specific_first() {
    objsize()
        .arg("fields")
        .arg(fixture("graph.json"))
        .arg("Holder")
        .assert()
        .success()
        .stdout(
            "Holder.secret: ref private\n\
             Holder.items: ref public\n\
             Holder.handle: ref public sealed\n\
             Node.next: ref public\n\
             Node.value: int public\n",
        );
}

#[test]
fn fields_unknown_type_fails() {
    objsize()
        .arg("fields")
        .arg(fixture("graph.json"))
        .arg("Missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown type `Missing`"));
}

#[test]
fn root_out_of_range_fails() {
    objsize()
        .args(["deep", "--root", "99"])
        .arg(fixture("graph.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("object 99 is not in the heap dump"));
}

#[test]
fn malformed_dump_fails() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("broken.json");
    std::fs::write(&dump, r#"{ "objects": [ { "kind": "instance", "type": "Ghost" } ] }"#).unwrap();

    objsize()
        .arg("deep")
        .arg(&dump)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load heap dump"));
}
