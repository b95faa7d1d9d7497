//! Tests for manifest analysis through the filesystem entry point

use conforge_package::{analyze_path, PackageReference};
use pretty_assertions::assert_eq;

#[test]
fn test_analyze_text_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conanfile.txt");
    std::fs::write(
        &path,
        "[requires]\nopenssl/3.5.2\nzlib/1.3\nopenssl/3.4.0\n\n[generators]\nCMakeDeps\n",
    )
    .unwrap();

    let report = analyze_path(&path).unwrap();
    assert_eq!(report.total_deps, 3);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].name, "openssl");
    assert_eq!(report.conflicts[0].versions, vec!["3.4.0", "3.5.2"]);
}

#[test]
fn test_analyze_json_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requirements.json");
    std::fs::write(&path, r#"{"requires": ["a/1.0", "b/2.0"]}"#).unwrap();

    let report = analyze_path(&path).unwrap();
    assert_eq!(report.total_deps, 2);
    assert_eq!(
        report.dependencies,
        vec![
            PackageReference::new("a", "1.0"),
            PackageReference::new("b", "2.0"),
        ]
    );
    assert!(report.conflicts.is_empty());
}

#[test]
fn test_report_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conanfile.txt");
    std::fs::write(&path, "[requires]\na/1.0\na/2.0\n").unwrap();

    let report = analyze_path(&path).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["total_deps"], 2);
    assert_eq!(json["conflicts"][0]["name"], "a");
    // The message field is omitted when there is data
    assert!(json.get("message").is_none());
}
