//! Collection cycles against a real directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use rfolder::collector::{FolderCollector, GatherError, RealFs};
use rfolder::config::FolderConfig;
use rfolder::parser::FieldValue;
use rfolder::sink::{JsonLinesSink, RecordBuffer};
use tempfile::TempDir;

fn write_record(path: &Path, name: &str, value: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(
        path,
        format!(
            r#"{{"name": "{}", "fields": {{"value": {}}}, "tags": {{"file": "{}"}}}}"#,
            name,
            value,
            path.file_name().unwrap().to_string_lossy()
        ),
    )
    .unwrap();
}

fn pattern(root: &Path, suffix: &str) -> String {
    format!("{}/{}", root.display(), suffix)
}

fn collector(patterns: Vec<String>) -> FolderCollector<RealFs> {
    FolderCollector::from_config(RealFs::new(), &FolderConfig::new(patterns)).unwrap()
}

#[test]
fn test_two_folders_in_match_order() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("a/x.txt"), "x", 1);
    write_record(&root.join("b/y.txt"), "y", 2);

    let mut c = collector(vec![pattern(root, "*")]);
    let mut acc = RecordBuffer::new();
    let stats = c.gather(&mut acc).unwrap();

    assert_eq!(c.last_folders(), &[root.join("a"), root.join("b")]);
    assert_eq!(c.last_files(), &[root.join("a/x.txt"), root.join("b/y.txt")]);
    assert_eq!(stats.records, 2);

    let records = acc.records();
    assert_eq!(records[0].name, "x");
    assert_eq!(records[0].tags["file"], "x.txt");
    assert_eq!(records[1].fields["value"], FieldValue::Integer(2));
}

#[test]
fn test_recursive_wildcard() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("log/access.log"), "direct", 1);
    write_record(&root.join("log/app/access.log"), "nested", 2);

    // Files are reached through the folders that contain them.
    let mut deep = collector(vec![pattern(root, "log/**")]);
    let mut acc = RecordBuffer::new();
    deep.gather(&mut acc).unwrap();
    assert_eq!(deep.last_folders(), &[root.join("log/app")]);

    let mut both = collector(vec![pattern(root, "log"), pattern(root, "log/**")]);
    let mut acc = RecordBuffer::new();
    both.gather(&mut acc).unwrap();
    assert_eq!(
        both.last_files(),
        &[root.join("log/access.log"), root.join("log/app/access.log")]
    );
}

#[test]
fn test_missing_folder_fails_without_reading() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("a/x.txt"), "x", 1);

    let mut c = collector(vec![pattern(root, "a"), pattern(root, "missing-*")]);
    let mut acc = RecordBuffer::new();
    let err = c.gather(&mut acc).unwrap_err();

    assert!(matches!(err, GatherError::FolderNotFound { .. }));
    assert!(err.to_string().contains("missing-*"));
    assert!(acc.is_empty());
}

#[test]
fn test_unchanged_tree_resolves_identically() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for name in ["c.txt", "a.txt", "b.txt"] {
        write_record(&root.join("data").join(name), name, 1);
    }

    let mut c = collector(vec![pattern(root, "data")]);
    let mut acc = RecordBuffer::new();
    c.gather(&mut acc).unwrap();
    let first: Vec<PathBuf> = c.last_files().to_vec();
    c.gather(&mut acc).unwrap();

    assert_eq!(c.last_files(), first.as_slice());
    assert_eq!(
        first,
        vec![
            root.join("data/a.txt"),
            root.join("data/b.txt"),
            root.join("data/c.txt")
        ]
    );
}

#[test]
fn test_new_files_show_up_next_cycle() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("data/app.log"), "app", 1);

    let mut c = collector(vec![pattern(root, "data")]);
    let mut acc = RecordBuffer::new();
    c.gather(&mut acc).unwrap();
    assert_eq!(c.last_files().len(), 1);

    write_record(&root.join("data/app.log.1"), "rotated", 2);
    c.gather(&mut acc).unwrap();

    assert_eq!(
        c.last_files(),
        &[root.join("data/app.log"), root.join("data/app.log.1")]
    );
    let names: Vec<&str> = acc.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["app", "app", "rotated"]);
}

#[test]
fn test_parse_error_stops_cycle() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("data/1.json"), "first", 1);
    fs::write(root.join("data/2.json"), "not json").unwrap();
    write_record(&root.join("data/3.json"), "third", 3);

    let mut c = collector(vec![pattern(root, "data")]);
    let mut acc = RecordBuffer::new();
    let err = c.gather(&mut acc).unwrap_err();

    match err {
        GatherError::Parse { path, .. } => assert_eq!(path, root.join("data/2.json")),
        other => panic!("expected Parse, got {:?}", other),
    }
    assert_eq!(acc.len(), 1);
    assert_eq!(acc.records()[0].name, "first");
}

#[test]
fn test_json_lines_output() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("data/x.json"), "x", 7);

    let mut c = collector(vec![pattern(root, "data")]);
    let mut sink = JsonLinesSink::new(Vec::new());
    c.gather(&mut sink).unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(output.lines().count(), 1);
    let line: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(line["name"], "x");
    assert_eq!(line["fields"]["value"], 7);
    assert_eq!(line["tags"]["file"], "x.json");
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_record(&root.join("data/a/x.json"), "x", 1);
    std::os::unix::fs::symlink(root.join("data"), root.join("data/a/up")).unwrap();
    std::os::unix::fs::symlink(root.join("data"), root.join("data/a/up2")).unwrap();

    let mut c = collector(vec![pattern(root, "data/**")]);
    let mut acc = RecordBuffer::new();
    let stats = c.gather(&mut acc).unwrap();

    assert_eq!(
        c.last_folders(),
        &[root.join("data/a"), root.join("data/a/up"), root.join("data/a/up2")]
    );
    assert_eq!(c.last_files(), &[root.join("data/a/x.json")]);
    assert_eq!(stats.records, 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_names_are_read() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let odd = root.join("data").join(OsStr::from_bytes(b"\xff.json"));
    write_record(&root.join("data/ok.json"), "ok", 1);
    write_record(&odd, "odd", 2);

    let mut c = collector(vec![pattern(root, "data")]);
    let mut acc = RecordBuffer::new();
    let stats = c.gather(&mut acc).unwrap();

    assert_eq!(c.last_files(), &[root.join("data/ok.json"), odd]);
    assert_eq!(stats.records, 2);
    assert_eq!(acc.records()[1].name, "odd");
}
