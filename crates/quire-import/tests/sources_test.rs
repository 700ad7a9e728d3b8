//! File discovery and reader tests. No database required.

use std::fs;
use std::path::Path;

use quire_import::{discover, ImportSource, OneNoteHtmlSource, TextFileSource};
use quire_core::Error;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_discover_recurses_and_filters_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "b.md", "b");
    write(&root, "a.txt", "a");
    write(&root, "Work/plan.MD", "plan");
    write(&root, "Work/diagram.png", "binary");
    write(&root, "export/page.html", "<html></html>");

    let found: Vec<_> = discover(&root, TextFileSource::default().extensions())
        .into_iter()
        .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(found, vec!["Work/plan.MD", "a.txt", "b.md"]);

    let html = discover(&root, OneNoteHtmlSource.extensions());
    assert_eq!(html.len(), 1);
}

#[test]
fn test_text_source_reads_title_body_and_folder_tags() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "Work/Projects/Road Map.md", "# Q3\n\n- ship it\n");

    let path = root.join("Work/Projects/Road Map.md");
    let item = TextFileSource::new(true, "Imported, work")
        .read(&root, &path)
        .unwrap();

    assert_eq!(item.title, "Road Map");
    assert_eq!(item.body, "# Q3\n\n- ship it\n");
    assert_eq!(item.source, path.to_string_lossy());
    assert_eq!(
        item.tags,
        Some(vec![
            "work".to_string(),
            "projects".to_string(),
            "imported".to_string()
        ])
    );
}

#[test]
fn test_text_source_without_folder_tags_still_supplies_tags() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "Deep/note.txt", "body");

    let item = TextFileSource::new(false, "")
        .read(&root, &root.join("Deep/note.txt"))
        .unwrap();
    assert_eq!(item.tags, Some(vec![]));
}

#[test]
fn test_invalid_utf8_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let path = root.join("latin1.txt");
    fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();

    let err = TextFileSource::default().read(&root, &path).unwrap_err();
    assert!(matches!(err, Error::UnreadableSource { .. }));
}

#[test]
fn test_onenote_page_converted_without_tags() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(
        &root,
        "Notebook/standup.html",
        "<html><head><title>Daily Standup</title></head>\
         <body><h1>Agenda</h1><p>Review <b>blockers</b>.</p></body></html>",
    );

    let item = OneNoteHtmlSource
        .read(&root, &root.join("Notebook/standup.html"))
        .unwrap();
    assert_eq!(item.title, "Daily Standup");
    assert!(item.body.contains("Agenda"));
    assert!(item.body.contains("blockers"));
    assert!(!item.body.contains("<p>"));
    assert_eq!(item.tags, None);
}

#[test]
fn test_onenote_title_falls_back_to_file_stem() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "untitled page.html", "<html><body><p>text</p></body></html>");

    let item = OneNoteHtmlSource
        .read(&root, &root.join("untitled page.html"))
        .unwrap();
    assert_eq!(item.title, "untitled page");
}
