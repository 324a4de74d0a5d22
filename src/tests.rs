/*!
 * Tests for dirtext functionality across components
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;
use tempfile::tempdir;

use crate::config::{Config, IgnoreRules};
use crate::operations::StructureEngine;
use crate::parser::{StructureParser, TrailingSlashClassifier};
use crate::renderer::StructureRenderer;
use crate::sanitizer::NameSanitizer;

// Helper function to create a test directory structure
fn setup_test_directory(root: &Path) -> io::Result<()> {
    fs::create_dir_all(root.join("dir1").join("subdir"))?;
    fs::create_dir_all(root.join("dir2"))?;

    let mut file1 = File::create(root.join("file1.txt"))?;
    writeln!(file1, "This is a text file with content")?;

    let mut file2 = File::create(root.join("dir1").join("file2.txt"))?;
    writeln!(file2, "This is another text file\n    with an indented line")?;

    let mut file3 = File::create(root.join("dir1").join("subdir").join("file3.py"))?;
    writeln!(file3, "def f():\n    return 3")?;

    File::create(root.join("dir2").join("empty.md"))?;

    // Entries the renderer must leave out
    fs::create_dir_all(root.join(".git"))?;
    fs::write(root.join(".git").join("config"), "[core]")?;
    fs::create_dir_all(root.join("node_modules").join("pkg"))?;
    fs::write(root.join("node_modules").join("pkg").join("index.js"), "x")?;
    fs::write(root.join("debug.log"), "noise")?;

    Ok(())
}

fn render(root: &Path, include_contents: bool) -> io::Result<String> {
    let renderer = StructureRenderer::new(IgnoreRules::default(), Arc::new(ProgressBar::hidden()));
    let mut out = Vec::new();
    renderer.render(root, &mut out, include_contents)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn write_file(dir: &Path, name: &str, text: &str) -> io::Result<std::path::PathBuf> {
    let path = dir.join(name);
    fs::write(&path, text)?;
    Ok(path)
}

#[test]
fn test_render_parse_materialize_round_trip() -> io::Result<()> {
    let source = tempdir()?;
    let project = source.path().join("project");
    setup_test_directory(&project)?;

    let text = render(&project, true)?;
    let root = StructureParser::new(IgnoreRules::default(), NameSanitizer::default())
        .with_classifier(TrailingSlashClassifier)
        .parse(text.lines());

    let target = tempdir()?;
    let stats = StructureEngine::new(Config::default()).materialize(&root, target.path());
    assert!(stats.is_clean());
    assert_eq!(stats.files_created, 4);
    assert_eq!(stats.directories_created, 4);

    let out = target.path().join("project");
    assert_eq!(
        fs::read_to_string(out.join("file1.txt"))?,
        "This is a text file with content"
    );
    assert_eq!(
        fs::read_to_string(out.join("dir1/file2.txt"))?,
        "This is another text file\n    with an indented line"
    );
    assert_eq!(
        fs::read_to_string(out.join("dir1/subdir/file3.py"))?,
        "def f():\n    return 3"
    );
    assert_eq!(fs::read_to_string(out.join("dir2/empty.md"))?, "");
    assert!(!out.join(".git").exists());
    assert!(!out.join("node_modules").exists());
    assert!(!out.join("debug.log").exists());

    // Rendering the recreated tree yields the same listing
    assert_eq!(render(&out, true)?, text);
    Ok(())
}

#[test]
fn test_structure_only_round_trip() -> io::Result<()> {
    let source = tempdir()?;
    let project = source.path().join("project");
    setup_test_directory(&project)?;

    let text = render(&project, false)?;
    let dir = tempdir()?;
    let structure = write_file(dir.path(), "structure.txt", &text)?;

    let target = tempdir()?;
    let stats = StructureEngine::new(Config::default())
        .create_structure_from_file(&structure, target.path())?;

    assert!(stats.is_clean());
    assert_eq!(render(&target.path().join("project"), false)?, text);
    assert_eq!(
        fs::read_to_string(target.path().join("project/file1.txt"))?,
        ""
    );
    Ok(())
}

#[test]
fn test_create_from_example_listing() -> io::Result<()> {
    let dir = tempdir()?;
    let structure = write_file(dir.path(), "structure.txt", "project/\n  src/\n    main.py\n")?;

    let target = tempdir()?;
    let stats = StructureEngine::new(Config::default())
        .create_structure_from_file(&structure, target.path())?;

    assert_eq!(stats.directories_created, 2);
    assert_eq!(stats.files_created, 1);
    let main = target.path().join("project").join("src").join("main.py");
    assert!(main.is_file());
    assert_eq!(fs::read_to_string(main)?, "");
    Ok(())
}

#[test]
fn test_recreate_with_contents_file() -> io::Result<()> {
    let dir = tempdir()?;
    let structure = write_file(
        dir.path(),
        "structure.txt",
        "project/\n  src/\n    app.py\n      print(\"embedded\")\n    util.py\n      X = 1\n  README.md\n",
    )?;
    let contents = write_file(
        dir.path(),
        "contents.txt",
        "--- START OF FILE src/app.py ---\n<startwolf>\nprint(\"hi\")\n<endwolf>\n--- END OF FILE src/app.py ---\n\
         --- START OF FILE README.md ---\n<startwolf>\n# Project\n\n  indented\n<endwolf>\n--- END OF FILE README.md ---\n",
    )?;

    let target = tempdir()?;
    let stats = StructureEngine::new(Config::default()).recreate_structure_from_file(
        &structure,
        &contents,
        target.path(),
    )?;

    assert!(stats.is_clean());
    let out = target.path().join("project");
    assert_eq!(fs::read_to_string(out.join("src/app.py"))?, "print(\"hi\")");
    assert_eq!(fs::read_to_string(out.join("src/util.py"))?, "X = 1");
    assert_eq!(
        fs::read_to_string(out.join("README.md"))?,
        "# Project\n\n  indented"
    );
    Ok(())
}

#[test]
fn test_contents_for_ignored_paths_are_not_written() -> io::Result<()> {
    let dir = tempdir()?;
    let structure = write_file(
        dir.path(),
        "structure.txt",
        "app/\n  main.py\n  node_modules/\n    lib.js\n  trace.log\n",
    )?;
    let contents = write_file(
        dir.path(),
        "contents.txt",
        "--- START OF FILE node_modules/lib.js ---\n<startwolf>\nbad\n<endwolf>\n--- END OF FILE node_modules/lib.js ---\n\
         --- START OF FILE trace.log ---\n<startwolf>\nbad\n<endwolf>\n--- END OF FILE trace.log ---\n\
         --- START OF FILE main.py ---\n<startwolf>\nok\n<endwolf>\n--- END OF FILE main.py ---\n",
    )?;

    let target = tempdir()?;
    StructureEngine::new(Config::default()).recreate_structure_from_file(
        &structure,
        &contents,
        target.path(),
    )?;

    let out = target.path().join("app");
    assert_eq!(fs::read_to_string(out.join("main.py"))?, "ok");
    assert!(!out.join("node_modules").exists());
    assert!(!out.join("trace.log").exists());
    Ok(())
}

#[test]
fn test_extra_ignore_rules_apply_everywhere() -> io::Result<()> {
    let mut config = Config::default();
    config
        .rules
        .extend(vec![".bak".to_string()], vec!["build".to_string()]);
    let engine = StructureEngine::new(config);

    let source = tempdir()?;
    let project = source.path().join("proj");
    fs::create_dir_all(project.join("build"))?;
    fs::write(project.join("build").join("out.o"), "")?;
    fs::write(project.join("keep.rs"), "fn main() {}")?;
    fs::write(project.join("old.bak"), "")?;

    let output = source.path().join("listing.txt");
    let (written, stats) = engine.output_directory_structure(
        &project,
        Some(output.as_path()),
        false,
        Arc::new(ProgressBar::hidden()),
    )?;
    assert_eq!(written, output);
    assert_eq!(stats.files, 1);
    assert_eq!(fs::read_to_string(&output)?, "proj/\n└── keep.rs\n");

    let dir = tempdir()?;
    let structure = write_file(dir.path(), "s.txt", "proj/\n  build/\n    out.o\n  old.bak\n  new.rs\n")?;
    let target = tempdir()?;
    let stats = engine.create_structure_from_file(&structure, target.path())?;

    assert_eq!(stats.files_created, 1);
    assert!(target.path().join("proj/new.rs").exists());
    assert!(!target.path().join("proj/build").exists());
    assert!(!target.path().join("proj/old.bak").exists());
    Ok(())
}

#[test]
fn test_hostile_names_stay_inside_target() -> io::Result<()> {
    let dir = tempdir()?;
    let structure = write_file(
        dir.path(),
        "structure.txt",
        "../\n  pwned.txt\n../escape/\nreport: final?.txt\n",
    )?;

    let target = tempdir()?;
    let stats = StructureEngine::new(Config::default())
        .create_structure_from_file(&structure, target.path())?;

    assert!(stats.is_clean());
    let escaped = target.path().parent().map(|p| p.join("escape"));
    assert!(escaped.map_or(true, |p| !p.exists()));

    let mut names: Vec<String> = fs::read_dir(target.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec![".._escape", "report_final_.txt", "untitled"]);
    assert!(target.path().join("untitled").join("pwned.txt").is_file());
    Ok(())
}

#[test]
fn test_whitespace_only_lines_survive_round_trip() -> io::Result<()> {
    let source = tempdir()?;
    let project = source.path().join("proj");
    fs::create_dir(&project)?;
    fs::write(project.join("a.txt"), "x\n    \ny\n")?;

    let text = render(&project, true)?;
    let root = StructureParser::new(IgnoreRules::default(), NameSanitizer::default())
        .with_classifier(TrailingSlashClassifier)
        .parse(text.lines());

    assert_eq!(
        root.find("proj/a.txt").and_then(|n| n.content.as_deref()),
        Some("x\n    \ny")
    );
    Ok(())
}
