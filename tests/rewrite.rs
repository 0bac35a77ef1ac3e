//! End to end tests for the rewrite session.

use std::fs;
use std::path::{Path, PathBuf};

use protopkg::syntax::find_imports;
use protopkg::{Error, RootPackage, Rewriter, Stage};
use tempfile::tempdir;

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, text) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
}

fn rewriter(root_package: &str, output_root: &Path) -> Rewriter {
    let mut rewriter = Rewriter::new(RootPackage::new(root_package).unwrap());
    rewriter.set_output_root(output_root);
    rewriter
}

#[test]
fn test_two_file_scenario() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_tree(
        &input,
        &[
            ("a/x.proto", "syntax = \"proto3\";\n\nmessage X {}\n"),
            (
                "a/y.proto",
                "syntax = \"proto3\";\n\npackage a;\n\nimport \"a/x.proto\";\n\nmessage Y {\n  X x = 1;\n}\n",
            ),
        ],
    );
    let x = input.join("a/x.proto");
    let y = input.join("a/y.proto");

    let mut rewriter = rewriter("my.proto", &output);
    rewriter.read(&[&input]).unwrap();
    assert_eq!(rewriter.effective_package(&x).unwrap().to_string(), "my.proto.a");
    assert_eq!(rewriter.effective_package(&y).unwrap().to_string(), "my.proto.a");

    rewriter.fix_imports().unwrap();
    assert!(rewriter.unresolved_imports().is_empty());
    assert!(
        rewriter
            .content(&y)
            .unwrap()
            .contains("import \"my/proto/a/x.proto\";")
    );

    rewriter.fix_packages().unwrap();
    assert_eq!(
        rewriter.content(&y).unwrap(),
        "syntax = \"proto3\";\n\npackage my.proto.a;\n\nimport \"my/proto/a/x.proto\";\n\nmessage Y {\n  X x = 1;\n}\n"
    );
    // No declaration, nothing to rewrite.
    assert_eq!(
        rewriter.content(&x).unwrap(),
        "syntax = \"proto3\";\n\nmessage X {}\n"
    );

    rewriter.write(false).unwrap();
    assert_eq!(rewriter.stage(), Stage::Written);
    assert!(output.join("my/proto/a/x.proto").is_file());
    assert_eq!(
        fs::read_to_string(output.join("my/proto/a/y.proto")).unwrap(),
        rewriter.content(&y).unwrap()
    );
}

#[test]
fn test_written_imports_point_at_written_files() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_tree(
        &input,
        &[
            ("common/types.proto", "package shared.types;\n\nmessage Id {}\n"),
            (
                "service/api.proto",
                "package service.v1;\n\nimport \"common/types.proto\";\nimport \"service/inner/detail.proto\";\n\nmessage Request {\n  shared.types.Id id = 1;\n  service.v1.inner.Detail detail = 2;\n}\n",
            ),
            (
                "service/inner/detail.proto",
                "package service.v1.inner;\n\nimport \"common/types.proto\";\n\nmessage Detail {}\n",
            ),
            ("plain/loose.proto", "import \"service/api.proto\";\n"),
        ],
    );

    let mut rewriter = rewriter("org.gen", &output);
    rewriter
        .read(&[&input])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap()
        .write(false)
        .unwrap();
    assert!(rewriter.unresolved_imports().is_empty());

    let mut checked = 0;
    for (_, destination) in rewriter.planned_outputs() {
        let text = fs::read_to_string(&destination).unwrap();
        for import in find_imports(&text) {
            let target = output.join(import.relative_path());
            assert!(
                target.is_file(),
                "{} imports {} which was not written",
                destination.display(),
                import.path()
            );
            checked += 1;
        }
    }
    assert_eq!(checked, 4);

    let api = fs::read_to_string(output.join("org/gen/service/v1/api.proto")).unwrap();
    assert!(api.contains("package org.gen.service.v1;"));
    assert!(api.contains("import \"org/gen/shared/types/types.proto\";"));
    assert!(api.contains("org.gen.shared.types.Id id = 1;"));
    assert!(api.contains("org.gen.service.v1.inner.Detail detail = 2;"));
    assert!(output.join("org/gen/plain/loose.proto").is_file());
}

#[test]
fn test_unresolved_imports_change_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    write_tree(
        &input,
        &[
            ("a/ok.proto", "package a;\nimport \"a/other.proto\";\n"),
            ("a/other.proto", "package a;\n"),
            (
                "b/broken.proto",
                "package b;\nimport \"a/other.proto\";\nimport \"missing/gone.proto\";\n",
            ),
        ],
    );

    let mut rewriter = rewriter("root", &dir.path().join("out"));
    rewriter.read(&[&input]).unwrap();
    let before: Vec<String> = rewriter
        .files()
        .map(|path| rewriter.content(path).unwrap().to_string())
        .collect();

    rewriter.fix_imports().unwrap();
    let after: Vec<String> = rewriter
        .files()
        .map(|path| rewriter.content(path).unwrap().to_string())
        .collect();
    assert_eq!(before, after);
    assert_eq!(rewriter.stage(), Stage::Read);

    let report = rewriter.unresolved_imports();
    assert_eq!(report.len(), 1);
    let unresolved = report.iter().next().unwrap();
    assert_eq!(unresolved.file, input.join("b/broken.proto"));
    assert_eq!(unresolved.statements, ["import \"missing/gone.proto\";"]);
    assert!(report.to_string().contains("missing/gone.proto"));

    let err = rewriter.try_fix_imports().unwrap_err();
    assert!(matches!(err, Error::UnresolvedImports(ref report) if report.len() == 1));
}

#[test]
fn test_fix_packages_after_unresolved_imports_keeps_import_paths() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_tree(
        &input,
        &[
            ("a/x.proto", "package b;\n"),
            (
                "a/y.proto",
                "package a;\nimport \"a/x.proto\";\nimport \"missing/m.proto\";\n",
            ),
        ],
    );
    let y = input.join("a/y.proto");

    let mut rewriter = rewriter("r", &output);
    rewriter
        .read(&[&input])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap();
    assert_eq!(rewriter.unresolved_imports().len(), 1);

    // `a` is a declared package, but x is written to r/b/x.proto, not r/a/x.proto.
    assert_eq!(
        rewriter.content(&y).unwrap(),
        "package r.a;\nimport \"a/x.proto\";\nimport \"missing/m.proto\";\n"
    );
    assert_eq!(rewriter.content(input.join("a/x.proto")).unwrap(), "package r.b;\n");

    let outputs = rewriter.planned_outputs();
    assert!(outputs.contains(&(input.join("a/x.proto"), output.join("r/b/x.proto"))));
}

#[test]
fn test_fix_imports_again_after_fix_packages_is_noop() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    write_tree(
        &input,
        &[
            ("a/x.proto", "message X {}\n"),
            ("a/y.proto", "package a;\nimport \"a/x.proto\";\n"),
            ("b/z.proto", "package other;\nimport \"a/y.proto\";\nimport \"b/w.proto\";\n"),
            ("b/w.proto", "package b.w;\n"),
        ],
    );

    let mut rewriter = rewriter("my.proto", &dir.path().join("out"));
    rewriter
        .read(&[&input])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap();
    let snapshot: Vec<String> = rewriter
        .files()
        .map(|path| rewriter.content(path).unwrap().to_string())
        .collect();

    rewriter.fix_imports().unwrap();
    assert!(rewriter.unresolved_imports().is_empty());
    let again: Vec<String> = rewriter
        .files()
        .map(|path| rewriter.content(path).unwrap().to_string())
        .collect();
    assert_eq!(snapshot, again);

    rewriter.fix_packages().unwrap();
    let packages_again: Vec<String> = rewriter
        .files()
        .map(|path| rewriter.content(path).unwrap().to_string())
        .collect();
    assert_eq!(snapshot, packages_again);
}

#[test]
fn test_rewriting_the_output_again_is_stable() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write_tree(
        &input,
        &[
            ("a/x.proto", "message X {}\n"),
            ("a/y.proto", "package a;\nimport \"a/x.proto\";\nmessage Y { a.X x = 1; }\n"),
        ],
    );

    rewriter("my.proto", &first)
        .read(&[&input])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap()
        .write(false)
        .unwrap();

    let mut again = rewriter("my.proto", &second);
    again
        .read(&[&first])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap()
        .write(false)
        .unwrap();

    for name in ["x.proto", "y.proto"] {
        let relative: PathBuf = ["my", "proto", "a", name].iter().collect();
        assert_eq!(
            fs::read_to_string(first.join(&relative)).unwrap(),
            fs::read_to_string(second.join(&relative)).unwrap(),
            "{name} changed on the second rewrite"
        );
    }
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_tree(&input, &[("a/x.proto", "package a;\n"), ("b/y.proto", "")]);

    let mut rewriter = rewriter("my.proto", &output);
    rewriter
        .read(&[&input])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap()
        .write(true)
        .unwrap();

    assert!(!output.exists());
    assert_eq!(rewriter.planned_outputs().len(), 2);
    assert_eq!(
        fs::read_to_string(input.join("a/x.proto")).unwrap(),
        "package a;\n"
    );
}

#[test]
fn test_read_rejects_empty_roots() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good");
    let empty = dir.path().join("empty");
    let file = dir.path().join("file.proto");
    write_tree(&good, &[("x.proto", "")]);
    fs::create_dir_all(&empty).unwrap();
    fs::write(&file, "").unwrap();

    let mut rewriter = Rewriter::default();
    rewriter.read(&[&good]).unwrap();

    let err = rewriter.read(&[&good, &empty, &file]).unwrap_err();
    match err {
        Error::NoSourceFiles { roots } => assert_eq!(roots, [empty, file]),
        other => panic!("unexpected error: {other}"),
    }
    // The previous working set survives.
    assert_eq!(rewriter.files().count(), 1);
}

#[test]
fn test_read_replaces_working_set() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write_tree(&first, &[("a.proto", ""), ("b.proto", "")]);
    write_tree(&second, &[("c.proto", "")]);

    let mut rewriter = Rewriter::default();
    rewriter.read(&[&first]).unwrap();
    assert_eq!(rewriter.files().count(), 2);
    rewriter.read(&[&second]).unwrap();
    let files: Vec<_> = rewriter.files().map(Path::to_path_buf).collect();
    assert_eq!(files, [second.join("c.proto")]);
}

#[test]
fn test_without_root_package_layout_follows_declarations() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    write_tree(
        &input,
        &[
            ("src/x.proto", "package lib.x;\n"),
            ("src/y.proto", "import \"src/x.proto\";\n"),
        ],
    );

    let mut rewriter = Rewriter::default();
    rewriter.set_output_root(&output);
    rewriter
        .read(&[&input])
        .unwrap()
        .fix_imports()
        .unwrap()
        .fix_packages()
        .unwrap()
        .write(false)
        .unwrap();

    assert_eq!(
        fs::read_to_string(output.join("src/y.proto")).unwrap(),
        "import \"lib/x/x.proto\";\n"
    );
    assert_eq!(
        fs::read_to_string(output.join("lib/x/x.proto")).unwrap(),
        "package lib.x;\n"
    );
}
