//! Integration tests for protopkg-build.

use protopkg_build::{CompileOption, Config, Error, RootPackage};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_sources(root: &Path) {
    fs::create_dir_all(root.join("a")).expect("Failed to create source dir");
    fs::write(root.join("a/x.proto"), "syntax = \"proto3\";\n\nmessage X {}\n")
        .expect("Failed to write x.proto");
    fs::write(
        root.join("a/y.proto"),
        "syntax = \"proto3\";\n\npackage a;\n\nimport \"a/x.proto\";\n\nmessage Y {\n  X x = 1;\n}\n",
    )
    .expect("Failed to write y.proto");
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    write_sources(&input);

    Config::new()
        .out_dir(&out)
        .protoc_path("/nonexistent/protoc")
        .root_package(RootPackage::new("my.proto").unwrap())
        .options(CompileOption::ALL)
        .dry_run(true)
        .compile_protos(&[&input])
        .expect("Dry run should not need protoc");

    assert!(!out.exists(), "Dry run should not create the output dir");
}

#[test]
fn test_deny_unresolved_imports() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("in");
    write_sources(&input);
    fs::write(input.join("a/z.proto"), "import \"google/protobuf/empty.proto\";\n")
        .expect("Failed to write z.proto");

    let err = Config::new()
        .out_dir(dir.path().join("out"))
        .protoc_path("/nonexistent/protoc")
        .root_package(RootPackage::new("my.proto").unwrap())
        .deny_unresolved_imports(true)
        .compile_protos(&[&input])
        .expect_err("Unresolved import should fail the build");

    match err {
        Error::Rewrite(protopkg::Error::UnresolvedImports(report)) => {
            assert_eq!(report.len(), 1);
        }
        other => panic!("Unexpected error: {}", other),
    }
    assert!(!dir.path().join("out").exists(), "Nothing should be written");
}

#[test]
fn test_no_proto_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    let empty = dir.path().join("empty");
    fs::create_dir_all(&empty).expect("Failed to create empty dir");

    let err = Config::new()
        .out_dir(dir.path().join("out"))
        .protoc_path("/nonexistent/protoc")
        .compile_protos(&[&empty])
        .expect_err("Nothing to compile");
    assert!(matches!(err, Error::NoProtoFiles(ref roots) if roots == &[empty.clone()]));
    assert!(err.to_string().contains("No .proto files found"));
}

#[cfg(unix)]
#[test]
fn test_compile_with_fake_protoc() {
    use std::os::unix::fs::PermissionsExt;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{}", body)).expect("Failed to write script");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }

    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("in");
    let rewritten = dir.path().join("rewritten");
    let out = dir.path().join("out");
    write_sources(&input);

    // Generates one file into the directory named by the `--*_out` flag and
    // records its arguments next to it.
    let protoc = dir.path().join("protoc");
    write_script(
        &protoc,
        r#"out=""
for arg in "$@"; do
  case "$arg" in
    --*_out=*) out="${arg#*=}"; out="${out#*:}" ;;
  esac
done
mkdir -p "$out/my/proto/a"
echo "$@" > "$out/args.txt"
echo "generated" > "$out/my/proto/a/y_pb2.py"
"#,
    );

    Config::new()
        .out_dir(&out)
        .rewrite_dir(&rewritten)
        .protoc_path(&protoc)
        .root_package(RootPackage::new("my.proto").unwrap())
        .quiet(true)
        .compile_protos(&[&input])
        .expect("Failed to compile protos");

    let y = fs::read_to_string(rewritten.join("my/proto/a/y.proto"))
        .expect("Rewritten y.proto should exist");
    assert!(y.contains("package my.proto.a;"));
    assert!(y.contains("import \"my/proto/a/x.proto\";"));
    assert!(rewritten.join("my/proto/a/x.proto").is_file());

    assert_eq!(
        fs::read_to_string(out.join("my/proto/a/y_pb2.py")).expect("Generated file should exist"),
        "generated\n"
    );
    let args = fs::read_to_string(out.join("args.txt")).expect("Arguments should be recorded");
    assert!(args.contains(&format!("-I{}", rewritten.display())));
    assert!(args.contains("--python_out=quiet:"));
    assert!(args.contains(&rewritten.join("my/proto/a/y.proto").display().to_string()));
    assert!(!args.contains(&input.display().to_string()), "Input sources should not be compiled");

    // A failing protoc reports its exit code and output.
    let failing = dir.path().join("failing-protoc");
    write_script(&failing, "echo 'a/y.proto: boom' >&2\nexit 3\n");

    let err = Config::new()
        .out_dir(&out)
        .protoc_path(&failing)
        .compile_protos(&[&input])
        .expect_err("protoc failure should be reported");
    match &err {
        Error::ProtocFailed { code, output } => {
            assert_eq!(*code, Some(3));
            assert!(output.contains("boom"));
        }
        other => panic!("Unexpected error: {}", other),
    }
    assert_eq!(err.exit_code(), 3);
}
