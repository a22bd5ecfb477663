//! Runs of the CLI runtime against temporary projects.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::run;

const PAGE: &str = "<?php\n\nnamespace App;\n\nuse Old\\Control\\Page;\n\nclass HomePage extends Page\n{\n    public function init()\n    {\n        $this->legacyInit();\n    }\n}\n";

struct Outcome {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke(args: &[&OsString]) -> Outcome {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut argv = vec![OsString::from("upgrade-code")];
    argv.extend(args.iter().map(|&arg| arg.clone()));
    let code = run(argv, &mut stdout, &mut stderr);
    Outcome {
        code,
        stdout: String::from_utf8(stdout).expect("utf-8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf-8 stderr"),
    }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write");
}

#[fixture]
fn project() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path();
    write(
        root,
        "vendor/framework/cms/.upgrade.yml",
        "mappings:\n  Old\\Control\\Page: New\\CMS\\Page\napiChanges:\n  - signature: 'legacyInit()'\n    message: legacyInit() was removed; move setup to init()\n",
    );
    write(root, "app/src/HomePage.php", PAGE);
    write(root, "app/_config/app.yml", "Old\\Control\\Page:\n  extensions: []\n");
    dir
}

fn arg(value: impl Into<OsString>) -> OsString {
    value.into()
}

#[rstest]
fn dry_run_reports_without_writing(project: TempDir) {
    let target = arg(project.path().join("app"));
    let root = arg(project.path());

    let outcome = invoke(&[&target, &arg("-d"), &root, &arg("--log-filter"), &arg("off")]);

    assert_eq!(outcome.code, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert!(outcome.stdout.contains("modified: app/_config/app.yml"));
    assert!(outcome.stdout.contains("+use New\\CMS\\Page;"));
    assert!(outcome.stdout.contains(
        "app/src/HomePage.php:11\n  legacyInit() was removed; move setup to init()\n  > $this->legacyInit();\n"
    ));
    assert!(outcome.stdout.contains("2 files changed, 1 warnings\n"));
    assert!(outcome
        .stdout
        .ends_with("Changes not saved; run with --write to commit to disk\n"));
    let on_disk =
        fs::read_to_string(project.path().join("app/src/HomePage.php")).expect("read page");
    assert_eq!(on_disk, PAGE);
}

#[rstest]
fn write_flag_saves_changed_files(project: TempDir) {
    let target = arg(project.path().join("app"));
    let root = arg(project.path());

    let outcome = invoke(&[
        &target,
        &arg("--root-dir"),
        &root,
        &arg("--write"),
        &arg("--rule"),
        &arg("config"),
        &arg("--log-filter"),
        &arg("off"),
    ]);

    assert_eq!(outcome.code, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert!(outcome.stdout.ends_with("Wrote 1 files\n"));
    assert_eq!(
        fs::read_to_string(project.path().join("app/_config/app.yml")).expect("read config"),
        "New\\CMS\\Page:\n  extensions: []\n"
    );
    assert_eq!(
        fs::read_to_string(project.path().join("app/src/HomePage.php")).expect("read page"),
        PAGE
    );
}

#[rstest]
#[case::root_itself("")]
#[case::outside("..")]
fn path_must_be_strictly_inside_root(project: TempDir, #[case] relative: &str) {
    let target = arg(project.path().join("app").join(relative));
    let root = arg(project.path().join("app"));

    let outcome = invoke(&[&target, &arg("-d"), &root, &arg("--log-filter"), &arg("off")]);

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("must be inside the root directory"));
}

#[rstest]
fn unknown_rules_fail_before_touching_files(project: TempDir) {
    let target = arg(project.path().join("app"));
    let root = arg(project.path());

    let outcome = invoke(&[
        &target,
        &arg("-d"),
        &root,
        &arg("-r"),
        &arg("bogus"),
        &arg("-w"),
        &arg("--log-filter"),
        &arg("off"),
    ]);

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("unknown rule 'bogus'"));
    assert_eq!(
        fs::read_to_string(project.path().join("app/src/HomePage.php")).expect("read page"),
        PAGE
    );
}

#[test]
fn missing_definitions_are_a_configuration_error() {
    let dir = TempDir::new().expect("create temp dir");
    write(dir.path(), "app/src/Page.php", "<?php\n");
    let target = arg(dir.path().join("app"));
    let root = arg(dir.path());

    let outcome = invoke(&[&target, &arg("-d"), &root, &arg("--log-filter"), &arg("off")]);

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("no .upgrade.yml definitions found"));
}

#[test]
fn help_goes_to_stdout() {
    let outcome = invoke(&[&arg("--help")]);

    assert_eq!(outcome.code, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("--root-dir"));
    assert!(outcome.stderr.is_empty());
}
