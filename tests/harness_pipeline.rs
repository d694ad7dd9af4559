//! End-to-end pipeline tests: scratch directories of scripted fake test
//! binaries driven through the real harness.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use runtests::{HarnessBuilder, SearchDepth, TestRunner, Verdict};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn plain_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    path
}

#[tokio::test]
async fn mixed_suite_is_aggregated_in_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tAlpha", "echo '  PASSED: alpha one'\necho '  PASSED: alpha two'\n");
    script(dir.path(), "tBravo", "echo '  PASSED: fine'\necho '  FAILED: not fine'\n");
    script(dir.path(), "tCharlie", "echo 'warming up, nothing to report'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 3);
    assert_eq!(report.total_passed, 1);
    assert!(!report.success());

    let verdicts: Vec<_> = report.verdicts.iter().map(|(n, v)| (n.as_str(), *v)).collect();
    assert_eq!(
        verdicts,
        vec![
            ("tAlpha", Verdict::Passed),
            ("tBravo", Verdict::Failed),
            ("tCharlie", Verdict::NoTests),
        ]
    );
}

#[tokio::test]
async fn transcript_contains_one_bracketed_block_per_run() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tFirst", "echo '  PASSED: a'\n");
    script(dir.path(), "tSecond", "echo '  PASSED: b'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();
    assert!(report.success());

    let text = fs::read_to_string(dir.path().join("testresults.txt")).unwrap();
    let separator = "=".repeat(80);

    // preamble + (header sep + closing sep) per run
    assert_eq!(text.matches(&separator).count(), 5);

    let first = text.find("  Running test <tFirst>").unwrap();
    let second = text.find("  Running test <tSecond>").unwrap();
    assert!(first < second);
    assert!(text.contains("  PASSED: a"));
    assert!(text.contains("  PASSED: b"));
}

#[tokio::test]
async fn missing_root_aborts_before_any_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere");

    let harness = HarnessBuilder::new(&missing).build().unwrap();
    let err = harness.run().await.unwrap_err();

    assert!(matches!(err, runtests::HarnessError::DirectoryNotFound(_)));
    assert!(!missing.exists());
    assert!(!dir.path().join("testresults.txt").exists());
}

#[tokio::test]
async fn empty_root_executes_nothing_and_is_not_a_success() {
    let dir = tempfile::tempdir().unwrap();
    plain_file(dir.path(), "tLooksLikeATest", "but has no execute bit\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 0);
    assert_eq!(report.total_passed, 0);
    assert!(report.verdicts.is_empty());
    assert!(!report.success());
}

#[tokio::test]
async fn unlaunchable_candidate_does_not_stop_the_suite() {
    let dir = tempfile::tempdir().unwrap();
    // Executable bit set, but no shebang and not a real binary: exec fails
    let broken = dir.path().join("tBroken");
    fs::write(&broken, b"\x00\x01\x02 not a program").unwrap();
    fs::set_permissions(&broken, fs::Permissions::from_mode(0o755)).unwrap();
    script(dir.path(), "tWorks", "echo '  PASSED: still here'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 2);
    assert_eq!(report.total_passed, 1);

    let broken_verdict = report.verdicts.iter().find(|(n, _)| n == "tBroken").unwrap().1;
    assert_eq!(broken_verdict, Verdict::ExecutionError);
    let works_verdict = report.verdicts.iter().find(|(n, _)| n == "tWorks").unwrap().1;
    assert_eq!(works_verdict, Verdict::Passed);
}

#[tokio::test]
async fn segfault_output_fails_the_candidate() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tCrashy", "echo 'Segmentation fault (core dumped)'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 1);
    assert_eq!(report.total_passed, 0);
    assert_eq!(report.verdicts[0].1, Verdict::Failed);
}

#[tokio::test]
async fn nested_candidates_are_found_one_level_down() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("surfaces");
    fs::create_dir(&sub).unwrap();
    script(&sub, "tPlane", "echo '  PASSED: plane'\n");
    script(dir.path(), "tTop", "echo '  PASSED: top'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 2);
    assert_eq!(report.total_passed, 2);
    assert!(report.success());
    assert_eq!(report.verdicts[0].0, "tTop");
    assert_eq!(report.verdicts[1].0, "surfaces/tPlane");
}

#[tokio::test]
async fn search_depth_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    script(&sub, "tNested", "echo '  PASSED: nested'\n");
    script(dir.path(), "tTop", "echo '  PASSED: top'\n");

    let harness = HarnessBuilder::new(dir.path())
        .depth(SearchDepth::NestedOnly)
        .build()
        .unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 1);
    assert_eq!(report.verdicts[0].0, "sub/tNested");
}

#[tokio::test]
async fn custom_prefix_and_output_name() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "check_math", "echo '  PASSED: math'\n");
    script(dir.path(), "tIgnored", "echo '  FAILED: wrong prefix would fail'\n");

    let harness = HarnessBuilder::new(dir.path())
        .prefix("check_")
        .output("results.log")
        .build()
        .unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 1);
    assert!(report.success());
    assert!(dir.path().join("results.log").exists());
    assert!(!dir.path().join("testresults.txt").exists());
}

#[tokio::test]
async fn bounded_run_times_out_without_stopping_the_suite() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tHangs", "sleep 30\necho '  PASSED: never reached'\n");
    script(dir.path(), "tQuick", "echo '  PASSED: quick'\n");

    let harness = HarnessBuilder::new(dir.path()).timeout(1).build().unwrap();
    let report = harness.run().await.unwrap();

    assert_eq!(report.total_executed, 2);
    assert_eq!(report.total_passed, 1);

    let hangs = report.verdicts.iter().find(|(n, _)| n == "tHangs").unwrap().1;
    assert_eq!(hangs, Verdict::Timeout);
}

#[tokio::test]
async fn transcript_is_rewritten_on_each_invocation() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tOnly", "echo '  PASSED: only'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    harness.run().await.unwrap();
    let first = fs::read_to_string(dir.path().join("testresults.txt")).unwrap();

    harness.run().await.unwrap();
    let second = fs::read_to_string(dir.path().join("testresults.txt")).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.matches("Running test <tOnly>").count(), 1);
}

#[test]
fn blocking_runner_matches_the_async_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tSync", "echo '  PASSED: sync'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run_tests().unwrap();

    assert_eq!(report.total_executed, 1);
    assert_eq!(report.total_passed, 1);
    assert!(report.success());
}

#[tokio::test]
async fn json_report_is_written_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    script(dir.path(), "tJson", "echo '  PASSED: json'\n");

    let harness = HarnessBuilder::new(dir.path()).build().unwrap();
    let report = harness.run().await.unwrap();

    let report_path = dir.path().join("report.json");
    report.save_to_file(&report_path).unwrap();

    let text = fs::read_to_string(&report_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["total_executed"], 1);
    assert_eq!(value["total_passed"], 1);
}
