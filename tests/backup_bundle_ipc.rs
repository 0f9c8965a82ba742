mod common;

use common::{seed_fixture, str_field, temp_dir, Sidecar};
use serde_json::json;

#[test]
fn export_then_import_restores_marks() {
    let mut sc = Sidecar::spawn();
    let fx = seed_fixture(&mut sc, "resultsd-backup-ipc");
    let bundle = temp_dir("resultsd-backup-ipc-out").join("term1.zip");

    let exported = sc.request_ok(
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"], json!("resultsd-workspace-v1"));
    assert_eq!(exported["entryCount"], json!(2));
    let sha = str_field(&exported, "dbSha256");
    assert!(bundle.is_file());

    // Change a mark after the backup was taken.
    sc.request_ok(
        "marks.upsert",
        json!({ "examId": fx.exam_id, "studentId": fx.amina, "subjectId": fx.phy, "marks": 10 }),
    );
    let r = sc.request_ok(
        "results.student",
        json!({ "examId": fx.exam_id, "studentId": fx.amina }),
    );
    // F(7) + B(2) + A(1)
    assert_eq!(r["bestThreePoints"], json!(10));

    let imported = sc.request_ok(
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(imported["dbSha256"], json!(sha));
    assert_eq!(imported["bundleFormatDetected"], json!("resultsd-workspace-v1"));

    let r = sc.request_ok(
        "results.student",
        json!({ "examId": fx.exam_id, "studentId": fx.amina }),
    );
    assert_eq!(r["bestThreePoints"], json!(4));
}

#[test]
fn import_into_another_workspace_leaves_current_open() {
    let mut sc = Sidecar::spawn();
    let fx = seed_fixture(&mut sc, "resultsd-backup-other");
    let bundle = fx.workspace.join("bundle.zip");
    sc.request_ok(
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );

    let other = temp_dir("resultsd-backup-other-dst");
    sc.request_ok(
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy(), "workspacePath": other.to_string_lossy() }),
    );
    let health = sc.request_ok("health", json!({}));
    assert_eq!(
        health["workspacePath"],
        json!(fx.workspace.to_string_lossy())
    );

    sc.request_ok(
        "workspace.select",
        json!({ "path": other.to_string_lossy() }),
    );
    let class = sc.request_ok("results.class", json!({ "examId": fx.exam_id }));
    assert_eq!(class["students"].as_array().expect("students").len(), 3);
}

#[test]
fn bad_bundles_fail_without_losing_the_workspace() {
    let mut sc = Sidecar::spawn();
    let fx = seed_fixture(&mut sc, "resultsd-backup-bad");
    let junk = fx.workspace.join("junk.zip");
    std::fs::write(&junk, b"definitely not a zip").expect("write junk");

    assert_eq!(
        sc.request_err(
            "backup.importWorkspaceBundle",
            json!({ "inPath": junk.to_string_lossy() })
        ),
        "io_failed"
    );
    assert_eq!(
        sc.request_err("backup.importWorkspaceBundle", json!({})),
        "bad_params"
    );

    let class = sc.request_ok("results.class", json!({ "examId": fx.exam_id }));
    assert_eq!(class["students"].as_array().expect("students").len(), 3);
}

#[test]
fn export_requires_a_workspace() {
    let mut sc = Sidecar::spawn();
    let out = temp_dir("resultsd-backup-nows").join("x.zip");
    assert_eq!(
        sc.request_err(
            "backup.exportWorkspaceBundle",
            json!({ "outPath": out.to_string_lossy() })
        ),
        "no_workspace"
    );
}
