mod common;

use common::{seed_fixture, Sidecar};
use serde_json::json;

fn row<'a>(dist: &'a serde_json::Value, grade: &str) -> &'a serde_json::Value {
    dist["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .find(|r| r["grade"] == json!(grade))
        .unwrap_or_else(|| panic!("grade {} missing", grade))
}

#[test]
fn subject_distribution_counts_percentages_and_gpa() {
    let mut sc = Sidecar::spawn();
    let fx = seed_fixture(&mut sc, "resultsd-report-subject");

    let phy = sc.request_ok(
        "reports.subjectDistribution",
        json!({ "examId": fx.exam_id, "subjectId": fx.phy }),
    );
    assert_eq!(phy["subject"]["code"], json!("PHY"));
    let dist = &phy["distribution"];
    assert_eq!(dist["rows"].as_array().expect("rows").len(), 7);
    assert_eq!(dist["graded"], json!(3));
    assert_eq!(dist["notGraded"], json!(0));
    for grade in ["A", "D", "F"] {
        assert_eq!(row(dist, grade)["count"], json!(1));
        assert_eq!(row(dist, grade)["percentage"], json!(33.3));
    }
    assert_eq!(row(dist, "B")["percentage"], json!(0.0));
    assert_eq!(phy["passRate"], json!(66.7));
    assert_eq!(phy["gpa"]["method"], json!("grade_distribution"));
    assert_eq!(phy["gpa"]["value"], json!(4.0));

    let che = sc.request_ok(
        "reports.subjectDistribution",
        json!({ "examId": fx.exam_id, "subjectId": fx.che }),
    );
    let dist = &che["distribution"];
    assert_eq!(dist["notGraded"], json!(1));
    assert_eq!(row(dist, "B")["percentage"], json!(50.0));
    assert_eq!(row(dist, "E")["percentage"], json!(50.0));
    assert_eq!(che["passRate"], json!(100.0));
    assert_eq!(che["gpa"]["value"], json!(3.5));
}

#[test]
fn subject_with_no_marks_reports_zeroes() {
    let mut sc = Sidecar::spawn();
    let fx = seed_fixture(&mut sc, "resultsd-report-empty");
    let bio = sc.request_ok(
        "subjects.create",
        json!({ "classId": fx.class_id, "code": "BIO", "name": "Biology" }),
    );
    let report = sc.request_ok(
        "reports.subjectDistribution",
        json!({ "examId": fx.exam_id, "subjectId": bio["subjectId"] }),
    );
    assert_eq!(report["distribution"]["graded"], json!(0));
    assert_eq!(report["passRate"], json!(0.0));
    assert_eq!(report["gpa"]["value"], json!(null));
    assert!(report["distribution"]["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .all(|r| r["percentage"] == json!(0.0)));

    assert_eq!(
        sc.request_err(
            "reports.subjectDistribution",
            json!({ "examId": fx.exam_id, "subjectId": "missing" })
        ),
        "not_found"
    );
}

#[test]
fn exam_summary_reports_both_gpa_methods() {
    let mut sc = Sidecar::spawn();
    let fx = seed_fixture(&mut sc, "resultsd-report-summary");

    let summary = sc.request_ok("reports.examSummary", json!({ "examId": fx.exam_id }));
    assert_eq!(summary["exam"]["className"], json!("Form Six PCM"));
    assert_eq!(summary["subjects"].as_array().expect("subjects").len(), 4);
    assert_eq!(summary["divisionSummary"]["divisionI"], json!(1));
    assert_eq!(summary["divisionSummary"]["divisionII"], json!(1));
    assert_eq!(summary["divisionSummary"]["incomplete"], json!(1));
    assert_eq!(summary["classPassRate"], json!(100.0));

    let gpa = summary["examGpa"].as_array().expect("gpa");
    assert_eq!(gpa[0]["method"], json!("student_best_three"));
    assert_eq!(gpa[0]["value"], json!(8.0));
    assert_eq!(gpa[1]["method"], json!("grade_distribution"));
    assert_eq!(gpa[1]["value"], json!(3.125));

    let legend = summary["gradeLegend"].as_array().expect("legend");
    assert_eq!(legend.len(), 7);
    assert_eq!(legend[0], json!({ "grade": "A", "points": 1 }));
    assert_eq!(legend[6], json!({ "grade": "F", "points": 7 }));
    assert_eq!(
        summary["divisionBands"][2],
        json!({ "division": "III", "min": 13, "max": 17 })
    );
}
