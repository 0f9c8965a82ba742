use crate::config::ResolvedGrading;
use crate::grading::{
    best_three_and_division, grade_distribution, grade_for, BestSubject, DivisionBand,
    DivisionOutcome, DivisionResult, Grade, GradeOutcome, SubjectResult,
};
use crate::metrics::{self, DivisionSummary, GpaValue, LegendRow, SubjectMetrics};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ResultsError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ResultsError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

fn db_err(e: rusqlite::Error) -> ResultsError {
    ResultsError::new("db_query_failed", e.to_string())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInfo {
    pub id: String,
    pub class_id: String,
    pub class_name: String,
    pub name: String,
    pub term: Option<i64>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInfo {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_principal: bool,
    pub sort_order: i64,
}

#[derive(Debug, Clone)]
struct StudentInfo {
    id: String,
    display_name: String,
    admission_no: Option<String>,
    combination: Option<String>,
    active: bool,
}

#[derive(Debug, Clone, Copy)]
struct MarkRow {
    marks: Option<f64>,
    is_principal: Option<bool>,
}

/// Everything needed to grade one exam, loaded in a handful of queries.
pub struct ExamContext {
    pub exam: ExamInfo,
    pub subjects: Vec<SubjectInfo>,
    students: Vec<StudentInfo>,
    marks: HashMap<(String, String), MarkRow>,
}

pub fn load_exam_context(conn: &Connection, exam_id: &str) -> Result<ExamContext, ResultsError> {
    let exam: Option<ExamInfo> = conn
        .query_row(
            "SELECT e.id, e.class_id, c.name, e.name, e.term, e.year
             FROM exams e
             JOIN classes c ON c.id = e.class_id
             WHERE e.id = ?",
            [exam_id],
            |r| {
                Ok(ExamInfo {
                    id: r.get(0)?,
                    class_id: r.get(1)?,
                    class_name: r.get(2)?,
                    name: r.get(3)?,
                    term: r.get(4)?,
                    year: r.get(5)?,
                })
            },
        )
        .optional()
        .map_err(db_err)?;
    let Some(exam) = exam else {
        return Err(ResultsError::new("not_found", "exam not found"));
    };

    let mut subjects_stmt = conn
        .prepare(
            "SELECT id, code, name, is_principal, sort_order
             FROM subjects
             WHERE class_id = ?
             ORDER BY sort_order, code",
        )
        .map_err(db_err)?;
    let subjects: Vec<SubjectInfo> = subjects_stmt
        .query_map([&exam.class_id], |r| {
            Ok(SubjectInfo {
                id: r.get(0)?,
                code: r.get(1)?,
                name: r.get(2)?,
                is_principal: r.get::<_, i64>(3)? != 0,
                sort_order: r.get(4)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err)?;

    let mut students_stmt = conn
        .prepare(
            "SELECT id, last_name, first_name, admission_no, combination, active
             FROM students
             WHERE class_id = ?
             ORDER BY sort_order",
        )
        .map_err(db_err)?;
    let students: Vec<StudentInfo> = students_stmt
        .query_map([&exam.class_id], |r| {
            let last: String = r.get(1)?;
            let first: String = r.get(2)?;
            Ok(StudentInfo {
                id: r.get(0)?,
                display_name: format!("{}, {}", last, first),
                admission_no: r.get(3)?,
                combination: r.get(4)?,
                active: r.get::<_, i64>(5)? != 0,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err)?;

    let mut marks_stmt = conn
        .prepare(
            "SELECT student_id, subject_id, marks, is_principal
             FROM marks
             WHERE exam_id = ?",
        )
        .map_err(db_err)?;
    let mut marks: HashMap<(String, String), MarkRow> = HashMap::new();
    let rows = marks_stmt
        .query_map([exam_id], |r| {
            let student_id: String = r.get(0)?;
            let subject_id: String = r.get(1)?;
            let value: Option<f64> = r.get(2)?;
            let is_principal: Option<i64> = r.get(3)?;
            Ok((student_id, subject_id, value, is_principal))
        })
        .map_err(db_err)?;
    for row in rows {
        let (student_id, subject_id, value, is_principal) = row.map_err(db_err)?;
        marks.insert(
            (student_id, subject_id),
            MarkRow {
                marks: value,
                is_principal: is_principal.map(|v| v != 0),
            },
        );
    }

    debug!(
        exam_id,
        subjects = subjects.len(),
        students = students.len(),
        marks = marks.len(),
        "loaded exam context"
    );

    Ok(ExamContext {
        exam,
        subjects,
        students,
        marks,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub subject_id: String,
    pub code: String,
    pub subject_name: String,
    pub marks: Option<f64>,
    pub grade: Option<Grade>,
    pub grade_label: &'static str,
    pub points: Option<u8>,
    pub status: &'static str,
    pub is_principal: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    pub student_id: String,
    pub display_name: String,
    pub admission_no: Option<String>,
    pub combination: Option<String>,
    pub active: bool,
    pub subjects: Vec<SubjectRow>,
    pub best_three_subjects: Vec<BestSubject>,
    pub best_three_points: Option<i64>,
    pub division: DivisionOutcome,
    pub principal_fallback_applied: bool,
    pub position: Option<usize>,
}

impl ExamContext {
    /// The subjects a student sits in this exam: those with a marks row,
    /// in subject order.
    fn subject_set(&self, student_id: &str) -> Vec<(&SubjectInfo, SubjectResult)> {
        self.subjects
            .iter()
            .filter_map(|subj| {
                let row = self
                    .marks
                    .get(&(student_id.to_string(), subj.id.clone()))?;
                let principal = row.is_principal.unwrap_or(subj.is_principal);
                Some((subj, SubjectResult::new(subj.name.clone(), row.marks, principal)))
            })
            .collect()
    }

    fn grade_student(&self, student: &StudentInfo, grading: &ResolvedGrading) -> StudentResult {
        let set = self.subject_set(&student.id);
        let inputs: Vec<SubjectResult> = set.iter().map(|(_, r)| r.clone()).collect();
        let division = best_three_and_division(
            &inputs,
            grading.config.principal_policy,
            &grading.table,
        );
        if division.principal_fallback_applied && !inputs.is_empty() {
            warn!(
                exam_id = %self.exam.id,
                student_id = %student.id,
                "no principal subjects flagged; treating all subjects as principal"
            );
        }

        let subjects = set
            .iter()
            .map(|(info, r)| {
                let outcome = r.grade();
                SubjectRow {
                    subject_id: info.id.clone(),
                    code: info.code.clone(),
                    subject_name: info.name.clone(),
                    marks: r.marks,
                    grade: outcome.grade(),
                    grade_label: outcome.label(),
                    points: outcome.points(),
                    status: outcome.status(),
                    is_principal: r.is_principal,
                }
            })
            .collect();

        let DivisionResult {
            best_three_subjects,
            best_three_points,
            division,
            principal_fallback_applied,
        } = division;

        StudentResult {
            student_id: student.id.clone(),
            display_name: student.display_name.clone(),
            admission_no: student.admission_no.clone(),
            combination: student.combination.clone(),
            active: student.active,
            subjects,
            best_three_subjects,
            best_three_points,
            division,
            principal_fallback_applied,
            position: None,
        }
    }

    fn subject_outcomes(&self, subject_id: &str) -> Vec<GradeOutcome> {
        self.students
            .iter()
            .filter(|s| s.active)
            .filter_map(|s| self.marks.get(&(s.id.clone(), subject_id.to_string())))
            .map(|row| grade_for(row.marks))
            .collect()
    }
}

pub fn student_result(
    ctx: &ExamContext,
    student_id: &str,
    grading: &ResolvedGrading,
) -> Result<StudentResult, ResultsError> {
    let Some(student) = ctx.students.iter().find(|s| s.id == student_id) else {
        return Err(ResultsError::new("not_found", "student not found")
            .with_details(serde_json::json!({ "studentId": student_id })));
    };
    Ok(ctx.grade_student(student, grading))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassResults {
    pub exam: ExamInfo,
    pub subjects: Vec<SubjectInfo>,
    pub students: Vec<StudentResult>,
    pub division_summary: DivisionSummary,
    pub class_pass_rate: f64,
    pub gpa: GpaValue,
}

/// Per-student results, ranked by best-three points. Inactive students are
/// listed (when requested) but never ranked or counted.
pub fn class_results(
    ctx: &ExamContext,
    grading: &ResolvedGrading,
    include_inactive: bool,
) -> ClassResults {
    let mut students: Vec<StudentResult> = ctx
        .students
        .iter()
        .filter(|s| include_inactive || s.active)
        .map(|s| ctx.grade_student(s, grading))
        .collect();

    let rank_points: Vec<Option<i64>> = students
        .iter()
        .map(|s| if s.active { s.best_three_points } else { None })
        .collect();
    for (s, position) in students
        .iter_mut()
        .zip(metrics::rank_by_points(&rank_points))
    {
        s.position = position;
    }

    let active: Vec<&StudentResult> = students.iter().filter(|s| s.active).collect();
    let division_summary = metrics::division_summary(active.iter().map(|s| &s.division));
    let class_pass_rate = metrics::class_pass_rate(&division_summary);
    let gpa = GpaValue {
        method: metrics::GPA_METHOD_STUDENT,
        value: metrics::student_based_gpa(active.iter().map(|s| s.best_three_points)),
    };

    ClassResults {
        exam: ctx.exam.clone(),
        subjects: ctx.subjects.clone(),
        students,
        division_summary,
        class_pass_rate,
        gpa,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub exam: ExamInfo,
    pub subject: SubjectInfo,
    #[serde(flatten)]
    pub metrics: SubjectMetrics,
}

pub fn subject_report(ctx: &ExamContext, subject_id: &str) -> Result<SubjectReport, ResultsError> {
    let Some(subject) = ctx.subjects.iter().find(|s| s.id == subject_id) else {
        return Err(ResultsError::new("not_found", "subject not found")
            .with_details(serde_json::json!({ "subjectId": subject_id })));
    };
    let distribution = grade_distribution(ctx.subject_outcomes(subject_id));
    Ok(SubjectReport {
        exam: ctx.exam.clone(),
        subject: subject.clone(),
        metrics: metrics::subject_metrics(distribution),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject: SubjectInfo,
    #[serde(flatten)]
    pub metrics: SubjectMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub exam: ExamInfo,
    pub subjects: Vec<SubjectSummary>,
    pub division_summary: DivisionSummary,
    pub class_pass_rate: f64,
    pub exam_gpa: Vec<GpaValue>,
    pub grade_legend: Vec<LegendRow>,
    pub division_bands: Vec<DivisionBand>,
}

pub fn exam_summary(ctx: &ExamContext, grading: &ResolvedGrading) -> ExamSummary {
    let subjects: Vec<SubjectSummary> = ctx
        .subjects
        .iter()
        .map(|s| SubjectSummary {
            subject: s.clone(),
            metrics: metrics::subject_metrics(grade_distribution(ctx.subject_outcomes(&s.id))),
        })
        .collect();

    let graded: Vec<StudentResult> = ctx
        .students
        .iter()
        .filter(|s| s.active)
        .map(|s| ctx.grade_student(s, grading))
        .collect();
    let division_summary = metrics::division_summary(graded.iter().map(|s| &s.division));
    let class_pass_rate = metrics::class_pass_rate(&division_summary);

    let student_gpa = metrics::student_based_gpa(graded.iter().map(|s| s.best_three_points));
    // Graded principal entries across the whole exam.
    let principal_entries = grade_distribution(graded.iter().flat_map(|s| {
        s.subjects
            .iter()
            .filter(move |r| r.is_principal || s.principal_fallback_applied)
            .map(|r| grade_for(r.marks))
            .filter(|g| g.grade().is_some())
    }));

    ExamSummary {
        exam: ctx.exam.clone(),
        subjects,
        division_summary,
        class_pass_rate,
        exam_gpa: vec![
            GpaValue {
                method: metrics::GPA_METHOD_STUDENT,
                value: student_gpa,
            },
            GpaValue {
                method: metrics::GPA_METHOD_DISTRIBUTION,
                value: metrics::distribution_gpa(&principal_entries),
            },
        ],
        grade_legend: metrics::grade_legend(),
        division_bands: grading.table.bands().to_vec(),
    }
}
