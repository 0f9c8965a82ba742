//! Class-level reporting views built on top of the grading engine.
//!
//! Two GPA formulas are in use by existing reports and neither is treated as
//! authoritative here; both are exposed with their method name attached.

use crate::grading::{
    round_off_1_decimal, Division, DivisionOutcome, Grade, GradeDistribution,
};
use serde::Serialize;

pub const GPA_METHOD_STUDENT: &str = "student_best_three";
pub const GPA_METHOD_DISTRIBUTION: &str = "grade_distribution";

fn round_4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Percentage of graded entries that are not F. 0 when nothing is graded.
pub fn subject_pass_rate(dist: &GradeDistribution) -> f64 {
    if dist.graded == 0 {
        return 0.0;
    }
    let passed = dist.graded - dist.count(Grade::F);
    round_off_1_decimal(100.0 * passed as f64 / dist.graded as f64)
}

/// Σ(count × points) ÷ graded entries.
pub fn distribution_gpa(dist: &GradeDistribution) -> Option<f64> {
    if dist.graded == 0 {
        return None;
    }
    let weighted: usize = dist
        .rows
        .iter()
        .map(|r| r.count * usize::from(r.grade.points()))
        .sum();
    Some(round_4(weighted as f64 / dist.graded as f64))
}

/// Mean best-three points over students with a complete division.
pub fn student_based_gpa<I>(best_three_points: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<i64>>,
{
    let mut sum = 0_i64;
    let mut n = 0_i64;
    for points in best_three_points {
        if let Some(p) = points {
            sum += p;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    Some(round_4(sum as f64 / n as f64))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionSummary {
    #[serde(rename = "divisionI")]
    pub division_i: usize,
    #[serde(rename = "divisionII")]
    pub division_ii: usize,
    #[serde(rename = "divisionIII")]
    pub division_iii: usize,
    #[serde(rename = "divisionIV")]
    pub division_iv: usize,
    pub division_zero: usize,
    pub incomplete: usize,
}

impl DivisionSummary {
    pub fn count(&self, d: Division) -> usize {
        match d {
            Division::I => self.division_i,
            Division::II => self.division_ii,
            Division::III => self.division_iii,
            Division::IV => self.division_iv,
            Division::Zero => self.division_zero,
        }
    }

    pub fn complete(&self) -> usize {
        Division::ALL.iter().map(|&d| self.count(d)).sum()
    }

    pub fn passed(&self) -> usize {
        Division::ALL
            .iter()
            .filter(|d| d.is_pass())
            .map(|&d| self.count(d))
            .sum()
    }
}

pub fn division_summary<'a, I>(outcomes: I) -> DivisionSummary
where
    I: IntoIterator<Item = &'a DivisionOutcome>,
{
    let mut s = DivisionSummary::default();
    for o in outcomes {
        match o {
            DivisionOutcome::Division(Division::I) => s.division_i += 1,
            DivisionOutcome::Division(Division::II) => s.division_ii += 1,
            DivisionOutcome::Division(Division::III) => s.division_iii += 1,
            DivisionOutcome::Division(Division::IV) => s.division_iv += 1,
            DivisionOutcome::Division(Division::Zero) => s.division_zero += 1,
            DivisionOutcome::Incomplete => s.incomplete += 1,
        }
    }
    s
}

/// Share of complete students in divisions I-IV. Incomplete students are
/// left out of the denominator.
pub fn class_pass_rate(summary: &DivisionSummary) -> f64 {
    let complete = summary.complete();
    if complete == 0 {
        return 0.0;
    }
    round_off_1_decimal(100.0 * summary.passed() as f64 / complete as f64)
}

/// Competition ranking (1, 2, 2, 4) by ascending points. `None` entries
/// are unranked and do not consume a position.
pub fn rank_by_points(points: &[Option<i64>]) -> Vec<Option<usize>> {
    let mut ranked: Vec<(usize, i64)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.map(|p| (i, p)))
        .collect();
    ranked.sort_by_key(|&(_, p)| p);

    let mut out = vec![None; points.len()];
    let mut prev: Option<i64> = None;
    let mut rank = 0usize;
    for (pos, (i, p)) in ranked.into_iter().enumerate() {
        if prev != Some(p) {
            rank = pos + 1;
            prev = Some(p);
        }
        out[i] = Some(rank);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaValue {
    pub method: &'static str,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMetrics {
    pub distribution: GradeDistribution,
    pub pass_rate: f64,
    pub gpa: GpaValue,
}

pub fn subject_metrics(distribution: GradeDistribution) -> SubjectMetrics {
    SubjectMetrics {
        pass_rate: subject_pass_rate(&distribution),
        gpa: GpaValue {
            method: GPA_METHOD_DISTRIBUTION,
            value: distribution_gpa(&distribution),
        },
        distribution,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendRow {
    pub grade: Grade,
    pub points: u8,
}

/// Grade band lookup used by report legends.
pub fn grade_legend() -> Vec<LegendRow> {
    Grade::ALL
        .iter()
        .map(|&grade| LegendRow {
            grade,
            points: grade.points(),
        })
        .collect()
}
