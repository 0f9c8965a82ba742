//! ACSEE grading engine: marks -> grade -> points -> best three -> division.
//!
//! Everything here is a pure function of its inputs. Bad input never panics;
//! it comes back as a `GradeOutcome` / `DivisionOutcome` sentinel so callers
//! can render a placeholder.

use serde::{Deserialize, Serialize, Serializer};

/// Points used when a grade letter arrives from a payload and is not one of
/// A..F. Ungraded subjects in the typed API never reach this value.
pub const UNRECOGNIZED_GRADE_POINTS: u8 = 7;

/// Minimum number of principal subjects needed to award a division.
pub const BEST_SUBJECT_COUNT: usize = 3;

/// VB6-compatible 1-decimal rounding: `Int(10*x + 0.5) / 10`
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    S,
    F,
}

impl Grade {
    pub const ALL: [Grade; 7] = [
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::E,
        Grade::S,
        Grade::F,
    ];

    pub fn points(self) -> u8 {
        match self {
            Grade::A => 1,
            Grade::B => 2,
            Grade::C => 3,
            Grade::D => 4,
            Grade::E => 5,
            Grade::S => 6,
            Grade::F => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::S => "S",
            Grade::F => "F",
        }
    }

    /// Case-insensitive, whitespace-tolerant letter lookup.
    pub fn from_letter(s: &str) -> Option<Grade> {
        let t = s.trim();
        Grade::ALL
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(t))
    }
}

/// Raw marks as they arrive from a form or payload, before grading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkEntry {
    NotEntered,
    Invalid,
    Value(f64),
}

impl MarkEntry {
    /// `Some(v)` only for finite values inside [0,100].
    pub fn marks(self) -> Option<f64> {
        match self {
            MarkEntry::Value(v) if v.is_finite() && (0.0..=100.0).contains(&v) => Some(v),
            _ => None,
        }
    }

    pub fn grade(self) -> GradeOutcome {
        match self {
            MarkEntry::NotEntered => GradeOutcome::NotEntered,
            MarkEntry::Invalid => GradeOutcome::Invalid,
            MarkEntry::Value(v) => grade_for(Some(v)),
        }
    }
}

pub fn parse_marks_str(raw: &str) -> MarkEntry {
    let t = raw.trim();
    if t.is_empty() {
        return MarkEntry::NotEntered;
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => MarkEntry::Value(v),
        _ => MarkEntry::Invalid,
    }
}

/// Accepts a JSON number, a numeric string, or null/empty for "not entered".
pub fn parse_marks(raw: &serde_json::Value) -> MarkEntry {
    match raw {
        serde_json::Value::Null => MarkEntry::NotEntered,
        serde_json::Value::String(s) => parse_marks_str(s),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => MarkEntry::Value(v),
            _ => MarkEntry::Invalid,
        },
        _ => MarkEntry::Invalid,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeOutcome {
    Graded(Grade),
    NotEntered,
    Invalid,
}

impl GradeOutcome {
    pub fn grade(self) -> Option<Grade> {
        match self {
            GradeOutcome::Graded(g) => Some(g),
            _ => None,
        }
    }

    /// Ungraded outcomes have no points; they are skipped by best-three.
    pub fn points(self) -> Option<u8> {
        self.grade().map(Grade::points)
    }

    /// Display label; "-" for anything without a grade.
    pub fn label(self) -> &'static str {
        match self {
            GradeOutcome::Graded(g) => g.as_str(),
            _ => "-",
        }
    }

    pub fn status(self) -> &'static str {
        match self {
            GradeOutcome::Graded(_) => "graded",
            GradeOutcome::NotEntered => "not_entered",
            GradeOutcome::Invalid => "invalid",
        }
    }
}

/// Marks to grade, evaluated high to low with inclusive lower bounds.
pub fn grade_for(marks: Option<f64>) -> GradeOutcome {
    let Some(m) = marks else {
        return GradeOutcome::NotEntered;
    };
    if !m.is_finite() || !(0.0..=100.0).contains(&m) {
        return GradeOutcome::Invalid;
    }
    let grade = match m {
        m if m >= 80.0 => Grade::A,
        m if m >= 70.0 => Grade::B,
        m if m >= 60.0 => Grade::C,
        m if m >= 50.0 => Grade::D,
        m if m >= 40.0 => Grade::E,
        m if m >= 35.0 => Grade::S,
        _ => Grade::F,
    };
    GradeOutcome::Graded(grade)
}

/// Letter to points for string payloads. Unknown letters score as a fail.
pub fn points_for(letter: &str) -> u8 {
    Grade::from_letter(letter)
        .map(Grade::points)
        .unwrap_or(UNRECOGNIZED_GRADE_POINTS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
    #[serde(rename = "0")]
    Zero,
}

impl Division {
    pub const ALL: [Division; 5] = [
        Division::I,
        Division::II,
        Division::III,
        Division::IV,
        Division::Zero,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::IV => "IV",
            Division::Zero => "0",
        }
    }

    /// Divisions I to IV; division 0 is a fail.
    pub fn is_pass(self) -> bool {
        self != Division::Zero
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionOutcome {
    Division(Division),
    /// Fewer than three principal subjects with marks. Not the same as "0".
    Incomplete,
}

impl DivisionOutcome {
    pub fn division(self) -> Option<Division> {
        match self {
            DivisionOutcome::Division(d) => Some(d),
            DivisionOutcome::Incomplete => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DivisionOutcome::Division(d) => d.as_str(),
            DivisionOutcome::Incomplete => "-",
        }
    }
}

impl Serialize for DivisionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DivisionOutcome::Division(d) => serializer.serialize_str(d.as_str()),
            DivisionOutcome::Incomplete => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionBand {
    pub division: Division,
    pub min: i64,
    pub max: i64,
}

pub const fn band(division: Division, min: i64, max: i64) -> DivisionBand {
    DivisionBand { division, min, max }
}

/// Inclusive point ranges per division. Points outside every band are "0".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionTable {
    bands: Vec<DivisionBand>,
}

impl Default for DivisionTable {
    fn default() -> Self {
        Self {
            bands: vec![
                band(Division::I, 3, 9),
                band(Division::II, 10, 12),
                band(Division::III, 13, 17),
                band(Division::IV, 18, 19),
            ],
        }
    }
}

impl DivisionTable {
    pub fn new(mut bands: Vec<DivisionBand>) -> anyhow::Result<Self> {
        if bands.is_empty() {
            anyhow::bail!("at least one division band is required");
        }
        for b in &bands {
            if b.division == Division::Zero {
                anyhow::bail!("division 0 is implied and cannot be banded");
            }
            if b.min > b.max {
                anyhow::bail!(
                    "band for division {} has min {} > max {}",
                    b.division.as_str(),
                    b.min,
                    b.max
                );
            }
        }
        bands.sort_by_key(|b| b.min);
        for pair in bands.windows(2) {
            if pair[1].min <= pair[0].max {
                anyhow::bail!(
                    "bands for divisions {} and {} overlap",
                    pair[0].division.as_str(),
                    pair[1].division.as_str()
                );
            }
        }
        let mut seen: Vec<Division> = bands.iter().map(|b| b.division).collect();
        seen.sort();
        seen.dedup();
        if seen.len() != bands.len() {
            anyhow::bail!("each division may only be banded once");
        }
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[DivisionBand] {
        &self.bands
    }

    pub fn classify(&self, points: i64) -> Division {
        self.bands
            .iter()
            .find(|b| points >= b.min && points <= b.max)
            .map(|b| b.division)
            .unwrap_or(Division::Zero)
    }
}

/// `None` means fewer than three principal subjects were graded.
pub fn division_for(best_three_points: Option<i64>, table: &DivisionTable) -> DivisionOutcome {
    match best_three_points {
        Some(p) => DivisionOutcome::Division(table.classify(p)),
        None => DivisionOutcome::Incomplete,
    }
}

/// What to do when no subject in a set is flagged principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrincipalPolicy {
    /// Treat every subject as principal.
    #[default]
    AllWhenNoneFlagged,
    /// Only flagged subjects count, so an unflagged set is always incomplete.
    Strict,
}

/// One student's result in one subject for one exam. Grade and points are
/// derived from `marks` on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_name: String,
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(default)]
    pub is_principal: bool,
}

impl SubjectResult {
    pub fn new(subject_name: impl Into<String>, marks: Option<f64>, is_principal: bool) -> Self {
        Self {
            subject_name: subject_name.into(),
            marks,
            is_principal,
        }
    }

    pub fn grade(&self) -> GradeOutcome {
        grade_for(self.marks)
    }

    pub fn points(&self) -> Option<u8> {
        self.grade().points()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestSubject {
    /// Position in the input set.
    pub index: usize,
    pub subject_name: String,
    pub grade: Grade,
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionResult {
    pub best_three_subjects: Vec<BestSubject>,
    pub best_three_points: Option<i64>,
    pub division: DivisionOutcome,
    pub principal_fallback_applied: bool,
}

pub fn best_three_and_division(
    subjects: &[SubjectResult],
    policy: PrincipalPolicy,
    table: &DivisionTable,
) -> DivisionResult {
    let any_flagged = subjects.iter().any(|s| s.is_principal);
    let fallback = !any_flagged && policy == PrincipalPolicy::AllWhenNoneFlagged;

    let mut candidates: Vec<BestSubject> = subjects
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_principal || fallback)
        .filter_map(|(index, s)| {
            let grade = s.grade().grade()?;
            Some(BestSubject {
                index,
                subject_name: s.subject_name.clone(),
                grade,
                points: grade.points(),
            })
        })
        .collect();
    // Stable: ties keep input order.
    candidates.sort_by_key(|c| c.points);
    candidates.truncate(BEST_SUBJECT_COUNT);

    let best_three_points = if candidates.len() < BEST_SUBJECT_COUNT {
        None
    } else {
        Some(candidates.iter().map(|c| i64::from(c.points)).sum())
    };

    DivisionResult {
        division: division_for(best_three_points, table),
        best_three_subjects: candidates,
        best_three_points,
        principal_fallback_applied: fallback,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDistribution {
    pub rows: Vec<GradeCount>,
    pub graded: usize,
    pub not_graded: usize,
}

impl GradeDistribution {
    pub fn count(&self, grade: Grade) -> usize {
        self.rows
            .iter()
            .find(|r| r.grade == grade)
            .map(|r| r.count)
            .unwrap_or(0)
    }
}

/// Per-letter counts in A..F order. Percentages are over graded entries only.
pub fn grade_distribution<I>(grades: I) -> GradeDistribution
where
    I: IntoIterator<Item = GradeOutcome>,
{
    let mut counts = [0usize; 7];
    let mut not_graded = 0usize;
    for outcome in grades {
        match outcome.grade() {
            Some(g) => counts[g as usize] += 1,
            None => not_graded += 1,
        }
    }
    let graded: usize = counts.iter().sum();

    let rows = Grade::ALL
        .iter()
        .map(|&grade| {
            let count = counts[grade as usize];
            let percentage = if graded > 0 {
                round_off_1_decimal(100.0 * count as f64 / graded as f64)
            } else {
                0.0
            };
            GradeCount {
                grade,
                count,
                percentage,
            }
        })
        .collect();

    GradeDistribution {
        rows,
        graded,
        not_graded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> DivisionTable {
        DivisionTable::default()
    }

    fn grade_of(m: f64) -> GradeOutcome {
        grade_for(Some(m))
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade_of(100.0), GradeOutcome::Graded(Grade::A));
        assert_eq!(grade_of(80.0), GradeOutcome::Graded(Grade::A));
        assert_eq!(grade_of(79.9), GradeOutcome::Graded(Grade::B));
        assert_eq!(grade_of(70.0), GradeOutcome::Graded(Grade::B));
        assert_eq!(grade_of(60.0), GradeOutcome::Graded(Grade::C));
        assert_eq!(grade_of(50.0), GradeOutcome::Graded(Grade::D));
        assert_eq!(grade_of(40.0), GradeOutcome::Graded(Grade::E));
        assert_eq!(grade_of(35.0), GradeOutcome::Graded(Grade::S));
        assert_eq!(grade_of(34.0), GradeOutcome::Graded(Grade::F));
        assert_eq!(grade_of(0.0), GradeOutcome::Graded(Grade::F));
        assert_eq!(grade_of(-1.0), GradeOutcome::Invalid);
        assert_eq!(grade_of(101.0), GradeOutcome::Invalid);
        assert_eq!(grade_of(f64::NAN), GradeOutcome::Invalid);
        assert_eq!(grade_for(None), GradeOutcome::NotEntered);
    }

    #[test]
    fn only_eighty_and_above_is_a() {
        for tenth in 0..=1000 {
            let m = tenth as f64 / 10.0;
            let is_a = grade_of(m) == GradeOutcome::Graded(Grade::A);
            assert_eq!(is_a, m >= 80.0, "marks {}", m);
        }
    }

    #[test]
    fn points_never_worsen_as_marks_rise() {
        let mut prev = u8::MAX;
        for m in 0..=100 {
            let p = grade_of(m as f64).points().expect("graded");
            assert!(p <= prev, "points rose at marks {}", m);
            prev = p;
        }
    }

    #[test]
    fn marks_grade_points_chain() {
        assert_eq!(grade_of(85.0).points(), Some(1));
        assert_eq!(grade_of(36.0).label(), "S");
        assert_eq!(grade_of(36.0).points(), Some(6));
        assert_eq!(grade_of(34.0).label(), "F");
        assert_eq!(grade_of(34.0).points(), Some(7));
    }

    #[test]
    fn parse_marks_distinguishes_empty_from_garbage() {
        assert_eq!(parse_marks(&json!(null)), MarkEntry::NotEntered);
        assert_eq!(parse_marks(&json!("  ")), MarkEntry::NotEntered);
        assert_eq!(parse_marks(&json!("abc")), MarkEntry::Invalid);
        assert_eq!(parse_marks(&json!("NaN")), MarkEntry::Invalid);
        assert_eq!(parse_marks(&json!(true)), MarkEntry::Invalid);
        assert_eq!(parse_marks(&json!(" 72.5 ")), MarkEntry::Value(72.5));
        assert_eq!(parse_marks(&json!(64)), MarkEntry::Value(64.0));
        assert_eq!(parse_marks(&json!("abc")).grade(), GradeOutcome::Invalid);
        assert_eq!(parse_marks(&json!("150")).grade(), GradeOutcome::Invalid);
        assert_eq!(parse_marks(&json!("150")).marks(), None);
    }

    #[test]
    fn letters_map_to_points_with_fail_fallback() {
        assert_eq!(points_for("A"), 1);
        assert_eq!(points_for("b"), 2);
        assert_eq!(points_for(" S "), 6);
        assert_eq!(points_for("F"), 7);
        assert_eq!(points_for(""), UNRECOGNIZED_GRADE_POINTS);
        assert_eq!(points_for("X"), UNRECOGNIZED_GRADE_POINTS);
    }

    #[test]
    fn division_for_is_total() {
        let table = DivisionTable::default();
        let expect = |p: i64| match p {
            3..=9 => Division::I,
            10..=12 => Division::II,
            13..=17 => Division::III,
            18..=19 => Division::IV,
            _ => Division::Zero,
        };
        for p in [0, 2, 20, 21, 22, -5, i64::MAX]
            .into_iter()
            .chain(3..=21)
        {
            let first = division_for(Some(p), &table);
            assert_eq!(first, DivisionOutcome::Division(expect(p)), "points {}", p);
            assert_eq!(first, division_for(Some(p), &table));
        }
        assert_eq!(division_for(None, &table), DivisionOutcome::Incomplete);
    }

    #[test]
    fn division_table_rejects_overlaps_and_zero() {
        let overlap = vec![band(Division::I, 3, 10), band(Division::II, 10, 12)];
        assert!(DivisionTable::new(overlap).is_err());
        assert!(DivisionTable::new(vec![band(Division::Zero, 20, 21)]).is_err());
        assert!(DivisionTable::new(vec![band(Division::I, 9, 3)]).is_err());
        let dup = vec![band(Division::I, 3, 5), band(Division::I, 6, 9)];
        assert!(DivisionTable::new(dup).is_err());
        assert!(DivisionTable::new(Vec::new()).is_err());

        let narrow_third = DivisionTable::new(vec![
            band(Division::III, 13, 14),
            band(Division::I, 3, 9),
            band(Division::II, 10, 12),
        ])
        .expect("valid bands");
        assert_eq!(narrow_third.classify(14), Division::III);
        assert_eq!(narrow_third.classify(15), Division::Zero);
    }

    #[test]
    fn best_three_of_exactly_three() {
        let subjects = vec![
            SubjectResult::new("PHY", Some(85.0), true),
            SubjectResult::new("CHE", Some(72.0), true),
            SubjectResult::new("BIO", Some(61.0), true),
        ];
        let r = best_three_and_division(&subjects, PrincipalPolicy::default(), &table());
        assert_eq!(r.best_three_points, Some(6));
        assert_eq!(r.division, DivisionOutcome::Division(Division::I));
        assert!(!r.principal_fallback_applied);
    }

    #[test]
    fn two_principal_subjects_is_incomplete_not_zero() {
        let subjects = vec![
            SubjectResult::new("PHY", Some(20.0), true),
            SubjectResult::new("CHE", Some(10.0), true),
            SubjectResult::new("MAT", None, true),
            SubjectResult::new("GS", Some(90.0), false),
        ];
        let r = best_three_and_division(&subjects, PrincipalPolicy::default(), &table());
        assert_eq!(r.division, DivisionOutcome::Incomplete);
        assert_eq!(r.best_three_points, None);
        assert_eq!(r.best_three_subjects.len(), 2);
    }

    #[test]
    fn scenario_physics_chemistry_math_gs() {
        let subjects = vec![
            SubjectResult::new("Physics", Some(85.0), true),
            SubjectResult::new("Chemistry", Some(78.0), true),
            SubjectResult::new("Math", Some(92.0), true),
            SubjectResult::new("GS", Some(75.0), false),
        ];
        let labels: Vec<&str> = subjects.iter().map(|s| s.grade().label()).collect();
        assert_eq!(labels, vec!["A", "B", "A", "B"]);
        let points: Vec<Option<u8>> = subjects.iter().map(|s| s.points()).collect();
        assert_eq!(points, vec![Some(1), Some(2), Some(1), Some(2)]);

        let r = best_three_and_division(&subjects, PrincipalPolicy::default(), &table());
        assert_eq!(r.best_three_points, Some(4));
        assert_eq!(r.division, DivisionOutcome::Division(Division::I));
        let picked: Vec<usize> = r.best_three_subjects.iter().map(|b| b.index).collect();
        assert_eq!(picked, vec![0, 2, 1]);
    }

    #[test]
    fn ties_keep_input_order() {
        let subjects = vec![
            SubjectResult::new("HIS", Some(71.0), true),
            SubjectResult::new("GEO", Some(75.0), true),
            SubjectResult::new("KIS", Some(79.0), true),
            SubjectResult::new("ENG", Some(70.0), true),
        ];
        let r = best_three_and_division(&subjects, PrincipalPolicy::default(), &table());
        let names: Vec<&str> = r
            .best_three_subjects
            .iter()
            .map(|b| b.subject_name.as_str())
            .collect();
        assert_eq!(names, vec!["HIS", "GEO", "KIS"]);
        assert_eq!(r.best_three_points, Some(6));
    }

    #[test]
    fn unflagged_set_depends_on_policy() {
        let subjects = vec![
            SubjectResult::new("PHY", Some(55.0), false),
            SubjectResult::new("CHE", Some(45.0), false),
            SubjectResult::new("MAT", Some(65.0), false),
        ];
        let table = DivisionTable::default();

        let fallback =
            best_three_and_division(&subjects, PrincipalPolicy::AllWhenNoneFlagged, &table);
        assert!(fallback.principal_fallback_applied);
        assert_eq!(fallback.best_three_points, Some(12));
        assert_eq!(fallback.division, DivisionOutcome::Division(Division::II));

        let strict = best_three_and_division(&subjects, PrincipalPolicy::Strict, &table);
        assert!(!strict.principal_fallback_applied);
        assert_eq!(strict.division, DivisionOutcome::Incomplete);
    }

    #[test]
    fn all_fails_is_division_zero() {
        let subjects = vec![
            SubjectResult::new("PHY", Some(10.0), true),
            SubjectResult::new("CHE", Some(20.0), true),
            SubjectResult::new("MAT", Some(30.0), true),
        ];
        let r = best_three_and_division(&subjects, PrincipalPolicy::default(), &table());
        assert_eq!(r.best_three_points, Some(21));
        assert_eq!(r.division, DivisionOutcome::Division(Division::Zero));
        assert_ne!(r.division, DivisionOutcome::Incomplete);
    }

    #[test]
    fn empty_distribution_is_all_zero() {
        let d = grade_distribution(Vec::<GradeOutcome>::new());
        assert_eq!(d.graded, 0);
        assert_eq!(d.rows.len(), 7);
        assert!(d.rows.iter().all(|r| r.count == 0 && r.percentage == 0.0));
    }

    #[test]
    fn distribution_counts_and_percentages() {
        let d = grade_distribution(
            [85.0, 90.0, 72.0, 20.0]
                .into_iter()
                .map(|m| grade_for(Some(m)))
                .chain([GradeOutcome::NotEntered, GradeOutcome::Invalid]),
        );
        assert_eq!(d.graded, 4);
        assert_eq!(d.not_graded, 2);
        assert_eq!(d.count(Grade::A), 2);
        assert_eq!(d.rows[0].percentage, 50.0);
        assert_eq!(d.rows[1].percentage, 25.0);
        assert_eq!(d.rows[6].percentage, 25.0);
    }

    #[test]
    fn division_outcome_serializes_as_label_or_null() {
        assert_eq!(
            serde_json::to_value(DivisionOutcome::Division(Division::Zero)).expect("ser"),
            json!("0")
        );
        assert_eq!(
            serde_json::to_value(DivisionOutcome::Incomplete).expect("ser"),
            json!(null)
        );
    }
}
