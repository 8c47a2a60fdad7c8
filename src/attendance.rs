// Attendance aggregation over Top Hat gradebook items.
//
// Every student's gradebook holds exactly one "production...attendance" item
// whose weights are (sessions attended, sessions held). Anything else means
// the upstream schema changed, which is fatal rather than guessed around.

use crate::api::tophat::{TopHatCourse, TopHatStudent};
use crate::error::{LugachError, Result};
use crate::paginate::{Collector, Page};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Progress is printed before every this many students.
pub const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceRecord {
    pub item_id: String,
    #[serde(default)]
    pub weighted_correctness: Option<f64>,
    #[serde(default)]
    pub correctness_weight: Option<f64>,
}

impl AttendanceRecord {
    fn is_attendance_total(&self) -> bool {
        self.item_id.contains("production") && self.item_id.contains("attendance")
    }
}

/// Where per-student attendance pages come from.
pub trait AttendanceSource {
    fn attendance_page(&self, course_id: u64, student_id: u64, offset: usize, limit: usize) -> Result<Page<AttendanceRecord>>;
}

/// Reduce a student's records to `(attended, total)`.
pub fn attendance_proportion(records: &[AttendanceRecord]) -> Result<(u32, u32)> {
    let main: Vec<&AttendanceRecord> = records.iter().filter(|r| r.is_attendance_total()).collect();
    // Zero or several totals both mean the gradebook layout changed.
    let [record] = main.as_slice() else {
        return Err(LugachError::unexpected_shape(format!(
            "expected exactly one 'production...attendance' entry, found {}",
            main.len()
        )));
    };

    let count = |value: Option<f64>, field: &str| -> Result<u32> {
        match value {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u32),
            _ => Err(LugachError::unexpected_shape(format!(
                "attendance entry {} has no usable {field}",
                record.item_id
            ))),
        }
    };
    let attended = count(record.weighted_correctness, "weighted_correctness")?;
    let total = count(record.correctness_weight, "correctness_weight")?;
    if attended > total {
        return Err(LugachError::unexpected_shape(format!(
            "attendance entry {} reports {attended} attended out of {total}",
            record.item_id
        )));
    }
    Ok((attended, total))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Absence {
    pub name: String,
    pub missed: u32,
}

/// Students at or above `tolerance - 1` missed sessions, keyed by student id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AbsenceReport {
    pub tolerance: u32,
    pub absences: BTreeMap<u64, Absence>,
}

impl AbsenceReport {
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            absences: BTreeMap::new(),
        }
    }

    /// Lowest missed count that is reported.
    pub fn floor(&self) -> u32 {
        self.tolerance.saturating_sub(1)
    }

    /// Record a student if they missed enough sessions. Returns whether
    /// they were included.
    pub fn consider(&mut self, student_id: u64, name: &str, missed: u32) -> bool {
        if missed < self.floor() {
            return false;
        }
        self.absences.insert(
            student_id,
            Absence {
                name: name.to_string(),
                missed,
            },
        );
        true
    }

    pub fn get(&self, student_id: u64) -> Option<&Absence> {
        self.absences.get(&student_id)
    }

    pub fn len(&self) -> usize {
        self.absences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.absences.is_empty()
    }

    /// One absence away from the tolerance, sorted by name.
    pub fn at_threshold(&self) -> Vec<&Absence> {
        self.sorted(|a| a.missed == self.floor() && a.missed < self.tolerance)
    }

    /// At or over the tolerance, sorted by name.
    pub fn over_threshold(&self) -> Vec<&Absence> {
        self.sorted(|a| a.missed >= self.tolerance)
    }

    fn sorted(&self, keep: impl Fn(&Absence) -> bool) -> Vec<&Absence> {
        let mut picked: Vec<&Absence> = self.absences.values().filter(|a| keep(a)).collect();
        picked.sort_by(|a, b| a.name.cmp(&b.name));
        picked
    }
}

pub struct Aggregator<'a, S: AttendanceSource> {
    source: &'a S,
    collector: Collector,
}

impl<'a, S: AttendanceSource> Aggregator<'a, S> {
    pub fn new(source: &'a S, collector: Collector) -> Self {
        Self { source, collector }
    }

    /// Fetch every student's records in turn and keep those who missed at
    /// least `tolerance - 1` sessions. Progress lines go to `out`.
    pub fn aggregate<W: Write>(
        &self,
        course: &TopHatCourse,
        students: &[TopHatStudent],
        tolerance: u32,
        out: &mut W,
    ) -> Result<AbsenceReport> {
        let mut report = AbsenceReport::new(tolerance);

        for (i, student) in students.iter().enumerate() {
            if i % PROGRESS_EVERY == 0 {
                writeln!(out, "Checking student attendance records ({i} so far)...")?;
            }

            // One student's gradebook, page by page.
            let mut fetch = |offset: usize, limit: usize| -> Result<Page<AttendanceRecord>> {
                self.source
                    .attendance_page(course.course_id, student.id, offset, limit)
            };
            let records = self.collector.collect_all(&mut fetch)?;
            let (attended, total) = attendance_proportion(&records).map_err(|e| {
                tracing::warn!(student = %student.name, error = %e, "bad attendance data");
                e
            })?;

            // attended <= total is checked by attendance_proportion.
            let missed = total - attended;
            if report.consider(student.id, &student.name, missed) {
                tracing::debug!(student = %student.name, missed, "over absence floor");
            }
        }

        Ok(report)
    }
}
