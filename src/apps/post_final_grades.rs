// Post letter grades to Lighthouse for every eligible student in a section.

use crate::api::lighthouse::{Enrollment, LetterGrade};
use crate::config::Config;
use crate::error::Result;
use crate::select;
use crate::ui::{self, DialoguerQueries};
use std::io::{self, Write};

const WARNING: &str = "\
    WARNING: THIS PROGRAM WILL POST FINAL GRADES FOR
    THE CLASS THAT YOU SELECT!

    Please make sure that you have permission to post
    final grades before continuing.";

/// Letter cutoffs with a shared leeway.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    /// Highest letter first.
    pub cutoffs: Vec<(LetterGrade, f64)>,
    pub tolerance: f64,
}

impl GradeScale {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cutoffs: config.grade_cutoffs.clone(),
            tolerance: config.grade_tolerance,
        }
    }

    /// The first letter whose cutoff, less the tolerance, `points` reaches.
    pub fn grade_for(&self, points: f64) -> LetterGrade {
        self.cutoffs
            .iter()
            .find(|(_, cutoff)| points >= cutoff - self.tolerance)
            .map(|(grade, _)| *grade)
            .unwrap_or(LetterGrade::F)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Skip(String),
    Post(LetterGrade),
}

pub fn decide(enrollment: &Enrollment, scale: &GradeScale, inactivity_days: u32) -> Decision {
    if enrollment.is_removed() {
        return Decision::Skip("was removed from the course".to_string());
    }
    if let Some(days) = enrollment.days_since_last_activity {
        if days >= inactivity_days {
            return Decision::Skip(format!("had {inactivity_days} days of inactivity"));
        }
    }
    if enrollment.points == 0.0 {
        return Decision::Skip("had 0 points".to_string());
    }
    if let Some(grade) = enrollment.posted_grade() {
        return Decision::Skip(format!("already has grade {grade} assigned"));
    }
    Decision::Post(scale.grade_for(enrollment.points))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub posted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Walk the roster, posting through `post`. A failed post is reported and
/// the remaining students are still processed.
pub fn post_final_grades<P, W>(
    enrollments: &[Enrollment],
    scale: &GradeScale,
    inactivity_days: u32,
    mut post: P,
    out: &mut W,
) -> Result<Summary>
where
    P: FnMut(&Enrollment, LetterGrade) -> Result<()>,
    W: Write,
{
    let mut summary = Summary::default();
    for (i, enrollment) in enrollments.iter().enumerate() {
        let name = enrollment.full_name();
        match decide(enrollment, scale, inactivity_days) {
            Decision::Skip(reason) => {
                summary.skipped += 1;
                writeln!(out, "Student {name} {reason}... ({i} so far)")?;
            }
            Decision::Post(grade) => match post(enrollment, grade) {
                Ok(()) => {
                    summary.posted += 1;
                    writeln!(
                        out,
                        "Posted final grade {grade} for student {name} with {} points... ({i} so far)",
                        enrollment.points
                    )?;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(enrollment = enrollment.id, error = %e, "grade post failed");
                    writeln!(out, "Final grade failed to post for {name}: {e}... ({i} so far)")?;
                }
            },
        }
    }
    Ok(summary)
}

pub fn main(config: &Config) -> anyhow::Result<()> {
    println!("{WARNING}");
    println!();
    if !ui::confirm("Do you want to continue?")? {
        return Ok(());
    }

    let canvas = super::canvas_client(config)?;
    let lighthouse = super::lighthouse_client(config)?;
    let course = select::prompt_for_course(&canvas, &mut DialoguerQueries, io::stdout())?;

    let sis_id = match course.sis_course_id.clone() {
        Some(id) => id,
        None => ui::text("This course has no SIS id in Canvas. Enter it")?,
    };
    let spinner = ui::spinner("Loading enrollments from Lighthouse...");
    let enrollments = lighthouse.enrollments(&sis_id);
    spinner.finish_and_clear();
    let enrollments = enrollments?;

    if !ui::confirm(&format!("Post grades for {}?", course.name))? {
        return Ok(());
    }

    let scale = GradeScale::from_config(config);
    let summary = post_final_grades(
        &enrollments,
        &scale,
        config.inactivity_days,
        |enrollment, grade| lighthouse.post_grade(&sis_id, enrollment, grade),
        &mut io::stdout(),
    )?;
    println!();
    println!(
        "Posted {} grades, skipped {}, {} failed.",
        summary.posted, summary.skipped, summary.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LugachError;

    fn scale() -> GradeScale {
        GradeScale::from_config(&Config::default())
    }

    fn enrollment(id: u64, points: f64) -> Enrollment {
        Enrollment {
            id,
            first_name: "Sam".to_string(),
            last_name: format!("No{id}"),
            status: "ACTIVE".to_string(),
            days_since_last_activity: Some(2),
            points,
            final_grade: None,
        }
    }

    #[test]
    fn cutoffs_allow_the_tolerance() {
        let scale = scale();
        assert_eq!(scale.grade_for(1000.0), LetterGrade::A);
        assert_eq!(scale.grade_for(890.0), LetterGrade::A);
        assert_eq!(scale.grade_for(889.9), LetterGrade::B);
        assert_eq!(scale.grade_for(700.0), LetterGrade::C);
        assert_eq!(scale.grade_for(590.0), LetterGrade::D);
        assert_eq!(scale.grade_for(400.0), LetterGrade::F);
    }

    #[test]
    fn ineligible_students_are_skipped() {
        let scale = scale();

        let mut removed = enrollment(1, 950.0);
        removed.status = "REMOVED".to_string();
        assert!(matches!(decide(&removed, &scale, 21), Decision::Skip(_)));

        let mut inactive = enrollment(2, 950.0);
        inactive.days_since_last_activity = Some(21);
        assert_eq!(
            decide(&inactive, &scale, 21),
            Decision::Skip("had 21 days of inactivity".to_string())
        );

        assert!(matches!(decide(&enrollment(3, 0.0), &scale, 21), Decision::Skip(_)));

        let mut graded = enrollment(4, 950.0);
        graded.final_grade = Some("B".to_string());
        assert!(matches!(decide(&graded, &scale, 21), Decision::Skip(_)));

        graded.final_grade = Some(String::new());
        assert_eq!(decide(&graded, &scale, 21), Decision::Post(LetterGrade::A));
    }

    #[test]
    fn one_failed_post_does_not_stop_the_rest() {
        let roster = vec![enrollment(1, 950.0), enrollment(2, 810.0), enrollment(3, 0.0)];
        let mut posted = Vec::new();
        let mut out = Vec::new();

        let summary = post_final_grades(
            &roster,
            &scale(),
            21,
            |e, grade| {
                if e.id == 1 {
                    Err(LugachError::RemoteUnavailable { attempts: 10 })
                } else {
                    posted.push((e.id, grade));
                    Ok(())
                }
            },
            &mut out,
        )
        .unwrap();

        assert_eq!(
            summary,
            Summary {
                posted: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(posted, vec![(2, LetterGrade::B)]);
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Final grade failed to post for Sam No1"));
        assert!(out.contains("Student Sam No3 had 0 points... (2 so far)"));
    }
}
