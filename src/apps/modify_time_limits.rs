use crate::api::canvas::{CanvasClient, Course, Student};
use crate::config::Config;
use crate::error::Result;
use crate::select;
use crate::ui::{self, DialoguerQueries};
use std::io::{self, Write};

/// Extra minutes for a quiz, as a percentage of its time limit.
pub fn extra_time(time_limit: f64, percent: u32) -> f64 {
    time_limit * f64::from(percent) / 100.0
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub updated: usize,
    pub failed: usize,
}

/// Give `student` extra time on every timed quiz in the course. A failure
/// on one quiz is reported and the rest are still attempted.
pub fn extend_time_limits<W: Write>(
    canvas: &CanvasClient,
    course: &Course,
    student: &Student,
    percent: u32,
    out: &mut W,
) -> Result<Outcome> {
    let mut outcome = Outcome::default();
    for quiz in canvas.quizzes(course.id)? {
        let Some(time_limit) = quiz.time_limit else {
            continue;
        };
        let extra = extra_time(time_limit, percent);
        writeln!(out, "Updating {} (time limit is {time_limit} minutes)...", quiz.title)?;
        match canvas.set_quiz_extra_time(course.id, quiz.id, student.id, extra) {
            Ok(()) => {
                outcome.updated += 1;
                writeln!(out, "    {} now has {extra} extra minutes.", student.name)?;
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::warn!(quiz = quiz.id, error = %e, "extension failed");
                writeln!(out, "    Failed to update {}: {e}", quiz.title)?;
            }
        }
    }
    Ok(outcome)
}

pub fn main(config: &Config) -> anyhow::Result<()> {
    let canvas = super::canvas_client(config)?;
    let course = select::prompt_for_course(&canvas, &mut DialoguerQueries, io::stdout())?;

    loop {
        println!();
        let student = select::prompt_for_student(&canvas, &course, &mut DialoguerQueries, io::stdout())?;
        println!();
        let percent: u32 = ui::number("Percent extra time to give (e.g. 50 for time and a half)")?;

        let outcome = extend_time_limits(&canvas, &course, &student, percent, &mut io::stdout())?;
        println!();
        println!(
            "Updated {} quizzes for {} ({} failed).",
            outcome.updated, student.name, outcome.failed
        );

        println!();
        if !ui::confirm(&format!(
            "Would you like to modify time limits for another student in {}?",
            course.name
        ))? {
            break;
        }
    }
    Ok(())
}
