use crate::config::Config;
use crate::error::{LugachError, Result};
use crate::select;
use crate::ui::{self, DialoguerQueries};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::io;

pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Parse an `mm-dd-yyyy` date. The time of day is taken from `current`
/// when there is one, otherwise the new date is due at 23:59 UTC.
pub fn parse_due_date(input: &str, current: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| LugachError::invalid_input(format!("'{}' is not a date in mm-dd-yyyy form", input.trim())))?;
    let time = match current {
        Some(current) => current.time(),
        None => NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
    };
    Ok(date.and_time(time).and_utc())
}

pub fn main(config: &Config) -> anyhow::Result<()> {
    let canvas = super::canvas_client(config)?;
    let course = select::prompt_for_course(&canvas, &mut DialoguerQueries, io::stdout())?;

    loop {
        println!();
        let student = select::prompt_for_student(&canvas, &course, &mut DialoguerQueries, io::stdout())?;
        println!();
        let assignment =
            select::prompt_for_assignment(&canvas, &course, true, &mut DialoguerQueries, io::stdout())?;

        let current = canvas.due_date(course.id, &assignment)?;
        match current {
            Some(due) => println!("The current due date is {}.", due.format("%m-%d-%Y %H:%M UTC")),
            None => println!("The assignment has no due date."),
        }

        let due_at = loop {
            let input = ui::text("Enter the new due date (mm-dd-yyyy)")?;
            match parse_due_date(&input, current) {
                Ok(due) => break due,
                Err(e) => println!("{e}"),
            }
        };

        canvas.create_due_date_override(course.id, assignment.id, &student, due_at)?;
        println!(
            "Due date for {} on {} set to {}.",
            student.name,
            assignment.name,
            due_at.format("%m-%d-%Y %H:%M UTC")
        );
        tracing::info!(student = student.id, assignment = assignment.id, %due_at, "override created");

        println!();
        if !ui::confirm(&format!(
            "Would you like to modify due dates for another student in {}?",
            course.name
        ))? {
            break;
        }
    }
    Ok(())
}
