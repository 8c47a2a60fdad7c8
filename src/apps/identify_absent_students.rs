use crate::attendance::{AbsenceReport, Aggregator};
use crate::config::Config;
use crate::paginate::Collector;
use crate::select;
use crate::ui::{self, DialoguerQueries};
use anyhow::Context;
use std::io::{self, Write};

pub fn main(config: &Config) -> anyhow::Result<()> {
    let tophat = super::tophat_client(config).context("Unable to obtain a Top Hat session token")?;
    println!("JWT bearer token obtained!");

    let course = select::prompt_for_tophat_course(&tophat, &mut DialoguerQueries, io::stdout())?;
    let students = tophat
        .students(course.course_id)
        .context("Failed to load the course roster")?;
    println!();

    let collector = Collector::new(config.page_size).with_max_pages(config.max_pages);
    let report = Aggregator::new(&tophat, collector).aggregate(
        &course,
        &students,
        config.absence_tolerance,
        &mut io::stdout(),
    )?;

    print_report(&report, &mut io::stdout())?;
    println!();
    ui::wait_for_enter("Press ENTER to quit.")?;
    Ok(())
}

pub fn print_report<W: Write>(report: &AbsenceReport, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Here are all the students with {} absences: ",
        report.floor()
    )?;
    for absence in report.at_threshold() {
        writeln!(out, "    {}: {}", absence.name, absence.missed)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Here are all the students with {} or more absences: ",
        report.tolerance
    )?;
    for absence in report.over_threshold() {
        writeln!(out, "    {}: {}", absence.name, absence.missed)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_both_cohorts() {
        let mut report = AbsenceReport::new(4);
        report.consider(1, "Cy", 3);
        report.consider(2, "Ann", 5);
        report.consider(3, "Bo", 1);

        let mut out = Vec::new();
        print_report(&report, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        let at = out.find("with 3 absences").unwrap();
        let over = out.find("with 4 or more absences").unwrap();
        let cy = out.find("    Cy: 3").unwrap();
        let ann = out.find("    Ann: 5").unwrap();
        assert!(at < cy && cy < over && over < ann);
        assert!(!out.contains("Bo"));
    }
}
