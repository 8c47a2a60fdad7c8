use crate::api::canvas::{Course, Student};
use crate::config::Config;
use crate::error::Result;
use crate::narrow::{name_matches, Candidate, Narrower};
use crate::ui::{self, DialoguerQueries};
use std::collections::HashMap;
use std::io::{self, Write};

/// A student together with every course they appear in.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentCourses {
    pub student: Student,
    pub courses: Vec<String>,
}

impl Candidate for StudentCourses {
    fn display_name(&self) -> String {
        self.student.name.clone()
    }
}

/// Merge per-course rosters into one entry per student id, in first-seen
/// order.
pub fn index_students(rosters: Vec<(Course, Vec<Student>)>) -> Vec<StudentCourses> {
    let mut positions: HashMap<u64, usize> = HashMap::new();
    let mut index: Vec<StudentCourses> = Vec::new();
    for (course, students) in rosters {
        let label = course.name_with_date();
        for student in students {
            match positions.get(&student.id) {
                Some(&pos) => index[pos].courses.push(label.clone()),
                None => {
                    positions.insert(student.id, index.len());
                    index.push(StudentCourses {
                        student,
                        courses: vec![label.clone()],
                    });
                }
            }
        }
    }
    index
}

pub fn print_student<W: Write>(entry: &StudentCourses, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    match &entry.student.email {
        Some(email) => writeln!(out, "{} ({email}) is enrolled in:", entry.student.name)?,
        None => writeln!(out, "{} is enrolled in:", entry.student.name)?,
    }
    for course in &entry.courses {
        writeln!(out, "    {course}")?;
    }
    Ok(())
}

pub fn main(config: &Config) -> anyhow::Result<()> {
    let canvas = super::canvas_client(config)?;

    let spinner = ui::spinner("Loading students from all of your courses...");
    let rosters = canvas.courses("designer").and_then(|courses| {
        courses
            .into_iter()
            .map(|course| -> Result<(Course, Vec<Student>)> {
                spinner.set_message(format!("Loading students from {}...", course.name));
                let students = canvas.students(course.id)?;
                Ok((course, students))
            })
            .collect::<Result<Vec<_>>>()
    });
    spinner.finish_and_clear();
    let index = index_students(rosters?);
    if index.is_empty() {
        println!("None of your courses have any students.");
        return Ok(());
    }

    let mut narrower = Narrower::stdout("student");
    let selection = narrower.narrow(index, &mut DialoguerQueries, name_matches)?;
    print_student(&selection.candidate, &mut io::stdout())?;
    println!();
    ui::wait_for_enter("Press ENTER to quit.")?;
    Ok(())
}
