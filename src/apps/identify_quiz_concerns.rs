// Find students who have missed too many past online quizzes and send them
// a templated Canvas message.

use crate::api::canvas::{CanvasClient, Conversation, Course, Student};
use crate::config::Config;
use crate::error::Result;
use crate::select;
use crate::ui::{self, DialoguerQueries};
use std::collections::HashMap;
use std::io::{self, Write};

pub fn subject(course: &Course) -> String {
    format!("Quiz concern - {}", course.name)
}

pub fn message(signature: &str) -> String {
    format!(
        "Hello, I've noticed that you've missed multiple quizzes this semester. \
         Make sure to keep up with the class announcements and modules in Canvas. \
         There are two extra credit opportunities that can help you make up the points \
         missed due at the end of the semester.\n\n\
         Let me know if you have any questions!\n{signature}"
    )
}

/// Students with at least `tolerance` missing submissions among the
/// course's past online quizzes, checked `chunk_size` students at a time.
pub fn find_quiz_concern_students<W: Write>(
    canvas: &CanvasClient,
    course: &Course,
    tolerance: usize,
    chunk_size: usize,
    out: &mut W,
) -> Result<Vec<Student>> {
    let students = canvas.students(course.id)?;
    let quiz_ids: Vec<u64> = canvas
        .assignments(course.id, Some("past"))?
        .into_iter()
        .filter(|a| a.is_online_quiz())
        .map(|a| a.id)
        .collect();
    if quiz_ids.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: HashMap<u64, &Student> = students.iter().map(|s| (s.id, s)).collect();
    let mut concerns = Vec::new();
    for (i, chunk) in students.chunks(chunk_size.max(1)).enumerate() {
        writeln!(out, "Checking students ({} so far)...", i * chunk_size)?;
        let ids: Vec<u64> = chunk.iter().map(|s| s.id).collect();
        for group in canvas.grouped_submissions(course.id, &ids, &quiz_ids)? {
            if group.missing_count() < tolerance {
                continue;
            }
            match by_id.get(&group.user_id) {
                Some(student) => concerns.push((*student).clone()),
                None => tracing::warn!(user_id = group.user_id, "submission group for unknown student"),
            }
        }
    }
    Ok(concerns)
}

/// Which flagged students will receive the message. Nobody is selected
/// until the user toggles them on.
#[derive(Debug, Clone)]
pub struct Recipients {
    entries: Vec<(Student, bool)>,
}

impl Recipients {
    pub fn new(students: Vec<Student>) -> Self {
        Self {
            entries: students.into_iter().map(|s| (s, false)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flip the student at a zero-based index. Returns false when out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.entries.get_mut(index) {
            Some((_, selected)) => {
                *selected = !*selected;
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = &Student> {
        self.entries.iter().filter(|(_, on)| *on).map(|(s, _)| s)
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, (student, selected)) in self.entries.iter().enumerate() {
            let indicator = if *selected { "*" } else { " " };
            writeln!(out, "{indicator} {}. {}", i + 1, student.name)?;
        }
        Ok(())
    }
}

/// What the user typed at the selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Toggle(usize),
    Done,
}

/// Parse a one-based index or `q`.
pub fn parse_choice(input: &str, len: usize) -> Option<Choice> {
    let input = input.trim();
    if input == "q" {
        return Some(Choice::Done);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(Choice::Toggle(n - 1)),
        _ => None,
    }
}

fn choose_recipients(recipients: &mut Recipients, tolerance: usize) -> Result<()> {
    println!();
    println!("The following students have missed {tolerance} or more quizzes:");
    loop {
        recipients.render(&mut io::stdout())?;
        let choice = loop {
            let input = ui::text("Choose the students to message by index (or 'q' to quit)")?;
            match parse_choice(&input, recipients.len()) {
                Some(choice) => break choice,
                None => println!("Expected 'q' or an index within range. Try again."),
            }
        };
        match choice {
            Choice::Toggle(index) => {
                recipients.toggle(index);
            }
            Choice::Done => return Ok(()),
        }
    }
}

pub fn main(config: &Config) -> anyhow::Result<()> {
    let canvas = super::canvas_client(config)?;
    let course = select::prompt_for_course(&canvas, &mut DialoguerQueries, io::stdout())?;
    println!();
    let name = ui::text("Enter your name (this will go in the signature of the email)")?;
    println!();

    let students = find_quiz_concern_students(
        &canvas,
        &course,
        config.quiz_tolerance,
        config.chunk_size,
        &mut io::stdout(),
    )?;
    if students.is_empty() {
        println!("No students need quiz concern emails sent!");
        ui::wait_for_enter("Press ENTER to quit.")?;
        return Ok(());
    }

    let mut recipients = Recipients::new(students);
    choose_recipients(&mut recipients, config.quiz_tolerance)?;

    let conversation = Conversation {
        recipients: recipients.selected().map(|s| s.id.to_string()).collect(),
        subject: subject(&course),
        body: message(&name),
        context_code: format!("course_{}", course.id),
    };
    if conversation.recipients.is_empty() {
        println!("No students were selected; nothing was sent.");
        return Ok(());
    }

    println!("------MESSAGE------");
    println!();
    println!("{}", conversation.subject);
    println!();
    println!("{}", conversation.body);
    println!();
    println!("-------------------");
    recipients.render(&mut io::stdout())?;
    if !ui::confirm("FINAL CONFIRMATION: Do you want to message these students?")? {
        return Ok(());
    }

    canvas.create_conversation(&conversation)?;
    println!("Message sent!");
    Ok(())
}
