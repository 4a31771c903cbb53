use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fixed subject catalog offered by the authoring form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Mathematics,
    Physics,
    Science,
    English,
    History,
    Geography,
    ComputerScience,
}

impl Subject {
    pub const ALL: [Subject; 7] = [
        Subject::Mathematics,
        Subject::Physics,
        Subject::Science,
        Subject::English,
        Subject::History,
        Subject::Geography,
        Subject::ComputerScience,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Physics => "Physics",
            Subject::Science => "Science",
            Subject::English => "English",
            Subject::History => "History",
            Subject::Geography => "Geography",
            Subject::ComputerScience => "Computer Science",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Subject::Mathematics => "mathematics",
            Subject::Physics => "physics",
            Subject::Science => "science",
            Subject::English => "english",
            Subject::History => "history",
            Subject::Geography => "geography",
            Subject::ComputerScience => "computer_science",
        }
    }
}

/// Test-level details captured on the first wizard step.
///
/// `total_question_count` is derived from the three difficulty counts and is
/// recomputed on every count mutation; it is never set directly. All setters
/// reject out-of-range values without applying them.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    #[validate(length(min = 1, message = "title is required"))]
    title: String,
    instructions: String,
    subject: Option<Subject>,
    grade: Option<String>,
    #[serde(rename = "duration")]
    duration_minutes: Option<u32>,
    #[validate(range(max = 100, message = "must be between 0 and 100"))]
    easy_count: u32,
    #[validate(range(max = 100, message = "must be between 0 and 100"))]
    medium_count: u32,
    #[validate(range(max = 100, message = "must be between 0 and 100"))]
    hard_count: u32,
    total_question_count: u32,
}

impl Default for TestMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            instructions: String::new(),
            subject: None,
            grade: None,
            duration_minutes: None,
            easy_count: 0,
            medium_count: 0,
            hard_count: 0,
            total_question_count: 0,
        }
    }
}

impl TestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn subject(&self) -> Option<Subject> {
        self.subject
    }

    pub fn grade(&self) -> Option<&str> {
        self.grade.as_deref()
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    pub fn easy_count(&self) -> u32 {
        self.easy_count
    }

    pub fn medium_count(&self) -> u32 {
        self.medium_count
    }

    pub fn hard_count(&self) -> u32 {
        self.hard_count
    }

    pub fn total_question_count(&self) -> u32 {
        self.total_question_count
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.instructions = instructions.into();
    }

    pub fn set_subject(&mut self, subject: Option<Subject>) {
        self.subject = subject;
    }

    pub fn set_grade(&mut self, grade: Option<String>) {
        self.grade = grade;
    }

    pub fn set_duration(&mut self, minutes: Option<u32>) -> Result<()> {
        if minutes == Some(0) {
            return Err(Error::validation("duration must be at least 1 minute"));
        }
        self.duration_minutes = minutes;
        Ok(())
    }

    pub fn set_easy_count(&mut self, count: u32) -> Result<()> {
        check_count("easy question count", count)?;
        self.easy_count = count;
        self.recompute_total();
        Ok(())
    }

    pub fn set_medium_count(&mut self, count: u32) -> Result<()> {
        check_count("medium question count", count)?;
        self.medium_count = count;
        self.recompute_total();
        Ok(())
    }

    pub fn set_hard_count(&mut self, count: u32) -> Result<()> {
        check_count("hard question count", count)?;
        self.hard_count = count;
        self.recompute_total();
        Ok(())
    }

    fn recompute_total(&mut self) {
        self.total_question_count = self.easy_count + self.medium_count + self.hard_count;
    }

    /// A metadata form is complete once it has a title, a subject, and at
    /// least one question planned.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
            && !self.title.trim().is_empty()
            && self.subject.is_some()
            && self.total_question_count >= 1
    }
}

fn check_count(field: &str, count: u32) -> Result<()> {
    if count > 100 {
        return Err(Error::Validation(vec![format!(
            "{} must be between 0 and 100",
            field
        )]));
    }
    Ok(())
}
