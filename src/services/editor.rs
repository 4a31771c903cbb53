use crate::error::{Error, Result};
use crate::models::question::{AnswerType, QuestionRecord};
use crate::services::store::QuestionStore;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Creating,
    Editing(usize),
}

/// Transient edit buffer for a single question. The buffer is a deep copy of
/// the stored record when editing, so nothing reaches the store until `save`
/// succeeds.
#[derive(Debug)]
pub struct QuestionEditor {
    state: EditorState,
    buffer: Option<QuestionRecord>,
}

impl Default for QuestionEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Closed,
            buffer: None,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != EditorState::Closed
    }

    pub fn buffer(&self) -> Option<&QuestionRecord> {
        self.buffer.as_ref()
    }

    pub fn buffer_mut(&mut self) -> Option<&mut QuestionRecord> {
        self.buffer.as_mut()
    }

    pub fn open_for_create(&mut self) {
        self.buffer = Some(QuestionRecord::draft());
        self.state = EditorState::Creating;
    }

    pub fn open_for_edit(&mut self, store: &QuestionStore, position: usize) -> Result<()> {
        let record = store.get(position).ok_or(Error::Index {
            position,
            len: store.count(),
        })?;
        self.buffer = Some(record.clone());
        self.state = EditorState::Editing(position);
        Ok(())
    }

    /// Validates the buffer and commits it: append when creating, replace in
    /// place when editing. On validation failure the editor stays open and
    /// the store is untouched.
    pub fn save(&mut self, store: &mut QuestionStore) -> Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| Error::State("no question is being edited".to_string()))?;

        validate_question(buffer)?;

        match self.state {
            EditorState::Creating => {
                store.append(buffer.clone());
            }
            EditorState::Editing(position) => {
                store.replace_at(position, buffer.clone())?;
            }
            EditorState::Closed => {
                return Err(Error::State("the editor is not open".to_string()));
            }
        }

        self.state = EditorState::Closed;
        self.buffer = None;
        Ok(())
    }

    /// Discards the buffer unconditionally.
    pub fn cancel(&mut self) {
        self.state = EditorState::Closed;
        self.buffer = None;
    }
}

/// Checks every rule and reports all violations at once instead of stopping
/// at the first one.
pub fn validate_question(question: &QuestionRecord) -> Result<()> {
    let mut failures = Vec::new();

    if question.question_text.trim().is_empty() {
        failures.push("question text must not be empty".to_string());
    }
    if question.options.len() < 2 {
        failures.push("a question needs at least two options".to_string());
    }
    if question.options.iter().any(|o| o.text.trim().is_empty()) {
        failures.push("every option needs text".to_string());
    }
    let unique_ids: HashSet<&str> = question.options.iter().map(|o| o.id.as_str()).collect();
    if unique_ids.len() != question.options.len() {
        failures.push("option ids must be unique".to_string());
    }
    if question.answer_type == AnswerType::Unspecified {
        failures.push("an answer type must be selected".to_string());
    }
    if question.correct_option_ids.is_empty() {
        failures.push("at least one correct option must be selected".to_string());
    } else {
        if question
            .correct_option_ids
            .iter()
            .any(|id| !unique_ids.contains(id.as_str()))
        {
            failures.push("correct options must reference existing options".to_string());
        }
        if question.answer_type == AnswerType::SingleCorrect
            && question.correct_option_ids.len() != 1
        {
            failures.push("single-correct questions take exactly one correct option".to_string());
        }
    }
    if question.marks < 1 {
        failures.push("marks must be at least 1".to_string());
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_buffer(editor: &mut QuestionEditor) -> &mut QuestionRecord {
        editor.open_for_create();
        let buffer = editor.buffer_mut().unwrap();
        buffer.question_text = "2+2?".to_string();
        for (option, text) in buffer.options.iter_mut().zip(["1", "2", "3", "4"]) {
            option.text = text.to_string();
        }
        let correct = buffer.options[3].id.clone();
        buffer.correct_option_ids.push(correct);
        editor.buffer_mut().unwrap()
    }

    #[test]
    fn creating_save_appends_and_closes() {
        let mut store = QuestionStore::new();
        let mut editor = QuestionEditor::new();
        valid_buffer(&mut editor);

        editor.save(&mut store).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.buffer().is_none());
    }

    #[test]
    fn empty_question_text_fails_and_store_is_untouched() {
        let mut store = QuestionStore::new();
        let mut editor = QuestionEditor::new();
        let buffer = valid_buffer(&mut editor);
        buffer.question_text = "   ".to_string();

        let err = editor.save(&mut store).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.count(), 0);
        assert_eq!(editor.state(), EditorState::Creating);
    }

    #[test]
    fn validation_collects_every_failure() {
        let mut record = QuestionRecord::draft();
        record.marks = 0;
        record.answer_type = AnswerType::Unspecified;

        let err = validate_question(&record).unwrap_err();
        let Error::Validation(failures) = err else {
            panic!("expected validation error");
        };
        // empty text, blank options, no answer type, no correct option, zero marks
        assert_eq!(failures.len(), 5);
    }

    #[test]
    fn single_correct_rejects_multiple_selections() {
        let mut editor = QuestionEditor::new();
        let buffer = valid_buffer(&mut editor);
        let extra = buffer.options[0].id.clone();
        buffer.correct_option_ids.push(extra);

        let mut store = QuestionStore::new();
        let err = editor.save(&mut store).unwrap_err();
        let Error::Validation(failures) = err else {
            panic!("expected validation error");
        };
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("exactly one"));
    }

    #[test]
    fn correct_ids_must_reference_options() {
        let mut editor = QuestionEditor::new();
        let buffer = valid_buffer(&mut editor);
        buffer.correct_option_ids = vec!["no-such-option".to_string()];

        let mut store = QuestionStore::new();
        assert!(editor.save(&mut store).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn edit_then_cancel_leaves_stored_record_unchanged() {
        let mut store = QuestionStore::new();
        let mut editor = QuestionEditor::new();
        valid_buffer(&mut editor);
        editor.save(&mut store).unwrap();
        let original = store.get(0).unwrap().clone();

        editor.open_for_edit(&store, 0).unwrap();
        let buffer = editor.buffer_mut().unwrap();
        buffer.question_text = "mutated".to_string();
        buffer.options[0].text = "mutated".to_string();
        editor.cancel();

        assert_eq!(store.get(0).unwrap(), &original);
        assert_eq!(editor.state(), EditorState::Closed);
    }

    #[test]
    fn editing_save_replaces_in_place() {
        let mut store = QuestionStore::new();
        let mut editor = QuestionEditor::new();
        valid_buffer(&mut editor);
        editor.save(&mut store).unwrap();

        editor.open_for_edit(&store, 0).unwrap();
        editor.buffer_mut().unwrap().question_text = "3+3?".to_string();
        editor.save(&mut store).unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(store.get(0).unwrap().question_text, "3+3?");
    }

    #[test]
    fn open_for_edit_rejects_bad_position() {
        let store = QuestionStore::new();
        let mut editor = QuestionEditor::new();
        let err = editor.open_for_edit(&store, 0).unwrap_err();
        assert!(matches!(err, Error::Index { position: 0, len: 0 }));
        assert_eq!(editor.state(), EditorState::Closed);
    }
}
