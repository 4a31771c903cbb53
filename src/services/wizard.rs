use crate::dto::submission::SubmissionPayload;
use crate::error::{Error, Result};
use crate::models::metadata::TestMetadata;
use crate::models::question::QuestionRecord;
use crate::services::editor::{EditorState, QuestionEditor};
use crate::services::generator::AiQuestionGenerator;
use crate::services::notification::{Notification, NotificationSink};
use crate::services::store::QuestionStore;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Basics,
    Questions,
    Review,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::Basics => 1,
            Step::Questions => 2,
            Step::Review => 3,
        }
    }
}

/// Drives the three-step authoring flow: basic details, questions, review.
/// Forward navigation is gated on step-specific validity, and the controller
/// is the single place that emits user-facing notifications.
pub struct WizardController {
    step: Step,
    metadata: TestMetadata,
    store: QuestionStore,
    editor: QuestionEditor,
    generator: AiQuestionGenerator,
    notifier: Arc<dyn NotificationSink>,
}

impl WizardController {
    pub fn new(generator: AiQuestionGenerator, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            step: Step::Basics,
            metadata: TestMetadata::new(),
            store: QuestionStore::new(),
            editor: QuestionEditor::new(),
            generator,
            notifier,
        }
    }

    pub fn active_step(&self) -> Step {
        self.step
    }

    pub fn metadata(&self) -> &TestMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut TestMetadata {
        &mut self.metadata
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn editor_state(&self) -> EditorState {
        self.editor.state()
    }

    pub fn is_generating(&self) -> bool {
        self.generator.is_generating()
    }

    pub fn can_advance(&self) -> bool {
        match self.step {
            Step::Basics => self.metadata.is_valid(),
            Step::Questions => self.store.count() >= 1,
            Step::Review => true,
        }
    }

    pub fn advance(&mut self) -> Result<()> {
        let next = match self.step {
            Step::Basics => Step::Questions,
            Step::Questions => Step::Review,
            Step::Review => {
                return Err(Error::State("already at the final step".to_string()));
            }
        };
        if !self.can_advance() {
            return Err(Error::State(format!(
                "step {} is not complete",
                self.step.number()
            )));
        }
        self.step = next;
        Ok(())
    }

    pub fn open_question_editor(&mut self) {
        self.editor.open_for_create();
    }

    pub fn edit_question(&mut self, position: usize) -> Result<()> {
        self.editor.open_for_edit(&self.store, position)
    }

    pub fn question_buffer_mut(&mut self) -> Option<&mut QuestionRecord> {
        self.editor.buffer_mut()
    }

    pub fn save_question(&mut self) -> Result<()> {
        self.editor.save(&mut self.store)?;
        self.notifier
            .notify(Notification::success("Success", "Question saved successfully"));
        Ok(())
    }

    pub fn cancel_question(&mut self) {
        self.editor.cancel();
    }

    pub fn delete_question(&mut self, position: usize) -> Result<()> {
        self.store.remove_at(position)?;
        self.notifier
            .notify(Notification::success("Deleted", "Question removed successfully"));
        Ok(())
    }

    pub async fn generate_questions(&mut self) -> Result<usize> {
        match self.generator.generate(&self.metadata, &mut self.store).await {
            Ok(count) => {
                self.notifier.notify(Notification::success(
                    "Success",
                    format!("Generated {} questions successfully", count),
                ));
                Ok(count)
            }
            Err(err) => {
                tracing::error!(error = %err, "AI generation failed");
                self.notifier.notify(Notification::error(
                    "Error",
                    "Failed to generate questions. Please try again or add manually.",
                ));
                Err(err)
            }
        }
    }

    /// Assembles the final payload. Only available at the review step; the
    /// payload's delivery is outside the core.
    pub fn submit(&self) -> Result<SubmissionPayload> {
        if self.step != Step::Review {
            return Err(Error::State(
                "submission is only available at the review step".to_string(),
            ));
        }

        let payload = SubmissionPayload {
            metadata: self.metadata.clone(),
            questions: self.store.questions().to_vec(),
            actual_total_marks: self.store.total_marks(),
            created_at: Utc::now(),
        };

        self.notifier
            .notify(Notification::success("Success", "Test generated successfully!"));
        Ok(payload)
    }
}
