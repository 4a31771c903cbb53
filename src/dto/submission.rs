use crate::models::metadata::TestMetadata;
use crate::models::question::QuestionRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Final payload assembled at the review step. The core only builds it;
/// transport or persistence of the payload is the caller's concern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub metadata: TestMetadata,
    pub questions: Vec<QuestionRecord>,
    pub actual_total_marks: u32,
    pub created_at: DateTime<Utc>,
}
