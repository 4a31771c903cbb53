use crate::error::{Error, Result};
use crate::models::metadata::TestMetadata;
use crate::models::question::{AnswerOption, AnswerType, QuestionRecord};
use crate::services::provider::{GenerationConfig, TextGeneration};
use crate::services::store::QuestionStore;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

/// Builds a prompt from the test metadata, asks the injected provider for
/// question JSON, and appends the parsed records to the store.
///
/// At most one request is in flight at a time: the `generating` flag is
/// acquired before the call and released by a drop guard on every exit path,
/// and a second call while one is pending is rejected.
pub struct AiQuestionGenerator {
    provider: Arc<dyn TextGeneration>,
    config: GenerationConfig,
    request_timeout: Duration,
    generating: Arc<AtomicBool>,
}

impl AiQuestionGenerator {
    pub fn new(
        provider: Arc<dyn TextGeneration>,
        config: GenerationConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            config,
            request_timeout,
            generating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    /// Returns the number of records appended. Any failure appends nothing.
    pub async fn generate(
        &self,
        metadata: &TestMetadata,
        store: &mut QuestionStore,
    ) -> Result<usize> {
        if metadata.total_question_count() == 0 {
            return Err(Error::validation(
                "set at least one difficulty count before generating",
            ));
        }

        let _guard = GeneratingGuard::acquire(&self.generating)?;

        let prompt = build_prompt(metadata);
        tracing::info!(
            model = %self.config.model,
            requested = metadata.total_question_count(),
            "Requesting AI question generation"
        );

        let response = match timeout(
            self.request_timeout,
            self.provider.generate(&prompt, &self.config),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Transport(format!(
                    "text generation timed out after {}s",
                    self.request_timeout.as_secs()
                )))
            }
        };

        let records = parse_response(&response)?;
        let appended = records.len();
        for record in records {
            store.append(record);
        }

        tracing::info!(appended, "AI generation finished");
        Ok(appended)
    }
}

struct GeneratingGuard {
    flag: Arc<AtomicBool>,
}

impl GeneratingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::State(
                "an AI generation request is already in flight".to_string(),
            ));
        }
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for GeneratingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn build_prompt(metadata: &TestMetadata) -> String {
    let subject = metadata
        .subject()
        .map(|s| s.label())
        .unwrap_or("General Knowledge");
    let grade = metadata.grade().filter(|g| !g.is_empty()).unwrap_or("General");

    format!(
        r#"Generate {easy} Easy Questions, {medium} Medium Questions, {hard} Hard Questions for a {subject} test.
Grade Level: {grade}
Topic: {topic}

Return the questions in this exact JSON format:
[
  {{
    "questionText": "Question text here",
    "options": [{{"id": "a", "optionText": "Option A"}}, {{"id": "b", "optionText": "Option B"}}, {{"id": "c", "optionText": "Option C"}}, {{"id": "d", "optionText": "Option D"}}],
    "marks": 1,
    "explanation": "Brief explanation of the correct answer",
    "answerType": "Single-Correct" or "Multiple-Correct",
    "correctOptionId": "a"
  }}
]

Make sure to:
1. Create questions appropriate for the subject and difficulty level
2. Include a mix of question types
3. Ensure all options are plausible
4. Provide clear explanations
5. Set correctOptionId to the id of the correct option
6. Return only the JSON array, with no surrounding prose or code fences"#,
        easy = metadata.easy_count(),
        medium = metadata.medium_count(),
        hard = metadata.hard_count(),
        subject = subject,
        grade = grade,
        topic = metadata.title(),
    )
}

/// Two-stage ingestion of untrusted model output: extract the first balanced
/// `[...]` substring (tolerating surrounding commentary), then parse it and
/// coerce each entry best-effort. Entries are not rejected here; the editor's
/// validation applies when a record is next touched.
fn parse_response(text: &str) -> Result<Vec<QuestionRecord>> {
    let array_text = extract_json_array(text)
        .ok_or_else(|| Error::Parse("no JSON array found in the response".to_string()))?;

    let parsed: JsonValue = serde_json::from_str(array_text)
        .map_err(|e| Error::Parse(format!("response array is not valid JSON: {}", e)))?;

    let entries = parsed
        .as_array()
        .ok_or_else(|| Error::Parse("extracted payload is not a JSON array".to_string()))?;

    Ok(entries.iter().map(coerce_record).collect())
}

/// Finds the first balanced bracketed substring, skipping brackets inside
/// JSON string literals. Heuristic by design: the model is asked for a bare
/// array but routinely wraps it in prose.
fn extract_json_array(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(text.as_bytes(), start) {
            return Some(&text[start..=end]);
        }
        search_from = start + 1;
    }
    None
}

fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn coerce_record(value: &JsonValue) -> QuestionRecord {
    let options = value
        .get("options")
        .and_then(|o| o.as_array())
        .map(|options| options.iter().map(coerce_option).collect())
        .unwrap_or_default();

    let correct_option_ids = match value.get("correctOptionId") {
        Some(id) => id_token(id).map(|id| vec![id]).unwrap_or_default(),
        None => Vec::new(),
    };

    QuestionRecord {
        question_text: value
            .get("questionText")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string(),
        options,
        marks: value.get("marks").and_then(|m| m.as_u64()).unwrap_or(1) as u32,
        explanation: value
            .get("explanation")
            .and_then(|s| s.as_str())
            .unwrap_or("")
            .to_string(),
        answer_type: AnswerType::parse(
            value.get("answerType").and_then(|s| s.as_str()).unwrap_or(""),
        ),
        correct_option_ids,
    }
}

fn coerce_option(value: &JsonValue) -> AnswerOption {
    AnswerOption {
        id: value
            .get("id")
            .and_then(id_token)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        text: value
            .get("optionText")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

// Models sometimes emit numeric ids despite the example shape.
fn id_token(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metadata::Subject;
    use crate::services::provider::MockTextGeneration;
    use tokio_test::assert_ok;

    fn generation_config() -> GenerationConfig {
        GenerationConfig {
            model: "gemma2-9b-it".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    fn metadata_with_counts(easy: u32, medium: u32, hard: u32) -> TestMetadata {
        let mut metadata = TestMetadata::new();
        metadata.set_title("Arithmetic basics");
        metadata.set_subject(Some(Subject::Mathematics));
        metadata.set_easy_count(easy).unwrap();
        metadata.set_medium_count(medium).unwrap();
        metadata.set_hard_count(hard).unwrap();
        metadata
    }

    fn generator_returning(response: &str) -> AiQuestionGenerator {
        let response = response.to_string();
        let mut provider = MockTextGeneration::new();
        provider
            .expect_generate()
            .returning(move |_, _| Ok(response.clone()));
        AiQuestionGenerator::new(
            Arc::new(provider),
            generation_config(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn appends_records_despite_surrounding_prose() {
        let response = r#"Sure! [{"questionText":"2+2?","options":[{"id":"a","optionText":"3"},{"id":"b","optionText":"4"}],"marks":1,"answerType":"Single-Correct","correctOptionId":"b"}] Hope that helps!"#;
        let generator = generator_returning(response);
        let metadata = metadata_with_counts(1, 0, 0);
        let mut store = QuestionStore::new();

        let appended = generator.generate(&metadata, &mut store).await.unwrap();
        assert_eq!(appended, 1);
        assert_eq!(store.count(), 1);

        let record = store.get(0).unwrap();
        assert_eq!(record.question_text, "2+2?");
        assert_eq!(record.marks, 1);
        assert_eq!(record.explanation, "");
        assert_eq!(record.answer_type, AnswerType::SingleCorrect);
        assert_eq!(record.correct_option_ids, vec!["b".to_string()]);
        assert!(!generator.is_generating());
    }

    #[tokio::test]
    async fn refusal_text_fails_with_parse_error_and_appends_nothing() {
        let generator = generator_returning("I cannot help with that.");
        let metadata = metadata_with_counts(1, 0, 0);
        let mut store = QuestionStore::new();

        let err = generator.generate(&metadata, &mut store).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(store.count(), 0);
        assert!(!generator.is_generating());
    }

    #[tokio::test]
    async fn zero_counts_are_rejected_before_any_call() {
        let mut provider = MockTextGeneration::new();
        provider.expect_generate().never();
        let generator = AiQuestionGenerator::new(
            Arc::new(provider),
            generation_config(),
            Duration::from_secs(5),
        );
        let metadata = metadata_with_counts(0, 0, 0);
        let mut store = QuestionStore::new();

        let err = generator.generate(&metadata, &mut store).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn transport_failure_clears_the_generating_flag() {
        let mut provider = MockTextGeneration::new();
        provider
            .expect_generate()
            .returning(|_, _| Err(Error::Transport("connection refused".to_string())));
        let generator = AiQuestionGenerator::new(
            Arc::new(provider),
            generation_config(),
            Duration::from_secs(5),
        );
        let metadata = metadata_with_counts(1, 0, 0);
        let mut store = QuestionStore::new();

        let err = generator.generate(&metadata, &mut store).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(store.count(), 0);
        assert!(!generator.is_generating());
    }

    #[tokio::test]
    async fn second_call_while_pending_is_rejected() {
        struct BlockedProvider {
            release: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
        }

        #[async_trait::async_trait]
        impl TextGeneration for BlockedProvider {
            async fn generate(&self, _: &str, _: &GenerationConfig) -> Result<String> {
                let receiver = self.release.lock().await.take();
                if let Some(receiver) = receiver {
                    let _ = receiver.await;
                }
                Ok("[]".to_string())
            }
        }

        let (sender, receiver) = tokio::sync::oneshot::channel();
        let generator = Arc::new(AiQuestionGenerator::new(
            Arc::new(BlockedProvider {
                release: tokio::sync::Mutex::new(Some(receiver)),
            }),
            generation_config(),
            Duration::from_secs(5),
        ));
        let metadata = metadata_with_counts(1, 0, 0);

        let first = {
            let generator = generator.clone();
            let metadata = metadata.clone();
            tokio::spawn(async move {
                let mut store = QuestionStore::new();
                generator.generate(&metadata, &mut store).await
            })
        };

        while !generator.is_generating() {
            tokio::task::yield_now().await;
        }

        let mut store = QuestionStore::new();
        let err = generator.generate(&metadata, &mut store).await.unwrap_err();
        assert!(matches!(err, Error::State(_)));

        sender.send(()).unwrap();
        let first = first.await.unwrap();
        assert_ok!(first);
        assert!(!generator.is_generating());
    }

    #[test]
    fn missing_fields_default_best_effort() {
        let records = parse_response(r#"[{"questionText":"Name a planet."}]"#).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.marks, 1);
        assert_eq!(record.explanation, "");
        assert_eq!(record.answer_type, AnswerType::Unspecified);
        assert!(record.options.is_empty());
        assert!(record.correct_option_ids.is_empty());
    }

    #[test]
    fn extraction_handles_nested_arrays_and_brackets_in_strings() {
        let text = r#"Here you go: [{"questionText":"pick [the] right one","tags":["a","b"]}] done"#;
        let extracted = extract_json_array(text).unwrap();
        assert!(extracted.starts_with('['));
        assert!(extracted.ends_with(']'));
        assert!(serde_json::from_str::<JsonValue>(extracted).is_ok());
    }

    #[test]
    fn extraction_skips_unbalanced_leading_bracket() {
        let text = r#"see [1 for details, then ["a","b"] applies"#;
        let extracted = extract_json_array(text).unwrap();
        assert_eq!(extracted, r#"["a","b"]"#);
    }

    #[test]
    fn extraction_returns_none_without_an_array() {
        assert!(extract_json_array("I cannot help with that.").is_none());
        assert!(extract_json_array("unbalanced [ only").is_none());
    }

    #[test]
    fn prompt_embeds_counts_subject_grade_and_topic() {
        let mut metadata = metadata_with_counts(2, 1, 0);
        metadata.set_grade(Some("8".to_string()));
        let prompt = build_prompt(&metadata);
        assert!(prompt.contains("Generate 2 Easy Questions, 1 Medium Questions, 0 Hard Questions"));
        assert!(prompt.contains("Mathematics test"));
        assert!(prompt.contains("Grade Level: 8"));
        assert!(prompt.contains("Topic: Arithmetic basics"));
    }

    #[test]
    fn prompt_defaults_missing_grade_to_general() {
        let metadata = metadata_with_counts(1, 0, 0);
        let prompt = build_prompt(&metadata);
        assert!(prompt.contains("Grade Level: General"));
    }
}
