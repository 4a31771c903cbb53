use test_builder::config::Config;
use test_builder::models::metadata::Subject;
use tracing::{info, warn};

/// Scripted end-to-end run of the authoring wizard: fill in test details,
/// generate questions through the configured AI provider (falling back to one
/// manual question when the provider is unreachable), and print the assembled
/// submission payload.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let mut wizard = test_builder::build_wizard(&config)?;

    let metadata = wizard.metadata_mut();
    metadata.set_title("Forces and Motion");
    metadata.set_subject(Some(Subject::Physics));
    metadata.set_grade(Some("8".to_string()));
    metadata.set_duration(Some(30))?;
    metadata.set_easy_count(2)?;
    metadata.set_medium_count(1)?;
    wizard.advance()?;

    match wizard.generate_questions().await {
        Ok(count) => info!(count, "AI generation succeeded"),
        Err(err) => warn!(error = %err, "AI generation failed, adding a question manually"),
    }

    if wizard.store().is_empty() {
        wizard.open_question_editor();
        let buffer = wizard
            .question_buffer_mut()
            .expect("editor was just opened");
        buffer.question_text = "Which unit measures force?".to_string();
        let texts = ["Newton", "Joule", "Watt", "Pascal"];
        for (option, text) in buffer.options.iter_mut().zip(texts) {
            option.text = text.to_string();
        }
        let correct = buffer.options[0].id.clone();
        buffer.correct_option_ids.push(correct);
        wizard.save_question()?;
    }
    wizard.advance()?;

    let payload = wizard.submit()?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
