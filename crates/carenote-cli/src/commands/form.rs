use std::sync::Arc;

use carenote_core::api::FormsApi;
use carenote_core::feedback::NoticeBoard;
use carenote_core::forms::FormController;
use carenote_core::models::{Answer, FormSnapshot};

use crate::commands::common::normalize_form_type;
use crate::error::CliError;

pub async fn run_form(
    api: Arc<dyn FormsApi>,
    notices: NoticeBoard,
    form_type: &str,
    subject_id: &str,
    as_json: bool,
) -> Result<(), CliError> {
    let form_type = normalize_form_type(form_type)?;
    let controller = FormController::new(api, notices.clone());
    if let Err(error) = controller.fetch(&form_type, Some(subject_id)).await {
        for notice in notices.active() {
            eprintln!("{}", notice.message);
        }
        return Err(error.into());
    }

    let Some(snapshot) = controller.snapshot() else {
        println!("No form loaded.");
        return Ok(());
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        for line in format_form_lines(&snapshot) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_form_lines(snapshot: &FormSnapshot) -> Vec<String> {
    let answers = snapshot.answers();
    let mut lines = vec![format!(
        "{} [{:?}] version {} - {}% complete",
        snapshot.id,
        snapshot.status,
        snapshot.version_id.as_deref().unwrap_or("-"),
        snapshot.local_progress(&answers)
    )];

    for section in snapshot.ordered_sections() {
        lines.push(String::new());
        lines.push(format!("## {}", section.title));
        for question in &section.questions {
            if !question.is_visible(&answers) {
                continue;
            }
            let marker = if question.required { "*" } else { " " };
            let answer = answers
                .get(&question.id)
                .map_or_else(|| "-".to_string(), |answer| render_answer(question, answer));
            lines.push(format!("{marker} {}: {answer}", question.prompt));
        }
    }
    lines
}

fn render_answer(question: &carenote_core::models::Question, answer: &Answer) -> String {
    let option_label = |option_id: &str, text: Option<&str>| {
        let label = question
            .options
            .iter()
            .find(|option| option.id == option_id)
            .map_or(option_id, |option| option.label.as_str());
        match text {
            Some(text) => format!("{label} ({text})"),
            None => label.to_string(),
        }
    };

    match answer {
        Answer::Text(text) => text.clone(),
        Answer::Number(number) => number.to_string(),
        Answer::Choice(choice) => {
            option_label(&choice.option_id, choice.supplement_text.as_deref())
        }
        Answer::Choices(choices) => choices
            .iter()
            .map(|choice| option_label(&choice.option_id, choice.supplement_text.as_deref()))
            .collect::<Vec<_>>()
            .join(", "),
    }
}
