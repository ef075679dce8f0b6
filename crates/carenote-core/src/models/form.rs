//! Remote form model (anamnesis, intake and similar questionnaires)

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Answers keyed by question id
pub type Answers = BTreeMap<String, Answer>;

/// Remote status of a form instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    /// Still editable
    #[default]
    Draft,
    /// Confirmed by the server, immutable
    Finalized,
}

/// Kind of input a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    Text,
    LongText,
    Integer,
    Date,
    SingleChoice,
    MultiChoice,
}

impl QuestionType {
    pub const fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

/// Selectable option of a choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    /// Selecting this option requires a free-text supplement
    #[serde(default)]
    pub requires_text: bool,
    /// Label of the supplement input
    #[serde(default)]
    pub text_label: Option<String>,
}

/// A selected option, optionally with supplement text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionAnswer {
    pub option_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplement_text: Option<String>,
}

impl OptionAnswer {
    pub fn new(option_id: impl Into<String>) -> Self {
        Self {
            option_id: option_id.into(),
            supplement_text: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.supplement_text = Some(text.into());
        self
    }
}

/// Answer value. Absence (JSON `null`) is modelled as `Option<Answer>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    /// Integer questions may come back as a bare JSON number
    Number(serde_json::Number),
    Choice(OptionAnswer),
    Choices(Vec<OptionAnswer>),
}

impl Answer {
    /// Whether the answer carries any content.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(text) => !text.trim().is_empty(),
            Self::Number(_) | Self::Choice(_) => true,
            Self::Choices(choices) => !choices.is_empty(),
        }
    }

    /// Whether the given option is among the selected ones.
    pub fn selects(&self, option_id: &str) -> bool {
        match self {
            Self::Text(_) | Self::Number(_) => false,
            Self::Choice(choice) => choice.option_id == option_id,
            Self::Choices(choices) => choices.iter().any(|choice| choice.option_id == option_id),
        }
    }

    fn selected(&self) -> &[OptionAnswer] {
        match self {
            Self::Text(_) | Self::Number(_) => &[],
            Self::Choice(choice) => std::slice::from_ref(choice),
            Self::Choices(choices) => choices,
        }
    }
}

/// A single question in a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub required: bool,
    /// Only shown when this option is selected somewhere in the form
    #[serde(default)]
    pub depends_on_option_id: Option<String>,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub answer: Option<Answer>,
}

impl Question {
    fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// A question with a dependency is visible only while its option is selected.
    pub fn is_visible(&self, answers: &Answers) -> bool {
        self.depends_on_option_id.as_deref().is_none_or(|option_id| {
            answers.values().any(|answer| answer.selects(option_id))
        })
    }

    /// Check that `answer` has the shape the question type demands.
    pub fn validate_answer(&self, answer: &Answer) -> Result<()> {
        match (self.kind, answer) {
            (QuestionType::Text | QuestionType::LongText, Answer::Text(_)) => Ok(()),
            (QuestionType::Integer, Answer::Text(text)) => {
                if text.trim().is_empty() || text.trim().parse::<i64>().is_ok() {
                    Ok(())
                } else {
                    Err(self.invalid(format!("'{}' is not a whole number", text.trim())))
                }
            }
            (QuestionType::Integer, Answer::Number(number)) => {
                if number.as_i64().is_some() {
                    Ok(())
                } else {
                    Err(self.invalid(format!("'{number}' is not a whole number")))
                }
            }
            (QuestionType::Date, Answer::Text(text)) => {
                if text.trim().is_empty()
                    || NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok()
                {
                    Ok(())
                } else {
                    Err(self.invalid(format!("'{}' is not a date (YYYY-MM-DD)", text.trim())))
                }
            }
            (QuestionType::SingleChoice, Answer::Choice(_))
            | (QuestionType::MultiChoice, Answer::Choices(_)) => self.validate_choices(answer),
            (kind, _) => Err(self.invalid(format!("answer shape does not match {kind:?}"))),
        }
    }

    fn validate_choices(&self, answer: &Answer) -> Result<()> {
        for selected in answer.selected() {
            let Some(option) = self.option(&selected.option_id) else {
                return Err(self.invalid(format!("unknown option {}", selected.option_id)));
            };
            let has_text = selected
                .supplement_text
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty());
            if option.requires_text && !has_text {
                let field = option.text_label.as_deref().unwrap_or(&option.label);
                return Err(self.invalid(format!("'{field}' must be filled in")));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidAnswer {
            question_id: self.id.clone(),
            reason,
        }
    }
}

/// Ordered group of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Server-confirmed state of a form instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub id: String,
    #[serde(default)]
    pub status: FormStatus,
    /// Required for any submission
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl FormSnapshot {
    /// Sections sorted by their `order` field.
    pub fn ordered_sections(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|section| section.order);
        sections
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.ordered_sections()
            .into_iter()
            .flat_map(|section| section.questions.iter())
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions().find(|question| question.id == question_id)
    }

    /// Answers as last confirmed by the server.
    pub fn answers(&self) -> Answers {
        self.questions()
            .filter_map(|question| {
                question
                    .answer
                    .clone()
                    .map(|answer| (question.id.clone(), answer))
            })
            .collect()
    }

    /// Check that every provided answer belongs to the form and has the
    /// shape its question demands.
    ///
    /// Unanswered questions are not checked here; completeness is the
    /// server's call.
    pub fn validate_answers(&self, answers: &Answers) -> Result<()> {
        for (question_id, answer) in answers {
            let Some(question) = self.question(question_id) else {
                return Err(Error::InvalidAnswer {
                    question_id: question_id.clone(),
                    reason: "question does not belong to this form".to_string(),
                });
            };
            question.validate_answer(answer)?;
        }
        Ok(())
    }

    /// Percentage (0-100) of visible required questions answered locally.
    pub fn local_progress(&self, answers: &Answers) -> u8 {
        let (total, answered) = self
            .questions()
            .filter(|question| question.required && question.is_visible(answers))
            .fold((0_usize, 0_usize), |(total, answered), question| {
                let filled = answers.get(&question.id).is_some_and(Answer::is_filled);
                (total + 1, answered + usize::from(filled))
            });
        if total == 0 {
            return 100;
        }
        u8::try_from(answered * 100 / total).unwrap_or(100)
    }
}
