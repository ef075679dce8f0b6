//! Lifecycle of a remote form instance (draft or finalized).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{FormSubmission, FormsApi};
use crate::feedback::NoticeBoard;
use crate::models::{Answers, FormSnapshot, FormStatus};
use crate::state::FormState;
use crate::util::non_blank;
use crate::{Error, Result};

const LOAD_FAILED_NOTICE: &str = "Could not load the form. Please try again.";
const FINALIZED_NOTICE: &str = "Form finalized";

/// Result of a draft save that passed its preconditions.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    /// The remote write failed; the failure was logged, not surfaced.
    SoftFail(Error),
}

impl SaveOutcome {
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: FormState,
    snapshot: Option<FormSnapshot>,
}

/// State machine for one form instance.
///
/// `Empty -> Loading -> Loaded -> Saving -> Loaded | Finalized`
///
/// Submissions run one at a time. A save issued while another is in flight
/// waits for it instead of failing.
pub struct FormController {
    api: Arc<dyn FormsApi>,
    notices: NoticeBoard,
    lifecycle: Mutex<Lifecycle>,
    submit_lock: tokio::sync::Mutex<()>,
}

impl FormController {
    pub fn new(api: Arc<dyn FormsApi>, notices: NoticeBoard) -> Self {
        Self {
            api,
            notices,
            lifecycle: Mutex::new(Lifecycle {
                state: FormState::Empty,
                snapshot: None,
            }),
            submit_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FormState {
        self.lock().state
    }

    /// Last snapshot confirmed by the server.
    pub fn snapshot(&self) -> Option<FormSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn version_id(&self) -> Option<String> {
        self.lock()
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.version_id.clone())
    }

    /// Server answers overlaid with local edits.
    pub fn merged_answers(&self, local_edits: &Answers) -> Answers {
        let mut answers = self
            .lock()
            .snapshot
            .as_ref()
            .map(FormSnapshot::answers)
            .unwrap_or_default();
        answers.extend(
            local_edits
                .iter()
                .map(|(id, answer)| (id.clone(), answer.clone())),
        );
        answers
    }

    /// Load the form for `subject_id`. Does nothing without a subject.
    ///
    /// On failure the previous state and snapshot are kept and a warning
    /// notice is shown.
    pub async fn fetch(&self, form_type: &str, subject_id: Option<&str>) -> Result<()> {
        let Some(subject_id) = non_blank(subject_id) else {
            tracing::debug!("Skipping {form_type} fetch without a subject");
            return Ok(());
        };

        let prior = {
            let mut lifecycle = self.lock();
            std::mem::replace(&mut lifecycle.state, FormState::Loading)
        };

        match self.api.fetch_form(form_type, subject_id).await {
            Ok(snapshot) => {
                tracing::debug!(
                    "Loaded {form_type} for {subject_id} (version {:?})",
                    snapshot.version_id
                );
                let mut lifecycle = self.lock();
                lifecycle.state = match snapshot.status {
                    FormStatus::Finalized => FormState::Finalized,
                    FormStatus::Draft => FormState::Loaded,
                };
                lifecycle.snapshot = Some(snapshot);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Failed to load {form_type} for {subject_id}: {error}");
                self.lock().state = prior;
                self.notices.warning(LOAD_FAILED_NOTICE);
                Err(error)
            }
        }
    }

    /// Autosave path: remote failures are logged and reported as
    /// [`SaveOutcome::SoftFail`], never as `Err`. So is a form that was
    /// finalized while this save waited its turn.
    ///
    /// # Errors
    /// Only a missing subject or loaded version, before any request is sent.
    pub async fn save_draft(
        &self,
        form_type: &str,
        subject_id: Option<&str>,
        answers: &Answers,
    ) -> Result<SaveOutcome> {
        let subject_id = require_subject(subject_id)?;
        let _turn = self.submit_lock.lock().await;
        if self.state() == FormState::Finalized {
            tracing::debug!("Skipping {form_type} draft save for finalized form");
            return Ok(SaveOutcome::SoftFail(Error::precondition(
                "form is already finalized",
            )));
        }
        let submission = self.prepare(answers, false)?;

        let result = self.api.submit_form(form_type, subject_id, &submission).await;
        self.finish_saving(FormState::Loaded);

        match result {
            Ok(()) => {
                tracing::debug!("Saved {form_type} draft for {subject_id}");
                Ok(SaveOutcome::Saved)
            }
            Err(error) => {
                tracing::warn!("Draft save of {form_type} for {subject_id} failed: {error}");
                Ok(SaveOutcome::SoftFail(error))
            }
        }
    }

    /// Submit the answers as final, after any save still in flight.
    ///
    /// Answer shapes are checked against the loaded form before anything is
    /// sent. A remote failure is returned and shown as an error notice.
    pub async fn finalize(
        &self,
        form_type: &str,
        subject_id: Option<&str>,
        answers: &Answers,
    ) -> Result<()> {
        let subject_id = require_subject(subject_id)?;
        let _turn = self.submit_lock.lock().await;
        let submission = self.prepare(answers, true)?;

        match self.api.submit_form(form_type, subject_id, &submission).await {
            Ok(()) => {
                tracing::info!("Finalized {form_type} for {subject_id}");
                {
                    let mut lifecycle = self.lock();
                    if let Some(snapshot) = lifecycle.snapshot.as_mut() {
                        snapshot.status = FormStatus::Finalized;
                    }
                }
                self.finish_saving(FormState::Finalized);
                self.notices.success(FINALIZED_NOTICE);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Finalize of {form_type} for {subject_id} failed: {error}");
                self.finish_saving(FormState::Loaded);
                self.notices.error(&error);
                Err(error)
            }
        }
    }

    /// Dispatch on `finalize`; a soft-failed draft save counts as success.
    pub async fn save(
        &self,
        form_type: &str,
        subject_id: Option<&str>,
        answers: &Answers,
        finalize: bool,
    ) -> Result<()> {
        if finalize {
            self.finalize(form_type, subject_id, answers).await
        } else {
            self.save_draft(form_type, subject_id, answers)
                .await
                .map(|_| ())
        }
    }

    /// Check preconditions and move to `Saving`. No I/O happens here.
    ///
    /// Callers hold `submit_lock`, so the state is never `Saving` on entry.
    fn prepare(&self, answers: &Answers, finalize: bool) -> Result<FormSubmission> {
        let mut lifecycle = self.lock();
        if lifecycle.state == FormState::Finalized {
            return Err(Error::precondition("form is already finalized"));
        }

        let snapshot = lifecycle
            .snapshot
            .as_ref()
            .ok_or_else(|| Error::precondition("form version is not loaded"))?;
        let version_id = non_blank(snapshot.version_id.as_deref())
            .ok_or_else(|| Error::precondition("form version is not loaded"))?
            .to_string();
        if finalize {
            snapshot.validate_answers(answers)?;
        }

        lifecycle.state = FormState::Saving;
        Ok(FormSubmission {
            version_id,
            answers: answers.clone(),
            finalize,
        })
    }

    fn finish_saving(&self, next: FormState) {
        let mut lifecycle = self.lock();
        if lifecycle.state == FormState::Saving {
            lifecycle.state = next;
        }
    }
}

fn require_subject(subject_id: Option<&str>) -> Result<&str> {
    non_blank(subject_id).ok_or_else(|| Error::precondition("subject id is required"))
}
