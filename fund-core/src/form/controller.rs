use std::fmt;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use super::draft::{Draft, FieldPatch};
use super::submission::Submission;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("a step form needs at least one step")]
    NoSteps,

    #[error("a submission is in progress")]
    SubmissionInProgress,

    #[error("submission is only possible from the last step (at step {current} of {count})")]
    NotAtLastStep { current: usize, count: usize },
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    /// Next was pressed on the last step and the completion callback ran.
    Completed,
    /// Back was pressed on the first step.
    Unchanged,
}

/// What a step's renderer gets to work with: the current draft and a way to
/// report edits.
pub struct StepProps<'a, T: Draft> {
    data: &'a T,
    changes: Vec<T::Patch>,
}

impl<'a, T: Draft> StepProps<'a, T> {
    pub fn data(&self) -> &'a T {
        self.data
    }

    /// Queues a field update. It is applied to the draft once the renderer
    /// returns.
    pub fn on_change(
        &mut self,
        patch: T::Patch,
    ) {
        self.changes.push(patch);
    }
}

type Renderer<T, V> = Box<dyn Fn(&mut StepProps<'_, T>) -> V>;

/// One page of a [`StepForm`]: a label and the function that renders it.
pub struct StepDescriptor<T: Draft, V> {
    label: String,
    render: Renderer<T, V>,
}

impl<T: Draft, V> StepDescriptor<T, V> {
    pub fn new(
        label: impl Into<String>,
        render: impl Fn(&mut StepProps<'_, T>) -> V + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            render: Box::new(render),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T: Draft, V> fmt::Debug for StepDescriptor<T, V> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

type CompletionCallback<T> = Box<dyn FnMut(&T)>;

/// Linear wizard over a draft record of type `T`, rendering steps to `V`.
///
/// The step index starts at 0 and moves one step at a time; it never wraps.
/// Next on the last step fires the completion callback instead of moving.
pub struct StepForm<T: Draft, V> {
    steps: Vec<StepDescriptor<T, V>>,
    current: usize,
    draft: T,
    on_complete: Option<CompletionCallback<T>>,
    submission: Submission,
}

impl<T: Draft, V> StepForm<T, V> {
    pub fn new(
        steps: Vec<StepDescriptor<T, V>>,
        initial: T,
    ) -> Result<Self, FormError> {
        if steps.is_empty() {
            return Err(FormError::NoSteps);
        }
        Ok(Self {
            steps,
            current: 0,
            draft: initial,
            on_complete: None,
            submission: Submission::Idle,
        })
    }

    /// Sets the callback invoked with the final draft when Next is pressed
    /// on the last step.
    pub fn with_on_complete(
        mut self,
        on_complete: impl FnMut(&T) + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    pub fn current_step_index(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn is_first_step(&self) -> bool {
        self.current == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current == self.last_index()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(StepDescriptor::label)
    }

    pub fn active_label(&self) -> &str {
        self.steps[self.current].label()
    }

    /// Whether the Back control should be enabled.
    pub fn can_go_back(&self) -> bool {
        !self.is_first_step() && !self.submission.is_submitting()
    }

    /// Caption for the forward control.
    pub fn next_action_label(&self) -> &'static str {
        if self.is_last_step() { "Submit" } else { "Next" }
    }

    pub fn draft(&self) -> &T {
        &self.draft
    }

    pub fn into_draft(self) -> T {
        self.draft
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    fn ensure_unlocked(&self) -> Result<(), FormError> {
        if self.submission.is_submitting() {
            warn!(step = self.current, "form is locked while submitting");
            return Err(FormError::SubmissionInProgress);
        }
        Ok(())
    }

    /// Replaces one field of the draft. The step index is left alone.
    pub fn on_field_change(
        &mut self,
        patch: T::Patch,
    ) -> Result<(), FormError> {
        self.ensure_unlocked()?;
        debug!(step = self.current, field = patch.field(), "field changed");
        self.draft.apply(patch);
        Ok(())
    }

    pub fn on_next(&mut self) -> Result<Transition, FormError> {
        self.ensure_unlocked()?;

        if self.is_last_step() {
            debug!(step = self.current, "last step confirmed, completing");
            if let Some(on_complete) = self.on_complete.as_mut() {
                on_complete(&self.draft);
            }
            return Ok(Transition::Completed);
        }

        let from = self.current;
        self.current += 1;
        debug!(from, to = self.current, "advanced");
        Ok(Transition::Advanced {
            from,
            to: self.current,
        })
    }

    pub fn on_back(&mut self) -> Result<Transition, FormError> {
        self.ensure_unlocked()?;

        if self.is_first_step() {
            return Ok(Transition::Unchanged);
        }

        let from = self.current;
        self.current -= 1;
        debug!(from, to = self.current, "retreated");
        Ok(Transition::Retreated {
            from,
            to: self.current,
        })
    }

    /// Renders the active step only. Edits the step reports through
    /// [`StepProps::on_change`] are applied afterwards, in order.
    pub fn render(&mut self) -> V {
        let (view, changes) = {
            let mut props = StepProps {
                data: &self.draft,
                changes: Vec::new(),
            };
            let view = (self.steps[self.current].render)(&mut props);
            (view, props.changes)
        };

        if !self.submission.is_submitting() {
            for patch in changes {
                debug!(step = self.current, field = patch.field(), "field changed during render");
                self.draft.apply(patch);
            }
        } else if !changes.is_empty() {
            warn!(dropped = changes.len(), "ignoring edits made while submitting");
        }

        view
    }

    /// Starts a submission and hands back a snapshot of the draft to send.
    ///
    /// Only possible from the last step. Navigation and edits are rejected
    /// until [`finish_submission`](Self::finish_submission) is called.
    pub fn begin_submission(&mut self) -> Result<T, FormError> {
        if !self.is_last_step() {
            return Err(FormError::NotAtLastStep {
                current: self.current + 1,
                count: self.steps.len(),
            });
        }
        if !self.submission.begin() {
            return Err(FormError::SubmissionInProgress);
        }
        debug!("submission started");
        Ok(self.draft.clone())
    }

    pub fn finish_submission<E: fmt::Display>(
        &mut self,
        result: Result<(), E>,
    ) {
        settle(&mut self.submission, result);
    }

    /// Runs `submit` on a snapshot of the draft, tracking progress in
    /// [`submission`](Self::submission). The step index is not reverted on
    /// failure.
    ///
    /// If the returned future is dropped before `submit` finishes, the
    /// submission ends as `Failed("cancelled")` and the form unlocks.
    pub async fn submit_with<F, Fut, R, E>(
        &mut self,
        submit: F,
    ) -> Result<Result<R, E>, FormError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        let snapshot = self.begin_submission()?;
        let mut pending = PendingSubmission(&mut self.submission);
        let outcome = submit(snapshot).await;
        match &outcome {
            Ok(_) => settle::<E>(&mut *pending.0, Ok(())),
            Err(e) => settle(&mut *pending.0, Err(e.to_string())),
        }
        Ok(outcome)
    }
}

fn settle<E: fmt::Display>(
    submission: &mut Submission,
    result: Result<(), E>,
) {
    if let Err(e) = &result {
        warn!(error = %e, "submission failed");
    } else {
        debug!("submission succeeded");
    }
    submission.finish(result);
}

/// Held across the submit await; fails a submission that never settled.
struct PendingSubmission<'a>(&'a mut Submission);

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.0.is_submitting() {
            settle(self.0, Err("cancelled"));
        }
    }
}

impl<T: Draft, V> fmt::Debug for StepForm<T, V> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("StepForm")
            .field("steps", &self.steps)
            .field("current", &self.current)
            .field("draft", &self.draft)
            .field("submission", &self.submission)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::form::{DraftRecord, FieldChange};

    fn steps(n: usize) -> Vec<StepDescriptor<DraftRecord, String>> {
        (0..n)
            .map(|i| {
                StepDescriptor::new(
                    format!("Step {}", i + 1),
                    move |props: &mut StepProps<'_, DraftRecord>| {
                        format!("step {i}: {:?}", props.data().get("name"))
                    },
                )
            })
            .collect()
    }

    fn name_city() -> DraftRecord {
        DraftRecord::try_from(json!({"name": "", "city": ""})).unwrap()
    }

    /// Completion callback that records every draft it receives.
    fn recorder() -> (Rc<RefCell<Vec<DraftRecord>>>, impl FnMut(&DraftRecord) + 'static) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        (calls, move |d: &DraftRecord| sink.borrow_mut().push(d.clone()))
    }

    #[test]
    fn empty_step_list_is_rejected() {
        let result = StepForm::<DraftRecord, String>::new(Vec::new(), DraftRecord::new());
        assert_eq!(result.err(), Some(FormError::NoSteps));
    }

    #[test]
    fn starts_at_first_step_with_initial_draft() {
        let form = StepForm::new(steps(3), name_city()).unwrap();
        assert_eq!(form.current_step_index(), 0);
        assert_eq!(form.draft(), &name_city());
        assert_eq!(form.active_label(), "Step 1");
        assert_eq!(form.next_action_label(), "Next");
        assert!(!form.can_go_back());
    }

    #[test]
    fn index_stays_in_bounds_for_any_navigation_sequence() {
        for n in 1..=5 {
            let mut form = StepForm::new(steps(n), name_city()).unwrap();
            // Deterministic pseudo-random walk.
            let mut seed: u32 = 0x9e37_79b9 ^ n as u32;
            for _ in 0..200 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                if seed % 2 == 0 {
                    form.on_next().unwrap();
                } else {
                    form.on_back().unwrap();
                }
                assert!(form.current_step_index() < n);
            }
        }
    }

    #[test]
    fn back_on_first_step_is_a_no_op() {
        let mut form = StepForm::new(steps(3), name_city()).unwrap();
        assert_eq!(form.on_back(), Ok(Transition::Unchanged));
        assert_eq!(form.current_step_index(), 0);
        assert_eq!(form.draft(), &name_city());
    }

    #[test]
    fn next_on_last_step_completes_once_without_moving() {
        let (calls, on_complete) = recorder();
        let mut form = StepForm::new(steps(2), name_city())
            .unwrap()
            .with_on_complete(on_complete);

        assert_eq!(form.on_next(), Ok(Transition::Advanced { from: 0, to: 1 }));
        assert!(calls.borrow().is_empty());

        assert_eq!(form.on_next(), Ok(Transition::Completed));
        assert_eq!(form.current_step_index(), 1);
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0], name_city());
    }

    #[test]
    fn completion_without_callback_still_reports_completed() {
        let mut form = StepForm::new(steps(1), name_city()).unwrap();
        assert_eq!(form.on_next(), Ok(Transition::Completed));
    }

    #[test]
    fn field_change_touches_only_that_field() {
        let mut form = StepForm::new(steps(2), name_city()).unwrap();
        form.on_field_change(FieldChange::new("name", "Alice")).unwrap();

        assert_eq!(form.draft().get("name"), Some(&json!("Alice")));
        assert_eq!(form.draft().get("city"), Some(&json!("")));
        assert_eq!(form.current_step_index(), 0);
    }

    #[test]
    fn untouched_draft_round_trips_to_completion() {
        let initial = DraftRecord::try_from(json!({
            "name": "Clean Water",
            "target": 2500,
            "causes": ["water"],
        }))
        .unwrap();
        let (calls, on_complete) = recorder();
        let mut form = StepForm::new(steps(4), initial.clone())
            .unwrap()
            .with_on_complete(on_complete);

        while form.on_next().unwrap() != Transition::Completed {}

        assert_eq!(calls.borrow().as_slice(), &[initial]);
    }

    #[test]
    fn three_step_scenario() {
        let (calls, on_complete) = recorder();
        let mut form = StepForm::new(steps(3), name_city())
            .unwrap()
            .with_on_complete(on_complete);

        form.on_field_change(FieldChange::new("name", "Alice")).unwrap();
        let expected = DraftRecord::try_from(json!({"name": "Alice", "city": ""})).unwrap();
        assert_eq!(form.draft(), &expected);

        form.on_next().unwrap();
        form.on_next().unwrap();
        assert_eq!(form.current_step_index(), 2);
        assert_eq!(form.next_action_label(), "Submit");

        assert_eq!(form.on_next(), Ok(Transition::Completed));
        assert_eq!(form.current_step_index(), 2);
        assert_eq!(calls.borrow().as_slice(), &[expected]);
    }

    #[test]
    fn single_step_scenario() {
        let (calls, on_complete) = recorder();
        let mut form = StepForm::new(steps(1), name_city())
            .unwrap()
            .with_on_complete(on_complete);

        assert_eq!(form.on_back(), Ok(Transition::Unchanged));
        assert_eq!(form.current_step_index(), 0);

        assert_eq!(form.on_next(), Ok(Transition::Completed));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn render_shows_only_the_active_step() {
        let mut form = StepForm::new(steps(3), name_city()).unwrap();
        assert_eq!(form.render(), "step 0: Some(String(\"\"))");

        form.on_field_change(FieldChange::new("name", "Alice")).unwrap();
        form.on_next().unwrap();
        assert_eq!(form.render(), "step 1: Some(String(\"Alice\"))");
    }

    #[test]
    fn render_applies_changes_reported_by_the_step() {
        let step = StepDescriptor::new("Normalize", |props: &mut StepProps<'_, DraftRecord>| {
            let name = props
                .data()
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .trim()
                .to_string();
            props.on_change(FieldChange::new("name", name));
        });
        let initial = DraftRecord::try_from(json!({"name": "  Alice  ", "city": "Porto"})).unwrap();
        let mut form = StepForm::new(vec![step], initial).unwrap();

        form.render();

        assert_eq!(form.draft().get("name"), Some(&json!("Alice")));
        assert_eq!(form.draft().get("city"), Some(&json!("Porto")));
    }

    #[test]
    fn edits_survive_navigating_away_and_back() {
        let mut form = StepForm::new(steps(2), name_city()).unwrap();
        form.on_field_change(FieldChange::new("city", "Porto")).unwrap();
        form.on_next().unwrap();
        form.on_back().unwrap();
        assert_eq!(form.draft().get("city"), Some(&json!("Porto")));
    }

    #[test]
    fn begin_submission_requires_last_step() {
        let mut form = StepForm::new(steps(2), name_city()).unwrap();
        assert_eq!(
            form.begin_submission().err(),
            Some(FormError::NotAtLastStep {
                current: 1,
                count: 2
            })
        );
        assert_eq!(form.submission(), &Submission::Idle);
    }

    #[test]
    fn pending_submission_locks_navigation_and_edits() {
        let mut form = StepForm::new(steps(2), name_city()).unwrap();
        form.on_next().unwrap();

        let snapshot = form.begin_submission().unwrap();
        assert_eq!(snapshot, name_city());
        assert!(!form.can_go_back());

        assert_eq!(form.on_back(), Err(FormError::SubmissionInProgress));
        assert_eq!(form.on_next(), Err(FormError::SubmissionInProgress));
        assert_eq!(
            form.on_field_change(FieldChange::new("name", "late")),
            Err(FormError::SubmissionInProgress)
        );
        assert_eq!(
            form.begin_submission().err(),
            Some(FormError::SubmissionInProgress)
        );

        form.finish_submission::<String>(Ok(()));
        assert!(form.submission().is_succeeded());
        assert_eq!(form.on_back(), Ok(Transition::Retreated { from: 1, to: 0 }));
    }

    #[test]
    fn failed_submission_keeps_step_and_allows_retry() {
        let mut form = StepForm::new(steps(2), name_city()).unwrap();
        form.on_next().unwrap();

        form.begin_submission().unwrap();
        form.finish_submission(Err("HTTP 400: target is required"));

        assert_eq!(form.current_step_index(), 1);
        assert_eq!(
            form.submission().error(),
            Some("HTTP 400: target is required")
        );
        assert!(form.begin_submission().is_ok());
    }

    #[tokio::test]
    async fn submit_with_tracks_success() {
        let mut form = StepForm::new(steps(1), name_city()).unwrap();
        let outcome = form
            .submit_with(|draft| async move { Ok::<_, String>(draft.len()) })
            .await
            .unwrap();

        assert_eq!(outcome, Ok(2));
        assert_eq!(form.submission(), &Submission::Succeeded);
    }

    #[tokio::test]
    async fn submit_with_tracks_failure() {
        let mut form = StepForm::new(steps(1), name_city()).unwrap();
        let outcome = form
            .submit_with(|_| async { Err::<(), _>("connection refused".to_string()) })
            .await
            .unwrap();

        assert!(outcome.is_err());
        assert_eq!(
            form.submission(),
            &Submission::Failed("connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn abandoned_submission_unlocks_the_form() {
        let mut form = StepForm::new(steps(2), name_city()).unwrap();
        form.on_next().unwrap();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(10),
            form.submit_with(|_| std::future::pending::<Result<(), String>>()),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(
            form.submission(),
            &Submission::Failed("cancelled".to_string())
        );
        assert_eq!(
            form.on_back(),
            Ok(Transition::Retreated { from: 1, to: 0 })
        );
    }
}
