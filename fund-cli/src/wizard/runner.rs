use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use fund_core::{ApiError, FundraisingApi, Project, ProjectDraft, StepForm, Transition};

use super::steps::{StepPage, project_steps};

/// How a wizard session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    Created(Project),
    /// Quit, or input ran out before a successful submit.
    Cancelled,
}

enum Command<'a> {
    Next,
    Back,
    Quit,
    Set { key: &'a str, value: &'a str },
    Unknown,
}

fn parse_command(line: &str) -> Command<'_> {
    match line {
        "n" | "next" => Command::Next,
        "b" | "back" => Command::Back,
        "q" | "quit" => Command::Quit,
        _ => match line.split_once('=') {
            Some((key, value)) => Command::Set {
                key: key.trim(),
                value,
            },
            None => Command::Unknown,
        },
    }
}

fn write_page<W: Write>(
    out: &mut W,
    form: &StepForm<ProjectDraft, StepPage>,
    page: &StepPage,
) -> Result<()> {
    writeln!(
        out,
        "== Step {} of {}: {} ==",
        form.current_step_index() + 1,
        form.step_count(),
        form.active_label()
    )?;
    write!(out, "{page}")?;
    let back = if form.can_go_back() { ", b = Back" } else { "" };
    writeln!(
        out,
        "  (field=value to edit, n = {}{back}, q = quit)",
        form.next_action_label()
    )?;
    Ok(())
}

fn write_submit_error<W: Write>(
    out: &mut W,
    error: &ApiError,
) -> Result<()> {
    match error.backend_errors() {
        Some(errors) => {
            for (field, message) in &errors.field_errors {
                writeln!(out, "  ! {field}: {message}")?;
            }
            if let Some(message) = &errors.non_field_error {
                writeln!(out, "  ! {message}")?;
            }
        }
        None => writeln!(out, "  ! {error}")?,
    }
    writeln!(out, "Submission failed. Fix the fields above and submit again.")?;
    Ok(())
}

/// Drives the create-project wizard from line input until the project is
/// created, the user quits, or input ends.
///
/// Each line is one of `field=value`, `n`/`next`, `b`/`back` or `q`/`quit`.
/// Submitting from the last page validates the draft locally and then
/// calls [`FundraisingApi::create_project`]; a rejected submit keeps the
/// wizard on the last page so the user can fix fields and try again.
pub async fn run_project_wizard<R, W>(
    api: &dyn FundraisingApi,
    input: R,
    mut out: W,
) -> Result<WizardOutcome>
where
    R: BufRead,
    W: Write,
{
    let causes = api
        .list_causes()
        .await
        .context("Failed to load causes")?;
    let mut form = StepForm::new(project_steps(causes), ProjectDraft::default())?
        .with_on_complete(|draft: &ProjectDraft| {
            info!(name = %draft.name.trim(), "create-project wizard confirmed");
        });

    let mut page = form.render();
    write_page(&mut out, &form, &page)?;

    for line in input.lines() {
        let line = line.context("Failed to read wizard input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Command::Quit => {
                writeln!(out, "Cancelled.")?;
                return Ok(WizardOutcome::Cancelled);
            }
            Command::Back => {
                if form.on_back()? == Transition::Unchanged {
                    writeln!(out, "Already at the first step.")?;
                }
            }
            Command::Next => {
                if form.is_last_step() {
                    if let Err(errors) = form.draft().validate_for_submit() {
                        for error in errors {
                            writeln!(out, "  ! {error}")?;
                        }
                        continue;
                    }
                }
                if form.on_next()? == Transition::Completed {
                    let outcome = form
                        .submit_with(|draft| async move {
                            api.create_project(&draft.to_new_project()).await
                        })
                        .await?;
                    match outcome {
                        Ok(project) => {
                            writeln!(out, "Created project #{}: {}", project.id, project.name)?;
                            return Ok(WizardOutcome::Created(project));
                        }
                        Err(error) => write_submit_error(&mut out, &error)?,
                    }
                }
            }
            Command::Set { key, value } => match page.prompt(key) {
                Some(prompt) => match prompt.parse(value) {
                    Ok(patch) => form.on_field_change(patch)?,
                    Err(message) => {
                        writeln!(out, "  ! {message}")?;
                        continue;
                    }
                },
                None => {
                    writeln!(out, "  ! '{key}' is not a field on this step")?;
                    continue;
                }
            },
            Command::Unknown => {
                writeln!(out, "  ! expected field=value, n, b or q")?;
                continue;
            }
        }

        page = form.render();
        write_page(&mut out, &form, &page)?;
    }

    debug!("wizard input ended");
    Ok(WizardOutcome::Cancelled)
}
