//! Interactive create-project wizard on top of [`fund_core::StepForm`].

mod runner;
mod steps;

pub use runner::{WizardOutcome, run_project_wizard};
pub use steps::{FieldPrompt, StepPage, project_steps};
