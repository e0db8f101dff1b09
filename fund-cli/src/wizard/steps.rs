//! The three pages of the create-project wizard.

use std::fmt;
use std::rc::Rc;

use fund_core::{Cause, ProjectDraft, ProjectField, ProjectStatus, StepDescriptor, StepProps};

use crate::utils::{or_dash, parse_count, parse_decimal};

type ParseFn = Box<dyn Fn(&str) -> Result<ProjectField, String>>;

/// An editable field on a page: typed in as `key=value`.
pub struct FieldPrompt {
    pub key: &'static str,
    pub label: &'static str,
    pub current: String,
    parse: ParseFn,
}

impl FieldPrompt {
    fn new(
        key: &'static str,
        label: &'static str,
        current: impl Into<String>,
        parse: impl Fn(&str) -> Result<ProjectField, String> + 'static,
    ) -> Self {
        Self {
            key,
            label,
            current: current.into(),
            parse: Box::new(parse),
        }
    }

    /// Turns the typed value into a field update.
    pub fn parse(
        &self,
        input: &str,
    ) -> Result<ProjectField, String> {
        (self.parse)(input)
    }
}

impl fmt::Debug for FieldPrompt {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FieldPrompt")
            .field("key", &self.key)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// What one wizard page shows.
#[derive(Debug, Default)]
pub struct StepPage {
    pub notes: Vec<String>,
    pub prompts: Vec<FieldPrompt>,
}

impl StepPage {
    pub fn prompt(
        &self,
        key: &str,
    ) -> Option<&FieldPrompt> {
        self.prompts.iter().find(|p| p.key == key)
    }
}

impl fmt::Display for StepPage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for note in &self.notes {
            writeln!(f, "  {note}")?;
        }
        for prompt in &self.prompts {
            writeln!(
                f,
                "  {:<16} {:<24} [{}]",
                prompt.label,
                or_dash(Some(prompt.current.as_str())),
                prompt.key
            )?;
        }
        Ok(())
    }
}

fn text(
    build: fn(String) -> ProjectField,
) -> impl Fn(&str) -> Result<ProjectField, String> {
    move |input: &str| Ok(build(input.trim().to_string()))
}

/// Comma-separated cause names. Names of existing causes pick those causes;
/// anything else is sent by name and created by the backend (id 0 until
/// then).
fn parse_causes(
    input: &str,
    available: &[Cause],
) -> Vec<Cause> {
    let mut picked: Vec<Cause> = Vec::new();
    for name in input.split(',').map(|n| n.trim().to_lowercase()) {
        if name.is_empty() || picked.iter().any(|c| c.name == name) {
            continue;
        }
        let cause = available
            .iter()
            .find(|c| c.name.to_lowercase() == name)
            .cloned()
            .unwrap_or(Cause {
                id: 0,
                name,
                description: None,
                icon: None,
            });
        picked.push(cause);
    }
    picked
}

fn details(
    props: &mut StepProps<'_, ProjectDraft>,
    available: &Rc<Vec<Cause>>,
) -> StepPage {
    let draft = props.data();
    let mut notes = Vec::new();
    if !available.is_empty() {
        let names: Vec<&str> = available.iter().map(|c| c.name.as_str()).collect();
        notes.push(format!("Known causes: {}", names.join(", ")));
    }

    let causes = Rc::clone(available);
    StepPage {
        notes,
        prompts: vec![
            FieldPrompt::new("name", "Name", draft.name.clone(), text(ProjectField::Name)),
            FieldPrompt::new(
                "description",
                "Description",
                draft.description.clone(),
                text(ProjectField::Description),
            ),
            FieldPrompt::new(
                "causes",
                "Causes",
                draft.cause_names().join(", "),
                move |input| Ok(ProjectField::Causes(parse_causes(input, &causes))),
            ),
            FieldPrompt::new(
                "img",
                "Image",
                draft.img.clone().unwrap_or_default(),
                |input| {
                    let img = input.trim();
                    Ok(ProjectField::Img((!img.is_empty()).then(|| img.to_string())))
                },
            ),
        ],
    }
}

fn location_and_target(props: &mut StepProps<'_, ProjectDraft>) -> StepPage {
    let draft = props.data();
    let limit = if draft.campaign_limit == 0 {
        String::new()
    } else {
        draft.campaign_limit.to_string()
    };

    StepPage {
        notes: Vec::new(),
        prompts: vec![
            FieldPrompt::new("city", "City", draft.city.clone(), text(ProjectField::City)),
            FieldPrompt::new(
                "country",
                "Country",
                draft.country.clone(),
                text(ProjectField::Country),
            ),
            FieldPrompt::new("target", "Target", draft.target.to_string(), |input| {
                parse_decimal(input)
                    .map(ProjectField::Target)
                    .map_err(|e| e.to_string())
            }),
            FieldPrompt::new("campaign_limit", "Campaign limit", limit, |input| {
                parse_count(input)
                    .map(ProjectField::CampaignLimit)
                    .map_err(|e| e.to_string())
            }),
        ],
    }
}

fn review(props: &mut StepProps<'_, ProjectDraft>) -> StepPage {
    let draft = props.data();
    // An emptied image field goes back to the placeholder before submit.
    if draft.img.is_none() {
        props.on_change(ProjectField::Img(Some("default".to_string())));
    }

    let choices: Vec<&str> = ProjectStatus::all().iter().map(|s| s.as_str()).collect();
    let mut notes: Vec<String> = draft.to_string().lines().map(str::to_string).collect();
    notes.push(String::new());
    notes.push(format!("Status choices: {}", choices.join(", ")));

    StepPage {
        notes,
        prompts: vec![FieldPrompt::new(
            "status",
            "Status",
            draft.status.as_str(),
            |input| {
                ProjectStatus::parse(input)
                    .map(ProjectField::Status)
                    .ok_or_else(|| format!("unknown status '{}'", input.trim()))
            },
        )],
    }
}

/// "Details", "Location & Target" and "Review", in that order.
pub fn project_steps(causes: Vec<Cause>) -> Vec<StepDescriptor<ProjectDraft, StepPage>> {
    let causes = Rc::new(causes);
    vec![
        StepDescriptor::new("Details", move |props: &mut StepProps<'_, ProjectDraft>| {
            details(props, &causes)
        }),
        StepDescriptor::new("Location & Target", location_and_target),
        StepDescriptor::new("Review", review),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_core::StepForm;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn water() -> Cause {
        Cause {
            id: 3,
            name: "water".to_string(),
            description: None,
            icon: None,
        }
    }

    fn form() -> StepForm<ProjectDraft, StepPage> {
        StepForm::new(project_steps(vec![water()]), ProjectDraft::default()).unwrap()
    }

    #[test]
    fn labels_in_order() {
        let form = form();
        let labels: Vec<&str> = form.labels().collect();
        assert_eq!(labels, vec!["Details", "Location & Target", "Review"]);
    }

    #[test]
    fn details_page_lists_known_causes() {
        let mut form = form();
        let page = form.render();
        assert_eq!(page.notes, vec!["Known causes: water".to_string()]);
        assert_eq!(page.prompt("img").unwrap().current, "default");
    }

    #[test]
    fn causes_prompt_reuses_known_causes() {
        let mut form = form();
        let page = form.render();
        let patch = page
            .prompt("causes")
            .unwrap()
            .parse(" Water, health ,water,")
            .unwrap();

        let causes = match patch {
            ProjectField::Causes(causes) => causes,
            other => panic!("expected a causes patch, got {other:?}"),
        };
        assert_eq!(causes[0], water());
        assert_eq!((causes[1].id, causes[1].name.as_str()), (0, "health"));
        assert_eq!(causes.len(), 2);
    }

    #[test]
    fn target_prompt_parses_amounts() {
        let mut form = form();
        form.on_next().unwrap();
        let page = form.render();
        let target = page.prompt("target").unwrap();

        assert_eq!(target.parse("1,500.50"), Ok(ProjectField::Target(dec!(1500.50))));
        assert!(target.parse("a lot").is_err());
        assert_eq!(
            page.prompt("campaign_limit").unwrap().parse(""),
            Ok(ProjectField::CampaignLimit(0))
        );
    }

    #[test]
    fn review_restores_placeholder_image() {
        let mut form = form();
        form.on_field_change(ProjectField::Img(None)).unwrap();
        form.on_next().unwrap();
        form.on_next().unwrap();

        let page = form.render();
        assert_eq!(form.draft().img.as_deref(), Some("default"));
        assert!(page.notes.iter().any(|n| n.starts_with("Status choices:")));
        assert!(page.prompt("status").unwrap().parse("archived").is_err());
    }
}
