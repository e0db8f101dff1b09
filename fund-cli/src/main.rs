use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, info};

use fund_cli::app::{self, PageRequest};
use fund_cli::logging;
use fund_cli::settings::{Overrides, Settings};
use fund_cli::utils::{ParseCountError, ParseDecimalError, parse_count, parse_decimal};
use fund_core::{NewCause, ProjectFilter, ProjectStatus, ProjectUpdate};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Manage fundraising projects and causes.
///
/// Talks to the REST API (or the in-process `memory` backend) and walks
/// through a step-by-step wizard to create projects.
#[derive(Debug, Parser)]
#[command(name = "fundraise", version, about)]
struct Cli {
    /// Settings file. Defaults to `fundraise.toml` if it exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API backend: `http` or `memory`.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Base URL of the REST API.
    #[arg(long, global = true, env = "FUNDRAISE_BASE_URL")]
    base_url: Option<String>,

    /// API token, sent as `Authorization: Token <token>`.
    #[arg(long, global = true, env = "FUNDRAISE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log filter, e.g. `debug` or `fund_client=trace,info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List, show, create, update or delete projects.
    #[command(subcommand)]
    Projects(ProjectsCommand),

    /// List, show, create, update or delete causes.
    #[command(subcommand)]
    Causes(CausesCommand),

    /// Show the signed-in user.
    Whoami,
}

#[derive(Debug, Subcommand)]
enum ProjectsCommand {
    /// One page of projects.
    List(ListArgs),
    /// A project with its campaigns and beneficiaries.
    Show { id: i64 },
    /// Create a project with the interactive wizard.
    Create,
    /// Change only the given fields of a project.
    Update(UpdateArgs),
    Delete { id: i64 },
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Page size (1-50).
    #[arg(long)]
    limit: Option<u32>,

    #[arg(long, conflicts_with = "page")]
    offset: Option<u32>,

    /// 1-based page number.
    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    name: Option<String>,

    /// draft, active or completed.
    #[arg(long, value_parser = parse_status)]
    status: Option<ProjectStatus>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    country: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: i64,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Comma-separated cause names; replaces the current causes.
    #[arg(long, value_delimiter = ',')]
    causes: Option<Vec<String>>,

    #[arg(long, value_parser = parse_status)]
    status: Option<ProjectStatus>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    country: Option<String>,

    #[arg(long, value_parser = parse_target)]
    target: Option<Decimal>,

    #[arg(long, value_parser = parse_limit)]
    campaign_limit: Option<u32>,

    #[arg(long)]
    img: Option<String>,
}

impl From<UpdateArgs> for ProjectUpdate {
    fn from(args: UpdateArgs) -> Self {
        let causes_names = args.causes.map(|names| {
            names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        });
        Self {
            name: args.name,
            img: args.img,
            causes_names,
            target: args.target,
            campaign_limit: args.campaign_limit,
            city: args.city,
            country: args.country,
            description: args.description,
            status: args.status,
        }
    }
}

#[derive(Debug, Subcommand)]
enum CausesCommand {
    List,
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Rename a cause or change its description or icon.
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    Delete {
        id: i64,
    },
}

fn parse_target(s: &str) -> Result<Decimal, ParseDecimalError> {
    parse_decimal(s)
}

fn parse_limit(s: &str) -> Result<u32, ParseCountError> {
    parse_count(s)
}

fn parse_status(s: &str) -> Result<ProjectStatus, String> {
    ProjectStatus::parse(s).ok_or_else(|| {
        let choices: Vec<&str> = ProjectStatus::all().iter().map(|s| s.as_str()).collect();
        format!("expected one of: {}", choices.join(", "))
    })
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?.merge(Overrides {
        backend: cli.backend,
        base_url: cli.base_url,
        token: cli.token,
        log_level: cli.log_level,
        log_file: cli.log_file,
        env_log_filter: std::env::var_os("RUST_LOG").is_some(),
    });

    if let Some(level) = &settings.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &settings.log_file {
        logging::enable_file_logging(path)?;
    }

    let config = settings.api_config();
    debug!(backend = %config.backend, base_url = %config.base_url, "resolved API config");
    let api = app::connect(&config).await?;
    let api = api.as_ref();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Projects(ProjectsCommand::List(args)) => {
            let request = PageRequest {
                limit: args.limit,
                offset: args.offset,
                page: args.page,
            };
            let filter = ProjectFilter {
                name: args.name,
                status: args.status,
                city: args.city,
                country: args.country,
            };
            app::list_projects(api, request, &filter, &mut out).await?;
        }
        Command::Projects(ProjectsCommand::Show { id }) => {
            app::show_project(api, id, &mut out).await?;
        }
        Command::Projects(ProjectsCommand::Create) => {
            let stdin = io::stdin();
            if !app::create_project(api, stdin.lock(), &mut out).await? {
                info!("no project created");
            }
        }
        Command::Projects(ProjectsCommand::Update(args)) => {
            let id = args.id;
            app::update_project(api, id, &ProjectUpdate::from(args), &mut out).await?;
        }
        Command::Projects(ProjectsCommand::Delete { id }) => {
            app::delete_project(api, id, &mut out).await?;
        }
        Command::Causes(CausesCommand::List) => app::list_causes(api, &mut out).await?,
        Command::Causes(CausesCommand::Show { id }) => app::show_cause(api, id, &mut out).await?,
        Command::Causes(CausesCommand::Create {
            name,
            description,
            icon,
        }) => {
            let cause = NewCause {
                name,
                description: Some(description),
                icon,
            };
            app::create_cause(api, &cause, &mut out).await?;
        }
        Command::Causes(CausesCommand::Update {
            id,
            name,
            description,
            icon,
        }) => {
            let changes = NewCause {
                name,
                description,
                icon,
            };
            app::update_cause(api, id, changes, &mut out).await?;
        }
        Command::Causes(CausesCommand::Delete { id }) => {
            app::delete_cause(api, id, &mut out).await?;
        }
        Command::Whoami => app::whoami(api, &mut out).await?,
    }

    out.flush().context("Failed to write output")?;
    Ok(())
}
