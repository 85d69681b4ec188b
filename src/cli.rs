//! CLI interface for guidepost.
//!
//! Each subcommand is non-interactive: arguments in, JSON out on stdout,
//! a human-readable summary on stderr.
//!
//! - `guidepost select` runs guide selection against a catalog file.
//! - `guidepost health` fetches and shapes a health time series.
//!
//! Both read backend responses from a fixtures directory (see
//! [`FixtureClient`]) rather than a live server.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use guidepost::health::{self, HealthQuery, HealthResult};
use guidepost::model::{Catalog, GuideDefinition, Organization, Project};
use guidepost::{Config, FixtureClient, GuideStore, Session, TracingAnalytics};

use format::{format_request, format_selection};

/// guidepost: pick the onboarding guide to show.
#[derive(Debug, Parser)]
#[command(name = "guidepost", after_long_help = EXAMPLES_HELP)]
pub struct Cli {
    /// Config file to use instead of `~/.guidepost/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const EXAMPLES_HELP: &str = r#"Examples:
  guidepost select --catalog guides.json --anchor issue_title --anchor tags
  guidepost select --catalog guides.json --org acme --project 42:web --fixtures ./api
  guidepost select --catalog guides.json --fragment '#assistant' --advance 1
  guidepost health --fixtures ./api --org acme --tag release --period 30d"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select the guide that should be on deck.
    ///
    /// Loads the catalog, mounts the given anchors, applies context and the
    /// URL fragment, answers gating fetches from `--fixtures`, then prints
    /// the selected guide and step.
    Select {
        /// JSON file mapping guide keys to guide definitions.
        #[arg(long)]
        catalog: PathBuf,

        /// Mounted anchor target. Can be specified multiple times.
        #[arg(long)]
        anchor: Vec<String>,

        /// Active organization slug.
        #[arg(long)]
        org: Option<String>,

        /// Active project as `<id>:<slug>` (e.g. `42:web`).
        #[arg(long, value_parser = parse_project)]
        project: Option<Project>,

        /// Current URL fragment (e.g. `#assistant`).
        #[arg(long, default_value = "")]
        fragment: String,

        /// Directory of API fixtures used to answer gating fetches.
        /// Without it, gating fetches stay pending and are listed.
        #[arg(long)]
        fixtures: Option<PathBuf>,

        /// Advance the selected guide this many steps.
        #[arg(long, default_value_t = 0)]
        advance: u32,

        /// Close the selected guide and select again.
        #[arg(long)]
        close: bool,
    },

    /// Fetch a health time series and shape it for charting.
    Health {
        /// Directory of API fixtures.
        #[arg(long)]
        fixtures: PathBuf,

        /// Organization slug.
        #[arg(long)]
        org: String,

        /// Tag to group by (e.g. `release`, `user`).
        #[arg(long)]
        tag: String,

        /// Relative period (e.g. `24h`, `7d`, `30d`).
        #[arg(long, default_value = "7d")]
        period: String,

        /// Bucket size (e.g. `1d`, `1h`).
        #[arg(long, default_value = "1d")]
        interval: String,

        /// Project id to include. Can be specified multiple times.
        #[arg(long)]
        project: Vec<String>,

        /// Environment to include. Can be specified multiple times.
        #[arg(long)]
        environment: Vec<String>,

        /// Only return the top K categories.
        #[arg(long)]
        topk: Option<u32>,

        /// Ask for per-category totals instead of a time series.
        #[arg(long)]
        totals: bool,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Select {
            catalog,
            anchor,
            org,
            project,
            fragment,
            fixtures,
            advance,
            close,
        } => cmd_select(
            config,
            &SelectArgs {
                catalog,
                anchors: anchor,
                org: org.map(Organization::new),
                project,
                fragment,
                fixtures,
                advance,
                close,
            },
        ),
        Command::Health {
            fixtures,
            org,
            tag,
            period,
            interval,
            project,
            environment,
            topk,
            totals,
        } => {
            let query = HealthQuery {
                tag,
                projects: project,
                environments: environment,
                period,
                interval,
                include_previous: true,
                timeseries: !totals,
                topk,
            };
            cmd_health(&fixtures, &Organization::new(org), &query)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    config.map_err(|e| e.to_string())
}

/// Parse `<id>:<slug>` into a project.
fn parse_project(s: &str) -> Result<Project, String> {
    let (id, slug) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <id>:<slug>, got '{s}'"))?;
    if id.is_empty() || slug.is_empty() {
        return Err(format!("expected <id>:<slug>, got '{s}'"));
    }
    Ok(Project::new(id, slug))
}

struct SelectArgs {
    catalog: PathBuf,
    anchors: Vec<String>,
    org: Option<Organization>,
    project: Option<Project>,
    fragment: String,
    fixtures: Option<PathBuf>,
    advance: u32,
    close: bool,
}

#[derive(Serialize)]
struct SelectOutput<'a> {
    guide: Option<&'a GuideDefinition>,
    step: u32,
    force_show: bool,
    pending: Vec<String>,
}

fn cmd_select(config: Config, args: &SelectArgs) -> Result<(), String> {
    let json = fs::read_to_string(&args.catalog)
        .map_err(|e| format!("failed to read {}: {e}", args.catalog.display()))?;
    let catalog: Catalog = serde_json::from_str(&json)
        .map_err(|e| format!("invalid catalog at {}: {e}", args.catalog.display()))?;

    let mut store = GuideStore::new(config, TracingAnalytics);
    store.on_url_fragment_change(&args.fragment);
    store.fetch_succeeded(catalog);
    store.set_active_organization(args.org.clone());
    store.set_active_project(args.project.clone());
    for target in &args.anchors {
        store.register_anchor(target.as_str());
    }

    let (mut store, pending) = match &args.fixtures {
        Some(dir) => {
            let mut session = Session::new(store, FixtureClient::new(dir));
            let performed = session.pump();
            tracing::debug!(performed, "answered gating fetches from fixtures");
            (session.into_store(), Vec::new())
        }
        None => {
            let pending = store.take_requests();
            (store, pending)
        }
    };

    if args.close {
        store.close_guide();
    }
    for _ in 0..args.advance {
        store.advance_step();
    }

    let state = store.state();
    let output = SelectOutput {
        guide: state.current_guide.as_ref(),
        step: state.current_step,
        force_show: state.force_show,
        pending: pending.iter().map(|r| r.path.clone()).collect(),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("failed to serialize selection: {e}"))?;
    println!("{json}");

    eprintln!("{}", format_selection(state));
    for request in &pending {
        eprintln!("Pending: {}", format_request(request));
    }

    Ok(())
}

fn cmd_health(fixtures: &Path, org: &Organization, query: &HealthQuery) -> Result<(), String> {
    let client = FixtureClient::new(fixtures);
    let result: HealthResult = health::fetch_health(&client, org, query)
        .map_err(|e| format!("health request failed: {e}"))?;

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| format!("failed to serialize health data: {e}"))?;
    println!("{json}");
    Ok(())
}
