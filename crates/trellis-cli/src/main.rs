//! `project`: manage shared project directories
//!
//! Creates projects, changes who holds which role and reapplies the matching
//! ownership and POSIX ACLs, or checks existing projects for drift.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trellis_cli::commands::check::CheckOutcome;
use trellis_cli::{CliError, ProjectContext, RecordStore};
use trellis_core::config::DEFAULT_CONFIG_PATH;
use trellis_core::{
    IdentityEffects, Principal, ProjectId, Role, SyncError, SyncSummary, TrellisConfig,
};
use trellis_effects::SystemEffects;

#[derive(Parser)]
#[command(name = "project", version)]
#[command(about = "Manage projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory
    #[arg(short = 'P', long, global = true, value_name = "ROOT")]
    project_root: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all projects found in the project root
    List,

    /// Create a new project (private unless --public)
    Create {
        /// Name of project
        project: ProjectId,

        /// Make project publicly readable
        #[arg(long)]
        public: bool,
    },

    /// Delete an existing project. This permanently removes the project directory!
    Delete {
        /// Name of project
        project: ProjectId,
    },

    /// Print information about a project
    Info {
        /// Name of project
        project: ProjectId,
    },

    /// Update the permissions on everything in the project directory
    Update {
        /// Name of project
        project: ProjectId,
    },

    /// Add a user to a project
    Adduser {
        /// Name of project
        project: ProjectId,
        /// User's UNIX username
        username: Principal,
        /// New user role (owner, member or collaborator)
        role: Role,
    },

    /// Modify a user's role
    Moduser {
        /// Name of project
        project: ProjectId,
        /// User's UNIX username
        username: Principal,
        /// New user role (owner, member or collaborator)
        role: Role,
    },

    /// Remove a user from a project
    Deluser {
        /// Name of project
        project: ProjectId,
        /// User's UNIX username
        username: Principal,
    },

    /// Check one project, or all of them, for permission drift
    Check {
        /// Name of project; every project when omitted
        project: Option<ProjectId>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report_failures(&err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = TrellisConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(root) = cli.project_root {
        config.project_root = root;
        config.validate().context("Invalid --project-root")?;
    }
    if !config.project_root.is_dir() {
        bail!(
            "Project root {} is not a directory",
            config.project_root.display()
        );
    }

    let effects = SystemEffects::from_config(&config).context("Cannot use the ACL tools")?;
    let caller = effects
        .current_principal()
        .context("Cannot determine the calling user")?;
    let ctx = ProjectContext::new(
        &effects,
        RecordStore::new(config.layout()),
        config.exec_policy(),
        caller,
    );

    match cli.command {
        Commands::List => {
            for project in ctx.list()? {
                println!("    {project}");
            }
        }
        Commands::Create { project, public } => {
            let summary = ctx
                .create(&project, public)
                .with_context(|| format!("Failed to create project {project}"))?;
            report_skipped(&summary);
        }
        Commands::Delete { project } => {
            ctx.delete(&project)
                .with_context(|| format!("Failed to delete project {project}"))?;
        }
        Commands::Info { project } => {
            println!("{}", ctx.info(&project)?);
        }
        Commands::Update { project } => {
            let summary = ctx
                .update(&project)
                .with_context(|| format!("Failed to update project {project}"))?;
            report_skipped(&summary);
        }
        Commands::Adduser {
            project,
            username,
            role,
        }
        | Commands::Moduser {
            project,
            username,
            role,
        } => {
            let summary = ctx
                .set_role(&project, &username, role)
                .with_context(|| format!("Failed to set {username} as {role} of {project}"))?;
            report_skipped(&summary);
        }
        Commands::Deluser { project, username } => {
            let summary = ctx
                .remove_user(&project, &username)
                .with_context(|| format!("Failed to remove {username} from {project}"))?;
            report_skipped(&summary);
        }
        Commands::Check { project } => {
            let outcomes = ctx.check(project.as_ref())?;
            return Ok(print_check(&outcomes));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_check(outcomes: &[CheckOutcome]) -> ExitCode {
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => println!("Project {} {report}", outcome.project),
            Err(err) => println!("Project {} could not be checked: {err}", outcome.project),
        }
    }
    if outcomes.iter().all(CheckOutcome::is_clean) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Escaping links are left alone; say which
fn report_skipped(summary: &SyncSummary) {
    for skipped in &summary.skipped {
        eprintln!("skipped: {skipped}");
    }
}

/// List every entry an incomplete run could not update
fn report_failures(err: &anyhow::Error) {
    if let Some(CliError::Sync(SyncError::Incomplete { summary })) = err.downcast_ref::<CliError>()
    {
        report_skipped(summary);
        for failure in &summary.failures {
            eprintln!("failed: {failure}");
        }
    }
}
