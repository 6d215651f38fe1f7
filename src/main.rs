use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use docpilot::cli::{CommandOutcome, SessionArgs};
use docpilot::{Result, Workspace, WorkflowError};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docpilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Analyze, audit, plan and improve code documentation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .docpilot/ with a default configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Analyze source files and record documentation coverage
    Analyze {
        /// Only re-analyze files changed since the last run
        #[arg(short, long)]
        incremental: bool,
    },

    /// Rate existing documentation item by item (resumable)
    Audit(SessionArgs),

    /// Build a prioritized improvement plan
    Plan {
        /// Run even if analyze has not been run
        #[arg(long)]
        skip_validation: bool,
    },

    /// Draft, review and write documentation for planned items (resumable)
    Improve(SessionArgs),

    /// Show which stages have run and whether they are stale
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved audit and improve sessions
    Sessions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revert a documentation write made by improve
    Rollback {
        /// "last" or a write entry id
        #[arg(default_value = "last")]
        target: String,

        /// List transactions instead of rolling back
        #[arg(long)]
        list: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    docpilot::logging::init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    match runtime.block_on(run_async(cli)) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            if let Some(suggestion) = e
                .downcast_ref::<WorkflowError>()
                .and_then(WorkflowError::suggestion)
            {
                eprintln!("{} {}", "Suggestion:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

async fn run_async(cli: Cli) -> Result<CommandOutcome> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let workspace = Workspace::new(root.canonicalize().unwrap_or(root));

    match cli.command {
        Commands::Init { force } => docpilot::cli::init::run(&workspace, force),

        Commands::Analyze { incremental } => {
            println!("{}", "🔬 Analyzing source files...".cyan());
            docpilot::cli::analyze::run(&workspace, incremental).await
        }

        Commands::Audit(args) => docpilot::cli::audit::run(&workspace, &args).await,

        Commands::Plan { skip_validation } => docpilot::cli::plan::run(&workspace, skip_validation),

        Commands::Improve(args) => docpilot::cli::improve::run(&workspace, &args).await,

        Commands::Status { json } => docpilot::cli::status::run(&workspace, json).await,

        Commands::Sessions { json } => docpilot::cli::sessions::run(&workspace, json),

        Commands::Rollback { target, list } => {
            docpilot::cli::rollback::run(&workspace, &target, list)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "docpilot", &mut io::stdout());
            Ok(CommandOutcome::Success)
        }
    }
}
