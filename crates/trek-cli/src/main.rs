mod cmd_config;
mod cmd_context;
mod cmd_init;
mod cmd_tools;
mod workspace;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trek", version, about = "Context-aware capability filtering for coding agents")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .trek/ workspace
    Init,
    /// Infer the work context for a ticket, project, or session
    Context {
        /// Ticket ID
        #[arg(long)]
        ticket: Option<String>,
        /// Project ID
        #[arg(long)]
        project: Option<String>,
        /// Session ID (its ticket wins over --ticket)
        #[arg(long)]
        session: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the context of every active session
    Contexts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the capabilities visible in a context
    Tools {
        /// Preview a context: ticket_work, planning, review, admin
        #[arg(long)]
        context: Option<String>,
        /// Ticket ID to infer the context from
        #[arg(long)]
        ticket: Option<String>,
        /// Session ID to infer the context from
        #[arg(long)]
        session: Option<String>,
        /// Filter mode: strict, default, permissive, full
        #[arg(long)]
        mode: Option<String>,
        /// Also list hidden capabilities
        #[arg(long)]
        shadow: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-context visible/total counts
    Stats {
        /// Filter mode: strict, default, permissive, full
        #[arg(long)]
        mode: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Registry breakdown by category and mode, with consolidation hints
    Report {
        /// Filter mode: strict, default, permissive, full
        #[arg(long)]
        mode: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage workspace config (.trek/config.json)
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Run the MCP server on stdio
    Mcp,
}

fn init_tracing() {
    // stdout carries command output and MCP frames; logs go to stderr.
    let filter = EnvFilter::try_from_env("TREK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => cmd_init::execute(&repo_root),
        Command::Context {
            ticket,
            project,
            session,
            json,
        } => cmd_context::context(
            &repo_root,
            ticket.as_deref(),
            project.as_deref(),
            session.as_deref(),
            json,
        ),
        Command::Contexts { json } => cmd_context::contexts(&repo_root, json),
        Command::Tools {
            context,
            ticket,
            session,
            mode,
            shadow,
            json,
        } => cmd_tools::tools(cmd_tools::ToolsParams {
            repo_root: &repo_root,
            context: context.as_deref(),
            ticket: ticket.as_deref(),
            session: session.as_deref(),
            mode: mode.as_deref(),
            shadow,
            json,
        }),
        Command::Stats { mode, json } => cmd_tools::stats(&repo_root, mode.as_deref(), json),
        Command::Report { mode, json } => cmd_tools::report(&repo_root, mode.as_deref(), json),
        Command::Config { cmd } => cmd_config::run(cmd, &repo_root),
        Command::Mcp => {
            tokio::runtime::Runtime::new()?.block_on(trek_mcp::serve(&repo_root))?;
            Ok(())
        }
    }
}
