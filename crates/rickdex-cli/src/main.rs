#![forbid(unsafe_code)]

mod cmd;
mod context;
mod http;
mod output;
mod rows;
mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use context::Context;
use output::{CliError, OutputMode};
use rickdex_core::error::{ErrorCode, LoadError};
use rickdex_core::favorites::FavoritesError;
use rickdex_core::kv::StoreError;
use rickdex_core::source::FetchError;
use std::env;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use validate::ValidationError;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rdx: browse Rick and Morty characters and keep favorites",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Browse",
        about = "List characters",
        long_about = "List characters with optional search, filters and sort order.\n\nWithout filters only the first window of characters is shown; any filter or --all loads the whole catalog.",
        after_help = "EXAMPLES:\n    # First 100 characters\n    rdx list\n\n    # Living humans named Smith, sorted by name descending\n    rdx list --search smith --status alive --species Human --sort name --desc\n\n    # Everything, as JSON\n    rdx list --all --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Browse",
        about = "Show values available for filters",
        after_help = "EXAMPLES:\n    rdx options"
    )]
    Options,

    #[command(
        next_help_heading = "Browse",
        about = "Show one character",
        after_help = "EXAMPLES:\n    rdx show 1"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Favorites",
        about = "Manage favorites of the logged-in user",
        after_help = "EXAMPLES:\n    rdx fav add 1 --notes \"wubba lubba\"\n    rdx fav notes 1 \"genius\"\n    rdx fav list\n    rdx fav rm 1"
    )]
    Fav {
        #[command(subcommand)]
        command: cmd::fav::FavCommand,
    },

    #[command(
        next_help_heading = "Identity",
        about = "Log in as a local user",
        after_help = "EXAMPLES:\n    rdx login rick-c137 --email rick@citadel.test"
    )]
    Login(cmd::auth::LoginArgs),

    #[command(next_help_heading = "Identity", about = "Log out")]
    Logout,

    #[command(next_help_heading = "Identity", about = "Show the logged-in user")]
    Whoami,

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    rdx completions bash\n\n    # Generate zsh completions\n    rdx completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RICKDEX_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "rickdex=debug,rdx=debug,info"
        } else {
            "rickdex=info,warn"
        })
    });

    let format = env::var("RICKDEX_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Map a command failure onto the user-facing error shape.
fn to_cli_error(err: &anyhow::Error) -> CliError {
    if let Some(err) = err.downcast_ref::<ValidationError>() {
        return err.to_cli_error();
    }
    if let Some(err) = err.downcast_ref::<LoadError>() {
        return CliError::from(err);
    }
    if let Some(code) = err.downcast_ref::<ErrorCode>() {
        return CliError::from(*code);
    }

    let code = if let Some(fetch) = err.downcast_ref::<FetchError>() {
        Some(fetch.code())
    } else if let Some(fav) = err.downcast_ref::<FavoritesError>() {
        Some(fav.code())
    } else {
        err.downcast_ref::<StoreError>().map(StoreError::code)
    };

    match code {
        Some(code) => {
            let mut cli = CliError::from(code);
            cli.message = format!("{}: {err:#}", code.message());
            cli
        }
        None => CliError::new(format!("{err:#}")),
    }
}

fn run(cli: &Cli, ctx: &Context) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List(args) => cmd::list::run_list(args, ctx),
        Commands::Options => cmd::options::run_options(ctx),
        Commands::Show(args) => cmd::show::run_show(args, ctx),
        Commands::Fav { command } => cmd::fav::run_fav(command, ctx),
        Commands::Login(args) => cmd::auth::run_login(args, ctx),
        Commands::Logout => cmd::auth::run_logout(ctx),
        Commands::Whoami => cmd::auth::run_whoami(ctx),
        Commands::Completions(args) => completions(args),
    }
}

fn completions(args: &cmd::completions::CompletionsArgs) -> anyhow::Result<()> {
    let mut command = Cli::command();
    cmd::completions::run_completions(args.shell, &mut command)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    // Completions never touch config or storage.
    if let Commands::Completions(args) = &cli.command {
        return match completions(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                let _ = output::render_error(OutputMode::Text, &to_cli_error(&err));
                ExitCode::FAILURE
            }
        };
    }

    let ctx = match Context::new(cli.json) {
        Ok(ctx) => ctx,
        Err(err) => {
            let mode = if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            };
            let mut error = CliError::from(ErrorCode::ConfigParseError);
            error.message = format!("{err:#}");
            let _ = output::render_error(mode, &error);
            return ExitCode::FAILURE;
        }
    };
    debug!(store = %ctx.config.store_path.display(), output = ?ctx.output, "resolved config");

    match run(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            let _ = output::render_error(ctx.output, &to_cli_error(&err));
            ExitCode::FAILURE
        }
    }
}
