use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitpersona::config::ConfigLoader;
use gitpersona::server::{Pipeline, serve};

#[derive(Parser)]
#[command(name = "gitpersona")]
#[command(
    version,
    about = "GitHub developer persona analyzer: complexity, languages, and origin classification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        short,
        env = "GITPERSONA_CONFIG",
        help = "Config file (defaults to ./gitpersona.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP analysis service
    Serve {
        #[arg(long, short, help = "Override the configured bind port")]
        port: Option<u16>,
    },

    /// Analyze one repository and print its owner's persona
    Analyze {
        #[arg(help = "Repository URL, e.g. https://github.com/owner/repo")]
        repo_url: String,
    },

    /// Analyze a user's public repositories and print an aggregate persona
    Profile {
        #[arg(help = "GitHub login")]
        login: String,
        #[arg(long, help = "Override the configured repository cap")]
        max_repos: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective merged configuration
    Show,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mgitpersona encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let rt = Runtime::new()?;
            rt.block_on(serve(config))?;
        }
        Commands::Analyze { repo_url } => {
            let pipeline = Pipeline::new(config)?;
            let rt = Runtime::new()?;
            let outcome = rt.block_on(pipeline.analyze_url(&repo_url))?;
            println!("{}", outcome.report);
        }
        Commands::Profile { login, max_repos } => {
            if let Some(max_repos) = max_repos {
                config.analysis.max_repos = max_repos;
            }
            let pipeline = Pipeline::new(config)?;
            let rt = Runtime::new()?;
            let report = rt.block_on(pipeline.profile_user(&login))?;
            println!("{}", report);
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                ConfigLoader::show_config()?;
            }
        },
    }

    Ok(())
}
