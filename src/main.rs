// Entrypoint for the CLI application.
// - Parses arguments, sets up logging and loads configuration.
// - With no subcommand, or `app -i`, runs the interactive menu.

use clap::{ArgAction, Parser, Subcommand};
use lugach::{apps, config::Config, ui};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lugach", version, about = "Utilities for Canvas, Top Hat and Lighthouse course staff")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one app by name.
    App {
        app_name: Option<String>,

        /// List the available apps.
        #[arg(long)]
        list: bool,

        /// Run the interactive menu instead.
        #[arg(short)]
        interactive: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        None => ui::main_menu(&config),
        Some(Command::App { interactive: true, .. }) => ui::main_menu(&config),
        Some(Command::App { list: true, .. }) => {
            for (name, description) in apps::APPS {
                println!("{name:25} {description}");
            }
            Ok(())
        }
        Some(Command::App { app_name: Some(name), .. }) => {
            if apps::lint_app_name(&name).is_err() {
                println!("Invalid app name supplied. See --list for a list of apps.");
                return Ok(());
            }
            ui::run_app(&name, &config);
            Ok(())
        }
        Some(Command::App { app_name: None, .. }) => {
            println!("No APP_NAME supplied. Use --list for a list of apps.");
            Ok(())
        }
    }
}
