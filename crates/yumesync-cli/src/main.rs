use clap::{ArgAction, Parser, Subcommand};
use commands::{cache, config};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "yumesync")]
#[command(about = "YumeSync - Keep your local watchlist in step with your remote lists")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or clear the local identifier cache
    #[command(long_about = "Work with the local identifier cache that maps catalog ids between services. Use subcommands to show statistics or delete the cache file.")]
    Cache {
        #[command(subcommand)]
        cmd: CacheCommands,
    },
    /// Show or initialize configuration
    #[command(long_about = "Manage the configuration file. Use subcommands to print the active configuration or write a default configuration file.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show identifier cache statistics
    Stats,
    /// Delete the local identifier cache file
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the active configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Cache { cmd } => match cmd {
            CacheCommands::Stats => cache::run_stats(&output),
            CacheCommands::Clear => cache::run_clear(&output),
        },
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config::run_show(&output),
            ConfigCommands::Init { force } => config::run_init(force, &output),
        },
    };

    if let Err(e) = result {
        output.error(format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
