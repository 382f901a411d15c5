use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zbmath_search::config::{
    default_config_path, find_config_file, get_config, load_config, Config, LogFormat,
};
use zbmath_search::models::Refinements;
use zbmath_search::search::{StopSignal, ZentralSearch};
use zbmath_search::ui::{self, TerminalHost};

/// zbMATH Search - Search Zentralblatt MATH and fetch results as BibTeX
#[derive(Parser, Debug)]
#[command(name = "zbmath-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search Zentralblatt MATH and fetch results as BibTeX", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the search endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// BibTeX, ready to append to a .bib file
    Bibtex,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search zbMATH by keyword
    #[command(alias = "s")]
    Search {
        /// Keyword searched in any field
        keyword: String,

        /// Author filter
        #[arg(long, short)]
        author: Option<String>,

        /// Title filter
        #[arg(long, short)]
        title: Option<String>,

        /// Search within abstracts
        #[arg(long = "abstract", short = 'b')]
        abstract_text: Option<String>,

        /// Record requests in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Show endpoint, help page and icon URLs
    Info,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Destination (default: user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn resolve_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let path = cli.config.clone().or_else(find_config_file);
    let mut config = match &path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => get_config().context("Failed to read configuration from environment")?,
    };

    if let Some(base_url) = &cli.base_url {
        config.endpoint.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if let Commands::Search {
        concurrency: Some(n),
        ..
    } = &cli.command
    {
        config.fetch.max_concurrent_requests = *n;
    }
    config.validate()?;

    Ok((config, path))
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("zbmath_search={}", level)),
    );

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn output_entries(entries: &[zbmath_search::Entry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Auto if ui::is_terminal() => println!("{}", ui::render_table(entries)),
        OutputFormat::Table => println!("{}", ui::render_table(entries)),
        OutputFormat::Auto | OutputFormat::Json => println!("{}", ui::render_json(entries)?),
        OutputFormat::Bibtex => println!("{}", ui::render_bibtex(entries)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = resolve_config(&cli)?;
    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match &cli.command {
        Commands::Search {
            keyword,
            author,
            title,
            abstract_text,
            ..
        } => {
            let search = ZentralSearch::from_config(&config)?;

            // first Ctrl-C cancels the search, a second one exits
            let stop = StopSignal::new();
            let on_interrupt = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.stop();
                    if tokio::signal::ctrl_c().await.is_ok() {
                        std::process::exit(130);
                    }
                }
            });

            let refinements = Refinements {
                author: author.clone(),
                title: title.clone(),
                abstract_text: abstract_text.clone(),
            };
            let host = TerminalHost::new(cli.quiet);

            if !search
                .search_until(keyword, &refinements, &host, &host, &stop)
                .await
            {
                std::process::exit(1);
            }
            output_entries(&host.entries(), cli.output)?;
        }

        Commands::Info => {
            let search = ZentralSearch::from_config(&config)?;
            println!("{}", search.key_name());
            println!("  Endpoint:  {}", search.base_url());
            println!("  Help page: {}", search.help_page());
            println!("  Icon:      {}", search.icon_url());
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init { path, force } => {
                let path = match path.clone().or_else(default_config_path) {
                    Some(path) => path,
                    None => PathBuf::from("zbmath-search.toml"),
                };
                if path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                println!("Wrote {}", path.display());
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },

        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "zbmath-search",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
