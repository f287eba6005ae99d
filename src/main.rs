use std::path::PathBuf;
use std::{env, fs};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mdsite::config::DEFAULT_CONFIG_FILE;
use mdsite::{Site, SiteConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More output per occurrence (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a markdown file to an html page.
    Render {
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the page here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Resolve the configuration and print the result as JSON.
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter =
        EnvFilter::try_from_env("MDSITE_LOG").unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SiteConfig> {
    let config = match path {
        Some(path) => SiteConfig::load(&path),
        None => SiteConfig::load_or_default(&env::current_dir()?.join(DEFAULT_CONFIG_FILE)),
    };
    config.context("Error loading site configuration:")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            input,
            config,
            output,
            title,
        } => {
            let site = Site::new(load_config(config)?).context("Configuration error:")?;

            let markdown = fs::read_to_string(&input)
                .with_context(|| format!("Could not read {}", input.display()))?;
            let page = site
                .render_page(&markdown, title.as_deref())
                .context("Render error:")?;

            match output {
                Some(path) => {
                    fs::write(&path, page)
                        .with_context(|| format!("Could not write {}", path.display()))?;
                    println!("🌟 Done.");
                }
                None => print!("{}", page),
            }
            Ok(())
        }
        Commands::Check { config } => {
            let site = Site::new(load_config(config)?).context("Configuration error:")?;

            let summary = serde_json::json!({
                "renderer": site.renderer().id().to_string(),
                "plugins": site.renderer().plugins(),
                "assets": site.assets(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
