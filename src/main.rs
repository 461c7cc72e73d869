use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use ts::config::{self, TsConfig};
use ts::provider::StanzaProvider;
use ts::serve::{self, ServeOptions, ServerState};
use ts::{output, resources, scaffold};

/// Name of the collection directory under the output root, and the URL prefix
/// the dev server serves it at.
const COLLECTION_DIR: &str = "stanza";

#[derive(Parser)]
#[command(name = "ts")]
#[command(about = "Build and serve a collection of TogoStanza web components")]
#[command(long_about = "\
Build and serve a collection of TogoStanza web components

Every directory under the stanza base directory that holds a metadata.json is
a stanza. Each one is built into a bundle registering a togostanza-<name>
custom element.

Source structure:

  stanzas/
  ├── ts.toml                      # Optional config
  ├── gene-attributes/
  │   ├── metadata.json            # Descriptor (required)
  │   ├── index.js                 # Stanza script (required)
  │   ├── _header.html             # Extra <head> markup (optional)
  │   ├── templates/               # Fragment templates (optional)
  │   │   └── stanza.html
  │   └── assets/                  # Copied into the bundle (optional)
  └── widget-a/

The collection is written to <output>/stanza. Run 'ts gen-config' to print a
documented ts.toml.")]
#[command(version)]
struct Cli {
    /// Stanza base directory
    #[arg(long, default_value = ".", global = true)]
    stanza_base_dir: PathBuf,

    /// Output root [default: <stanza-base-dir>/<output_dir from ts.toml>]
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the stanza collection once
    Build {
        /// Set the development flag in every stanza page
        #[arg(long)]
        development: bool,
    },
    /// Build, then serve the collection and rebuild on change
    Server {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind
        #[arg(long)]
        interface: Option<String>,
        /// Development mode (true/false)
        #[arg(long)]
        development: Option<bool>,
        /// Request handler threads
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Create a new stanza from the blueprint
    New {
        /// Stanza name (lowercase letters, digits and hyphens)
        name: String,
    },
    /// Print a stock ts.toml with all options documented
    GenConfig,
}

/// Resolved locations shared by every command.
struct Settings {
    base_dir: PathBuf,
    output_root: PathBuf,
    config: TsConfig,
}

impl Settings {
    /// Config from `ts.toml`, with the global flags applied on top.
    fn resolve(cli: &Cli) -> Result<Self, config::ConfigError> {
        let config = config::load_config(&cli.stanza_base_dir)?;
        let output_root = cli
            .output
            .clone()
            .unwrap_or_else(|| cli.stanza_base_dir.join(&config.output_dir));
        Ok(Self {
            base_dir: cli.stanza_base_dir.clone(),
            output_root,
            config,
        })
    }

    fn dist_dir(&self) -> PathBuf {
        self.output_root.join(COLLECTION_DIR)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    resources::verify()?;

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::New { name } => {
            let settings = Settings::resolve(&cli)?;
            let dir = scaffold::create(&settings.base_dir, name)?;
            let files: Vec<String> = scaffold::files().into_iter().map(String::from).collect();
            output::print_scaffold_output(name, &dir, &files);
        }
        Command::Build { development } => {
            let settings = Settings::resolve(&cli)?;
            let development = *development || settings.config.build.development;
            build(&settings, development)?;
        }
        Command::Server {
            port,
            interface,
            development,
            workers,
        } => {
            let settings = Settings::resolve(&cli)?;
            let server = &settings.config.server;
            let options = ServeOptions {
                interface: interface.clone().unwrap_or_else(|| server.interface.clone()),
                port: port.unwrap_or(server.port),
                workers: workers.unwrap_or(server.workers),
                development: development.unwrap_or(server.development),
            };
            let provider = build(&settings, options.development)?;
            let state = ServerState::new(
                provider,
                &settings.output_root,
                settings.dist_dir(),
                options.development,
            );
            serve::serve(state, &options)?;
        }
    }

    Ok(())
}

/// Build the collection once and report it.
fn build(settings: &Settings, development: bool) -> Result<StanzaProvider, Box<dyn std::error::Error>> {
    let dist_dir = settings.dist_dir();
    println!("==> Building {} → {}", display(&settings.base_dir), dist_dir.display());
    let mut provider = StanzaProvider::new(&settings.base_dir);
    let report = provider.build(&dist_dir, development)?;
    output::print_build_report(&report);
    Ok(provider)
}

fn display(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
