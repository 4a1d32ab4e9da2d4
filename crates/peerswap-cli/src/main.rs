#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use peerswap_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "peerswap")]
#[command(author, version, about = "Rewrite peer dependencies through tagged ranges", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Protocol tag of peer-edit ranges [default: $PEERSWAP_PROTOCOL or peer-edit]
    #[arg(long, global = true, value_name = "TAG")]
    protocol: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Decode a tagged range into its source and peer edits
    Decode {
        /// The tagged range, e.g. `peer-edit:npm%3A9.0.0#eslint@*:-`
        range: String,
    },

    /// Build a tagged range from a source and peer edits
    Encode {
        /// Real range to resolve with; omit to leave it unspecified
        #[arg(long, short, default_value = "")]
        source: String,

        /// Peer edit as `<descriptor>` (remove) or `<descriptor>=<descriptor>`
        /// (replace). Repeatable; later edits win.
        #[arg(long = "edit", short, value_name = "EDIT")]
        edits: Vec<String>,
    },

    /// Fill a tagged descriptor's source from the workspace manifest
    Bind {
        /// Descriptor such as `eslint@peer-edit:#eslint@*:-`
        descriptor: String,
    },

    /// Resolve tagged descriptors and print the rewritten packages
    Resolve {
        /// Descriptors to resolve
        #[arg(required = true)]
        descriptors: Vec<String>,

        /// Directory of packuments to resolve against [default: $PEERSWAP_REGISTRY]
        #[arg(long, value_name = "DIR")]
        registry: Option<PathBuf>,

        /// Also write the JSON results to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Fetch the archive behind a tagged locator
    Fetch {
        /// Locator such as `eslint@peer-edit:npm%3A9.0.0#eslint@*:-`
        locator: String,

        /// Directory of packuments to fetch from [default: $PEERSWAP_REGISTRY]
        #[arg(long, value_name = "DIR")]
        registry: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Flags override the environment
    let mut config = Config::from_env(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);
    if let Some(protocol) = cli.protocol.filter(|p| !p.is_empty()) {
        config = config.with_protocol(protocol);
    }

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Decode { range }) => commands::decode::run(&config, &range, cli.json),
        Some(Commands::Encode { source, edits }) => {
            commands::encode::run(&config, &source, &edits, cli.json)
        }
        Some(Commands::Bind { descriptor }) => {
            let span = tracing::info_span!("bind", cmd = "bind", cwd = %cwd.display());
            let _guard = span.enter();
            commands::bind::run(&config, &descriptor, cli.json)
        }
        Some(Commands::Resolve {
            descriptors,
            registry,
            out,
        }) => {
            if let Some(dir) = registry {
                config = config.with_registry_dir(dir);
            }
            let span = tracing::info_span!("resolve", cmd = "resolve", cwd = %cwd.display());
            let _guard = span.enter();
            commands::resolve::run(&config, &descriptors, out.as_deref(), cli.json)
        }
        Some(Commands::Fetch { locator, registry }) => {
            if let Some(dir) = registry {
                config = config.with_registry_dir(dir);
            }
            commands::fetch::run(&config, &locator, cli.json)
        }
    }
}
