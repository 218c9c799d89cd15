//! kemist-db - manage molecule catalogue databases

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kemist::MatchingMode;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "kemist-db")]
#[command(version)]
#[command(about = "Create and update molecule catalogue databases")]
#[command(long_about = r#"
kemist-db keeps named SQLite catalogues of molecules and of the storage units
holding them. Imported lists are reconciled against the catalogue: records
that denote the same molecule are merged instead of duplicated.

Example usage:
  kemist-db create lab -m molecules.csv -s storage.csv
  kemist-db update -m new_batch.csv -I
  kemist-db export lab.csv --database lab
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ImportArgs {
    /// Molecule list (semicolon separated)
    #[arg(short, long)]
    molecules: Option<PathBuf>,

    /// Storage mapping (semicolon separated)
    #[arg(short, long)]
    storage: Option<PathBuf>,

    /// Look up missing IUPAC names and formulas online
    #[arg(short, long)]
    complete: bool,

    #[command(flatten)]
    matching: MatchingArgs,
}

#[derive(Args)]
#[group(multiple = false)]
struct MatchingArgs {
    /// Merge certain matches only (default)
    #[arg(short = 'S', long)]
    strict: bool,

    /// Ask before merging doubtful matches
    #[arg(short = 'I', long)]
    interactive: bool,

    /// Merge doubtful matches without asking
    #[arg(short = 'R', long)]
    relaxed: bool,
}

impl MatchingArgs {
    fn mode(&self) -> MatchingMode {
        match (self.strict, self.interactive, self.relaxed) {
            (_, true, _) => MatchingMode::Interactive,
            (_, _, true) => MatchingMode::Relaxed,
            _ => MatchingMode::Strict,
        }
    }
}

impl ImportArgs {
    fn into_request(self, add_unmatched: bool) -> commands::ImportRequest {
        commands::ImportRequest {
            molecules: self.molecules,
            storage: self.storage,
            complete: self.complete,
            mode: self.matching.mode(),
            add_unmatched,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new database, optionally filled from CSV files
    Create {
        /// Name of the new database
        database: String,

        /// Make it the default database
        #[arg(long)]
        make_default: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Fold CSV files into an existing database
    Update {
        /// Database to update (defaults to the default database)
        #[arg(short, long)]
        database: Option<String>,

        /// Only merge into known molecules, never add new ones
        #[arg(long)]
        existing_only: bool,

        #[command(flatten)]
        import: ImportArgs,
    },

    /// Set the default database
    Set {
        database: String,
    },

    /// List registered databases
    List,

    /// Export the molecules of a database to CSV
    Export {
        /// Destination file
        output: PathBuf,

        #[arg(short, long)]
        database: Option<String>,
    },

    /// Show row counts of a database
    Stats {
        #[arg(short, long)]
        database: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: StatsFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Create { database, make_default, import } => {
            commands::run_create(&database, make_default, import.into_request(true))
        }
        Commands::Update { database, existing_only, import } => {
            commands::run_update(database.as_deref(), import.into_request(!existing_only))
        }
        Commands::Set { database } => commands::run_set(&database),
        Commands::List => commands::run_list(),
        Commands::Export { output, database } => commands::run_export(&output, database.as_deref()),
        Commands::Stats { database, format } => {
            commands::run_stats(database.as_deref(), matches!(format, StatsFormat::Json))
        }
    }
}
