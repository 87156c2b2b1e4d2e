use clap::{Parser, Subcommand};
use colored::Colorize;
use labbook::cli;
use labbook::error::LabbookResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "labbook")]
#[command(about = "Workbook engine for laboratory sample tracking")]
#[command(long_about = "Labbook - structured sample-tracking workbooks

Builds one workbook per project: a summary sheet plus one template-derived
data-entry sheet per sample. Later saves write fields into named or merged
cell ranges; renames keep sheet names unique.

CONFIGURATION (environment, falls back to built-in defaults):
  LABBOOK_TEMPLATE_CHAR_SOLID      characterisation/solid template path
  LABBOOK_TEMPLATE_CHAR_EFFLUENT   characterisation/effluent template path
  LABBOOK_TEMPLATE_BMP_SOLID       BMP/solid template path
  LABBOOK_TEMPLATE_BMP_EFFLUENT    BMP/effluent template path
  LABBOOK_BASE_DIR                 output base directory

EXAMPLES:
  labbook create --name AcidTest --samples 2 --sample-type solid --project-type characterisation
  labbook save out.xlsx Sample_1 -e \"B1=Sludge\" -e \"B3:D3=Digestibility trial\"
  labbook rename out.xlsx Sample_1 Sludge_A
  labbook read out.xlsx Sample_1 B1 B3:D3
  labbook summary out.xlsx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the workbook for a new project
    Create {
        /// Project name
        #[arg(long)]
        name: String,

        /// Number of samples (one sheet per sample)
        #[arg(long)]
        samples: usize,

        /// Sample type: solid or effluent
        #[arg(long, default_value = "solid")]
        sample_type: String,

        /// Project type: characterisation or bmp
        #[arg(long, default_value = "characterisation")]
        project_type: String,

        /// Build even when a matching workbook already exists today
        #[arg(long)]
        force: bool,

        /// Show extra detail
        #[arg(short, long)]
        verbose: bool,
    },

    /// Apply field writes to one sheet of an existing workbook
    Save {
        /// Workbook path
        file: PathBuf,

        /// Target sheet name
        sheet: String,

        /// Entries as RANGE=VALUE (repeatable); spans like B3:D3 are merged
        #[arg(short, long = "entry")]
        entries: Vec<String>,

        /// JSON file holding an object of range → value
        #[arg(long)]
        batch: Option<PathBuf>,

        /// Show extra detail
        #[arg(short, long)]
        verbose: bool,
    },

    /// Rename a sheet, keeping names unique
    Rename {
        /// Workbook path
        file: PathBuf,

        /// Current sheet name
        old_name: String,

        /// New sheet name
        new_name: String,
    },

    /// Read range values from one sheet as JSON
    Read {
        /// Workbook path
        file: PathBuf,

        /// Sheet name
        sheet: String,

        /// Ranges to read, e.g. B1 B3:D3
        ranges: Vec<String>,
    },

    /// Show the project metadata stored on the summary sheet
    Summary {
        /// Workbook path
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> LabbookResult<()> {
    match cli.command {
        Commands::Create {
            name,
            samples,
            sample_type,
            project_type,
            force,
            verbose,
        } => cli::create(name, samples, sample_type, project_type, force, verbose),

        Commands::Save {
            file,
            sheet,
            entries,
            batch,
            verbose,
        } => cli::save(file, sheet, entries, batch, verbose),

        Commands::Rename {
            file,
            old_name,
            new_name,
        } => cli::rename(file, old_name, new_name),

        Commands::Read { file, sheet, ranges } => cli::read(file, sheet, ranges),

        Commands::Summary { file } => cli::summary(file),
    }
}
