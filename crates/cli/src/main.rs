use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::Level;
use rnaviz_core::{
    classify_path, extract_header_lines, label_structure, Error, Fingerprint, NamingSession,
    Settings, StructureFile,
};

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Sticky folder names for RNA secondary structure files
#[derive(Parser)]
#[command(name = "rnaviz", version)]
struct Cli {
    /// JSON settings file (store_path, search_dir, prefix_bytes, divider)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sticky folder store file (overrides the settings file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Directory that relative structure paths are resolved against
    #[arg(long, global = true)]
    search_dir: Option<PathBuf>,

    /// Log store matches and rewrites
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the 80-character fingerprint of a structure's sequence
    Fingerprint {
        /// Structure file (CT, NOPCT, BPSEQ, dot-bracket)
        #[arg(required_unless_present = "sequence")]
        file: Option<PathBuf>,

        /// Raw sequence instead of a file
        #[arg(short = 'q', long, conflicts_with = "file")]
        sequence: Option<String>,
    },
    /// Print the structure format of each path
    Classify { paths: Vec<PathBuf> },
    /// Print the header/comment lines of a structure file
    Header { file: PathBuf },
    /// Print the sticky folder name saved for a structure
    Lookup { file: PathBuf },
    /// Save a sticky folder name for a structure (numbered label prefixes are stripped)
    Save { file: PathBuf, name: String },
    /// Suggest numbered folder labels for structure files
    Label {
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List every record in the sticky folder store
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::Debug } else { Level::Warn };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("error: failed to initialise logging: {e}");
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };

    let output = match run(cli.command, &settings) {
        Ok(output) => output,
        Err(e) => fail(&e),
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = handle.write_all(output.as_bytes()) {
        eprintln!("error: write failed: {e}");
        process::exit(1);
    }
}

fn fail(e: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {e}");
    process::exit(1);
}

fn load_settings(cli: &Cli) -> rnaviz_core::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    if let Some(dir) = &cli.search_dir {
        settings.search_dir = dir.clone();
    }
    Ok(settings)
}

fn read_structure(settings: &Settings, file: &Path) -> rnaviz_core::Result<StructureFile> {
    StructureFile::read(&settings.resolve_structure_path(file))
}

fn run(command: Command, settings: &Settings) -> rnaviz_core::Result<String> {
    let mut out = String::new();
    match command {
        Command::Fingerprint { file, sequence } => {
            let sequence = match (sequence, file) {
                (Some(seq), _) => seq.into_bytes(),
                (None, Some(file)) => read_structure(settings, &file)?.sequence,
                (None, None) => {
                    return Err(Error::InvalidInput(
                        "a structure file or --sequence is required".to_string(),
                    ))
                }
            };
            out = format!("{}\n", Fingerprint::of(&sequence)?);
        }
        Command::Classify { paths } => {
            for path in paths {
                let tag = classify_path(&path).map_or("NONE", |ty| ty.tag());
                out.push_str(&format!("{}\t{tag}\n", path.display()));
            }
        }
        Command::Header { file } => {
            let header = classify_path(&file)
                .map(|ty| extract_header_lines(&settings.resolve_structure_path(&file), ty))
                .unwrap_or_default();
            out = format!("{}\n", header.trim_end());
        }
        Command::Lookup { file } => {
            let structure = read_structure(settings, &file)?;
            match settings.store().lookup(&structure.sequence)? {
                Some(name) => out = format!("{name}\n"),
                None => {
                    eprintln!("no sticky folder name for {}", file.display());
                    process::exit(1);
                }
            }
        }
        Command::Save { file, name } => {
            let structure = read_structure(settings, &file)?;
            let store = settings.store();
            store.create_if_missing()?;
            store.remember(&structure.sequence, &name)?;
            log::info!("saved sticky folder name for {}", file.display());
        }
        Command::Label { files, format } => {
            let mut session = NamingSession::with_divider(settings.divider.clone());
            let suggestions: Vec<_> = files
                .iter()
                .map(|file| label_structure(settings, &mut session, file))
                .collect();
            out = match format {
                Format::Json => to_json(&suggestions)?,
                Format::Text => suggestions
                    .iter()
                    .zip(&files)
                    .map(|(s, file)| format!("{}\t{}\n", file.display(), s.label))
                    .collect(),
            };
        }
        Command::List { format } => {
            let records = settings.store().records()?;
            out = match format {
                Format::Json => to_json(&records)?,
                Format::Text => records
                    .iter()
                    .map(|r| format!("{}\t{}\n", r.fingerprint, r.folder_name))
                    .collect(),
            };
        }
    }
    Ok(out)
}

fn to_json<T: serde::Serialize>(value: &T) -> rnaviz_core::Result<String> {
    serde_json::to_string_pretty(value)
        .map(|json| json + "\n")
        .map_err(Error::Output)
}
