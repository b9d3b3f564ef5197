use clap::{Parser, Subcommand};
use image_reducer::config::{self, ReducerConfig};
use image_reducer::export::{CancelToken, EntryStatus, ExportSummary};
use image_reducer::imaging::OutputFormat;
use image_reducer::registry::FileInput;
use image_reducer::{ReduceError, Session, naming, output};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Conversion settings shared by `preview` and `export`.
#[derive(clap::Args, Clone)]
struct ConvertArgs {
    /// Target density; output size is original × density / baseline
    #[arg(long)]
    density: Option<f64>,

    /// Output media type (image/webp or image/jpeg)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Lossy quality between 0 and 1
    #[arg(long)]
    quality: Option<f32>,
}

#[derive(Parser)]
#[command(name = "image-reducer")]
#[command(about = "Shrink images locally by density, re-encoded as WebP or JPEG")]
#[command(long_about = "\
Shrink images locally by density, re-encoded as WebP or JPEG

Each image is scaled by density / baseline on both axes and re-encoded with
a lossy encoder. With the stock baseline of 72:

  --density 72    keeps the original dimensions
  --density 36    halves width and height
  --density 144   doubles width and height

Exports are named by position: reduced-1.webp, reduced-2.webp, ...

Run 'image-reducer gen-config' to print a documented reducer.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing reducer.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log each pipeline stage
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare one image before and after conversion
    Preview {
        file: PathBuf,

        #[command(flatten)]
        convert: ConvertArgs,

        /// Write the converted image to this file (or directory)
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Convert every image under the given paths
    Export {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        convert: ConvertArgs,

        /// Directory for the exported files
        #[arg(long, default_value = "reduced")]
        out: PathBuf,
    },
    /// Print a stock reducer.toml with all options documented
    GenConfig,
}

/// Written next to the exports as `export-manifest.json`.
#[derive(Serialize)]
struct ExportManifest<'a> {
    density: f64,
    baseline: f64,
    format: OutputFormat,
    quality: f32,
    summary: ExportSummary,
    entries: Vec<ManifestEntry<'a>>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    position: usize,
    source: &'a str,
    file: &'a str,
    result: EntryStatus,
}

const MANIFEST_FILE_NAME: &str = "export-manifest.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_config = match &cli.config {
        Some(dir) => config::load_config(dir)?,
        None => ReducerConfig::default(),
    };

    match cli.command {
        Command::Preview {
            file,
            convert,
            save,
        } => {
            let mut session = open_session(base_config, &convert)?;
            session.add_file(read_input(&file)?)?;

            let preview = session.preview(None)?;
            output::print_preview(&preview);

            if let Some(path) = save {
                let path = if path.is_dir() {
                    path.join(preview.download_name())
                } else {
                    path
                };
                std::fs::write(&path, &preview.converted.encoded_bytes)?;
                println!("Saved {}", path.display());
            }
            session.dispose();
        }
        Command::Export {
            paths,
            convert,
            out,
        } => {
            let mut session = open_session(base_config, &convert)?;
            for skipped in register_paths(&mut session, &paths)? {
                println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_export_event(&event);
                }
            });
            let outcomes = session.export_all(&CancelToken::new(), Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            std::fs::create_dir_all(&out)?;
            for file in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
                std::fs::write(out.join(&file.file_name), &file.bytes)?;
            }

            let request = session.request();
            let manifest = ExportManifest {
                density: request.density,
                baseline: request.baseline,
                format: request.format,
                quality: request.quality.value(),
                summary: ExportSummary::of(&outcomes),
                entries: outcomes
                    .iter()
                    .map(|o| ManifestEntry {
                        position: o.position,
                        source: &o.source_name,
                        file: &o.file_name,
                        result: EntryStatus::of(&o.result),
                    })
                    .collect(),
            };
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(out.join(MANIFEST_FILE_NAME), json)?;
            println!("==> Exports written to {}", out.display());
            session.dispose();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `--verbose` turns on debug logs for this crate; otherwise `RUST_LOG`
/// decides, falling back to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("image_reducer=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply command-line overrides on top of the loaded config.
fn open_session(
    mut config: ReducerConfig,
    args: &ConvertArgs,
) -> Result<Session, Box<dyn std::error::Error>> {
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(quality) = args.quality {
        config.output.quality = quality;
    }
    config.validate()?;

    let mut session = Session::create(config);
    if let Some(density) = args.density {
        let range = session.density_range();
        if !range.contains(density) {
            tracing::warn!(density, min = range.min, max = range.max, "density outside the usual range");
        }
        session.set_density(density)?;
    }
    Ok(session)
}

/// Files named directly plus every file found under named directories,
/// in sorted walk order. Paths the walk cannot read are kept so the
/// failure is reported when they are opened.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|path| {
            WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(e) => e.file_type().is_file().then(|| e.into_path()),
                    Err(err) => err.path().map(Path::to_path_buf),
                })
        })
        .collect()
}

/// A path left out of the export.
#[derive(Debug)]
struct Skipped {
    path: PathBuf,
    reason: String,
}

/// Register every file under `paths`. Unreadable files and rejected inputs
/// are skipped and reported; the rest of the batch goes on.
fn register_paths(session: &mut Session, paths: &[PathBuf]) -> Result<Vec<Skipped>, ReduceError> {
    let mut skipped = Vec::new();
    for path in expand_paths(paths) {
        let reason = match read_input(&path) {
            Err(e) => e.to_string(),
            Ok(input) => match session.add_file(input) {
                Ok(_) => continue,
                Err(e) if e.is_input_error() => e.to_string(),
                Err(e) => return Err(e),
            },
        };
        tracing::warn!(file = %path.display(), %reason, "skipped");
        skipped.push(Skipped { path, reason });
    }
    Ok(skipped)
}

fn read_input(path: &Path) -> Result<FileInput, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileInput::new(name, naming::media_type_for(path), bytes))
}
