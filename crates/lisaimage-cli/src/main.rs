//! LisaImage CLI - extract files from Lisa Monitor disk images
//!
//! Exit status: 0 on success, 2 if an output path is occupied by something
//! that is not a directory, 3 if the image is corrupt or not a Lisa Monitor
//! volume, 1 for anything else.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lisaimage_core::{ByteOrder, Error, Territory, Warning};
use lisaimage_territories::{
    extract_volume, DirectoryHeader, FileEntry, LineEnding, LisaTerritory, TextOptions,
};
use lisaimage_vaults::load_image;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lisaimage")]
#[command(about = "Extract files from Lisa Monitor disk images", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Extract every file of the volume into a folder
    Extract {
        /// Disk image (.dc42 and .image are DiskCopy 4.2, anything else raw)
        image: PathBuf,

        /// Output folder; the volume folder is created inside it
        outdir: PathBuf,

        /// Keep the NUL padding at the end of each text block
        #[arg(short = 'n', long)]
        no_clean_nulls: bool,

        /// Leave DLE indent markers in text files as stored
        #[arg(short = 'i', long)]
        no_fix_indents: bool,

        /// Convert text line endings (unix, windows, mac)
        #[arg(long)]
        line_endings: Option<LineEnding>,
    },

    /// Print the volume header and file table
    List {
        /// Disk image
        image: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Listing<'a> {
    byte_order: ByteOrder,
    header: &'a DirectoryHeader,
    entries: &'a [FileEntry],
    warnings: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Extract {
            image,
            outdir,
            no_clean_nulls,
            no_fix_indents,
            line_endings,
        } => {
            let options = TextOptions {
                strip_nulls: !no_clean_nulls,
                expand_indents: !no_fix_indents,
                line_ending: line_endings,
            };
            cmd_extract(&image, &outdir, &options)
        }
        Command::List { image, json } => cmd_list(&image, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(Error::OutputCollision(_)) => 2,
        Some(e) if e.is_corrupt_data() => 3,
        _ => 1,
    }
}

/// Parse the volume; also returns the container's unwrapping warnings
fn open_territory(image: &Path) -> Result<(LisaTerritory, Vec<Warning>)> {
    let raw = load_image(image).with_context(|| format!("reading {}", image.display()))?;
    let territory = LisaTerritory::parse(&raw.data)?;
    Ok((territory, raw.warnings))
}

fn cmd_extract(image: &Path, outdir: &Path, options: &TextOptions) -> Result<()> {
    let (mut territory, container_warnings) = open_territory(image)?;
    tracing::info!(
        "Text options: strip nulls {}, expand indents {}, line endings {}",
        options.strip_nulls,
        options.expand_indents,
        options
            .line_ending
            .map(|e| e.to_string())
            .unwrap_or_else(|| "as stored".to_string())
    );
    territory.normalize_text(options);

    let report = extract_volume(&territory, outdir)?;

    let warnings = container_warnings.len() + territory.warnings().len() + report.warnings.len();
    println!(
        "{}: {} files, {} folders written to {}",
        territory.banner()?,
        report.files,
        report.directories,
        report.volume_root.display()
    );
    if warnings > 0 {
        println!("{} warnings; see log above", warnings);
    }
    Ok(())
}

fn cmd_list(image: &Path, json: bool) -> Result<()> {
    let (territory, container_warnings) = open_territory(image)?;
    let header = territory.header();

    if json {
        let listing = Listing {
            byte_order: territory.byte_order(),
            header,
            entries: territory.entries(),
            warnings: container_warnings
                .iter()
                .chain(territory.warnings())
                .map(|w| w.to_string())
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("=== {} ===", territory.identify());
    println!("Volume:     {}", header.title);
    println!("Byte order: {}", territory.byte_order());
    println!("Blocks:     {} ({} bytes)", header.total_blocks, territory.domain_size());
    println!("Files:      {}", header.file_count);
    println!("Last set:   {}", header.last_modified);
    println!(
        "Directory:  0x{:04X}..0x{:04X} {}",
        header.first_block, header.last_block, header.kind
    );
    println!();

    println!(
        "{:<6}  {:<6}  {:>4}  {:<8}  {:<16}  {:>10}  {}",
        "FSTBLK", "LSTBLK", "BLKS", "KIND", "TITLE", "SIZE", "ACCESSED"
    );
    println!("{}", "-".repeat(72));
    for occupant in territory.list_occupants()? {
        println!("{}", occupant);
    }

    Ok(())
}
