//! PDS Tool
//!
//! Builds Platform Descriptor Store images from TOML manifests and inspects
//! images, including stores embedded at an offset in a larger flash image.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memmap2::Mmap;
use pds::{find_descriptor, parse_with, Header, Manifest, ParseOptions, TypeId, DEFAULT_MAX_DESCRIPTORS};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pds-tool")]
#[command(about = "Build and inspect Platform Descriptor Store images")]
struct Args {
    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an image from a TOML manifest
    Build {
        /// Manifest path; `file` payloads resolve relative to its directory
        manifest: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate an image and list its descriptors
    Inspect {
        /// Image path
        image: PathBuf,

        /// Byte offset of the store within the image
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum chain length
        #[arg(long, default_value_t = DEFAULT_MAX_DESCRIPTORS)]
        max_descriptors: usize,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write the payload of the first descriptor of a type
    Extract {
        /// Image path
        image: PathBuf,

        /// Descriptor type UUID
        #[arg(long = "type")]
        type_id: TypeId,

        /// Byte offset of the store within the image
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum chain length
        #[arg(long, default_value_t = DEFAULT_MAX_DESCRIPTORS)]
        max_descriptors: usize,

        /// Output payload path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    header: &'a Header,
    descriptors: Vec<DescriptorReport>,
}

#[derive(Serialize)]
struct DescriptorReport {
    offset: u32,
    #[serde(rename = "type")]
    type_id: TypeId,
    payload_offset: u32,
    payload_size: u32,
}

/// Read-only mapping of an image file
fn map_image(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    // The mapping is only read, and the tool does not modify the file
    let map = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map {:?}", path))?;
    Ok(map)
}

fn store_at(image: &[u8], offset: usize) -> Result<&[u8]> {
    image.get(offset..).with_context(|| {
        format!(
            "Store offset {} is past the end of the {}-byte image",
            offset,
            image.len()
        )
    })
}

fn run_build(manifest_path: &Path, output: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest {:?}", manifest_path))?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let image = manifest
        .build(base_dir)
        .with_context(|| format!("Failed to build store from {:?}", manifest_path))?;

    std::fs::write(output, &image).with_context(|| format!("Failed to write {:?}", output))?;
    info!(
        "Wrote {} bytes ({} descriptors) to {:?}",
        image.len(),
        manifest.descriptors.len(),
        output
    );
    Ok(())
}

fn run_inspect(image_path: &Path, offset: usize, max_descriptors: usize, json: bool) -> Result<()> {
    let map = map_image(image_path)?;
    let store = store_at(&map, offset)?;

    let options = ParseOptions::new().with_max_descriptors(max_descriptors);
    let doc = parse_with(store, &options)
        .with_context(|| format!("Invalid store in {:?} at offset {}", image_path, offset))?;

    let descriptors: Vec<DescriptorReport> = doc
        .entries()
        .map(|e| DescriptorReport {
            offset: e.offset,
            type_id: e.type_id(),
            payload_offset: e.descriptor.payload_offset,
            payload_size: e.descriptor.payload_size,
        })
        .collect();

    if json {
        let report = Report {
            header: doc.header(),
            descriptors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let header = doc.header();
    println!(
        "PDS v{}: header {} bytes, checksum {:#010x}",
        header.version, header.header_size, header.header_crc
    );
    println!("Version string: {:?}", header.version_string);
    println!("Descriptors: {}", descriptors.len());
    for (i, d) in descriptors.iter().enumerate() {
        println!(
            "  [{}] @{:<6} {}  payload {} bytes @{}",
            i, d.offset, d.type_id, d.payload_size, d.payload_offset
        );
    }
    Ok(())
}

fn run_extract(
    image_path: &Path,
    type_id: TypeId,
    offset: usize,
    max_descriptors: usize,
    output: &Path,
) -> Result<()> {
    let map = map_image(image_path)?;
    let store = store_at(&map, offset)?;

    let payload = find_descriptor(store, type_id, max_descriptors)
        .with_context(|| format!("Invalid store in {:?} at offset {}", image_path, offset))?
        .with_context(|| format!("No descriptor of type {} in {:?}", type_id, image_path))?;

    std::fs::write(output, payload).with_context(|| format!("Failed to write {:?}", output))?;
    info!("Wrote {} payload bytes to {:?}", payload.len(), output);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Build { manifest, output } => run_build(&manifest, &output),
        Command::Inspect {
            image,
            offset,
            max_descriptors,
            json,
        } => run_inspect(&image, offset, max_descriptors, json),
        Command::Extract {
            image,
            type_id,
            offset,
            max_descriptors,
            output,
        } => run_extract(&image, type_id, offset, max_descriptors, &output),
    }
}
