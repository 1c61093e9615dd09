//! cfl-converter - Command-line tool converting CFL containers to CHKN files.
//!
//! This is the main entry point for the converter. Inputs are processed one
//! at a time; a failure in one input or product is reported and the rest
//! still run.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, Level};

use chkn::prelude::*;
use chkn::DEFAULT_BASE_URL;

/// Convert CFL product containers into CHKN archives
#[derive(Parser, Debug)]
#[command(name = "cfl-converter")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:\n  \
  cfl-converter --input product.cfl,chair.cfl\n  \
  cfl-converter --products 1243456,654321")]
struct Cli {
    /// .CFL file(s) to convert
    #[arg(short = 'I', long, value_name = "FILES", value_delimiter = ',')]
    input: Vec<String>,

    /// Product IDs to retrieve and pack
    #[arg(short = 'P', long, value_name = "IDS", value_delimiter = ',')]
    products: Vec<String>,

    /// Stop the program from logging progress
    #[arg(short = 'Q', long)]
    quiet: bool,

    /// Log decoding details
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Skip writing output files and just attempt to convert
    #[arg(short = 'D', long)]
    dry_run: bool,

    /// Ignore IDs that point to non-existent products
    #[arg(long)]
    ignore_missing: bool,

    /// Attempt to process all files regardless of extension
    #[arg(long)]
    ignore_extension: bool,

    /// Print each input's directory instead of converting
    #[arg(short, long)]
    list: bool,

    /// Output directory (defaults to next to each input)
    #[arg(short, long, env = "CHKN_OUTPUT")]
    output: Option<PathBuf>,

    /// Deflate files inside the CHKN archive instead of storing them
    #[arg(long)]
    deflate: bool,

    /// Worker threads used to decompress entries
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Product data endpoint
    #[arg(long, env = "CHKN_PRODUCT_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl Cli {
    fn chkn_options(&self) -> ChknOptions {
        ChknOptions {
            deflate: self.deflate,
        }
    }

    fn progress_bar(&self, len: u64) -> Result<ProgressBar> {
        if self.quiet {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        Ok(pb)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args_os().len() < 2 {
        Cli::command().print_help()?;
        return Ok(());
    }
    let cli = Cli::parse();

    init_logging(&cli);

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    prepare_output_dir(&cli)?;

    let mut failures = 0;

    if !cli.products.is_empty() {
        failures += cmd_products(&cli).await?;
    }

    if !cli.ignore_extension {
        if let Some(bad) = cli.input.iter().find(|input| !has_cfl_extension(input)) {
            bail!(
                "'{}': this program only supports files with the .CFL extension! (Use the --ignore-extension flag to override)",
                bad.trim()
            );
        }
    }

    if cli.list {
        for input in &cli.input {
            if let Err(e) = cmd_list(Path::new(input.trim())) {
                error!("Failed listing '{}': {:#}", input.trim(), e);
                failures += 1;
            }
        }
    } else if !cli.input.is_empty() {
        failures += cmd_convert(&cli)?;
    }

    if failures > 0 {
        bail!("{} item(s) failed", failures);
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        Level::WARN
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Download products and write them as `<id>.chkn`.
///
/// Returns the number of products that failed.
async fn cmd_products(cli: &Cli) -> Result<usize> {
    info!("Downloading {} CFL file(s)...", cli.products.len());

    let fetcher = ProductFetcher::new(cli.base_url.clone()).context("Failed to create HTTP client")?;
    let mut failures = 0;

    for id in cli.products.iter().map(|id| id.trim()) {
        match fetcher.fetch_chkn(id, cli.chkn_options()).await {
            Ok(Some(chkn)) => {
                if cli.dry_run {
                    info!("Successfully downloaded '{}'.", id);
                } else {
                    match write_product(cli.output.as_deref(), id, &chkn) {
                        Ok(path) => info!("Wrote to '{}'.", path.display()),
                        Err(e) => {
                            error!("Failed saving '{}': {:#}", id, e);
                            failures += 1;
                        }
                    }
                }
            }
            Ok(None) if cli.ignore_missing => {
                info!("Product '{}' not found, skipping.", id);
            }
            Ok(None) => {
                error!(
                    "Product '{}' failed to download! (Use the --ignore-missing flag to override)",
                    id
                );
                failures += 1;
            }
            Err(e) => {
                error!("Failed downloading '{}': {}", id, e);
                failures += 1;
            }
        }
    }

    if failures == 0 {
        info!("Successfully downloaded {} file(s)!", cli.products.len());
    }

    Ok(failures)
}

fn write_product(output_dir: Option<&Path>, id: &str, chkn: &[u8]) -> Result<PathBuf> {
    let path = output_path(output_dir, id);
    fs::write(&path, chkn).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Create the output directory up front so every item can write into it.
fn prepare_output_dir(cli: &Cli) -> Result<()> {
    match &cli.output {
        Some(dir) if !cli.dry_run => fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display())),
        _ => Ok(()),
    }
}

/// Convert every input, returning the number of inputs that failed.
fn cmd_convert(cli: &Cli) -> Result<usize> {
    info!("Beginning processing on {} file(s)...", cli.input.len());

    let start = Instant::now();
    let mut failures = 0;

    for input in cli.input.iter().map(|input| input.trim()) {
        let stem = output_stem(input);
        info!("Processing file {}...", stem);

        match convert_file(cli, Path::new(input), stem) {
            Ok(Some(path)) => info!("Wrote to '{}'.", path.display()),
            Ok(None) => info!("Successfully converted '{}'.", stem),
            Err(e) => {
                error!("Failed processing '{}': {:#}", stem, e);
                failures += 1;
            }
        }
    }

    info!(
        "Finished processing {} file(s) in {:?}!",
        cli.input.len(),
        start.elapsed()
    );

    Ok(failures)
}

/// Convert one CFL file; returns the written path unless dry-running.
fn convert_file(cli: &Cli, input: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let archive = CflArchive::open(input).context("Failed to open CFL container")?;

    let pb = cli.progress_bar(archive.entry_count() as u64)?;
    let entries = archive
        .resolve_parallel_with(|_| pb.inc(1))
        .context("Failed to decode entries")?;
    pb.finish_and_clear();

    if cli.dry_run {
        return Ok(None);
    }

    let path = output_path(cli.output.as_deref(), stem);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let files = entries
        .iter()
        .map(|entry| (entry.name.as_str(), entry.contents.as_slice()));
    write_chkn(files, BufWriter::new(file), cli.chkn_options())
        .context("Failed to write CHKN archive")?;

    Ok(Some(path))
}

fn cmd_list(input: &Path) -> Result<()> {
    let archive = CflArchive::open(input).context("Failed to open CFL container")?;
    let header = archive.header();

    println!(
        "{} (magic {:?}, directory {} bytes, {})",
        input.display(),
        header.magic_str(),
        header.directory_length,
        header.format
    );

    for record in archive.records() {
        println!(
            "{:>12} {:>10} {:>12} {} {}",
            record.uncompressed_size,
            record.compression.to_string(),
            record.payload_offset,
            if record.hash.has_value() { "H" } else { " " },
            record.name
        );
    }

    println!("\nTotal: {} entries", archive.entry_count());

    Ok(())
}

fn has_cfl_extension(input: &str) -> bool {
    input.trim().to_lowercase().ends_with(".cfl")
}

/// Input path without its `.cfl` extension.
fn output_stem(input: &str) -> &str {
    if has_cfl_extension(input) {
        &input[..input.len() - 4]
    } else {
        input
    }
}

fn output_path(output_dir: Option<&Path>, stem: &str) -> PathBuf {
    let file_name = format!("{stem}.chkn");
    match output_dir {
        Some(dir) => {
            let base = Path::new(&file_name)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&file_name));
            dir.join(base)
        }
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_comma_separated_inputs() {
        let cli = Cli::try_parse_from(["cfl-converter", "-I", "a.cfl,b.CFL", "-P", "1,2", "-Q"]).unwrap();

        assert_eq!(cli.input, ["a.cfl", "b.CFL"]);
        assert_eq!(cli.products, ["1", "2"]);
        assert!(cli.quiet);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem("models/chair.cfl"), "models/chair");
        assert_eq!(output_stem("CHAIR.CFL"), "CHAIR");
        assert_eq!(output_stem("archive.bin"), "archive.bin");
    }

    /// One stored `a.txt` holding `hi!`, directory right after the payload.
    fn sample_container() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"PLN0");
        data.extend_from_slice(&15u32.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(b"hi!");
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&19i32.to_le_bytes());
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(&8i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&5u16.to_le_bytes());
        data.extend_from_slice(b"a.txt");
        data
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cfl-converter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_convert_into_new_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("chair.cfl");
        fs::write(&input, sample_container()).unwrap();
        let out = tmp.path().join("out/nested");

        let cli = parse(&["-Q", "-o", out.to_str().unwrap(), "-I", input.to_str().unwrap()]);
        prepare_output_dir(&cli).unwrap();

        let input = input.to_str().unwrap();
        let path = convert_file(&cli, Path::new(input), output_stem(input))
            .unwrap()
            .unwrap();
        assert_eq!(path, out.join("chair.chkn"));
        assert!(fs::read(&path).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_failed_input_does_not_stop_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.cfl");
        fs::write(&good, sample_container()).unwrap();
        let missing = tmp.path().join("missing.cfl");
        let out = tmp.path().join("out");

        let inputs = format!("{},{}", missing.display(), good.display());
        let cli = parse(&["-Q", "-o", out.to_str().unwrap(), "-I", &inputs]);
        prepare_output_dir(&cli).unwrap();

        assert_eq!(cmd_convert(&cli).unwrap(), 1);
        assert!(out.join("good.chkn").exists());
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");

        let cli = parse(&["-D", "-o", out.to_str().unwrap()]);
        prepare_output_dir(&cli).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn test_write_product() {
        let tmp = tempfile::tempdir().unwrap();

        let path = write_product(Some(tmp.path()), "1243456", b"PK").unwrap();
        assert_eq!(path, tmp.path().join("1243456.chkn"));
        assert_eq!(fs::read(&path).unwrap(), b"PK");

        // A missing directory is reported, not fatal
        assert!(write_product(Some(tmp.path().join("absent").as_path()), "1", b"PK").is_err());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(None, "models/chair"), PathBuf::from("models/chair.chkn"));
        assert_eq!(
            output_path(Some(Path::new("out")), "models/chair"),
            PathBuf::from("out/chair.chkn")
        );
    }
}
