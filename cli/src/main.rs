//! pdf-outline CLI - PDF outline extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use pdf_outline::parser::DocumentSource;
use pdf_outline::render::{self, JsonFormat};
use pdf_outline::{ExtractOptions, ExtractionResult, OutlineExtractor, PdfParser};

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract a titled, leveled outline from PDF documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the outline of one PDF
    Extract {
        /// Input PDF file
        #[arg(value_name = "PDF_PATH")]
        input: PathBuf,

        /// Save the result as JSON
        #[arg(short, long, value_name = "OUTPUT_PATH")]
        output: Option<PathBuf>,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Extract outlines for every PDF in a directory, one JSON file each
    Batch {
        /// Directory containing PDF files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "OUTPUT_DIR", default_value = "outlines")]
        output: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "PDF_PATH")]
        input: PathBuf,
    },
}

#[derive(Args, Clone)]
struct ExtractionArgs {
    /// Maximum number of pages to process
    #[arg(long = "max_pages", visible_alias = "max-pages", value_name = "N")]
    max_pages: Option<u32>,

    /// Resolution (DPI) for OCR of scanned pages
    #[arg(long, default_value_t = pdf_outline::parser::DEFAULT_DPI, value_name = "N")]
    dpi: u32,

    /// Never run OCR on pages without a text layer
    #[arg(long)]
    no_ocr: bool,

    /// Tesseract language code
    #[arg(long, default_value = "eng", value_name = "LANG")]
    ocr_lang: String,

    /// Per-page OCR timeout in seconds
    #[arg(long, default_value_t = 120, value_name = "SECS")]
    ocr_timeout: u64,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// tesseract executable
    #[arg(long, env = "PDF_OUTLINE_TESSERACT", default_value = "tesseract", value_name = "PATH")]
    tesseract: PathBuf,

    /// pdftoppm executable
    #[arg(long, env = "PDF_OUTLINE_PDFTOPPM", default_value = "pdftoppm", value_name = "PATH")]
    pdftoppm: PathBuf,
}

impl ExtractionArgs {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new()
            .with_dpi(self.dpi)
            .with_ocr_lang(&self.ocr_lang)
            .with_ocr_timeout(Duration::from_secs(self.ocr_timeout))
            .with_tesseract(&self.tesseract)
            .with_pdftoppm(&self.pdftoppm)
            .with_parallel(!self.sequential);
        if let Some(n) = self.max_pages {
            options = options.with_max_pages(n);
        }
        if self.no_ocr {
            options = options.without_ocr();
        }
        options
    }

    fn json_format(&self) -> JsonFormat {
        if self.compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            extraction,
        } => cmd_extract(&input, output.as_deref(), &extraction),
        Commands::Batch {
            input,
            output,
            extraction,
        } => cmd_batch(&input, &output, &extraction),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    args: &ExtractionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = OutlineExtractor::with_options(args.options()).extract(input);

    if result.is_error() && result.outline.is_empty() && result.title.is_empty() {
        // Open failures are reported, not fatal
        eprintln!(
            "{}: {}",
            "An error occurred".red().bold(),
            result.error.as_deref().unwrap_or_default()
        );
    } else {
        println!();
        print!("{}", render::to_text(&result));
    }

    if let Some(path) = output {
        render::write_json(&result, path, args.json_format())?;
        println!("\n{} {}", "Saved to".green(), path.display());
    }

    Ok(())
}

fn cmd_batch(input: &Path, output: &Path, args: &ExtractionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pdfs = find_pdfs(input)?;
    if pdfs.is_empty() {
        println!("{} {}", "No PDF files in".yellow(), input.display());
        return Ok(());
    }
    fs::create_dir_all(output)?;

    let pb = ProgressBar::new(pdfs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let options = args.options();
    let format = args.json_format();
    let results: Vec<(PathBuf, Result<ExtractionResult, String>)> = pdfs
        .par_iter()
        .map(|pdf| {
            log::debug!("extracting {}", pdf.display());
            let result = OutlineExtractor::with_options(options.clone()).extract(pdf);
            let target = output.join(json_name(pdf));
            let written = render::write_json(&result, &target, format)
                .map(|_| result)
                .map_err(|e| e.to_string());
            pb.inc(1);
            (pdf.clone(), written)
        })
        .collect();

    pb.finish_and_clear();

    let mut failed = 0;
    for (pdf, outcome) in &results {
        let name = pdf.file_name().unwrap_or_default().to_string_lossy();
        match outcome {
            Ok(result) if result.is_error() => {
                failed += 1;
                println!(
                    "  {} {}: {}",
                    "✗".red(),
                    name,
                    result.error.as_deref().unwrap_or_default()
                );
            }
            Ok(result) => println!("  {} {} ({} headings)", "✓".green(), name, result.outline.len()),
            Err(e) => {
                failed += 1;
                println!("  {} {}: {}", "✗".red(), name, e);
            }
        }
    }

    println!(
        "\n{} {} of {} documents written to {}",
        "Done!".green().bold(),
        results.len() - failed,
        results.len(),
        output.display()
    );

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let parser = PdfParser::open(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), parser.header());
    println!("{}: {}", "Pages".bold(), parser.page_count());
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if parser.is_encrypted() { "Yes" } else { "No" }
    );

    if let Some(title) = parser.metadata_title() {
        println!("{}: {}", "Title".bold(), title);
    }

    let bookmarks = parser.bookmarks();
    println!("{}: {}", "Bookmarks".bold(), bookmarks.len());
    if let Some(depth) = bookmarks.iter().map(|b| b.depth).max() {
        println!("{}: {}", "Bookmark depth".bold(), depth);
    }

    Ok(())
}

/// PDF files directly inside `dir`, sorted by name.
fn find_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn json_name(pdf: &Path) -> String {
    let stem = pdf.file_stem().unwrap_or_default().to_string_lossy();
    format!("{}.json", stem)
}
