//! CLI binary for automag.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use automag::{
    extract_documents, generate, ArticleImageSource, GenerationConfig, GenerationProgressCallback,
    ProgressCallback, Stage,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner per stage, switching to a page bar while a PDF is scanned.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn page_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut started) = self.stage_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix(match stage {
            Stage::Extract { .. } => "Extracting",
            Stage::Article => "Article",
            Stage::Fill => "Filling",
            Stage::Write => "Writing",
        });
        self.bar.set_message(stage.to_string());
    }

    fn on_page_scanned(&self, _document: usize, page_num: usize, total_pages: usize) {
        if self.bar.length() != Some(total_pages as u64) {
            self.bar.set_length(total_pages as u64);
            self.bar.set_style(Self::page_style());
        }
        self.bar.set_position(page_num as u64);
    }

    fn on_stage_complete(&self, stage: Stage) {
        let secs = self
            .stage_started
            .lock()
            .ok()
            .and_then(|s| *s)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.bar.set_length(0);
        self.bar.set_position(0);
        self.bar.println(format!(
            "  {} {:<28} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{secs:.1}s"))
        ));
    }

    fn on_generation_complete(&self, _output: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Build the magazine with the default article model and SDXL illustration
  automag template.docx report_a.pdf report_b.pdf

  # Custom output path, no AI image
  automag template.docx a.pdf b.pdf -o out/issue12.docx --image-source none

  # Pick the article image from a local folder instead of Hugging Face
  automag template.docx a.pdf b.pdf --image-source local --article-image-dir art/

  # Fill without the AI step (TECHNICAL ARTICLES stays empty)
  automag template.docx a.pdf b.pdf --no-article

  # Only extract, print both section maps as JSON
  automag template.docx a.pdf b.pdf --sections-json > sections.json

  # Inputs may be URLs
  automag https://example.org/template.docx https://example.org/a.pdf b.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (default article provider)
  HF_API_KEY              Hugging Face token for the article illustration
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise ./ then the system)
  RUST_LOG                Log filter, overrides -v/-q

SETUP:
  1. Install libpdfium for your platform.
  2. export OPENAI_API_KEY=sk-...  HF_API_KEY=hf_...
  3. automag template.docx a.pdf b.pdf
"#;

/// Build a department magazine from a DOCX template and two report PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "automag",
    version,
    about = "Build a department magazine from a DOCX template and two report PDFs",
    long_about = "Extracts each report's sections (text, tables, images) by heading, merges \
matching tables, writes a technical article with an LLM, and fills the content in after the \
matching headings of the template.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// DOCX template: local path or HTTP/HTTPS URL.
    template: String,

    /// First report PDF (document 1).
    pdf1: String,

    /// Second report PDF (document 2).
    pdf2: String,

    /// Output DOCX path.
    #[arg(short, long, env = "AUTOMAG_OUTPUT", default_value = "outputs/final_magazine.docx")]
    output: PathBuf,

    /// LLM model ID for the article (default: gpt-4.1).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Article illustration source: hf, local, none.
    #[arg(long, env = "AUTOMAG_IMAGE_SOURCE", value_enum, default_value = "hf")]
    image_source: ImageSourceArg,

    /// Hugging Face text-to-image model.
    #[arg(long, env = "AUTOMAG_IMAGE_MODEL", default_value = automag::config::DEFAULT_IMAGE_MODEL)]
    image_model: String,

    /// Directory the article image is written to or picked from.
    #[arg(long, env = "AUTOMAG_ARTICLE_IMAGE_DIR", default_value = "assets/technical_article_images")]
    article_image_dir: PathBuf,

    /// Scratch directory for extracted images.
    #[arg(long, env = "AUTOMAG_WORK_DIR", default_value = "temp_uploads")]
    work_dir: PathBuf,

    /// Structure flattened rows of table-only sections into tables.
    #[arg(long, env = "AUTOMAG_TEXT_TABLES")]
    text_tables: bool,

    /// Skip the AI article; TECHNICAL ARTICLES is left empty.
    #[arg(long, env = "AUTOMAG_NO_ARTICLE")]
    no_article: bool,

    /// Extract only and print both section maps as JSON.
    #[arg(long)]
    sections_json: bool,

    /// Sort the two PDF paths before assigning document 1 and 2.
    #[arg(long, env = "AUTOMAG_SORT_INPUTS")]
    sort_inputs: bool,

    /// Displayed image width in inches.
    #[arg(long, env = "AUTOMAG_IMAGE_WIDTH", default_value_t = 4.0)]
    image_width: f64,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "AUTOMAG_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "AUTOMAG_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Disable progress bar.
    #[arg(long, env = "AUTOMAG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AUTOMAG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "AUTOMAG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "AUTOMAG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "AUTOMAG_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Image generation timeout in seconds.
    #[arg(long, env = "AUTOMAG_IMAGE_TIMEOUT", default_value_t = 60)]
    image_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ImageSourceArg {
    Hf,
    Local,
    None,
}

impl From<ImageSourceArg> for ArticleImageSource {
    fn from(v: ImageSourceArg) -> Self {
        match v {
            ImageSourceArg::Hf => ArticleImageSource::HuggingFace,
            ImageSourceArg::Local => ArticleImageSource::LocalDirectory,
            ImageSourceArg::None => ArticleImageSource::Disabled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.sections_json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let (pdf1, pdf2) = order_inputs(&cli.pdf1, &cli.pdf2, cli.sort_inputs);

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.sections_json {
        let sections = extract_documents(pdf1, pdf2, &config)
            .await
            .context("Section extraction failed")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&sections).context("Failed to serialise sections")?
        );
        return Ok(());
    }

    // ── Run generation ───────────────────────────────────────────────────
    let output = generate(&cli.template, pdf1, pdf2, &config)
        .await
        .context("Magazine generation failed")?;

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} headings filled  {}ms  →  {}",
            green("✔"),
            stats.fill.headings_matched,
            stats.total_duration_ms,
            bold(&output.output_path.display().to_string()),
        );
        eprintln!(
            "   {} paragraphs  /  {} tables  /  {} images",
            dim(&stats.fill.paragraphs_inserted.to_string()),
            dim(&stats.fill.tables_inserted.to_string()),
            dim(&stats.fill.images_inserted.to_string()),
        );
        if let Some(ref article) = output.article {
            eprintln!(
                "   {} {}  {}",
                cyan("◆"),
                bold(&article.heading),
                dim(&format!(
                    "{} tokens in / {} tokens out",
                    stats.total_input_tokens, stats.total_output_tokens
                )),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .output_path(&cli.output)
        .image_source(cli.image_source.clone().into())
        .image_model(&cli.image_model)
        .article_image_dir(&cli.article_image_dir)
        .work_dir(&cli.work_dir)
        .text_tables(cli.text_tables)
        .skip_article(cli.no_article)
        .image_width_in(cli.image_width)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout)
        .image_timeout_secs(cli.image_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Document order: as given, or sorted by path like the upload form does.
fn order_inputs<'a>(a: &'a str, b: &'a str, sort: bool) -> (&'a str, &'a str) {
    if sort && b < a {
        (b, a)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_keep_order_unless_sorted() {
        assert_eq!(order_inputs("b.pdf", "a.pdf", false), ("b.pdf", "a.pdf"));
        assert_eq!(order_inputs("b.pdf", "a.pdf", true), ("a.pdf", "b.pdf"));
        assert_eq!(order_inputs("a.pdf", "b.pdf", true), ("a.pdf", "b.pdf"));
    }

    #[test]
    fn cli_maps_to_config() {
        let cli = Cli::parse_from([
            "automag",
            "t.docx",
            "a.pdf",
            "b.pdf",
            "--image-source",
            "none",
            "--text-tables",
            "--model",
            "gpt-4.1-mini",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.image_source, ArticleImageSource::Disabled);
        assert!(config.text_tables);
        assert_eq!(config.model_or_default(), "gpt-4.1-mini");
        assert_eq!(config.output_path, PathBuf::from("outputs/final_magazine.docx"));
    }
}
