//! # automag
//!
//! Build a department magazine (DOCX) from a template and two report PDFs.
//!
//! ## Why this crate?
//!
//! Department reports and the magazine share one fixed vocabulary of
//! section headings (`FROM THE HOD'S DESK:`, `FUNDED PROJECTS:` …). The
//! reports are read section by section, the same tables from both reports
//! are merged into one, a fresh technical article is written by an LLM, and
//! everything is placed under the matching headings of a Word template that
//! is otherwise left byte-for-byte untouched.
//!
//! ## Pipeline Overview
//!
//! ```text
//! template.docx   doc1.pdf   doc2.pdf
//!      │             │          │
//!      │             ├─ 1. Input    resolve local file or download from URL
//!      │             ├─ 2. Extract  text, layout tables and images per heading
//!      │             │              (pdfium, spawn_blocking; doc1 then doc2)
//!      │             ├─ 3. Article  topic + body via LLM, illustration via HF
//!      │             └─ 4. Inject   article replaces TECHNICAL ARTICLES
//!      └──────────────── 5. Fill    splice content after template headings
//!                        6. Output  atomic write of the DOCX + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use automag::{generate, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // OPENAI_API_KEY and HF_API_KEY are read from the environment.
//!     let config = GenerationConfig::default();
//!     let output = generate("template.docx", "report_a.pdf", "report_b.pdf", &config).await?;
//!     eprintln!(
//!         "{} written: {} tables, {} images",
//!         output.output_path.display(),
//!         output.stats.fill.tables_inserted,
//!         output.stats.fill.images_inserted
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `automag` binary (clap + anyhow + tracing-subscriber) |
//!
//! pdfium is loaded at runtime: place `libpdfium` next to the binary or set
//! `PDFIUM_LIB_PATH`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod headings;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod sections;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ArticleImageSource, GenerationConfig, GenerationConfigBuilder};
pub use error::MagazineError;
pub use generate::{extract_documents, fill_magazine, generate, generate_sync};
pub use headings::{normalize_heading, Heading, HeadingCatalog};
pub use output::{ExtractedSections, GenerationOutput, GenerationStats, SectionCounts};
pub use pipeline::article::GeneratedArticle;
pub use pipeline::docx::DOCX_MIME;
pub use pipeline::fill::FillReport;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use sections::{inject_article, RawTable, SectionBundle, SectionMap};
