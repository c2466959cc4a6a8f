//! Top-level entry points.
//!
//! [`generate`] runs the whole pipeline: resolve inputs, extract both
//! reports, write the article, fill the template, write the magazine.
//! [`extract_documents`] and [`fill_magazine`] expose the two halves for
//! callers that want to inspect or edit sections in between.

use crate::config::GenerationConfig;
use crate::error::MagazineError;
use crate::headings::HeadingCatalog;
use crate::output::{ExtractedSections, GenerationOutput, GenerationStats, SectionCounts};
use crate::pipeline::article::{check_image_credentials, generate_article, resolve_provider};
use crate::pipeline::docx::DocxPackage;
use crate::pipeline::extract::extract_sections;
use crate::pipeline::fill::{fill_template, FillReport};
use crate::pipeline::input::{resolve_input, InputKind};
use crate::progress::Stage;
use crate::sections::{inject_article, SectionBundle, SectionMap};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Build the magazine from a template and two report PDFs.
///
/// Each argument is a local path or an HTTP(S) URL. `pdf1` feeds document 1
/// (which also carries the article), `pdf2` document 2.
///
/// # Errors
/// Every error is fatal and nothing is written to `config.output_path`:
/// - inputs missing, unreadable or of the wrong type
/// - pdfium unavailable or a PDF that cannot be opened
/// - missing LLM / image-service credentials (checked before extraction)
/// - LLM or image-service failures
pub async fn generate(
    template: impl AsRef<str>,
    pdf1: impl AsRef<str>,
    pdf2: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, MagazineError> {
    let total_start = Instant::now();
    info!("Starting magazine generation");

    // ── Step 1: Resolve inputs ───────────────────────────────────────────
    let template = resolve_input(template.as_ref(), InputKind::Docx, config.download_timeout_secs).await?;

    // ── Step 2: Credentials, before any work ─────────────────────────────
    let provider = if config.skip_article {
        None
    } else {
        check_image_credentials(config)?;
        Some(resolve_provider(config).await?)
    };

    // ── Step 3: Extract both documents ───────────────────────────────────
    let extract_start = Instant::now();
    let ExtractedSections { mut doc1, mut doc2 } = extract_documents(pdf1, pdf2, config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let mut stats = GenerationStats {
        doc1: SectionCounts::of(&doc1),
        doc2: SectionCounts::of(&doc2),
        extract_duration_ms,
        ..Default::default()
    };

    // ── Step 4: Technical article ────────────────────────────────────────
    let article = match provider {
        Some(provider) => {
            stage_start(config, Stage::Article);
            let article_start = Instant::now();
            let article = generate_article(&provider, config).await?;
            stats.article_duration_ms = article_start.elapsed().as_millis() as u64;
            stats.total_input_tokens = article.input_tokens as u64;
            stats.total_output_tokens = article.output_tokens as u64;
            stage_complete(config, Stage::Article);
            Some(article)
        }
        None => None,
    };
    let bundle = article
        .clone()
        .map(|a| a.into_bundle())
        .unwrap_or_default();
    inject_article(&mut doc1, &mut doc2, bundle);

    // ── Step 5: Fill and write ───────────────────────────────────────────
    stats.fill = fill_and_write(template.path(), &doc1, &doc2, config).await?;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Magazine written to {} in {}ms",
        config.output_path.display(),
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(&config.output_path);
    }

    Ok(GenerationOutput {
        output_path: config.output_path.clone(),
        article,
        stats,
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    template: impl AsRef<str>,
    pdf1: impl AsRef<str>,
    pdf2: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, MagazineError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MagazineError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(template, pdf1, pdf2, config))
}

/// Extract the sections of both reports without touching a template.
///
/// Document 1 is fully extracted before document 2 starts. Extracted images
/// are written under [`GenerationConfig::image_dir_for`].
pub async fn extract_documents(
    pdf1: impl AsRef<str>,
    pdf2: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<ExtractedSections, MagazineError> {
    let first = resolve_input(pdf1.as_ref(), InputKind::Pdf, config.download_timeout_secs).await?;
    let second = resolve_input(pdf2.as_ref(), InputKind::Pdf, config.download_timeout_secs).await?;

    let mut maps = Vec::with_capacity(2);
    for (document, resolved) in [(1, &first), (2, &second)] {
        let stage = Stage::Extract { document };
        stage_start(config, stage);
        let dir = config.image_dir_for(document);
        maps.push(extract_sections(resolved.path(), &dir, document, config).await?);
        stage_complete(config, stage);
    }

    let doc2 = maps.pop().unwrap_or_default();
    let doc1 = maps.pop().unwrap_or_default();
    Ok(ExtractedSections { doc1, doc2 })
}

/// Fill `template` from already-extracted sections and write the magazine.
///
/// `article`, when given, replaces TECHNICAL ARTICLES in both maps the same
/// way [`generate`] does; pass `None` to keep the maps as they are.
pub async fn fill_magazine(
    template: impl AsRef<str>,
    mut doc1: SectionMap,
    mut doc2: SectionMap,
    article: Option<SectionBundle>,
    config: &GenerationConfig,
) -> Result<FillReport, MagazineError> {
    let template = resolve_input(template.as_ref(), InputKind::Docx, config.download_timeout_secs).await?;
    if let Some(bundle) = article {
        inject_article(&mut doc1, &mut doc2, bundle);
    }
    fill_and_write(template.path(), &doc1, &doc2, config).await
}

async fn fill_and_write(
    template: &Path,
    doc1: &SectionMap,
    doc2: &SectionMap,
    config: &GenerationConfig,
) -> Result<FillReport, MagazineError> {
    stage_start(config, Stage::Fill);
    let mut package = DocxPackage::open(template)?;
    let report = fill_template(
        &mut package,
        HeadingCatalog::standard(),
        doc1,
        doc2,
        config.image_width_in,
    )?;
    let bytes = package.to_bytes()?;
    stage_complete(config, Stage::Fill);

    stage_start(config, Stage::Write);
    write_atomic(&config.output_path, &bytes).await?;
    stage_complete(config, Stage::Write);
    Ok(report)
}

/// Write via a sibling temp file and rename, so readers never see a partial DOCX.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MagazineError> {
    let write_err = |e| MagazineError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

fn stage_start(config: &GenerationConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &GenerationConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage);
    }
}
