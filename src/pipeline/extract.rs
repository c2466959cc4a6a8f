//! Section extraction: bucket a PDF's text, tables and images by heading.
//!
//! ## Why a cursor instead of a document tree?
//!
//! Department reports have no real structure beyond a flat run of
//! upper-case headings, and a section simply lasts until the next heading
//! line. A single "current section" cursor, carried across page breaks,
//! reproduces that exactly. Heading lines move the cursor and are never
//! stored as content.
//!
//! ## Why are table-only sections text-blind?
//!
//! Sections like FUNDED PROJECTS are tables in the report. Their cells also
//! show up in the text layer, one flattened line per row. Keeping that text
//! would print every table twice (once as prose, mis-split), so lines under
//! a table-only heading are discarded and the content arrives through table
//! extraction instead. With `text_tables` enabled, those lines are instead
//! split by the heading's schema into one extra structured table.
//!
//! The extraction core ([`SectionExtractor`]) consumes [`PageContent`] values
//! and knows nothing about pdfium; [`extract_sections`] is the pdfium
//! backend feeding it.

use crate::config::GenerationConfig;
use crate::error::MagazineError;
use crate::headings::{Heading, HeadingCatalog};
use crate::pipeline::classify::classify_table;
use crate::pipeline::docx::xml_safe;
use crate::pipeline::layout::{find_tables, LayoutOptions, TextChunk};
use crate::pipeline::rows::structure_rows;
use crate::progress::ProgressCallback;
use crate::sections::{RawTable, SectionMap};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything the extractor needs from one page.
#[derive(Debug, Default)]
pub struct PageContent {
    /// Text lines in reading order (untrimmed is fine).
    pub lines: Vec<String>,
    /// Raw tables found on the page.
    pub tables: Vec<RawTable>,
    /// Embedded images; `Err` carries why an image could not be decoded.
    pub images: Vec<Result<DynamicImage, String>>,
}

/// Stateful per-document accumulator.
pub struct SectionExtractor<'a> {
    catalog: &'a HeadingCatalog,
    image_dir: PathBuf,
    image_prefix: String,
    text_tables: bool,
    cursor: Option<Heading>,
    image_count: usize,
    flattened: BTreeMap<Heading, Vec<String>>,
    sections: SectionMap,
}

impl<'a> SectionExtractor<'a> {
    /// `image_prefix` names written images `<prefix>_img_<n>.png`.
    pub fn new(
        catalog: &'a HeadingCatalog,
        image_dir: impl Into<PathBuf>,
        image_prefix: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            image_dir: image_dir.into(),
            image_prefix: image_prefix.into(),
            text_tables: false,
            cursor: None,
            image_count: 0,
            flattened: BTreeMap::new(),
            sections: SectionMap::new(catalog),
        }
    }

    /// Structure flattened rows under schema-bound headings into tables.
    pub fn text_tables(mut self, enabled: bool) -> Self {
        self.text_tables = enabled;
        self
    }

    /// The section the next text line would land in.
    pub fn cursor(&self) -> Option<Heading> {
        self.cursor
    }

    /// Feed one page, in document order.
    pub fn push_page(&mut self, page: PageContent) {
        for raw in &page.lines {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(heading) = self.catalog.normalize(line) {
                debug!("Section → {}", heading);
                self.cursor = Some(heading);
                continue;
            }

            let Some(current) = self.cursor else {
                continue;
            };

            if !self.catalog.is_table_only(current) {
                self.sections.bundle_mut(current).text.push(line.to_string());
            } else if self.text_tables && self.catalog.schema(current).is_some() {
                self.flattened
                    .entry(current)
                    .or_default()
                    .push(line.to_string());
            }
        }

        for table in page.tables {
            if table.is_blank() {
                continue;
            }
            match classify_table(self.catalog, &table) {
                Some(heading) => {
                    debug!("Table ({} rows) → {}", table.rows().len(), heading);
                    self.sections.bundle_mut(heading).tables.push(table);
                }
                None => debug!("Dropping unclassified table: {:?}", table.header()),
            }
        }

        let Some(current) = self.cursor else {
            return;
        };
        for image in page.images {
            self.image_count += 1;
            let path = self
                .image_dir
                .join(format!("{}_img_{}.png", self.image_prefix, self.image_count));
            let saved = image.and_then(|img| {
                img.save_with_format(&path, image::ImageFormat::Png)
                    .map_err(|e| e.to_string())
            });
            match saved {
                Ok(()) => self.sections.bundle_mut(current).images.push(path),
                Err(e) => warn!("Skipping image {}: {}", path.display(), e),
            }
        }
    }

    /// Finish the document and return its sections.
    pub fn finish(mut self) -> SectionMap {
        for (heading, lines) in std::mem::take(&mut self.flattened) {
            let Some(schema) = self.catalog.schema(heading) else {
                continue;
            };
            if let Some(table) = structure_rows(schema, lines.iter().map(String::as_str)) {
                debug!("Text-derived table ({} rows) → {}", table.body().len(), heading);
                self.sections.bundle_mut(heading).tables.push(table);
            }
        }
        self.sections
    }
}

/// Extract the sections of one PDF, writing its images under `image_dir`.
///
/// `document` (1 or 2) is only used for progress events.
pub async fn extract_sections(
    pdf_path: &Path,
    image_dir: &Path,
    document: usize,
    config: &GenerationConfig,
) -> Result<SectionMap, MagazineError> {
    tokio::fs::create_dir_all(image_dir)
        .await
        .map_err(|e| MagazineError::ImageDirFailed {
            path: image_dir.to_path_buf(),
            source: e,
        })?;

    let path = pdf_path.to_path_buf();
    let dir = image_dir.to_path_buf();
    let text_tables = config.text_tables;
    let layout = config.layout;
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        extract_sections_blocking(&path, &dir, document, text_tables, &layout, progress)
    })
    .await
    .map_err(|e| MagazineError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Bind pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the system.
pub fn bind_pdfium() -> Result<Pdfium, MagazineError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(lib),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| MagazineError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn extract_sections_blocking(
    pdf_path: &Path,
    image_dir: &Path,
    document: usize,
    text_tables: bool,
    layout: &LayoutOptions,
    progress: Option<ProgressCallback>,
) -> Result<SectionMap, MagazineError> {
    let pdfium = bind_pdfium()?;
    let pdf = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            MagazineError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        } else {
            MagazineError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let prefix = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("doc{document}"));
    let mut extractor = SectionExtractor::new(HeadingCatalog::standard(), image_dir, prefix)
        .text_tables(text_tables);

    let pages = pdf.pages();
    let total_pages = pages.len() as usize;
    info!("Extracting {} ({} pages)", pdf_path.display(), total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let content = read_page(pdf_path, idx + 1, &page, layout)?;
        debug!(
            "Page {}: {} lines, {} tables, {} images",
            idx + 1,
            content.lines.len(),
            content.tables.len(),
            content.images.len()
        );
        extractor.push_page(content);
        if let Some(ref cb) = progress {
            cb.on_page_scanned(document, idx + 1, total_pages);
        }
    }

    Ok(extractor.finish())
}

/// Pull lines, layout tables and images out of one pdfium page.
fn read_page(
    pdf_path: &Path,
    page_num: usize,
    page: &PdfPage,
    layout: &LayoutOptions,
) -> Result<PageContent, MagazineError> {
    let text = page.text().map_err(|e| MagazineError::PageTextFailed {
        path: pdf_path.to_path_buf(),
        page: page_num,
        detail: format!("{:?}", e),
    })?;

    let lines = text
        .all()
        .lines()
        .map(|l| xml_safe(l.trim_end_matches('\r')).into_owned())
        .collect();

    let chunks = page_chunks(&text);
    let tables = find_tables(&chunks, layout);

    let images = page
        .objects()
        .iter()
        .filter_map(|object| {
            object
                .as_image_object()
                .map(|img| img.get_raw_image().map_err(|e| format!("{:?}", e)))
        })
        .collect();

    Ok(PageContent {
        lines,
        tables,
        images,
    })
}

/// Gap, in multiples of the font size, that separates two chunks on a line.
const CHUNK_GAP_EM: f32 = 1.0;

/// Group a page's characters into [`TextChunk`]s.
///
/// A chunk ends at a line break, a baseline jump, or a horizontal gap wider
/// than [`CHUNK_GAP_EM`]. Whitespace characters never extend a chunk's
/// bounds, so word spaces inside a cell keep it whole while the wide gaps
/// between columns split it.
fn page_chunks(text: &PdfPageText) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut current: Option<TextChunk> = None;
    let mut font_size = 0.0f32;

    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c == '\n' || c == '\r' {
            chunks.extend(current.take());
            continue;
        }
        if c.is_whitespace() {
            if let Some(ref mut chunk) = current {
                chunk.text.push(' ');
            }
            continue;
        }
        // U+0002 soft hyphens and other markers
        if c.is_control() {
            continue;
        }
        let Ok(bounds) = ch.tight_bounds() else {
            continue;
        };
        let (left, right) = (bounds.left().value, bounds.right().value);
        let (top, bottom) = (bounds.top().value, bounds.bottom().value);
        let size = ch.scaled_font_size().value.max(1.0);

        let breaks = current.as_ref().is_some_and(|chunk| {
            (chunk.top - top).abs() > size * 0.5 || left - chunk.right > font_size.max(size) * CHUNK_GAP_EM
        });
        if breaks {
            chunks.extend(current.take());
        }

        match current {
            Some(ref mut chunk) => {
                chunk.text.push(c);
                chunk.right = chunk.right.max(right);
                chunk.bottom = chunk.bottom.min(bottom);
            }
            None => {
                current = Some(TextChunk {
                    text: c.to_string(),
                    left,
                    right,
                    top,
                    bottom,
                });
            }
        }
        font_size = size;
    }
    chunks.extend(current);

    for chunk in &mut chunks {
        let trimmed = chunk.text.trim_end().len();
        chunk.text.truncate(trimmed);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn page(lines: &[&str]) -> PageContent {
        PageContent {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    fn extractor(dir: &Path) -> SectionExtractor<'static> {
        SectionExtractor::new(HeadingCatalog::standard(), dir, "report.pdf")
    }

    fn pixel() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 128, 255, 255])))
    }

    #[test]
    fn text_is_bucketed_under_the_current_heading() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = extractor(dir.path());
        ex.push_page(page(&[
            "Annual Report 2024",
            "FROM THE HOD'S DESK:",
            "  Welcome to the new academic year.  ",
            "",
            "DEPARTMENT EVENTS:",
            "Hackathon held in March.",
        ]));
        let map = ex.finish();

        assert_eq!(
            map.bundle(Heading::HodDesk).text,
            vec!["Welcome to the new academic year."]
        );
        assert_eq!(
            map.bundle(Heading::DepartmentEvents).text,
            vec!["Hackathon held in March."]
        );
        // Text before the first heading has nowhere to go.
        assert!(map.iter().all(|(_, b)| !b.text.contains(&"Annual Report 2024".to_string())));
    }

    #[test]
    fn cursor_carries_across_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = extractor(dir.path());
        ex.push_page(page(&["FACULTY ACHIEVEMENTS:", "Dr. Rao promoted."]));
        assert_eq!(ex.cursor(), Some(Heading::FacultyAchievements));
        ex.push_page(page(&["Prof. Iyer awarded fellowship."]));
        let map = ex.finish();
        assert_eq!(map.bundle(Heading::FacultyAchievements).text.len(), 2);
    }

    #[test]
    fn table_only_text_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = extractor(dir.path());
        ex.push_page(page(&[
            "FUNDED PROJECTS:",
            "Smart Irrigation KSCST 50000 Dr.Rao",
            "PATENTS:",
            "Solar dryer Published 2023410001",
        ]));
        let map = ex.finish();
        assert!(map.bundle(Heading::FundedProjects).is_empty());
        assert!(map.bundle(Heading::Patents).is_empty());
    }

    #[test]
    fn text_tables_structure_schema_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = extractor(dir.path()).text_tables(true);
        ex.push_page(page(&[
            "FUNDED PROJECTS:",
            "Smart Irrigation KSCST 50000 Dr.Rao",
            "AICTE",
            "STUDENT PUBLICATIONS:",
            "no schema here so this is dropped",
        ]));
        let map = ex.finish();

        let funded = map.bundle(Heading::FundedProjects);
        assert!(funded.text.is_empty());
        assert_eq!(funded.tables.len(), 1);
        assert_eq!(funded.tables[0].body().len(), 1);
        assert_eq!(funded.tables[0].header()[0].as_deref(), Some("Project Title"));
        assert!(map.bundle(Heading::StudentPublications).is_empty());
    }

    #[test]
    fn tables_are_classified_blank_and_unknown_ones_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = extractor(dir.path());
        ex.push_page(PageContent {
            lines: vec!["DEPARTMENT EVENTS:".into()],
            tables: vec![
                RawTable::from_strings([vec!["Title", "Funding Agency"], vec!["Drone", "DST"]]),
                RawTable::new(vec![vec![None, None], vec![Some(" ".into()), None]]),
                RawTable::from_strings([vec!["Date", "Event"], vec!["1 Mar", "Expo"]]),
            ],
            images: vec![],
        });
        let map = ex.finish();

        // Classification ignores the text cursor.
        assert_eq!(map.bundle(Heading::FundedProjects).tables.len(), 1);
        assert!(map.bundle(Heading::DepartmentEvents).tables.is_empty());
        let total: usize = map.iter().map(|(_, b)| b.tables.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn images_need_a_cursor_and_use_a_document_wide_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut ex = extractor(dir.path());

        ex.push_page(PageContent {
            lines: vec!["Cover".into()],
            tables: vec![],
            images: vec![Ok(pixel())],
        });
        ex.push_page(PageContent {
            lines: vec!["DEPARTMENT EVENTS:".into()],
            tables: vec![],
            images: vec![Ok(pixel()), Err("unsupported filter".into())],
        });
        ex.push_page(PageContent {
            lines: vec![],
            tables: vec![],
            images: vec![Ok(pixel())],
        });
        let map = ex.finish();

        let images = &map.bundle(Heading::DepartmentEvents).images;
        assert_eq!(
            images,
            &vec![
                dir.path().join("report.pdf_img_1.png"),
                dir.path().join("report.pdf_img_3.png"),
            ]
        );
        assert!(images.iter().all(|p| p.exists()));
        assert!(!dir.path().join("report.pdf_img_2.png").exists());
    }

    #[test]
    fn unwritable_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does/not/exist");
        let mut ex = extractor(&missing);
        ex.push_page(PageContent {
            lines: vec!["DEPARTMENT EVENTS:".into(), "Expo".into()],
            tables: vec![],
            images: vec![Ok(pixel())],
        });
        let map = ex.finish();
        assert!(map.bundle(Heading::DepartmentEvents).images.is_empty());
        assert_eq!(map.bundle(Heading::DepartmentEvents).text, vec!["Expo"]);
    }
}
