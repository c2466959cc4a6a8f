//! Template filling: place both documents' sections after matching headings.
//!
//! The template's body paragraphs are walked once in order. A paragraph whose
//! text normalises to a heading becomes an anchor, and that heading's content
//! is inserted after it through an [`InsertCursor`] that advances with every
//! insertion, so content reads in the order it was inserted. Paragraphs that
//! are not headings are never touched.

use crate::error::MagazineError;
use crate::headings::{Heading, HeadingCatalog};
use crate::pipeline::docx::{
    extent_emu, paragraph_xml, picture_xml, table_xml, title_xml, DocumentBody, DocxPackage,
    InsertCursor,
};
use crate::pipeline::merge::merge_tables;
use crate::sections::{SectionBundle, SectionMap};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// What the filler inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// Template paragraphs recognised as headings.
    pub headings_matched: usize,
    pub paragraphs_inserted: usize,
    pub tables_inserted: usize,
    pub images_inserted: usize,
    /// Images that could not be read or decoded.
    pub images_skipped: usize,
}

struct Filler<'a> {
    package: &'a mut DocxPackage,
    body: DocumentBody,
    image_width_in: f64,
    report: FillReport,
}

impl Filler<'_> {
    fn paragraph(&mut self, cursor: InsertCursor, text: &str) -> InsertCursor {
        self.report.paragraphs_inserted += 1;
        self.body.insert_after(cursor, paragraph_xml(text))
    }

    fn image(&mut self, cursor: InsertCursor, path: &Path) -> Result<InsertCursor, MagazineError> {
        let decoded = image::open(path).and_then(|img| {
            let mut png = Cursor::new(Vec::new());
            img.write_to(&mut png, image::ImageFormat::Png)?;
            Ok((img.width(), img.height(), png.into_inner()))
        });
        let (w, h, png) = match decoded {
            Ok(d) => d,
            Err(e) => {
                warn!("Skipping image {}: {}", path.display(), e);
                self.report.images_skipped += 1;
                return Ok(cursor);
            }
        };

        let rel_id = self.package.add_png(png)?;
        self.report.images_inserted += 1;
        let (cx, cy) = extent_emu(w, h, self.image_width_in);
        let id = self.body.next_drawing_id();
        Ok(self.body.insert_after(cursor, picture_xml(&rel_id, id, cx, cy)))
    }

    /// Title, image, then the remaining paragraphs.
    fn article(&mut self, mut cursor: InsertCursor, bundle: &SectionBundle) -> Result<(), MagazineError> {
        let mut text = bundle.text.iter();
        if let Some(title) = text.next() {
            self.report.paragraphs_inserted += 1;
            cursor = self.body.insert_after(cursor, title_xml(title));
        }
        if let Some(image) = bundle.images.first() {
            cursor = self.image(cursor, image)?;
        }
        for line in text {
            cursor = self.paragraph(cursor, line);
        }
        Ok(())
    }

    /// Text then images per document, then the merged tables. Table-only
    /// headings take no images, so their tables follow the heading directly.
    fn section(
        &mut self,
        mut cursor: InsertCursor,
        table_only: bool,
        doc1: &SectionBundle,
        doc2: &SectionBundle,
    ) -> Result<(), MagazineError> {
        for bundle in [doc1, doc2] {
            for line in &bundle.text {
                cursor = self.paragraph(cursor, line);
            }
            if table_only {
                if !bundle.images.is_empty() {
                    debug!("Not placing {} images under a table-only heading", bundle.images.len());
                }
                continue;
            }
            for image in &bundle.images {
                cursor = self.image(cursor, image)?;
            }
        }
        for table in merge_tables(doc1.tables.iter().chain(doc2.tables.iter())) {
            debug!("Inserting table with {} rows", table.rows.len());
            self.report.tables_inserted += 1;
            cursor = self.body.insert_after(cursor, table_xml(&table));
        }
        Ok(())
    }
}

/// Fill `package` in place from the two documents' sections.
///
/// `doc1` is expected to carry the article bundle already
/// ([`crate::sections::inject_article`]); TECHNICAL ARTICLES reads `doc1` only.
pub fn fill_template(
    package: &mut DocxPackage,
    catalog: &HeadingCatalog,
    doc1: &SectionMap,
    doc2: &SectionMap,
    image_width_in: f64,
) -> Result<FillReport, MagazineError> {
    let body = package.body()?;
    let anchors: Vec<_> = body
        .paragraphs()
        .iter()
        .filter_map(|p| catalog.normalize(&p.text).map(|h| (h, body.cursor_after(p))))
        .collect();

    let mut filler = Filler {
        package,
        body,
        image_width_in,
        report: FillReport::default(),
    };

    for (heading, cursor) in anchors {
        filler.report.headings_matched += 1;
        debug!("Template anchor: {}", heading);
        match heading {
            Heading::TechnicalArticles => filler.article(cursor, doc1.bundle(heading))?,
            _ => filler.section(
                cursor,
                catalog.is_table_only(heading),
                doc1.bundle(heading),
                doc2.bundle(heading),
            )?,
        }
    }

    let Filler { package, body, report, .. } = filler;
    package.set_body(body);
    info!(
        "Filled {} headings: {} paragraphs, {} tables, {} images",
        report.headings_matched,
        report.paragraphs_inserted,
        report.tables_inserted,
        report.images_inserted
    );
    Ok(report)
}
