//! Minimal WordprocessingML package editing.
//!
//! A DOCX is a ZIP of XML parts. Filling a template only ever *adds* body
//! elements after existing paragraphs, plus image parts and their
//! relationships, so the editor never re-serialises the document tree:
//! `word/document.xml` is scanned once with `quick-xml` to find each
//! body-level paragraph's end offset and text, and new elements are spliced
//! in as strings at those offsets. Bytes outside the insertion points are
//! left exactly as the template had them.

use crate::error::MagazineError;
use crate::pipeline::merge::MergedTable;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

// ── Package ──────────────────────────────────────────────────────────────

/// An opened DOCX, held in memory part by part in archive order.
pub struct DocxPackage {
    source: PathBuf,
    parts: Vec<(String, Vec<u8>)>,
    images_added: usize,
}

impl DocxPackage {
    pub fn open(path: &Path) -> Result<Self, MagazineError> {
        let bytes = std::fs::read(path).map_err(|e| MagazineError::TemplateInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_bytes(path, &bytes)
    }

    /// `source` is only used in error messages.
    pub fn from_bytes(source: &Path, bytes: &[u8]) -> Result<Self, MagazineError> {
        let invalid = |detail: String| MagazineError::TemplateInvalid {
            path: source.to_path_buf(),
            detail,
        };

        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| invalid(format!("not a ZIP: {e}")))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| invalid(format!("entry {i}: {e}")))?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| invalid(format!("{}: {e}", file.name())))?;
            parts.push((file.name().to_string(), data));
        }

        let package = Self {
            source: source.to_path_buf(),
            parts,
            images_added: 0,
        };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(invalid(format!("missing {DOCUMENT_PART}")));
        }
        Ok(package)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    /// Replace a part, or append it if the package lacks one.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    fn part_string(&self, name: &str) -> Result<String, MagazineError> {
        let data = self.part(name).ok_or_else(|| MagazineError::TemplateInvalid {
            path: self.source.clone(),
            detail: format!("missing {name}"),
        })?;
        String::from_utf8(data.to_vec()).map_err(|e| MagazineError::TemplateInvalid {
            path: self.source.clone(),
            detail: format!("{name} is not UTF-8: {e}"),
        })
    }

    /// Parse `word/document.xml` for editing.
    pub fn body(&self) -> Result<DocumentBody, MagazineError> {
        let xml = self.part_string(DOCUMENT_PART)?;
        DocumentBody::parse(xml).map_err(|detail| MagazineError::TemplateInvalid {
            path: self.source.clone(),
            detail,
        })
    }

    pub fn set_body(&mut self, body: DocumentBody) {
        self.set_part(DOCUMENT_PART, body.into_xml().into_bytes());
    }

    /// Store a PNG as a new media part and return its relationship id.
    pub fn add_png(&mut self, png: Vec<u8>) -> Result<String, MagazineError> {
        let mut n = self.images_added + 1;
        while self
            .part(&format!("word/media/automag_image{n}.png"))
            .is_some()
        {
            n += 1;
        }
        self.images_added = n;

        let rel_id = format!("rIdAutomag{n}");
        let target = format!("media/automag_image{n}.png");
        self.set_part(&format!("word/{target}"), png);

        let rel = format!(r#"<Relationship Id="{rel_id}" Type="{IMAGE_REL_TYPE}" Target="{target}"/>"#);
        let rels = match self.part(RELS_PART) {
            Some(_) => insert_before_close(&self.part_string(RELS_PART)?, "</Relationships>", &rel)
                .ok_or_else(|| MagazineError::TemplateInvalid {
                    path: self.source.clone(),
                    detail: format!("{RELS_PART} has no closing Relationships tag"),
                })?,
            None => format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rel}</Relationships>"#
            ),
        };
        self.set_part(RELS_PART, rels.into_bytes());

        let types = self.part_string(CONTENT_TYPES_PART)?;
        if !types.contains(r#"Extension="png""#) {
            let png_default = r#"<Default Extension="png" ContentType="image/png"/>"#;
            let updated = insert_before_close(&types, "</Types>", png_default).ok_or_else(|| {
                MagazineError::TemplateInvalid {
                    path: self.source.clone(),
                    detail: format!("{CONTENT_TYPES_PART} has no closing Types tag"),
                }
            })?;
            self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        }

        debug!("Added image part {} as {}", target, rel_id);
        Ok(rel_id)
    }

    /// Serialise the package back into a ZIP.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MagazineError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            if name.ends_with('/') {
                writer.add_directory(name.as_str(), options)?;
                continue;
            }
            writer.start_file(name.as_str(), options)?;
            writer
                .write_all(data)
                .map_err(|e| MagazineError::Internal(format!("zip write {name}: {e}")))?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

fn insert_before_close(xml: &str, close_tag: &str, fragment: &str) -> Option<String> {
    let at = xml.rfind(close_tag)?;
    let mut out = String::with_capacity(xml.len() + fragment.len());
    out.push_str(&xml[..at]);
    out.push_str(fragment);
    out.push_str(&xml[at..]);
    Some(out)
}

// ── Document body ────────────────────────────────────────────────────────

/// A paragraph that is a direct child of `w:body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyParagraph {
    /// Byte offset just past the paragraph's closing tag.
    pub end: usize,
    /// Concatenated `w:t` text, unescaped.
    pub text: String,
}

/// Where the next element goes: after the anchor paragraph and after
/// `position` elements already inserted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertCursor {
    anchor: usize,
    position: usize,
}

/// `word/document.xml` plus pending insertions.
pub struct DocumentBody {
    xml: String,
    paragraphs: Vec<BodyParagraph>,
    inserts: BTreeMap<usize, Vec<String>>,
    /// Highest drawing id handed out so far, template ids included.
    last_drawing_id: usize,
}

impl DocumentBody {
    pub fn parse(xml: String) -> Result<Self, String> {
        let scan = scan_body(&xml)?;
        Ok(Self {
            xml,
            paragraphs: scan.paragraphs,
            inserts: BTreeMap::new(),
            last_drawing_id: scan.max_drawing_id,
        })
    }

    /// A `wp:docPr` id not used by the template or an earlier call.
    pub fn next_drawing_id(&mut self) -> usize {
        self.last_drawing_id += 1;
        self.last_drawing_id
    }

    /// Body-level paragraphs in document order.
    pub fn paragraphs(&self) -> &[BodyParagraph] {
        &self.paragraphs
    }

    /// A cursor directly after `paragraph`.
    pub fn cursor_after(&self, paragraph: &BodyParagraph) -> InsertCursor {
        InsertCursor {
            anchor: paragraph.end,
            position: 0,
        }
    }

    /// Insert `element` at `cursor` and return the cursor just after it.
    pub fn insert_after(&mut self, cursor: InsertCursor, element: String) -> InsertCursor {
        let slot = self.inserts.entry(cursor.anchor).or_default();
        let at = cursor.position.min(slot.len());
        slot.insert(at, element);
        InsertCursor {
            anchor: cursor.anchor,
            position: at + 1,
        }
    }

    /// Number of elements inserted so far.
    pub fn inserted(&self) -> usize {
        self.inserts.values().map(Vec::len).sum()
    }

    pub fn into_xml(self) -> String {
        let extra: usize = self.inserts.values().flatten().map(String::len).sum();
        let mut out = String::with_capacity(self.xml.len() + extra);
        let mut last = 0;
        for (offset, elements) in &self.inserts {
            out.push_str(&self.xml[last..*offset]);
            for element in elements {
                out.push_str(element);
            }
            last = *offset;
        }
        out.push_str(&self.xml[last..]);
        out
    }
}

struct BodyScan {
    paragraphs: Vec<BodyParagraph>,
    max_drawing_id: usize,
}

fn drawing_id(e: &BytesStart) -> Option<usize> {
    if e.local_name().as_ref() != b"docPr" {
        return None;
    }
    let attr = e.try_get_attribute("id").ok()??;
    std::str::from_utf8(&attr.value).ok()?.trim().parse().ok()
}

fn scan_body(xml: &str) -> Result<BodyScan, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut max_drawing_id = 0;
    let mut current: Option<String> = None;
    // Open `w:p` elements inside the current body paragraph, itself included.
    // Text boxes nest whole paragraphs; only depth 1 text belongs to it.
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                let parent_is_body = stack.last().is_some_and(|p| p == b"w:body");
                if name == b"w:p" {
                    if parent_is_body {
                        current = Some(String::new());
                        depth = 1;
                    } else if current.is_some() {
                        depth += 1;
                    }
                } else if name == b"w:t" && current.is_some() && depth == 1 {
                    in_text = true;
                }
                if let Some(id) = drawing_id(&e) {
                    max_drawing_id = max_drawing_id.max(id);
                }
                stack.push(name);
            }
            Ok(Event::Empty(e)) => {
                let parent_is_body = stack.last().is_some_and(|p| p == b"w:body");
                if e.name().as_ref() == b"w:p" && parent_is_body {
                    paragraphs.push(BodyParagraph {
                        end: reader.buffer_position(),
                        text: String::new(),
                    });
                }
                if let Some(id) = drawing_id(&e) {
                    max_drawing_id = max_drawing_id.max(id);
                }
            }
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(ref mut buf) = current {
                    buf.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                stack.pop();
                let name = e.name();
                if name.as_ref() == b"w:t" {
                    in_text = false;
                } else if name.as_ref() == b"w:p" {
                    let parent_is_body = stack.last().is_some_and(|p| p == b"w:body");
                    if parent_is_body {
                        if let Some(text) = current.take() {
                            paragraphs.push(BodyParagraph {
                                end: reader.buffer_position(),
                                text,
                            });
                        }
                        depth = 0;
                    } else if current.is_some() {
                        depth = depth.saturating_sub(1);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(BodyScan {
        paragraphs,
        max_drawing_id,
    })
}

// ── Element builders ─────────────────────────────────────────────────────

/// Drop characters outside the XML 1.0 `Char` production.
///
/// pdfium text carries C0 controls (U+0002 soft hyphens, U+000C form feeds)
/// that Word rejects as a corrupt document.
pub fn xml_safe(text: &str) -> Cow<'_, str> {
    fn allowed(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
    }
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| allowed(c)).collect())
    }
}

fn run(text: &str, props: &str) -> String {
    format!(
        r#"<w:r>{props}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(&xml_safe(text))
    )
}

/// A plain paragraph.
pub fn paragraph_xml(text: &str) -> String {
    format!("<w:p>{}</w:p>", run(text, ""))
}

/// A bold 16 pt paragraph, used for the article title.
pub fn title_xml(text: &str) -> String {
    format!(
        "<w:p>{}</w:p>",
        run(text, r#"<w:rPr><w:b/><w:sz w:val="32"/></w:rPr>"#)
    )
}

const BORDER: &str = r#"w:val="single" w:sz="8" w:space="0" w:color="000000""#;

/// A bordered table: header row then data rows, `header.len()` columns wide.
pub fn table_xml(table: &MergedTable) -> String {
    let width = table.header.len().max(1);
    let mut xml = String::from("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        xml.push_str(&format!("<w:{edge} {BORDER}/>"));
    }
    xml.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
    for _ in 0..width {
        xml.push_str("<w:gridCol/>");
    }
    xml.push_str("</w:tblGrid>");

    for row in std::iter::once(&table.header).chain(table.rows.iter()) {
        xml.push_str("<w:tr>");
        for i in 0..width {
            let text = row.get(i).and_then(|c| c.as_deref()).unwrap_or("");
            xml.push_str(&format!("<w:tc><w:tcPr><w:tcW w:w=\"0\" w:type=\"auto\"/></w:tcPr><w:p>{}</w:p></w:tc>", run(text, "")));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// An inline picture paragraph for relationship `rel_id`.
///
/// `id` must be unique among drawings in the document.
pub fn picture_xml(rel_id: &str, id: usize, cx: u64, cy: u64) -> String {
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing>"#,
            r#"<wp:inline xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="automag_image{id}.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline>"#,
            r#"</w:drawing></w:r></w:p>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        rel = rel_id,
    )
}

/// Display extent in EMU for an image `width_px` × `height_px` shown
/// `width_in` inches wide.
pub fn extent_emu(width_px: u32, height_px: u32, width_in: f64) -> (u64, u64) {
    let cx = (width_in * EMU_PER_INCH).round();
    let cy = if width_px == 0 {
        cx
    } else {
        (cx * height_px as f64 / width_px as f64).round()
    };
    (cx as u64, cy as u64)
}
