//! Per-document section accumulators.

use crate::headings::{Heading, HeadingCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A rectangular grid of nullable cells. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Build from plain strings; empty strings become `None`.
    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        let cell: String = cell.into();
                        (!cell.is_empty()).then_some(cell)
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// The header row, or an empty slice for a table with no rows.
    pub fn header(&self) -> &[Option<String>] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every row after the header.
    pub fn body(&self) -> &[Vec<Option<String>>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// True when no cell anywhere holds non-whitespace text.
    pub fn is_blank(&self) -> bool {
        !self
            .rows
            .iter()
            .flatten()
            .any(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty()))
    }
}

/// The (text, tables, images) accumulator for one heading of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBundle {
    pub text: Vec<String>,
    pub tables: Vec<RawTable>,
    pub images: Vec<PathBuf>,
}

impl SectionBundle {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tables.is_empty() && self.images.is_empty()
    }
}

/// One bundle per canonical heading, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMap {
    sections: BTreeMap<Heading, SectionBundle>,
}

impl SectionMap {
    /// An empty bundle for every heading of `catalog`.
    pub fn new(catalog: &HeadingCatalog) -> Self {
        let sections = catalog
            .specs()
            .iter()
            .map(|s| (s.heading, SectionBundle::default()))
            .collect();
        Self { sections }
    }

    pub fn get(&self, heading: Heading) -> Option<&SectionBundle> {
        self.sections.get(&heading)
    }

    /// The bundle for `heading`, or an empty one if the map has no entry.
    pub fn bundle(&self, heading: Heading) -> &SectionBundle {
        static EMPTY: SectionBundle = SectionBundle {
            text: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
        };
        self.sections.get(&heading).unwrap_or(&EMPTY)
    }

    pub(crate) fn bundle_mut(&mut self, heading: Heading) -> &mut SectionBundle {
        self.sections.entry(heading).or_default()
    }

    /// Replace the bundle for `heading` wholesale.
    pub fn replace(&mut self, heading: Heading, bundle: SectionBundle) {
        self.sections.insert(heading, bundle);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Heading, &SectionBundle)> {
        self.sections.iter().map(|(h, b)| (*h, b))
    }
}

/// Apply the AI article to the two extracted documents.
///
/// Document 1 carries the article under `TECHNICAL ARTICLES:`; document 2's
/// bundle for that heading is cleared. Whatever either PDF held under that
/// heading is discarded.
pub fn inject_article(doc1: &mut SectionMap, doc2: &mut SectionMap, article: SectionBundle) {
    doc1.replace(Heading::TechnicalArticles, article);
    doc2.replace(Heading::TechnicalArticles, SectionBundle::default());
}
