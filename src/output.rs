//! Result types returned by the top-level API.

use crate::pipeline::article::GeneratedArticle;
use crate::pipeline::fill::FillReport;
use crate::sections::SectionMap;
use serde::Serialize;
use std::path::PathBuf;

/// What one magazine run produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    /// Where the DOCX was written.
    pub output_path: PathBuf,
    /// The article, when the AI step ran.
    pub article: Option<GeneratedArticle>,
    pub stats: GenerationStats,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Text lines, tables and images found per source document.
    pub doc1: SectionCounts,
    pub doc2: SectionCounts,
    pub fill: FillReport,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub extract_duration_ms: u64,
    pub article_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Content totals over every section of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionCounts {
    pub text_lines: usize,
    pub tables: usize,
    pub images: usize,
    /// Headings with any content.
    pub populated_sections: usize,
}

impl SectionCounts {
    pub fn of(map: &SectionMap) -> Self {
        map.iter().fold(Self::default(), |mut acc, (_, bundle)| {
            acc.text_lines += bundle.text.len();
            acc.tables += bundle.tables.len();
            acc.images += bundle.images.len();
            acc.populated_sections += usize::from(!bundle.is_empty());
            acc
        })
    }
}

/// Both documents' sections, as dumped by `--sections-json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedSections {
    pub doc1: SectionMap,
    pub doc2: SectionMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headings::{Heading, HeadingCatalog};
    use crate::sections::{RawTable, SectionBundle};

    #[test]
    fn counts_sum_every_section() {
        let mut map = SectionMap::new(HeadingCatalog::standard());
        map.replace(
            Heading::HodDesk,
            SectionBundle {
                text: vec!["a".into(), "b".into()],
                ..Default::default()
            },
        );
        map.replace(
            Heading::Patents,
            SectionBundle {
                tables: vec![RawTable::from_strings([["Title", "Application"]])],
                images: vec!["p.png".into()],
                ..Default::default()
            },
        );
        let counts = SectionCounts::of(&map);
        assert_eq!(
            counts,
            SectionCounts {
                text_lines: 2,
                tables: 1,
                images: 1,
                populated_sections: 2,
            }
        );
    }

    #[test]
    fn stats_serialise() {
        let json = serde_json::to_value(GenerationStats::default()).unwrap();
        assert_eq!(json["fill"]["tables_inserted"], 0);
        assert_eq!(json["doc1"]["text_lines"], 0);
    }
}
