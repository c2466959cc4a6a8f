//! The canonical heading vocabulary shared by the extractor and the filler.
//!
//! Section boundaries in the source PDFs and insertion anchors in the
//! template are both recognised by the same literal labels, so the labels,
//! the "table-only" flags, the flattened-row schemas and the table
//! classifier's keyword rules all live in one immutable [`HeadingCatalog`].
//! Every pipeline stage takes `&HeadingCatalog` instead of carrying its own
//! string literals.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed section labels of the magazine.
///
/// The declaration order is the catalog order; section maps iterate in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Heading {
    HodDesk,
    DepartmentEvents,
    FacultyAchievements,
    FacultyJournals,
    FacultyConferences,
    FundedProjects,
    Patents,
    StudentPublications,
    StudentAchievements,
    PlacementRecord,
    TechnicalArticles,
}

impl Heading {
    /// Every heading, in catalog order.
    pub const ALL: [Heading; 11] = [
        Heading::HodDesk,
        Heading::DepartmentEvents,
        Heading::FacultyAchievements,
        Heading::FacultyJournals,
        Heading::FacultyConferences,
        Heading::FundedProjects,
        Heading::Patents,
        Heading::StudentPublications,
        Heading::StudentAchievements,
        Heading::PlacementRecord,
        Heading::TechnicalArticles,
    ];

    /// The literal label as it appears in reports and templates.
    pub fn label(self) -> &'static str {
        match self {
            Heading::HodDesk => "FROM THE HOD'S DESK:",
            Heading::DepartmentEvents => "DEPARTMENT EVENTS:",
            Heading::FacultyAchievements => "FACULTY ACHIEVEMENTS:",
            Heading::FacultyJournals => {
                "FACULTY PUBLICATIONS IN (NATIONAL / INTERNATIONAL) JOURNALS:"
            }
            Heading::FacultyConferences => {
                "FACULTY PUBLICATIONS IN (NATIONAL / INTERNATIONAL) CONFERENCES:"
            }
            Heading::FundedProjects => "FUNDED PROJECTS:",
            Heading::Patents => "PATENTS:",
            Heading::StudentPublications => "STUDENT PUBLICATIONS:",
            Heading::StudentAchievements => "STUDENT ACHIEVEMENTS:",
            Heading::PlacementRecord => "PLACEMENT AND HIGHER STUDIES RECORD:",
            Heading::TechnicalArticles => "TECHNICAL ARTICLES:",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Column layout for tables whose rows arrive as one flattened text line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    /// Header cells of the structured table.
    pub columns: &'static [&'static str],
    /// How many trailing whitespace-separated tokens become their own column.
    /// Everything before them is the first column.
    pub split_from_right: usize,
}

/// Per-heading entry of the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct HeadingSpec {
    pub heading: Heading,
    /// Content is expected only through table extraction; free text under
    /// this heading is discarded.
    pub table_only: bool,
    pub schema: Option<TableSchema>,
}

/// A keyword rule of the table classifier. Any keyword matching the
/// lowercased header routes the table to `heading`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierRule {
    pub keywords: &'static [&'static str],
    pub heading: Heading,
}

/// Immutable heading → behaviour table.
#[derive(Debug, Clone, Serialize)]
pub struct HeadingCatalog {
    specs: Vec<HeadingSpec>,
    rules: Vec<ClassifierRule>,
}

static STANDARD: Lazy<HeadingCatalog> = Lazy::new(HeadingCatalog::build_standard);

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

impl HeadingCatalog {
    /// The magazine's vocabulary.
    pub fn standard() -> &'static HeadingCatalog {
        &STANDARD
    }

    fn build_standard() -> HeadingCatalog {
        let spec = |heading, table_only, schema| HeadingSpec {
            heading,
            table_only,
            schema,
        };
        let specs = vec![
            spec(Heading::HodDesk, false, None),
            spec(Heading::DepartmentEvents, false, None),
            spec(Heading::FacultyAchievements, false, None),
            spec(Heading::FacultyJournals, true, None),
            spec(Heading::FacultyConferences, true, None),
            spec(
                Heading::FundedProjects,
                true,
                Some(TableSchema {
                    columns: &["Project Title", "Funding Agency", "Amount", "Faculty PI"],
                    split_from_right: 3,
                }),
            ),
            spec(
                Heading::Patents,
                true,
                Some(TableSchema {
                    columns: &["Patent Title", "Status", "Application Number"],
                    split_from_right: 2,
                }),
            ),
            spec(Heading::StudentPublications, true, None),
            spec(
                Heading::StudentAchievements,
                true,
                Some(TableSchema {
                    columns: &["Sl. No", "Name", "USN", "Sem", "Activity", "Award/Honor", "Level"],
                    split_from_right: 6,
                }),
            ),
            spec(
                Heading::PlacementRecord,
                true,
                Some(TableSchema {
                    columns: &["Sl. No", "Name", "USN", "Program", "University", "Place"],
                    split_from_right: 4,
                }),
            ),
            spec(Heading::TechnicalArticles, false, None),
        ];

        // Order matters: a header mentioning both "award" and "application"
        // lands in PATENTS.
        let rules = vec![
            ClassifierRule {
                keywords: &["journal"],
                heading: Heading::FacultyJournals,
            },
            ClassifierRule {
                keywords: &["conference"],
                heading: Heading::FacultyConferences,
            },
            ClassifierRule {
                keywords: &["funding agency"],
                heading: Heading::FundedProjects,
            },
            ClassifierRule {
                keywords: &["application"],
                heading: Heading::Patents,
            },
            ClassifierRule {
                keywords: &["publication"],
                heading: Heading::StudentPublications,
            },
            ClassifierRule {
                keywords: &["award"],
                heading: Heading::StudentAchievements,
            },
            ClassifierRule {
                keywords: &["placed", "package"],
                heading: Heading::PlacementRecord,
            },
        ];

        HeadingCatalog { specs, rules }
    }

    /// Every heading spec, in catalog order.
    pub fn specs(&self) -> &[HeadingSpec] {
        &self.specs
    }

    /// Classifier rules in priority order.
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    pub fn spec(&self, heading: Heading) -> Option<&HeadingSpec> {
        self.specs.iter().find(|s| s.heading == heading)
    }

    pub fn is_table_only(&self, heading: Heading) -> bool {
        self.spec(heading).is_some_and(|s| s.table_only)
    }

    pub fn schema(&self, heading: Heading) -> Option<&TableSchema> {
        self.spec(heading).and_then(|s| s.schema.as_ref())
    }

    /// Map a line of text to the heading it spells, if any.
    ///
    /// Leading/trailing whitespace is ignored and internal whitespace runs
    /// count as one space; the comparison itself is case-sensitive.
    pub fn normalize(&self, line: &str) -> Option<Heading> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        let collapsed = RE_WHITESPACE.replace_all(trimmed, " ");
        self.specs
            .iter()
            .map(|s| s.heading)
            .find(|h| h.label() == collapsed)
    }
}

/// [`HeadingCatalog::normalize`] against the standard catalog.
pub fn normalize_heading(line: &str) -> Option<Heading> {
    HeadingCatalog::standard().normalize(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_normalizes_to_itself() {
        for h in Heading::ALL {
            assert_eq!(normalize_heading(h.label()), Some(h), "{h}");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for h in Heading::ALL {
            let once = normalize_heading(h.label()).map(Heading::label);
            let twice = once.and_then(normalize_heading).map(Heading::label);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn surrounding_and_repeated_whitespace_is_ignored() {
        assert_eq!(
            normalize_heading("   FUNDED   PROJECTS: \t"),
            Some(Heading::FundedProjects)
        );
    }

    #[test]
    fn unrelated_or_near_miss_lines_do_not_match() {
        assert_eq!(normalize_heading("Funded Projects:"), None);
        assert_eq!(normalize_heading("FUNDED PROJECTS"), None);
        assert_eq!(normalize_heading("The department received two grants."), None);
        assert_eq!(normalize_heading(""), None);
    }

    #[test]
    fn table_only_flags() {
        let c = HeadingCatalog::standard();
        assert!(c.is_table_only(Heading::FundedProjects));
        assert!(c.is_table_only(Heading::PlacementRecord));
        assert!(!c.is_table_only(Heading::TechnicalArticles));
        assert!(!c.is_table_only(Heading::HodDesk));
    }

    #[test]
    fn schemas_leave_one_leading_column() {
        let c = HeadingCatalog::standard();
        for spec in c.specs() {
            if let Some(schema) = &spec.schema {
                assert!(spec.table_only, "{} has a schema but takes prose", spec.heading);
                assert!(schema.split_from_right < schema.columns.len());
            }
        }
        let sa = c.schema(Heading::StudentAchievements).unwrap();
        assert_eq!(sa.columns.len(), 7);
        assert_eq!(sa.split_from_right, 6);
    }

    #[test]
    fn every_rule_targets_a_table_only_heading() {
        let c = HeadingCatalog::standard();
        for rule in c.rules() {
            assert!(c.is_table_only(rule.heading), "{}", rule.heading);
        }
    }
}
