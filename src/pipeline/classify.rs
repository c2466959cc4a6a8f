//! Table classification: route a raw table to a section by its header.
//!
//! Only the header row is inspected. Its cells are joined with spaces,
//! lowercased, and tested against the catalog's keyword rules in priority
//! order. The first rule with a matching keyword wins; a table no rule
//! matches belongs to no section and is dropped by the caller.

use crate::headings::{Heading, HeadingCatalog};
use crate::sections::RawTable;

/// Lowercased, space-joined header text (null cells count as empty).
pub fn header_text(table: &RawTable) -> String {
    table
        .header()
        .iter()
        .map(|c| c.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classify `table` into a section, or `None` when no rule matches.
pub fn classify_table(catalog: &HeadingCatalog, table: &RawTable) -> Option<Heading> {
    let header = header_text(table);
    catalog
        .rules()
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| header.contains(k)))
        .map(|rule| rule.heading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(header: &[&str]) -> Option<Heading> {
        let table = RawTable::from_strings([header.to_vec(), vec!["x"; header.len()]]);
        classify_table(HeadingCatalog::standard(), &table)
    }

    #[test]
    fn each_rule_routes_its_keyword() {
        assert_eq!(
            classify(&["Sl No", "Title", "Journal Name"]),
            Some(Heading::FacultyJournals)
        );
        assert_eq!(
            classify(&["Paper", "Conference", "Date"]),
            Some(Heading::FacultyConferences)
        );
        assert_eq!(
            classify(&["Title", "Funding Agency", "Amount"]),
            Some(Heading::FundedProjects)
        );
        assert_eq!(
            classify(&["Title", "Application No.", "Status"]),
            Some(Heading::Patents)
        );
        assert_eq!(
            classify(&["Student", "Publication Details"]),
            Some(Heading::StudentPublications)
        );
        assert_eq!(classify(&["Name", "Award"]), Some(Heading::StudentAchievements));
        assert_eq!(classify(&["Name", "Company", "Package"]), Some(Heading::PlacementRecord));
        assert_eq!(classify(&["Students Placed", "Year"]), Some(Heading::PlacementRecord));
    }

    #[test]
    fn matching_is_case_insensitive_across_cell_boundaries() {
        // "funding" and "agency" sit in different cells; the join restores the phrase.
        assert_eq!(
            classify(&["PROJECT", "FUNDING", "AGENCY"]),
            Some(Heading::FundedProjects)
        );
    }

    #[test]
    fn first_rule_in_priority_order_wins() {
        assert_eq!(
            classify(&["Award", "Patent Application"]),
            Some(Heading::Patents)
        );
        assert_eq!(
            classify(&["Journal / Conference"]),
            Some(Heading::FacultyJournals)
        );
    }

    #[test]
    fn unmatched_header_is_unclassified() {
        assert_eq!(classify(&["Date", "Event", "Resource Person"]), None);
    }

    #[test]
    fn only_the_header_row_is_inspected() {
        let table = RawTable::from_strings([vec!["Name", "Remarks"], vec!["Asha", "award"]]);
        assert_eq!(classify_table(HeadingCatalog::standard(), &table), None);
    }

    #[test]
    fn null_header_cells_are_tolerated() {
        let table = RawTable::new(vec![vec![None, Some("Journal".into())]]);
        assert_eq!(
            classify_table(HeadingCatalog::standard(), &table),
            Some(Heading::FacultyJournals)
        );
    }
}
