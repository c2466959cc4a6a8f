//! Table merging across the two source documents.
//!
//! Both reports usually carry the same tables (funded projects, placements
//! …) with small cosmetic differences in the header: `Sl. No` vs `SL NO`, a
//! trailing colon, a double space. Tables whose headers normalise to the same
//! key are printed as one table in the magazine.

use crate::sections::RawTable;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A header row reduced to its merge key.
pub type HeaderKey = Vec<String>;

/// One output table: the header of the first table seen with a key, plus
/// the body rows of every table sharing that key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedTable {
    pub header: Vec<Option<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Normalise one header cell: lowercase, drop punctuation, collapse spaces,
/// spell `sl no` as `slno`.
pub fn normalize_header_cell(cell: Option<&str>) -> String {
    let Some(text) = cell.filter(|t| !t.is_empty()) else {
        return String::new();
    };
    let text = text.to_lowercase();
    let text = RE_PUNCT.replace_all(&text, "");
    let text = RE_SPACES.replace_all(&text, " ");
    text.replace("sl no", "slno").trim().to_string()
}

/// The merge key of a raw table's header row.
pub fn header_key(table: &RawTable) -> HeaderKey {
    table
        .header()
        .iter()
        .map(|c| normalize_header_cell(c.as_deref()))
        .collect()
}

/// Merge `tables` by header key, preserving first-seen key order and input
/// row order.
pub fn merge_tables<'a>(tables: impl IntoIterator<Item = &'a RawTable>) -> Vec<MergedTable> {
    let mut keys: Vec<HeaderKey> = Vec::new();
    let mut merged: Vec<MergedTable> = Vec::new();

    for table in tables {
        let key = header_key(table);
        let slot = match keys.iter().position(|k| *k == key) {
            Some(i) => i,
            None => {
                keys.push(key);
                merged.push(MergedTable {
                    header: table.header().to_vec(),
                    rows: Vec::new(),
                });
                merged.len() - 1
            }
        };
        merged[slot].rows.extend(table.body().iter().cloned());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::from_strings(rows.iter().map(|r| r.to_vec()))
    }

    #[test]
    fn header_key_ignores_case_punctuation_and_spacing() {
        let a = table(&[&["Sl. No", "Project  Title", "Funding Agency:"]]);
        let b = table(&[&["SL NO", "project title", "FUNDING AGENCY"]]);
        let c = table(&[&["Slno", "Project Title", "Funding-Agency"]]);
        assert_eq!(header_key(&a), header_key(&b));
        assert_eq!(header_key(&c)[0], "slno");
        assert_eq!(header_key(&a), vec!["slno", "project title", "funding agency"]);
    }

    #[test]
    fn header_key_preserves_column_order() {
        let a = table(&[&["Name", "USN"]]);
        let b = table(&[&["USN", "Name"]]);
        assert_ne!(header_key(&a), header_key(&b));
    }

    #[test]
    fn null_header_cells_key_as_empty() {
        let t = RawTable::new(vec![vec![None, Some("Name".into())]]);
        assert_eq!(header_key(&t), vec!["", "name"]);
    }

    #[test]
    fn same_key_tables_merge_in_order() {
        let a = table(&[&["Title", "Amount"], &["Drone", "1000"]]);
        let b = table(&[&["TITLE", "amount"], &["Rover", "2000"], &["Lidar", "300"]]);
        let merged = merge_tables([&a, &b]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].header, a.header().to_vec());
        let titles: Vec<_> = merged[0].rows.iter().map(|r| r[0].as_deref()).collect();
        assert_eq!(titles, vec![Some("Drone"), Some("Rover"), Some("Lidar")]);
    }

    #[test]
    fn distinct_shapes_stay_separate_in_first_seen_order() {
        let a = table(&[&["Name", "Award"], &["Asha", "Gold"]]);
        let b = table(&[&["Name", "Company", "Package"], &["Ravi", "Acme", "6 LPA"]]);
        let c = table(&[&["name", "award"], &["Kiran", "Silver"]]);
        let merged = merge_tables([&a, &b, &c]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].rows.len(), 2);
        assert_eq!(merged[1].rows.len(), 1);
        assert_eq!(merged[0].rows[1][0].as_deref(), Some("Kiran"));
    }

    #[test]
    fn many_tables_with_one_key_collapse_to_one() {
        let tables: Vec<RawTable> = (0..5)
            .map(|i| {
                let n = i.to_string();
                RawTable::from_strings([vec!["Sl No", "Name"], vec![n.as_str(), "x"]])
            })
            .collect();
        let merged = merge_tables(&tables);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rows.len(), 5);
    }

    #[test]
    fn header_only_table_contributes_no_rows() {
        let a = table(&[&["Name", "Award"]]);
        let merged = merge_tables([&a]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].rows.is_empty());
    }
}
