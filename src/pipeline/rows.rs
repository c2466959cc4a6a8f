//! Schema-based splitting of flattened table rows.
//!
//! Some reports lay tables out without ruling or consistent column gaps, so
//! a row comes out of the text layer as one line such as
//! `1 Asha K 4XX21CS001 6 Hackathon First State`. The trailing columns of
//! these tables are single tokens (USN, semester, level …) while the leading
//! column is free text, so the row is split from the right.

use crate::headings::TableSchema;
use crate::sections::RawTable;
use tracing::debug;

/// Split `line` into `1 + n` columns, taking the last `n` whitespace-separated
/// tokens as trailing columns.
///
/// Returns `None` when the line has `n` tokens or fewer: there would be no
/// leading column left, which is what header-only or malformed lines look
/// like.
pub fn split_from_right(line: &str, n: usize) -> Option<Vec<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() <= n {
        return None;
    }

    let (lead, trailing) = tokens.split_at(tokens.len() - n);
    let mut columns = Vec::with_capacity(n + 1);
    columns.push(lead.join(" "));
    columns.extend(trailing.iter().map(|t| t.to_string()));
    Some(columns)
}

/// Build a raw table from flattened rows using `schema`.
///
/// The header is the schema's column names. Lines that cannot be split are
/// dropped. Returns `None` if no line survives.
pub fn structure_rows<'a>(
    schema: &TableSchema,
    lines: impl IntoIterator<Item = &'a str>,
) -> Option<RawTable> {
    let mut rows: Vec<Vec<Option<String>>> = vec![schema
        .columns
        .iter()
        .map(|c| Some(c.to_string()))
        .collect()];

    for line in lines {
        match split_from_right(line, schema.split_from_right) {
            Some(cols) => rows.push(cols.into_iter().map(Some).collect()),
            None => debug!("Dropping unsplittable row: {:?}", line),
        }
    }

    (rows.len() > 1).then(|| RawTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headings::{Heading, HeadingCatalog};

    #[test]
    fn splits_trailing_tokens() {
        let cols = split_from_right("Jane Doe Research Award International 2024", 3).unwrap();
        assert_eq!(cols, vec!["Jane Doe Research", "Award", "International", "2024"]);
    }

    #[test]
    fn too_few_tokens_yields_no_row() {
        assert_eq!(split_from_right("Award International 2024", 3), None);
        assert_eq!(split_from_right("2024", 3), None);
        assert_eq!(split_from_right("", 3), None);
    }

    #[test]
    fn irregular_whitespace_is_collapsed_in_the_lead_column() {
        let cols = split_from_right("  Smart   Irrigation  KSCST 50000 Dr.Rao ", 3).unwrap();
        assert_eq!(cols, vec!["Smart Irrigation", "KSCST", "50000", "Dr.Rao"]);
    }

    #[test]
    fn zero_trailing_columns_keeps_the_whole_line() {
        assert_eq!(split_from_right("a b", 0), Some(vec!["a b".to_string()]));
    }

    #[test]
    fn structure_rows_uses_schema_header_and_drops_bad_lines() {
        let schema = HeadingCatalog::standard()
            .schema(Heading::FundedProjects)
            .unwrap();
        let table = structure_rows(
            schema,
            [
                "Project Title Funding Agency Amount Faculty PI",
                "Smart Irrigation KSCST 50000 Dr.Rao",
                "AICTE",
            ],
        )
        .unwrap();

        assert_eq!(table.header()[1].as_deref(), Some("Funding Agency"));
        // The header line itself splits, so it survives as a data row.
        assert_eq!(table.body().len(), 2);
        assert_eq!(table.body()[1][0].as_deref(), Some("Smart Irrigation"));
    }

    #[test]
    fn structure_rows_without_data_is_none() {
        let schema = HeadingCatalog::standard().schema(Heading::Patents).unwrap();
        assert!(structure_rows(schema, ["Granted", ""]).is_none());
    }
}
