//! Spreadsheet header preview
//!
//! Before a file is sent, the host can pass the header row it read from the
//! sheet and show which expected columns were recognised. The backend stays
//! the authority on what it accepts; this only catches obvious mistakes such
//! as a missing Document Number column.

use serde::Serialize;

/// Columns the backend reads from an uploaded sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    DocumentNumber,
    Type,
    Address,
    City,
    Zip,
    FilingMonth,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::DocumentNumber,
        Column::Type,
        Column::Address,
        Column::City,
        Column::Zip,
        Column::FilingMonth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::DocumentNumber => "Document Number",
            Column::Type => "Type",
            Column::Address => "Address",
            Column::City => "City",
            Column::Zip => "ZIP",
            Column::FilingMonth => "Filing Month",
        }
    }

    pub fn required(&self) -> bool {
        matches!(self, Column::DocumentNumber)
    }

    /// Accepted spellings, already normalised
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::DocumentNumber => &[
                "document number",
                "document no",
                "document #",
                "doc number",
                "doc #",
                "instrument number",
            ],
            Column::Type => &["type", "record type", "filing type"],
            Column::Address => &["address", "property address", "situs address"],
            Column::City => &["city", "property city"],
            Column::Zip => &["zip", "zip code", "zipcode", "postal code"],
            Column::FilingMonth => &["filing month", "month", "filed month"],
        }
    }
}

/// Trim, lowercase and collapse inner whitespace
fn normalize(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedColumn {
    pub column: Column,
    pub label: &'static str,
    pub header: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderReport {
    pub mapped: Vec<MappedColumn>,
    pub missing_required: Vec<&'static str>,
    pub missing_optional: Vec<&'static str>,
    pub unmapped: Vec<String>,
}

impl HeaderReport {
    /// Map header names to expected columns; the first matching header wins
    pub fn analyze<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut report = HeaderReport::default();

        for header in headers {
            let raw = header.as_ref();
            let normalized = normalize(raw);
            let column = Column::ALL.into_iter().find(|column| {
                column.aliases().contains(&normalized.as_str())
                    && !report.mapped.iter().any(|m| m.column == *column)
            });
            match column {
                Some(column) => report.mapped.push(MappedColumn {
                    column,
                    label: column.label(),
                    header: raw.to_string(),
                }),
                None => report.unmapped.push(raw.to_string()),
            }
        }

        for column in Column::ALL {
            if report.mapped.iter().any(|m| m.column == column) {
                continue;
            }
            if column.required() {
                report.missing_required.push(column.label());
            } else {
                report.missing_optional.push(column.label());
            }
        }

        report
    }

    /// No required column is missing
    pub fn is_ready(&self) -> bool {
        self.missing_required.is_empty()
    }
}
