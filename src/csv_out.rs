// src/csv_out.rs

use crate::claims::ClaimRecord;

/// Returned instead of a header-only table when no claims were extracted.
pub const NO_DATA_SENTINEL: &str = "No data found in the PDF";

/// Column names for the export, in the fixed record field order.
pub const HEADERS: [&str; 25] = [
    "Patient Name",
    "Patient ID",
    "Patient Control Number",
    "Claim Number",
    "Claim Status",
    "Claim Type",
    "Auth/Ref Number",
    "Rendering Provider",
    "Rendering Provider ID",
    "Line Item",
    "DOS Start Date",
    "DOS End Date",
    "Procedure Code",
    "Modifier",
    "Charge",
    "NBR",
    "Group Code",
    "Adj Reason",
    "Adj Amount",
    "Adj Qty",
    "PD Qty",
    "Payment",
    "Patient Responsibility",
    "Total Charge",
    "Total Payment",
];

/// Serialize claim records as CRLF-terminated CSV.
///
/// An empty record set yields [`NO_DATA_SENTINEL`]; otherwise the header row
/// comes first and every row, header included, ends with `\r\n`.
pub fn to_csv(records: &[ClaimRecord]) -> String {
    if records.is_empty() {
        return NO_DATA_SENTINEL.to_string();
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS);
    for record in records {
        push_row(&mut out, &record.fields());
    }
    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push_str("\r\n");
}

/// Quote a field if it carries a comma, a double quote or a newline;
/// embedded quotes are doubled. Everything else passes through as is.
fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
