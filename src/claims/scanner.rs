// src/claims/scanner.rs

use super::{ClaimRecord, ScanWindows};
use regex::Regex;
use tracing::{debug, info};

/// Labels that must all appear on a line for it to open a claim block.
const ANCHOR_LABELS: [&str; 4] = ["PATIENT:", "PATIENT ID #:", "PAT CTRL #:", "CLM #:"];

/// Label that terminates the payment-summary search, parseable or not.
const SUMMARY_LABEL: &str = "PAT RESP:";

/// Positional layout of a service line: token index 0..13 → record field.
/// Applied only after the token count and line-number preconditions hold,
/// so a short line never partially populates the record.
static SERVICE_LAYOUT: [(&str, fn(&mut ClaimRecord) -> &mut String); 13] = [
    ("line_item", |c| &mut c.line_item),
    ("dos_start_date", |c| &mut c.dos_start_date),
    ("dos_end_date", |c| &mut c.dos_end_date),
    ("procedure_code", |c| &mut c.procedure_code),
    ("modifier", |c| &mut c.modifier),
    ("charge", |c| &mut c.charge),
    ("nbr", |c| &mut c.nbr),
    ("group_code", |c| &mut c.group_code),
    ("adj_reason", |c| &mut c.adj_reason),
    ("adj_amount", |c| &mut c.adj_amount),
    ("adj_qty", |c| &mut c.adj_qty),
    ("pd_qty", |c| &mut c.pd_qty),
    ("payment", |c| &mut c.payment),
];

/// Patterns compiled once per document scan.
struct Patterns {
    /// Identity fields on the normalized anchor line.
    anchor: Regex,
    /// Status fields on the normalized line after the anchor.
    status: Regex,
    /// Provider fields on the raw second line after the anchor.
    provider: Regex,
    /// Structural head of a service line, tested against the raw line:
    /// two-digit line number, then two 8-digit dates.
    service_head: Regex,
    /// Summary triplet on the normalized PAT RESP line.
    summary: Regex,
}

impl Patterns {
    fn new() -> Self {
        Patterns {
            anchor: Regex::new(
                r"PATIENT:\s+(.+?)\s+PATIENT ID #:\s+(\d+)\s+PAT CTRL #:\s+(\S+)\s+CLM #:\s+(\d+)",
            )
            .unwrap(),
            status: Regex::new(r"CLAIM STATUS:\s+(\S+)\s+CLAIM TYPE:\s+(\S+)\s+AUTH/REF#\s*:\s*(\S*)")
                .unwrap(),
            provider: Regex::new(r"REND PROV:\s*(\S*)\s*REND PROV ID:\s*(\S*)").unwrap(),
            service_head: Regex::new(r"^\d{2}\s+\d{8}\s+\d{8}\s").unwrap(),
            summary: Regex::new(
                r"PAT RESP:\s+([\d.-]+)\s+TOTAL CHARGE:\s+([-\d.]+)\s+TOTAL PAYMENT:\s+([\d.-]+)",
            )
            .unwrap(),
        }
    }
}

/// Collapse every run of whitespace to a single space and trim. The report's
/// column alignment pads labels with irregular space runs, so all label-based
/// matching happens on this form.
fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_anchor(normalized: &str) -> bool {
    !normalized.is_empty() && ANCHOR_LABELS.iter().all(|label| normalized.contains(label))
}

fn is_line_number(token: &str) -> bool {
    token.len() == 2 && token.bytes().all(|b| b.is_ascii_digit())
}

/// Single forward pass over the document. Each anchor line yields exactly one
/// record; lines that are not anchors are skipped without comment.
pub(super) fn scan(text: &str, windows: &ScanWindows) -> Vec<ClaimRecord> {
    let patterns = Patterns::new();
    let lines: Vec<&str> = text.split('\n').collect();
    let normalized: Vec<String> = lines.iter().map(|l| normalize(l)).collect();

    let mut claims: Vec<ClaimRecord> = Vec::new();
    let mut missing_service = 0usize;
    let mut missing_summary = 0usize;

    let mut i = 0;
    while i < lines.len() {
        if !is_anchor(&normalized[i]) {
            i += 1;
            continue;
        }
        let anchor = i;
        let mut record = ClaimRecord::default();

        // Identity fields. A line carrying all four labels opens a record
        // even when the capture pattern fails; the fields just stay empty.
        if let Some(cap) = patterns.anchor.captures(&normalized[anchor]) {
            record.patient_name = cap[1].trim().to_string();
            record.patient_id = cap[2].to_string();
            record.patient_control_number = cap[3].to_string();
            record.claim_number = cap[4].to_string();
        }

        // Status line: CLAIM STATUS / CLAIM TYPE / AUTH/REF# (value optional).
        if let Some(status_line) = normalized.get(anchor + 1) {
            if let Some(cap) = patterns.status.captures(status_line) {
                record.claim_status = cap[1].to_string();
                record.claim_type = cap[2].to_string();
                record.auth_ref_number = cap[3].to_string();
            }
        }

        // Provider line: REND PROV / REND PROV ID, both values optional.
        if let Some(provider_line) = lines.get(anchor + 2) {
            if let Some(cap) = patterns.provider.captures(provider_line) {
                record.rendering_provider = cap[1].to_string();
                record.rendering_provider_id = cap[2].to_string();
            }
        }

        // Service line: forward window first, then backward across a possible
        // page break. Only a forward hit gets a summary search — a service
        // line recovered from the previous page has its summary there too,
        // outside this claim's block.
        let (fwd_start, fwd_end) = forward_window(anchor, lines.len(), windows.forward);
        let mut found = None;
        for j in fwd_start..fwd_end {
            if try_service_line(&mut record, lines[j], &patterns) {
                found = Some(j);
                break;
            }
        }
        match found {
            Some(service_at) => {
                resolve_summary(&mut record, &lines, service_at, windows, &patterns);
            }
            None => {
                let (back_lo, back_hi) = backward_window(anchor, lines.len(), windows.backward);
                if back_lo <= back_hi {
                    for j in (back_lo..=back_hi).rev() {
                        if try_service_line(&mut record, lines[j], &patterns) {
                            found = Some(j);
                            break;
                        }
                    }
                }
            }
        }

        if found.is_none() {
            missing_service += 1;
            debug!(anchor, claim = %record.claim_number, "no service line in window");
        } else if !record.has_summary() {
            missing_summary += 1;
        }

        claims.push(record);
        // Resume after the status + provider lines; the service/summary
        // searches never move the outer cursor.
        i = anchor + 3;
    }

    info!(
        claims = claims.len(),
        missing_service, missing_summary, "claim scan complete"
    );
    claims
}

/// Forward service-line window: starts just past the provider line, spans
/// `span` lines from the provider line, clamped to the document.
fn forward_window(anchor: usize, len: usize, span: usize) -> (usize, usize) {
    let start = (anchor + 3).min(len);
    let end = (anchor + 2 + span).min(len);
    (start, end)
}

/// Backward service-line window: from the line before the status line down
/// to `span` lines behind the provider line, inclusive bounds.
fn backward_window(anchor: usize, len: usize, span: usize) -> (usize, usize) {
    let lo = (anchor + 2).saturating_sub(span);
    let hi = (anchor + 1).min(len.saturating_sub(1));
    (lo, hi)
}

/// Test one raw line against the service-line shape and, on a full match,
/// assign all 13 positional fields. A line whose head matches but which
/// carries fewer than 13 tokens is rejected whole — the search keeps going.
fn try_service_line(record: &mut ClaimRecord, raw: &str, patterns: &Patterns) -> bool {
    if !patterns.service_head.is_match(raw) {
        return false;
    }
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < SERVICE_LAYOUT.len() || !is_line_number(tokens[0]) {
        debug!(
            tokens = tokens.len(),
            line = %normalize(raw),
            "service-shaped line rejected"
        );
        return false;
    }
    for (index, (_name, slot)) in SERVICE_LAYOUT.iter().enumerate() {
        *slot(record) = tokens[index].to_string();
    }
    true
}

/// Look for the PAT RESP summary within a few lines after the service line.
/// The first line carrying the label ends the search whether or not the full
/// triplet parses — a mangled summary line is not skipped past.
fn resolve_summary(
    record: &mut ClaimRecord,
    lines: &[&str],
    service_at: usize,
    windows: &ScanWindows,
    patterns: &Patterns,
) {
    let end = (service_at + windows.summary).min(lines.len());
    for k in (service_at + 1)..end {
        if !lines[k].contains(SUMMARY_LABEL) {
            continue;
        }
        if let Some(cap) = patterns.summary.captures(&normalize(lines[k])) {
            record.patient_responsibility = cap[1].to_string();
            record.total_charge = cap[2].to_string();
            record.total_payment = cap[3].to_string();
        }
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{scan_claims, scan_claims_with};

    const ANCHOR: &str = "PATIENT: JOHN SMITH   PATIENT ID #: 1234567800   PAT CTRL #: CLM00102102   CLM #: 2025007654321";
    const STATUS: &str = "CLAIM STATUS: DENIED   CLAIM TYPE: HM   AUTH/REF# :";
    const PROVIDER: &str = "REND PROV: JONES   REND PROV ID: 998877";
    const SERVICE: &str = "01 20250101 20250105 99213 25 150.00 1 CO 45 10.00 1 1 140.00";
    const SUMMARY: &str = "PAT RESP: 0.00   TOTAL CHARGE: 150.00   TOTAL PAYMENT: 140.00";

    #[test]
    fn empty_text_yields_no_claims() {
        assert!(scan_claims("").is_empty());
    }

    #[test]
    fn text_without_anchors_yields_no_claims() {
        let text = "REMITTANCE ADVICE\nPAGE 1 OF 2\nsome unrelated line\n";
        assert!(scan_claims(text).is_empty());
    }

    #[test]
    fn line_missing_one_label_is_not_an_anchor() {
        // No CLM #: label — silently skipped.
        let text = "PATIENT: JANE DOE   PATIENT ID #: 111   PAT CTRL #: ABC\n";
        assert!(scan_claims(text).is_empty());
    }

    #[test]
    fn full_claim_block_extracts_all_groups() {
        let text = format!("{ANCHOR}\n{STATUS}\n{PROVIDER}\n\n{SERVICE}\n{SUMMARY}\n");
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        let c = &claims[0];
        assert_eq!(c.patient_name, "JOHN SMITH");
        assert_eq!(c.patient_id, "1234567800");
        assert_eq!(c.patient_control_number, "CLM00102102");
        assert_eq!(c.claim_number, "2025007654321");
        assert_eq!(c.claim_status, "DENIED");
        assert_eq!(c.claim_type, "HM");
        assert_eq!(c.auth_ref_number, "");
        assert_eq!(c.rendering_provider, "JONES");
        assert_eq!(c.rendering_provider_id, "998877");
        assert_eq!(c.line_item, "01");
        assert_eq!(c.procedure_code, "99213");
        assert_eq!(c.payment, "140.00");
        assert_eq!(c.patient_responsibility, "0.00");
        assert_eq!(c.total_charge, "150.00");
        assert_eq!(c.total_payment, "140.00");
    }

    #[test]
    fn anchor_with_garbage_follow_up_still_creates_record() {
        let text = format!("{ANCHOR}\n%%% noise %%%\n### more noise ###\n");
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        let c = &claims[0];
        assert_eq!(c.patient_name, "JOHN SMITH");
        assert_eq!(c.claim_status, "");
        assert_eq!(c.rendering_provider, "");
        assert!(!c.has_service_line());
    }

    #[test]
    fn service_line_immediately_after_provider_populates_all_13_fields() {
        let text = format!("{ANCHOR}\n{STATUS}\n{PROVIDER}\n{SERVICE}\n");
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        let c = &claims[0];
        assert_eq!(c.line_item, "01");
        assert_eq!(c.dos_start_date, "20250101");
        assert_eq!(c.dos_end_date, "20250105");
        assert_eq!(c.procedure_code, "99213");
        assert_eq!(c.modifier, "25");
        assert_eq!(c.charge, "150.00");
        assert_eq!(c.nbr, "1");
        assert_eq!(c.group_code, "CO");
        assert_eq!(c.adj_reason, "45");
        assert_eq!(c.adj_amount, "10.00");
        assert_eq!(c.adj_qty, "1");
        assert_eq!(c.pd_qty, "1");
        assert_eq!(c.payment, "140.00");
    }

    #[test]
    fn backward_search_recovers_service_line_across_page_break() {
        // Service line lands 3 lines before its anchor (previous page),
        // nothing in the forward window.
        let text = format!("{SERVICE}\nPAGE 2 OF 2\n\n{ANCHOR}\n{STATUS}\n{PROVIDER}\n");
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].procedure_code, "99213");
        assert_eq!(claims[0].payment, "140.00");
    }

    #[test]
    fn backward_recovery_does_not_search_for_summary() {
        let text = format!("{SERVICE}\n{ANCHOR}\n{STATUS}\n{PROVIDER}\n{SUMMARY}\n");
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert!(claims[0].has_service_line());
        assert!(!claims[0].has_summary());
    }

    #[test]
    fn short_service_shaped_line_is_rejected_and_search_continues() {
        // First candidate has the right head but only 5 tokens; the real
        // service line follows.
        let text = format!(
            "{ANCHOR}\n{STATUS}\n{PROVIDER}\n02 20250101 20250105 99214 150.00\n{SERVICE}\n"
        );
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].line_item, "01");
        assert_eq!(claims[0].procedure_code, "99213");
    }

    #[test]
    fn unparseable_summary_line_ends_the_search() {
        // The first PAT RESP line is mangled; a clean one right behind it
        // must NOT be picked up.
        let text = format!(
            "{ANCHOR}\n{STATUS}\n{PROVIDER}\n{SERVICE}\nPAT RESP: garbage\n{SUMMARY}\n"
        );
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert!(!claims[0].has_summary());
    }

    #[test]
    fn summary_outside_window_is_ignored() {
        let text = format!(
            "{ANCHOR}\n{STATUS}\n{PROVIDER}\n{SERVICE}\n\n\n\n\n{SUMMARY}\n"
        );
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert!(claims[0].has_service_line());
        assert!(!claims[0].has_summary());
    }

    #[test]
    fn service_line_outside_both_windows_leaves_fields_empty() {
        let padding = "\n".repeat(25);
        let text = format!("{ANCHOR}\n{STATUS}\n{PROVIDER}\n{padding}{SERVICE}\n");
        let claims = scan_claims_with(&text, &ScanWindows::default());
        assert_eq!(claims.len(), 1);
        assert!(!claims[0].has_service_line());
    }

    #[test]
    fn consecutive_claims_each_get_their_own_record() {
        let anchor2 = "PATIENT: MARY JONES   PATIENT ID #: 555   PAT CTRL #: CLM9   CLM #: 42";
        let service2 = "02 20250201 20250201 99214 59 200.00 1 PR 1 20.00 1 1 180.00";
        let text = format!(
            "{ANCHOR}\n{STATUS}\n{PROVIDER}\n{SERVICE}\n{SUMMARY}\n\
             {anchor2}\n{STATUS}\n{PROVIDER}\n{service2}\n"
        );
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].patient_name, "JOHN SMITH");
        assert_eq!(claims[0].line_item, "01");
        assert_eq!(claims[1].patient_name, "MARY JONES");
        assert_eq!(claims[1].claim_number, "42");
        assert_eq!(claims[1].line_item, "02");
        assert!(!claims[1].has_summary());
    }

    #[test]
    fn irregular_whitespace_and_crlf_endings_are_tolerated() {
        let text = format!(
            "PATIENT:   JOHN   SMITH    PATIENT ID #:  1234567800  PAT CTRL #:  CLM00102102  CLM #:  2025007654321\r\n\
             CLAIM STATUS:    PAID    CLAIM TYPE:  HM    AUTH/REF# :  A123\r\n\
             {PROVIDER}\r\n{SERVICE}\r\n"
        );
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].patient_name, "JOHN SMITH");
        assert_eq!(claims[0].claim_status, "PAID");
        assert_eq!(claims[0].auth_ref_number, "A123");
        assert_eq!(claims[0].payment, "140.00");
    }

    #[test]
    fn empty_provider_values_stay_empty() {
        let text = format!("{ANCHOR}\n{STATUS}\nREND PROV:    REND PROV ID:\n{SERVICE}\n");
        let claims = scan_claims(&text);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].rendering_provider, "");
        assert_eq!(claims[0].rendering_provider_id, "");
    }
}
