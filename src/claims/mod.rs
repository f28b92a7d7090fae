// src/claims/mod.rs

mod scanner;

use serde::Deserialize;
use serde::Serialize;

/// One flat claim record reconstructed from a remittance report.
///
/// Every field is kept as the text that appeared in the report — dates,
/// codes and amounts are not parsed or normalized. Fields that were not
/// found stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimRecord {
    // Patient identity (anchor line)
    pub patient_name: String,
    pub patient_id: String,
    pub patient_control_number: String,
    pub claim_number: String,
    // Claim status (line after the anchor)
    pub claim_status: String,
    pub claim_type: String,
    pub auth_ref_number: String,
    // Rendering provider (second line after the anchor)
    pub rendering_provider: String,
    pub rendering_provider_id: String,
    // Service line (positional, found by windowed search)
    pub line_item: String,
    pub dos_start_date: String,
    pub dos_end_date: String,
    pub procedure_code: String,
    pub modifier: String,
    pub charge: String,
    pub nbr: String,
    pub group_code: String,
    pub adj_reason: String,
    pub adj_amount: String,
    pub adj_qty: String,
    pub pd_qty: String,
    pub payment: String,
    // Payment summary (PAT RESP line after the service line)
    pub patient_responsibility: String,
    pub total_charge: String,
    pub total_payment: String,
}

impl ClaimRecord {
    /// All 25 fields in the fixed export order.
    pub fn fields(&self) -> [&str; 25] {
        [
            &self.patient_name,
            &self.patient_id,
            &self.patient_control_number,
            &self.claim_number,
            &self.claim_status,
            &self.claim_type,
            &self.auth_ref_number,
            &self.rendering_provider,
            &self.rendering_provider_id,
            &self.line_item,
            &self.dos_start_date,
            &self.dos_end_date,
            &self.procedure_code,
            &self.modifier,
            &self.charge,
            &self.nbr,
            &self.group_code,
            &self.adj_reason,
            &self.adj_amount,
            &self.adj_qty,
            &self.pd_qty,
            &self.payment,
            &self.patient_responsibility,
            &self.total_charge,
            &self.total_payment,
        ]
    }

    /// How many fields were populated (out of all 25).
    pub fn coverage(&self) -> (usize, usize) {
        let fields = self.fields();
        let filled = fields.iter().filter(|f| !f.is_empty()).count();
        (filled, fields.len())
    }

    pub fn has_service_line(&self) -> bool {
        !self.line_item.is_empty()
    }

    pub fn has_summary(&self) -> bool {
        !self.patient_responsibility.is_empty()
            || !self.total_charge.is_empty()
            || !self.total_payment.is_empty()
    }
}

/// Line-count bounds for the windowed searches around each anchor.
///
/// The service line normally follows the anchor but can land before it
/// across a page break, hence the asymmetric forward/backward spans.
#[derive(Debug, Clone, Copy)]
pub struct ScanWindows {
    /// Lines searched ahead of the provider line for the service line.
    pub forward: usize,
    /// Lines searched behind the anchor when the forward search misses.
    pub backward: usize,
    /// Lines searched after the service line for the PAT RESP summary.
    pub summary: usize,
}

impl Default for ScanWindows {
    fn default() -> Self {
        ScanWindows {
            forward: 20,
            backward: 10,
            summary: 5,
        }
    }
}

/// Extract all claim records from remittance report text.
///
/// Never fails: text with no recognizable claim blocks yields an empty vec.
pub fn scan_claims(text: &str) -> Vec<ClaimRecord> {
    scanner::scan(text, &ScanWindows::default())
}

/// Same as [`scan_claims`] but with explicit window bounds.
pub fn scan_claims_with(text: &str, windows: &ScanWindows) -> Vec<ClaimRecord> {
    scanner::scan(text, windows)
}
