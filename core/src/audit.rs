//! Processing audit log.
//!
//! One row per real message, in processing order (newest first). Padding
//! slots are not logged. The CSV form is what operators diff against the
//! published tally when an election is contested.

use serde::{Deserialize, Serialize};
use sotto_domain::Command;

use crate::validator::Decision;

pub const AUDIT_CSV_HEADER: &str = "block,state_index,vote_option,new_weight,nonce,outcome";

/// One processed message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    /// Block the message was published in
    pub block: u64,
    pub state_index: u64,
    pub vote_option: u64,
    pub new_weight: u64,
    pub nonce: u64,
    /// Outcome label, `accepted` or a reject reason
    pub outcome: String,
}

impl AuditRow {
    /// Build a row from a decoded command, or all-zero fields when the
    /// ciphertext never decoded to one.
    pub fn new(block: u64, command: Option<&Command>, decision: &Decision) -> Self {
        match command {
            Some(command) => Self {
                block,
                state_index: command.state_index,
                vote_option: command.vote_option_index,
                new_weight: command.new_vote_weight,
                nonce: command.nonce,
                outcome: decision.label().to_string(),
            },
            None => Self {
                block,
                state_index: 0,
                vote_option: 0,
                new_weight: 0,
                nonce: 0,
                outcome: decision.label().to_string(),
            },
        }
    }

    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.block, self.state_index, self.vote_option, self.new_weight, self.nonce, self.outcome
        )
    }
}

/// Render rows as CSV with a header line
pub fn to_csv(rows: &[AuditRow]) -> String {
    let mut out = String::with_capacity((rows.len() + 1) * 48);
    out.push_str(AUDIT_CSV_HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(&row.csv_line());
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::RejectReason;

    #[test]
    fn test_csv_layout() {
        let rows = vec![
            AuditRow {
                block: 12,
                state_index: 1,
                vote_option: 2,
                new_weight: 9,
                nonce: 2,
                outcome: "accepted".into(),
            },
            AuditRow {
                block: 11,
                state_index: 1,
                vote_option: 2,
                new_weight: 5,
                nonce: 1,
                outcome: "nonce_mismatch".into(),
            },
        ];

        let csv = to_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(AUDIT_CSV_HEADER));
        assert_eq!(lines.next(), Some("12,1,2,9,2,accepted"));
        assert_eq!(lines.next(), Some("11,1,2,5,1,nonce_mismatch"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_row_without_command_zeroes_fields() {
        let row = AuditRow::new(7, None, &Decision::Reject(RejectReason::Malformed));
        assert_eq!(row.csv_line(), "7,0,0,0,0,malformed");
    }
}
