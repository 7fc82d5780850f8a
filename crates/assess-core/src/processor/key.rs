//! Answer-key files: all rows or nothing.

use assess_model::{FileCategory, KeyRecord};
use assess_validate::{KeyScope, check_headers, key_required_headers, validate_and_extract};

use super::{BatchProcessor, FileContext, file_rejection, parse_issue};
use crate::error::Result;
use crate::report::{BatchSummary, ChangeCounts, ProcessOutcome, RejectionKind, RejectionReport};

impl BatchProcessor {
    pub(crate) fn process_keys(&self, ctx: &FileContext<'_>) -> Result<ProcessOutcome> {
        let file_name = ctx.file.file_name.as_str();
        let table = ctx.table;

        if let Err(e) = check_headers(table, &key_required_headers()) {
            return Ok(file_rejection(file_name, e));
        }
        if let Some(error) = table.first_blocking_error() {
            tracing::warn!(line = error.row_index, "key file has a malformed row");
            return Ok(ProcessOutcome::Rejected(RejectionReport::validation(
                file_name,
                parse_issue(error),
            )));
        }

        let scope = KeyScope::new(
            ctx.validated.name.session_token.clone(),
            ctx.validated.name.assessment_type.clone(),
        );
        let mut keys = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            match validate_and_extract::<KeyRecord>(row, &scope) {
                Ok(key) => keys.push(key),
                Err(errors) => {
                    tracing::warn!(
                        line = row.index,
                        errors = errors.len(),
                        "key row rejected, abandoning file"
                    );
                    return Ok(ProcessOutcome::Rejected(RejectionReport {
                        file_name: file_name.to_string(),
                        kind: RejectionKind::Validation,
                        errors: errors
                            .into_iter()
                            .map(|issue| issue.at_line(row.index))
                            .collect(),
                    }));
                }
            }
        }

        let stored = self
            .store()
            .replace_keys(&ctx.validated.assessment.id, keys)?;
        tracing::info!(stored, "answer keys replaced");

        Ok(ProcessOutcome::Committed(BatchSummary {
            file_name: file_name.to_string(),
            category: FileCategory::Key,
            key: ctx.validated.key.clone(),
            total_rows: table.total_rows,
            accepted_rows: stored,
            rejected_rows: Vec::new(),
            reporting_school: None,
            changes: ChangeCounts::default(),
        }))
    }
}
