//! Scanner result files: bad rows are skipped, good rows are staged.

use std::collections::{BTreeMap, HashMap};

use assess_model::messages::{self, fill_template};
use assess_model::{
    FieldCode, FileCategory, IssueCode, Pen, ResultRecord, StagedResult, ValidationIssue,
};
use assess_validate::validate_and_extract;

use super::{BatchProcessor, FileContext, parse_issue, row_rejections, school_lookup_issue};
use crate::error::Result;
use crate::report::{BatchSummary, ChangeCounts, ProcessOutcome};

impl BatchProcessor {
    pub(crate) fn process_results(&self, ctx: &FileContext<'_>) -> Result<ProcessOutcome> {
        let table = ctx.table;
        let mut rejected: BTreeMap<usize, Vec<ValidationIssue>> = BTreeMap::new();
        for error in table.blocking_errors() {
            rejected
                .entry(error.row_index)
                .or_default()
                .push(parse_issue(error));
        }

        let mut schools = HashMap::new();
        let mut candidates: Vec<(usize, ResultRecord)> = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let record = match validate_and_extract::<ResultRecord>(row, &()) {
                Ok(record) => record,
                Err(issues) => {
                    tracing::debug!(line = row.index, issues = issues.len(), "result row invalid");
                    rejected.insert(row.index, issues);
                    continue;
                }
            };
            match self.school_for_mincode(&mut schools, &record.mincode) {
                Ok(Some(_)) => candidates.push((row.index, record)),
                Ok(None) => {
                    rejected.insert(
                        row.index,
                        vec![
                            ValidationIssue::error(
                                FieldCode::Mincode,
                                IssueCode::InvalidMincode,
                                fill_template(messages::UNKNOWN_MINCODE, &[&record.mincode]),
                            )
                            .with_rejected_value(record.mincode.as_str()),
                        ],
                    );
                }
                Err(e) => {
                    tracing::warn!(line = row.index, error = %e, "school lookup failed");
                    rejected.insert(
                        row.index,
                        vec![school_lookup_issue(FieldCode::Mincode, &record.mincode)],
                    );
                }
            }
        }

        let pens: Vec<Pen> = candidates.iter().map(|(_, record)| record.pen.clone()).collect();
        let resolutions = self.resolver().resolve_many(&pens);

        let mut staged = Vec::with_capacity(candidates.len());
        for ((line, record), resolution) in candidates.into_iter().zip(resolutions) {
            let (Some(student), Some(status)) = (resolution.student(), resolution.staged_status())
            else {
                tracing::debug!(
                    line,
                    retryable = resolution.is_retryable(),
                    "student not resolved"
                );
                rejected.insert(line, resolution.issue(&record.pen).into_iter().collect());
                continue;
            };
            staged.push(StagedResult {
                id: ctx.row_id(line),
                key: ctx.validated.key.clone(),
                assessment_id: ctx.validated.assessment.id.clone(),
                student_id: student.id.clone(),
                submitted_pen: record.pen.clone(),
                resolved_pen: student.pen.clone(),
                line,
                status,
                record,
            });
        }

        let accepted_rows = self.store().stage_results(staged)?;
        for (line, issues) in &rejected {
            tracing::warn!(line, issues = issues.len(), "result row skipped");
        }

        Ok(ProcessOutcome::Committed(BatchSummary {
            file_name: ctx.file.file_name.clone(),
            category: FileCategory::Result,
            key: ctx.validated.key.clone(),
            total_rows: table.total_rows,
            accepted_rows,
            rejected_rows: row_rejections(rejected),
            reporting_school: table
                .rows
                .iter()
                .find(|row| row.index == 1)
                .and_then(|row| row.get(FieldCode::Mincode.as_str()))
                .map(str::to_string),
            changes: ChangeCounts::default(),
        }))
    }
}
