use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use assess_core::{
    BatchSummary, ChangeCounts, EventOutcome, EventType, ProcessOutcome, PromotionSummary,
    RegistrationEvent, RejectionReport, Resolution, Unresolved,
};
use assess_model::{Severity, ValidationIssue};

pub fn print_outcome(outcome: &ProcessOutcome) {
    match outcome {
        ProcessOutcome::Committed(summary) => print_batch(summary),
        ProcessOutcome::Rejected(report) => print_rejection(report),
    }
}

fn print_batch(summary: &BatchSummary) {
    println!("File: {}", summary.file_name);
    println!("Key: {} ({})", summary.key, summary.category);
    if let Some(mincode) = &summary.reporting_school {
        println!("Reporting school: {mincode}");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows"),
        header_cell("Accepted"),
        header_cell("Rejected"),
        header_cell("Created"),
        header_cell("Updated"),
        header_cell("Deleted"),
    ]);
    apply_table_style(&mut table);
    for index in 0..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut row = vec![
        Cell::new(summary.total_rows).add_attribute(Attribute::Bold),
        count_cell(Some(summary.accepted_rows), Color::Green),
        count_cell(Some(summary.rejected_count()), Color::Red),
    ];
    row.extend(change_cells(&summary.changes));
    table.add_row(row);
    println!("{table}");

    if summary.rejected_rows.is_empty() {
        return;
    }
    let mut issues = Table::new();
    issues.set_header(vec![
        header_cell("Line"),
        header_cell("Severity"),
        header_cell("Field"),
        header_cell("Code"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut issues);
    align_column(&mut issues, 0, CellAlignment::Right);
    for rejection in &summary.rejected_rows {
        for issue in &rejection.issues {
            issues.add_row(issue_row(Cell::new(rejection.line), issue));
        }
    }
    println!();
    println!("Rejected rows:");
    println!("{issues}");
}

fn print_rejection(report: &RejectionReport) {
    let status = if report.is_conflict() {
        "CONFLICT (retry later)"
    } else {
        "REJECTED"
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Severity"),
        header_cell("Field"),
        header_cell("Code"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for issue in &report.errors {
        table.add_row(issue_row(Cell::new(&report.file_name), issue));
    }
    println!("File {}: {status}", report.file_name);
    println!("{table}");
}

pub fn print_promotion(summary: &PromotionSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Claimed"),
        header_cell("Completed"),
        header_cell("Failed"),
        header_cell("Transferred"),
        header_cell("Created"),
        header_cell("Updated"),
        header_cell("Deleted"),
    ]);
    apply_table_style(&mut table);
    for index in 0..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut row = vec![
        Cell::new(summary.claimed).add_attribute(Attribute::Bold),
        count_cell(Some(summary.completed), Color::Green),
        count_cell(Some(summary.failed), Color::Red),
        count_cell(Some(summary.transferred), Color::Yellow),
    ];
    row.extend(change_cells(&summary.changes));
    table.add_row(row);
    println!("{table}");
}

pub fn print_events(events: &[RegistrationEvent]) {
    if events.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Event"),
        header_cell("Outcome"),
        header_cell("Student"),
        header_cell("Assessment"),
        header_cell("Registration"),
    ]);
    apply_table_style(&mut table);
    for event in events {
        table.add_row(vec![
            Cell::new(event_type_label(event.event_type)),
            outcome_cell(event.outcome),
            Cell::new(&event.student_id),
            Cell::new(&event.assessment_id),
            dim_cell(&event.payload.id),
        ]);
    }
    println!();
    println!("Events:");
    println!("{table}");
}

pub fn print_resolution(pen: &str, resolution: &Resolution) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("PEN"),
        header_cell("Result"),
        header_cell("Student"),
        header_cell("Active PEN"),
        header_cell("Hops"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    let row = match resolution {
        Resolution::Resolved { student, hops } => vec![
            Cell::new(pen),
            Cell::new(if *hops == 0 { "ACTIVE" } else { "MERGED" })
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
            Cell::new(&student.id),
            Cell::new(&student.pen),
            Cell::new(hops),
        ],
        Resolution::NotFound(reason) => vec![
            Cell::new(pen),
            Cell::new(unresolved_label(reason)).fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ],
        Resolution::Unavailable(error) => vec![
            Cell::new(pen),
            Cell::new(format!("UNAVAILABLE: {error}")).fg(Color::Yellow),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ],
    };
    table.add_row(row);
    println!("{table}");
}

fn unresolved_label(reason: &Unresolved) -> String {
    match reason {
        Unresolved::NoRecord => "NOT FOUND".to_string(),
        Unresolved::Inactive(status) => format!("INACTIVE ({status})"),
        Unresolved::DanglingLink(target) => format!("DANGLING LINK to {target}"),
        Unresolved::Cycle(at) => format!("CYCLE at {at}"),
        Unresolved::HopLimitExceeded => "HOP LIMIT EXCEEDED".to_string(),
    }
}

fn change_cells(changes: &ChangeCounts) -> Vec<Cell> {
    vec![
        count_cell(Some(changes.created), Color::Green),
        count_cell(Some(changes.updated), Color::Blue),
        count_cell(Some(changes.deleted), Color::Magenta),
    ]
}

fn issue_row(first: Cell, issue: &ValidationIssue) -> Vec<Cell> {
    vec![
        first,
        severity_cell(issue.severity),
        Cell::new(issue.field),
        Cell::new(issue.code),
        Cell::new(&issue.message),
    ]
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR").fg(Color::Red),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn event_type_label(event_type: EventType) -> &'static str {
    match event_type {
        EventType::StudentRegistration => "STUDENT_REGISTRATION",
        EventType::ResultPromotion => "RESULT_PROMOTION",
    }
}

fn outcome_cell(outcome: EventOutcome) -> Cell {
    match outcome {
        EventOutcome::Created => Cell::new("CREATED").fg(Color::Green),
        EventOutcome::Updated => Cell::new("UPDATED").fg(Color::Blue),
        EventOutcome::Deleted => Cell::new("DELETED").fg(Color::Magenta),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
