//! Output formatting for student records.
//!
//! Renders a list of students as an ASCII table (like a SQL shell), a Markdown
//! table, or JSON.

use crate::models::Student;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Output format for student listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (like MySQL CLI)
    #[default]
    Table,
    /// Pretty-printed JSON array
    Json,
    /// Markdown table format
    Markdown,
}

const HEADERS: [&str; 4] = ["id", "first_name", "last_name", "email"];

fn cells(student: &Student) -> [String; 4] {
    [
        student.id.to_string(),
        student.first_name.clone(),
        student.last_name.clone(),
        student.email.clone(),
    ]
}

pub fn format_students(students: &[Student], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_as_table(students),
        OutputFormat::Json => serde_json::to_string_pretty(students).unwrap_or_default(),
        OutputFormat::Markdown => format_as_markdown(students),
    }
}

pub fn format_as_table(students: &[Student]) -> String {
    if students.is_empty() {
        return "Empty set\n".to_string();
    }

    let rows: Vec<[String; 4]> = students.iter().map(cells).collect();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.width()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = HEADERS
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("| {} ", pad(h, *w, false)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in &rows {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .enumerate()
            // id column is right-aligned like numbers in a SQL shell
            .map(|(i, (cell, w))| format!("| {} ", pad(cell, *w, i == 0)))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_text = if rows.len() == 1 { "row" } else { "rows" };
    output.push_str(&format!("{} {} in set\n", rows.len(), row_text));

    output
}

pub fn format_as_markdown(students: &[Student]) -> String {
    if students.is_empty() {
        return "*Empty set*\n".to_string();
    }

    let mut output = String::new();

    let header: String = HEADERS.iter().map(|h| format!("| {} ", h)).collect::<String>() + "|\n";
    output.push_str(&header);

    let sep: String = HEADERS.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for student in students {
        let row_str: String = cells(student)
            .iter()
            .map(|cell| format!("| {} ", cell.replace('|', "\\|")))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&format!("\n*{} rows*\n", students.len()));

    output
}

/// Pad by display width, which `format!` width specifiers do not account for.
fn pad(s: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(s.width()));
    if right_align {
        format!("{}{}", fill, s)
    } else {
        format!("{}{}", s, fill)
    }
}
