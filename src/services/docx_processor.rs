use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

use crate::error::{ExtractionError, ExtractionResultExt};

const FORMAT: &str = "DOCX";
const CELL_SEPARATOR: &str = " | ";

/// Paragraph and table text from Word documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxProcessor;

impl DocxProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, content: &[u8]) -> Result<String, ExtractionError> {
        let docx = docx_rs::read_docx(content).decode_err(FORMAT)?;

        let mut paragraphs = Vec::new();
        let mut table_rows = Vec::new();

        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(paragraph) => paragraphs.push(paragraph_text(paragraph)),
                DocumentChild::Table(table) => table_rows.extend(table_row_texts(table)),
                _ => {}
            }
        }

        let mut text = paragraphs.join("\n");
        if !table_rows.is_empty() {
            text.push_str("\n\n");
            text.push_str(&table_rows.join("\n"));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(ExtractionError::decode(FORMAT, "No text found in DOCX file"));
        }

        tracing::info!(
            paragraphs = paragraphs.len(),
            table_rows = table_rows.len(),
            "DOCX text extraction completed"
        );
        Ok(text.to_string())
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

// docx-rs wraps rows and cells in single-variant enums
#[allow(irrefutable_let_patterns)]
fn table_row_texts(table: &Table) -> Vec<String> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let TableChild::TableRow(row) = row else {
                return None;
            };
            let cells = row
                .cells
                .iter()
                .filter_map(|cell| {
                    let TableRowChild::TableCell(cell) = cell else {
                        return None;
                    };
                    Some(
                        cell.children
                            .iter()
                            .filter_map(|content| match content {
                                TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                })
                .collect::<Vec<_>>();
            Some(cells.join(CELL_SEPARATOR))
        })
        .collect()
}
