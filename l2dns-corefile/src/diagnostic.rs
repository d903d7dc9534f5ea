//! Human-readable parse error reports

use crate::parser::{LexError, ParseError};
use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

fn label_for(err: &ParseError) -> &'static str {
    match err {
        ParseError::Lex(LexError::UnterminatedString { .. }) => "this quote is never closed",
        ParseError::Lex(LexError::UnexpectedChar { .. }) => "unexpected character",
        ParseError::UnbalancedClose { .. } => "no block is open here",
        ParseError::UnclosedBlock { .. } => "this block is never closed",
        ParseError::Orphan { .. } => "statement outside of any block",
    }
}

/// Render `err` against `source` as an annotated report.
///
/// `name` identifies the source in the report header (usually a file path).
pub fn render(err: &ParseError, name: &str, source: &str, color: bool) -> String {
    let span = err.span();
    // Keep the label inside the source so the report can point at it.
    let span = span.start.min(source.len())..span.end.min(source.len());

    let report = Report::build(ReportKind::Error, (name, span.clone()))
        .with_config(
            Config::default()
                .with_color(color)
                .with_index_type(IndexType::Byte),
        )
        .with_message(err.to_string())
        .with_label(Label::new((name, span)).with_message(label_for(err)))
        .finish();

    let mut out = Vec::new();
    if let Err(e) = report.write((name, Source::from(source)), &mut out) {
        tracing::warn!("Failed to render diagnostic: {}", e);
        return err.to_string();
    }
    String::from_utf8_lossy(&out).into_owned()
}
