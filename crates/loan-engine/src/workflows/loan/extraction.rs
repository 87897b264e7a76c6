use std::sync::LazyLock;

use async_trait::async_trait;
use mime::Mime;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel an extraction service replies with when the upload is not a salary document.
pub const NOT_SALARY_DOCUMENT: &str = "WRONG_DOCS";

static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Western (50,000) and Indian (1,25,000) digit grouping, or a bare run of digits.
    Regex::new(r"₹?\s?(\d{1,3}(?:,\d{2,3})*,\d{3}|\d+)(?:\.\d+)?")
        .expect("invalid amount pattern")
});

/// Labels ranked by preference: take-home figures first, gross figures last.
const SALARY_LABELS: &[(&str, u8)] = &[
    ("net salary", 0),
    ("net pay", 0),
    ("net amount", 0),
    ("take home", 0),
    ("monthly salary", 1),
    ("total pay", 1),
    ("earnings total", 1),
    ("ctc monthly", 1),
    ("gross salary", 2),
    ("salary", 3),
];

/// Uploaded document handed to the extraction collaborator.
#[derive(Debug, Clone)]
pub struct SalaryDocument {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    Salary(u64),
    NotSalaryDocument,
}

/// OCR/extraction boundary. Implementations own prompt and vendor details.
#[async_trait]
pub trait SalaryExtractor: Send + Sync {
    async fn extract(&self, document: &SalaryDocument) -> Result<Extraction, ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction backend failed: {0}")]
    Backend(String),
}

/// Interpret a raw extraction reply: the sentinel, or the first salary-like amount.
pub fn parse_extraction_reply(reply: &str) -> Extraction {
    let reply = reply.trim();
    if reply.eq_ignore_ascii_case(NOT_SALARY_DOCUMENT) {
        return Extraction::NotSalaryDocument;
    }

    parse_amount(reply)
        .map(Extraction::Salary)
        .unwrap_or(Extraction::NotSalaryDocument)
}

fn parse_amount(text: &str) -> Option<u64> {
    let captures = AMOUNT_PATTERN.captures(text)?;
    let whole = captures.get(1)?.as_str().replace(',', "");
    whole.parse::<u64>().ok()
}

/// Reads `text/*` salary slips directly, picking the amount on the best ranked label line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSalaryExtractor;

impl PlainTextSalaryExtractor {
    fn extract_from_text(text: &str) -> Extraction {
        let mut best: Option<(u8, u64)> = None;

        for line in text.lines() {
            let lowered = line.to_lowercase();
            let Some((rank, label_end)) = SALARY_LABELS.iter().find_map(|(label, rank)| {
                lowered.find(label).map(|start| (*rank, start + label.len()))
            }) else {
                continue;
            };

            let Some(amount) = lowered.get(label_end..).and_then(parse_amount) else {
                continue;
            };

            if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                best = Some((rank, amount));
            }
        }

        best.map(|(_, amount)| Extraction::Salary(amount))
            .unwrap_or(Extraction::NotSalaryDocument)
    }
}

#[async_trait]
impl SalaryExtractor for PlainTextSalaryExtractor {
    async fn extract(&self, document: &SalaryDocument) -> Result<Extraction, ExtractionError> {
        if document.content_type.type_() != mime::TEXT {
            tracing::debug!(
                content_type = %document.content_type,
                "plain text extractor cannot read this media type"
            );
            return Ok(Extraction::NotSalaryDocument);
        }

        let text = String::from_utf8_lossy(&document.bytes);
        Ok(Self::extract_from_text(&text))
    }
}
