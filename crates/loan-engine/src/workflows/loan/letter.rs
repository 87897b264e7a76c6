use std::fmt::Debug;
use std::fmt::Write as _;

use mime::Mime;
use serde::Serialize;

/// Figures printed on a sanction letter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanctionTerms {
    pub customer_name: String,
    pub principal: u64,
    pub duration_months: u32,
    pub monthly_installment: f64,
}

/// Rendered letter, passed through to the caller untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SanctionLetter {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

pub trait LetterRenderer: Send + Sync + Debug {
    fn render(&self, terms: &SanctionTerms) -> Result<SanctionLetter, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unable to render sanction letter: {0}")]
    Template(String),
}

#[derive(Debug, Clone)]
pub struct PlainTextLetterRenderer {
    lender_name: String,
}

impl PlainTextLetterRenderer {
    pub fn new(lender_name: impl Into<String>) -> Self {
        Self {
            lender_name: lender_name.into(),
        }
    }
}

impl LetterRenderer for PlainTextLetterRenderer {
    fn render(&self, terms: &SanctionTerms) -> Result<SanctionLetter, RenderError> {
        let mut body = String::new();
        let map_err = |err: std::fmt::Error| RenderError::Template(err.to_string());

        writeln!(body, "Dear {},", terms.customer_name).map_err(map_err)?;
        writeln!(body).map_err(map_err)?;
        writeln!(
            body,
            "Congratulations! Your personal loan request has been approved."
        )
        .map_err(map_err)?;
        writeln!(body).map_err(map_err)?;
        writeln!(body, "Loan Details:").map_err(map_err)?;
        writeln!(body, "- Loan Amount: {:.2}", terms.principal as f64).map_err(map_err)?;
        writeln!(body, "- Tenure: {} months", terms.duration_months).map_err(map_err)?;
        writeln!(body, "- EMI: {:.2}", terms.monthly_installment).map_err(map_err)?;
        writeln!(body).map_err(map_err)?;
        writeln!(body, "Regards,").map_err(map_err)?;
        writeln!(body, "{}", self.lender_name).map_err(map_err)?;

        Ok(SanctionLetter {
            file_name: "sanction_letter.txt".to_string(),
            content_type: mime::TEXT_PLAIN_UTF_8,
            bytes: body.into_bytes(),
        })
    }
}
