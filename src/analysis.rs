//! Typed view of the analysis the model is asked to produce.
//!
//! The HTTP response is the model's JSON object itself; [`LetterAnalysis`] is
//! only used to check that object against the documented schema.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Letter category, applied by the model in precedence order
/// FINANCIAL > DEADLINE > INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Deadline,
    Financial,
    Info,
}

/// One analysed letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LetterAnalysis {
    pub category: Category,
    pub summary_german: String,
    /// Due date at end of day (`T21:00:00`).
    pub deadline_date: Option<NaiveDateTime>,
    pub deadline_subject: Option<String>,
    pub payment_amount: Option<f64>,
    pub payment_currency: Option<String>,
    pub payment_recipient: Option<String>,
    pub full_analysis_log: String,
}

/// Time of day every deadline is pinned to.
pub fn deadline_time() -> NaiveTime {
    NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default()
}

impl LetterAnalysis {
    /// Checks that serde cannot express. Returns the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(date) = self.deadline_date {
            if date.time() != deadline_time() {
                return Err(format!(
                    "deadline_date must use T21:00:00, got {:02}:{:02}:{:02}",
                    date.hour(),
                    date.minute(),
                    date.second()
                ));
            }
        }
        if let Some(amount) = self.payment_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(format!("payment_amount must be a non-negative number, got {amount}"));
            }
        }
        Ok(())
    }
}
