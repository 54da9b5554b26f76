//! Expense records, edit drafts, and list filters.
//!
//! `ExpenseRecord` is owned server-side; the client only ever holds a read
//! cache of it. `ExpenseDraft` is the client-side shape submitted to the
//! create/update endpoints, validated before any request is issued.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// A single dated expense entry as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Client-side shape for create/update submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExpenseDraft {
    /// Validate the draft before any network round trip.
    ///
    /// Obviously-invalid input never reaches the server: title, category and
    /// date must be non-empty, the date must be a real ISO calendar date,
    /// and the amount must be a finite number.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(ApiError::Validation("Category is required".into()));
        }
        if self.date.trim().is_empty() {
            return Err(ApiError::Validation("Date is required".into()));
        }
        if iso_date(&self.date).is_none() {
            return Err(ApiError::Validation(format!(
                "Not a valid date: {}",
                self.date
            )));
        }
        if !self.amount.is_finite() {
            return Err(ApiError::Validation("Amount must be a number".into()));
        }
        Ok(())
    }

    /// Dirty-check: true when submitting this draft would change nothing.
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        self.title == record.title
            && self.amount == record.amount
            && self.category == record.category
            && self.date == record.date
            && self.note == record.note
    }
}

/// Parse the leading `YYYY-MM-DD` of an ISO date string, tolerating a
/// trailing time component as sent by the server.
fn iso_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse a `YYYY-MM` month filter as the first day of that month.
fn calendar_month(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
}

/// Server-side sort direction by expense date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Asc,
    #[default]
    #[serde(rename = "desc")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filters applied to the expense list; serialized as query parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpenseFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Calendar month in `YYYY-MM` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl ExpenseFilters {
    /// Validate the filters before any network round trip. The month, when
    /// set, must name a real `YYYY-MM` calendar month.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref month) = self.month {
            if calendar_month(month).is_none() {
                return Err(ApiError::Validation(format!(
                    "Not a valid month: {month}"
                )));
            }
        }
        Ok(())
    }

    /// Query pairs for the list/export endpoints, omitting unset filters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref category) = self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(ref month) = self.month {
            pairs.push(("month", month.clone()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs
    }
}

/// Per-category aggregate over a set of expense records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Sum of all amounts in `expenses`.
pub fn total_spent(expenses: &[ExpenseRecord]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Amounts grouped by category, one entry per category in order of first
/// appearance, ready for a summary table or chart.
pub fn category_totals(expenses: &[ExpenseRecord]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(entry) => entry.total += expense.amount,
            None => totals.push(CategoryTotal {
                category: expense.category.clone(),
                total: expense.amount,
            }),
        }
    }
    totals
}

/// One page of expenses as returned by `GET /expenses`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpensePage {
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    pub page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(default)]
    pub total: u64,
}
