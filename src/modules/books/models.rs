use serde::{Deserialize, Serialize};
use time::Date;

use crate::utils::iso_date;

/// Lending state of a catalogued title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    /// At least one copy can be lent
    Available,
    /// Every copy is out on loan
    Borrowed,
    /// Catalogued but not on the shelf; cannot be lent
    Inactive,
}

/// Shelf category offered by the add-book form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Literature,
    Science,
    Technology,
    History,
    Art,
    Philosophy,
    Business,
    Education,
}

/// A catalogued title and the state of its copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque unique identifier
    pub id: String,
    pub title: String,
    /// Business key; unique across the ledger
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub category: Category,
    pub status: BookStatus,
    /// Copies on the shelf, never above `total_count`
    pub available_count: u32,
    /// Copies owned, at least one
    pub total_count: u32,
    /// Reader holding the most recent loan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_by: Option<String>,
    /// Due date of the most recent loan
    #[serde(
        default,
        with = "iso_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Date>,
}

impl Book {
    /// Whether any copy is currently out
    pub fn has_active_loan(&self) -> bool {
        self.available_count < self.total_count
    }
}

/// Request submitted by the borrow form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowBook {
    pub reader_id: String,
    pub isbn: String,
    /// Defaults to the lending policy's loan period when absent
    #[serde(
        default,
        with = "iso_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Date>,
}

/// Request submitted by the return form or the table's return shortcut.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBook {
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_id: Option<String>,
}

/// Request submitted by the add-book form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBook {
    pub title: String,
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub category: Category,
    pub quantity: u32,
    #[serde(default = "AddBook::default_is_active")]
    pub is_active: bool,
}

impl AddBook {
    fn default_is_active() -> bool {
        true
    }
}

/// Outcome of a successful borrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowReceipt {
    pub book: Book,
    /// Effective due date, given or defaulted
    #[serde(with = "iso_date")]
    pub due_date: Date,
}

/// Outcome of a successful return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReceipt {
    pub book: Book,
    /// Present only when the copy came back late
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue: Option<Overdue>,
}

/// Lateness of a returned copy and the fee owed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overdue {
    pub days: u64,
    pub fee: u64,
}
