//! In-memory inventory ledger: borrow, return and catalogue books by ISBN.
//!
//! Every operation validates its input and preconditions before touching a
//! record, so a failed call leaves the ledger exactly as it was.

use std::collections::HashMap;

use libadmin_kernel::settings::LedgerSettings;
use thiserror::Error;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use super::models::{
    AddBook, Book, BookStatus, BorrowBook, BorrowReceipt, Category, Overdue, ReturnBook,
    ReturnReceipt,
};

/// Why a ledger operation was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no book with ISBN {isbn}")]
    NotFound { isbn: String },

    #[error("every copy of {isbn} is already on loan")]
    OutOfStock { isbn: String },

    #[error("{isbn} is not shelved and cannot be lent")]
    Inactive { isbn: String },

    #[error("{isbn} has no copy on loan")]
    NoActiveLoan { isbn: String },

    #[error("ISBN {isbn} is already catalogued")]
    DuplicateIsbn { isbn: String },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

impl LedgerError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::OutOfStock { .. } => "out_of_stock",
            Self::Inactive { .. } => "inactive",
            Self::NoActiveLoan { .. } => "no_active_loan",
            Self::DuplicateIsbn { .. } => "duplicate_isbn",
            Self::EmptyField { .. } | Self::InvalidQuantity => "validation_error",
        }
    }
}

/// Loan period and late fee applied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    pub loan_period: Duration,
    /// Fee per overdue day, whole currency units
    pub daily_fine: u64,
}

impl LendingPolicy {
    pub fn from_settings(settings: &LedgerSettings) -> Self {
        Self {
            loan_period: Duration::days(i64::from(settings.loan_period_days)),
            daily_fine: settings.daily_fine,
        }
    }

    /// Due date of a loan starting at `now` when the borrower names none
    pub fn default_due_date(&self, now: OffsetDateTime) -> Date {
        (now + self.loan_period).date()
    }

    /// Whole days past `due`, counted from midnight UTC of the due date
    pub fn overdue_days(&self, due: Option<Date>, now: OffsetDateTime) -> u64 {
        let Some(due) = due else {
            return 0;
        };
        let elapsed = now - due.midnight().assume_utc();
        // Truncation equals floor once negatives are clamped away.
        u64::try_from(elapsed.whole_days()).unwrap_or(0)
    }

    pub fn fee_for(&self, overdue_days: u64) -> u64 {
        overdue_days.saturating_mul(self.daily_fine)
    }
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self::from_settings(&LedgerSettings::default())
    }
}

/// Book records in insertion order, indexed by ISBN.
#[derive(Debug, Clone)]
pub struct Ledger {
    books: Vec<Book>,
    by_isbn: HashMap<String, usize>,
    policy: LendingPolicy,
}

impl Ledger {
    pub fn new(policy: LendingPolicy) -> Self {
        Self {
            books: Vec::new(),
            by_isbn: HashMap::new(),
            policy,
        }
    }

    /// Build a ledger from existing records, rejecting repeated ISBNs
    pub fn with_books(
        policy: LendingPolicy,
        books: impl IntoIterator<Item = Book>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(policy);
        for book in books {
            ledger.insert(book)?;
        }
        Ok(ledger)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, isbn: &str) -> Option<&Book> {
        self.by_isbn.get(isbn.trim()).map(|&idx| &self.books[idx])
    }

    /// All records in the order they were catalogued
    pub fn list(&self) -> &[Book] {
        &self.books
    }

    /// Case-insensitive match on title, ISBN or author; blank matches all
    pub fn search(&self, query: &str) -> Vec<&Book> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.books.iter().collect();
        }

        self.books
            .iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.isbn.to_lowercase().contains(&needle)
                    || book
                        .author
                        .as_deref()
                        .is_some_and(|author| author.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Lend one copy to a reader.
    pub fn borrow(
        &mut self,
        request: BorrowBook,
        now: OffsetDateTime,
    ) -> Result<BorrowReceipt, LedgerError> {
        let reader_id = required(&request.reader_id, "readerId")?;
        let isbn = required(&request.isbn, "isbn")?;
        let idx = self.position(isbn)?;

        let policy = self.policy;
        let book = &mut self.books[idx];
        if book.available_count == 0 {
            return Err(LedgerError::OutOfStock {
                isbn: isbn.to_string(),
            });
        }
        if book.status == BookStatus::Inactive {
            return Err(LedgerError::Inactive {
                isbn: isbn.to_string(),
            });
        }

        let due_date = request
            .due_date
            .unwrap_or_else(|| policy.default_due_date(now));

        book.available_count -= 1;
        if book.available_count == 0 {
            book.status = BookStatus::Borrowed;
        }
        book.borrowed_by = Some(reader_id.to_string());
        book.due_date = Some(due_date);

        tracing::info!(
            isbn = %book.isbn,
            reader_id,
            %due_date,
            available = book.available_count,
            total = book.total_count,
            "book borrowed"
        );

        Ok(BorrowReceipt {
            book: book.clone(),
            due_date,
        })
    }

    /// Take one copy back, charging for any days past the due date.
    pub fn return_book(
        &mut self,
        request: ReturnBook,
        now: OffsetDateTime,
    ) -> Result<ReturnReceipt, LedgerError> {
        let isbn = required(&request.isbn, "isbn")?;
        let idx = self.position(isbn)?;

        let policy = self.policy;
        let book = &mut self.books[idx];
        if !book.has_active_loan() {
            return Err(LedgerError::NoActiveLoan {
                isbn: isbn.to_string(),
            });
        }

        let overdue_days = policy.overdue_days(book.due_date, now);

        book.available_count += 1;
        if book.status != BookStatus::Inactive {
            book.status = BookStatus::Available;
        }
        book.borrowed_by = None;
        book.due_date = None;

        let overdue = (overdue_days > 0).then(|| Overdue {
            days: overdue_days,
            fee: policy.fee_for(overdue_days),
        });

        tracing::info!(
            isbn = %book.isbn,
            reader_id = request.reader_id.as_deref().unwrap_or("-"),
            overdue_days,
            available = book.available_count,
            total = book.total_count,
            "book returned"
        );

        Ok(ReturnReceipt {
            book: book.clone(),
            overdue,
        })
    }

    /// Catalogue a new title with `quantity` copies.
    pub fn add_book(&mut self, request: AddBook) -> Result<Book, LedgerError> {
        let title = required(&request.title, "title")?;
        let isbn = required(&request.isbn, "isbn")?;
        if request.quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }

        let book = Book {
            id: Uuid::now_v7().to_string(),
            title: title.to_string(),
            isbn: isbn.to_string(),
            author: request
                .author
                .as_deref()
                .map(str::trim)
                .filter(|author| !author.is_empty())
                .map(str::to_string),
            category: request.category,
            status: if request.is_active {
                BookStatus::Available
            } else {
                BookStatus::Inactive
            },
            available_count: request.quantity,
            total_count: request.quantity,
            borrowed_by: None,
            due_date: None,
        };

        self.insert(book.clone())?;

        tracing::info!(
            isbn = %book.isbn,
            quantity = book.total_count,
            status = ?book.status,
            "book added"
        );

        Ok(book)
    }

    fn position(&self, isbn: &str) -> Result<usize, LedgerError> {
        self.by_isbn
            .get(isbn)
            .copied()
            .ok_or_else(|| LedgerError::NotFound {
                isbn: isbn.to_string(),
            })
    }

    fn insert(&mut self, book: Book) -> Result<(), LedgerError> {
        if self.by_isbn.contains_key(&book.isbn) {
            return Err(LedgerError::DuplicateIsbn { isbn: book.isbn });
        }
        self.by_isbn.insert(book.isbn.clone(), self.books.len());
        self.books.push(book);
        Ok(())
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::EmptyField { field });
    }
    Ok(value)
}

/// Titles the console starts with when demo data is enabled.
pub fn demo_books() -> Vec<Book> {
    fn seed(
        id: &str,
        title: &str,
        isbn: &str,
        author: &str,
        category: Category,
        status: BookStatus,
        available_count: u32,
        total_count: u32,
    ) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            isbn: isbn.to_string(),
            author: Some(author.to_string()),
            category,
            status,
            available_count,
            total_count,
            borrowed_by: None,
            due_date: None,
        }
    }

    vec![
        seed(
            "1",
            "The Kite Runner",
            "978-986-213-999-1",
            "Khaled Hosseini",
            Category::Literature,
            BookStatus::Available,
            3,
            3,
        ),
        seed(
            "2",
            "Deep Learning",
            "978-7-115-48570-5",
            "Ian Goodfellow",
            Category::Technology,
            BookStatus::Borrowed,
            0,
            2,
        ),
        seed(
            "3",
            "Sapiens: A Brief History of Humankind",
            "978-986-320-175-5",
            "Yuval Noah Harari",
            Category::History,
            BookStatus::Available,
            2,
            4,
        ),
        seed(
            "4",
            "Clean Code",
            "978-0-13-235088-4",
            "Robert C. Martin",
            Category::Technology,
            BookStatus::Available,
            1,
            2,
        ),
    ]
}
