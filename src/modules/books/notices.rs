//! Per-form status messages that clear themselves after a fixed delay.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::ledger::LedgerError;
use super::models::{BorrowReceipt, ReturnReceipt};
use crate::utils::iso_date;

/// Form a notice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Borrow,
    Return,
    AddBook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_days: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            overdue_days: None,
            fee: None,
        }
    }

    pub fn error(err: &LedgerError) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: err.to_string(),
            overdue_days: None,
            fee: None,
        }
    }

    pub fn borrowed(receipt: &BorrowReceipt, reader_id: &str) -> Self {
        Self::success(format!(
            "Lent \"{}\" to {}, due {}",
            receipt.book.title,
            reader_id.trim(),
            iso_date::format(receipt.due_date)
        ))
    }

    /// Success when on time, a warning carrying days and fee when late
    pub fn returned(receipt: &ReturnReceipt) -> Self {
        match receipt.overdue {
            Some(overdue) => Self {
                kind: NoticeKind::Warning,
                message: format!(
                    "Returned \"{}\", {} day(s) overdue, fee {}",
                    receipt.book.title, overdue.days, overdue.fee
                ),
                overdue_days: Some(overdue.days),
                fee: Some(overdue.fee),
            },
            None => Self::success(format!("Returned \"{}\"", receipt.book.title)),
        }
    }
}

/// Latest notice of every form, as the console polls it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveNotices {
    pub borrow: Option<Notice>,
    #[serde(rename = "return")]
    pub return_: Option<Notice>,
    pub add_book: Option<Notice>,
}

/// Holds one notice per channel; a notice reads as absent once `ttl` has
/// passed since it was posted.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    slots: HashMap<Channel, (Notice, Instant)>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: HashMap::new(),
        }
    }

    /// Replace the channel's notice
    pub fn post(&mut self, channel: Channel, notice: Notice, at: Instant) {
        tracing::debug!(?channel, kind = ?notice.kind, message = %notice.message, "notice posted");
        self.slots.insert(channel, (notice, at));
    }

    pub fn current(&self, channel: Channel, now: Instant) -> Option<&Notice> {
        self.slots
            .get(&channel)
            .filter(|(_, posted_at)| now.saturating_duration_since(*posted_at) < self.ttl)
            .map(|(notice, _)| notice)
    }

    pub fn active(&self, now: Instant) -> ActiveNotices {
        ActiveNotices {
            borrow: self.current(Channel::Borrow, now).cloned(),
            return_: self.current(Channel::Return, now).cloned(),
            add_book: self.current(Channel::AddBook, now).cloned(),
        }
    }

    /// Forget expired notices
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.slots
            .retain(|_, (_, posted_at)| now.saturating_duration_since(*posted_at) < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{Book, BookStatus, Category, Overdue};
    use time::macros::date;

    fn book() -> Book {
        Book {
            id: "1".to_string(),
            title: "Clean Code".to_string(),
            isbn: "978-0-13-235088-4".to_string(),
            author: None,
            category: Category::Technology,
            status: BookStatus::Available,
            available_count: 1,
            total_count: 2,
            borrowed_by: None,
            due_date: None,
        }
    }

    #[test]
    fn notice_expires_after_ttl() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_millis(5000));
        board.post(Channel::Borrow, Notice::success("ok"), t0);

        assert!(board
            .current(Channel::Borrow, t0 + Duration::from_millis(4999))
            .is_some());
        assert!(board
            .current(Channel::Borrow, t0 + Duration::from_millis(5000))
            .is_none());
        assert!(board.current(Channel::Return, t0).is_none());
    }

    #[test]
    fn newer_notice_replaces_older() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(5));
        board.post(Channel::AddBook, Notice::success("first"), t0);
        board.post(
            Channel::AddBook,
            Notice::error(&LedgerError::InvalidQuantity),
            t0 + Duration::from_secs(4),
        );

        let notice = board
            .current(Channel::AddBook, t0 + Duration::from_secs(6))
            .unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "quantity must be at least 1");
    }

    #[test]
    fn prune_drops_expired_slots() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(1));
        board.post(Channel::Borrow, Notice::success("old"), t0);
        board.post(
            Channel::Return,
            Notice::success("new"),
            t0 + Duration::from_secs(2),
        );

        board.prune(t0 + Duration::from_secs(2));
        assert_eq!(board.slots.len(), 1);
        assert!(board.active(t0 + Duration::from_secs(2)).return_.is_some());
    }

    #[test]
    fn late_return_becomes_warning() {
        let receipt = ReturnReceipt {
            book: book(),
            overdue: Some(Overdue { days: 6, fee: 30 }),
        };
        let notice = Notice::returned(&receipt);
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.overdue_days, Some(6));
        assert_eq!(notice.fee, Some(30));

        let on_time = Notice::returned(&ReturnReceipt {
            book: book(),
            overdue: None,
        });
        assert_eq!(on_time.kind, NoticeKind::Success);
        assert_eq!(on_time.fee, None);
    }

    #[test]
    fn borrow_notice_names_due_date() {
        let receipt = BorrowReceipt {
            book: book(),
            due_date: date!(2024 - 03 - 15),
        };
        let notice = Notice::borrowed(&receipt, " R001 ");
        assert_eq!(notice.message, "Lent \"Clean Code\" to R001, due 2024-03-15");
    }

    #[test]
    fn active_notices_serialize_by_form() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::new(Duration::from_secs(5));
        board.post(Channel::Return, Notice::success("back"), t0);

        let value = serde_json::to_value(board.active(t0)).unwrap();
        assert_eq!(value["return"]["kind"], "success");
        assert!(value["borrow"].is_null());
        assert!(value["addBook"].is_null());
    }
}
