//! Receipts for committed orders.
//!
//! Rendering is pure; persistence goes through the [`ReceiptWriter`] trait so
//! the reducer can run against an in-memory writer in tests.

use crate::error::BoxOfficeError;
use crate::order::Order;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

/// Receipt heading used unless configured otherwise
pub const DEFAULT_TITLE: &str = "London Musical Tickets";

const RULE: &str = "----------------------------------------";

/// Future returned by [`ReceiptWriter::write_receipt`]
pub type ReceiptFuture = Pin<Box<dyn Future<Output = Result<PathBuf, BoxOfficeError>> + Send>>;

/// Renders the plain-text receipt for `order`
#[must_use]
pub fn render(order: &Order, title: &str) -> String {
    let mut lines = vec![
        format!("{title} - Receipt"),
        format!("Order ID: {}", order.id()),
        format!("Musical: {}", order.musical_name()),
        format!(
            "Show: {} {}",
            order.show_date(),
            order.show_time().format("%H:%M")
        ),
        RULE.to_string(),
        format!("{:<8} {:<10} Price", "Seat", "Type"),
        RULE.to_string(),
    ];
    lines.extend(order.lines().iter().map(|line| {
        format!(
            "{:<8} {:<10} {}",
            line.seat, line.ticket_type, line.unit_price
        )
    }));
    lines.push(RULE.to_string());
    lines.push(format!("Total: {}", order.total()));
    lines.push("Thank you for your purchase!".to_string());

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// `receipt_<yyyyMMdd_HHmmss>_<first 8 chars of order id>.txt`, stamped with the
/// order's placement time
#[must_use]
pub fn file_name(order: &Order) -> String {
    format!(
        "receipt_{}_{}.txt",
        order.placed_at().format("%Y%m%d_%H%M%S"),
        order.id().short()
    )
}

/// Where a receipt ended up, as recorded in box office state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Persisted at `location`
    Saved {
        /// Where the receipt was written
        location: PathBuf,
    },
    /// The last attempt failed; the order stands and the receipt can be retried
    Failed {
        /// Why the write failed
        reason: String,
    },
}

/// Persists receipts
///
/// Abstraction over the receipt destination so reducers stay testable.
pub trait ReceiptWriter: Send + Sync {
    /// Writes the receipt for `order` and returns where it was stored
    ///
    /// Writing the same order twice replaces the earlier receipt.
    ///
    /// # Errors
    ///
    /// Returns [`BoxOfficeError::ReceiptWriteFailed`] if the receipt could not
    /// be stored.
    fn write_receipt(&self, order: Order) -> ReceiptFuture;
}

/// Writes receipts as text files into one directory
#[derive(Clone, Debug)]
pub struct FileReceiptWriter {
    dir: PathBuf,
    title: String,
}

impl FileReceiptWriter {
    /// Creates a writer for `dir`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            title: title.into(),
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(dir: impl Into<PathBuf>, title: impl Into<String>) -> Arc<dyn ReceiptWriter> {
        Arc::new(Self::new(dir, title))
    }

    /// Receipt directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReceiptWriter for FileReceiptWriter {
    fn write_receipt(&self, order: Order) -> ReceiptFuture {
        let dir = self.dir.clone();
        let title = self.title.clone();

        Box::pin(async move {
            let failed = |error: std::io::Error| BoxOfficeError::ReceiptWriteFailed {
                order_id: order.id(),
                reason: error.to_string(),
            };

            tokio::fs::create_dir_all(&dir).await.map_err(failed)?;

            let path = dir.join(file_name(&order));
            tokio::fs::write(&path, render(&order, &title))
                .await
                .map_err(failed)?;

            let location = std::path::absolute(&path).unwrap_or(path);
            tracing::debug!(
                order_id = %order.id(),
                location = %location.display(),
                "Receipt written"
            );
            Ok(location)
        })
    }
}
