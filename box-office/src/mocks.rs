//! In-memory receipt writers for tests and demos.

use crate::error::BoxOfficeError;
use crate::order::Order;
use crate::receipt::{self, DEFAULT_TITLE, ReceiptFuture, ReceiptWriter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Keeps rendered receipts in memory, keyed by file name
#[derive(Debug, Default)]
pub struct MemoryReceiptWriter {
    written: Mutex<Vec<(PathBuf, String)>>,
}

impl MemoryReceiptWriter {
    /// Creates an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn ReceiptWriter> {
        Arc::new(Self::new())
    }

    /// Every receipt written so far, in write order
    #[must_use]
    pub fn written(&self) -> Vec<(PathBuf, String)> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, order: &Order) -> PathBuf {
        let location = PathBuf::from(receipt::file_name(order));
        let text = receipt::render(order, DEFAULT_TITLE);
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        written.retain(|(existing, _)| *existing != location);
        written.push((location.clone(), text));
        location
    }
}

impl ReceiptWriter for MemoryReceiptWriter {
    fn write_receipt(&self, order: Order) -> ReceiptFuture {
        let location = self.store(&order);
        Box::pin(async move { Ok(location) })
    }
}

/// Fails every write until [`FlakyReceiptWriter::recover`] is called
#[derive(Debug, Default)]
pub struct FlakyReceiptWriter {
    failing: AtomicBool,
    inner: MemoryReceiptWriter,
}

impl FlakyReceiptWriter {
    /// Creates a writer that fails until recovered
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: AtomicBool::new(true),
            inner: MemoryReceiptWriter::new(),
        }
    }

    /// Lets subsequent writes succeed
    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    /// Receipts written since recovery
    #[must_use]
    pub fn written(&self) -> Vec<(PathBuf, String)> {
        self.inner.written()
    }
}

impl ReceiptWriter for FlakyReceiptWriter {
    fn write_receipt(&self, order: Order) -> ReceiptFuture {
        if self.failing.load(Ordering::SeqCst) {
            let error = BoxOfficeError::ReceiptWriteFailed {
                order_id: order.id(),
                reason: "receipt storage unavailable".to_string(),
            };
            return Box::pin(async move { Err(error) });
        }
        self.inner.write_receipt(order)
    }
}

/// Holds every write for a fixed delay before storing it in memory
#[derive(Debug)]
pub struct SlowReceiptWriter {
    delay: Duration,
    inner: Arc<MemoryReceiptWriter>,
}

impl SlowReceiptWriter {
    /// Creates a writer whose writes take `delay`
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(MemoryReceiptWriter::new()),
        }
    }

    /// Receipts whose write has finished
    #[must_use]
    pub fn written(&self) -> Vec<(PathBuf, String)> {
        self.inner.written()
    }
}

impl ReceiptWriter for SlowReceiptWriter {
    fn write_receipt(&self, order: Order) -> ReceiptFuture {
        let delay = self.delay;
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(inner.store(&order))
        })
    }
}
