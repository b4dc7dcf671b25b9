//! The box office facade.
//!
//! [`BoxOffice`] owns the store and is the only way callers touch box office
//! state. Reads go through the store's read lock; bookings are sent as
//! commands and the caller waits, with a timeout, for the actions carrying
//! the same request id.

use crate::booking::{self, Quote};
use crate::catalog::{Catalog, Musical, ScheduleEntry};
use crate::config::Config;
use crate::error::BoxOfficeError;
use crate::order::Order;
use crate::receipt::{FileReceiptWriter, ReceiptStatus};
use crate::reducer::{BoxOfficeAction, BoxOfficeEnvironment, BoxOfficeReducer, BoxOfficeState};
use crate::types::{MusicalId, OrderId, RequestId, SeatNumber, ShowId, TicketCounts};
use encore_core::environment::SystemClock;
use encore_runtime::Store;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Store type behind the facade
pub type BoxOfficeStore =
    Store<BoxOfficeState, BoxOfficeAction, BoxOfficeEnvironment, BoxOfficeReducer>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Result of a committed booking
#[derive(Clone, Debug)]
pub struct Confirmation {
    /// The committed order
    pub order: Order,
    /// Receipt location, or why it could not be written
    ///
    /// A failed receipt does not undo the order; see [`BoxOffice::retry_receipt`].
    pub receipt: Result<PathBuf, BoxOfficeError>,
}

/// Entry point for browsing and booking
#[derive(Clone)]
pub struct BoxOffice {
    store: BoxOfficeStore,
    request_timeout: Duration,
}

impl BoxOffice {
    /// Creates a box office over `catalog` with default timeouts
    #[must_use]
    pub fn new(catalog: Catalog, environment: BoxOfficeEnvironment) -> Self {
        Self::with_settings(
            catalog,
            environment,
            DEFAULT_REQUEST_TIMEOUT,
            DEFAULT_BROADCAST_CAPACITY,
        )
    }

    /// Creates a box office with explicit request timeout and outcome buffer size
    #[must_use]
    pub fn with_settings(
        catalog: Catalog,
        environment: BoxOfficeEnvironment,
        request_timeout: Duration,
        broadcast_capacity: usize,
    ) -> Self {
        let store = Store::with_broadcast_capacity(
            BoxOfficeState::new(catalog),
            BoxOfficeReducer::new(),
            environment,
            broadcast_capacity,
        );
        Self {
            store,
            request_timeout,
        }
    }

    /// Creates a box office writing receipts to disk as configured
    #[must_use]
    pub fn from_config(config: &Config, catalog: Catalog) -> Self {
        let environment = BoxOfficeEnvironment::new(
            Arc::new(SystemClock),
            FileReceiptWriter::shared(&config.receipts.dir, config.receipts.title.clone()),
        );
        Self::with_settings(
            catalog,
            environment,
            config.request_timeout(),
            config.booking.broadcast_capacity,
        )
    }

    /// Underlying store, for observers that subscribe to actions
    #[must_use]
    pub const fn store(&self) -> &BoxOfficeStore {
        &self.store
    }

    // ========== Queries ==========

    /// Every musical, in catalog order
    pub async fn list_musicals(&self) -> Vec<Musical> {
        self.store
            .state(|state| state.catalog.list_musicals().to_vec())
            .await
    }

    /// Shows of one musical with free-seat counts
    ///
    /// # Errors
    ///
    /// [`BoxOfficeError::UnknownMusical`] if the musical is not in the catalog.
    pub async fn schedule(
        &self,
        musical_id: MusicalId,
    ) -> Result<Vec<ScheduleEntry>, BoxOfficeError> {
        self.store
            .state(|state| state.catalog.schedule(musical_id))
            .await
            .ok_or(BoxOfficeError::UnknownMusical { musical_id })
    }

    /// Free seats on a show, ascending
    ///
    /// # Errors
    ///
    /// [`BoxOfficeError::UnknownShow`] if the show is not in the catalog.
    pub async fn unbooked_seats(&self, show_id: ShowId) -> Result<Vec<SeatNumber>, BoxOfficeError> {
        self.store
            .state(|state| {
                state
                    .catalog
                    .show(show_id)
                    .map(|(_, show)| show.unbooked_seats())
            })
            .await
            .ok_or(BoxOfficeError::UnknownShow { show_id })
    }

    /// Number of free seats on a show
    ///
    /// # Errors
    ///
    /// [`BoxOfficeError::UnknownShow`] if the show is not in the catalog.
    pub async fn available_seats(&self, show_id: ShowId) -> Result<u32, BoxOfficeError> {
        self.store
            .state(|state| {
                state
                    .catalog
                    .show(show_id)
                    .map(|(_, show)| show.available_seats())
            })
            .await
            .ok_or(BoxOfficeError::UnknownShow { show_id })
    }

    /// Prices a request against current availability without booking
    ///
    /// The quote is only a snapshot; a later booking re-validates.
    ///
    /// # Errors
    ///
    /// [`BoxOfficeError::UnknownShow`] or any booking validation error.
    pub async fn preview(
        &self,
        show_id: ShowId,
        seats: &[SeatNumber],
        tickets: TicketCounts,
    ) -> Result<Quote, BoxOfficeError> {
        self.store
            .state(|state| {
                let (_, show) = state
                    .catalog
                    .show(show_id)
                    .ok_or(BoxOfficeError::UnknownShow { show_id })?;
                booking::preview(show, seats, tickets)
            })
            .await
    }

    /// Committed orders, oldest first
    pub async fn orders(&self) -> Vec<Order> {
        self.store.state(|state| state.orders.clone()).await
    }

    /// Receipt outcome for an order; `None` while the first write is in flight
    /// or for unknown orders
    pub async fn receipt_status(&self, order_id: OrderId) -> Option<ReceiptStatus> {
        self.store
            .state(|state| state.receipt_status(order_id).cloned())
            .await
    }

    /// Most recent rejection
    pub async fn last_error(&self) -> Option<BoxOfficeError> {
        self.store.state(|state| state.last_error.clone()).await
    }

    // ========== Commands ==========

    /// Books `seats` on a show and waits for the booking and receipt outcomes
    ///
    /// Once the booking is confirmed the order is always returned. If the
    /// receipt outcome does not arrive before the request timeout, the
    /// confirmation carries [`BoxOfficeError::Timeout`] as its receipt and the
    /// write can be checked with [`BoxOffice::receipt_status`] or repeated with
    /// [`BoxOffice::retry_receipt`].
    ///
    /// # Errors
    ///
    /// - Any booking validation error, or [`BoxOfficeError::UnknownShow`]
    /// - [`BoxOfficeError::Timeout`] if the booking itself is not decided in time
    /// - [`BoxOfficeError::Unavailable`] if the store is shutting down
    pub async fn book_tickets(
        &self,
        show_id: ShowId,
        seats: Vec<SeatNumber>,
        tickets: TicketCounts,
    ) -> Result<Confirmation, BoxOfficeError> {
        let request_id = RequestId::new();
        tracing::debug!(%request_id, %show_id, seats = seats.len(), "Booking requested");

        let deadline = Instant::now() + self.request_timeout;
        let mut actions = self.store.subscribe_actions();
        self.store
            .send(BoxOfficeAction::BookTickets {
                request_id,
                show_id,
                seats,
                tickets,
            })
            .await?;

        let mut order = None;
        let mut receipt = None;
        while order.is_none() || receipt.is_none() {
            let next = next_action_for(&mut actions, request_id);
            let action = tokio::time::timeout_at(deadline, next)
                .await
                .unwrap_or(Err(BoxOfficeError::Timeout));

            match action {
                Ok(BoxOfficeAction::BookingConfirmed {
                    order: confirmed, ..
                }) => order = Some(confirmed),
                Ok(BoxOfficeAction::BookingRejected { error, .. }) => return Err(error),
                Ok(BoxOfficeAction::ReceiptSaved {
                    order: saved,
                    location,
                    ..
                }) => {
                    order.get_or_insert(saved);
                    receipt = Some(Ok(location));
                },
                Ok(BoxOfficeAction::ReceiptWriteFailed {
                    order: unsaved,
                    error,
                    ..
                }) => {
                    order.get_or_insert(unsaved);
                    receipt = Some(Err(error));
                },
                Ok(_) => {},
                Err(error) => {
                    let Some(order) = order else {
                        tracing::warn!(%request_id, %error, "No booking outcome");
                        return Err(error);
                    };
                    tracing::warn!(
                        %request_id,
                        order_id = %order.id(),
                        %error,
                        "No receipt outcome; order stands"
                    );
                    return Ok(Confirmation {
                        order,
                        receipt: Err(error),
                    });
                },
            }
        }

        match (order, receipt) {
            (Some(order), Some(receipt)) => Ok(Confirmation { order, receipt }),
            _ => Err(BoxOfficeError::Timeout),
        }
    }

    /// Writes the receipt for an existing order again
    ///
    /// # Errors
    ///
    /// - [`BoxOfficeError::UnknownOrder`] if no such order was placed
    /// - [`BoxOfficeError::ReceiptWriteFailed`] if the write fails again
    /// - [`BoxOfficeError::Timeout`] / [`BoxOfficeError::Unavailable`] as for bookings
    pub async fn retry_receipt(&self, order_id: OrderId) -> Result<PathBuf, BoxOfficeError> {
        let request_id = RequestId::new();

        match self
            .request(BoxOfficeAction::RetryReceipt {
                request_id,
                order_id,
            })
            .await?
        {
            BoxOfficeAction::ReceiptSaved { location, .. } => Ok(location),
            BoxOfficeAction::ReceiptWriteFailed { error, .. }
            | BoxOfficeAction::RetryRejected { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        }
    }

    /// Stops accepting requests and waits for in-flight receipt writes
    ///
    /// # Errors
    ///
    /// [`BoxOfficeError::Unavailable`] if receipt writes are still running
    /// when the request timeout elapses.
    pub async fn shutdown(&self) -> Result<(), BoxOfficeError> {
        self.store
            .shutdown(self.request_timeout)
            .await
            .map_err(BoxOfficeError::from)
    }

    async fn request(&self, command: BoxOfficeAction) -> Result<BoxOfficeAction, BoxOfficeError> {
        let request_id = command.request_id();
        self.store
            .send_and_wait_for(
                command,
                move |action| action.is_outcome_for(request_id),
                self.request_timeout,
            )
            .await
            .map_err(BoxOfficeError::from)
    }
}

async fn next_action_for(
    actions: &mut broadcast::Receiver<BoxOfficeAction>,
    request_id: RequestId,
) -> Result<BoxOfficeAction, BoxOfficeError> {
    loop {
        match actions.recv().await {
            Ok(action) if action.request_id() == request_id => return Ok(action),
            Ok(_) => {},
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(%request_id, skipped, "Outcome observer lagged");
            },
            Err(broadcast::error::RecvError::Closed) => {
                return Err(BoxOfficeError::Unavailable {
                    reason: "action broadcast closed".to_string(),
                });
            },
        }
    }
}

fn unexpected(action: &BoxOfficeAction) -> BoxOfficeError {
    BoxOfficeError::Unavailable {
        reason: format!("unexpected outcome action: {action:?}"),
    }
}
