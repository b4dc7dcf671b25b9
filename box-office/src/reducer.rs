//! Box office reducer.
//!
//! Commands are validated and committed inside `reduce`, which the store runs
//! under its write lock. That makes "check the seats are free, then book them"
//! a single critical section: two requests racing for the same seat see each
//! other's effect on the seat map, and exactly one wins.
//!
//! A committed booking is announced at once with
//! [`BoxOfficeAction::BookingConfirmed`]. Receipt persistence runs in a second
//! effect; its outcome comes back as [`BoxOfficeAction::ReceiptSaved`] or
//! [`BoxOfficeAction::ReceiptWriteFailed`], and a failed receipt never undoes
//! the booking.

use crate::booking;
use crate::catalog::Catalog;
use crate::error::BoxOfficeError;
use crate::metrics;
use crate::order::Order;
use crate::receipt::{ReceiptStatus, ReceiptWriter};
use crate::types::{OrderId, RequestId, SeatNumber, ShowId, TicketCounts};
use encore_core::environment::Clock;
use encore_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Everything the box office knows
#[derive(Clone, Debug, Default)]
pub struct BoxOfficeState {
    /// Musicals, shows, and seat maps
    pub catalog: Catalog,
    /// Committed orders, oldest first
    pub orders: Vec<Order>,
    /// Receipt outcome per order; absent while the first write is in flight
    pub receipts: HashMap<OrderId, ReceiptStatus>,
    /// Most recent booking rejection, cleared by the next successful booking
    pub last_error: Option<BoxOfficeError>,
}

impl BoxOfficeState {
    /// Creates state with no orders
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Looks up a committed order
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id() == order_id)
    }

    /// Receipt outcome for an order
    #[must_use]
    pub fn receipt_status(&self, order_id: OrderId) -> Option<&ReceiptStatus> {
        self.receipts.get(&order_id)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Box office actions (commands and the events effects feed back)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxOfficeAction {
    // Commands
    /// Book seats on a show
    BookTickets {
        /// Correlates the outcome with this request
        request_id: RequestId,
        /// Target show
        show_id: ShowId,
        /// Seats in request order
        seats: Vec<SeatNumber>,
        /// Tickets per type; total must equal the number of seats
        tickets: TicketCounts,
    },

    /// Write the receipt for an existing order again
    RetryReceipt {
        /// Correlates the outcome with this request
        request_id: RequestId,
        /// Order whose receipt to write
        order_id: OrderId,
    },

    // Events
    /// Seats booked and the order recorded; the receipt is still being written
    BookingConfirmed {
        /// Request that produced the order
        request_id: RequestId,
        /// The committed order
        order: Order,
    },

    /// A booking was refused; state is unchanged apart from `last_error`
    BookingRejected {
        /// Request that was refused
        request_id: RequestId,
        /// Why
        error: BoxOfficeError,
    },

    /// A receipt retry named an order that was never placed
    RetryRejected {
        /// Request that was refused
        request_id: RequestId,
        /// Why
        error: BoxOfficeError,
    },

    /// Order committed and its receipt written
    ReceiptSaved {
        /// Request that produced the order or retry
        request_id: RequestId,
        /// The committed order
        order: Order,
        /// Where the receipt was written
        location: PathBuf,
    },

    /// Order committed but the receipt could not be written
    ReceiptWriteFailed {
        /// Request that produced the order or retry
        request_id: RequestId,
        /// The committed order
        order: Order,
        /// Why the write failed
        error: BoxOfficeError,
    },
}

impl BoxOfficeAction {
    /// Request this action belongs to
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::BookTickets { request_id, .. }
            | Self::RetryReceipt { request_id, .. }
            | Self::BookingConfirmed { request_id, .. }
            | Self::BookingRejected { request_id, .. }
            | Self::RetryRejected { request_id, .. }
            | Self::ReceiptSaved { request_id, .. }
            | Self::ReceiptWriteFailed { request_id, .. } => *request_id,
        }
    }

    /// Whether this is the final action for its request
    ///
    /// `BookingConfirmed` is not final: the receipt outcome follows it.
    #[must_use]
    pub const fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::BookingRejected { .. }
                | Self::RetryRejected { .. }
                | Self::ReceiptSaved { .. }
                | Self::ReceiptWriteFailed { .. }
        )
    }

    /// Whether this is the final action for `request_id`
    #[must_use]
    pub fn is_outcome_for(&self, request_id: RequestId) -> bool {
        self.is_outcome() && self.request_id() == request_id
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies injected into the box office reducer
#[derive(Clone)]
pub struct BoxOfficeEnvironment {
    /// Clock for order timestamps
    pub clock: Arc<dyn Clock>,
    /// Receipt destination
    pub receipts: Arc<dyn ReceiptWriter>,
}

impl BoxOfficeEnvironment {
    /// Creates a new `BoxOfficeEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, receipts: Arc<dyn ReceiptWriter>) -> Self {
        Self { clock, receipts }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the box office
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxOfficeReducer;

impl BoxOfficeReducer {
    /// Creates a new `BoxOfficeReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(
        state: &mut BoxOfficeState,
        request_id: RequestId,
        error: BoxOfficeError,
    ) -> Effect<BoxOfficeAction> {
        tracing::warn!(%request_id, %error, "Booking rejected");
        metrics::record_booking_rejected(&error);
        state.last_error = Some(error.clone());
        Effect::emit(BoxOfficeAction::BookingRejected { request_id, error })
    }

    fn reject_retry(request_id: RequestId, error: BoxOfficeError) -> Effect<BoxOfficeAction> {
        tracing::warn!(%request_id, %error, "Receipt retry rejected");
        metrics::record_receipt_retry_rejected(&error);
        Effect::emit(BoxOfficeAction::RetryRejected { request_id, error })
    }

    fn write_receipt(
        request_id: RequestId,
        order: Order,
        env: &BoxOfficeEnvironment,
    ) -> Effect<BoxOfficeAction> {
        let writer = Arc::clone(&env.receipts);
        async_effect! {
            let result = writer.write_receipt(order.clone()).await;
            match result {
                Ok(location) => Some(BoxOfficeAction::ReceiptSaved {
                    request_id,
                    order,
                    location,
                }),
                Err(error) => Some(BoxOfficeAction::ReceiptWriteFailed {
                    request_id,
                    order,
                    error,
                }),
            }
        }
    }
}

impl Reducer for BoxOfficeReducer {
    type State = BoxOfficeState;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            BoxOfficeAction::BookTickets {
                request_id,
                show_id,
                seats,
                tickets,
            } => {
                let span = tracing::info_span!("book_tickets", %request_id, %show_id);
                let _enter = span.enter();

                let order_id = OrderId::new();
                match booking::book(
                    &mut state.catalog,
                    show_id,
                    &seats,
                    tickets,
                    order_id,
                    env.clock.now(),
                ) {
                    Ok(order) => {
                        let available = state
                            .catalog
                            .show(show_id)
                            .map_or(0, |(_, show)| show.available_seats());
                        tracing::info!(
                            %order_id,
                            seats = seats.len(),
                            total = %order.total(),
                            available,
                            "Booking confirmed"
                        );
                        metrics::record_booking_confirmed(&order, show_id, available);

                        state.orders.push(order.clone());
                        state.last_error = None;
                        smallvec![
                            Effect::emit(BoxOfficeAction::BookingConfirmed {
                                request_id,
                                order: order.clone(),
                            }),
                            Self::write_receipt(request_id, order, env),
                        ]
                    },
                    Err(error) => smallvec![Self::reject(state, request_id, error)],
                }
            },

            BoxOfficeAction::RetryReceipt {
                request_id,
                order_id,
            } => match state.order(order_id).cloned() {
                Some(order) => {
                    tracing::info!(%request_id, %order_id, "Retrying receipt");
                    smallvec![Self::write_receipt(request_id, order, env)]
                },
                None => smallvec![Self::reject_retry(
                    request_id,
                    BoxOfficeError::UnknownOrder { order_id }
                )],
            },

            // ========== Events ==========
            BoxOfficeAction::BookingConfirmed { .. }
            | BoxOfficeAction::BookingRejected { .. }
            | BoxOfficeAction::RetryRejected { .. } => smallvec![Effect::None],

            BoxOfficeAction::ReceiptSaved {
                order, location, ..
            } => {
                tracing::info!(
                    order_id = %order.id(),
                    location = %location.display(),
                    "Receipt saved"
                );
                metrics::record_receipt(true);
                state
                    .receipts
                    .insert(order.id(), ReceiptStatus::Saved { location });
                smallvec![Effect::None]
            },

            BoxOfficeAction::ReceiptWriteFailed { order, error, .. } => {
                tracing::warn!(
                    order_id = %order.id(),
                    %error,
                    "Receipt write failed; order stands"
                );
                metrics::record_receipt(false);
                state.receipts.insert(
                    order.id(),
                    ReceiptStatus::Failed {
                        reason: error.to_string(),
                    },
                );
                smallvec![Effect::None]
            },
        }
    }
}
