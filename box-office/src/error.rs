//! Error types for the box office.

use crate::types::{MusicalId, OrderId, SeatNumber, ShowId};
use encore_runtime::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can go wrong while browsing or booking
///
/// Errors are values: they travel inside actions and are kept in state, so the
/// type is `Clone` and serializable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxOfficeError {
    /// The booking request named no seats
    #[error("No seats selected")]
    NoSeatsSelected,

    /// Seat count and ticket count disagree
    #[error("Number of tickets ({tickets}) must equal number of seats selected ({seats})")]
    TicketCountMismatch {
        /// Seats requested
        seats: usize,
        /// Tickets requested across all types
        tickets: u64,
    },

    /// One or more requested seats are already taken
    #[error("Seats already booked: {}", join_seats(.seats))]
    SeatAlreadyBooked {
        /// Every requested seat that was taken, in request order
        seats: Vec<SeatNumber>,
    },

    /// A seat number lies outside the show's seat map
    #[error("Seat {seat} does not exist (valid seats are S1 to S{capacity})")]
    InvalidSeatNumber {
        /// The offending seat
        seat: SeatNumber,
        /// Seats on the show's seat map
        capacity: u32,
    },

    /// The same seat appears more than once in one request
    #[error("Seat {seat} was selected more than once")]
    DuplicateSeat {
        /// The repeated seat
        seat: SeatNumber,
    },

    /// No show with this id in the catalog
    #[error("Show not found: {show_id}")]
    UnknownShow {
        /// Requested show
        show_id: ShowId,
    },

    /// No musical with this id in the catalog
    #[error("Musical not found: {musical_id}")]
    UnknownMusical {
        /// Requested musical
        musical_id: MusicalId,
    },

    /// No order with this id has been placed
    #[error("Order not found: {order_id}")]
    UnknownOrder {
        /// Requested order
        order_id: OrderId,
    },

    /// Musicals must have a non-blank name
    #[error("Musical name must not be empty")]
    EmptyMusicalName,

    /// Text that does not name a seat
    #[error("Invalid seat label: {label:?}")]
    InvalidSeatLabel {
        /// The text as given
        label: String,
    },

    /// The receipt for a committed order could not be persisted
    #[error("Failed to write receipt for order {order_id}: {reason}")]
    ReceiptWriteFailed {
        /// Order whose receipt failed
        order_id: OrderId,
        /// Underlying cause
        reason: String,
    },

    /// The store did not answer within the request timeout
    #[error("Timed out waiting for the box office")]
    Timeout,

    /// The store cannot take requests
    #[error("Box office unavailable: {reason}")]
    Unavailable {
        /// Underlying cause
        reason: String,
    },
}

impl BoxOfficeError {
    /// Stable machine-readable code, used as a metrics label
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoSeatsSelected => "no_seats_selected",
            Self::TicketCountMismatch { .. } => "ticket_count_mismatch",
            Self::SeatAlreadyBooked { .. } => "seat_already_booked",
            Self::InvalidSeatNumber { .. } => "invalid_seat_number",
            Self::DuplicateSeat { .. } => "duplicate_seat",
            Self::UnknownShow { .. } => "unknown_show",
            Self::UnknownMusical { .. } => "unknown_musical",
            Self::UnknownOrder { .. } => "unknown_order",
            Self::EmptyMusicalName => "empty_musical_name",
            Self::InvalidSeatLabel { .. } => "invalid_seat_label",
            Self::ReceiptWriteFailed { .. } => "receipt_write_failed",
            Self::Timeout => "timeout",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

impl From<StoreError> for BoxOfficeError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Timeout => Self::Timeout,
            other => Self::Unavailable {
                reason: other.to_string(),
            },
        }
    }
}

fn join_seats(seats: &[SeatNumber]) -> String {
    seats
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_booked_lists_every_seat() {
        let error = BoxOfficeError::SeatAlreadyBooked {
            seats: vec![SeatNumber::new(3), SeatNumber::new(9)],
        };
        assert_eq!(error.to_string(), "Seats already booked: S3, S9");
    }

    #[test]
    fn mismatch_message_names_both_counts() {
        let error = BoxOfficeError::TicketCountMismatch {
            seats: 3,
            tickets: 2,
        };
        assert_eq!(
            error.to_string(),
            "Number of tickets (2) must equal number of seats selected (3)"
        );
    }

    #[test]
    fn store_timeout_maps_to_timeout() {
        assert_eq!(BoxOfficeError::from(StoreError::Timeout), BoxOfficeError::Timeout);
        assert!(matches!(
            BoxOfficeError::from(StoreError::ShutdownInProgress),
            BoxOfficeError::Unavailable { .. }
        ));
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(BoxOfficeError::NoSeatsSelected.code(), "no_seats_selected");
        assert_eq!(BoxOfficeError::Timeout.code(), "timeout");
    }
}
