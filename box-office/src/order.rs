//! Completed orders.

use crate::types::{Money, OrderId, SeatNumber, TicketType};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One seat on an order, with the ticket type and price it was sold at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Booked seat
    pub seat: SeatNumber,
    /// Pricing category
    pub ticket_type: TicketType,
    /// Price charged for this seat
    pub unit_price: Money,
}

impl OrderLine {
    /// Prices `seat` at the current rate for `ticket_type`
    #[must_use]
    pub const fn new(seat: SeatNumber, ticket_type: TicketType) -> Self {
        Self {
            seat,
            ticket_type,
            unit_price: ticket_type.unit_price(),
        }
    }
}

/// Record of a committed booking
///
/// Orders are only built by a successful booking and never change afterwards.
/// The total is always the sum of the line prices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    musical_name: String,
    show_date: NaiveDate,
    show_time: NaiveTime,
    lines: Vec<OrderLine>,
    total: Money,
    placed_at: DateTime<Utc>,
}

impl Order {
    pub(crate) fn new(
        id: OrderId,
        musical_name: String,
        show_date: NaiveDate,
        show_time: NaiveTime,
        lines: Vec<OrderLine>,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let total = lines.iter().map(|line| line.unit_price).sum();
        Self {
            id,
            musical_name,
            show_date,
            show_time,
            lines,
            total,
            placed_at,
        }
    }

    /// Order identifier
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Name of the musical at the time of booking
    #[must_use]
    pub fn musical_name(&self) -> &str {
        &self.musical_name
    }

    /// Performance date
    #[must_use]
    pub const fn show_date(&self) -> NaiveDate {
        self.show_date
    }

    /// Curtain time
    #[must_use]
    pub const fn show_time(&self) -> NaiveTime {
        self.show_time
    }

    /// Lines in the order the seats were requested
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Booked seats in request order
    pub fn seats(&self) -> impl Iterator<Item = SeatNumber> + '_ {
        self.lines.iter().map(|line| line.seat)
    }

    /// Number of tickets of one type
    #[must_use]
    pub fn ticket_count(&self, ticket_type: TicketType) -> usize {
        self.lines
            .iter()
            .filter(|line| line.ticket_type == ticket_type)
            .count()
    }

    /// Amount charged
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    /// When the booking was committed
    #[must_use]
    pub const fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}
