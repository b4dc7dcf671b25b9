//! Seat booking rules.
//!
//! Validation runs in a fixed order and stops at the first failing rule:
//!
//! 1. at least one seat
//! 2. ticket count equals seat count
//! 3. every seat is on the seat map (first offender reported)
//! 4. no seat repeated (first repeat reported)
//! 5. no seat already booked (every taken seat reported)
//!
//! A request that passes is committed whole. A request that fails leaves the
//! show exactly as it was.

use crate::catalog::{Catalog, Show};
use crate::error::BoxOfficeError;
use crate::order::{Order, OrderLine};
use crate::types::{Money, OrderId, SeatNumber, ShowId, TicketCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Priced seat assignment for a request that would currently succeed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// One line per requested seat, in request order
    pub lines: Vec<OrderLine>,
    /// Sum of the line prices
    pub total: Money,
}

/// Pairs seats with ticket types: the first `adult` seats get adult tickets,
/// the next `senior` seats senior, the rest student
#[must_use]
pub fn assign_ticket_types(seats: &[SeatNumber], tickets: TicketCounts) -> Vec<OrderLine> {
    seats
        .iter()
        .zip(tickets.in_assignment_order())
        .map(|(&seat, ticket_type)| OrderLine::new(seat, ticket_type))
        .collect()
}

/// Checks a request against `show` without changing it
///
/// # Errors
///
/// The first rule the request breaks, see the module docs.
pub fn validate(
    show: &Show,
    seats: &[SeatNumber],
    tickets: TicketCounts,
) -> Result<(), BoxOfficeError> {
    if seats.is_empty() {
        return Err(BoxOfficeError::NoSeatsSelected);
    }

    let requested = u64::try_from(seats.len()).unwrap_or(u64::MAX);
    if tickets.total() != requested {
        return Err(BoxOfficeError::TicketCountMismatch {
            seats: seats.len(),
            tickets: tickets.total(),
        });
    }

    for &seat in seats {
        show.check_seat(seat)?;
    }

    let mut seen = HashSet::with_capacity(seats.len());
    if let Some(&seat) = seats.iter().find(|&&seat| !seen.insert(seat)) {
        return Err(BoxOfficeError::DuplicateSeat { seat });
    }

    let taken: Vec<SeatNumber> = seats
        .iter()
        .copied()
        .filter(|&seat| matches!(show.is_booked(seat), Ok(true)))
        .collect();
    if !taken.is_empty() {
        return Err(BoxOfficeError::SeatAlreadyBooked { seats: taken });
    }

    Ok(())
}

/// Validates a request and prices it without booking anything
///
/// # Errors
///
/// Same as [`validate`].
pub fn preview(
    show: &Show,
    seats: &[SeatNumber],
    tickets: TicketCounts,
) -> Result<Quote, BoxOfficeError> {
    validate(show, seats, tickets)?;

    let lines = assign_ticket_types(seats, tickets);
    let total = lines.iter().map(|line| line.unit_price).sum();
    Ok(Quote { lines, total })
}

/// Books `seats` on `show` and returns the resulting order
///
/// # Errors
///
/// Same as [`validate`]; nothing is booked on error.
pub fn book_show(
    show: &mut Show,
    musical_name: &str,
    seats: &[SeatNumber],
    tickets: TicketCounts,
    order_id: OrderId,
    placed_at: DateTime<Utc>,
) -> Result<Order, BoxOfficeError> {
    let quote = preview(show, seats, tickets)?;

    // Validated above: every seat is on the map, distinct, and free.
    for line in &quote.lines {
        show.book_seat(line.seat)?;
    }

    Ok(Order::new(
        order_id,
        musical_name.to_string(),
        show.date(),
        show.time(),
        quote.lines,
        placed_at,
    ))
}

/// Books `seats` on the catalog show `show_id`
///
/// # Errors
///
/// [`BoxOfficeError::UnknownShow`] if the show is not in the catalog,
/// otherwise the same as [`book_show`].
pub fn book(
    catalog: &mut Catalog,
    show_id: ShowId,
    seats: &[SeatNumber],
    tickets: TicketCounts,
    order_id: OrderId,
    placed_at: DateTime<Utc>,
) -> Result<Order, BoxOfficeError> {
    let (musical_name, show) = catalog
        .show_mut(show_id)
        .ok_or(BoxOfficeError::UnknownShow { show_id })?;

    book_show(show, musical_name, seats, tickets, order_id, placed_at)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::TicketType;
    use chrono::{NaiveDate, NaiveTime};

    fn seats(numbers: &[u32]) -> Vec<SeatNumber> {
        numbers.iter().copied().map(SeatNumber::new).collect()
    }

    fn show() -> Show {
        Show::new(
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        )
    }

    fn placed_at() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn rule_order_no_seats_wins_over_mismatch() {
        let error = validate(&show(), &[], TicketCounts::new(1, 0, 0)).unwrap_err();
        assert_eq!(error, BoxOfficeError::NoSeatsSelected);
    }

    #[test]
    fn rule_order_mismatch_wins_over_invalid_seat() {
        let error = validate(&show(), &seats(&[0, 200]), TicketCounts::new(1, 0, 0)).unwrap_err();
        assert_eq!(
            error,
            BoxOfficeError::TicketCountMismatch {
                seats: 2,
                tickets: 1
            }
        );
    }

    #[test]
    fn rule_order_invalid_seat_wins_over_duplicate() {
        let error =
            validate(&show(), &seats(&[5, 5, 101]), TicketCounts::new(3, 0, 0)).unwrap_err();
        assert_eq!(
            error,
            BoxOfficeError::InvalidSeatNumber {
                seat: SeatNumber::new(101),
                capacity: 100
            }
        );
    }

    #[test]
    fn duplicate_seats_are_rejected() {
        let error = validate(&show(), &seats(&[5, 6, 5]), TicketCounts::new(3, 0, 0)).unwrap_err();
        assert_eq!(
            error,
            BoxOfficeError::DuplicateSeat {
                seat: SeatNumber::new(5)
            }
        );
    }

    #[test]
    fn already_booked_reports_all_taken_seats() {
        let mut show = show();
        show.book_seat(SeatNumber::new(2)).unwrap();
        show.book_seat(SeatNumber::new(4)).unwrap();

        let error = validate(&show, &seats(&[4, 3, 2]), TicketCounts::new(3, 0, 0)).unwrap_err();
        assert_eq!(
            error,
            BoxOfficeError::SeatAlreadyBooked {
                seats: seats(&[4, 2])
            }
        );
    }

    #[test]
    fn preview_prices_without_booking() {
        let show = show();
        let quote = preview(&show, &seats(&[1, 2, 3]), TicketCounts::new(1, 1, 1)).unwrap();

        assert_eq!(quote.total, Money::from_dollars(125));
        assert_eq!(show.available_seats(), 100);
    }

    #[test]
    fn ticket_types_follow_request_order() {
        let lines = assign_ticket_types(&seats(&[9, 3, 7]), TicketCounts::new(1, 0, 2));
        let assigned: Vec<_> = lines.iter().map(|l| (l.seat.value(), l.ticket_type)).collect();
        assert_eq!(
            assigned,
            vec![
                (9, TicketType::Adult),
                (3, TicketType::Student),
                (7, TicketType::Student)
            ]
        );
    }

    #[test]
    fn failed_booking_leaves_show_untouched() {
        let mut show = show();
        show.book_seat(SeatNumber::new(50)).unwrap();
        let before = show.clone();

        let result = book_show(
            &mut show,
            "Frozen",
            &seats(&[49, 50, 51]),
            TicketCounts::new(3, 0, 0),
            OrderId::new(),
            placed_at(),
        );

        assert!(result.is_err());
        assert_eq!(show, before);
    }

    #[test]
    fn successful_booking_builds_order() {
        let mut show = show();
        let order_id = OrderId::new();
        let order = book_show(
            &mut show,
            "Frozen",
            &seats(&[10, 11]),
            TicketCounts::new(0, 1, 1),
            order_id,
            placed_at(),
        )
        .unwrap();

        assert_eq!(order.id(), order_id);
        assert_eq!(order.musical_name(), "Frozen");
        assert_eq!(order.show_date(), show.date());
        assert_eq!(order.total(), Money::from_dollars(75));
        assert_eq!(order.seats().collect::<Vec<_>>(), seats(&[10, 11]));
        assert_eq!(order.ticket_count(TicketType::Senior), 1);
        assert_eq!(show.available_seats(), 98);
    }

    #[test]
    fn booking_an_unknown_show_fails() {
        let mut catalog = Catalog::default();
        let show_id = ShowId::new();
        let error = book(
            &mut catalog,
            show_id,
            &seats(&[1]),
            TicketCounts::new(1, 0, 0),
            OrderId::new(),
            placed_at(),
        )
        .unwrap_err();
        assert_eq!(error, BoxOfficeError::UnknownShow { show_id });
    }
}
