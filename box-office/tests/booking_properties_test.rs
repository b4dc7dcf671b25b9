//! Property tests for seat availability and pricing.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use box_office::booking::{book_show, preview};
use box_office::{Money, OrderId, SeatNumber, Show, TicketCounts};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;

const CAPACITY: u32 = 10;

fn show() -> Show {
    Show::with_capacity(
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        CAPACITY,
    )
}

/// Seat lists that are sometimes empty, sometimes repeat, and sometimes
/// leave the seat map, paired with ticket counts that sometimes disagree.
fn request() -> impl Strategy<Value = (Vec<SeatNumber>, TicketCounts)> {
    (
        prop::collection::vec((0..=CAPACITY + 2).prop_map(SeatNumber::new), 0..5),
        (0u32..4, 0u32..4, 0u32..4),
    )
        .prop_map(|(seats, (adult, senior, student))| {
            (seats, TicketCounts::new(adult, senior, student))
        })
}

fn placed_at() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

proptest! {
    #[test]
    fn availability_tracks_booked_seats(requests in prop::collection::vec(request(), 1..25)) {
        let mut show = show();
        let mut expected: BTreeSet<SeatNumber> = BTreeSet::new();

        for (seats, tickets) in requests {
            let before = show.clone();
            match book_show(&mut show, "Frozen", &seats, tickets, OrderId::new(), placed_at()) {
                Ok(order) => {
                    for seat in order.seats() {
                        prop_assert!(expected.insert(seat), "seat {} sold twice", seat);
                    }
                    prop_assert_eq!(order.seats().collect::<Vec<_>>(), seats);
                },
                Err(_) => {
                    prop_assert_eq!(&show, &before);
                },
            }

            prop_assert_eq!(show.booked_seats(), expected.iter().copied().collect::<Vec<_>>());
            prop_assert_eq!(
                show.available_seats(),
                CAPACITY - u32::try_from(expected.len()).unwrap()
            );
        }
    }

    #[test]
    fn total_is_the_sum_of_ticket_prices(adult in 0u32..4, senior in 0u32..4, student in 0u32..4) {
        let tickets = TicketCounts::new(adult, senior, student);
        let count = adult + senior + student;
        prop_assume!(count > 0);
        let seats: Vec<SeatNumber> = (1..=count).map(SeatNumber::new).collect();

        let quote = preview(&show(), &seats, tickets).unwrap();

        let expected = u64::from(adult) * 50 + u64::from(senior) * 40 + u64::from(student) * 35;
        prop_assert_eq!(quote.total, Money::from_dollars(expected));
        prop_assert_eq!(quote.lines.len(), seats.len());
    }

    #[test]
    fn booking_the_same_seat_twice_counts_once(seat in 1..=CAPACITY) {
        let mut show = show();
        let seat = SeatNumber::new(seat);

        prop_assert!(show.book_seat(seat).is_ok());
        prop_assert!(show.book_seat(seat).is_err());
        prop_assert_eq!(show.available_seats(), CAPACITY - 1);
    }
}
