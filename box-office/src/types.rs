//! Value types for the box office.
//!
//! Identifiers, money, seat numbers, and ticket types. Everything here is a
//! small `Copy` value; the entities that own them live in [`crate::catalog`]
//! and [`crate::order`].

use crate::error::BoxOfficeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a musical production
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MusicalId(Uuid);

impl MusicalId {
    /// Creates a new random `MusicalId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `MusicalId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MusicalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MusicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a scheduled show
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowId(Uuid);

impl ShowId {
    /// Creates a new random `ShowId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ShowId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ShowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a completed order
///
/// Random v4 UUIDs, so receipt names derived from them do not collide in practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight characters of the hyphenated form
    #[must_use]
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates a command with the outcome action the store broadcasts for it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole currency units
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole units (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, amount| Self(acc.0.saturating_add(amount.0)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("${}.{:02}", self.dollars(), self.0 % 100))
    }
}

// ============================================================================
// Seats
// ============================================================================

/// A seat on a show's seat map, numbered from 1
///
/// Displayed as `S<n>`. Whether the number fits a given show is decided by
/// that show's capacity, not by this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatNumber(u32);

impl SeatNumber {
    /// Creates a new `SeatNumber`
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the raw seat number
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("S{}", self.0))
    }
}

impl FromStr for SeatNumber {
    type Err = BoxOfficeError;

    /// Parses `S12`, `s12`, or `12`
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let trimmed = label.trim();
        let digits = trimmed
            .strip_prefix('S')
            .or_else(|| trimmed.strip_prefix('s'))
            .unwrap_or(trimmed);

        match digits.parse::<u32>() {
            Ok(number) if number > 0 => Ok(Self(number)),
            _ => Err(BoxOfficeError::InvalidSeatLabel {
                label: label.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Pricing category applied to a booked seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TicketType {
    /// Full price
    Adult,
    /// Senior concession
    Senior,
    /// Student concession
    Student,
}

impl TicketType {
    /// Every ticket type, in assignment order
    pub const ALL: [Self; 3] = [Self::Adult, Self::Senior, Self::Student];

    /// Unit price of one ticket of this type
    #[must_use]
    pub const fn unit_price(self) -> Money {
        match self {
            Self::Adult => Money::from_dollars(50),
            Self::Senior => Money::from_dollars(40),
            Self::Student => Money::from_dollars(35),
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Adult => "Adult",
            Self::Senior => "Senior",
            Self::Student => "Student",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// How many tickets of each type a booking asks for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCounts {
    /// Adult tickets
    pub adult: u32,
    /// Senior tickets
    pub senior: u32,
    /// Student tickets
    pub student: u32,
}

impl TicketCounts {
    /// Creates a new `TicketCounts`
    #[must_use]
    pub const fn new(adult: u32, senior: u32, student: u32) -> Self {
        Self {
            adult,
            senior,
            student,
        }
    }

    /// Count for one ticket type
    #[must_use]
    pub const fn count(&self, ticket_type: TicketType) -> u32 {
        match ticket_type {
            TicketType::Adult => self.adult,
            TicketType::Senior => self.senior,
            TicketType::Student => self.student,
        }
    }

    /// Total number of tickets requested
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.adult as u64 + self.senior as u64 + self.student as u64
    }

    /// Ticket types in assignment order: all adults, then seniors, then students
    pub fn in_assignment_order(&self) -> impl Iterator<Item = TicketType> + '_ {
        TicketType::ALL.into_iter().flat_map(move |ticket_type| {
            std::iter::repeat_n(ticket_type, self.count(ticket_type) as usize)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_display_pads_and_formats_cents() {
        assert_eq!(Money::from_dollars(50).to_string(), "$50.00");
        assert_eq!(Money::from_cents(12_345).to_string(), "$123.45");
        assert_eq!(format!("{:<8}|", Money::from_dollars(5)), "$5.00   |");
    }

    #[test]
    fn money_sums() {
        let total: Money = [50, 40, 35].into_iter().map(Money::from_dollars).sum();
        assert_eq!(total, Money::from_dollars(125));
        assert_eq!(Money::from_cents(u64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn seat_number_parses_labels() {
        assert_eq!("S12".parse::<SeatNumber>().unwrap(), SeatNumber::new(12));
        assert_eq!(" s7 ".parse::<SeatNumber>().unwrap(), SeatNumber::new(7));
        assert_eq!("42".parse::<SeatNumber>().unwrap(), SeatNumber::new(42));
    }

    #[test]
    fn seat_number_rejects_garbage() {
        for label in ["", "S", "S0", "0", "A12", "S-1", "twelve"] {
            assert!(
                matches!(
                    label.parse::<SeatNumber>(),
                    Err(BoxOfficeError::InvalidSeatLabel { .. })
                ),
                "{label:?} should not parse"
            );
        }
    }

    #[test]
    fn seat_number_displays_with_prefix() {
        assert_eq!(SeatNumber::new(5).to_string(), "S5");
        assert_eq!(format!("{:<4}|", SeatNumber::new(5)), "S5  |");
    }

    #[test]
    fn ticket_prices_are_fixed() {
        assert_eq!(TicketType::Adult.unit_price(), Money::from_dollars(50));
        assert_eq!(TicketType::Senior.unit_price(), Money::from_dollars(40));
        assert_eq!(TicketType::Student.unit_price(), Money::from_dollars(35));
    }

    #[test]
    fn ticket_counts_assign_adults_then_seniors_then_students() {
        let counts = TicketCounts::new(2, 1, 2);
        let order: Vec<_> = counts.in_assignment_order().collect();
        assert_eq!(
            order,
            vec![
                TicketType::Adult,
                TicketType::Adult,
                TicketType::Senior,
                TicketType::Student,
                TicketType::Student,
            ]
        );
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn ticket_counts_total_does_not_overflow() {
        let counts = TicketCounts::new(u32::MAX, u32::MAX, u32::MAX);
        assert_eq!(counts.total(), 3 * u64::from(u32::MAX));
    }

    #[test]
    fn order_id_short_form() {
        let id = OrderId::from_uuid(Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0));
        assert_eq!(id.short(), "12345678");
    }
}
