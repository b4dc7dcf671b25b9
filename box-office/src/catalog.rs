//! Musicals, their shows, and per-show seat maps.
//!
//! A [`Show`] owns the set of booked seats for one performance. Seats are only
//! ever added to that set; nothing in the box office releases a seat.

use crate::error::BoxOfficeError;
use crate::types::{MusicalId, SeatNumber, ShowId};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Seats on a show unless configured otherwise
pub const DEFAULT_SEAT_CAPACITY: u32 = 100;

// ============================================================================
// Show
// ============================================================================

/// One dated performance of a musical, with its seat map
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    id: ShowId,
    date: NaiveDate,
    time: NaiveTime,
    capacity: u32,
    booked: BTreeSet<SeatNumber>,
}

impl Show {
    /// Creates a show with [`DEFAULT_SEAT_CAPACITY`] seats, all free
    #[must_use]
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self::with_capacity(date, time, DEFAULT_SEAT_CAPACITY)
    }

    /// Creates a show with `capacity` seats, all free
    #[must_use]
    pub fn with_capacity(date: NaiveDate, time: NaiveTime, capacity: u32) -> Self {
        Self {
            id: ShowId::new(),
            date,
            time,
            capacity,
            booked: BTreeSet::new(),
        }
    }

    /// Show identifier
    #[must_use]
    pub const fn id(&self) -> ShowId {
        self.id
    }

    /// Performance date
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Curtain time
    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Date and time combined
    #[must_use]
    pub const fn starts_at(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date, self.time)
    }

    /// Number of seats on the seat map
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether `seat` is on this show's seat map
    #[must_use]
    pub const fn has_seat(&self, seat: SeatNumber) -> bool {
        seat.value() >= 1 && seat.value() <= self.capacity
    }

    /// Fails with [`BoxOfficeError::InvalidSeatNumber`] if `seat` is off the map
    ///
    /// # Errors
    ///
    /// See above.
    pub fn check_seat(&self, seat: SeatNumber) -> Result<(), BoxOfficeError> {
        if self.has_seat(seat) {
            Ok(())
        } else {
            Err(BoxOfficeError::InvalidSeatNumber {
                seat,
                capacity: self.capacity,
            })
        }
    }

    /// Whether `seat` has been booked
    ///
    /// # Errors
    ///
    /// Returns [`BoxOfficeError::InvalidSeatNumber`] for a seat off the map.
    pub fn is_booked(&self, seat: SeatNumber) -> Result<bool, BoxOfficeError> {
        self.check_seat(seat)?;
        Ok(self.booked.contains(&seat))
    }

    /// Number of seats not yet booked
    #[must_use]
    pub fn available_seats(&self) -> u32 {
        let booked = u32::try_from(self.booked.len()).unwrap_or(u32::MAX);
        self.capacity.saturating_sub(booked)
    }

    /// Marks `seat` as booked
    ///
    /// The show is left untouched when this fails.
    ///
    /// # Errors
    ///
    /// - [`BoxOfficeError::InvalidSeatNumber`] for a seat off the map
    /// - [`BoxOfficeError::SeatAlreadyBooked`] if the seat is taken
    pub fn book_seat(&mut self, seat: SeatNumber) -> Result<(), BoxOfficeError> {
        self.check_seat(seat)?;
        if self.booked.insert(seat) {
            Ok(())
        } else {
            Err(BoxOfficeError::SeatAlreadyBooked { seats: vec![seat] })
        }
    }

    /// Free seats in ascending order
    #[must_use]
    pub fn unbooked_seats(&self) -> Vec<SeatNumber> {
        (1..=self.capacity)
            .map(SeatNumber::new)
            .filter(|seat| !self.booked.contains(seat))
            .collect()
    }

    /// Booked seats in ascending order
    #[must_use]
    pub fn booked_seats(&self) -> Vec<SeatNumber> {
        self.booked.iter().copied().collect()
    }
}

// ============================================================================
// Musical
// ============================================================================

/// A production and its schedule of shows
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Musical {
    id: MusicalId,
    name: String,
    description: String,
    image: String,
    shows: Vec<Show>,
}

impl Musical {
    /// Creates a musical with no shows
    ///
    /// # Errors
    ///
    /// Returns [`BoxOfficeError::EmptyMusicalName`] if `name` is blank.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<Self, BoxOfficeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BoxOfficeError::EmptyMusicalName);
        }

        Ok(Self {
            id: MusicalId::new(),
            name,
            description: description.into(),
            image: image.into(),
            shows: Vec::new(),
        })
    }

    /// Adds a show to the schedule
    #[must_use]
    pub fn with_show(mut self, show: Show) -> Self {
        self.shows.push(show);
        self
    }

    /// Musical identifier
    #[must_use]
    pub const fn id(&self) -> MusicalId {
        self.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short blurb
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Poster image reference
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Shows in schedule order
    #[must_use]
    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    /// Looks up one of this musical's shows
    #[must_use]
    pub fn show(&self, show_id: ShowId) -> Option<&Show> {
        self.shows.iter().find(|show| show.id == show_id)
    }
}

/// One row of a musical's schedule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Show to book against
    pub show_id: ShowId,
    /// Performance date
    pub date: NaiveDate,
    /// Curtain time
    pub time: NaiveTime,
    /// Seats still free
    pub available: u32,
}

impl From<&Show> for ScheduleEntry {
    fn from(show: &Show) -> Self {
        Self {
            show_id: show.id,
            date: show.date,
            time: show.time,
            available: show.available_seats(),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Every musical the box office sells
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    musicals: Vec<Musical>,
}

impl Catalog {
    /// Creates a catalog from musicals in display order
    #[must_use]
    pub const fn new(musicals: Vec<Musical>) -> Self {
        Self { musicals }
    }

    /// Musicals in display order
    #[must_use]
    pub fn list_musicals(&self) -> &[Musical] {
        &self.musicals
    }

    /// Looks up a musical by id
    #[must_use]
    pub fn musical(&self, musical_id: MusicalId) -> Option<&Musical> {
        self.musicals.iter().find(|musical| musical.id == musical_id)
    }

    /// Looks up a musical by exact name
    #[must_use]
    pub fn musical_by_name(&self, name: &str) -> Option<&Musical> {
        self.musicals.iter().find(|musical| musical.name == name)
    }

    /// Looks up a show and the musical it belongs to
    #[must_use]
    pub fn show(&self, show_id: ShowId) -> Option<(&Musical, &Show)> {
        self.musicals
            .iter()
            .find_map(|musical| musical.show(show_id).map(|show| (musical, show)))
    }

    /// Mutable access to a show, with its musical's name
    pub fn show_mut(&mut self, show_id: ShowId) -> Option<(&str, &mut Show)> {
        for musical in &mut self.musicals {
            if let Some(show) = musical.shows.iter_mut().find(|show| show.id == show_id) {
                return Some((musical.name.as_str(), show));
            }
        }
        None
    }

    /// Dated shows of one musical with their free-seat counts
    #[must_use]
    pub fn schedule(&self, musical_id: MusicalId) -> Option<Vec<ScheduleEntry>> {
        self.musical(musical_id)
            .map(|musical| musical.shows.iter().map(ScheduleEntry::from).collect())
    }

    /// The four West End productions the box office opens with
    ///
    /// Show dates are offsets from `first_day`; every show gets `capacity` seats.
    ///
    /// # Errors
    ///
    /// Only fails if a built-in name were blank.
    pub fn sample(first_day: NaiveDate, capacity: u32) -> Result<Self, BoxOfficeError> {
        let show = |offset: u64, hour: u32, minute: u32| {
            Show::with_capacity(
                first_day + Days::new(offset),
                NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
                capacity,
            )
        };

        Ok(Self::new(vec![
            Musical::new(
                "The Lion King",
                "A Disney classic - family musical.",
                "assets/lionKing.png",
            )?
            .with_show(show(1, 19, 0))
            .with_show(show(4, 14, 30))
            .with_show(show(9, 20, 0)),
            Musical::new(
                "Frozen",
                "A magical musical for children.",
                "assets/frozen.jpeg",
            )?
            .with_show(show(2, 13, 0))
            .with_show(show(6, 19, 30))
            .with_show(show(12, 18, 0)),
            Musical::new(
                "Les Misérables",
                "Epic tale of revolution & love.",
                "assets/les.png",
            )?
            .with_show(show(3, 19, 30))
            .with_show(show(10, 19, 30)),
            Musical::new(
                "Phantom of the Opera",
                "Haunting romance and mystery.",
                "assets/pha.jpg",
            )?
            .with_show(show(5, 19, 0))
            .with_show(show(11, 14, 0))
            .with_show(show(17, 20, 0)),
        ]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn show() -> Show {
        Show::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
        )
    }

    #[test]
    fn new_show_has_every_seat_free() {
        let show = show();
        assert_eq!(show.available_seats(), DEFAULT_SEAT_CAPACITY);
        assert_eq!(show.unbooked_seats().len(), 100);
        assert_eq!(show.unbooked_seats()[0], SeatNumber::new(1));
        assert!(show.booked_seats().is_empty());
    }

    #[test]
    fn booking_a_seat_is_permanent() {
        let mut show = show();
        show.book_seat(SeatNumber::new(10)).unwrap();
        assert!(show.is_booked(SeatNumber::new(10)).unwrap());
        assert!(!show.is_booked(SeatNumber::new(11)).unwrap());
        assert_eq!(show.available_seats(), 99);
        assert!(!show.unbooked_seats().contains(&SeatNumber::new(10)));
    }

    #[test]
    fn booking_a_taken_seat_fails_without_change() {
        let mut show = show();
        show.book_seat(SeatNumber::new(10)).unwrap();
        let before = show.clone();

        let error = show.book_seat(SeatNumber::new(10)).unwrap_err();
        assert_eq!(
            error,
            BoxOfficeError::SeatAlreadyBooked {
                seats: vec![SeatNumber::new(10)]
            }
        );
        assert_eq!(show, before);
    }

    #[test]
    fn seats_off_the_map_are_rejected() {
        let mut show = show();
        for seat in [0, 101] {
            let seat = SeatNumber::new(seat);
            assert_eq!(
                show.is_booked(seat),
                Err(BoxOfficeError::InvalidSeatNumber { seat, capacity: 100 })
            );
            assert!(show.book_seat(seat).is_err());
        }
        assert_eq!(show.available_seats(), 100);
    }

    #[test]
    fn boundary_seats_are_bookable() {
        let mut show = show();
        show.book_seat(SeatNumber::new(1)).unwrap();
        show.book_seat(SeatNumber::new(100)).unwrap();
        assert_eq!(
            show.booked_seats(),
            vec![SeatNumber::new(1), SeatNumber::new(100)]
        );
    }

    #[test]
    fn blank_musical_names_are_rejected() {
        assert_eq!(
            Musical::new("  ", "desc", "img.jpg").unwrap_err(),
            BoxOfficeError::EmptyMusicalName
        );
    }

    #[test]
    fn sample_catalog_has_four_musicals_and_eleven_shows() {
        let first_day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let catalog = Catalog::sample(first_day, DEFAULT_SEAT_CAPACITY).unwrap();

        let names: Vec<_> = catalog.list_musicals().iter().map(Musical::name).collect();
        assert_eq!(
            names,
            vec![
                "The Lion King",
                "Frozen",
                "Les Misérables",
                "Phantom of the Opera"
            ]
        );

        let shows: usize = catalog
            .list_musicals()
            .iter()
            .map(|musical| musical.shows().len())
            .sum();
        assert_eq!(shows, 11);

        let lion_king = catalog.musical_by_name("The Lion King").unwrap();
        assert_eq!(lion_king.description(), "A Disney classic - family musical.");
        assert_eq!(lion_king.image(), "assets/lionKing.png");
        let first = &lion_king.shows()[0];
        assert_eq!(first.date(), NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(first.time(), NaiveTime::from_hms_opt(19, 0, 0).unwrap());
    }

    #[test]
    fn schedule_reports_free_seats_per_show() {
        let first_day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut catalog = Catalog::sample(first_day, 10).unwrap();
        let frozen = catalog.musical_by_name("Frozen").unwrap();
        let frozen_id = frozen.id();
        let show_id = frozen.shows()[1].id();

        let (name, show) = catalog.show_mut(show_id).unwrap();
        assert_eq!(name, "Frozen");
        show.book_seat(SeatNumber::new(4)).unwrap();

        let schedule = catalog.schedule(frozen_id).unwrap();
        let available: Vec<_> = schedule.iter().map(|entry| entry.available).collect();
        assert_eq!(available, vec![10, 9, 10]);
        assert!(catalog.schedule(MusicalId::new()).is_none());
    }

    #[test]
    fn show_lookup_returns_owning_musical() {
        let catalog = Catalog::sample(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(), 100).unwrap();
        let phantom = catalog.musical_by_name("Phantom of the Opera").unwrap();
        let show_id = phantom.shows()[2].id();

        let (musical, show) = catalog.show(show_id).expect("show exists");
        assert_eq!(musical.id(), phantom.id());
        assert_eq!(show.id(), show_id);
        assert!(catalog.show(ShowId::new()).is_none());
    }
}
