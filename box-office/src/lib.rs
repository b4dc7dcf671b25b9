//! # Box Office
//!
//! Show catalog and seat booking for London musicals, built on the Encore
//! reducer architecture.
//!
//! ## Architecture
//!
//! - **Domain**: [`catalog`] (musicals, shows, seat maps), [`booking`]
//!   (validation, ticket assignment, pricing), [`order`], [`receipt`]
//! - **Reducer**: [`reducer::BoxOfficeReducer`] commits bookings under the
//!   store's write lock and writes receipts as effects
//! - **Facade**: [`BoxOffice`] owns the store and exposes async queries and
//!   commands
//!
//! ## Example
//!
//! ```ignore
//! use box_office::{BoxOffice, Catalog, Config, SeatNumber, TicketCounts};
//!
//! let config = Config::from_env();
//! let catalog = Catalog::sample(first_day, config.booking.seat_capacity)?;
//! let office = BoxOffice::from_config(&config, catalog);
//!
//! let confirmation = office
//!     .book_tickets(show_id, vec![SeatNumber::new(1)], TicketCounts::new(1, 0, 0))
//!     .await?;
//! println!("Total: {}", confirmation.order.total());
//! ```

pub mod app;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mocks;
pub mod order;
pub mod receipt;
pub mod reducer;
pub mod types;

pub use app::{BoxOffice, BoxOfficeStore, Confirmation};
pub use booking::Quote;
pub use catalog::{Catalog, DEFAULT_SEAT_CAPACITY, Musical, ScheduleEntry, Show};
pub use config::Config;
pub use error::BoxOfficeError;
pub use order::{Order, OrderLine};
pub use receipt::{FileReceiptWriter, ReceiptStatus, ReceiptWriter};
pub use reducer::{BoxOfficeAction, BoxOfficeEnvironment, BoxOfficeReducer, BoxOfficeState};
pub use types::{Money, MusicalId, OrderId, RequestId, SeatNumber, ShowId, TicketCounts, TicketType};
