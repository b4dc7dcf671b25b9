//! Business metrics for the box office.
//!
//! Recorded through the `metrics` facade; the binary installs no exporter, so
//! these are no-ops unless the embedding application installs a recorder.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `box_office_bookings_total{status, reason}` - Booking outcomes
//! - `box_office_tickets_sold_total{ticket_type}` - Tickets sold per type
//! - `box_office_revenue_cents_total` - Revenue from committed orders
//! - `box_office_receipts_total{status}` - Receipt write outcomes
//! - `box_office_receipt_retries_rejected_total{reason}` - Retries for unknown orders
//!
//! ## Gauges
//! - `box_office_seats_available{show_id}` - Free seats per show after each booking

use crate::error::BoxOfficeError;
use crate::order::Order;
use crate::types::{ShowId, TicketType};
use metrics::{describe_counter, describe_gauge};

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "box_office_bookings_total",
        "Booking requests by outcome (confirmed, rejected)"
    );
    describe_counter!(
        "box_office_tickets_sold_total",
        "Tickets sold by ticket type"
    );
    describe_counter!(
        "box_office_revenue_cents_total",
        "Revenue from committed orders in cents"
    );
    describe_counter!(
        "box_office_receipts_total",
        "Receipt writes by outcome (saved, failed)"
    );
    describe_counter!(
        "box_office_receipt_retries_rejected_total",
        "Receipt retries refused before any write"
    );
    describe_gauge!(
        "box_office_seats_available",
        "Seats still free on a show"
    );

    tracing::info!("Business metrics registered");
}

/// Record a committed order.
pub fn record_booking_confirmed(order: &Order, show_id: ShowId, seats_available: u32) {
    metrics::counter!("box_office_bookings_total", "status" => "confirmed").increment(1);
    metrics::counter!("box_office_revenue_cents_total").increment(order.total().cents());

    for ticket_type in TicketType::ALL {
        let sold = u64::try_from(order.ticket_count(ticket_type)).unwrap_or(u64::MAX);
        if sold > 0 {
            metrics::counter!("box_office_tickets_sold_total", "ticket_type" => ticket_type.label())
                .increment(sold);
        }
    }

    metrics::gauge!("box_office_seats_available", "show_id" => show_id.to_string())
        .set(f64::from(seats_available));
    tracing::debug!(order_id = %order.id(), "Recorded booking_confirmed metric");
}

/// Record a rejected booking request.
pub fn record_booking_rejected(error: &BoxOfficeError) {
    metrics::counter!("box_office_bookings_total", "status" => "rejected", "reason" => error.code())
        .increment(1);
    tracing::debug!(reason = error.code(), "Recorded booking_rejected metric");
}

/// Record a receipt write outcome.
pub fn record_receipt(saved: bool) {
    let status = if saved { "saved" } else { "failed" };
    metrics::counter!("box_office_receipts_total", "status" => status).increment(1);
    tracing::debug!(status, "Recorded receipt metric");
}

/// Record a receipt retry that was refused.
pub fn record_receipt_retry_rejected(error: &BoxOfficeError) {
    metrics::counter!("box_office_receipt_retries_rejected_total", "reason" => error.code())
        .increment(1);
}
