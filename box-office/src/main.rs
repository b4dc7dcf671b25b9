//! Box office demo.
//!
//! Seeds the sample catalog, prints what is playing, and runs a short scripted
//! booking session against it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin box-office
//! BOX_OFFICE_RECEIPTS_DIR=/tmp/receipts cargo run --bin box-office
//! ```

use box_office::{
    BoxOffice, BoxOfficeError, Catalog, Config, Musical, SeatNumber, TicketCounts, metrics,
};
use chrono::{Days, Local};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        receipts_dir = %config.receipts.dir.display(),
        seat_capacity = config.booking.seat_capacity,
        log_level = %config.log_level,
        "Configuration loaded"
    );

    metrics::register_business_metrics();

    let first_day = Local::now().date_naive() + Days::new(1);
    let catalog = Catalog::sample(first_day, config.booking.seat_capacity)?;
    let office = BoxOffice::from_config(&config, catalog);

    println!("\n============================================");
    println!("   {}", config.receipts.title);
    println!("============================================\n");

    let musicals = office.list_musicals().await;
    for musical in &musicals {
        print_schedule(&office, musical).await?;
    }

    let Some(musical) = musicals.first() else {
        return Ok(());
    };
    let Some(show) = musical.shows().first() else {
        return Ok(());
    };
    let show_id = show.id();
    let seats: Vec<SeatNumber> = ["S1", "S2", "S3"]
        .iter()
        .map(|label| label.parse())
        .collect::<Result<_, BoxOfficeError>>()?;

    // 1. A successful booking
    println!("1. Booking {} for {} on {}", join(&seats), musical.name(), show.date());
    let quote = office
        .preview(show_id, &seats, TicketCounts::new(2, 0, 1))
        .await?;
    println!("   Preview total: {}", quote.total);

    let confirmation = office
        .book_tickets(show_id, seats.clone(), TicketCounts::new(2, 0, 1))
        .await?;
    println!(
        "   Order {} confirmed, total {}",
        confirmation.order.id(),
        confirmation.order.total()
    );
    match &confirmation.receipt {
        Ok(location) => println!("   Receipt saved to {}", location.display()),
        Err(error) => println!("   Receipt not saved: {error}"),
    }
    println!(
        "   Seats left: {}\n",
        office.available_seats(show_id).await?
    );

    // 2. The same seat again
    println!("2. Booking S1 again");
    match office
        .book_tickets(show_id, vec![SeatNumber::new(1)], TicketCounts::new(1, 0, 0))
        .await
    {
        Ok(confirmation) => println!("   Unexpectedly booked {}", confirmation.order.id()),
        Err(error) => println!("   Rejected: {error}"),
    }

    // 3. Ticket count disagrees with seat count
    println!("3. Booking S4 and S5 with one ticket");
    match office
        .book_tickets(
            show_id,
            vec![SeatNumber::new(4), SeatNumber::new(5)],
            TicketCounts::new(0, 1, 0),
        )
        .await
    {
        Ok(confirmation) => println!("   Unexpectedly booked {}", confirmation.order.id()),
        Err(error) => println!("   Rejected: {error}"),
    }
    println!(
        "   Seats left: {}\n",
        office.available_seats(show_id).await?
    );

    println!("Orders:");
    println!("{}", serde_json::to_string_pretty(&office.orders().await)?);

    office.shutdown().await?;
    Ok(())
}

async fn print_schedule(office: &BoxOffice, musical: &Musical) -> Result<(), BoxOfficeError> {
    println!("{}", musical.name());
    println!("   {}", musical.description());
    for entry in office.schedule(musical.id()).await? {
        println!(
            "   {} {}  ({} seats available)",
            entry.date,
            entry.time.format("%H:%M"),
            entry.available
        );
    }
    println!();
    Ok(())
}

fn join(seats: &[SeatNumber]) -> String {
    seats
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
