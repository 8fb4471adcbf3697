//! Booking wizard demo
//!
//! Walks one round trip through every wizard step against in-memory gateways.

use flightdeck_booking::memory::{InMemoryBookings, InMemorySeatInventory, InMemorySeatSessions};
use flightdeck_booking::{
    AircraftId, AircraftSeatConfig, BookingConfig, BookingEnvironment, BookingError, BookingFlow,
    BookingState, ExtraSelection, FlightId, FlightSeatConfig, Journey, SeatClass, SeatMap, tally,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn flight_config(booked: &[&str]) -> FlightSeatConfig {
    FlightSeatConfig {
        rows: 8,
        economy_class_seats: Vec::new(),
        business_class_seats: ["3A", "3B", "3C", "3D", "3E", "3F"].map(String::from).to_vec(),
        first_class_seats: ["1A", "1B", "2A", "2B"].map(String::from).to_vec(),
        booked_seats: booked.iter().map(ToString::to_string).collect(),
    }
}

fn render(map: &SeatMap) {
    println!("      A B C D E F");
    for (row, cells) in map.grid().iter().enumerate() {
        let line: Vec<&str> = cells
            .iter()
            .map(|cell| match (cell.class, cell.occupied) {
                (_, true) => "x",
                (SeatClass::First, false) => "F",
                (SeatClass::Business, false) => "B",
                (SeatClass::Economy, false) => ".",
                (SeatClass::Unavailable, false) => "#",
                (SeatClass::Unassigned, false) => "?",
            })
            .collect();
        println!("  {:>2}  {}", row + 1, line.join(" "));
    }
}

#[tokio::main]
async fn main() -> Result<(), BookingError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flightdeck_booking=debug,flightdeck_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Register metric descriptions with whichever recorder is installed
    flightdeck_runtime::metrics::describe_metrics();

    println!("=== Flightdeck: booking wizard demo ===\n");

    let config = BookingConfig::from_env();
    let outbound = FlightId::new("FD100");
    let inbound = FlightId::new("FD101");

    let inventory = Arc::new(
        InMemorySeatInventory::new()
            .with_latency(Duration::from_millis(40))
            .with_flight(outbound.clone(), flight_config(&["4C", "5D"]))
            .with_flight(inbound.clone(), flight_config(&["3A"]))
            .with_aircraft(
                AircraftId::new("A320-01"),
                AircraftSeatConfig {
                    rows: 4,
                    unavailable_seats: vec!["4F".into()],
                    first_class_seats: vec!["1A".into(), "1B".into()],
                    business_class_seats: vec!["2A".into(), "2B".into(), "2C".into()],
                    economy_class_seats: vec!["3A".into(), "3B".into()],
                },
            ),
    );
    let clock = Arc::new(flightdeck_core::environment::SystemClock);
    let sessions = Arc::new(
        InMemorySeatSessions::new(Arc::clone(&inventory), clock, config.seat_session_ttl())
            .with_latency(Duration::from_millis(25)),
    );
    let bookings = Arc::new(InMemoryBookings::new().with_latency(Duration::from_millis(60)));
    let env = BookingEnvironment::new(inventory, sessions, bookings, config);

    let flow = BookingFlow::new(env);

    // Progress indicator: one line per phase change
    let mut updates = flow.subscribe().await;
    let progress = tokio::spawn(async move {
        let mut last = None;
        while let Some(snapshot) = updates.recv().await {
            let phase = snapshot.state.phase();
            if phase != last {
                if let Some(phase) = phase {
                    let step = phase
                        .step_index()
                        .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
                    println!("[progress] v{} step {step}/5 {phase}", snapshot.version);
                }
                last = phase;
            }
        }
    });

    // Loading indicator
    let mut busy = flow.loading().subscribe();
    let spinner = tokio::spawn(async move {
        while busy.changed().await.is_ok() {
            let in_flight = *busy.borrow_and_update();
            if in_flight > 0 {
                println!("[loading] {in_flight} request(s) in flight");
            }
        }
    });

    println!(">>> get_state before any booking");
    if let Err(error) = flow.get_state().await {
        println!("    {error} ({:?})", error.kind());
    }

    println!("\n>>> set_state: round trip {outbound} / {inbound}");
    flow.set_state(BookingState::new(Journey::round_trip(
        vec![outbound.clone()],
        vec![inbound.clone()],
    )))
    .await?;
    flow.advance().await?;

    println!("\n>>> Loading seat maps");
    flow.load_seat_maps().await?;
    if let Some(map) = flow.seat_map(&outbound).await {
        println!("Seat map for {outbound}:");
        render(&map);
    }

    println!("\n>>> Selecting an occupied seat");
    if let Err(error) = flow.select_seat(&outbound, "4C", SeatClass::Economy).await {
        println!("    {error} ({:?})", error.kind());
    }

    println!("\n>>> Selecting a malformed seat");
    if let Err(error) = flow.select_seat(&outbound, "4G", SeatClass::Economy).await {
        println!("    {error} ({:?})", error.kind());
    }

    println!("\n>>> Selecting 3D (business) and 6A (economy)");
    flow.select_seat(&outbound, "3D", SeatClass::Business).await?;
    flow.select_seat(&inbound, "6A", SeatClass::Economy).await?;
    flow.advance().await?;

    println!("\n>>> Extras and insurance");
    flow.add_extras(
        &outbound,
        vec![ExtraSelection::new("BAG", 2), ExtraSelection::new("MEAL", 0)],
    )
    .await?;
    flow.add_extras(&inbound, vec![ExtraSelection::new("BAG", 1)])
        .await?;
    flow.set_insurance(true).await?;
    let booking = flow.get_state().await?;
    for extra in tally(&booking.extras) {
        println!("    {} x{}", extra.id, extra.quantity);
    }
    flow.advance().await?;

    println!("\n>>> Submitting");
    let booking_id = flow.submit_booking().await?;
    let booking = flow.get_state().await?;
    println!("Booking {booking_id} is {}", booking.phase);
    match serde_json::to_string_pretty(&booking) {
        Ok(json) => println!("{json}"),
        Err(error) => tracing::warn!(%error, "Could not render booking"),
    }

    println!("\n>>> Aircraft layout A320-01 (authoring)");
    let layout = flow.aircraft_seat_map(&AircraftId::new("A320-01")).await?;
    render(&layout);
    for (class, count) in layout.class_counts() {
        println!("    {class}: {count}");
    }

    flow.close(Duration::from_secs(1)).await?;
    progress.abort();
    spinner.abort();

    println!("\n=== Demo complete ===");
    Ok(())
}
