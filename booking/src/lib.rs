//! # Flightdeck Booking
//!
//! Seat maps and the booking wizard for flight bookings.
//!
//! - [`seat_map`] turns a flight's or aircraft's seat lists into a `rows × 6`
//!   grid used to render seats and validate selections.
//! - [`reducer`] drives a booking through
//!   overview → seats → extras → payment → confirmed (or error), holding seats
//!   in a server-side seat session and creating the booking at the end.
//! - [`flow`] wraps the reducer in a store shared by every wizard step.
//!
//! Everything remote (seat inventory, seat sessions, booking creation) is
//! injected through the traits in [`environment`]; [`memory`] provides
//! in-memory implementations.
//!
//! ## Example
//!
//! ```ignore
//! use flightdeck_booking::*;
//!
//! let flow = BookingFlow::new(environment);
//! flow.set_state(BookingState::new(Journey::one_way(vec![FlightId::new("FD100")]))).await?;
//! flow.advance().await?;
//! flow.load_seat_maps().await?;
//! flow.select_seat(&FlightId::new("FD100"), "12A", SeatClass::Economy).await?;
//! ```

/// Booking actions
pub mod actions;
/// Environment-driven configuration
pub mod config;
/// Gateway traits and the reducer environment
pub mod environment;
/// Error types
pub mod error;
/// Extras accumulation
pub mod extras;
/// Store-backed booking facade
pub mod flow;
/// In-memory gateways
pub mod memory;
/// Booking reducer
pub mod reducer;
/// Seat codes and classes
pub mod seat;
/// Seat map builder
pub mod seat_map;
/// Booking state
pub mod state;
/// Shared domain types
pub mod types;

pub use actions::BookingAction;
pub use config::BookingConfig;
pub use environment::{
    BookingEnvironment, BookingGateway, GatewayFuture, SeatInventory, SeatSessionGateway,
};
pub use error::{BookingError, ErrorKind, GatewayError};
pub use extras::{ExtraSelection, append_extras, tally};
pub use flow::{BookingFlow, BookingStore, fetch_aircraft_seat_map};
pub use reducer::BookingReducer;
pub use seat::{SEATS_PER_ROW, SeatCell, SeatClass, SeatCode, SeatCodeError};
pub use seat_map::{
    CLASS_PRIORITY, MAX_ROWS, SeatCodePolicy, SeatList, SeatMap, SeatMapBuilder,
    SeatMapError, SeatSelectionError,
};
pub use state::{BookingPatch, BookingSession, BookingState};
pub use types::{
    AircraftId, AircraftSeatConfig, BookingId, BookingPhase, BookingRequest, ExtraId, FlightId,
    FlightSeatConfig, Journey, JourneyToken, SeatHold, SeatSelection, SeatSession, SeatSessionId,
};
