//! Injected collaborators of the booking reducer.
//!
//! Seat inventory, seat sessions and booking creation live on a server; the
//! reducer only sees them through these traits.
//!
//! Note: the traits return [`GatewayFuture`] instead of using async fn so they
//! stay dyn-compatible (object-safe).

use crate::config::BookingConfig;
use crate::error::GatewayError;
use crate::types::{
    AircraftId, AircraftSeatConfig, BookingId, BookingRequest, FlightId, FlightSeatConfig,
    SeatHold, SeatSession, SeatSessionId,
};
use flightdeck_core::environment::{Clock, SystemClock};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Boxed future returned by gateway calls
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Seat configuration source
pub trait SeatInventory: Send + Sync {
    /// Seat configuration of a scheduled flight, including booked seats
    fn flight_seats<'a>(&'a self, flight: &'a FlightId) -> GatewayFuture<'a, FlightSeatConfig>;

    /// Seat layout of an aircraft
    fn aircraft_seats<'a>(
        &'a self,
        aircraft: &'a AircraftId,
    ) -> GatewayFuture<'a, AircraftSeatConfig>;
}

/// Server-side seat sessions
///
/// A hold on a seat someone else holds fails with [`GatewayError::Conflict`].
pub trait SeatSessionGateway: Send + Sync {
    /// Open a new session holding `hold`
    fn create<'a>(&'a self, hold: &'a SeatHold) -> GatewayFuture<'a, SeatSession>;

    /// Add `hold` to an existing session
    fn append<'a>(
        &'a self,
        session: &'a SeatSessionId,
        hold: &'a SeatHold,
    ) -> GatewayFuture<'a, SeatSession>;

    /// Read a session
    fn get<'a>(&'a self, session: &'a SeatSessionId) -> GatewayFuture<'a, SeatSession>;
}

/// Booking creation
pub trait BookingGateway: Send + Sync {
    /// Create a booking from held seats
    fn create_booking<'a>(&'a self, request: &'a BookingRequest) -> GatewayFuture<'a, BookingId>;
}

/// Dependencies of [`BookingReducer`](crate::reducer::BookingReducer)
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Seat configuration source
    pub inventory: Arc<dyn SeatInventory>,
    /// Seat session gateway
    pub seat_sessions: Arc<dyn SeatSessionGateway>,
    /// Booking creation gateway
    pub bookings: Arc<dyn BookingGateway>,
    /// Time source for seat session expiry
    pub clock: Arc<dyn Clock>,
    /// Runtime configuration
    pub config: BookingConfig,
}

impl BookingEnvironment {
    /// Environment on the system clock
    #[must_use]
    pub fn new(
        inventory: Arc<dyn SeatInventory>,
        seat_sessions: Arc<dyn SeatSessionGateway>,
        bookings: Arc<dyn BookingGateway>,
        config: BookingConfig,
    ) -> Self {
        Self {
            inventory,
            seat_sessions,
            bookings,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Bound a gateway call by `timeout`
///
/// # Errors
///
/// Returns the call's own error, or [`GatewayError::Timeout`] on expiry.
pub async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| GatewayError::Timeout(timeout))?
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let timeout = Duration::from_millis(20);
        let result: Result<(), _> = with_timeout(timeout, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(GatewayError::Timeout(timeout)));
    }

    #[tokio::test]
    async fn call_errors_pass_through() {
        let result: Result<(), _> = with_timeout(Duration::from_secs(1), async {
            Err(GatewayError::NotFound("FD1".into()))
        })
        .await;
        assert_eq!(result, Err(GatewayError::NotFound("FD1".into())));

        let value = with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }
}
