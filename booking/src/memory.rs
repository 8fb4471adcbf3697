//! In-memory gateways for tests and the demo.
//!
//! Seat sessions share the inventory's booked-seat lists, so a held seat shows
//! up as occupied the next time a seat map is loaded.

use crate::environment::{BookingGateway, GatewayFuture, SeatInventory, SeatSessionGateway};
use crate::error::GatewayError;
use crate::types::{
    AircraftId, AircraftSeatConfig, BookingId, BookingRequest, FlightId, FlightSeatConfig,
    SeatHold, SeatSession, SeatSessionId,
};
use flightdeck_core::environment::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// Seat inventory backed by maps
#[derive(Debug, Default)]
pub struct InMemorySeatInventory {
    flights: Mutex<HashMap<FlightId, FlightSeatConfig>>,
    aircraft: Mutex<HashMap<AircraftId, AircraftSeatConfig>>,
    latency: Duration,
}

impl InMemorySeatInventory {
    /// Empty inventory answering immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Add or replace a flight
    #[must_use]
    pub fn with_flight(self, flight: FlightId, config: FlightSeatConfig) -> Self {
        lock(&self.flights).insert(flight, config);
        self
    }

    /// Add or replace an aircraft
    #[must_use]
    pub fn with_aircraft(self, aircraft: AircraftId, config: AircraftSeatConfig) -> Self {
        lock(&self.aircraft).insert(aircraft, config);
        self
    }

    /// Whether `seat` on `flight` is booked or held
    #[must_use]
    pub fn is_booked(&self, flight: &FlightId, seat: &str) -> bool {
        lock(&self.flights)
            .get(flight)
            .is_some_and(|config| config.booked_seats.iter().any(|s| s == seat))
    }

    /// Book `seat` unless someone else already has it
    ///
    /// Check and mark happen under one lock, so two concurrent claims for the
    /// same seat cannot both succeed. `ours` re-claims a seat already held by
    /// the caller's session.
    fn claim(&self, flight: &FlightId, seat: String, ours: bool) -> Result<(), GatewayError> {
        let mut flights = lock(&self.flights);
        let config = flights
            .get_mut(flight)
            .ok_or_else(|| GatewayError::NotFound(format!("flight {flight}")))?;
        if config.booked_seats.contains(&seat) {
            if ours {
                return Ok(());
            }
            return Err(GatewayError::Conflict(format!(
                "seat {seat} on {flight} is already taken"
            )));
        }
        config.booked_seats.push(seat);
        Ok(())
    }
}

impl SeatInventory for InMemorySeatInventory {
    fn flight_seats<'a>(&'a self, flight: &'a FlightId) -> GatewayFuture<'a, FlightSeatConfig> {
        Box::pin(async move {
            simulate_latency(self.latency).await;
            lock(&self.flights)
                .get(flight)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("flight {flight}")))
        })
    }

    fn aircraft_seats<'a>(
        &'a self,
        aircraft: &'a AircraftId,
    ) -> GatewayFuture<'a, AircraftSeatConfig> {
        Box::pin(async move {
            simulate_latency(self.latency).await;
            lock(&self.aircraft)
                .get(aircraft)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("aircraft {aircraft}")))
        })
    }
}

/// Seat sessions that mark held seats as booked in an inventory
pub struct InMemorySeatSessions {
    inventory: Arc<InMemorySeatInventory>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    sessions: Mutex<HashMap<SeatSessionId, SeatSession>>,
    latency: Duration,
}

impl InMemorySeatSessions {
    /// Sessions over `inventory`, open for `ttl` from creation
    #[must_use]
    pub fn new(
        inventory: Arc<InMemorySeatInventory>,
        clock: Arc<dyn Clock>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            inventory,
            clock,
            ttl,
            sessions: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Hold `hold` for `session`, failing if anyone else has the seat
    fn take(&self, session: &SeatSession, hold: &SeatHold) -> Result<(), GatewayError> {
        let ours = session
            .holds
            .iter()
            .any(|h| h.flight == hold.flight && h.seat == hold.seat);
        self.inventory.claim(&hold.flight, hold.seat.to_string(), ours)
    }
}

impl std::fmt::Debug for InMemorySeatSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySeatSessions")
            .field("ttl", &self.ttl)
            .field("sessions", &lock(&self.sessions).len())
            .finish_non_exhaustive()
    }
}

impl SeatSessionGateway for InMemorySeatSessions {
    fn create<'a>(&'a self, hold: &'a SeatHold) -> GatewayFuture<'a, SeatSession> {
        Box::pin(async move {
            simulate_latency(self.latency).await;

            let now = self.clock.now();
            let mut session = SeatSession {
                id: SeatSessionId::new(),
                starts_at: now,
                ends_at: now + self.ttl,
                holds: Vec::new(),
            };
            self.take(&session, hold)?;
            session.holds.push(hold.clone());

            lock(&self.sessions).insert(session.id, session.clone());
            Ok(session)
        })
    }

    fn append<'a>(
        &'a self,
        session: &'a SeatSessionId,
        hold: &'a SeatHold,
    ) -> GatewayFuture<'a, SeatSession> {
        Box::pin(async move {
            simulate_latency(self.latency).await;

            let mut sessions = lock(&self.sessions);
            let current = sessions
                .get_mut(session)
                .ok_or_else(|| GatewayError::NotFound(format!("seat session {session}")))?;
            if current.is_expired(self.clock.now()) {
                return Err(GatewayError::Conflict(format!(
                    "seat session {session} has expired"
                )));
            }

            self.take(current, hold)?;
            if !current.holds.contains(hold) {
                current.holds.push(hold.clone());
            }
            Ok(current.clone())
        })
    }

    fn get<'a>(&'a self, session: &'a SeatSessionId) -> GatewayFuture<'a, SeatSession> {
        Box::pin(async move {
            simulate_latency(self.latency).await;
            lock(&self.sessions)
                .get(session)
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("seat session {session}")))
        })
    }
}

/// Booking gateway recording every created booking
#[derive(Debug, Default)]
pub struct InMemoryBookings {
    created: Mutex<Vec<(BookingId, BookingRequest)>>,
    failure: Option<GatewayError>,
    latency: Duration,
}

impl InMemoryBookings {
    /// Gateway accepting every booking
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway rejecting every booking with `error`
    #[must_use]
    pub fn failing(error: GatewayError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Bookings created so far
    #[must_use]
    pub fn created(&self) -> Vec<(BookingId, BookingRequest)> {
        lock(&self.created).clone()
    }
}

impl BookingGateway for InMemoryBookings {
    fn create_booking<'a>(&'a self, request: &'a BookingRequest) -> GatewayFuture<'a, BookingId> {
        Box::pin(async move {
            simulate_latency(self.latency).await;
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }

            let id = BookingId::new();
            lock(&self.created).push((id, request.clone()));
            Ok(id)
        })
    }
}
