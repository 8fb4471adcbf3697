//! Domain types shared by the seat map, the reducer and the gateways.

use crate::seat::{SeatClass, SeatCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Scheduled flight identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(String);

impl FlightId {
    /// Creates a flight id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aircraft identifier (authoring context)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AircraftId(String);

impl AircraftId {
    /// Creates an aircraft id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Purchasable add-on identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraId(String);

impl ExtraId {
    /// Creates an extra id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ExtraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-held seat session identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatSessionId(Uuid);

impl SeatSessionId {
    /// Creates a new random `SeatSessionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `SeatSessionId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for SeatSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeatSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Created booking identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `BookingId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation of the booking journey a response belongs to
///
/// Installing a new booking bumps the token; responses carrying an older
/// token are discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JourneyToken(u64);

impl JourneyToken {
    /// The token after this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Flights chosen on the search results page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journey {
    /// Outbound flights, in travel order
    pub departure: Vec<FlightId>,
    /// Inbound flights for a round trip
    pub return_flights: Option<Vec<FlightId>>,
}

impl Journey {
    /// One-way journey
    #[must_use]
    pub const fn one_way(departure: Vec<FlightId>) -> Self {
        Self {
            departure,
            return_flights: None,
        }
    }

    /// Round trip
    #[must_use]
    pub const fn round_trip(departure: Vec<FlightId>, return_flights: Vec<FlightId>) -> Self {
        Self {
            departure,
            return_flights: Some(return_flights),
        }
    }

    /// Every flight segment, outbound first
    pub fn segments(&self) -> impl Iterator<Item = &FlightId> {
        self.departure
            .iter()
            .chain(self.return_flights.iter().flatten())
    }

    /// Whether `flight` is part of this journey
    #[must_use]
    pub fn contains(&self, flight: &FlightId) -> bool {
        self.segments().any(|f| f == flight)
    }
}

/// Wizard step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPhase {
    /// Journey summary
    #[default]
    Overview,
    /// Seat selection
    Seats,
    /// Extras and insurance
    Extras,
    /// Payment and submission
    Payment,
    /// Booking created
    Confirmed,
    /// Booking creation failed
    Error,
}

impl BookingPhase {
    /// Steps shown by the progress indicator, in order
    pub const STEPS: [Self; 5] = [
        Self::Overview,
        Self::Seats,
        Self::Extras,
        Self::Payment,
        Self::Confirmed,
    ];

    /// The step after this one; `None` for terminal phases
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Overview => Some(Self::Seats),
            Self::Seats => Some(Self::Extras),
            Self::Extras => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmed),
            Self::Confirmed | Self::Error => None,
        }
    }

    /// Position in [`BookingPhase::STEPS`]; `None` for `Error`
    #[must_use]
    pub fn step_index(self) -> Option<usize> {
        Self::STEPS.iter().position(|step| *step == self)
    }

    /// `Confirmed` or `Error`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Error)
    }
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Overview => "OVERVIEW",
            Self::Seats => "SEATS",
            Self::Extras => "EXTRAS",
            Self::Payment => "PAYMENT",
            Self::Confirmed => "CONFIRMED",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// A seat chosen for one flight segment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSelection {
    /// Segment
    pub flight: FlightId,
    /// Chosen seat
    pub seat: SeatCode,
    /// Fare class the seat is sold in
    pub class: SeatClass,
}

/// A seat held inside a seat session
pub type SeatHold = SeatSelection;

/// Server-side temporary reservation of seats
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSession {
    /// Session id
    pub id: SeatSessionId,
    /// When the session was opened
    pub starts_at: DateTime<Utc>,
    /// When the server releases the holds
    pub ends_at: DateTime<Utc>,
    /// Seats held so far
    pub holds: Vec<SeatHold>,
}

impl SeatSession {
    /// Whether the hold window has closed at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

/// Seat configuration of a scheduled flight
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSeatConfig {
    /// Number of rows
    pub rows: u32,
    /// Economy seat codes
    #[serde(default)]
    pub economy_class_seats: Vec<String>,
    /// Business seat codes
    #[serde(default)]
    pub business_class_seats: Vec<String>,
    /// First class seat codes
    #[serde(default)]
    pub first_class_seats: Vec<String>,
    /// Seats already booked or held
    #[serde(default)]
    pub booked_seats: Vec<String>,
}

/// Seat configuration of an aircraft (authoring context)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftSeatConfig {
    /// Number of rows
    pub rows: u32,
    /// Blocked seat codes
    #[serde(default)]
    pub unavailable_seats: Vec<String>,
    /// First class seat codes
    #[serde(default)]
    pub first_class_seats: Vec<String>,
    /// Business seat codes
    #[serde(default)]
    pub business_class_seats: Vec<String>,
    /// Economy seat codes
    #[serde(default)]
    pub economy_class_seats: Vec<String>,
}

/// Payload of the booking creation call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Session holding the chosen seats
    pub seat_session: SeatSessionId,
    /// Outbound flights
    pub departure_flights: Vec<FlightId>,
    /// Inbound flights, empty for one-way trips
    pub return_flights: Vec<FlightId>,
    /// Extra ids, one entry per purchased unit
    pub extras: Vec<ExtraId>,
    /// Travel insurance
    pub insurance: bool,
}
