//! Booking state held by the store.

use crate::error::BookingError;
use crate::seat_map::SeatMap;
use crate::types::{
    BookingId, BookingPhase, BookingRequest, ExtraId, FlightId, Journey, JourneyToken,
    SeatSelection, SeatSession, SeatSessionId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One in-progress booking
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingState {
    /// Flights being booked
    pub journey: Journey,
    /// Seat session holding the chosen seats
    pub seat_session: Option<SeatSessionId>,
    /// At most one seat per segment
    pub seats: Vec<SeatSelection>,
    /// Extra ids, one entry per purchased unit
    pub extras: Vec<ExtraId>,
    /// Travel insurance
    pub insurance: bool,
    /// Current wizard step
    pub phase: BookingPhase,
    /// Set once the booking is confirmed
    pub booking_id: Option<BookingId>,
}

impl BookingState {
    /// Fresh booking for `journey`, on the overview step
    #[must_use]
    pub fn new(journey: Journey) -> Self {
        Self {
            journey,
            ..Self::default()
        }
    }

    /// Seat chosen on `flight`
    #[must_use]
    pub fn seat_for(&self, flight: &FlightId) -> Option<&SeatSelection> {
        self.seats.iter().find(|s| &s.flight == flight)
    }

    /// First segment without a seat, in travel order
    #[must_use]
    pub fn missing_seat(&self) -> Option<&FlightId> {
        self.journey
            .segments()
            .find(|flight| self.seat_for(flight).is_none())
    }

    /// Record `selection`, replacing the segment's previous seat
    pub fn select(&mut self, selection: SeatSelection) {
        self.seats.retain(|s| s.flight != selection.flight);
        self.seats.push(selection);
    }

    /// Shallow merge: every field set in `patch` replaces the current value
    pub fn apply(&mut self, patch: BookingPatch) {
        let BookingPatch {
            journey,
            seat_session,
            seats,
            extras,
            insurance,
            phase,
            booking_id,
        } = patch;

        if let Some(journey) = journey {
            self.journey = journey;
        }
        if let Some(seat_session) = seat_session {
            self.seat_session = seat_session;
        }
        if let Some(seats) = seats {
            self.seats = seats;
        }
        if let Some(extras) = extras {
            self.extras = extras;
        }
        if let Some(insurance) = insurance {
            self.insurance = insurance;
        }
        if let Some(phase) = phase {
            self.phase = phase;
        }
        if let Some(booking_id) = booking_id {
            self.booking_id = booking_id;
        }
    }

    /// Payload for the booking creation call
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NoSeatSession`] or [`BookingError::MissingSeat`]
    /// when the seats are not fully held yet.
    pub fn to_request(&self) -> Result<BookingRequest, BookingError> {
        let seat_session = self.seat_session.ok_or(BookingError::NoSeatSession)?;
        if let Some(flight) = self.missing_seat() {
            return Err(BookingError::MissingSeat(flight.clone()));
        }

        Ok(BookingRequest {
            seat_session,
            departure_flights: self.journey.departure.clone(),
            return_flights: self.journey.return_flights.clone().unwrap_or_default(),
            extras: self.extras.clone(),
            insurance: self.insurance,
        })
    }
}

/// Partial update for [`BookingState::apply`]
///
/// Nullable fields use a nested `Option` so a patch can clear them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    /// New journey
    pub journey: Option<Journey>,
    /// New seat session
    pub seat_session: Option<Option<SeatSessionId>>,
    /// New seat list
    pub seats: Option<Vec<SeatSelection>>,
    /// New extras list
    pub extras: Option<Vec<ExtraId>>,
    /// New insurance flag
    pub insurance: Option<bool>,
    /// New phase
    pub phase: Option<BookingPhase>,
    /// New booking id
    pub booking_id: Option<Option<BookingId>>,
}

impl BookingPatch {
    /// Patch setting only the phase
    #[must_use]
    pub fn phase(phase: BookingPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    /// Also set the insurance flag
    #[must_use]
    pub const fn with_insurance(mut self, insurance: bool) -> Self {
        self.insurance = Some(insurance);
        self
    }

    /// Also replace the extras
    #[must_use]
    pub fn with_extras(mut self, extras: Vec<ExtraId>) -> Self {
        self.extras = Some(extras);
        self
    }

    /// Also set the seat session
    #[must_use]
    pub const fn with_seat_session(mut self, session: Option<SeatSessionId>) -> Self {
        self.seat_session = Some(session);
        self
    }
}

/// Store state: the booking plus what the wizard fetched for it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingSession {
    /// Active booking; `None` until one is installed
    pub booking: Option<BookingState>,
    /// Generation of the active booking
    pub journey_token: JourneyToken,
    /// Seat maps of the journey's flights, as last loaded
    pub seat_maps: BTreeMap<FlightId, SeatMap>,
    /// Seat session as last returned by the server
    pub hold: Option<SeatSession>,
    /// Error of the last command or response
    pub last_error: Option<BookingError>,
}

impl BookingSession {
    /// Current phase, if a booking is active
    #[must_use]
    pub fn phase(&self) -> Option<BookingPhase> {
        self.booking.as_ref().map(|b| b.phase)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::seat::SeatClass;

    fn journey() -> Journey {
        Journey::round_trip(vec![FlightId::new("FD1")], vec![FlightId::new("FD2")])
    }

    fn selection(flight: &str, seat: &str) -> SeatSelection {
        SeatSelection {
            flight: FlightId::new(flight),
            seat: seat.parse().unwrap(),
            class: SeatClass::Economy,
        }
    }

    #[test]
    fn phase_patch_changes_only_phase() {
        let mut state = BookingState::new(journey());
        state.insurance = true;
        state.extras = vec![ExtraId::new("BAG")];
        let before = state.clone();

        state.apply(BookingPatch::phase(BookingPhase::Extras));

        assert_eq!(state.phase, BookingPhase::Extras);
        assert_eq!(
            BookingState {
                phase: before.phase,
                ..state
            },
            before
        );
    }

    #[test]
    fn one_seat_per_segment() {
        let mut state = BookingState::new(journey());
        state.select(selection("FD1", "1A"));
        state.select(selection("FD2", "3C"));
        state.select(selection("FD1", "2B"));

        assert_eq!(state.seats.len(), 2);
        assert_eq!(
            state.seat_for(&FlightId::new("FD1")).unwrap().seat.to_string(),
            "2B"
        );
        assert_eq!(state.missing_seat(), None);
    }

    #[test]
    fn request_requires_session_and_seats() {
        let mut state = BookingState::new(journey());
        assert_eq!(state.to_request(), Err(BookingError::NoSeatSession));

        let session = SeatSessionId::new();
        state.apply(BookingPatch::default().with_seat_session(Some(session)));
        state.select(selection("FD1", "1A"));
        assert_eq!(
            state.to_request(),
            Err(BookingError::MissingSeat(FlightId::new("FD2")))
        );

        state.select(selection("FD2", "1A"));
        state.extras = vec![ExtraId::new("BAG"), ExtraId::new("BAG")];
        let request = state.to_request().unwrap();
        assert_eq!(request.seat_session, session);
        assert_eq!(request.return_flights, [FlightId::new("FD2")]);
        assert_eq!(request.extras.len(), 2);
    }
}
