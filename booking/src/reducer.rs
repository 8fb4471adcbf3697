//! The booking wizard as a reducer.
//!
//! Commands validate against the current state and either change it or
//! describe a gateway call. Gateway calls are cancellable effects keyed per
//! segment; leaving a step cancels the calls that belong to it, and installing
//! a new booking cancels everything and bumps the journey token so late
//! responses are dropped.

use crate::actions::BookingAction;
use crate::environment::{BookingEnvironment, with_timeout};
use crate::error::{BookingError, GatewayError};
use crate::extras::{ExtraSelection, append_extras};
use crate::seat::{SeatClass, SeatCode};
use crate::seat_map::SeatMap;
use crate::state::{BookingPatch, BookingSession, BookingState};
use crate::types::{
    BookingId, BookingPhase, FlightId, FlightSeatConfig, SeatHold, SeatSelection, SeatSession,
};
use flightdeck_core::effect::{Effect, EffectId};
use flightdeck_core::reducer::Reducer;
use flightdeck_core::{SmallVec, cancellable_effect, smallvec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<BookingAction>; 4]>;

/// Effect id of the booking creation call
pub const SUBMIT_EFFECT: EffectId = EffectId::from_static("booking-submit");

/// Effect id of the seat map load for `flight`
#[must_use]
pub fn seat_map_effect(flight: &FlightId) -> EffectId {
    EffectId::new(format!("seat-map:{flight}"))
}

/// Effect id of the seat hold for `flight`
#[must_use]
pub fn seat_hold_effect(flight: &FlightId) -> EffectId {
    EffectId::new(format!("seat-hold:{flight}"))
}

/// Requests that belong to `phase` and die with it
fn step_requests(booking: &BookingState, phase: BookingPhase) -> Vec<EffectId> {
    match phase {
        BookingPhase::Seats => booking
            .journey
            .segments()
            .flat_map(|flight| [seat_map_effect(flight), seat_hold_effect(flight)])
            .collect(),
        BookingPhase::Payment => vec![SUBMIT_EFFECT],
        BookingPhase::Overview
        | BookingPhase::Extras
        | BookingPhase::Confirmed
        | BookingPhase::Error => Vec::new(),
    }
}

fn cancel_all(ids: Vec<EffectId>) -> Effects {
    ids.into_iter().map(Effect::Cancel).collect()
}

fn require_phase(booking: &BookingState, expected: BookingPhase) -> Result<(), BookingError> {
    if booking.phase == expected {
        Ok(())
    } else {
        Err(BookingError::WrongPhase {
            expected,
            actual: booking.phase,
        })
    }
}

fn require_segment(booking: &BookingState, flight: &FlightId) -> Result<(), BookingError> {
    if booking.journey.contains(flight) {
        Ok(())
    } else {
        Err(BookingError::UnknownFlight(flight.clone()))
    }
}

/// Reducer for [`BookingSession`]
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn start(state: &mut BookingSession, booking: BookingState) -> Effects {
        let mut effects: Effects = state
            .booking
            .iter()
            .flat_map(|old| step_requests(old, BookingPhase::Seats))
            .map(Effect::Cancel)
            .collect();
        effects.push(Effect::Cancel(SUBMIT_EFFECT));

        state.journey_token = state.journey_token.next();
        state.booking = Some(booking);
        state.seat_maps.clear();
        state.hold = None;

        tracing::debug!(token = ?state.journey_token, "Installed booking");
        effects
    }

    fn update(state: &mut BookingSession, patch: BookingPatch) -> Result<Effects, BookingError> {
        let booking = state.booking.as_mut().ok_or(BookingError::NoActiveBooking)?;
        let from = booking.phase;
        booking.apply(patch);

        if booking.phase == from {
            Ok(smallvec![Effect::None])
        } else {
            tracing::debug!(%from, to = %booking.phase, "Phase changed by update");
            Ok(cancel_all(step_requests(booking, from)))
        }
    }

    fn load_seat_maps(
        state: &BookingSession,
        env: &BookingEnvironment,
    ) -> Result<Effects, BookingError> {
        let booking = state.booking.as_ref().ok_or(BookingError::NoActiveBooking)?;
        if booking.phase.is_terminal() {
            return Err(BookingError::Finished(booking.phase));
        }

        let token = state.journey_token;
        let timeout = env.config.request_timeout();

        Ok(booking
            .journey
            .segments()
            .map(|flight| {
                let id = seat_map_effect(flight);
                let flight = flight.clone();
                let inventory = Arc::clone(&env.inventory);
                cancellable_effect! {
                    id: id,
                    body: {
                        let result = with_timeout(timeout, inventory.flight_seats(&flight)).await;
                        Some(BookingAction::SeatMapLoaded { token, flight, result })
                    }
                }
            })
            .collect())
    }

    fn seat_map_loaded(
        state: &mut BookingSession,
        env: &BookingEnvironment,
        flight: FlightId,
        result: Result<FlightSeatConfig, GatewayError>,
    ) -> Effects {
        let map = result
            .map_err(BookingError::from)
            .and_then(|config| {
                SeatMap::for_flight(&config, env.config.seat_code_policy).map_err(BookingError::from)
            });

        match map {
            Ok(map) => {
                tracing::debug!(%flight, rows = map.rows(), "Seat map loaded");
                state.seat_maps.insert(flight, map);
            },
            Err(error) => {
                tracing::warn!(%flight, %error, "Seat map unavailable");
                state.last_error = Some(error);
            },
        }
        smallvec![Effect::None]
    }

    fn select_seat(
        state: &BookingSession,
        env: &BookingEnvironment,
        flight: FlightId,
        seat: SeatCode,
        class: SeatClass,
    ) -> Result<Effects, BookingError> {
        let booking = state.booking.as_ref().ok_or(BookingError::NoActiveBooking)?;
        require_phase(booking, BookingPhase::Seats)?;
        require_segment(booking, &flight)?;

        let map = state
            .seat_maps
            .get(&flight)
            .ok_or_else(|| BookingError::SeatMapNotLoaded(flight.clone()))?;
        map.check_selectable(&seat, class)
            .map_err(|source| BookingError::SeatNotSelectable {
                flight: flight.clone(),
                source,
            })?;

        let now = env.clock.now();
        let session = state
            .hold
            .as_ref()
            .filter(|hold| !hold.is_expired(now))
            .map(|hold| hold.id);
        if state.hold.is_some() && session.is_none() {
            tracing::debug!("Seat session expired, opening a new one");
        }

        let token = state.journey_token;
        let timeout = env.config.request_timeout();
        let sessions = Arc::clone(&env.seat_sessions);
        let id = seat_hold_effect(&flight);
        let selection = SeatHold {
            flight,
            seat,
            class,
        };

        Ok(smallvec![cancellable_effect! {
            id: id,
            body: {
                let call = async {
                    match &session {
                        Some(session) => sessions.append(session, &selection).await,
                        None => sessions.create(&selection).await,
                    }
                };
                let result = with_timeout(timeout, call).await;
                Some(BookingAction::SeatHeld { token, selection, result })
            }
        }])
    }

    fn seat_held(
        state: &mut BookingSession,
        env: &BookingEnvironment,
        selection: SeatSelection,
        result: Result<SeatSession, GatewayError>,
    ) -> Result<Effects, BookingError> {
        let phase = state.phase();
        if phase != Some(BookingPhase::Seats) {
            tracing::warn!(
                flight = %selection.flight,
                seat = %selection.seat,
                ?phase,
                "Dropping seat hold outside the seats step"
            );
            return Ok(smallvec![Effect::None]);
        }

        match result {
            Ok(session) => {
                let booking = state.booking.as_mut().ok_or(BookingError::NoActiveBooking)?;
                tracing::debug!(flight = %selection.flight, seat = %selection.seat, "Seat held");

                booking.seat_session = Some(session.id);
                booking.select(selection);
                booking.seats.retain(|chosen| {
                    session
                        .holds
                        .iter()
                        .any(|hold| hold.flight == chosen.flight && hold.seat == chosen.seat)
                });
                state.hold = Some(session);
                Ok(smallvec![Effect::None])
            },
            Err(error @ GatewayError::Conflict(_)) => {
                tracing::warn!(flight = %selection.flight, seat = %selection.seat, %error, "Seat taken, reloading map");
                state.last_error = Some(error.into());

                let token = state.journey_token;
                let timeout = env.config.request_timeout();
                let inventory = Arc::clone(&env.inventory);
                let flight = selection.flight;
                Ok(smallvec![cancellable_effect! {
                    id: seat_map_effect(&flight),
                    body: {
                        let result = with_timeout(timeout, inventory.flight_seats(&flight)).await;
                        Some(BookingAction::SeatMapLoaded { token, flight, result })
                    }
                }])
            },
            Err(error) => Err(error.into()),
        }
    }

    fn add_extras(
        state: &mut BookingSession,
        flight: &FlightId,
        selections: &[ExtraSelection],
    ) -> Result<Effects, BookingError> {
        let booking = state.booking.as_mut().ok_or(BookingError::NoActiveBooking)?;
        require_phase(booking, BookingPhase::Extras)?;
        require_segment(booking, flight)?;

        append_extras(&mut booking.extras, selections);
        Ok(smallvec![Effect::None])
    }

    fn set_insurance(state: &mut BookingSession, insurance: bool) -> Result<Effects, BookingError> {
        let booking = state.booking.as_mut().ok_or(BookingError::NoActiveBooking)?;
        require_phase(booking, BookingPhase::Extras)?;

        booking.insurance = insurance;
        Ok(smallvec![Effect::None])
    }

    fn advance(
        state: &mut BookingSession,
        env: &BookingEnvironment,
    ) -> Result<Effects, BookingError> {
        let booking = state.booking.as_mut().ok_or(BookingError::NoActiveBooking)?;
        let from = booking.phase;

        let to = match from {
            BookingPhase::Overview => BookingPhase::Seats,
            BookingPhase::Seats => {
                if let Some(flight) = booking.missing_seat() {
                    return Err(BookingError::MissingSeat(flight.clone()));
                }
                BookingPhase::Extras
            },
            BookingPhase::Extras => BookingPhase::Payment,
            BookingPhase::Payment => return Self::submit(state, env),
            BookingPhase::Confirmed | BookingPhase::Error => {
                return Err(BookingError::Finished(from));
            },
        };

        let effects = cancel_all(step_requests(booking, from));
        booking.phase = to;
        tracing::debug!(%from, %to, "Advanced");
        Ok(effects)
    }

    fn submit(state: &BookingSession, env: &BookingEnvironment) -> Result<Effects, BookingError> {
        let booking = state.booking.as_ref().ok_or(BookingError::NoActiveBooking)?;
        require_phase(booking, BookingPhase::Payment)?;
        let request = booking.to_request()?;

        tracing::info!(
            seat_session = %request.seat_session,
            segments = request.departure_flights.len() + request.return_flights.len(),
            extras = request.extras.len(),
            "Submitting booking"
        );

        let token = state.journey_token;
        let timeout = env.config.request_timeout();
        let bookings = Arc::clone(&env.bookings);
        Ok(smallvec![cancellable_effect! {
            id: SUBMIT_EFFECT,
            body: {
                let result = with_timeout(timeout, bookings.create_booking(&request)).await;
                Some(BookingAction::BookingCreated { token, result })
            }
        }])
    }

    fn booking_created(
        state: &mut BookingSession,
        result: Result<BookingId, GatewayError>,
    ) -> Result<Effects, BookingError> {
        let booking = state.booking.as_mut().ok_or(BookingError::NoActiveBooking)?;
        match result {
            Ok(id) => {
                tracing::info!(booking_id = %id, "Booking confirmed");
                booking.booking_id = Some(id);
                booking.phase = BookingPhase::Confirmed;
                Ok(smallvec![Effect::None])
            },
            Err(error) => {
                tracing::error!(%error, "Booking creation failed");
                booking.phase = BookingPhase::Error;
                Err(error.into())
            },
        }
    }
}

impl Reducer for BookingReducer {
    type State = BookingSession;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action.token() {
            Some(token) if token != state.journey_token => {
                tracing::warn!(
                    ?token,
                    current = ?state.journey_token,
                    "Dropping response for an abandoned booking"
                );
                return smallvec![Effect::None];
            },
            Some(_) => {},
            None => state.last_error = None,
        }

        let result = match action {
            BookingAction::Start { booking } => Ok(Self::start(state, booking)),
            BookingAction::Update { patch } => Self::update(state, patch),
            BookingAction::LoadSeatMaps => Self::load_seat_maps(state, env),
            BookingAction::SelectSeat {
                flight,
                seat,
                class,
            } => Self::select_seat(state, env, flight, seat, class),
            BookingAction::AddExtras { flight, selections } => {
                Self::add_extras(state, &flight, &selections)
            },
            BookingAction::SetInsurance(insurance) => Self::set_insurance(state, insurance),
            BookingAction::Advance => Self::advance(state, env),
            BookingAction::SubmitBooking => Self::submit(state, env),
            BookingAction::ClearError => Ok(smallvec![Effect::None]),
            BookingAction::SeatMapLoaded { flight, result, .. } => {
                Ok(Self::seat_map_loaded(state, env, flight, result))
            },
            BookingAction::SeatHeld {
                selection, result, ..
            } => Self::seat_held(state, env, selection, result),
            BookingAction::BookingCreated { result, .. } => Self::booking_created(state, result),
        };

        result.unwrap_or_else(|error| {
            tracing::warn!(%error, kind = ?error.kind(), "Booking action failed");
            state.last_error = Some(error);
            smallvec![Effect::None]
        })
    }
}
