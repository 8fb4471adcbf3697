//! `BookingFlow`: the wizard's handle on a booking store.
//!
//! Each wizard step talks to the same explicitly shared `BookingFlow`. Awaited
//! commands return once the store is idle, so the result reflects every
//! gateway response the command triggered.

use crate::actions::BookingAction;
use crate::config::BookingConfig;
use crate::environment::{BookingEnvironment, SeatInventory, with_timeout};
use crate::error::BookingError;
use crate::extras::ExtraSelection;
use crate::reducer::BookingReducer;
use crate::seat::{SeatClass, SeatCode};
use crate::seat_map::SeatMap;
use crate::state::{BookingPatch, BookingSession, BookingState};
use crate::types::{AircraftId, BookingId, BookingPhase, FlightId};
use flightdeck_runtime::{LoadingTracker, StateSubscription, Store};
use std::sync::Arc;
use std::time::Duration;

/// Store type behind [`BookingFlow`]
pub type BookingStore = Store<BookingSession, BookingAction, BookingEnvironment, BookingReducer>;

/// Shared handle on one booking session
///
/// Awaited commands report the error recorded on the session while they and
/// their requests ran. That error slot is shared: when clones of one flow
/// issue commands concurrently, a command may observe an error caused by
/// another clone's command, or find its own error cleared by it. Issue
/// commands from one task at a time when the returned error matters.
#[derive(Clone)]
pub struct BookingFlow {
    store: BookingStore,
    inventory: Arc<dyn SeatInventory>,
    config: BookingConfig,
}

impl BookingFlow {
    /// Flow with its own loading tracker
    #[must_use]
    pub fn new(env: BookingEnvironment) -> Self {
        Self::with_loading(env, LoadingTracker::new())
    }

    /// Flow reporting its requests on a shared loading tracker
    #[must_use]
    pub fn with_loading(env: BookingEnvironment, loading: LoadingTracker) -> Self {
        let inventory = Arc::clone(&env.inventory);
        let config = env.config.clone();
        Self {
            store: Store::with_loading(BookingSession::default(), BookingReducer::new(), env, loading),
            inventory,
            config,
        }
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &BookingStore {
        &self.store
    }

    /// Send `action` without waiting for its requests
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] once the flow is closed.
    pub async fn dispatch(&self, action: BookingAction) -> Result<(), BookingError> {
        self.store.send(action).await?;
        Ok(())
    }

    /// Send `action`, wait for its requests and report the recorded error
    async fn run(&self, action: BookingAction) -> Result<(), BookingError> {
        self.dispatch(action).await?;
        self.store.wait_idle().await;
        match self.store.state(|s| s.last_error.clone()).await {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Install a fresh booking
    ///
    /// Requests still running for a previous booking are cancelled and their
    /// late responses ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] once the flow is closed.
    pub async fn set_state(&self, booking: BookingState) -> Result<(), BookingError> {
        self.run(BookingAction::Start { booking }).await
    }

    /// Current booking
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NoActiveBooking`] before [`BookingFlow::set_state`].
    pub async fn get_state(&self) -> Result<BookingState, BookingError> {
        self.store
            .state(|s| s.booking.clone())
            .await
            .ok_or(BookingError::NoActiveBooking)
    }

    /// Shallow-merge `patch` into the booking, without phase validation
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NoActiveBooking`] before [`BookingFlow::set_state`].
    pub async fn update_state(&self, patch: BookingPatch) -> Result<(), BookingError> {
        self.run(BookingAction::Update { patch }).await
    }

    /// Every state change, starting with the current state
    pub async fn subscribe(&self) -> StateSubscription<BookingSession> {
        self.store.subscribe().await
    }

    /// Load the seat map of every segment
    ///
    /// # Errors
    ///
    /// Returns the first failure recorded while loading.
    pub async fn load_seat_maps(&self) -> Result<(), BookingError> {
        self.run(BookingAction::LoadSeatMaps).await
    }

    /// Seat map of `flight`, if loaded
    pub async fn seat_map(&self, flight: &FlightId) -> Option<SeatMap> {
        self.store.state(|s| s.seat_maps.get(flight).cloned()).await
    }

    /// Hold `seat` on `flight`
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidSeatCode`] for a malformed code, the
    /// validation failure, or the gateway error (a taken seat is a conflict).
    pub async fn select_seat(
        &self,
        flight: &FlightId,
        seat: &str,
        class: SeatClass,
    ) -> Result<(), BookingError> {
        let seat: SeatCode = seat.parse()?;
        self.run(BookingAction::SelectSeat {
            flight: flight.clone(),
            seat,
            class,
        })
        .await
    }

    /// Add extras picked for `flight`
    ///
    /// # Errors
    ///
    /// Fails outside the extras step or for a flight not in the journey.
    pub async fn add_extras(
        &self,
        flight: &FlightId,
        selections: Vec<ExtraSelection>,
    ) -> Result<(), BookingError> {
        self.run(BookingAction::AddExtras {
            flight: flight.clone(),
            selections,
        })
        .await
    }

    /// Toggle travel insurance
    ///
    /// # Errors
    ///
    /// Fails outside the extras step.
    pub async fn set_insurance(&self, insurance: bool) -> Result<(), BookingError> {
        self.run(BookingAction::SetInsurance(insurance)).await
    }

    /// Move to the next step
    ///
    /// # Errors
    ///
    /// Fails when the current step is incomplete or terminal.
    pub async fn advance(&self) -> Result<(), BookingError> {
        self.run(BookingAction::Advance).await
    }

    /// Create the booking from the payment step
    ///
    /// # Errors
    ///
    /// Returns the precondition failure, or the gateway error after the
    /// booking moved to the error phase.
    pub async fn submit_booking(&self) -> Result<BookingId, BookingError> {
        self.run(BookingAction::SubmitBooking).await?;
        let booking = self.get_state().await?;
        booking.booking_id.ok_or(BookingError::WrongPhase {
            expected: BookingPhase::Confirmed,
            actual: booking.phase,
        })
    }

    /// Seat layout of `aircraft` for the authoring tool
    ///
    /// # Errors
    ///
    /// Returns the gateway error or the seat map build failure.
    pub async fn aircraft_seat_map(&self, aircraft: &AircraftId) -> Result<SeatMap, BookingError> {
        fetch_aircraft_seat_map(self.inventory.as_ref(), aircraft, &self.config).await
    }

    /// Busy flag driven by this flow's requests
    #[must_use]
    pub fn loading(&self) -> LoadingTracker {
        self.store.loading()
    }

    /// Stop accepting commands and cancel running requests
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if requests outlive `timeout`.
    pub async fn close(&self, timeout: Duration) -> Result<(), BookingError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }
}

impl std::fmt::Debug for BookingFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingFlow")
            .field("version", &self.store.version())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Fetch and build an aircraft's seat map
///
/// Unlisted seats come back unassigned.
///
/// # Errors
///
/// Returns the gateway error or the seat map build failure.
pub async fn fetch_aircraft_seat_map(
    inventory: &dyn SeatInventory,
    aircraft: &AircraftId,
    config: &BookingConfig,
) -> Result<SeatMap, BookingError> {
    let layout = with_timeout(config.request_timeout(), inventory.aircraft_seats(aircraft)).await?;
    Ok(SeatMap::for_aircraft(&layout, config.seat_code_policy)?)
}
