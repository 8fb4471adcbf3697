//! Inputs of the booking reducer.

use crate::error::GatewayError;
use crate::extras::ExtraSelection;
use crate::seat::{SeatClass, SeatCode};
use crate::state::{BookingPatch, BookingState};
use crate::types::{BookingId, FlightId, FlightSeatConfig, JourneyToken, SeatSelection, SeatSession};

/// Commands from the wizard and responses from the gateways
///
/// Responses carry the [`JourneyToken`] of the booking they were requested
/// for and are ignored once another booking has been installed.
#[derive(Clone, Debug, PartialEq)]
pub enum BookingAction {
    // Commands
    /// Install a fresh booking, abandoning the current one
    Start {
        /// Initial state
        booking: BookingState,
    },
    /// Shallow-merge `patch` into the booking
    Update {
        /// Fields to replace
        patch: BookingPatch,
    },
    /// Fetch seat maps for every segment
    LoadSeatMaps,
    /// Hold a seat on one segment
    SelectSeat {
        /// Segment
        flight: FlightId,
        /// Seat
        seat: SeatCode,
        /// Fare class
        class: SeatClass,
    },
    /// Add extras picked for one segment
    AddExtras {
        /// Segment
        flight: FlightId,
        /// Quantities
        selections: Vec<ExtraSelection>,
    },
    /// Toggle travel insurance
    SetInsurance(bool),
    /// Move to the next step; on the payment step this submits the booking
    Advance,
    /// Create the booking
    SubmitBooking,
    /// Dismiss the recorded error
    ClearError,

    // Responses
    /// A flight's seat configuration arrived
    SeatMapLoaded {
        /// Generation the request belongs to
        token: JourneyToken,
        /// Segment
        flight: FlightId,
        /// Gateway result
        result: Result<FlightSeatConfig, GatewayError>,
    },
    /// A seat hold completed
    SeatHeld {
        /// Generation the request belongs to
        token: JourneyToken,
        /// Requested seat
        selection: SeatSelection,
        /// Seat session after the hold
        result: Result<SeatSession, GatewayError>,
    },
    /// Booking creation completed
    BookingCreated {
        /// Generation the request belongs to
        token: JourneyToken,
        /// Gateway result
        result: Result<BookingId, GatewayError>,
    },
}

impl BookingAction {
    /// Generation of a response; `None` for commands
    #[must_use]
    pub const fn token(&self) -> Option<JourneyToken> {
        match self {
            Self::SeatMapLoaded { token, .. }
            | Self::SeatHeld { token, .. }
            | Self::BookingCreated { token, .. } => Some(*token),
            _ => None,
        }
    }
}
