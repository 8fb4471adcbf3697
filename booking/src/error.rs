//! Error types for seat maps and the booking flow.

use crate::seat::SeatCodeError;
use crate::seat_map::{SeatMapError, SeatSelectionError};
use crate::types::{BookingPhase, FlightId};
use flightdeck_runtime::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by the external collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The requested flight, aircraft or session does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The request collided with someone else's hold or booking
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transport or server failure
    #[error("network error: {0}")]
    Network(String),

    /// No response within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Broad category of a [`BookingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input could not be accepted
    Validation,
    /// A referenced resource does not exist
    NotFound,
    /// Someone else got there first
    Conflict,
    /// The booking is not in a state that allows the operation
    Precondition,
    /// Transport, timeout or unknown failure
    Network,
}

/// Errors surfaced by the booking flow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// `get_state` or a command was used before a booking was installed
    #[error("no active booking")]
    NoActiveBooking,

    /// A seat code could not be decoded
    #[error(transparent)]
    InvalidSeatCode(#[from] SeatCodeError),

    /// A seat map could not be built from the inventory
    #[error(transparent)]
    SeatMap(#[from] SeatMapError),

    /// The chosen seat cannot be sold for this segment
    #[error("cannot select seat on {flight}: {source}")]
    SeatNotSelectable {
        /// Segment
        flight: FlightId,
        /// Reason
        #[source]
        source: SeatSelectionError,
    },

    /// Seat selection needs the segment's map first
    #[error("seat map for {0} is not loaded")]
    SeatMapNotLoaded(FlightId),

    /// The flight is not part of the journey
    #[error("flight {0} is not part of this booking")]
    UnknownFlight(FlightId),

    /// The operation belongs to another wizard step
    #[error("operation requires phase {expected}, booking is in {actual}")]
    WrongPhase {
        /// Phase the operation needs
        expected: BookingPhase,
        /// Current phase
        actual: BookingPhase,
    },

    /// The booking already reached a terminal phase
    #[error("booking is already {0}")]
    Finished(BookingPhase),

    /// A segment has no seat yet
    #[error("no seat selected on {0}")]
    MissingSeat(FlightId),

    /// Submission needs a seat session
    #[error("no seat session")]
    NoSeatSession,

    /// An external collaborator failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The store rejected the action
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Category used to decide how to present the error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSeatCode(_) | Self::SeatMap(_) | Self::UnknownFlight(_) => {
                ErrorKind::Validation
            },
            Self::SeatNotSelectable { source, .. } => match source {
                SeatSelectionError::Occupied(_) => ErrorKind::Conflict,
                SeatSelectionError::NoSuchSeat(_) => ErrorKind::NotFound,
                SeatSelectionError::NotForSale(_) | SeatSelectionError::ClassMismatch { .. } => {
                    ErrorKind::Validation
                },
            },
            Self::NoActiveBooking
            | Self::SeatMapNotLoaded(_)
            | Self::WrongPhase { .. }
            | Self::Finished(_)
            | Self::MissingSeat(_)
            | Self::NoSeatSession => ErrorKind::Precondition,
            Self::Gateway(GatewayError::NotFound(_)) => ErrorKind::NotFound,
            Self::Gateway(GatewayError::Conflict(_)) => ErrorKind::Conflict,
            Self::Gateway(GatewayError::Network(_) | GatewayError::Timeout(_)) | Self::Store(_) => {
                ErrorKind::Network
            },
        }
    }
}
