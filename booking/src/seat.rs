//! Seat codes, seat classes and grid cells.
//!
//! A seat code is a 1-based row number followed by one column letter, e.g.
//! `"12A"`. Columns run `A` through `F`, so every row has six seats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Seats per row
pub const SEATS_PER_ROW: usize = 6;

/// Column letters, indexed by column
pub const COLUMN_LETTERS: [char; SEATS_PER_ROW] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Why a seat code could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatCodeError {
    /// Empty input
    #[error("seat code is empty")]
    Empty,

    /// No digits before the column letter
    #[error("seat code {0:?} has no row number")]
    MissingRow(String),

    /// Row prefix is not a positive integer
    #[error("seat code {0:?} has an invalid row number")]
    InvalidRow(String),

    /// Column letter outside `A`–`F`
    #[error("seat code {code:?} has invalid column {column:?}")]
    InvalidColumn {
        /// The offending code
        code: String,
        /// The character found in column position
        column: char,
    },

    /// Row beyond the aircraft's last row
    #[error("seat code {code:?} is beyond row {rows}")]
    RowOutOfRange {
        /// The offending code
        code: String,
        /// Rows on the aircraft
        rows: u32,
    },
}

/// A decoded seat code
///
/// Ordering is row-major: `1A < 1F < 2A`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatCode {
    row: u32,
    column: u8,
}

impl SeatCode {
    /// Build a code from a 1-based row number and a 0-based column index
    ///
    /// # Errors
    ///
    /// Returns [`SeatCodeError`] if the row is zero or the column is past `F`.
    pub fn new(row: u32, column: usize) -> Result<Self, SeatCodeError> {
        if row == 0 {
            return Err(SeatCodeError::InvalidRow(row.to_string()));
        }
        let column = u8::try_from(column)
            .ok()
            .filter(|c| usize::from(*c) < SEATS_PER_ROW)
            .ok_or_else(|| SeatCodeError::InvalidColumn {
                code: format!("{row}?"),
                column: '?',
            })?;
        Ok(Self { row, column })
    }

    /// Build a code from 0-based grid indices
    ///
    /// # Errors
    ///
    /// Returns [`SeatCodeError`] if the column index is past `F` or the row
    /// index does not fit a row number.
    pub fn from_indices(row_index: usize, column_index: usize) -> Result<Self, SeatCodeError> {
        let row = u32::try_from(row_index + 1)
            .map_err(|_| SeatCodeError::InvalidRow(format!("{}", row_index + 1)))?;
        Self::new(row, column_index)
    }

    /// Decode `code` and check it fits an aircraft with `rows` rows
    ///
    /// # Errors
    ///
    /// Returns [`SeatCodeError`] if the code is malformed or out of range.
    pub fn parse_within(code: &str, rows: u32) -> Result<Self, SeatCodeError> {
        let seat: Self = code.parse()?;
        if seat.row > rows {
            return Err(SeatCodeError::RowOutOfRange {
                code: code.to_string(),
                rows,
            });
        }
        Ok(seat)
    }

    /// 1-based row number as printed on the code
    #[must_use]
    pub const fn row_number(&self) -> u32 {
        self.row
    }

    /// 0-based row index into the grid
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row as usize - 1
    }

    /// 0-based column index into the grid
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column as usize
    }

    /// Column letter
    #[must_use]
    pub const fn letter(&self) -> char {
        COLUMN_LETTERS[self.column as usize]
    }
}

impl FromStr for SeatCode {
    type Err = SeatCodeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let mut chars = code.chars();
        let column = chars.next_back().ok_or(SeatCodeError::Empty)?;
        let prefix = chars.as_str();

        let column_index = COLUMN_LETTERS
            .iter()
            .position(|letter| *letter == column)
            .ok_or_else(|| SeatCodeError::InvalidColumn {
                code: code.to_string(),
                column,
            })?;

        if prefix.is_empty() {
            return Err(SeatCodeError::MissingRow(code.to_string()));
        }
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SeatCodeError::InvalidRow(code.to_string()));
        }

        let row: u32 = prefix
            .parse()
            .map_err(|_| SeatCodeError::InvalidRow(code.to_string()))?;
        if row == 0 {
            return Err(SeatCodeError::InvalidRow(code.to_string()));
        }

        Self::new(row, column_index)
    }
}

impl fmt::Display for SeatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.letter())
    }
}

impl TryFrom<String> for SeatCode {
    type Error = SeatCodeError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<SeatCode> for String {
    fn from(code: SeatCode) -> Self {
        code.to_string()
    }
}

/// Class a seat is sold in
///
/// `Unassigned` only appears while authoring an aircraft layout;
/// `Unavailable` seats exist physically but are never sold.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    /// Not yet assigned to a class
    #[default]
    Unassigned,
    /// Economy cabin
    Economy,
    /// Business cabin
    Business,
    /// First class cabin
    First,
    /// Blocked seat
    Unavailable,
}

impl SeatClass {
    /// Whether seats of this class can be sold
    #[must_use]
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Economy | Self::Business | Self::First)
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unassigned => "unassigned",
            Self::Economy => "economy",
            Self::Business => "business",
            Self::First => "first",
            Self::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

/// One grid cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatCell {
    /// Assigned class
    pub class: SeatClass,
    /// Already booked or held by someone
    pub occupied: bool,
}

impl SeatCell {
    /// A free seat of `class`
    #[must_use]
    pub const fn new(class: SeatClass) -> Self {
        Self {
            class,
            occupied: false,
        }
    }

    /// Free and sold in some class
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.class.is_bookable() && !self.occupied
    }
}
