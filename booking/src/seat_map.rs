//! Seat map builder.
//!
//! Turns seat-code lists into a `rows × 6` grid of [`SeatCell`]s. Maps are
//! immutable values: any change to the inputs, or an authoring edit, produces
//! a new map.
//!
//! Every cell starts with the default class. The class lists are then applied
//! in [`CLASS_PRIORITY`] order and a later list overrides an earlier one, so a
//! code listed twice ends up in the class applied last. The occupied overlay
//! is applied independently of the class.

use crate::seat::{SEATS_PER_ROW, SeatCell, SeatClass, SeatCode, SeatCodeError};
use crate::types::{AircraftSeatConfig, FlightSeatConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Input list a seat code came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeatList {
    /// Business class assignments
    Business,
    /// First class assignments
    First,
    /// Blocked seats
    Unavailable,
    /// Explicit economy assignments
    Economy,
    /// Booked or held seats
    Occupied,
}

impl SeatList {
    /// Class assigned by this list; `None` for the occupied overlay
    #[must_use]
    pub const fn class(self) -> Option<SeatClass> {
        match self {
            Self::Business => Some(SeatClass::Business),
            Self::First => Some(SeatClass::First),
            Self::Unavailable => Some(SeatClass::Unavailable),
            Self::Economy => Some(SeatClass::Economy),
            Self::Occupied => None,
        }
    }
}

impl fmt::Display for SeatList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Business => "business",
            Self::First => "first",
            Self::Unavailable => "unavailable",
            Self::Economy => "economy",
            Self::Occupied => "occupied",
        };
        f.write_str(name)
    }
}

/// Largest row count a map accepts
pub const MAX_ROWS: u32 = 150;

/// Order class lists are applied in; later entries win
pub const CLASS_PRIORITY: [SeatList; 4] = [
    SeatList::Business,
    SeatList::First,
    SeatList::Unavailable,
    SeatList::Economy,
];

/// What to do with a seat code that cannot be placed on the grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCodePolicy {
    /// Fail the build
    #[default]
    Strict,
    /// Log and skip the code
    Lenient,
}

impl FromStr for SeatCodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown seat code policy {other:?}")),
        }
    }
}

/// Seat map construction failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatMapError {
    /// A map needs at least one row
    #[error("seat map must have at least one row")]
    ZeroRows,

    /// Row count beyond [`MAX_ROWS`]
    #[error("seat map has {0} rows, at most {MAX_ROWS} are supported")]
    TooManyRows(u32),

    /// A listed code could not be placed (strict policy)
    #[error("invalid seat in {list} list: {source}")]
    InvalidSeat {
        /// List the code came from
        list: SeatList,
        /// Decoding failure
        #[source]
        source: SeatCodeError,
    },
}

/// Why a seat cannot be selected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatSelectionError {
    /// Code is outside the grid
    #[error("seat {0} does not exist on this aircraft")]
    NoSuchSeat(SeatCode),

    /// Someone else has the seat
    #[error("seat {0} is already taken")]
    Occupied(SeatCode),

    /// Seat is blocked or unassigned
    #[error("seat {0} is not for sale")]
    NotForSale(SeatCode),

    /// Seat is sold in another class than the fare
    #[error("seat {seat} is {actual}, not {expected}")]
    ClassMismatch {
        /// Requested seat
        seat: SeatCode,
        /// Fare class
        expected: SeatClass,
        /// Class the seat is sold in
        actual: SeatClass,
    },
}

/// Builder for [`SeatMap`]
#[derive(Clone, Debug)]
pub struct SeatMapBuilder {
    rows: u32,
    default_class: SeatClass,
    policy: SeatCodePolicy,
    lists: Vec<(SeatList, Vec<String>)>,
}

impl SeatMapBuilder {
    /// Start a map with `rows` rows, defaulting to economy
    #[must_use]
    pub const fn new(rows: u32) -> Self {
        Self {
            rows,
            default_class: SeatClass::Economy,
            policy: SeatCodePolicy::Strict,
            lists: Vec::new(),
        }
    }

    /// Class of seats not present in any list
    #[must_use]
    pub const fn default_class(mut self, class: SeatClass) -> Self {
        self.default_class = class;
        self
    }

    /// Malformed code handling
    #[must_use]
    pub const fn policy(mut self, policy: SeatCodePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add seat codes to `list`
    #[must_use]
    pub fn list<I, C>(mut self, list: SeatList, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        let codes = codes.into_iter().map(|c| c.as_ref().to_string()).collect();
        self.lists.push((list, codes));
        self
    }

    /// Business class seats
    #[must_use]
    pub fn business<I: IntoIterator<Item = C>, C: AsRef<str>>(self, codes: I) -> Self {
        self.list(SeatList::Business, codes)
    }

    /// First class seats
    #[must_use]
    pub fn first<I: IntoIterator<Item = C>, C: AsRef<str>>(self, codes: I) -> Self {
        self.list(SeatList::First, codes)
    }

    /// Blocked seats
    #[must_use]
    pub fn unavailable<I: IntoIterator<Item = C>, C: AsRef<str>>(self, codes: I) -> Self {
        self.list(SeatList::Unavailable, codes)
    }

    /// Explicit economy seats
    #[must_use]
    pub fn economy<I: IntoIterator<Item = C>, C: AsRef<str>>(self, codes: I) -> Self {
        self.list(SeatList::Economy, codes)
    }

    /// Booked or held seats
    #[must_use]
    pub fn occupied<I: IntoIterator<Item = C>, C: AsRef<str>>(self, codes: I) -> Self {
        self.list(SeatList::Occupied, codes)
    }

    /// Build the grid
    ///
    /// # Errors
    ///
    /// Returns [`SeatMapError::ZeroRows`] for an empty aircraft,
    /// [`SeatMapError::TooManyRows`] past [`MAX_ROWS`], and
    /// [`SeatMapError::InvalidSeat`] for the first unplaceable code under the
    /// strict policy.
    pub fn build(self) -> Result<SeatMap, SeatMapError> {
        if self.rows == 0 {
            return Err(SeatMapError::ZeroRows);
        }
        if self.rows > MAX_ROWS {
            return Err(SeatMapError::TooManyRows(self.rows));
        }

        let row_count =
            usize::try_from(self.rows).map_err(|_| SeatMapError::TooManyRows(self.rows))?;
        let mut grid = vec![[SeatCell::new(self.default_class); SEATS_PER_ROW]; row_count];

        for priority in CLASS_PRIORITY {
            for (list, codes) in self.lists.iter().filter(|(list, _)| *list == priority) {
                for seat in self.decode(*list, codes)? {
                    if let Some(class) = list.class() {
                        grid[seat.row()][seat.column()].class = class;
                    }
                }
            }
        }

        for (list, codes) in self.lists.iter().filter(|(l, _)| *l == SeatList::Occupied) {
            for seat in self.decode(*list, codes)? {
                grid[seat.row()][seat.column()].occupied = true;
            }
        }

        Ok(SeatMap { grid })
    }

    fn decode(&self, list: SeatList, codes: &[String]) -> Result<Vec<SeatCode>, SeatMapError> {
        let mut seats = Vec::with_capacity(codes.len());
        for code in codes {
            match SeatCode::parse_within(code, self.rows) {
                Ok(seat) => seats.push(seat),
                Err(source) => match self.policy {
                    SeatCodePolicy::Strict => {
                        return Err(SeatMapError::InvalidSeat { list, source });
                    },
                    SeatCodePolicy::Lenient => {
                        tracing::warn!(%list, code = %code, error = %source, "Dropping seat code");
                    },
                },
            }
        }
        Ok(seats)
    }
}

/// Immutable `rows × 6` seat grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMap {
    grid: Vec<[SeatCell; SEATS_PER_ROW]>,
}

impl SeatMap {
    /// Start a builder
    #[must_use]
    pub const fn builder(rows: u32) -> SeatMapBuilder {
        SeatMapBuilder::new(rows)
    }

    /// Map shown while booking: unlisted seats are economy, booked seats occupied
    ///
    /// # Errors
    ///
    /// See [`SeatMapBuilder::build`].
    pub fn for_flight(
        config: &FlightSeatConfig,
        policy: SeatCodePolicy,
    ) -> Result<Self, SeatMapError> {
        Self::builder(config.rows)
            .default_class(SeatClass::Economy)
            .policy(policy)
            .business(&config.business_class_seats)
            .first(&config.first_class_seats)
            .economy(&config.economy_class_seats)
            .occupied(&config.booked_seats)
            .build()
    }

    /// Map edited in the aircraft authoring tool: unlisted seats are unassigned
    ///
    /// # Errors
    ///
    /// See [`SeatMapBuilder::build`].
    pub fn for_aircraft(
        config: &AircraftSeatConfig,
        policy: SeatCodePolicy,
    ) -> Result<Self, SeatMapError> {
        Self::builder(config.rows)
            .default_class(SeatClass::Unassigned)
            .policy(policy)
            .business(&config.business_class_seats)
            .first(&config.first_class_seats)
            .unavailable(&config.unavailable_seats)
            .economy(&config.economy_class_seats)
            .build()
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> u32 {
        u32::try_from(self.grid.len()).unwrap_or(u32::MAX)
    }

    /// Raw grid, row-major
    #[must_use]
    pub fn grid(&self) -> &[[SeatCell; SEATS_PER_ROW]] {
        &self.grid
    }

    /// Cell at 0-based grid indices
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<SeatCell> {
        self.grid.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Cell for `seat`
    #[must_use]
    pub fn cell(&self, seat: &SeatCode) -> Option<SeatCell> {
        self.get(seat.row(), seat.column())
    }

    /// Every seat with its cell, row-major
    pub fn iter(&self) -> impl Iterator<Item = (SeatCode, SeatCell)> + '_ {
        self.grid.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().filter_map(move |(column, cell)| {
                SeatCode::from_indices(row, column).ok().map(|seat| (seat, *cell))
            })
        })
    }

    /// Seats assigned to `class`, occupied or not
    #[must_use]
    pub fn seats_in(&self, class: SeatClass) -> Vec<SeatCode> {
        self.iter()
            .filter(|(_, cell)| cell.class == class)
            .map(|(seat, _)| seat)
            .collect()
    }

    /// Free seats of `class`
    #[must_use]
    pub fn available_seats(&self, class: SeatClass) -> Vec<SeatCode> {
        self.iter()
            .filter(|(_, cell)| cell.class == class && cell.is_available())
            .map(|(seat, _)| seat)
            .collect()
    }

    /// Number of seats per class
    #[must_use]
    pub fn class_counts(&self) -> BTreeMap<SeatClass, usize> {
        let mut counts = BTreeMap::new();
        for (_, cell) in self.iter() {
            *counts.entry(cell.class).or_insert(0) += 1;
        }
        counts
    }

    /// Check that `seat` can be sold to a passenger travelling in `class`
    ///
    /// # Errors
    ///
    /// Returns the [`SeatSelectionError`] describing why it cannot.
    pub fn check_selectable(
        &self,
        seat: &SeatCode,
        class: SeatClass,
    ) -> Result<SeatCell, SeatSelectionError> {
        let cell = self
            .cell(seat)
            .ok_or(SeatSelectionError::NoSuchSeat(*seat))?;

        if !cell.class.is_bookable() {
            return Err(SeatSelectionError::NotForSale(*seat));
        }
        if cell.occupied {
            return Err(SeatSelectionError::Occupied(*seat));
        }
        if cell.class != class {
            return Err(SeatSelectionError::ClassMismatch {
                seat: *seat,
                expected: class,
                actual: cell.class,
            });
        }
        Ok(cell)
    }

    /// New map with `seat` reassigned to `class`
    ///
    /// # Errors
    ///
    /// Returns [`SeatSelectionError::NoSuchSeat`] if the seat is off the grid.
    pub fn with_class(&self, seat: &SeatCode, class: SeatClass) -> Result<Self, SeatSelectionError> {
        let mut next = self.clone();
        let cell = next
            .grid
            .get_mut(seat.row())
            .and_then(|row| row.get_mut(seat.column()))
            .ok_or(SeatSelectionError::NoSuchSeat(*seat))?;
        cell.class = class;
        Ok(next)
    }

    /// Export class assignments in the aircraft configuration shape
    ///
    /// Unassigned seats are omitted; the lists are disjoint by construction.
    #[must_use]
    pub fn to_aircraft_config(&self) -> AircraftSeatConfig {
        let mut config = AircraftSeatConfig {
            rows: self.rows(),
            ..AircraftSeatConfig::default()
        };
        for (seat, cell) in self.iter() {
            let list = match cell.class {
                SeatClass::Unassigned => continue,
                SeatClass::Economy => &mut config.economy_class_seats,
                SeatClass::Business => &mut config.business_class_seats,
                SeatClass::First => &mut config.first_class_seats,
                SeatClass::Unavailable => &mut config.unavailable_seats,
            };
            list.push(seat.to_string());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;

    fn seat(code: &str) -> SeatCode {
        code.parse().unwrap()
    }

    #[test]
    fn places_classes_and_occupancy() {
        let map = SeatMap::builder(2)
            .business(["1A"])
            .occupied(["2B"])
            .build()
            .unwrap();

        assert_eq!(map.get(0, 0), Some(SeatCell::new(SeatClass::Business)));
        assert_eq!(
            map.get(1, 1),
            Some(SeatCell {
                class: SeatClass::Economy,
                occupied: true
            })
        );
        assert_eq!(map.rows(), 2);
        assert_eq!(map.grid().len(), 2);
    }

    #[test]
    fn later_list_wins_on_overlap() {
        let map = SeatMap::builder(1)
            .default_class(SeatClass::Unassigned)
            .economy(["1A"])
            .unavailable(["1A", "1B"])
            .business(["1B", "1C"])
            .first(["1C"])
            .build()
            .unwrap();

        assert_eq!(map.cell(&seat("1A")).unwrap().class, SeatClass::Economy);
        assert_eq!(map.cell(&seat("1B")).unwrap().class, SeatClass::Unavailable);
        assert_eq!(map.cell(&seat("1C")).unwrap().class, SeatClass::First);
        assert_eq!(map.cell(&seat("1D")).unwrap().class, SeatClass::Unassigned);
    }

    #[test]
    fn strict_policy_rejects_bad_codes() {
        let result = SeatMap::builder(3).business(["1A", "4A"]).build();
        assert_eq!(
            result,
            Err(SeatMapError::InvalidSeat {
                list: SeatList::Business,
                source: SeatCodeError::RowOutOfRange {
                    code: "4A".into(),
                    rows: 3
                },
            })
        );

        let result = SeatMap::builder(3).occupied(["2H"]).build();
        assert!(matches!(
            result,
            Err(SeatMapError::InvalidSeat {
                list: SeatList::Occupied,
                ..
            })
        ));
    }

    #[test]
    fn lenient_policy_drops_bad_codes() {
        let map = SeatMap::builder(3)
            .policy(SeatCodePolicy::Lenient)
            .business(["1A", "4A", "zz"])
            .build()
            .unwrap();
        assert_eq!(map.seats_in(SeatClass::Business), vec![seat("1A")]);
    }

    #[test]
    fn row_count_is_bounded() {
        assert_eq!(SeatMap::builder(0).build(), Err(SeatMapError::ZeroRows));
        assert_eq!(
            SeatMap::builder(u32::MAX).build(),
            Err(SeatMapError::TooManyRows(u32::MAX))
        );
        assert_eq!(SeatMap::builder(MAX_ROWS).build().unwrap().rows(), MAX_ROWS);
    }

    #[test]
    fn flight_and_aircraft_defaults_differ() {
        let flight = SeatMap::for_flight(
            &FlightSeatConfig {
                rows: 1,
                first_class_seats: vec!["1A".into()],
                ..FlightSeatConfig::default()
            },
            SeatCodePolicy::Strict,
        )
        .unwrap();
        assert_eq!(flight.cell(&seat("1B")).unwrap().class, SeatClass::Economy);

        let aircraft = SeatMap::for_aircraft(
            &AircraftSeatConfig {
                rows: 1,
                first_class_seats: vec!["1A".into()],
                ..AircraftSeatConfig::default()
            },
            SeatCodePolicy::Strict,
        )
        .unwrap();
        assert_eq!(aircraft.cell(&seat("1B")).unwrap().class, SeatClass::Unassigned);
    }

    #[test]
    fn selection_checks() {
        let map = SeatMap::builder(2)
            .business(["1A", "1B"])
            .unavailable(["2F"])
            .occupied(["1B"])
            .build()
            .unwrap();

        assert!(map.check_selectable(&seat("1A"), SeatClass::Business).is_ok());
        assert_eq!(
            map.check_selectable(&seat("1B"), SeatClass::Business),
            Err(SeatSelectionError::Occupied(seat("1B")))
        );
        assert_eq!(
            map.check_selectable(&seat("2F"), SeatClass::Economy),
            Err(SeatSelectionError::NotForSale(seat("2F")))
        );
        assert_eq!(
            map.check_selectable(&seat("2A"), SeatClass::Business),
            Err(SeatSelectionError::ClassMismatch {
                seat: seat("2A"),
                expected: SeatClass::Business,
                actual: SeatClass::Economy,
            })
        );
        assert_eq!(
            map.check_selectable(&seat("9A"), SeatClass::Economy),
            Err(SeatSelectionError::NoSuchSeat(seat("9A")))
        );
    }

    #[test]
    fn availability_and_counts() {
        let map = SeatMap::builder(2)
            .first(["1A", "1B"])
            .occupied(["1A", "2C"])
            .build()
            .unwrap();

        assert_eq!(map.available_seats(SeatClass::First), vec![seat("1B")]);
        assert_eq!(map.available_seats(SeatClass::Economy).len(), 9);
        let counts = map.class_counts();
        assert_eq!(counts[&SeatClass::First], 2);
        assert_eq!(counts[&SeatClass::Economy], 10);
    }

    #[test]
    fn authoring_edits_produce_new_maps() {
        let original = SeatMap::for_aircraft(
            &AircraftSeatConfig {
                rows: 2,
                business_class_seats: vec!["1A".into()],
                ..AircraftSeatConfig::default()
            },
            SeatCodePolicy::Strict,
        )
        .unwrap();

        let edited = original.with_class(&seat("2F"), SeatClass::Unavailable).unwrap();
        assert_eq!(original.cell(&seat("2F")).unwrap().class, SeatClass::Unassigned);
        assert_eq!(edited.cell(&seat("2F")).unwrap().class, SeatClass::Unavailable);
        assert!(original.with_class(&seat("3A"), SeatClass::First).is_err());

        let exported = edited.to_aircraft_config();
        assert_eq!(exported.rows, 2);
        assert_eq!(exported.business_class_seats, ["1A"]);
        assert_eq!(exported.unavailable_seats, ["2F"]);
        assert!(exported.economy_class_seats.is_empty());

        let rebuilt = SeatMap::for_aircraft(&exported, SeatCodePolicy::Strict).unwrap();
        assert_eq!(rebuilt, edited);
    }
}
