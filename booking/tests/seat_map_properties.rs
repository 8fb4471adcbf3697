//! Property tests for seat code placement and class priority.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use flightdeck_booking::{
    SEATS_PER_ROW, SeatClass, SeatCode, SeatCodePolicy, SeatList, SeatMap, SeatMapError,
};
use proptest::prelude::*;

const LETTERS: [char; SEATS_PER_ROW] = ['A', 'B', 'C', 'D', 'E', 'F'];

fn code_in(rows: u32) -> impl Strategy<Value = String> {
    (1..=rows, 0..SEATS_PER_ROW).prop_map(|(row, column)| format!("{row}{}", LETTERS[column]))
}

fn codes_in(rows: u32) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(code_in(rows), 0..12)
}

proptest! {
    #[test]
    fn valid_codes_land_on_their_cell(row in 1u32..500, column in 0usize..SEATS_PER_ROW) {
        let code = format!("{row}{}", LETTERS[column]);
        let seat: SeatCode = code.parse().unwrap();

        prop_assert_eq!(seat.row(), (row - 1) as usize);
        prop_assert_eq!(seat.column(), column);
        prop_assert_eq!(seat.to_string(), code);
    }

    #[test]
    fn later_lists_win(
        business in codes_in(6),
        first in codes_in(6),
        unavailable in codes_in(6),
        economy in codes_in(6),
        occupied in codes_in(6),
    ) {
        let map = SeatMap::builder(6)
            .default_class(SeatClass::Unassigned)
            .economy(&economy)
            .occupied(&occupied)
            .unavailable(&unavailable)
            .first(&first)
            .business(&business)
            .build()
            .unwrap();

        for (seat, cell) in map.iter() {
            let code = seat.to_string();
            let expected = [
                (&economy, SeatClass::Economy),
                (&unavailable, SeatClass::Unavailable),
                (&first, SeatClass::First),
                (&business, SeatClass::Business),
            ]
            .into_iter()
            .find(|(list, _)| list.contains(&code))
            .map_or(SeatClass::Unassigned, |(_, class)| class);

            prop_assert_eq!(cell.class, expected, "seat {}", code);
            prop_assert_eq!(cell.occupied, occupied.contains(&code), "seat {}", code);
        }
    }

    #[test]
    fn exported_layouts_rebuild_identically(
        business in codes_in(5),
        first in codes_in(5),
        unavailable in codes_in(5),
    ) {
        let map = SeatMap::builder(5)
            .default_class(SeatClass::Unassigned)
            .business(&business)
            .first(&first)
            .unavailable(&unavailable)
            .build()
            .unwrap();

        let rebuilt = SeatMap::for_aircraft(&map.to_aircraft_config(), SeatCodePolicy::Strict).unwrap();
        prop_assert_eq!(rebuilt, map);
    }

    #[test]
    fn rows_beyond_the_aircraft_are_rejected(rows in 1u32..40, extra in 1u32..10, column in 0usize..SEATS_PER_ROW) {
        let code = format!("{}{}", rows + extra, LETTERS[column]);
        let strict = SeatMap::builder(rows).occupied([&code]).build();
        let is_invalid_occupied = matches!(
            strict,
            Err(SeatMapError::InvalidSeat { list: SeatList::Occupied, .. })
        );
        prop_assert!(is_invalid_occupied);

        let lenient = SeatMap::builder(rows)
            .policy(SeatCodePolicy::Lenient)
            .occupied([&code])
            .build()
            .unwrap();
        prop_assert!(lenient.iter().all(|(_, cell)| !cell.occupied));
    }
}
