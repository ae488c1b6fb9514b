//! The maze geometry: walls, floor, spawns, and the initial dot layout.
//!
//! The grid is fixed — 21 rows by 19 columns — and shared by every
//! session. Coordinates are `(x, y)` with y growing downward; anything
//! outside the grid counts as wall.

use std::collections::BTreeSet;

pub const MAZE_ROWS: i32 = 21;
pub const MAZE_COLS: i32 = 19;

/// Both players respawn here after losing a life.
pub const PLAYER_SPAWN: (i32, i32) = (9, 10);

/// `#` = wall, `.` = floor. The central block (rows 8–10) is the ghost
/// house and the player spawn corridor.
pub const MAZE_LAYOUT: [&str; MAZE_ROWS as usize] = [
    "###################",
    "#.......#.#.......#",
    "#.##.##.#.#.##.##.#",
    "#.#.............#.#",
    "#.#.##.#####.##.#.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "###.#.##.#.##.#.###",
    "###.#.#.....#.#.###",
    "###...#.....#...###",
    "###.............###",
    "###...#.....#...###",
    "###.#.#.....#.#.###",
    "###.#.##.#.##.#.###",
    "#.##.#.#####.#.##.#",
    "#.................#",
    "#.#.##.#####.##.#.#",
    "#.#.............#.#",
    "#.##.##.#.#.##.##.#",
    "#.......#.#.......#",
    "###################",
];

/// Returns `true` for wall cells. Out-of-bounds coordinates are walls,
/// so callers never need a separate bounds check.
pub fn is_wall(x: i32, y: i32) -> bool {
    if x < 0 || x >= MAZE_COLS || y < 0 || y >= MAZE_ROWS {
        return true;
    }
    MAZE_LAYOUT[y as usize].as_bytes()[x as usize] == b'#'
}

/// Floor cells that never receive a dot: the player spawn and the
/// ghost house (columns 7–11 of rows 8–9).
fn is_dotless(x: i32, y: i32) -> bool {
    (x, y) == PLAYER_SPAWN || ((8..=9).contains(&y) && (7..=11).contains(&x))
}

/// Builds the initial dot set: every floor cell except the excluded ones.
///
/// A `BTreeSet` keeps iteration order deterministic, which the snapshot
/// (and the bit-determinism guarantee) relies on.
pub fn seed_dots() -> BTreeSet<(i32, i32)> {
    let mut dots = BTreeSet::new();
    for y in 0..MAZE_ROWS {
        for x in 0..MAZE_COLS {
            if !is_wall(x, y) && !is_dotless(x, y) {
                dots.insert((x, y));
            }
        }
    }
    dots
}
