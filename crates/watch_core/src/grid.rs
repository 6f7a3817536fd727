//! World coordinate to map grid conversion.

/// Side length of one grid cell in world units. This is the game's fixed grid
/// pitch and does not depend on the map size.
pub const GRID_PITCH: f64 = 146.28571428571428;

const ROW_OFFSET: i64 = 7;

/// Converts world coordinates into a grid label such as `K12`.
///
/// Columns are lettered left to right (`A`..`Z`, `AA`, `AB`, ...); rows are
/// numbered from the top edge. `map_size` must be positive.
///
/// # Examples
///
/// ```
/// use watch_core::grid::grid_label;
///
/// assert_eq!(grid_label(0.0, 0.0, 4000.0), "A34");
/// ```
pub fn grid_label(x: f64, y: f64, map_size: f64) -> String {
    let cells = (map_size / GRID_PITCH).trunc();
    let column = (x / GRID_PITCH).trunc().max(0.0) as u64;
    let row = (cells - y / GRID_PITCH).trunc() as i64 + ROW_OFFSET;

    format!("{}{}", column_letters(column), row)
}

fn column_letters(mut index: u64) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}
