//! Pure raster layout math for the native encoder.
//!
//! Mirrors what ImageMagick does with `-crop x<H> +append [-crop <geometry>]`:
//! the raster is cut into strips of `H` rows, the strips are laid side by side
//! top-aligned on a background canvas, and the optional crop is taken from
//! the result (clamped to the canvas).

use super::params::CropGeometry;
use crate::types::Row;

/// Number of strips of `height` rows needed for `rows` rows. Never zero.
pub fn strip_count(rows: usize, height: usize) -> usize {
    rows.div_ceil(height.max(1)).max(1)
}

/// Lay `rows` out as side-by-side strips of `height` rows each.
///
/// The canvas is `cols * strips` wide and `min(height, rows)` tall; the
/// short last strip is filled with `background` below its final row.
pub fn tile(rows: &[Row], cols: usize, height: usize, background: &str) -> Vec<Row> {
    let height = height.max(1);
    let strips = strip_count(rows.len(), height);
    let canvas_rows = height.min(rows.len());
    (0..canvas_rows)
        .map(|y| {
            let mut line = Vec::with_capacity(cols * strips);
            for strip in 0..strips {
                match rows.get(strip * height + y) {
                    Some(row) => line.extend(row.iter().take(cols).cloned()),
                    None => line.resize(line.len() + cols, background.to_string()),
                }
            }
            line
        })
        .collect()
}

/// The part of `rows` inside `geometry`, clamped to the raster's bounds.
pub fn crop(rows: &[Row], geometry: CropGeometry) -> Vec<Row> {
    let (x, y) = (geometry.x as usize, geometry.y as usize);
    rows.iter()
        .skip(y)
        .take(geometry.height as usize)
        .map(|row| {
            row.iter()
                .skip(x)
                .take(geometry.width as usize)
                .cloned()
                .collect::<Row>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(labels: &[&str], cols: usize) -> Vec<Row> {
        labels
            .iter()
            .map(|l| vec![l.to_string(); cols])
            .collect()
    }

    // =========================================================================
    // Tiling
    // =========================================================================

    #[test]
    fn strip_count_rounds_up() {
        assert_eq!(strip_count(10, 4), 3);
        assert_eq!(strip_count(8, 4), 2);
        assert_eq!(strip_count(3, 4), 1);
        assert_eq!(strip_count(0, 4), 1);
    }

    #[test]
    fn tile_lays_strips_side_by_side() {
        let rows = raster(&["a", "b", "c", "d", "e"], 2);
        let tiled = tile(&rows, 2, 2, "bg");
        assert_eq!(
            tiled,
            vec![
                vec!["a", "a", "c", "c", "e", "e"],
                vec!["b", "b", "d", "d", "bg", "bg"],
            ]
        );
    }

    #[test]
    fn tile_taller_than_raster_keeps_raster() {
        let rows = raster(&["a", "b"], 3);
        assert_eq!(tile(&rows, 3, 10, "bg"), rows);
    }

    // =========================================================================
    // Crop
    // =========================================================================

    #[test]
    fn crop_takes_window() {
        let rows = vec![
            vec!["00", "01", "02"],
            vec!["10", "11", "12"],
            vec!["20", "21", "22"],
        ]
        .into_iter()
        .map(|r| r.into_iter().map(String::from).collect())
        .collect::<Vec<Row>>();
        let geometry = CropGeometry::parse("2x2+1+1").unwrap();
        assert_eq!(crop(&rows, geometry), vec![vec!["11", "12"], vec!["21", "22"]]);
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let rows = raster(&["a", "b"], 2);
        let geometry = CropGeometry::parse("10x10+1+1").unwrap();
        assert_eq!(crop(&rows, geometry), vec![vec!["b"]]);
    }

    #[test]
    fn crop_outside_is_empty() {
        let rows = raster(&["a"], 2);
        let geometry = CropGeometry::parse("1x1+5+0").unwrap();
        assert!(crop(&rows, geometry).is_empty());
    }
}
