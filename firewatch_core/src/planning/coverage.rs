// firewatch_core/src/planning/coverage.rs

use nalgebra::{Vector2, Vector3};

use crate::config::CoverageConfig;
use crate::error::{CoreError, CoreResult};

/// Fraction of a strip's width left free on each side of the patrol rows.
const STRIP_MARGIN: f64 = 0.1;

/// Splits the square area into one vertical strip per agent and sweeps each
/// strip in a boustrophedon pattern. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoveragePlanner;

impl CoveragePlanner {
    /// Ordered horizontal waypoints `(x, y)` for agent `index` out of `count`.
    ///
    /// Rows are `row_spacing` apart starting at `y = 0`; even rows run
    /// left-to-right, odd rows right-to-left.
    pub fn sector(
        index: usize,
        count: usize,
        config: &CoverageConfig,
    ) -> CoreResult<Vec<Vector2<f64>>> {
        check_index(index, count)?;
        config.validate()?;

        let strip_width = config.area_size / count as f64;
        let strip_origin = index as f64 * strip_width;
        let x_start = strip_origin + strip_width * STRIP_MARGIN;
        let x_end = strip_origin + strip_width * (1.0 - STRIP_MARGIN);

        let n_rows = ((config.area_size / config.row_spacing) as usize).max(1);
        let mut waypoints = Vec::with_capacity(n_rows * 2);
        for row in 0..n_rows {
            let y = row as f64 * config.row_spacing;
            let (first, second) = if row % 2 == 0 {
                (x_start, x_end)
            } else {
                (x_end, x_start)
            };
            waypoints.push(Vector2::new(first, y));
            waypoints.push(Vector2::new(second, y));
        }
        Ok(waypoints)
    }

    /// Ground starting position of agent `index`: centred in its strip at the
    /// near edge of the area.
    pub fn start_position(index: usize, count: usize, area_size: f64) -> CoreResult<Vector3<f64>> {
        check_index(index, count)?;
        let spacing = area_size / count as f64;
        Ok(Vector3::new(
            index as f64 * spacing + spacing / 2.0,
            0.0,
            0.0,
        ))
    }
}

fn check_index(index: usize, count: usize) -> CoreResult<()> {
    if count == 0 || index >= count {
        return Err(CoreError::AgentOutOfRange { index, count });
    }
    Ok(())
}
