//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - a quick visual check of the recovery curves before opening the sheet
//! - deterministic output (helpful for golden tests)
//!
//! One curve per role: the cross-sample mean when there is one, otherwise
//! the single sample's column. Markers are `c` (cp), `l` (long), `t` (lat).

use crate::domain::Channel;
use crate::report::compose::{RolePlot, plot_time_axis};

/// A plotted curve: marker plus `(time, value)` points.
struct Curve {
    marker: char,
    points: Vec<(f64, f64)>,
}

/// Render the recovery curves of all roles.
pub fn render_recovery_plot(roles: &[RolePlot], pace: u32, width: usize, height: usize) -> String {
    let curves: Vec<Curve> = roles.iter().map(|r| role_curve(r, pace)).collect();
    render_plot(&curves, width, height)
}

fn role_curve(role: &RolePlot, pace: u32) -> Curve {
    let values = match &role.aggregate {
        Some(agg) => agg.means(),
        None => role
            .aligned
            .columns
            .first()
            .map(|c| c.cells.clone())
            .unwrap_or_default(),
    };
    let time = plot_time_axis(pace, values.len());
    let points = time
        .into_iter()
        .zip(values)
        .filter_map(|(t, v)| Some((t?, v?)))
        .filter(|(t, v)| t.is_finite() && v.is_finite())
        .collect();
    Curve {
        marker: role.channel.plot_char(),
        points,
    }
}

fn render_plot(curves: &[Curve], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = range(curves.iter().flat_map(|c| c.points.iter().map(|p| p.0))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(curves.iter().flat_map(|c| c.points.iter().map(|p| p.1))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for curve in curves {
        draw_curve(&mut grid, curve, t_min, t_max, y_min, y_max);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: time=[{t_min:.1}, {t_max:.1}] s | y=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let legend: Vec<String> = curves
        .iter()
        .map(|c| format!("{}={}", c.marker, legend_label(c.marker)))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" ")));

    out
}

fn legend_label(marker: char) -> &'static str {
    Channel::ALL
        .into_iter()
        .find(|c| c.plot_char() == marker)
        .map_or("?", Channel::label)
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &Curve, t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in &curve.points {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '.');
        }
        grid[yy][x] = curve.marker;
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
