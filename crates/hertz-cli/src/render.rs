//! Pseudocolour rendering of power maps.
//!
//! Each frame is drawn as a raster over the physical x and z axes with a
//! "hot" colour map (black, red, yellow, white) and a colour bar on the
//! right-hand side.

use std::path::Path;

use hertz_core::sweep::SweepFrame;
use plotters::prelude::*;

/// Mapping from power to colour-map coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    Linear,
    Log10,
}

impl ColorScale {
    fn apply(self, value: f64) -> f64 {
        match self {
            ColorScale::Linear => value,
            ColorScale::Log10 => value.log10(),
        }
    }
}

/// Image layout for a single rendered frame.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub scale: ColorScale,
    pub title: String,
}

const COLORBAR_WIDTH: i32 = 130;

// Breakpoints of the piecewise-linear "hot" map.
const HOT_RED_END: f64 = 0.365079;
const HOT_GREEN_END: f64 = 0.746032;
const HOT_RED_START: f64 = 0.0416;

/// Hot colour map: black through red and yellow to white, `x` in [0, 1].
pub fn hot(x: f64) -> RGBColor {
    let x = if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 };

    let r = if x < HOT_RED_END {
        HOT_RED_START + (1.0 - HOT_RED_START) * x / HOT_RED_END
    } else {
        1.0
    };
    let g = if x < HOT_RED_END {
        0.0
    } else if x < HOT_GREEN_END {
        (x - HOT_RED_END) / (HOT_GREEN_END - HOT_RED_END)
    } else {
        1.0
    };
    let b = if x < HOT_GREEN_END {
        0.0
    } else {
        (x - HOT_GREEN_END) / (1.0 - HOT_GREEN_END)
    };

    RGBColor(to_channel(r), to_channel(g), to_channel(b))
}

fn to_channel(v: f64) -> u8 {
    (255.0 * v).round().clamp(0.0, 255.0) as u8
}

/// Position of `value` within `[lo, hi]`, clamped to [0, 1].
pub fn normalise(value: f64, lo: f64, hi: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Colour range of the scaled power values, ignoring non-finite entries.
///
/// A degenerate range is widened to unit width so the colour bar stays drawable.
pub fn scaled_range(frame: &SweepFrame, scale: ColorScale) -> (f64, f64) {
    let (lo, hi) = frame
        .power
        .iter()
        .map(|&p| scale.apply(p))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if hi <= lo {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}

fn cell_width(axis: &[f64]) -> f64 {
    if axis.len() > 1 {
        (axis[axis.len() - 1] - axis[0]) / (axis.len() - 1) as f64
    } else {
        1.0
    }
}

/// Draw the power grid of `frame` to a PNG file.
pub fn render_power_map(
    frame: &SweepFrame,
    path: &Path,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let (nx, nz) = frame.power.dim();
    if nx == 0 || nz == 0 {
        return Ok(());
    }

    let (lo, hi) = scaled_range(frame, options.scale);
    let dx = cell_width(&frame.x);
    let dz = cell_width(&frame.z);
    let x_range = (frame.x[0] - dx / 2.0)..(frame.x[nx - 1] + dx / 2.0);
    let z_range = (frame.z[0] - dz / 2.0)..(frame.z[nz - 1] + dz / 2.0);

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let split = (options.width as i32 - COLORBAR_WIDTH).max(1);
    let (map_area, bar_area) = root.split_horizontally(split);

    let mut chart = ChartBuilder::on(&map_area)
        .caption(&options.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, z_range)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x / m")
        .y_desc("z / m")
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series((0..nx).flat_map(|i| {
        (0..nz).map(move |j| {
            let (x, z) = (frame.x[i], frame.z[j]);
            let v = normalise(options.scale.apply(frame.power[[i, j]]), lo, hi);
            Rectangle::new(
                [(x - dx / 2.0, z - dz / 2.0), (x + dx / 2.0, z + dz / 2.0)],
                hot(v).filled(),
            )
        })
    }))?;

    // Colour bar
    let steps = 256;
    let step = (hi - lo) / steps as f64;
    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(44)
        .margin_bottom(50)
        .margin_right(10)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_label_style(("sans-serif", 14))
        .y_label_formatter(&|v: &f64| format!("{:.1e}", v))
        .draw()?;

    bar.draw_series((0..steps).map(|s| {
        let v0 = lo + step * s as f64;
        Rectangle::new(
            [(0.0, v0), (1.0, v0 + step)],
            hot((s as f64 + 0.5) / steps as f64).filled(),
        )
    }))?;

    root.present()?;
    log::info!("Image saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn frame_with(power: Array2<f64>) -> SweepFrame {
        let (nx, nz) = power.dim();
        SweepFrame {
            index: 0,
            time: 0.0,
            x: (0..nx).map(|i| i as f64).collect(),
            z: (0..nz).map(|j| j as f64).collect(),
            phase: Array2::zeros((nx, nz)),
            power,
        }
    }

    #[test]
    fn test_hot_endpoints() {
        assert_eq!(hot(0.0), RGBColor(11, 0, 0));
        assert_eq!(hot(1.0), RGBColor(255, 255, 255));
        assert_eq!(hot(HOT_RED_END), RGBColor(255, 0, 0));
        assert_eq!(hot(HOT_GREEN_END), RGBColor(255, 255, 0));
    }

    #[test]
    fn test_hot_monotonic_brightness() {
        let mut prev = 0u32;
        for k in 0..=100 {
            let RGBColor(r, g, b) = hot(k as f64 / 100.0);
            let sum = r as u32 + g as u32 + b as u32;
            assert!(sum >= prev, "brightness dropped at {k}");
            prev = sum;
        }
    }

    #[test]
    fn test_hot_clamps_out_of_range() {
        assert_eq!(hot(-3.0), hot(0.0));
        assert_eq!(hot(7.0), hot(1.0));
        assert_eq!(hot(f64::NAN), hot(0.0));
    }

    #[test]
    fn test_normalise() {
        assert_eq!(normalise(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalise(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(normalise(11.0, 0.0, 10.0), 1.0);
        assert_eq!(normalise(3.0, 2.0, 2.0), 0.0);
        assert_eq!(normalise(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_scaled_range_linear_and_log() {
        let frame = frame_with(Array2::from_shape_vec((2, 2), vec![1e-4, 1e-2, 1.0, 0.0]).unwrap());
        assert_eq!(scaled_range(&frame, ColorScale::Linear), (0.0, 1.0));

        // log10(0) is -inf and is excluded from the range
        let (lo, hi) = scaled_range(&frame, ColorScale::Log10);
        approx::assert_relative_eq!(lo, -4.0, max_relative = 1e-12);
        assert_eq!(hi, 0.0);
    }

    #[test]
    fn test_scaled_range_degenerate() {
        let frame = frame_with(Array2::from_elem((3, 2), 2.5));
        assert_eq!(scaled_range(&frame, ColorScale::Linear), (2.5, 3.5));

        let zeros = frame_with(Array2::zeros((3, 2)));
        assert_eq!(scaled_range(&zeros, ColorScale::Log10), (0.0, 1.0));
    }

    #[test]
    fn test_cell_width() {
        assert_eq!(cell_width(&[-1.0, 0.0, 1.0]), 1.0);
        assert_eq!(cell_width(&[4.0]), 1.0);
    }
}
