//! Running-average latency chart (feature `chart`).
//!
//! Renders the cumulative mean latency series to an SVG file with
//! `plotters`. The simulation never depends on this module.

use std::fmt::Display;
use std::path::Path;

use plotters::prelude::*;

use crate::error::{Error, Result};

/// Layout of the rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series_label: String,
    /// Size in pixels `(width, height)`.
    pub size: (u32, u32),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Softmax load balancer: average latency".to_string(),
            x_label: "Requests (time)".to_string(),
            y_label: "Average latency".to_string(),
            series_label: "Softmax average latency".to_string(),
            size: (1000, 600),
        }
    }
}

impl ChartConfig {
    /// Default layout with the temperature in the title.
    pub fn for_temperature(temperature: f64) -> Self {
        Self {
            title: format!("Softmax load balancer: average latency (temperature={temperature})"),
            ..Self::default()
        }
    }
}

fn chart_err<E: Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

/// Y-axis range covering `values` with a little headroom.
fn y_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    ((lo - pad).max(0.0), hi + pad)
}

/// Draw `averages` (one point per step) as a line chart at `path`.
///
/// An empty series produces an empty chart frame.
pub fn render_average_latency(path: &Path, averages: &[f64], cfg: &ChartConfig) -> Result<()> {
    let root = SVGBackend::new(path, cfg.size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let x_max = averages.len().max(1);
    let (y_lo, y_hi) = y_range(averages);

    let mut chart = ChartBuilder::on(&root)
        .caption(&cfg.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..x_max, y_lo..y_hi)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(cfg.x_label.as_str())
        .y_desc(cfg.y_label.as_str())
        .light_line_style(&BLACK.mix(0.08))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(
            averages.iter().copied().enumerate(),
            BLUE.stroke_width(2),
        ))
        .map_err(chart_err)?
        .label(cfg.series_label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_range_pads_and_stays_non_negative() {
        assert_eq!(y_range(&[]), (0.0, 1.0));
        let (lo, hi) = y_range(&[50.0, 150.0]);
        assert_eq!((lo, hi), (45.0, 155.0));
        let (lo, hi) = y_range(&[0.5, 0.5]);
        assert_eq!(lo, 0.0);
        assert!(hi > 0.5);
    }

    #[test]
    fn writes_an_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avg.svg");
        let series: Vec<f64> = (1..=200).map(|i| 60.0 + 40.0 / f64::from(i)).collect();
        render_average_latency(&path, &series, &ChartConfig::for_temperature(25.0)).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("temperature=25"));
    }

    #[test]
    fn empty_series_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        render_average_latency(&path, &[], &ChartConfig::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("avg.svg");
        let err = render_average_latency(&path, &[1.0, 2.0], &ChartConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Chart(_)));
    }
}
