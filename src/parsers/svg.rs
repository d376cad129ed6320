//! Reads time series back out of SVG line charts.
//!
//! Charts draw their data as a `<path>` in pixel space, with the axis tick
//! labels rendered as separate `<text>` elements. The y-axis labels give
//! the pixel-to-value calibration, the x-axis labels give the series
//! labels, and the path vertices give the pixel positions to convert.

use crate::error::ExtractionError;
use crate::parsers::selector::{compile, select_all, select_one, text_of};
use crate::results::TimeSeriesPoint;
use crate::utils::round2;
use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

/// A y-axis tick: where it is drawn and the value it stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub pixel: f64,
    pub value: f64,
}

/// Linear pixel-to-value mapping between two calibration extremes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    top: CalibrationPoint,
    bottom: CalibrationPoint,
}

impl AxisMapping {
    /// Builds the mapping from the topmost and bottommost calibration points.
    ///
    /// Labels between the extremes are ignored; the axis is assumed linear.
    pub fn from_points(mut points: Vec<CalibrationPoint>) -> Result<Self, ExtractionError> {
        if points.len() < 2 {
            return Err(ExtractionError::InsufficientCalibration {
                found: points.len(),
            });
        }

        points.sort_by(|a, b| a.pixel.total_cmp(&b.pixel));
        let top = points[0];
        let bottom = points[points.len() - 1];
        if top.pixel == bottom.pixel {
            return Err(ExtractionError::DegenerateAxis { pixel: top.pixel });
        }

        Ok(Self { top, bottom })
    }

    /// Value at a pixel row, rounded to two decimals
    pub fn value_at(&self, pixel: f64) -> f64 {
        let ratio = (pixel - self.top.pixel) / (self.bottom.pixel - self.top.pixel);
        round2(self.top.value + ratio * (self.bottom.value - self.top.value))
    }
}

fn path_vertex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[ML]\s*(-?\d*\.?\d+(?:[eE][-+]?\d+)?)[\s,]+(-?\d*\.?\d+(?:[eE][-+]?\d+)?)")
            .expect("static pattern")
    })
}

fn translate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"translate\(\s*(-?\d*\.?\d+)(?:[\s,]+(-?\d*\.?\d+))?\s*\)")
            .expect("static pattern")
    })
}

/// Y coordinates of every move-to / line-to vertex of a path's `d` data
pub fn path_y_coordinates(d: &str) -> Vec<f64> {
    path_vertex()
        .captures_iter(d)
        .filter_map(|caps| caps[2].parse().ok())
        .collect()
}

/// Vertical offset of a `translate(x[, y])` transform, if there is one
pub fn translate_y(transform: &str) -> Option<f64> {
    let caps = translate().captures(transform)?;
    match caps.get(2) {
        Some(y) => y.as_str().parse().ok(),
        None => Some(0.0),
    }
}

/// Vertical offset applied by the nearest enclosing `<g>` with a transform
fn group_offset(path: ElementRef<'_>) -> f64 {
    path.ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "g")
        .find_map(|g| g.value().attr("transform"))
        .and_then(translate_y)
        .unwrap_or(0.0)
}

/// Parses y-axis label elements into calibration points.
///
/// Labels whose position or text is not numeric are skipped.
pub fn calibration_points(labels: &[ElementRef<'_>]) -> Vec<CalibrationPoint> {
    labels
        .iter()
        .filter_map(|label| {
            let pixel: f64 = label.value().attr("y")?.trim().parse().ok()?;
            let value: f64 = text_of(*label).replace(',', "").trim().parse().ok()?;
            if !value.is_finite() || !pixel.is_finite() {
                ::log::trace!("Skipping non-finite axis label {:?}", text_of(*label));
                return None;
            }
            Some(CalibrationPoint { pixel, value })
        })
        .collect()
}

/// CSS selectors locating one line chart; all but `container` are
/// scoped to the container
pub struct LineChart<'s> {
    pub container: &'s str,
    pub x_labels: &'s str,
    pub path: &'s str,
    pub y_labels: &'s str,
}

impl LineChart<'_> {
    /// Reconstructs the chart's series as `(x label, value)` points,
    /// left to right.
    pub fn read(&self, root: ElementRef<'_>) -> Result<Vec<TimeSeriesPoint>, ExtractionError> {
        let container = select_one(root, &compile(self.container)?)
            .ok_or_else(|| not_found(self.container))?;

        let y_labels = select_all(container, &compile(self.y_labels)?);
        let points = calibration_points(&y_labels);
        ::log::trace!(
            "{} of {} y-axis labels usable for calibration",
            points.len(),
            y_labels.len()
        );
        let mapping = AxisMapping::from_points(points)?;

        let path = select_one(container, &compile(self.path)?)
            .ok_or_else(|| not_found(self.path))?;
        let d = path
            .value()
            .attr("d")
            .ok_or_else(|| ExtractionError::MissingAttribute {
                element: path.value().name().to_string(),
                attribute: "d".to_string(),
            })?;
        let offset = group_offset(path);
        let values = path_y_coordinates(d)
            .into_iter()
            .map(|y| mapping.value_at(y + offset))
            .collect::<Vec<_>>();

        let labels = select_all(container, &compile(self.x_labels)?)
            .into_iter()
            .map(text_of)
            .collect::<Vec<_>>();

        if labels.len() != values.len() {
            return Err(ExtractionError::LengthMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }

        Ok(labels
            .into_iter()
            .zip(values)
            .map(|(label, value)| TimeSeriesPoint { label, value })
            .collect())
    }
}

fn not_found(selector: &str) -> ExtractionError {
    ExtractionError::NotFound {
        selector: selector.to_string(),
    }
}
