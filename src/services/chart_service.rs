use std::io::Cursor;
use std::ops::Range;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::coord::Shift;
use plotters::series::DashedLineSeries;
use thiserror::Error;

use crate::models::RenderedChart;
use crate::utils::errors::AppError;

/// Chart drawing failures
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to encode chart as PNG: {0}")]
    Encode(String),
}

impl From<ChartError> for AppError {
    fn from(err: ChartError) -> Self {
        AppError::Render(err.to_string())
    }
}

/// How the series line is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Solid blue, no legend
    History,
    /// Dashed red with a "Predicted Price" legend entry
    Forecast,
}

const HISTORY_COLOR: RGBColor = RGBColor(31, 119, 180);
const FORECAST_COLOR: RGBColor = RED;
pub const FORECAST_LEGEND: &str = "Predicted Price";

const DATE_FORMAT: &str = "%Y-%m-%d";
const X_LABEL_COUNT: usize = 10;
/// Counter-clockwise, text ending at its tick
const X_LABEL_ANGLE: f64 = 45.0;
const X_LABEL_GAP: i32 = 8;
const LABEL_PADDING: i32 = 2;

/// Renders date/price line charts to PNG.
///
/// Holds only the output size; every call draws into its own freshly
/// allocated pixel buffer, so renders never share a drawing surface.
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render_history(
        &self,
        points: &[(NaiveDate, f64)],
        title: &str,
        x_label: &str,
        y_label: &str,
    ) -> Result<RenderedChart, ChartError> {
        self.render(points, title, x_label, y_label, LineStyle::History)
    }

    pub fn render_forecast(
        &self,
        points: &[(NaiveDate, f64)],
        title: &str,
        x_label: &str,
        y_label: &str,
    ) -> Result<RenderedChart, ChartError> {
        self.render(points, title, x_label, y_label, LineStyle::Forecast)
    }

    /// Draw a single-axes line chart and return it as PNG bytes
    pub fn render(
        &self,
        points: &[(NaiveDate, f64)],
        title: &str,
        x_label: &str,
        y_label: &str,
        style: LineStyle,
    ) -> Result<RenderedChart, ChartError> {
        let mut buffer = vec![0u8; (self.width as usize) * (self.height as usize) * 3];

        {
            let backend = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height));
            let root = backend.into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| ChartError::Draw(format!("Failed to fill canvas: {}", e)))?;

            let (x_range, y_range) = axis_ranges(points);

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 24.0).into_font())
                .margin(15)
                .x_label_area_size(90)
                .y_label_area_size(70)
                .build_cartesian_2d(x_range, y_range)
                .map_err(|e| ChartError::Draw(format!("Failed to build chart: {}", e)))?;

            chart
                .configure_mesh()
                .x_desc(x_label)
                .y_desc(y_label)
                .x_labels(X_LABEL_COUNT)
                .y_labels(10)
                // Date labels are drawn rotated below
                .x_label_formatter(&|_: &NaiveDate| String::new())
                .draw()
                .map_err(|e| ChartError::Draw(format!("Failed to draw mesh: {}", e)))?;

            let y_floor = chart.y_range().start;
            let label_style = TextStyle::from(("sans-serif", 12.0).into_font()).color(&BLACK);
            for date in chart.as_coord_spec().x_spec().key_points(X_LABEL_COUNT) {
                let (x, y) = chart.backend_coord(&(date, y_floor));
                let raster =
                    LabelRaster::render(&root, &date.format(DATE_FORMAT).to_string(), &label_style)?;
                for ((dx, dy), color) in raster.rotated(X_LABEL_ANGLE) {
                    root.draw_pixel((x + dx, y + X_LABEL_GAP + dy), &color)
                        .map_err(|e| ChartError::Draw(format!("Failed to draw label: {}", e)))?;
                }
            }

            match style {
                LineStyle::History => {
                    chart
                        .draw_series(LineSeries::new(
                            points.iter().copied(),
                            HISTORY_COLOR.stroke_width(2),
                        ))
                        .map_err(|e| ChartError::Draw(format!("Failed to draw line: {}", e)))?;
                }
                LineStyle::Forecast => {
                    chart
                        .draw_series(DashedLineSeries::new(
                            points.iter().copied(),
                            10,
                            6,
                            FORECAST_COLOR.stroke_width(2),
                        ))
                        .map_err(|e| ChartError::Draw(format!("Failed to draw line: {}", e)))?
                        .label(FORECAST_LEGEND)
                        .legend(|(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], FORECAST_COLOR.stroke_width(2))
                        });
                }
            }

            // A lone point has no segment to draw
            if points.len() == 1 {
                let color = match style {
                    LineStyle::History => HISTORY_COLOR,
                    LineStyle::Forecast => FORECAST_COLOR,
                };
                chart
                    .draw_series(points.iter().map(|p| Circle::new(*p, 3, color.filled())))
                    .map_err(|e| ChartError::Draw(format!("Failed to draw point: {}", e)))?;
            }

            if style == LineStyle::Forecast {
                chart
                    .configure_series_labels()
                    .background_style(WHITE.mix(0.85))
                    .border_style(&BLACK)
                    .draw()
                    .map_err(|e| ChartError::Draw(format!("Failed to draw legend: {}", e)))?;
            }

            root.present()
                .map_err(|e| ChartError::Draw(format!("Failed to render chart: {}", e)))?;
        }

        let png = encode_png(buffer, self.width, self.height)?;
        tracing::debug!("Rendered chart '{}' ({} points, {} bytes)", title, points.len(), png.len());

        Ok(RenderedChart {
            title: title.to_string(),
            points: points.to_vec(),
            png,
        })
    }
}

/// Auto-ranged axes with a little headroom. Degenerate ranges are widened
/// so plotters always gets a non-empty coordinate space.
fn axis_ranges(points: &[(NaiveDate, f64)]) -> (Range<NaiveDate>, Range<f64>) {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => {
            let today = chrono::Utc::now().date_naive();
            return (today - Duration::days(1)..today, 0.0..1.0);
        }
    };

    let x_range = if first < last {
        first..last
    } else {
        first - Duration::days(1)..last + Duration::days(1)
    };

    let min_price = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_price = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let spread = max_price - min_price;
    let padding = if spread > 0.0 {
        spread * 0.05
    } else {
        (max_price.abs() * 0.05).max(1.0)
    };

    (x_range, (min_price - padding)..(max_price + padding))
}

/// One label drawn horizontally into its own small RGB buffer
struct LabelRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl LabelRaster {
    /// Rasterize `text`, sized with the metrics of the target area
    fn render<DB: DrawingBackend>(
        target: &DrawingArea<DB, Shift>,
        text: &str,
        style: &TextStyle,
    ) -> Result<Self, ChartError> {
        let (text_width, text_height) = target
            .estimate_text_size(text, style)
            .map_err(|e| ChartError::Draw(format!("Failed to measure label: {}", e)))?;
        let width = text_width + 2 * LABEL_PADDING as u32;
        let height = text_height + 2 * LABEL_PADDING as u32;

        let mut pixels = vec![255u8; (width as usize) * (height as usize) * 3];
        {
            let area = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            area.draw_text(text, style, (LABEL_PADDING, LABEL_PADDING))
                .map_err(|e| ChartError::Draw(format!("Failed to draw label: {}", e)))?;
            area.present()
                .map_err(|e| ChartError::Draw(format!("Failed to draw label: {}", e)))?;
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Non-background color at `(u, v)`
    fn ink_at(&self, u: i64, v: i64) -> Option<RGBColor> {
        if u < 0 || v < 0 || u >= self.width as i64 || v >= self.height as i64 {
            return None;
        }
        let idx = ((v as usize) * (self.width as usize) + u as usize) * 3;
        let [r, g, b] = [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]];
        if r >= 250 && g >= 250 && b >= 250 {
            None
        } else {
            Some(RGBColor(r, g, b))
        }
    }

    /// Ink pixels after rotating `degrees` counter-clockwise about the
    /// middle of the right edge, as offsets from that point.
    ///
    /// Walks the rotated bounding box and samples the source by inverse
    /// rotation, so the result has no holes.
    fn rotated(&self, degrees: f64) -> Vec<((i32, i32), RGBColor)> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f64, self.height as f64);

        // Source (a, b) relative to the anchor maps to (cos·a + sin·b, cos·b − sin·a)
        let corners = [(-w, -h / 2.0), (0.0, -h / 2.0), (-w, h / 2.0), (0.0, h / 2.0)]
            .map(|(a, b)| (cos * a + sin * b, cos * b - sin * a));
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min).floor() as i32;
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max).ceil() as i32;
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min).floor() as i32;
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max).ceil() as i32;

        let mut ink = Vec::new();
        for dy in min_y..=max_y {
            for dx in min_x..=max_x {
                let (fx, fy) = (dx as f64, dy as f64);
                let a = cos * fx - sin * fy;
                let b = sin * fx + cos * fy;
                let u = (a + w).floor() as i64;
                let v = (b + h / 2.0).floor() as i64;
                if let Some(color) = self.ink_at(u, v) {
                    ink.push(((dx, dy), color));
                }
            }
        }
        ink
    }
}

fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
    let image = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ChartError::Encode("pixel buffer does not match chart size".to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ChartError::Encode(e.to_string()))?;

    Ok(png)
}
