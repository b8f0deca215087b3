//! Rendering of precision-recall curves.
//!
//! Text is drawn with a bundled DejaVu Sans face registered under
//! [`FONT_FAMILY`], so no system font library is needed.

use crate::config::PlotConfig;
use crate::error::{GeoEvalError, Result};
use crate::types::PrCurve;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::OnceLock;

/// Font family used for every label on the plot.
pub const FONT_FAMILY: &str = "sans-serif";

static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

fn ensure_font() -> Result<()> {
    let registered = *FONT_REGISTERED.get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok());
    if registered {
        Ok(())
    } else {
        Err(GeoEvalError::Render("bundled font could not be loaded".to_string()))
    }
}

/// Render `curve` as recall (x) against precision (y).
///
/// The backend follows the file extension: `.svg` writes vector output,
/// anything else a bitmap (PNG for `.png`).
///
/// # Errors
///
/// Returns `Render` when the backend cannot draw or write the file. A panic
/// inside the backend is reported the same way.
pub fn render_pr_curve<P: AsRef<Path>>(curve: &PrCurve, path: P, config: &PlotConfig) -> Result<()> {
    ensure_font()?;

    let path = path.as_ref();
    let size = (config.width, config.height);

    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("svg"));

    panic::catch_unwind(AssertUnwindSafe(|| {
        if is_svg {
            draw_curve(SVGBackend::new(path, size).into_drawing_area(), curve, config)
        } else {
            draw_curve(BitMapBackend::new(path, size).into_drawing_area(), curve, config)
        }
    }))
    .unwrap_or_else(|_| Err(GeoEvalError::Render(format!("plot backend panicked while drawing {}", path.display()))))
}

fn render_error<E: Display>(e: E) -> GeoEvalError {
    GeoEvalError::Render(e.to_string())
}

fn draw_curve<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, curve: &PrCurve, config: &PlotConfig) -> Result<()> {
    root.fill(&WHITE).map_err(render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, (FONT_FAMILY, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..1.02f64)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc("Recall")
        .y_desc("Precision")
        .label_style((FONT_FAMILY, 14))
        .axis_desc_style((FONT_FAMILY, 18))
        .draw()
        .map_err(render_error)?;

    let series = curve.recall_precision();
    chart
        .draw_series(LineSeries::new(series.iter().copied(), &BLUE))
        .map_err(render_error)?
        .label(config.series_label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(series.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))
        .map_err(render_error)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT_FAMILY, 16))
        .draw()
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}
