use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::analysis::error::AnalysisError;
use crate::analysis::extrema::Extrema;
use crate::analysis::history::MultipleHistogram;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub trace: RGBColor,
    pub peak: RGBColor,
    pub trough: RGBColor,
    pub highlight: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: WHITE,
            trace: BLACK,
            peak: BLUE,
            trough: RGBColor(0, 90, 200),
            highlight: RED,
        }
    }
}
/// Trajectory with its peaks (crosses) and troughs (circles). Pixel rows grow
/// downward, so heights are drawn negated to keep the droplet upright.
pub fn render_trace_png(extrema: &Extrema, style: &PlotStyle) -> Result<Vec<u8>, AnalysisError> {
    if extrema.scaled.is_empty() {
        return Err(AnalysisError::Plot("trajectory has no samples".into()));
    }
    let y_min = extrema.scaled.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = extrema
        .scaled
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if (y_max - y_min).abs() < f64::EPSILON {
        (y_min - 1.0, y_max + 1.0)
    } else {
        (y_min, y_max)
    };
    let x_end = (extrema.scaled.len().max(2) - 1) as f64;
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Droplet Trajectory", ("sans-serif", 20).into_font().color(&style.trace))
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..x_end, -hi..-lo)?;
        chart
            .configure_mesh()
            .x_desc("Frame")
            .y_desc("Height (px)")
            .y_label_formatter(&|y: &f64| format!("{:.0}", -y))
            .light_line_style(&style.trace.mix(0.05))
            .draw()?;
        let series = extrema
            .scaled
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, -*v));
        chart.draw_series(LineSeries::new(series, &style.trace))?;
        chart.draw_series(extrema.peak_points().into_iter().map(|p| {
            Cross::new(
                (p.time_index as f64, -p.value),
                5,
                style.peak.stroke_width(2),
            )
        }))?;
        chart.draw_series(extrema.trough_points().into_iter().map(|p| {
            Circle::new(
                (p.time_index as f64, -p.value),
                4,
                style.trough.filled(),
            )
        }))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Electron-multiple histogram with the mode bin centre marked.
pub fn render_histogram_png(
    histogram: &MultipleHistogram,
    style: &PlotStyle,
) -> Result<Vec<u8>, AnalysisError> {
    let (Some(&first), Some(&last)) = (histogram.edges().first(), histogram.edges().last()) else {
        return Err(AnalysisError::Plot("histogram has no bins".into()));
    };
    let top = histogram.counts().iter().copied().max().unwrap_or(0).max(1) as f64;
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                "Electron Multiples",
                ("sans-serif", 20).into_font().color(&style.trace),
            )
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(first..last, 0f64..top * 1.1)?;
        chart
            .configure_mesh()
            .x_desc("q / e")
            .y_desc("Estimates")
            .light_line_style(&style.trace.mix(0.05))
            .draw()?;
        chart.draw_series(histogram.bins().map(|(lo, hi, count)| {
            Rectangle::new([(lo, 0.0), (hi, count as f64)], style.peak.mix(0.7).filled())
        }))?;
        if let Some(centre) = histogram.mode_bin().and_then(|bin| histogram.bin_center(bin)) {
            chart.draw_series(LineSeries::new(
                [(centre, 0.0), (centre, top * 1.1)],
                &style.highlight,
            ))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("Electron Count: {}", centre.round()),
                (centre, top * 1.05),
                ("sans-serif", 16).into_font().color(&style.highlight),
            )))?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, AnalysisError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| AnalysisError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
