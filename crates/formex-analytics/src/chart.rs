//! Chart rasterization.
//!
//! Renders a question's distribution to a PNG bitmap: pie for single-choice,
//! bar for multi-choice/rating. Bitmaps carry shapes only; labels and counts
//! are laid out around the image by the consuming format.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::stats::{ChartKind, FrequencyEntry, QuestionStats, StatsDetail};

pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 400;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);

/// Fixed series palette, cycled when a distribution has more entries.
const PALETTE: [Rgb<u8>; 8] = [
    Rgb([66, 133, 244]),
    Rgb([219, 68, 55]),
    Rgb([244, 180, 0]),
    Rgb([15, 157, 88]),
    Rgb([171, 71, 188]),
    Rgb([0, 172, 193]),
    Rgb([255, 112, 67]),
    Rgb([158, 157, 36]),
];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Render the chart for a question, if its distribution has one.
///
/// Returns `None` for chartless question types and for empty distributions.
pub fn render_chart(stats: &QuestionStats) -> Result<Option<Vec<u8>>, ChartError> {
    let entries = match (&stats.detail, stats.chart) {
        (StatsDetail::Frequency(entries), ChartKind::Pie) => {
            return render_if_nonzero(entries, draw_pie);
        }
        (StatsDetail::Frequency(entries), ChartKind::Bar) => entries,
        (StatsDetail::Rating { entries, .. }, ChartKind::Bar) => entries,
        _ => return Ok(None),
    };
    render_if_nonzero(entries, draw_bars)
}

fn render_if_nonzero(
    entries: &[FrequencyEntry],
    draw: fn(&mut RgbImage, &[FrequencyEntry]),
) -> Result<Option<Vec<u8>>, ChartError> {
    if entries.is_empty() || entries.iter().all(|e| e.count == 0) {
        return Ok(None);
    }
    let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
    draw(&mut img, entries);
    encode_png(img).map(Some)
}

fn encode_png(img: RgbImage) -> Result<Vec<u8>, ChartError> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Color for the n-th series.
pub fn series_color(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()].0
}

fn draw_bars(img: &mut RgbImage, entries: &[FrequencyEntry]) {
    let margin = 40u32;
    let plot_w = CHART_WIDTH - 2 * margin;
    let plot_h = CHART_HEIGHT - 2 * margin;
    let max = entries.iter().map(|e| e.count).max().unwrap_or(1).max(1);

    let slot = plot_w / entries.len() as u32;
    let bar_w = (slot * 3 / 4).max(1);
    let baseline = (CHART_HEIGHT - margin) as f32;

    for (idx, entry) in entries.iter().enumerate() {
        let height = ((entry.count as f64 / max as f64) * plot_h as f64).round() as u32;
        if height == 0 {
            continue;
        }
        let x = margin + idx as u32 * slot + (slot - bar_w) / 2;
        let y = CHART_HEIGHT - margin - height;
        draw_filled_rect_mut(
            img,
            Rect::at(x as i32, y as i32).of_size(bar_w, height),
            PALETTE[idx % PALETTE.len()],
        );
    }

    // Axes.
    draw_line_segment_mut(
        img,
        (margin as f32, margin as f32),
        (margin as f32, baseline),
        AXIS,
    );
    draw_line_segment_mut(
        img,
        (margin as f32, baseline),
        ((CHART_WIDTH - margin) as f32, baseline),
        AXIS,
    );
}

fn draw_pie(img: &mut RgbImage, entries: &[FrequencyEntry]) {
    let total: u64 = entries.iter().map(|e| e.count).sum();
    if total == 0 {
        return;
    }
    let cx = CHART_WIDTH as f64 / 2.0;
    let cy = CHART_HEIGHT as f64 / 2.0;
    let radius = (CHART_HEIGHT.min(CHART_WIDTH) as f64 / 2.0) - 20.0;

    // Cumulative slice boundaries as fractions of the full turn.
    let mut boundaries = Vec::with_capacity(entries.len());
    let mut cumulative = 0u64;
    for entry in entries {
        cumulative += entry.count;
        boundaries.push(cumulative as f64 / total as f64);
    }

    for y in 0..CHART_HEIGHT {
        for x in 0..CHART_WIDTH {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            // Angle measured clockwise from 12 o'clock, in turns.
            let angle = dy.atan2(dx) + std::f64::consts::FRAC_PI_2;
            let mut turn = angle / std::f64::consts::TAU;
            if turn < 0.0 {
                turn += 1.0;
            }
            let slice = boundaries
                .iter()
                .position(|&b| turn < b)
                .unwrap_or(entries.len() - 1);
            img.put_pixel(x, y, PALETTE[slice % PALETTE.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ChartKind, QuestionStats, StatsDetail};
    use formex_model::QuestionType;

    fn entry(label: &str, count: u64) -> FrequencyEntry {
        FrequencyEntry {
            label: label.to_string(),
            text: None,
            count,
            percentage: "0.00".to_string(),
        }
    }

    fn stats(chart: ChartKind, detail: StatsDetail) -> QuestionStats {
        QuestionStats {
            name: "q".to_string(),
            title: "Q".to_string(),
            question_type: QuestionType::SingleChoice,
            response_count: 3,
            response_rate: "100.00".to_string(),
            chart,
            detail,
        }
    }

    #[test]
    fn pie_renders_png_bytes() {
        let s = stats(
            ChartKind::Pie,
            StatsDetail::Frequency(vec![entry("a", 2), entry("b", 1)]),
        );
        let png = render_chart(&s).unwrap().unwrap();
        // PNG signature.
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn bar_renders_png_bytes() {
        let s = stats(
            ChartKind::Bar,
            StatsDetail::Rating {
                entries: vec![entry("1", 1), entry("2", 4)],
                average: Some(1.8),
            },
        );
        assert!(render_chart(&s).unwrap().is_some());
    }

    #[test]
    fn chartless_detail_renders_nothing() {
        let s = stats(ChartKind::None, StatsDetail::TextSamples(vec!["hi".to_string()]));
        assert!(render_chart(&s).unwrap().is_none());
    }

    #[test]
    fn all_zero_distribution_renders_nothing() {
        let s = stats(
            ChartKind::Bar,
            StatsDetail::Frequency(vec![entry("a", 0), entry("b", 0)]),
        );
        assert!(render_chart(&s).unwrap().is_none());
    }
}
