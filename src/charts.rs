//! Bar chart rendering into in-memory PNG images.
//!
//! Charts are drawn with the [`plotters`] bitmap backend into an RGB buffer
//! and encoded with [`image`]. Bars follow the order of the aggregate's
//! entries exactly, so the picture agrees with the narrative text.

use crate::config::ReportStyle;
use crate::error::ChartError;
use crate::types::Aggregate;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;
use tracing::debug;

type Result<T> = core::result::Result<T, ChartError>;

/// Render one bar per aggregate entry, each annotated with its count.
///
/// # Arguments
/// * `agg` - Categories and counts, drawn left to right in entry order
/// * `title` - Caption above the plot
/// * `x_label` - Description of the category axis
/// * `style` - Colours, fonts and pixel size
///
/// # Returns
/// PNG bytes of size `style.chart_size`.
pub fn render_bar_chart(
    agg: &Aggregate,
    title: &str,
    x_label: &str,
    style: &ReportStyle,
) -> Result<Vec<u8>> {
    let (width, height) = style.chart_size;
    if width == 0 || height == 0 {
        return Err(ChartError::Buffer(width, height));
    }
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    draw_bars(&mut buffer, agg, title, x_label, style)?;

    let rgb = image::RgbImage::from_raw(width, height, buffer)
        .ok_or(ChartError::Buffer(width, height))?;
    let mut png = Cursor::new(Vec::new());
    rgb.write_to(&mut png, image::ImageFormat::Png)?;
    let png = png.into_inner();
    debug!(title, bars = agg.entries.len(), bytes = png.len(), "chart rendered");
    Ok(png)
}

fn draw_bars(
    buffer: &mut [u8],
    agg: &Aggregate,
    title: &str,
    x_label: &str,
    style: &ReportStyle,
) -> Result<()> {
    let labels: Vec<&str> = agg.entries.iter().map(|e| e.label.as_str()).collect();
    // An empty aggregate still gets axes; the segment range must not be empty.
    let segments = labels.len().max(1) as u32;
    let max_count = agg.entries.iter().map(|e| e.count).max().unwrap_or(0) as u32;
    // Headroom above the tallest bar for its annotation.
    let y_max = (max_count as f64 * 1.15).ceil() as u32 + 1;

    let font = style.font_family.as_str();
    let root = BitMapBackend::with_buffer(buffer, style.chart_size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| ChartError::Drawing(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (font, style.caption_font_size))
        .margin(30)
        .x_label_area_size(90)
        .y_label_area_size(110)
        .build_cartesian_2d((0u32..segments).into_segmented(), 0u32..y_max)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let x_formatter = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels
            .get(*i as usize)
            .map(|l| l.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_label_formatter(&x_formatter)
        .x_desc(x_label)
        .y_desc("Anzahl")
        .label_style((font, style.label_font_size))
        .axis_desc_style((font, style.label_font_size))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let bar_style = style.bar_color.filled();
    chart
        .draw_series(agg.entries.iter().enumerate().map(|(i, e)| {
            let i = i as u32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), e.count as u32),
                ],
                bar_style,
            );
            bar.set_margin(0, 0, 12, 12);
            bar
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let annotation = (font, style.annotation_font_size)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(agg.entries.iter().enumerate().map(|(i, e)| {
            Text::new(
                e.count.to_string(),
                (SegmentValue::CenterOf(i as u32), e.count as u32),
                annotation.clone(),
            )
        }))
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    root.present().map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryCount, Dimension};

    fn sample() -> Aggregate {
        Aggregate::new(
            Dimension::CareLevel,
            vec![
                CategoryCount {
                    label: "hoch".to_string(),
                    count: 2,
                },
                CategoryCount {
                    label: "mittel".to_string(),
                    count: 1,
                },
            ],
        )
    }

    #[test]
    fn test_render_produces_png_of_configured_size() {
        let style = ReportStyle {
            chart_size: (800, 450),
            ..ReportStyle::default()
        };
        let png = render_bar_chart(&sample(), "Betreuungsbedarf", "Kategorie", &style).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR carries width and height as big-endian u32 at offset 16.
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 800);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 450);
    }

    #[test]
    fn test_render_empty_aggregate() {
        let style = ReportStyle {
            chart_size: (400, 300),
            ..ReportStyle::default()
        };
        let empty = Aggregate::new(Dimension::Age, Vec::new());
        let png = render_bar_chart(&empty, "Altersverteilung", "Altersgruppe", &style).unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_zero_sized_chart_is_rejected() {
        let style = ReportStyle {
            chart_size: (0, 300),
            ..ReportStyle::default()
        };
        let err = render_bar_chart(&sample(), "x", "y", &style).unwrap_err();
        assert!(matches!(err, ChartError::Buffer(0, 300)));
    }
}
