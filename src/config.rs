// Presentation settings shared by the chart renderer and the report
// assembler. Passed around as a plain value; nothing here is global.
use plotters::style::RGBColor;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub document_title: String,
    pub introduction: String,
    /// Pixel size of every chart image (8 x 4.5 inch at 200 dpi).
    pub chart_size: (u32, u32),
    pub bar_color: RGBColor,
    pub font_family: String,
    pub caption_font_size: f64,
    pub label_font_size: f64,
    pub annotation_font_size: f64,
    /// Width of embedded pictures in the document.
    pub picture_width_inches: f64,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            document_title: "Pflegeheim-Datenanalyse (Grafikreport)".to_string(),
            introduction: "Automatisch generierter Bericht aus der hochgeladenen Excel-Datei. \
                           Die folgenden Abbildungen zeigen die wichtigsten Verteilungen."
                .to_string(),
            chart_size: (1600, 900),
            bar_color: RGBColor(31, 119, 180),
            font_family: "sans-serif".to_string(),
            caption_font_size: 48.0,
            label_font_size: 30.0,
            annotation_font_size: 28.0,
            picture_width_inches: 6.5,
        }
    }
}

impl ReportStyle {
    /// Picture size in EMU (English Metric Units) keeping the chart aspect ratio.
    pub fn picture_extent_emu(&self) -> (u64, u64) {
        const EMU_PER_INCH: f64 = 914_400.0;
        let (w, h) = self.chart_size;
        let cx = self.picture_width_inches * EMU_PER_INCH;
        let cy = if w == 0 { 0.0 } else { cx * h as f64 / w as f64 };
        (cx.round() as u64, cy.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_extent_keeps_aspect_ratio() {
        let style = ReportStyle::default();
        let (cx, cy) = style.picture_extent_emu();
        assert_eq!(cx, 5_943_600);
        assert_eq!(cy, 3_343_275);
    }
}
