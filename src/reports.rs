use crate::analysis::{age_stats, aggregate, is_available, kpi_summary, AgeStats};
use crate::charts::render_bar_chart;
use crate::config::ReportStyle;
use crate::docx::WordDocument;
use crate::error::ReportError;
use crate::narrative::{describe_age, describe_care_level, describe_departments};
use crate::types::{Aggregate, Dimension, KpiRow, KpiSummary, ResidentTable};
use crate::util::{format_int, format_number};
use chrono::Utc;
use tracing::{debug, info};

/// One chart section of the report, before any image is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub dimension: Dimension,
    pub heading: String,
    pub narrative: String,
    pub aggregate: Aggregate,
}

/// Sections for every charted dimension whose column is present and holds
/// data, always in the order age, care level, department.
pub fn build_sections(table: &ResidentTable) -> Vec<ReportSection> {
    Dimension::CHARTED
        .iter()
        .copied()
        .filter(|d| is_available(table, *d))
        .filter_map(|dimension| {
            let agg = aggregate(table, dimension)?;
            let narrative = match dimension {
                Dimension::Age => {
                    let stats = age_stats(table).unwrap_or(AgeStats {
                        mean: 0.0,
                        median: 0.0,
                    });
                    describe_age(&agg, &stats)
                }
                Dimension::CareLevel => describe_care_level(&agg),
                Dimension::Department => describe_departments(&agg),
                Dimension::SingleRoom => return None,
            };
            Some(ReportSection {
                dimension,
                heading: dimension.title().to_string(),
                narrative,
                aggregate: agg,
            })
        })
        .collect()
}

/// Label/value pairs of the headline metrics; absent columns show a dash.
pub fn kpi_rows(kpis: &KpiSummary) -> Vec<KpiRow> {
    let dash = || "–".to_string();
    vec![
        KpiRow {
            metric: "Bewohnerinnen und Bewohner".to_string(),
            value: format_int(kpis.residents),
        },
        KpiRow {
            metric: "Durchschnittsalter".to_string(),
            value: kpis
                .mean_age
                .map(|a| format!("{} Jahre", format_number(a, 1)))
                .unwrap_or_else(dash),
        },
        KpiRow {
            metric: "Hoher Betreuungsbedarf".to_string(),
            value: kpis.high_care.map(format_int).unwrap_or_else(dash),
        },
        KpiRow {
            metric: "Einzelzimmer".to_string(),
            value: kpis.single_rooms.map(format_int).unwrap_or_else(dash),
        },
    ]
}

/// Build the complete Word report in memory.
///
/// A failing chart aborts the whole build; there is no partial document.
#[tracing::instrument(name = "build_word_report", skip_all, fields(rows = table.len()))]
pub fn build_word_report(table: &ResidentTable, style: &ReportStyle) -> Result<Vec<u8>, ReportError> {
    let doc = layout_report(table, style)?;
    let bytes = doc.pack(Utc::now())?;
    info!(pictures = doc.picture_count(), bytes = bytes.len(), "word report built");
    Ok(bytes)
}

/// Title, introduction, KPI block, then heading, narrative and chart per section.
fn layout_report(table: &ResidentTable, style: &ReportStyle) -> Result<WordDocument, ReportError> {
    let mut doc = WordDocument::new(&style.document_title, style.picture_extent_emu());
    doc.add_title(&style.document_title)
        .add_paragraph(&style.introduction)
        .add_heading("Kennzahlen");
    for row in kpi_rows(&kpi_summary(table)) {
        doc.add_labelled(&row.metric, &row.value);
    }

    for section in build_sections(table) {
        let png = render_bar_chart(
            &section.aggregate,
            section.dimension.title(),
            section.dimension.axis_label(),
            style,
        )
        .map_err(|source| ReportError::Chart {
            section: section.dimension.title(),
            source,
        })?;
        doc.add_heading(&section.heading)
            .add_paragraph(&section.narrative)
            .add_picture(png);
        debug!(section = %section.heading, "section added");
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_from_bytes;
    use crate::loader::tests::workbook_bytes;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn small_style() -> ReportStyle {
        ReportStyle {
            chart_size: (640, 360),
            ..ReportStyle::default()
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut s = String::new();
        part.read_to_string(&mut s).unwrap();
        s
    }

    fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(|s| s.to_string()).collect()
    }

    fn full_table() -> ResidentTable {
        let bytes = workbook_bytes(
            &["Name", "Alter", "Betreuungsbedarf", "Abteilung", "Einzelzimmer"],
            &[
                vec!["A", "70", "hoch", "Nord", "Ja"],
                vec!["B", "72", "hoch", "Nord", "Nein"],
                vec!["C", "76", "mittel", "Süd", "Ja"],
                vec!["D", "91", "niedrig", "Süd", "Nein"],
                vec!["E", "91", "hoch", "Nord", "Ja"],
                vec!["F", "101", "mittel", "Ost", "Nein"],
            ],
        );
        load_from_bytes(&bytes).unwrap().0
    }

    #[test]
    fn test_sections_follow_fixed_order() {
        let sections = build_sections(&full_table());
        let dims: Vec<Dimension> = sections.iter().map(|s| s.dimension).collect();
        assert_eq!(
            dims,
            vec![Dimension::Age, Dimension::CareLevel, Dimension::Department]
        );
        assert_eq!(sections[0].aggregate.total, 5);
    }

    #[test]
    fn test_sections_are_deterministic() {
        let table = full_table();
        assert_eq!(build_sections(&table), build_sections(&table));
    }

    #[test]
    fn test_missing_or_empty_columns_drop_sections() {
        let bytes = workbook_bytes(
            &["Alter", "Abteilung", "Betreuungsbedarf"],
            &[vec!["80", "Nord", ""], vec!["85", "Süd", ""]],
        );
        let table = load_from_bytes(&bytes).unwrap().0;
        let sections = build_sections(&table);
        let dims: Vec<Dimension> = sections.iter().map(|s| s.dimension).collect();
        assert_eq!(dims, vec![Dimension::Age, Dimension::Department]);
    }

    #[test]
    fn test_age_column_without_values_has_no_section() {
        let bytes = workbook_bytes(
            &["Name", "Alter", "Abteilung"],
            &[vec!["A", "", "Nord"], vec!["B", "", "Süd"]],
        );
        let table = load_from_bytes(&bytes).unwrap().0;
        assert!(table.has_column("Alter"));
        let dims: Vec<Dimension> = build_sections(&table).iter().map(|s| s.dimension).collect();
        assert_eq!(dims, vec![Dimension::Department]);
    }

    #[test]
    fn test_document_body_is_stable_across_builds() {
        let table = full_table();
        let first = build_word_report(&table, &small_style()).unwrap();
        let second = build_word_report(&table, &small_style()).unwrap();
        assert_eq!(
            read_part(&first, "word/document.xml"),
            read_part(&second, "word/document.xml")
        );
    }

    #[test]
    fn test_kpi_rows_show_dash_for_missing_columns() {
        let rows = kpi_rows(&KpiSummary {
            residents: 1200,
            mean_age: Some(84.26),
            high_care: None,
            single_rooms: Some(3),
        });
        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["1.200", "84,3 Jahre", "–", "3"]);
    }

    #[test]
    fn test_word_report_contains_all_sections() {
        let bytes = build_word_report(&full_table(), &small_style()).unwrap();
        let names = part_names(&bytes);
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "word/media/chart1.png",
            "word/media/chart2.png",
            "word/media/chart3.png",
        ] {
            assert!(names.iter().any(|n| n == part), "missing part {}", part);
        }

        let doc = read_part(&bytes, "word/document.xml");
        let age = doc.find(">Altersverteilung<").unwrap();
        let care = doc.find(">Betreuungsbedarf<").unwrap();
        let dept = doc.find(">Abteilungen<").unwrap();
        assert!(age < care && care < dept);
        assert!(doc.contains("Pflegeheim-Datenanalyse (Grafikreport)"));
        assert!(doc.contains("Kennzahlen"));
        assert!(doc.contains(r#"r:embed="rId4""#));

        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Id="rId4""#));
        assert!(rels.contains("media/chart3.png"));
    }

    #[test]
    fn test_word_report_without_care_level_column() {
        let bytes = workbook_bytes(
            &["Alter", "Abteilung"],
            &[vec!["80", "Nord"], vec!["92", "Süd"]],
        );
        let table = load_from_bytes(&bytes).unwrap().0;
        let report = build_word_report(&table, &small_style()).unwrap();
        let doc = read_part(&report, "word/document.xml");
        assert!(!doc.contains(">Betreuungsbedarf<"));
        assert!(!doc.contains("Verteilung des Betreuungsbedarfs"));
        assert!(doc.contains(">Altersverteilung<"));
        assert!(doc.contains(">Abteilungen<"));
        let names = part_names(&report);
        assert!(names.iter().any(|n| n == "word/media/chart2.png"));
        assert!(!names.iter().any(|n| n == "word/media/chart3.png"));
    }

    #[test]
    fn test_text_is_xml_escaped() {
        let style = ReportStyle {
            document_title: "Haus <Sonne> & Mond".to_string(),
            ..small_style()
        };
        let table = ResidentTable::new(vec!["Name".to_string()], Vec::new());
        let bytes = build_word_report(&table, &style).unwrap();
        let doc = read_part(&bytes, "word/document.xml");
        assert!(doc.contains("Haus &lt;Sonne&gt; &amp; Mond"));
        assert!(!part_names(&bytes).iter().any(|n| n.starts_with("word/media/")));
    }
}
