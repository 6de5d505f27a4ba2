//! Fixed German sentence templates over aggregates.
//!
//! All functions are pure: the same aggregate always yields the same text.
//! Entries are visited in aggregate order, which is also the bar order of
//! the charts, so ties resolve the same way in text and picture.

use crate::analysis::{unrecognised_care_levels, AgeStats};
use crate::types::{AgeBucket, Aggregate, CareLevel, CategoryCount};
use crate::util::{format_int, format_number, format_percent};

/// Share of residents aged 90 and over above which the age text adds a remark.
pub const VERY_OLD_SHARE_THRESHOLD: f64 = 20.0;

/// Spread in percentage points between largest and smallest department
/// above which the distribution counts as imbalanced.
pub const DEPARTMENT_SPREAD_THRESHOLD: f64 = 15.0;

/// First entry with the highest count, skipping the ones in `exclude`.
fn top_entry<'a>(entries: &'a [CategoryCount], exclude: Option<&str>) -> Option<&'a CategoryCount> {
    entries
        .iter()
        .filter(|e| e.count > 0 && Some(e.label.as_str()) != exclude)
        .fold(None, |best: Option<&CategoryCount>, e| match best {
            Some(b) if b.count >= e.count => Some(b),
            _ => Some(e),
        })
}

fn count_and_share(agg: &Aggregate, count: usize) -> String {
    format!("{} ({})", format_int(count), format_percent(agg.percentage(count)))
}

pub fn describe_age(agg: &Aggregate, stats: &AgeStats) -> String {
    let Some(mode) = top_entry(&agg.entries, None) else {
        return "Es liegen keine gültigen Altersangaben im Bereich von 70 bis 99 Jahren vor."
            .to_string();
    };

    let mut text = format!(
        "Die größte Altersgruppe ist {} Jahre mit {} Bewohnerinnen und Bewohnern.",
        mode.label,
        count_and_share(agg, mode.count)
    );
    if let Some(second) = top_entry(&agg.entries, Some(mode.label.as_str())) {
        text.push_str(&format!(
            " Am zweithäufigsten ist die Gruppe {} Jahre mit {}.",
            second.label,
            count_and_share(agg, second.count)
        ));
    }
    text.push_str(&format!(
        " Das Durchschnittsalter liegt bei {} Jahren, der Median bei {} Jahren.",
        format_number(stats.mean, 1),
        format_number(stats.median, 1)
    ));

    let very_old: usize = [AgeBucket::From90, AgeBucket::From95]
        .iter()
        .map(|b| agg.count_of(b.label()))
        .sum();
    let very_old_share = agg.percentage(very_old);
    if very_old_share > VERY_OLD_SHARE_THRESHOLD {
        text.push_str(&format!(
            " Mit {} ist der Anteil der Hochaltrigen ab 90 Jahren bemerkenswert hoch; \
             dies spricht für einen erhöhten Pflege- und Betreuungsaufwand.",
            format_percent(very_old_share)
        ));
    }
    text
}

/// Level with the highest count; on a tie the earlier level in display order.
pub fn dominant_care_level(agg: &Aggregate) -> Option<CareLevel> {
    CareLevel::ALL
        .iter()
        .copied()
        .filter(|l| agg.count_of(l.label()) > 0)
        .fold(None, |best: Option<CareLevel>, l| match best {
            Some(b) if agg.count_of(b.label()) >= agg.count_of(l.label()) => Some(b),
            _ => Some(l),
        })
}

pub fn describe_care_level(agg: &Aggregate) -> String {
    let parts: Vec<String> = CareLevel::ALL
        .iter()
        .map(|l| format!("{} {}", l.label(), count_and_share(agg, agg.count_of(l.label()))))
        .collect();
    let mut text = format!("Verteilung des Betreuungsbedarfs: {}.", parts.join(", "));

    let remark = match dominant_care_level(agg) {
        Some(CareLevel::High) => {
            " Der hohe Betreuungsbedarf überwiegt; die Personalplanung sollte \
             entsprechend intensive Pflege vorsehen."
        }
        Some(CareLevel::Medium) => {
            " Überwiegend besteht ein mittlerer Betreuungsbedarf; das spricht für \
             eine ausgewogene Mischung aus Pflege und Aktivierung."
        }
        Some(CareLevel::Low) => {
            " Der Großteil der Bewohnerinnen und Bewohner benötigt nur geringe \
             Unterstützung; Angebote zur Selbstständigkeit stehen im Vordergrund."
        }
        None => " Zum Betreuungsbedarf liegen keine auswertbaren Angaben vor.",
    };
    text.push_str(remark);

    let unknown = unrecognised_care_levels(agg);
    if !unknown.is_empty() {
        let count: usize = unknown.iter().map(|e| e.count).sum();
        let labels: Vec<String> = unknown.iter().map(|e| format!("\"{}\"", e.label)).collect();
        text.push_str(&format!(
            " {} Einträge haben keinen der Werte hoch, mittel oder niedrig ({}).",
            format_int(count),
            labels.join(", ")
        ));
    }
    text
}

pub fn describe_departments(agg: &Aggregate) -> String {
    let (Some(largest), Some(smallest)) = (agg.entries.first(), agg.entries.last()) else {
        return "Es liegen keine Angaben zu Abteilungen vor.".to_string();
    };

    let largest_share = agg.percentage(largest.count);
    let smallest_share = agg.percentage(smallest.count);
    let mut text = format!(
        "Die Bewohnerinnen und Bewohner verteilen sich auf {} Abteilung{}. \
         Am größten ist {} mit {}, am kleinsten {} mit {}.",
        format_int(agg.entries.len()),
        if agg.entries.len() == 1 { "" } else { "en" },
        largest.label,
        count_and_share(agg, largest.count),
        smallest.label,
        count_and_share(agg, smallest.count)
    );

    let spread = largest_share - smallest_share;
    if spread > DEPARTMENT_SPREAD_THRESHOLD {
        text.push_str(&format!(
            " Mit einem Unterschied von {} Prozentpunkten ist die Belegung unausgewogen.",
            format_number(spread, 1)
        ));
    } else {
        text.push_str(" Die Belegung der Abteilungen ist ausgewogen.");
    }
    text
}
