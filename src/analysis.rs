// Column-gated aggregation over a loaded resident table.
//
// Every function returns `None` when the backing column is missing; that
// is how an analysis is switched off, never by an error.
use crate::types::{
    AgeBucket, Aggregate, CareLevel, CategoryCount, Dimension, KpiSummary, ResidentTable,
};
use crate::util::{average, median, parse_age};
use std::collections::HashMap;
use tracing::debug;

/// Mean and median of the ages that fall into an age bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeStats {
    pub mean: f64,
    pub median: f64,
}

/// True when the column of `dimension` exists and holds at least one value.
pub fn is_available(table: &ResidentTable, dimension: Dimension) -> bool {
    table
        .column(dimension.column())
        .map(|mut cells| cells.any(|c| !c.is_null()))
        .unwrap_or(false)
}

/// Counts per category for one dimension.
pub fn aggregate(table: &ResidentTable, dimension: Dimension) -> Option<Aggregate> {
    let agg = match dimension {
        Dimension::Age => aggregate_age(table)?,
        Dimension::CareLevel => aggregate_care_level(table)?,
        Dimension::Department | Dimension::SingleRoom => {
            let values = table.values(dimension.column())?;
            Aggregate::new(dimension, count_by_frequency(values.iter().map(|c| c.key())))
        }
    };
    debug!(
        column = dimension.column(),
        categories = agg.entries.len(),
        total = agg.total,
        "aggregated"
    );
    Some(agg)
}

/// Ages that land in a bucket; ages below 70 or from 100 on are left out.
pub fn bucketed_ages(table: &ResidentTable) -> Option<Vec<i64>> {
    let cells = table.column(Dimension::Age.column())?;
    Some(
        cells
            .filter_map(parse_age)
            .filter(|a| AgeBucket::of(*a).is_some())
            .collect(),
    )
}

fn aggregate_age(table: &ResidentTable) -> Option<Aggregate> {
    let ages = bucketed_ages(table)?;
    let mut counts: HashMap<AgeBucket, usize> = HashMap::new();
    for bucket in ages.iter().filter_map(|a| AgeBucket::of(*a)) {
        *counts.entry(bucket).or_default() += 1;
    }
    let entries = AgeBucket::ALL
        .iter()
        .filter_map(|b| {
            counts.get(b).map(|count| CategoryCount {
                label: b.label().to_string(),
                count: *count,
            })
        })
        .collect();
    Some(Aggregate::new(Dimension::Age, entries))
}

/// Known levels first in their fixed order, then anything unrecognised.
fn aggregate_care_level(table: &ResidentTable) -> Option<Aggregate> {
    let values = table.values(Dimension::CareLevel.column())?;
    let mut known: HashMap<CareLevel, usize> = HashMap::new();
    let mut unknown: Vec<String> = Vec::new();
    for cell in values {
        let key = cell.key();
        match CareLevel::parse(&key) {
            Some(level) => *known.entry(level).or_default() += 1,
            None => unknown.push(key),
        }
    }
    let mut entries: Vec<CategoryCount> = CareLevel::ALL
        .iter()
        .filter_map(|l| {
            known.get(l).map(|count| CategoryCount {
                label: l.label().to_string(),
                count: *count,
            })
        })
        .collect();
    entries.extend(count_by_frequency(unknown.into_iter()));
    Some(Aggregate::new(Dimension::CareLevel, entries))
}

/// Value counts sorted by descending count; ties keep first-seen order.
///
/// Count order matches the console tables and lets the department narrative
/// read the largest and smallest group off the ends of the list.
fn count_by_frequency<I>(keys: I) -> Vec<CategoryCount>
where
    I: Iterator<Item = String>,
{
    let mut entries: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for key in keys {
        match index.get(&key) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(key.clone(), entries.len());
                entries.push(CategoryCount { label: key, count: 1 });
            }
        }
    }
    // `sort_by` is stable, so equal counts stay in discovery order.
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Values of the care-level column that are not one of the three levels.
pub fn unrecognised_care_levels(agg: &Aggregate) -> Vec<&CategoryCount> {
    agg.entries
        .iter()
        .filter(|e| CareLevel::parse(&e.label).is_none())
        .collect()
}

pub fn age_stats(table: &ResidentTable) -> Option<AgeStats> {
    let ages: Vec<f64> = bucketed_ages(table)?.into_iter().map(|a| a as f64).collect();
    Some(AgeStats {
        mean: average(&ages),
        median: median(ages),
    })
}

/// Headline metrics. The mean age uses every numeric age, including those
/// outside the bucket ranges.
pub fn kpi_summary(table: &ResidentTable) -> KpiSummary {
    let mean_age = table.column(Dimension::Age.column()).and_then(|cells| {
        let ages: Vec<f64> = cells.filter_map(parse_age).map(|a| a as f64).collect();
        if ages.is_empty() {
            None
        } else {
            Some(average(&ages))
        }
    });
    let high_care = table.column(Dimension::CareLevel.column()).map(|cells| {
        cells
            .filter(|c| CareLevel::parse(&c.key()) == Some(CareLevel::High))
            .count()
    });
    let single_rooms = table
        .column(Dimension::SingleRoom.column())
        .map(|cells| cells.filter(|c| is_single_room(&c.key())).count());
    KpiSummary {
        residents: table.len(),
        mean_age,
        high_care,
        single_rooms,
    }
}

fn is_single_room(value: &str) -> bool {
    value == "Ja"
}

/// Residents in a single room, `None` without an `Einzelzimmer` column.
pub fn single_room_only(table: &ResidentTable) -> Option<ResidentTable> {
    let idx = table.column_index(Dimension::SingleRoom.column())?;
    Some(table.filter_rows(|row| is_single_room(&row[idx].key())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> ResidentTable {
        ResidentTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn age_table(ages: &[i64]) -> ResidentTable {
        table(&["Alter"], ages.iter().map(|a| vec![CellValue::Int(*a)]).collect())
    }

    #[test]
    fn test_age_bucketing_is_total_and_exclusive() {
        for age in 0..130i64 {
            let hits = AgeBucket::ALL
                .iter()
                .filter(|b| age >= b.lower_bound() && age < b.lower_bound() + 5)
                .count();
            match AgeBucket::of(age) {
                Some(bucket) => {
                    assert!((70..100).contains(&age));
                    assert_eq!(hits, 1);
                    assert!(age >= bucket.lower_bound() && age < bucket.lower_bound() + 5);
                }
                None => assert!(!(70..100).contains(&age)),
            }
        }
        assert_eq!(AgeBucket::of(95), Some(AgeBucket::From95));
        assert_eq!(AgeBucket::of(100), None);
        assert_eq!(AgeBucket::of(69), None);
    }

    #[test]
    fn test_age_aggregate_example() {
        let t = age_table(&[70, 72, 76, 91, 91, 91, 95, 95, 99, 101]);
        let agg = aggregate(&t, Dimension::Age).unwrap();
        let pairs: Vec<(&str, usize)> = agg
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(pairs, vec![("70-74", 2), ("75-79", 1), ("90-94", 3), ("95+", 3)]);
        assert_eq!(agg.total, 9);
        assert!((agg.percentage(3) - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_out_of_range_ages_still_count_for_kpis() {
        let t = age_table(&[60, 80, 101]);
        let agg = aggregate(&t, Dimension::Age).unwrap();
        assert_eq!(agg.total, 1);
        let kpis = kpi_summary(&t);
        assert_eq!(kpis.residents, 3);
        assert_eq!(kpis.mean_age, Some(241.0 / 3.0));
        let stats = age_stats(&t).unwrap();
        assert_eq!(stats.mean, 80.0);
        assert_eq!(stats.median, 80.0);
    }

    #[test]
    fn test_care_level_example() {
        let t = table(
            &["Betreuungsbedarf"],
            ["hoch", "niedrig", "hoch", "mittel"].iter().map(|v| vec![text(v)]).collect(),
        );
        let agg = aggregate(&t, Dimension::CareLevel).unwrap();
        let labels: Vec<&str> = agg.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["hoch", "mittel", "niedrig"]);
        assert_eq!(agg.count_of("hoch"), 2);
        assert_eq!(agg.percentage(agg.count_of("hoch")), 50.0);
        assert_eq!(agg.percentage(agg.count_of("mittel")), 25.0);
        assert_eq!(agg.percentage(agg.count_of("niedrig")), 25.0);
    }

    #[test]
    fn test_care_level_keeps_unrecognised_values_after_known_levels() {
        let t = table(
            &["Betreuungsbedarf"],
            ["Hoch", "niedrig", "sehr hoch", "Hoch", ""]
                .iter()
                .map(|v| vec![text(v)])
                .collect(),
        );
        let agg = aggregate(&t, Dimension::CareLevel).unwrap();
        let labels: Vec<&str> = agg.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["niedrig", "Hoch", "sehr hoch"]);
        assert_eq!(agg.total, 4);
        let unknown: Vec<&str> = unrecognised_care_levels(&agg)
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(unknown, vec!["Hoch", "sehr hoch"]);
    }

    #[test]
    fn test_department_order_is_count_then_discovery() {
        let t = table(
            &["Abteilung"],
            ["Süd", "Nord", "Ost", "Nord", "Süd", "West", "Nord"]
                .iter()
                .map(|v| vec![text(v)])
                .collect(),
        );
        let agg = aggregate(&t, Dimension::Department).unwrap();
        let pairs: Vec<(&str, usize)> = agg
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(pairs, vec![("Nord", 3), ("Süd", 2), ("Ost", 1), ("West", 1)]);
    }

    #[test]
    fn test_counts_sum_to_non_null_rows() {
        let t = table(
            &["Abteilung", "Einzelzimmer"],
            vec![
                vec![text("A"), text("Ja")],
                vec![CellValue::Empty, text("Nein")],
                vec![text("B"), CellValue::Empty],
                vec![text("  "), text("Ja")],
            ],
        );
        for dim in [Dimension::Department, Dimension::SingleRoom] {
            let agg = aggregate(&t, dim).unwrap();
            let non_null = t.values(dim.column()).unwrap().len();
            assert_eq!(agg.entries.iter().map(|e| e.count).sum::<usize>(), non_null);
            assert_eq!(agg.total, non_null);
        }
    }

    #[test]
    fn test_missing_column_disables_analysis() {
        let t = age_table(&[80]);
        assert!(aggregate(&t, Dimension::CareLevel).is_none());
        assert!(aggregate(&t, Dimension::Department).is_none());
        assert!(!is_available(&t, Dimension::CareLevel));
        assert!(is_available(&t, Dimension::Age));
        assert!(single_room_only(&t).is_none());
        let kpis = kpi_summary(&t);
        assert_eq!(kpis.high_care, None);
        assert_eq!(kpis.single_rooms, None);
    }

    #[test]
    fn test_empty_aggregate_has_zero_percentages() {
        let t = table(&["Alter"], vec![vec![CellValue::Empty]]);
        assert!(!is_available(&t, Dimension::Age));
        let agg = aggregate(&t, Dimension::Age).unwrap();
        assert!(agg.is_empty());
        assert_eq!(agg.percentage(0), 0.0);
        assert_eq!(agg.percentage(5), 0.0);
    }

    #[test]
    fn test_single_room_filter_and_kpis() {
        let t = table(
            &["Name", "Einzelzimmer", "Betreuungsbedarf"],
            vec![
                vec![text("A"), text("Ja"), text("hoch")],
                vec![text("B"), text("Nein"), text("hoch")],
                vec![text("C"), text(" Ja "), text("mittel")],
            ],
        );
        let singles = single_room_only(&t).unwrap();
        assert_eq!(singles.len(), 2);
        assert_eq!(singles.columns(), t.columns());
        let kpis = kpi_summary(&t);
        assert_eq!(kpis.single_rooms, Some(2));
        assert_eq!(kpis.high_care, Some(2));
        assert_eq!(kpis.mean_age, None);
    }
}
