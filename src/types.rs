use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// A single spreadsheet cell after loading.
///
/// Dates, durations and cell errors are kept as their display text; the
/// analysis never interprets them.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// `Empty` and whitespace-only text count as null.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed display text used as the grouping key.
    pub fn key(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(v) => write!(f, "{}", v),
            // Whole floats come from numeric xlsx cells and should read like integers.
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{}", *v as i64),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Header plus rows, every row padded to the header width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidentTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl ResidentTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, CellValue::Empty);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact, case-sensitive lookup of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column in row order, `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Non-null cells of one column.
    pub fn values(&self, name: &str) -> Option<Vec<&CellValue>> {
        Some(self.column(name)?.filter(|c| !c.is_null()).collect())
    }

    /// A new table with the same header holding the rows accepted by `keep`.
    pub fn filter_rows<F>(&self, mut keep: F) -> ResidentTable
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        ResidentTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// The recognised resident attributes, each backed by one optional column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Age,
    CareLevel,
    Department,
    SingleRoom,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Age,
        Dimension::CareLevel,
        Dimension::Department,
        Dimension::SingleRoom,
    ];

    /// Dimensions that get a chart and narrative, in report order.
    pub const CHARTED: [Dimension; 3] = [Dimension::Age, Dimension::CareLevel, Dimension::Department];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::Age => "Alter",
            Dimension::CareLevel => "Betreuungsbedarf",
            Dimension::Department => "Abteilung",
            Dimension::SingleRoom => "Einzelzimmer",
        }
    }

    /// Section heading and chart title.
    pub fn title(self) -> &'static str {
        match self {
            Dimension::Age => "Altersverteilung",
            Dimension::CareLevel => "Betreuungsbedarf",
            Dimension::Department => "Abteilungen",
            Dimension::SingleRoom => "Einzelzimmer",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Dimension::Age => "Altersgruppe",
            Dimension::CareLevel => "Kategorie",
            Dimension::Department => "Abteilung",
            Dimension::SingleRoom => "Einzelzimmer",
        }
    }
}

/// Five-year age ranges, lower-inclusive and upper-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBucket {
    From70,
    From75,
    From80,
    From85,
    From90,
    From95,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        AgeBucket::From70,
        AgeBucket::From75,
        AgeBucket::From80,
        AgeBucket::From85,
        AgeBucket::From90,
        AgeBucket::From95,
    ];

    /// Bucket for an age; `None` below 70 and from 100 on.
    pub fn of(age: i64) -> Option<AgeBucket> {
        match age {
            70..=74 => Some(AgeBucket::From70),
            75..=79 => Some(AgeBucket::From75),
            80..=84 => Some(AgeBucket::From80),
            85..=89 => Some(AgeBucket::From85),
            90..=94 => Some(AgeBucket::From90),
            95..=99 => Some(AgeBucket::From95),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::From70 => "70-74",
            AgeBucket::From75 => "75-79",
            AgeBucket::From80 => "80-84",
            AgeBucket::From85 => "85-89",
            AgeBucket::From90 => "90-94",
            AgeBucket::From95 => "95+",
        }
    }

    pub fn lower_bound(self) -> i64 {
        match self {
            AgeBucket::From70 => 70,
            AgeBucket::From75 => 75,
            AgeBucket::From80 => 80,
            AgeBucket::From85 => 85,
            AgeBucket::From90 => 90,
            AgeBucket::From95 => 95,
        }
    }
}

/// Closed set of care levels in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CareLevel {
    High,
    Medium,
    Low,
}

impl CareLevel {
    pub const ALL: [CareLevel; 3] = [CareLevel::High, CareLevel::Medium, CareLevel::Low];

    /// Exact match on the spreadsheet value after trimming.
    pub fn parse(raw: &str) -> Option<CareLevel> {
        match raw.trim() {
            "hoch" => Some(CareLevel::High),
            "mittel" => Some(CareLevel::Medium),
            "niedrig" => Some(CareLevel::Low),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CareLevel::High => "hoch",
            CareLevel::Medium => "mittel",
            CareLevel::Low => "niedrig",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Counts per category for one dimension, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    #[serde(skip)]
    pub dimension: Dimension,
    pub entries: Vec<CategoryCount>,
    pub total: usize,
}

impl Aggregate {
    pub fn new(dimension: Dimension, entries: Vec<CategoryCount>) -> Self {
        let total = entries.iter().map(|e| e.count).sum();
        Self {
            dimension,
            entries,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Share of `count` in percent, 0 for an empty aggregate.
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (count as f64 / self.total as f64) * 100.0
        }
    }

    pub fn count_of(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

/// Console row for one aggregate entry.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AggregateRow {
    #[serde(rename = "Kategorie")]
    #[tabled(rename = "Kategorie")]
    pub category: String,
    #[serde(rename = "Anzahl")]
    #[tabled(rename = "Anzahl")]
    pub count: usize,
    #[serde(rename = "Anteil")]
    #[tabled(rename = "Anteil")]
    pub share: String,
}

/// The four headline metrics of the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub residents: usize,
    pub mean_age: Option<f64>,
    pub high_care: Option<usize>,
    pub single_rooms: Option<usize>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Kennzahl")]
    #[tabled(rename = "Kennzahl")]
    pub metric: String,
    #[serde(rename = "Wert")]
    #[tabled(rename = "Wert")]
    pub value: String,
}
