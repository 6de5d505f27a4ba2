use std::path::PathBuf;
use thiserror::Error;

/// The uploaded file could not be turned into a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Datei konnte nicht gelesen werden: {0}")]
    Open(#[from] std::io::Error),

    #[error("Keine gültige Excel-Datei: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("Die Arbeitsmappe enthält kein Tabellenblatt")]
    NoSheet,

    #[error("Tabellenblatt '{name}' konnte nicht gelesen werden: {source}")]
    Sheet {
        name: String,
        #[source]
        source: calamine::XlsxError,
    },
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Diagramm konnte nicht gezeichnet werden: {0}")]
    Drawing(String),

    #[error("PNG-Kodierung fehlgeschlagen: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Bildpuffer hat eine ungültige Größe ({0}x{1})")]
    Buffer(u32, u32),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Grafik für Abschnitt '{section}' fehlgeschlagen: {source}")]
    Chart {
        section: &'static str,
        #[source]
        source: ChartError,
    },

    #[error("Word-Dokument konnte nicht gepackt werden: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Dokument-XML konnte nicht erzeugt werden: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Schreibfehler: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the console host can surface to the user.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Datei '{}' konnte nicht geschrieben werden: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON-Ausgabe fehlgeschlagen: {0}")]
    Json(#[from] serde_json::Error),
}
