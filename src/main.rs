// Console host for the resident analysis.
//
// - Option [1] loads the spreadsheet and reports whether that worked.
// - Option [2] shows preview, key metrics and one table plus summary per
//   recognised column.
// - Option [3] lists residents living in a single room.
// - Option [4] writes the Word report.
use once_cell::sync::Lazy;
use pflegeheim_report::analysis::{self, kpi_summary};
use pflegeheim_report::config::ReportStyle;
use pflegeheim_report::error::AppError;
use pflegeheim_report::types::ResidentTable;
use pflegeheim_report::{loader, output, reports, util};
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, MutexGuard};
use tracing_subscriber::EnvFilter;

const DEFAULT_INPUT: &str = "pflegeheim_daten.xlsx";
const REPORT_FILE: &str = "pflegeheim_report.docx";
const PREVIEW_ROWS: usize = 10;

// The table survives between menu choices so it is loaded only once.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { table: None }));

struct AppState {
    table: Option<ResidentTable>,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

/// `None` once the input is closed or unreadable.
fn read_choice<R: BufRead>(input: &mut R) -> Option<String> {
    print!("Auswahl: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn loaded_table() -> Option<ResidentTable> {
    let table = state().table.clone();
    if table.is_none() {
        println!("Bitte lade zuerst eine Excel-Datei (Option 1).\n");
    }
    table
}

/// Option [1]. A failed load clears any earlier table.
fn handle_load(path: &str) {
    match loader::load_from_path(path) {
        Ok((table, report)) => {
            println!("✅ Datei erfolgreich geladen!");
            println!(
                "Blatt '{}': {} Zeilen eingelesen, {} leere Zeilen übersprungen.",
                report.sheet_name,
                util::format_int(table.len()),
                util::format_int(report.skipped_empty_rows)
            );
            if report.recognised_columns.is_empty() {
                println!("Hinweis: keine der Spalten Alter, Betreuungsbedarf, Abteilung, Einzelzimmer gefunden.");
            } else {
                println!("Erkannte Spalten: {}", report.recognised_columns.join(", "));
            }
            println!();
            state().table = Some(table);
        }
        Err(e) => {
            tracing::warn!(error = %e, path, "load failed");
            println!("❌ Fehler beim Einlesen der Datei: {}\n", e);
            state().table = None;
        }
    }
}

/// Option [2].
fn handle_overview() -> Result<(), AppError> {
    let Some(table) = loaded_table() else {
        return Ok(());
    };

    println!("📋 Datenvorschau\n");
    output::preview_table(&table, PREVIEW_ROWS);

    let kpis = kpi_summary(&table);
    output::preview_rows("Kennzahlen", &reports::kpi_rows(&kpis));
    println!("{}\n", output::kpi_json(&kpis)?);

    // Same sections, same order and same text as the Word report.
    for section in reports::build_sections(&table) {
        output::preview_rows(&section.heading, &output::aggregate_rows(&section.aggregate));
        println!("{}\n", section.narrative);
    }
    Ok(())
}

/// Option [3].
fn handle_single_rooms() {
    let Some(table) = loaded_table() else {
        return;
    };
    match analysis::single_room_only(&table) {
        Some(singles) => {
            println!("🏡 Bewohner im Einzelzimmer ({})\n", util::format_int(singles.len()));
            output::preview_table(&singles, singles.len());
        }
        None => println!("Die Datei enthält keine Spalte 'Einzelzimmer'.\n"),
    }
}

/// Option [4].
fn handle_export(style: &ReportStyle) -> Result<(), AppError> {
    let Some(table) = loaded_table() else {
        return Ok(());
    };
    println!("Erstelle Word-Bericht...");
    let bytes = reports::build_word_report(&table, style)?;
    output::write_bytes(REPORT_FILE, &bytes)?;
    println!("📄 Bericht gespeichert unter {}\n", REPORT_FILE);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let input = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_INPUT.to_string());
    let style = ReportStyle::default();
    let mut stdin = io::stdin().lock();

    loop {
        println!("🏥 Pflegeheim Musterdaten Analyse");
        println!("[1] Datei laden ({})", input);
        println!("[2] Auswertung anzeigen");
        println!("[3] Nur Einzelzimmer zeigen");
        println!("[4] Word-Bericht exportieren");
        println!("[5] Beenden\n");
        let Some(choice) = read_choice(&mut stdin) else {
            println!();
            break;
        };
        let result = match choice.as_str() {
            "1" => {
                handle_load(&input);
                Ok(())
            }
            "2" => handle_overview(),
            "3" => {
                handle_single_rooms();
                Ok(())
            }
            "4" => handle_export(&style),
            "5" => {
                println!("Programm beendet.");
                break;
            }
            _ => {
                println!("Ungültige Auswahl. Bitte 1 bis 5 eingeben.\n");
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "action failed");
            eprintln!("Fehler: {}\n", e);
        }
    }
}
