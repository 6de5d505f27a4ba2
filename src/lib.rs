//! Analysis and Word reporting for care-home resident spreadsheets.
//!
//! The pipeline is: [`loader`] turns an xlsx file into a
//! [`types::ResidentTable`], [`analysis`] aggregates the recognised
//! columns, [`narrative`] phrases the results, [`charts`] draws them and
//! [`reports`] lays everything out as a [`docx::WordDocument`].

pub mod analysis;
pub mod charts;
pub mod config;
pub mod docx;
pub mod error;
pub mod loader;
pub mod narrative;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
