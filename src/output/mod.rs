//! Output module
//!
//! Exports normalized crash records to CSV files on disk.

mod csv_export;

pub use csv_export::{
    dir_name, CsvExporter, CRASHES_FILE, PARTICIPANTS_FILE, VEHICLES_FILE,
};
