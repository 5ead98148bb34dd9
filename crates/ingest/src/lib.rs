//! `remanet-ingest` -- offline bulk loader for cold-spray CSV exports.
//!
//! The machine exports one folder per day (`YYYY-MM-DD`) containing a
//! `coldspray/` directory of semicolon-separated CSV files. This crate
//! parses those exports and batch-inserts them into the `coldspray`
//! table the API server reads from.

pub mod parse;
