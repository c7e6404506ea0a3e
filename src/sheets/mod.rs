//! Spreadsheet operations: the Sheets API client and the tool-level
//! argument resolution on top of it.

pub mod client;
pub mod ops;

pub use client::{AppendResult, SheetsClient};
pub use ops::{AppendArgs, ReadArgs};
