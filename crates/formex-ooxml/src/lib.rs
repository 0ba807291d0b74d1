//! Minimal OOXML writers.
//!
//! Hand-built generators for the three Office package formats the exporters
//! emit: spreadsheets ([`xlsx::Workbook`]), slide decks ([`pptx::Deck`]) and
//! documents ([`docx::Document`]). Each builds its XML parts directly and
//! packs them into a zip container; no shared-string tables, themes beyond
//! the static minimum, or layout negotiation.
//!
//! # Example
//!
//! ```
//! use formex_ooxml::xlsx::{Cell, Sheet, Workbook};
//!
//! let mut sheet = Sheet::new("Results").with_frozen_header();
//! sheet.push_row(vec![Cell::text("question"), Cell::text("answer")]);
//! sheet.push_row(vec![Cell::text("plan"), Cell::text("Pro")]);
//!
//! let mut workbook = Workbook::new();
//! workbook.add_sheet(sheet);
//! let bytes = workbook.write_to_bytes().unwrap();
//! assert_eq!(&bytes[..2], b"PK");
//! ```

pub mod docx;
mod error;
mod package;
pub mod pptx;
pub mod xlsx;

pub use error::{OoxmlError, Result};
pub use package::Package;
