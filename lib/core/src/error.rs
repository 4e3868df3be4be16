//! The `Result` alias shared by the boxoffice crates.
//!
//! Each crate keeps its own error enum and returns it inside a
//! [`rootcause::Report`], so the alias only fixes the carrier.

use rootcause::Report;

/// `Result` whose error is a report over the context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
