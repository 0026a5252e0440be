//! # Domain Models
//!
//! Canonical domain types for findash statement retrieval.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TickerSymbol`] | Validated ticker, `[A-Z0-9.]{1,6}` |
//! | [`StatementType`] | quote, statements, ratios, key metrics, overview, price history |
//! | [`Period`] | annual, quarterly or trailing-twelve-month period |
//! | [`StatementRequest`] | cache key: ticker + statement type + period |
//! | [`CanonicalRecord`] | normalized line items plus provenance metadata |
//! | [`LineItem`] / [`LineValue`] | canonical field name and value-or-unavailable |
//! | [`PeriodSnapshot`] | line items of an earlier period kept on the record |
//! | [`ProfileField`] | descriptive company text on overview records |
//! | [`UtcDateTime`] / [`FiscalDate`] | retrieval timestamp and fiscal period end |
//!
//! Construction validates invariants, so a `TickerSymbol` in hand is always
//! allow-listed and a `StatementRequest` always carries a normalized period.

mod record;
mod statement;
mod ticker;
mod timestamp;

pub use record::{
    validate_currency_code, CanonicalRecord, CanonicalRecordBuilder, LineItem, LineValue,
    PeriodSnapshot, ProfileField,
};
pub use statement::{Period, StatementRequest, StatementType};
pub use ticker::TickerSymbol;
pub use timestamp::{FiscalDate, UtcDateTime};
