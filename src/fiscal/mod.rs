//! Fiscal ledger: gapless per-tenant series numbers, user-scoped
//! fiscal-day lifecycle, X/Z reports, and the tax engine.

pub mod day;
pub mod models;
pub mod reports;
pub mod series;
pub mod tax;
pub mod tax_config;

pub use day::FiscalDayRepository;
pub use models::{FiscalDay, FiscalReport, FiscalSeries, ReportType, TaxCalculationHistory, TaxConfig, TaxType};
pub use reports::ReportGenerator;
pub use series::FiscalSeriesAllocator;
pub use tax::TaxEngine;
pub use tax_config::TaxConfigRepository;
