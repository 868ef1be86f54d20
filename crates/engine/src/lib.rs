//! Business rules for the course sales back office.
//!
//! [`Engine`] is the only entry point: one async method per operation, each
//! running in its own database transaction and returning either the
//! persisted record or an [`EngineError`] whose message can be shown to the
//! user as is.

pub use clients::Client;
pub use commissions::Commission;
pub use courses::Course;
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    ClientInput, ClientReportRow, CourseInput, CoursePage, CourseQuery, EXPORT_PAGE_SIZE, Engine,
    EngineBuilder, IMPORT_COLUMNS, ImportReport, ImportRowError, SaleReportRow, SortOrder,
};
pub use percentage::Percentage;
pub use refunds::Refund;
pub use sales::Sale;
pub use tabular::{COURSES_SHEET, ExportFormat};

pub mod clients;
pub mod commissions;
pub mod courses;
pub mod partners;
pub mod refunds;
pub mod sales;

mod error;
mod money;
mod ops;
mod percentage;
mod tabular;

type ResultEngine<T> = Result<T, EngineError>;
