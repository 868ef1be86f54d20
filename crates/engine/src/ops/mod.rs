use sea_orm::{DatabaseConnection, DbErr, SqlErr};

use crate::{EngineError, MoneyCents, ResultEngine};

mod clients;
mod commissions;
mod courses;
mod refunds;
mod reports;
mod sales;

pub use clients::{ClientInput, ImportReport, ImportRowError, IMPORT_COLUMNS};
pub use courses::{CourseInput, CoursePage, CourseQuery, EXPORT_PAGE_SIZE, SortOrder};
pub use reports::{ClientReportRow, SaleReportRow};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
///
/// The transaction is the only session an operation ever holds; it is
/// released on every path (commit, rollback or drop).
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = async { $body }.await;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = $tx.rollback().await {
                    tracing::warn!("rollback failed after \"{err}\": {rollback_err}");
                }
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of the business rules: every public method is one operation,
/// running inside its own transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn require_positive(amount: MoneyCents, label: &str) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::Validation(format!("{label} must be > 0")));
    }
    Ok(())
}

/// Lowercased search term, or `None` when there is nothing to filter on.
fn search_needle(search: Option<&str>) -> Option<String> {
    search.filter(|s| !s.is_empty()).map(str::to_lowercase)
}

/// Literal, case-insensitive substring match of `needle` (already
/// lowercased) against any of `fields`.
///
/// SQLite `LOWER` folds ASCII only, so the match runs on loaded rows. `%` and
/// `_` in the term are plain characters.
fn matches_any(needle: &str, fields: &[&str]) -> bool {
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// A unique-index violation on write means `key` was taken between the
/// existence check and the statement.
fn map_unique(err: DbErr, key: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(key.to_string()),
        _ => EngineError::from(err),
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
