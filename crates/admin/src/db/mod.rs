//! Database operations for the back office.
//!
//! The admin binary owns every write to the catalog, discounts, order
//! status, media metadata and store settings. It shares one schema with the
//! storefront; migrations live in the workspace `migrations/` directory and
//! are run via:
//! ```bash
//! cargo run -p pazar-cli -- migrate
//! ```

pub mod analytics;
pub mod customers;
pub mod discounts;
pub mod media;
pub mod orders;
pub mod product_types;
pub mod products;
pub mod properties;
pub mod settings;
pub mod variants;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use customers::CustomerRepository;
pub use discounts::DiscountRepository;
pub use media::MediaRepository;
pub use orders::OrderRepository;
pub use product_types::ProductTypeRepository;
pub use products::ProductRepository;
pub use properties::PropertyRepository;
pub use settings::SettingsRepository;
pub use variants::VariantRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

const MISSING_REFERENCE: &str = "referenced record does not exist";

impl RepositoryError {
    /// Map a unique violation to `Conflict(on_unique)`, everything else as in
    /// [`Self::from_write_refs`].
    pub(crate) fn from_write(err: sqlx::Error, on_unique: &str) -> Self {
        Self::from_write_refs(err, on_unique, MISSING_REFERENCE)
    }

    /// Map unique violations to `Conflict(on_unique)` and foreign-key
    /// violations to `Conflict(on_missing)`. Anything else is `Database`.
    pub(crate) fn from_write_refs(err: sqlx::Error, on_unique: &str, on_missing: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(on_unique.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(on_missing.to_string());
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards in the
/// term itself escaped.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Page window for list queries (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
}

impl PageWindow {
    pub const DEFAULT_PER_PAGE: u32 = 25;
    pub const MAX_PER_PAGE: u32 = 200;

    /// Clamp user-supplied paging parameters.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Total from the `COUNT(*) OVER ()` column of the first row.
    ///
    /// A page past the end has no row to carry the count; `None` means the
    /// caller has to count separately.
    #[must_use]
    pub fn window_total(&self, first_row_total: Option<i64>) -> Option<i64> {
        match first_row_total {
            Some(total) => Some(total),
            None if self.offset() > 0 => None,
            None => Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    /// Constraint failure as the driver would report it.
    #[derive(Debug)]
    struct Violation {
        foreign_key: bool,
    }

    impl std::fmt::Display for Violation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.message())
        }
    }

    impl std::error::Error for Violation {}

    impl DatabaseError for Violation {
        fn message(&self) -> &str {
            if self.foreign_key { "violates foreign key" } else { "duplicate key" }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.foreign_key {
                ErrorKind::ForeignKeyViolation
            } else {
                ErrorKind::UniqueViolation
            }
        }
    }

    fn violation(foreign_key: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(Violation { foreign_key }))
    }

    #[test]
    fn test_write_errors_name_the_violated_constraint() {
        let err = RepositoryError::from_write_refs(violation(false), "name taken", "no such type");
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m == "name taken"));

        let err = RepositoryError::from_write_refs(violation(true), "name taken", "no such type");
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m == "no such type"));

        let err = RepositoryError::from_write(violation(true), "name taken");
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m == MISSING_REFERENCE));

        let err = RepositoryError::from_write(sqlx::Error::RowNotFound, "name taken");
        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ivan"), "%ivan%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
    }

    #[test]
    fn test_page_window() {
        let w = PageWindow::new(None, None);
        assert_eq!((w.page, w.per_page), (1, PageWindow::DEFAULT_PER_PAGE));
        assert_eq!(w.offset(), 0);

        let w = PageWindow::new(Some(3), Some(10));
        assert_eq!(w.limit(), 10);
        assert_eq!(w.offset(), 20);

        let w = PageWindow::new(Some(0), Some(0));
        assert_eq!((w.page, w.per_page), (1, 1));
        assert_eq!(PageWindow::new(None, Some(5000)).per_page, PageWindow::MAX_PER_PAGE);
    }

    #[test]
    fn test_window_total_past_last_page() {
        let first = PageWindow::new(Some(1), Some(25));
        assert_eq!(first.window_total(Some(7)), Some(7));
        assert_eq!(first.window_total(None), Some(0));

        // 7 rows, page 3 of 25: nothing comes back, so the total is unknown
        let beyond = PageWindow::new(Some(3), Some(25));
        assert_eq!(beyond.window_total(Some(7)), Some(7));
        assert_eq!(beyond.window_total(None), None);
    }
}
