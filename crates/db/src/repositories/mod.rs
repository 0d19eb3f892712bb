//! Repositories wrapping the entity tables.
//!
//! Each repository owns an `Arc<DatabaseConnection>`. Writes that reference
//! other rows check those references and write inside one transaction.

pub mod category;
pub mod comment;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod rating;
pub mod refresh_token;
pub mod section;
pub mod user;

pub use category::CategoryRepository;
pub use comment::{CommentFilter, CommentRepository};
pub use course::{CourseChanges, CourseFilter, CourseRepository};
pub use enrollment::{EnrollmentFilter, EnrollmentRepository};
pub use lesson::{LessonChanges, LessonFilter, LessonRepository};
pub use rating::{RatingFilter, RatingRepository};
pub use refresh_token::RefreshTokenRepository;
pub use section::{SectionChanges, SectionFilter, SectionRepository};
pub use user::UserRepository;

use lms_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoSimpleExpr, Order, PrimaryKeyTrait,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Func, Iden, LikeExpr, SimpleExpr},
};

/// One requested sort key of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Public field name, e.g. `title`.
    pub field: String,
    /// Sort descending (`-title`).
    pub descending: bool,
}

/// Search, ordering and paging shared by every list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Case-insensitive substring to match against the resource's search field.
    pub search: Option<String>,
    /// Sort keys in priority order.
    pub ordering: Vec<SortKey>,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

impl ListOptions {
    /// Parse a comma-separated ordering parameter such as `-created_at,title`.
    ///
    /// Blank segments are dropped; unknown names are kept here and ignored by
    /// the repository that resolves them.
    #[must_use]
    pub fn parse_ordering(raw: &str) -> Vec<SortKey> {
        raw.split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| {
                let (field, descending) = segment
                    .strip_prefix('-')
                    .map_or((segment, false), |field| (field, true));
                let field = field.trim();
                (!field.is_empty()).then(|| SortKey {
                    field: field.to_string(),
                    descending,
                })
            })
            .collect()
    }

    /// Lowercased `LIKE` pattern for the search term, if there is one.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{escaped}%"))
    }
}

/// `LOWER(table.column) LIKE pattern`, portable across `PostgreSQL` and `SQLite`.
pub(crate) fn icontains<E, C>(entity: E, column: C, pattern: &str) -> SimpleExpr
where
    E: Iden + 'static,
    C: Iden + 'static,
{
    Expr::expr(Func::lower(Expr::col((entity, column))))
        .like(LikeExpr::new(pattern.to_string()).escape('\\'))
}

/// Apply the resolvable sort keys, then `tiebreak` ascending.
pub(crate) fn apply_ordering<Q, C, F>(mut query: Q, ordering: &[SortKey], resolve: F, tiebreak: C) -> Q
where
    Q: QueryOrder,
    C: ColumnTrait,
    F: Fn(&str) -> Option<C>,
{
    for key in ordering {
        if let Some(column) = resolve(&key.field) {
            let order = if key.descending {
                Order::Desc
            } else {
                Order::Asc
            };
            query = query.order_by(column.into_simple_expr(), order);
        }
    }
    query.order_by(tiebreak.into_simple_expr(), Order::Asc)
}

/// Apply `limit`/`offset` when present.
pub(crate) fn apply_paging<Q: QuerySelect>(mut query: Q, options: &ListOptions) -> Q {
    if let Some(offset) = options.offset {
        query = query.offset(offset);
    }
    if let Some(limit) = options.limit {
        query = query.limit(limit);
    }
    query
}

/// Fail with a field error unless a row of `E` with primary key `id` exists.
pub(crate) async fn ensure_exists<E, C>(conn: &C, id: &str, field: &str) -> AppResult<()>
where
    E: EntityTrait,
    String: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    C: ConnectionTrait,
{
    let found = E::find_by_id(id.to_string())
        .one(conn)
        .await
        .map_err(db_err)?;

    if found.is_none() {
        return Err(AppError::missing_reference(field, id));
    }
    Ok(())
}

pub(crate) fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}
