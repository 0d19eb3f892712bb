//! Category repository.

use std::sync::Arc;

use lms_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::{ListOptions, apply_ordering, apply_paging, db_err, icontains};
use crate::entities::{Category, category};

/// Repository for category operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find category by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<category::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))
    }

    /// List categories, searchable and orderable by name.
    pub async fn list(&self, options: &ListOptions) -> AppResult<Vec<category::Model>> {
        let mut query = Category::find();

        if let Some(pattern) = options.search_pattern() {
            query = query.filter(icontains(Category, category::Column::Name, &pattern));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "name" => Some(category::Column::Name),
                _ => None,
            },
            category::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new category.
    pub async fn create(&self, id: String, name: String) -> AppResult<category::Model> {
        let model = category::ActiveModel {
            id: Set(id),
            name: Set(name),
        };

        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Rename a category.
    pub async fn update(&self, id: &str, name: String) -> AppResult<category::Model> {
        let category = self.get_by_id(id).await?;

        let mut active: category::ActiveModel = category.into();
        active.name = Set(name);

        active.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Delete a category (and its courses due to CASCADE).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Category not found: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_category(id: &str, name: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let category = create_test_category("cat1", "Programming");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category.clone()]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.find_by_id("cat1").await.unwrap();

        assert_eq!(result, Some(category));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_returns_rows() {
        let rows = vec![
            create_test_category("cat1", "Art"),
            create_test_category("cat2", "Music"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows.clone()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let options = ListOptions {
            search: Some("a".to_string()),
            ordering: ListOptions::parse_ordering("-name"),
            ..Default::default()
        };
        let result = repo.list(&options).await.unwrap();

        assert_eq!(result, rows);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.delete("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
