//! Category Use Cases

use std::sync::Arc;

use chrono::Utc;
use kernel::id::CategoryId;

use crate::domain::entity::Category;
use crate::domain::repository::CategoryRepository;
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

pub struct ListCategoriesUseCase<C>
where
    C: CategoryRepository,
{
    categories: Arc<C>,
}

impl<C> ListCategoriesUseCase<C>
where
    C: CategoryRepository,
{
    pub fn new(categories: Arc<C>) -> Self {
        Self { categories }
    }

    pub async fn execute(&self) -> CatalogResult<Vec<Category>> {
        self.categories.list_categories().await
    }
}

pub struct GetCategoryUseCase<C>
where
    C: CategoryRepository,
{
    categories: Arc<C>,
}

impl<C> GetCategoryUseCase<C>
where
    C: CategoryRepository,
{
    pub fn new(categories: Arc<C>) -> Self {
        Self { categories }
    }

    pub async fn execute(&self, id: &CategoryId) -> CatalogResult<Category> {
        self.categories
            .find_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)
    }
}

pub struct CreateCategoryUseCase<C>
where
    C: CategoryRepository,
{
    categories: Arc<C>,
}

impl<C> CreateCategoryUseCase<C>
where
    C: CategoryRepository,
{
    pub fn new(categories: Arc<C>) -> Self {
        Self { categories }
    }

    /// Name and slug are both unique. A clash surfaces as `CategoryExists`.
    pub async fn execute(&self, input: CategoryInput) -> CatalogResult<Category> {
        let category = Category::new(input.name, input.description, Utc::now());
        if category.slug.is_empty() {
            return Err(kernel::AppError::bad_request(
                "Validation failed: name must contain letters or digits",
            )
            .into());
        }
        self.categories.create_category(&category).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }
}

pub struct UpdateCategoryUseCase<C>
where
    C: CategoryRepository,
{
    categories: Arc<C>,
}

impl<C> UpdateCategoryUseCase<C>
where
    C: CategoryRepository,
{
    pub fn new(categories: Arc<C>) -> Self {
        Self { categories }
    }

    pub async fn execute(
        &self,
        id: &CategoryId,
        name: Option<String>,
        description: Option<String>,
    ) -> CatalogResult<Category> {
        let mut category = self
            .categories
            .find_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound)?;
        let now = Utc::now();
        if let Some(name) = name {
            category.rename(&name, now);
        }
        if let Some(description) = description {
            category.description = Some(description);
            category.updated_at = now;
        }
        self.categories.update_category(&category).await?;
        Ok(category)
    }
}

pub struct DeleteCategoryUseCase<C>
where
    C: CategoryRepository,
{
    categories: Arc<C>,
}

impl<C> DeleteCategoryUseCase<C>
where
    C: CategoryRepository,
{
    pub fn new(categories: Arc<C>) -> Self {
        Self { categories }
    }

    /// Products in the category keep existing without one.
    pub async fn execute(&self, id: &CategoryId) -> CatalogResult<()> {
        if !self.categories.delete_category(id).await? {
            return Err(CatalogError::CategoryNotFound);
        }
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
