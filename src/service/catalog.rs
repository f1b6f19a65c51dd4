use uuid::Uuid;
use validator::Validate;

use super::Storefront;
use crate::auth::Caller;
use crate::domain::aggregates::{Category, CategoryDraft, Product, ProductDraft, ProductFilter};
use crate::domain::events::DomainEvent;
use crate::{Result, StorefrontError};

impl Storefront {
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.store.list_products(filter).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.store.get_product(id).await?.ok_or_else(|| StorefrontError::not_found("Product not found"))
    }

    pub async fn create_product(&self, caller: Option<&Caller>, draft: ProductDraft) -> Result<Product> {
        self.require_admin(caller).await?;
        draft.validate()?;
        let product = Product::create(draft)?;
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, caller: Option<&Caller>, id: Uuid, draft: ProductDraft) -> Result<Product> {
        self.require_admin(caller).await?;
        draft.validate()?;
        let mut product = self.get_product(id).await?;
        product.apply(draft)?;
        if !self.store.update_product(&product).await? {
            return Err(StorefrontError::not_found("Product not found"));
        }
        Ok(product)
    }

    pub async fn delete_product(&self, caller: Option<&Caller>, id: Uuid) -> Result<()> {
        self.require_admin(caller).await?;
        if !self.store.delete_product(id).await? {
            return Err(StorefrontError::not_found("Product not found"));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.store.list_categories().await
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category> {
        self.store.get_category(id).await?.ok_or_else(|| StorefrontError::not_found("Category not found"))
    }

    pub async fn create_category(&self, caller: Option<&Caller>, draft: CategoryDraft) -> Result<Category> {
        self.require_admin(caller).await?;
        draft.validate()?;
        let category = Category::create(draft);
        self.store.insert_category(&category).await?;
        Ok(category)
    }

    /// Renaming cascades to every product filed under the old name.
    pub async fn update_category(&self, caller: Option<&Caller>, id: Uuid, draft: CategoryDraft) -> Result<Category> {
        self.require_admin(caller).await?;
        draft.validate()?;
        let update = self.store.update_category(id, &draft).await?
            .ok_or_else(|| StorefrontError::not_found("Category not found"))?;
        if update.previous_name != update.category.name {
            tracing::info!(from = %update.previous_name, to = %update.category.name, products = update.products_renamed, "category renamed");
            self.events.publish(DomainEvent::CategoryRenamed {
                category_id: id, from: update.previous_name.clone(), to: update.category.name.clone(),
                products: update.products_renamed,
            }).await;
        }
        Ok(update.category)
    }

    pub async fn delete_category(&self, caller: Option<&Caller>, id: Uuid) -> Result<()> {
        self.require_admin(caller).await?;
        if !self.store.delete_category(id).await? {
            return Err(StorefrontError::not_found("Category not found"));
        }
        Ok(())
    }

    /// Inserts the default grocery categories that are missing. Super admin only.
    pub async fn seed_categories(&self, caller: Option<&Caller>) -> Result<usize> {
        self.require_super_admin(caller)?;
        let mut inserted = 0;
        for category in Category::defaults() {
            if self.store.insert_category_if_absent(&category).await? {
                inserted += 1;
            }
        }
        tracing::info!(inserted, "default categories seeded");
        Ok(inserted)
    }
}
