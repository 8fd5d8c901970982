//! MongoDB persistence for the platform service.
//!
//! Uniqueness of `users.email` and `orders.order_number` is enforced
//! here, at the storage layer, via unique indexes.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::doc, options::FindOptions, options::IndexOptions, Client as MongoClient, Collection,
    Database, IndexModel,
};
use platform_core::error::AppError;

use crate::models::{Order, Product, ProductStatus, Role, SubscriptionPlan, User};
use crate::services::access_control::IdentityStore;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users().create_index(email_index, None).await?;
        tracing::info!("Created unique index on users.email");

        let order_number_index = IndexModel::builder()
            .keys(doc! { "order_number": 1 })
            .options(
                IndexOptions::builder()
                    .name("order_number_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.orders().create_index(order_number_index, None).await?;
        tracing::info!("Created unique index on orders.order_number");

        let customer_index = IndexModel::builder()
            .keys(doc! { "customer_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("customer_orders".to_string())
                    .build(),
            )
            .build();
        self.orders().create_index(customer_index, None).await?;

        let catalog_index = IndexModel::builder()
            .keys(doc! { "status": 1, "category": 1 })
            .options(
                IndexOptions::builder()
                    .name("catalog_lookup".to_string())
                    .build(),
            )
            .build();
        self.products().create_index(catalog_index, None).await?;

        let vendor_index = IndexModel::builder()
            .keys(doc! { "vendor_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("vendor_products".to_string())
                    .build(),
            )
            .build();
        self.products().create_index(vendor_index, None).await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    pub fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }

    // ==================== User operations ====================

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(doc! { "email": email.to_lowercase() }, None)
            .await?)
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    /// Record a successful login: bump the counter and timestamp.
    pub async fn record_login(&self, user_id: &str) -> Result<(), AppError> {
        self.users()
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$set": { "last_login": mongodb::bson::DateTime::now() },
                    "$inc": { "login_count": 1 },
                },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn update_user_role(&self, user_id: &str, role: Role) -> Result<bool, AppError> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "role": role.as_str(),
                    "updated_at": mongodb::bson::DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Flip the vendor flag on; first product listing turns an account
    /// into a vendor.
    pub async fn mark_vendor(&self, user_id: &str) -> Result<(), AppError> {
        self.users()
            .update_one(
                doc! { "_id": user_id, "is_vendor": false },
                doc! { "$set": {
                    "is_vendor": true,
                    "updated_at": mongodb::bson::DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn set_user_status(&self, user_id: &str, is_active: bool) -> Result<bool, AppError> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "is_active": is_active,
                    "updated_at": mongodb::bson::DateTime::now(),
                } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Paginated account listing for moderation, newest first.
    pub async fn list_users(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
        subscription: Option<SubscriptionPlan>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<User>, u64), AppError> {
        let mut filter = doc! {};
        if let Some(search) = search {
            filter.insert(
                "$or",
                vec![
                    doc! { "first_name": { "$regex": search, "$options": "i" } },
                    doc! { "last_name": { "$regex": search, "$options": "i" } },
                    doc! { "email": { "$regex": search, "$options": "i" } },
                ],
            );
        }
        if let Some(is_active) = is_active {
            filter.insert("is_active", is_active);
        }
        if let Some(subscription) = subscription {
            filter.insert("subscription_plan", subscription.as_str());
        }

        let total = self.users().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * page_size)
            .limit(page_size as i64)
            .build();
        let users: Vec<User> = self
            .users()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;

        Ok((users, total))
    }

    // ==================== Product operations ====================

    pub async fn find_product_by_id(&self, id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.products().find_one(doc! { "_id": id }, None).await?)
    }

    /// Published products only, newest first.
    pub async fn list_published_products(
        &self,
        category: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Product>, u64), AppError> {
        let mut filter = doc! { "status": "published" };
        if let Some(category) = category {
            filter.insert("category", category);
        }

        let total = self.products().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * page_size)
            .limit(page_size as i64)
            .build();
        let products: Vec<Product> = self
            .products()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;

        Ok((products, total))
    }

    pub async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        self.products().insert_one(product, None).await?;
        Ok(())
    }

    /// Look up a product, but only if the given vendor owns it.
    pub async fn find_vendor_product(
        &self,
        id: &str,
        vendor_id: &str,
    ) -> Result<Option<Product>, AppError> {
        Ok(self
            .products()
            .find_one(doc! { "_id": id, "vendor_id": vendor_id }, None)
            .await?)
    }

    pub async fn replace_product(&self, product: &Product) -> Result<(), AppError> {
        self.products()
            .replace_one(doc! { "_id": &product.id }, product, None)
            .await?;
        Ok(())
    }

    pub async fn delete_vendor_product(
        &self,
        id: &str,
        vendor_id: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .products()
            .delete_one(doc! { "_id": id, "vendor_id": vendor_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    /// A vendor's own listings across every status, newest first.
    pub async fn list_vendor_products(
        &self,
        vendor_id: &str,
        status: Option<ProductStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Product>, u64), AppError> {
        let mut filter = doc! { "vendor_id": vendor_id };
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }

        let total = self.products().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * page_size)
            .limit(page_size as i64)
            .build();
        let products: Vec<Product> = self
            .products()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;

        Ok((products, total))
    }

    // ==================== Order operations ====================

    pub async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders().insert_one(order, None).await.map_err(|e| {
            // The unique index turns an order-number collision into a
            // write error rather than a silent duplicate.
            tracing::error!(order_number = %order.order_number, "Order insert failed: {}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    pub async fn list_orders_for_customer(
        &self,
        customer_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Order>, u64), AppError> {
        let filter = doc! { "customer_id": customer_id };

        let total = self.orders().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * page_size)
            .limit(page_size as i64)
            .build();
        let orders: Vec<Order> = self
            .orders()
            .find(filter, options)
            .await?
            .try_collect()
            .await?;

        Ok((orders, total))
    }

    // ==================== Dashboard counts ====================

    pub async fn count_users(&self) -> Result<u64, AppError> {
        Ok(self.users().count_documents(None, None).await?)
    }

    pub async fn count_active_users(&self) -> Result<u64, AppError> {
        Ok(self
            .users()
            .count_documents(doc! { "is_active": true }, None)
            .await?)
    }

    pub async fn count_admin_tier_users(&self) -> Result<u64, AppError> {
        let roles: Vec<&str> = Role::ADMIN_TIER.iter().map(|r| r.as_str()).collect();
        Ok(self
            .users()
            .count_documents(doc! { "role": { "$in": roles } }, None)
            .await?)
    }

    pub async fn count_orders(&self) -> Result<u64, AppError> {
        Ok(self.orders().count_documents(None, None).await?)
    }

    pub async fn count_published_products(&self) -> Result<u64, AppError> {
        Ok(self
            .products()
            .count_documents(doc! { "status": "published" }, None)
            .await?)
    }
}

#[async_trait]
impl IdentityStore for MongoDb {
    async fn find_identity_by_id(&self, id: &str) -> Result<Option<User>, anyhow::Error> {
        self.find_user_by_id(id)
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))
    }
}
