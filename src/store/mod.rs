mod memory;
mod mongo;

pub use memory::MemoryRoleStoreProvider;
pub use mongo::MongoRoleStoreProvider;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{ Settings, StoreType };
use crate::errors::GatewayError;
use crate::logging::Logger;
use crate::models::role::RoleDocument;

/// A request-scoped handle onto the role collection. Dropping the handle
/// releases whatever connection it holds.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Inserts `role` and returns it with the store-assigned identifier added.
    /// An empty payload is logged and yields `None` without touching the store.
    async fn add_role(&self, role: RoleDocument) -> Result<Option<RoleDocument>, GatewayError>;

    /// Every stored role, identifiers rendered as strings, in store order.
    async fn get_roles(&self) -> Result<Vec<RoleDocument>, GatewayError>;
}

#[async_trait]
pub trait RoleStoreProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RoleStore>, GatewayError>;
}

pub fn create_role_store_provider(
    settings: &Settings,
    logger: Arc<Logger>
) -> Arc<dyn RoleStoreProvider> {
    match settings.role_store_type {
        StoreType::Mongodb => {
            logger.info(
                format_args!(
                    "Roles will be stored in MongoDB at {} ({}.{})",
                    settings.mongodb_uri,
                    settings.mongodb_database,
                    settings.mongodb_collection
                )
            );
            Arc::new(
                MongoRoleStoreProvider::new(
                    settings.mongodb_uri.clone(),
                    settings.mongodb_database.clone(),
                    settings.mongodb_collection.clone(),
                    logger
                )
            )
        }
        StoreType::Memory => {
            logger.warn("Roles will be kept in memory and lost on restart");
            Arc::new(MemoryRoleStoreProvider::new(logger))
        }
    }
}
