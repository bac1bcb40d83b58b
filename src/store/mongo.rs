use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{ self, doc, Bson, Document };
use mongodb::{ Client, Collection };
use serde_json::Value;
use std::sync::Arc;

use super::{ RoleStore, RoleStoreProvider };
use crate::errors::GatewayError;
use crate::logging::Logger;
use crate::models::role::{ RoleDocument, STORE_ID_KEY };

pub struct MongoRoleStoreProvider {
    uri: String,
    database: String,
    collection: String,
    logger: Arc<Logger>,
}

impl MongoRoleStoreProvider {
    pub fn new(uri: String, database: String, collection: String, logger: Arc<Logger>) -> Self {
        Self {
            uri,
            database,
            collection,
            logger,
        }
    }
}

#[async_trait]
impl RoleStoreProvider for MongoRoleStoreProvider {
    async fn open(&self) -> Result<Box<dyn RoleStore>, GatewayError> {
        let client = Client::with_uri_str(&self.uri).await.map_err(|e| {
            self.logger.error(format_args!("Failed to create MongoDB client: {}", e));
            GatewayError::Store(e)
        })?;

        Ok(
            Box::new(MongoRoleStore {
                client,
                database: self.database.clone(),
                collection: self.collection.clone(),
                logger: self.logger.clone(),
            })
        )
    }
}

struct MongoRoleStore {
    client: Client,
    database: String,
    collection: String,
    logger: Arc<Logger>,
}

impl MongoRoleStore {
    fn personas(&self) -> Collection<Document> {
        self.client.database(&self.database).collection::<Document>(&self.collection)
    }

    fn log_failure(&self, action: &str, err: GatewayError) -> GatewayError {
        self.logger.error(format_args!("Failed to {}: {}", action, err));
        err
    }
}

pub(crate) fn display_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts a stored document into the JSON shape returned to callers, with
/// the identifier rendered as a string.
pub(crate) fn to_role_document(mut document: Document) -> Option<RoleDocument> {
    let id = document.get(STORE_ID_KEY).map(display_id).unwrap_or_default();
    document.insert(STORE_ID_KEY, id);
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[async_trait]
impl RoleStore for MongoRoleStore {
    async fn add_role(&self, role: RoleDocument) -> Result<Option<RoleDocument>, GatewayError> {
        if role.is_empty() {
            self.logger.error("Role is empty. Cannot insert.");
            return Ok(None);
        }

        let document = bson::to_document(&role).map_err(|e| self.log_failure("encode role", e.into()))?;
        let result = self
            .personas()
            .insert_one(document, None).await
            .map_err(|e| self.log_failure("insert role", e.into()))?;

        let id = display_id(&result.inserted_id);
        self.logger.info(format_args!("Role added successfully. ID: {}", id));

        let mut saved = role;
        saved.insert(STORE_ID_KEY.to_string(), Value::String(id));
        Ok(Some(saved))
    }

    async fn get_roles(&self) -> Result<Vec<RoleDocument>, GatewayError> {
        let mut cursor = self
            .personas()
            .find(doc! {}, None).await
            .map_err(|e| self.log_failure("query roles", e.into()))?;

        let mut roles = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(|e| self.log_failure("read roles", e.into()))? {
            roles.extend(to_role_document(document));
        }
        Ok(roles)
    }
}

impl Drop for MongoRoleStore {
    fn drop(&mut self) {
        let client = self.client.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    client.shutdown().await;
                });
            }
            Err(_) => drop(client),
        }
    }
}
