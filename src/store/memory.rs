use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ RoleStore, RoleStoreProvider };
use crate::errors::GatewayError;
use crate::logging::Logger;
use crate::models::role::{ store_id, RoleDocument, STORE_ID_KEY };

/// Keeps roles in process memory, in insertion order. A caller-supplied `_id`
/// is kept as the identifier and must be unique, as in MongoDB.
#[derive(Clone)]
pub struct MemoryRoleStoreProvider {
    documents: Arc<Mutex<Vec<RoleDocument>>>,
    open_sessions: Arc<AtomicUsize>,
    logger: Arc<Logger>,
}

impl MemoryRoleStoreProvider {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            documents: Arc::new(Mutex::new(Vec::new())),
            open_sessions: Arc::new(AtomicUsize::new(0)),
            logger,
        }
    }

    /// Number of store handles currently checked out.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub async fn document_count(&self) -> usize {
        self.documents.lock().await.len()
    }
}

#[async_trait]
impl RoleStoreProvider for MemoryRoleStoreProvider {
    async fn open(&self) -> Result<Box<dyn RoleStore>, GatewayError> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(
            Box::new(MemoryRoleStore {
                documents: self.documents.clone(),
                open_sessions: self.open_sessions.clone(),
                logger: self.logger.clone(),
            })
        )
    }
}

struct MemoryRoleStore {
    documents: Arc<Mutex<Vec<RoleDocument>>>,
    open_sessions: Arc<AtomicUsize>,
    logger: Arc<Logger>,
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn add_role(&self, role: RoleDocument) -> Result<Option<RoleDocument>, GatewayError> {
        if role.is_empty() {
            self.logger.error("Role is empty. Cannot insert.");
            return Ok(None);
        }

        let id = match role.get(STORE_ID_KEY) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };

        let mut documents = self.documents.lock().await;
        if documents.iter().any(|d| store_id(d) == Some(id.as_str())) {
            let err = GatewayError::DuplicateRole(id);
            self.logger.error(format_args!("Failed to insert role: {}", err));
            return Err(err);
        }

        let mut saved = role;
        saved.insert(STORE_ID_KEY.to_string(), Value::String(id.clone()));
        documents.push(saved.clone());
        drop(documents);

        self.logger.info(format_args!("Role added successfully. ID: {}", id));
        Ok(Some(saved))
    }

    async fn get_roles(&self) -> Result<Vec<RoleDocument>, GatewayError> {
        Ok(self.documents.lock().await.clone())
    }
}

impl Drop for MemoryRoleStore {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
