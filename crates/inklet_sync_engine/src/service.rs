//! Remote entity-service contract consumed by the orchestrator.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use inklet_sync_types::{ContentDraft, ContentEntity, ContentPatch};
use parking_lot::Mutex;
use std::collections::HashMap;

/// The narrow contract the orchestrator needs from the remote content
/// service.
///
/// This trait abstracts the API client, allowing different implementations
/// (HTTP client, platform SDK, mock for testing). The engine never
/// implements the remote side itself.
pub trait ContentService: Send + Sync {
    /// Creates a new entity remotely.
    fn create(&self, draft: &ContentDraft) -> ServiceResult<ContentEntity>;

    /// Applies a partial edit and returns the updated entity.
    fn update(&self, id: &str, patch: &ContentPatch) -> ServiceResult<ContentEntity>;

    /// Fetches the current remote entity, or `None` if it does not exist.
    fn get_by_id(&self, id: &str) -> ServiceResult<Option<ContentEntity>>;

    /// Deletes the entity remotely.
    fn delete(&self, id: &str) -> ServiceResult<()>;

    /// Publishes the entity.
    fn publish(&self, id: &str) -> ServiceResult<()>;

    /// Schedules the entity for publication at the given time.
    fn schedule(&self, id: &str, publish_at: DateTime<Utc>) -> ServiceResult<()>;
}

/// One call observed by [`MockContentService`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    /// `create` with the draft's id.
    Create(String),
    /// `update` with the target id.
    Update(String),
    /// `get_by_id` with the target id.
    GetById(String),
    /// `delete` with the target id.
    Delete(String),
    /// `publish` with the target id.
    Publish(String),
    /// `schedule` with the target id and time.
    Schedule(String, DateTime<Utc>),
}

/// A mock content service for testing.
///
/// Serves entities from an in-memory map, records every call, and can be
/// told to fail all mutating calls with a scripted error.
#[derive(Debug, Default)]
pub struct MockContentService {
    remote: Mutex<HashMap<String, ContentEntity>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_with: Mutex<Option<ServiceError>>,
}

impl MockContentService {
    /// Creates a new empty mock service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a remote entity.
    pub fn insert_remote(&self, entity: ContentEntity) {
        self.remote.lock().insert(entity.id.clone(), entity);
    }

    /// Returns the current remote view of an entity.
    pub fn remote_entity(&self, id: &str) -> Option<ContentEntity> {
        self.remote.lock().get(id).cloned()
    }

    /// Makes every subsequent call fail with `error` until cleared.
    pub fn set_failure(&self, error: ServiceError) {
        *self.fail_with.lock() = Some(error);
    }

    /// Clears a scripted failure.
    pub fn clear_failure(&self) {
        *self.fail_with.lock() = None;
    }

    /// Returns all calls observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: RecordedCall) -> ServiceResult<()> {
        self.calls.lock().push(call);
        match self.fail_with.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ContentService for MockContentService {
    fn create(&self, draft: &ContentDraft) -> ServiceResult<ContentEntity> {
        self.record(RecordedCall::Create(draft.id.clone()))?;
        let entity = ContentEntity {
            id: draft.id.clone(),
            title: draft.title.clone(),
            body: draft.body.clone(),
            updated_at: draft.updated_at,
        };
        self.remote.lock().insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    fn update(&self, id: &str, patch: &ContentPatch) -> ServiceResult<ContentEntity> {
        self.record(RecordedCall::Update(id.to_string()))?;
        let mut remote = self.remote.lock();
        let entity = remote
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        if let Some(title) = &patch.title {
            entity.title = title.clone();
        }
        if let Some(body) = &patch.body {
            entity.body = body.clone();
        }
        entity.updated_at = Utc::now();
        Ok(entity.clone())
    }

    fn get_by_id(&self, id: &str) -> ServiceResult<Option<ContentEntity>> {
        self.record(RecordedCall::GetById(id.to_string()))?;
        Ok(self.remote.lock().get(id).cloned())
    }

    fn delete(&self, id: &str) -> ServiceResult<()> {
        self.record(RecordedCall::Delete(id.to_string()))?;
        self.remote.lock().remove(id);
        Ok(())
    }

    fn publish(&self, id: &str) -> ServiceResult<()> {
        self.record(RecordedCall::Publish(id.to_string()))
    }

    fn schedule(&self, id: &str, publish_at: DateTime<Utc>) -> ServiceResult<()> {
        self.record(RecordedCall::Schedule(id.to_string(), publish_at))
    }
}
