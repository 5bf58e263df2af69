//! In-memory store for testing the form engine without a real backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use formscore_core::error::StoreError;
use formscore_core::model::{FormDefinition, SubmittedResponse};
use formscore_core::traits::FormStore;

/// A mock remote store backed by hash maps.
///
/// Tracks how many calls were made and can be switched into an offline
/// mode where every operation fails with `StoreError::Unavailable`, to
/// exercise the engine's local-first degradation paths.
#[derive(Default)]
pub struct MemoryStore {
    forms: Mutex<HashMap<String, FormDefinition>>,
    responses: Mutex<Vec<SubmittedResponse>>,
    call_count: AtomicU32,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store with form rows.
    pub fn with_forms(forms: Vec<FormDefinition>) -> Self {
        let store = Self::default();
        {
            let mut map = store.forms.lock().unwrap();
            for form in forms {
                map.insert(form.id.clone(), form);
            }
        }
        store
    }

    /// Switch the simulated outage on or off.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Number of store calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Number of form rows currently stored.
    pub fn form_count(&self) -> usize {
        self.forms.lock().unwrap().len()
    }

    /// Number of response rows currently stored.
    pub fn response_count(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    fn touch(&self) -> Result<(), StoreError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) {
            Err(StoreError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FormStore for MemoryStore {
    async fn insert_form(&self, form: &FormDefinition) -> Result<(), StoreError> {
        self.touch()?;
        self.forms
            .lock()
            .unwrap()
            .insert(form.id.clone(), form.clone());
        Ok(())
    }

    async fn update_form(&self, form: &FormDefinition) -> Result<(), StoreError> {
        self.touch()?;
        let mut forms = self.forms.lock().unwrap();
        if !forms.contains_key(&form.id) {
            return Err(StoreError::NotFound(form.id.clone()));
        }
        forms.insert(form.id.clone(), form.clone());
        Ok(())
    }

    async fn delete_form(&self, form_id: &str) -> Result<(), StoreError> {
        self.touch()?;
        self.forms.lock().unwrap().remove(form_id);
        Ok(())
    }

    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, StoreError> {
        self.touch()?;
        self.forms
            .lock()
            .unwrap()
            .get(form_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(form_id.to_string()))
    }

    async fn fetch_all_forms(&self) -> Result<Vec<FormDefinition>, StoreError> {
        self.touch()?;
        Ok(self.forms.lock().unwrap().values().cloned().collect())
    }

    async fn insert_response(&self, response: &SubmittedResponse) -> Result<(), StoreError> {
        self.touch()?;
        self.responses.lock().unwrap().push(response.clone());
        Ok(())
    }

    async fn fetch_responses(&self, form_id: &str) -> Result<Vec<SubmittedResponse>, StoreError> {
        self.touch()?;
        Ok(self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.form_id == form_id)
            .cloned()
            .collect())
    }

    async fn delete_responses(&self, form_id: &str) -> Result<(), StoreError> {
        self.touch()?;
        self.responses
            .lock()
            .unwrap()
            .retain(|r| r.form_id != form_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn form(id: &str) -> FormDefinition {
        FormDefinition {
            id: id.into(),
            title: "T".into(),
            description: String::new(),
            fields: vec![],
            is_private: false,
            owner_id: "o@x.com".into(),
            collaborators: vec![],
            allowed_users: vec![],
            access_token: String::new(),
            show_total_score: false,
            score_ranges: vec![],
            allow_view_own_responses: true,
            allow_edit_own_responses: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trip_and_call_counting() {
        let store = MemoryStore::new();
        store.insert_form(&form("f1")).await.unwrap();

        let fetched = store.fetch_form("f1").await.unwrap();
        assert_eq!(fetched.id, "f1");
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn update_missing_form_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_form(&form("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn offline_mode_fails_everything() {
        let store = MemoryStore::with_forms(vec![form("f1")]);
        store.set_offline(true);

        assert!(store.fetch_form("f1").await.unwrap_err().is_unavailable());
        assert!(store.fetch_all_forms().await.unwrap_err().is_unavailable());

        store.set_offline(false);
        assert!(store.fetch_form("f1").await.is_ok());
    }
}
