//! Form state synchronizer.
//!
//! Bridges the local cache of form and response records with the
//! authoritative remote store, and enforces data-quality invariants on
//! every write. All operations run as single-threaded cooperative tasks;
//! the only suspension points are the remote store calls.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{CacheError, EngineError, StoreError};
use crate::feedback::resolve_feedback;
use crate::model::{
    FormDefinition, FormDraft, FormPatch, ResponseSet, SubmittedResponse,
};
use crate::scoring::compute_total_score;
use crate::traits::{CacheStore, FormStore, FORMS_SNAPSHOT_KEY, RESPONSES_SNAPSHOT_KEY};
use crate::validate::{
    normalize_email, overlap_warnings, validate_collaborators, validate_score_ranges,
};

/// Sync state of a cached form record relative to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Exists locally only; the remote write has not been acknowledged.
    Unsynced,
    /// The remote write was acknowledged.
    Persisted,
    /// Local data known to possibly diverge from the remote store.
    Stale,
}

#[derive(Debug, Clone)]
struct CachedForm {
    form: FormDefinition,
    sync: SyncState,
}

/// Configuration for the form engine.
#[derive(Debug, Clone)]
pub struct FormEngineConfig {
    /// How many response records the local cache retains when trimming
    /// after a quota overflow.
    pub response_cache_cap: usize,
}

impl Default for FormEngineConfig {
    fn default() -> Self {
        Self {
            response_cache_cap: 50,
        }
    }
}

/// Outcome of a response submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// The stored response, including any computed score and feedback.
    pub response: SubmittedResponse,
    /// False when the remote write failed and the record is retained
    /// locally only.
    pub synced: bool,
}

/// The form state synchronizer.
///
/// Owns the local cache (an explicit injected store, never ambient
/// state) and is the only component that mutates it. The scoring,
/// feedback, and access modules stay pure.
pub struct FormEngine {
    store: Arc<dyn FormStore>,
    cache: Box<dyn CacheStore>,
    config: FormEngineConfig,
    forms: HashMap<String, CachedForm>,
    /// Insertion order of form ids, for stable listings.
    order: Vec<String>,
    responses: HashMap<String, Vec<SubmittedResponse>>,
    /// access token -> form id
    token_index: HashMap<String, String>,
    /// allowed email -> form ids
    allowed_index: HashMap<String, Vec<String>>,
}

impl FormEngine {
    pub fn new(
        store: Arc<dyn FormStore>,
        cache: Box<dyn CacheStore>,
        config: FormEngineConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
            forms: HashMap::new(),
            order: Vec::new(),
            responses: HashMap::new(),
            token_index: HashMap::new(),
            allowed_index: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Form lifecycle
    // -----------------------------------------------------------------

    /// Create a new form from a draft. Assigns a fresh id and access
    /// token, sanitizes the embedded scoring and collaboration data, and
    /// writes the record to the remote store.
    ///
    /// On remote failure the record is kept locally as `Unsynced` and the
    /// error is surfaced; the local edit is not lost.
    pub async fn create_form(
        &mut self,
        owner: &str,
        draft: FormDraft,
    ) -> Result<FormDefinition, EngineError> {
        let owner = normalize_email(owner);
        if owner.is_empty() {
            return Err(EngineError::Validation("owner email is empty".into()));
        }
        if draft.title.trim().is_empty() {
            return Err(EngineError::Validation("form title is empty".into()));
        }

        let now = Utc::now();
        let mut form = FormDefinition {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            fields: draft.fields,
            is_private: draft.is_private,
            owner_id: owner,
            collaborators: draft.collaborators,
            allowed_users: draft.allowed_users,
            access_token: Uuid::new_v4().to_string(),
            show_total_score: draft.show_total_score,
            score_ranges: draft.score_ranges,
            allow_view_own_responses: draft.allow_view_own_responses,
            allow_edit_own_responses: draft.allow_edit_own_responses,
            created_at: now,
            updated_at: now,
        };
        sanitize_form(&mut form);

        let write = self.store.insert_form(&form).await;
        let sync = match &write {
            Ok(()) => SyncState::Persisted,
            Err(e) => {
                tracing::warn!("form {} kept locally, remote insert failed: {e}", form.id);
                SyncState::Unsynced
            }
        };

        self.index_form(form.clone(), sync);
        self.persist_forms_snapshot();

        match write {
            Ok(()) => Ok(form),
            Err(source) if source.is_unavailable() => {
                Err(EngineError::RemoteUnavailable { source })
            }
            Err(source) => Err(EngineError::Store(source)),
        }
    }

    /// Merge partial changes into a cached form, re-validate the embedded
    /// data, write remote, then reload the record from remote to
    /// reconcile (remote is the source of truth).
    pub async fn update_form(
        &mut self,
        form_id: &str,
        patch: FormPatch,
    ) -> Result<FormDefinition, EngineError> {
        let mut form = self
            .forms
            .get(form_id)
            .map(|c| c.form.clone())
            .ok_or_else(|| EngineError::FormNotFound(form_id.to_string()))?;

        apply_patch(&mut form, patch);
        sanitize_form(&mut form);
        form.updated_at = Utc::now();

        if let Err(source) = self.store.update_form(&form).await {
            tracing::warn!("form {} kept locally, remote update failed: {source}", form.id);
            self.index_form(form, SyncState::Unsynced);
            self.persist_forms_snapshot();
            return if source.is_unavailable() {
                Err(EngineError::RemoteUnavailable { source })
            } else {
                Err(EngineError::Store(source))
            };
        }

        // Reconcile against the authoritative copy.
        let (form, sync) = match self.store.fetch_form(form_id).await {
            Ok(remote) => (remote, SyncState::Persisted),
            Err(e) => {
                tracing::warn!("form {} reload after update failed: {e}", form_id);
                (form, SyncState::Stale)
            }
        };

        self.index_form(form.clone(), sync);
        self.persist_forms_snapshot();
        Ok(form)
    }

    /// Delete a form. Local cache and every derived index are purged
    /// regardless of the remote outcome; a remote failure is logged, not
    /// returned, so no dangling references survive.
    pub async fn delete_form(&mut self, form_id: &str) -> Result<(), EngineError> {
        if !self.forms.contains_key(form_id) {
            return Err(EngineError::FormNotFound(form_id.to_string()));
        }

        self.unindex_form(form_id);
        self.responses.remove(form_id);
        self.persist_forms_snapshot();
        self.persist_response_cache();

        if let Err(e) = self.store.delete_form(form_id).await {
            tracing::warn!("remote delete of form {form_id} failed: {e}");
        }
        if let Err(e) = self.store.delete_responses(form_id).await {
            tracing::warn!("remote delete of responses for {form_id} failed: {e}");
        }

        Ok(())
    }

    /// Fetch a form, cache-first.
    pub async fn get_form(&mut self, form_id: &str) -> Result<FormDefinition, EngineError> {
        if let Some(cached) = self.forms.get(form_id) {
            return Ok(cached.form.clone());
        }

        let form = match self.store.fetch_form(form_id).await {
            Ok(form) => form,
            Err(StoreError::NotFound(_)) => {
                return Err(EngineError::FormNotFound(form_id.to_string()))
            }
            Err(source) if source.is_unavailable() => {
                return Err(EngineError::RemoteUnavailable { source })
            }
            Err(source) => return Err(EngineError::Store(source)),
        };
        self.index_form(form.clone(), SyncState::Persisted);
        Ok(form)
    }

    /// All cached forms in insertion-stable order.
    pub fn list_forms(&self) -> Vec<&FormDefinition> {
        self.order
            .iter()
            .filter_map(|id| self.forms.get(id))
            .map(|c| &c.form)
            .collect()
    }

    /// Sync state of a cached record, if present.
    pub fn sync_state(&self, form_id: &str) -> Option<SyncState> {
        self.forms.get(form_id).map(|c| c.sync)
    }

    /// Fetch all forms from remote. On success the entire local cache is
    /// replaced and a snapshot persisted for offline fallback; on failure
    /// the last snapshot is used with every record marked `Stale`; with
    /// no snapshot the failure is surfaced.
    pub async fn load_all(&mut self) -> Result<(), EngineError> {
        match self.store.fetch_all_forms().await {
            Ok(forms) => {
                self.replace_cache(forms, SyncState::Persisted);
                self.persist_forms_snapshot();
                Ok(())
            }
            Err(source) => {
                let Some(snapshot) = self.cache.get(FORMS_SNAPSHOT_KEY) else {
                    return Err(EngineError::RemoteUnavailable { source });
                };
                let forms: Vec<FormDefinition> = match serde_json::from_str(&snapshot) {
                    Ok(forms) => forms,
                    Err(e) => {
                        tracing::warn!("forms snapshot unreadable: {e}");
                        return Err(EngineError::RemoteUnavailable { source });
                    }
                };
                tracing::warn!(
                    "remote store unavailable, serving {} forms from snapshot: {source}",
                    forms.len()
                );
                self.replace_cache(forms, SyncState::Stale);
                self.restore_response_cache();
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------

    /// Submit a response set for a form. Computes the total score and
    /// feedback when the form has scoring active, using the canonical
    /// form-level ranges only.
    ///
    /// An empty answer set is rejected before any write. On remote
    /// failure the record is retained in the local cache and the receipt
    /// reports `synced == false`.
    pub async fn submit_response(
        &mut self,
        form_id: &str,
        respondent: Option<&str>,
        answers: ResponseSet,
    ) -> Result<SubmitReceipt, EngineError> {
        if answers.is_empty() {
            return Err(EngineError::Validation("response set is empty".into()));
        }

        let form = self.get_form(form_id).await?;

        let total_score = form
            .show_total_score
            .then(|| compute_total_score(&answers, &form.fields));
        let feedback = total_score
            .and_then(|score| resolve_feedback(score, &form.score_ranges))
            .map(str::to_string);

        let response = SubmittedResponse {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.to_string(),
            respondent: respondent.map(normalize_email),
            answers,
            total_score,
            feedback,
            submitted_at: Utc::now(),
        };

        let synced = match self.store.insert_response(&response).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "response {} for form {form_id} kept locally, remote insert failed: {e}",
                    response.id
                );
                false
            }
        };

        self.responses
            .entry(form_id.to_string())
            .or_default()
            .push(response.clone());
        self.persist_response_cache();

        Ok(SubmitReceipt { response, synced })
    }

    /// Responses for a form, cache-first.
    pub async fn list_responses(
        &mut self,
        form_id: &str,
    ) -> Result<Vec<SubmittedResponse>, EngineError> {
        if let Some(cached) = self.responses.get(form_id) {
            return Ok(cached.clone());
        }

        let fetched = match self.store.fetch_responses(form_id).await {
            Ok(rows) => rows,
            Err(source) if source.is_unavailable() => {
                return Err(EngineError::RemoteUnavailable { source })
            }
            Err(source) => return Err(EngineError::Store(source)),
        };
        self.responses.insert(form_id.to_string(), fetched.clone());
        Ok(fetched)
    }

    // -----------------------------------------------------------------
    // Access links
    // -----------------------------------------------------------------

    /// Rotate the form's access token and return the fresh one. The
    /// remote write is best-effort; the rotation always takes effect
    /// locally.
    pub async fn generate_access_link(&mut self, form_id: &str) -> Result<String, EngineError> {
        let mut form = self
            .forms
            .get(form_id)
            .map(|c| c.form.clone())
            .ok_or_else(|| EngineError::FormNotFound(form_id.to_string()))?;

        form.access_token = Uuid::new_v4().to_string();
        form.updated_at = Utc::now();
        let token = form.access_token.clone();

        let sync = match self.store.update_form(&form).await {
            Ok(()) => SyncState::Persisted,
            Err(e) => {
                tracing::warn!("token rotation for {form_id} not persisted remotely: {e}");
                SyncState::Unsynced
            }
        };

        self.index_form(form, sync);
        self.persist_forms_snapshot();
        Ok(token)
    }

    /// Check a presented token against the form's current access token.
    pub fn validate_access_token(&self, form_id: &str, token: &str) -> bool {
        !token.is_empty()
            && self
                .token_index
                .get(token)
                .is_some_and(|id| id == form_id)
    }

    /// Form ids a given email is allowed to respond to, from the derived
    /// allow-list index.
    pub fn forms_allowing(&self, email: &str) -> &[String] {
        self.allowed_index
            .get(&normalize_email(email))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // -----------------------------------------------------------------
    // Cache plumbing
    // -----------------------------------------------------------------

    fn index_form(&mut self, form: FormDefinition, sync: SyncState) {
        let id = form.id.clone();
        if let Some(previous) = self.forms.get(&id) {
            self.token_index.remove(&previous.form.access_token);
        } else {
            self.order.push(id.clone());
        }
        if !form.access_token.is_empty() {
            self.token_index.insert(form.access_token.clone(), id.clone());
        }
        self.forms.insert(id, CachedForm { form, sync });
        self.rebuild_allowed_index();
    }

    fn unindex_form(&mut self, form_id: &str) {
        if let Some(cached) = self.forms.remove(form_id) {
            self.token_index.remove(&cached.form.access_token);
        }
        self.order.retain(|id| id != form_id);
        self.rebuild_allowed_index();
    }

    fn replace_cache(&mut self, forms: Vec<FormDefinition>, sync: SyncState) {
        self.forms.clear();
        self.order.clear();
        self.token_index.clear();
        for form in forms {
            let id = form.id.clone();
            if !form.access_token.is_empty() {
                self.token_index.insert(form.access_token.clone(), id.clone());
            }
            self.order.push(id.clone());
            self.forms.insert(id, CachedForm { form, sync });
        }
        self.rebuild_allowed_index();
    }

    fn rebuild_allowed_index(&mut self) {
        self.allowed_index.clear();
        for id in &self.order {
            let Some(cached) = self.forms.get(id) else {
                continue;
            };
            for email in &cached.form.allowed_users {
                self.allowed_index
                    .entry(email.clone())
                    .or_default()
                    .push(id.clone());
            }
        }
    }

    fn persist_forms_snapshot(&mut self) {
        let forms: Vec<&FormDefinition> = self
            .order
            .iter()
            .filter_map(|id| self.forms.get(id))
            .map(|c| &c.form)
            .collect();
        let payload = match serde_json::to_string(&forms) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("forms snapshot serialization failed: {e}");
                return;
            }
        };
        if let Err(e) = self.cache.set(FORMS_SNAPSHOT_KEY, &payload) {
            tracing::warn!("forms snapshot not persisted: {e}");
        }
    }

    /// Persist the response cache, trimming to the most recently
    /// submitted records when the write overruns the storage quota. If
    /// trimming still fails the response cache key is dropped entirely
    /// rather than corrupting other cached state.
    fn persist_response_cache(&mut self) {
        let payload = match serde_json::to_string(&self.responses) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("response cache serialization failed: {e}");
                return;
            }
        };

        match self.cache.set(RESPONSES_SNAPSHOT_KEY, &payload) {
            Ok(()) => {}
            Err(CacheError::QuotaExceeded { .. }) => {
                let trimmed = self.trimmed_responses();
                let payload = match serde_json::to_string(&trimmed) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("trimmed response cache serialization failed: {e}");
                        self.cache.remove(RESPONSES_SNAPSHOT_KEY);
                        return;
                    }
                };
                if let Err(e) = self.cache.set(RESPONSES_SNAPSHOT_KEY, &payload) {
                    tracing::warn!("response cache dropped, trimmed write still failed: {e}");
                    self.cache.remove(RESPONSES_SNAPSHOT_KEY);
                } else {
                    tracing::warn!(
                        "response cache trimmed to the {} most recent records",
                        self.config.response_cache_cap
                    );
                }
            }
            Err(e) => {
                tracing::warn!("response cache not persisted: {e}");
            }
        }
    }

    /// The most recently submitted `response_cache_cap` records across
    /// all forms, regrouped by form id.
    fn trimmed_responses(&self) -> HashMap<String, Vec<SubmittedResponse>> {
        let mut all: Vec<&SubmittedResponse> = self.responses.values().flatten().collect();
        all.sort_by_key(|r| std::cmp::Reverse(r.submitted_at));
        all.truncate(self.config.response_cache_cap);

        let mut grouped: HashMap<String, Vec<SubmittedResponse>> = HashMap::new();
        for response in all {
            grouped
                .entry(response.form_id.clone())
                .or_default()
                .push(response.clone());
        }
        for responses in grouped.values_mut() {
            responses.sort_by_key(|r| r.submitted_at);
        }
        grouped
    }

    fn restore_response_cache(&mut self) {
        let Some(snapshot) = self.cache.get(RESPONSES_SNAPSHOT_KEY) else {
            return;
        };
        match serde_json::from_str(&snapshot) {
            Ok(responses) => self.responses = responses,
            Err(e) => tracing::warn!("response snapshot unreadable: {e}"),
        }
    }
}

/// Normalize the data-quality-sensitive parts of a form in place:
/// validated score ranges, normalized collaborator and allow-list
/// entries, and refreshed per-field range copies.
fn sanitize_form(form: &mut FormDefinition) {
    let ranges = validate_score_ranges(std::mem::take(&mut form.score_ranges));
    if ranges.dropped > 0 {
        tracing::warn!(
            "form {}: dropped {} invalid score range(s)",
            form.id,
            ranges.dropped
        );
    }
    for warning in overlap_warnings(&ranges.value) {
        tracing::warn!("form {}: {warning}", form.id);
    }
    form.score_ranges = ranges.value;

    let collaborators = validate_collaborators(std::mem::take(&mut form.collaborators));
    if collaborators.dropped > 0 {
        tracing::warn!(
            "form {}: dropped {} collaborator entr(ies)",
            form.id,
            collaborators.dropped
        );
    }
    form.collaborators = collaborators.value;

    let allowed = validate_collaborators(std::mem::take(&mut form.allowed_users));
    if allowed.dropped > 0 {
        tracing::warn!(
            "form {}: dropped {} allow-list entr(ies)",
            form.id,
            allowed.dropped
        );
    }
    form.allowed_users = allowed.value;

    // The per-field copies are legacy denormalizations of the canonical
    // form-level list; refresh them so nothing reads a stale copy.
    for field in &mut form.fields {
        field.score_ranges = form.score_ranges.clone();
    }
}

fn apply_patch(form: &mut FormDefinition, patch: FormPatch) {
    if let Some(title) = patch.title {
        form.title = title;
    }
    if let Some(description) = patch.description {
        form.description = description;
    }
    if let Some(fields) = patch.fields {
        form.fields = fields;
    }
    if let Some(is_private) = patch.is_private {
        form.is_private = is_private;
    }
    if let Some(collaborators) = patch.collaborators {
        form.collaborators = collaborators;
    }
    if let Some(allowed_users) = patch.allowed_users {
        form.allowed_users = allowed_users;
    }
    if let Some(show_total_score) = patch.show_total_score {
        form.show_total_score = show_total_score;
    }
    if let Some(score_ranges) = patch.score_ranges {
        form.score_ranges = score_ranges;
    }
    if let Some(allow_view) = patch.allow_view_own_responses {
        form.allow_view_own_responses = allow_view;
    }
    if let Some(allow_edit) = patch.allow_edit_own_responses {
        form.allow_edit_own_responses = allow_edit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerValue, FieldDefinition, FieldOption, FieldType, ScoreRange};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// HashMap-backed store double with a switchable outage.
    #[derive(Default)]
    struct TestStore {
        forms: Mutex<HashMap<String, FormDefinition>>,
        responses: Mutex<Vec<SubmittedResponse>>,
        offline: Mutex<bool>,
    }

    impl TestStore {
        fn set_offline(&self, offline: bool) {
            *self.offline.lock().unwrap() = offline;
        }

        fn check(&self) -> Result<(), StoreError> {
            if *self.offline.lock().unwrap() {
                Err(StoreError::Unavailable("test outage".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl FormStore for TestStore {
        async fn insert_form(&self, form: &FormDefinition) -> Result<(), StoreError> {
            self.check()?;
            self.forms
                .lock()
                .unwrap()
                .insert(form.id.clone(), form.clone());
            Ok(())
        }

        async fn update_form(&self, form: &FormDefinition) -> Result<(), StoreError> {
            self.check()?;
            self.forms
                .lock()
                .unwrap()
                .insert(form.id.clone(), form.clone());
            Ok(())
        }

        async fn delete_form(&self, form_id: &str) -> Result<(), StoreError> {
            self.check()?;
            self.forms.lock().unwrap().remove(form_id);
            Ok(())
        }

        async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, StoreError> {
            self.check()?;
            self.forms
                .lock()
                .unwrap()
                .get(form_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(form_id.to_string()))
        }

        async fn fetch_all_forms(&self) -> Result<Vec<FormDefinition>, StoreError> {
            self.check()?;
            Ok(self.forms.lock().unwrap().values().cloned().collect())
        }

        async fn insert_response(&self, response: &SubmittedResponse) -> Result<(), StoreError> {
            self.check()?;
            self.responses.lock().unwrap().push(response.clone());
            Ok(())
        }

        async fn fetch_responses(
            &self,
            form_id: &str,
        ) -> Result<Vec<SubmittedResponse>, StoreError> {
            self.check()?;
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
            self.check()?;
            self.responses.lock().unwrap().retain(|r| r.form_id != form_id);
            Ok(())
        }
    }

    /// In-memory cache with an optional byte quota.
    #[derive(Default)]
    struct TestCache {
        entries: HashMap<String, String>,
        quota: Option<usize>,
    }

    impl CacheStore for TestCache {
        fn get(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
            if let Some(quota) = self.quota {
                if value.len() > quota {
                    return Err(CacheError::QuotaExceeded {
                        attempted_bytes: value.len() as u64,
                        limit_bytes: quota as u64,
                    });
                }
            }
            self.entries.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&mut self, key: &str) {
            self.entries.remove(key);
        }
    }

    fn scored_draft() -> FormDraft {
        FormDraft {
            title: "Quiz".into(),
            show_total_score: true,
            score_ranges: vec![
                ScoreRange {
                    min: 0,
                    max: 4,
                    message: "low".into(),
                },
                ScoreRange {
                    min: 5,
                    max: 100,
                    message: "high".into(),
                },
            ],
            fields: vec![FieldDefinition {
                id: "q1".into(),
                field_type: FieldType::Radio,
                label: "Pick".into(),
                required: true,
                options: vec![
                    FieldOption {
                        id: "o1".into(),
                        label: "A".into(),
                        value: "a".into(),
                        numeric_value: Some(3),
                    },
                    FieldOption {
                        id: "o2".into(),
                        label: "B".into(),
                        value: "b".into(),
                        numeric_value: Some(7),
                    },
                ],
                has_numeric_values: true,
                score_ranges: vec![],
            }],
            ..Default::default()
        }
    }

    fn engine_with(store: Arc<TestStore>) -> FormEngine {
        FormEngine::new(store, Box::<TestCache>::default(), FormEngineConfig::default())
    }

    #[tokio::test]
    async fn create_persists_and_indexes() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(Arc::clone(&store));

        let form = engine
            .create_form("Owner@X.com", scored_draft())
            .await
            .unwrap();

        assert_eq!(form.owner_id, "owner@x.com");
        assert!(!form.access_token.is_empty());
        assert_eq!(engine.sync_state(&form.id), Some(SyncState::Persisted));
        assert!(engine.validate_access_token(&form.id, &form.access_token));
        assert_eq!(engine.list_forms().len(), 1);
        assert!(store.forms.lock().unwrap().contains_key(&form.id));
    }

    #[tokio::test]
    async fn create_offline_keeps_local_record() {
        let store = Arc::new(TestStore::default());
        store.set_offline(true);
        let mut engine = engine_with(Arc::clone(&store));

        let err = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RemoteUnavailable { .. }));

        // The edit survived locally as Unsynced.
        let forms = engine.list_forms();
        assert_eq!(forms.len(), 1);
        let id = forms[0].id.clone();
        assert_eq!(engine.sync_state(&id), Some(SyncState::Unsynced));
    }

    #[tokio::test]
    async fn create_drops_invalid_ranges() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);

        let mut draft = scored_draft();
        draft.score_ranges.push(ScoreRange {
            min: 10,
            max: 1,
            message: "inverted".into(),
        });

        let form = engine.create_form("owner@x.com", draft).await.unwrap();
        assert_eq!(form.score_ranges.len(), 2);
        assert!(form.score_ranges.iter().all(|r| r.min <= r.max));
        // Per-field copies refreshed from the canonical list.
        assert_eq!(form.fields[0].score_ranges, form.score_ranges);
    }

    #[tokio::test]
    async fn update_round_trip_validates_ranges() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        let patch = FormPatch {
            score_ranges: Some(vec![
                ScoreRange {
                    min: 0,
                    max: 10,
                    message: "kept".into(),
                },
                ScoreRange {
                    min: 9,
                    max: 2,
                    message: "dropped".into(),
                },
            ]),
            collaborators: Some(vec![
                " Helper@X.com ".into(),
                "helper@x.com".into(),
                "".into(),
            ]),
            ..Default::default()
        };

        let updated = engine.update_form(&form.id, patch).await.unwrap();
        assert_eq!(updated.score_ranges.len(), 1);
        assert_eq!(updated.score_ranges[0].message, "kept");
        assert_eq!(updated.collaborators, vec!["helper@x.com".to_string()]);

        let fetched = engine.get_form(&form.id).await.unwrap();
        assert_eq!(fetched.score_ranges, updated.score_ranges);
    }

    #[tokio::test]
    async fn update_unknown_form_is_not_found() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);
        let err = engine
            .update_form("missing", FormPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::FormNotFound(_)));
    }

    #[tokio::test]
    async fn submit_scores_and_resolves_feedback() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        let mut answers = ResponseSet::new();
        answers.insert("q1".into(), AnswerValue::Selection("b".into()));

        let receipt = engine
            .submit_response(&form.id, Some("Resp@X.com"), answers)
            .await
            .unwrap();
        assert!(receipt.synced);
        assert_eq!(receipt.response.total_score, Some(7));
        assert_eq!(receipt.response.feedback.as_deref(), Some("high"));
        assert_eq!(receipt.response.respondent.as_deref(), Some("resp@x.com"));

        let responses = engine.list_responses(&form.id).await.unwrap();
        assert_eq!(responses.len(), 1);
    }

    #[tokio::test]
    async fn submit_without_scoring_leaves_score_empty() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);
        let mut draft = scored_draft();
        draft.show_total_score = false;
        let form = engine.create_form("owner@x.com", draft).await.unwrap();

        let mut answers = ResponseSet::new();
        answers.insert("q1".into(), AnswerValue::Selection("b".into()));

        let receipt = engine
            .submit_response(&form.id, None, answers)
            .await
            .unwrap();
        assert_eq!(receipt.response.total_score, None);
        assert_eq!(receipt.response.feedback, None);
    }

    #[tokio::test]
    async fn submit_empty_answers_rejected() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        let err = engine
            .submit_response(&form.id, None, ResponseSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(engine.list_responses(&form.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_offline_is_retained_unsynced() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(Arc::clone(&store));
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        store.set_offline(true);
        let mut answers = ResponseSet::new();
        answers.insert("q1".into(), AnswerValue::Selection("a".into()));

        let receipt = engine
            .submit_response(&form.id, None, answers)
            .await
            .unwrap();
        assert!(!receipt.synced);
        assert_eq!(receipt.response.total_score, Some(3));

        // Locally visible despite the outage.
        let responses = engine.list_responses(&form.id).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert!(store.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_purges_cache_and_indexes() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(Arc::clone(&store));
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();
        let token = form.access_token.clone();

        let mut answers = ResponseSet::new();
        answers.insert("q1".into(), AnswerValue::Selection("a".into()));
        engine
            .submit_response(&form.id, None, answers)
            .await
            .unwrap();

        engine.delete_form(&form.id).await.unwrap();

        assert!(engine.list_forms().is_empty());
        assert!(!engine.validate_access_token(&form.id, &token));
        assert!(engine.list_responses(&form.id).await.unwrap().is_empty());
        assert!(store.forms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_succeeds_locally_when_remote_fails() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(Arc::clone(&store));
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        store.set_offline(true);
        engine.delete_form(&form.id).await.unwrap();
        assert!(engine.list_forms().is_empty());
    }

    #[tokio::test]
    async fn load_all_falls_back_to_snapshot_and_marks_stale() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(Arc::clone(&store));
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        // A fresh engine sharing the same cache contents simulates a
        // restart while the remote store is down.
        let snapshot_cache = TestCache {
            entries: {
                let mut entries = HashMap::new();
                entries.insert(
                    FORMS_SNAPSHOT_KEY.to_string(),
                    serde_json::to_string(&vec![form.clone()]).unwrap(),
                );
                entries
            },
            quota: None,
        };
        store.set_offline(true);
        let mut restarted = FormEngine::new(
            Arc::clone(&store) as Arc<dyn FormStore>,
            Box::new(snapshot_cache),
            FormEngineConfig::default(),
        );

        restarted.load_all().await.unwrap();
        assert_eq!(restarted.list_forms().len(), 1);
        assert_eq!(restarted.sync_state(&form.id), Some(SyncState::Stale));
    }

    #[tokio::test]
    async fn load_all_without_snapshot_surfaces_failure() {
        let store = Arc::new(TestStore::default());
        store.set_offline(true);
        let mut engine = engine_with(store);

        let err = engine.load_all().await.unwrap_err();
        assert!(matches!(err, EngineError::RemoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn rotate_access_link_invalidates_old_token() {
        let store = Arc::new(TestStore::default());
        let mut engine = engine_with(store);
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();
        let old = form.access_token.clone();

        let fresh = engine.generate_access_link(&form.id).await.unwrap();
        assert_ne!(fresh, old);
        assert!(engine.validate_access_token(&form.id, &fresh));
        assert!(!engine.validate_access_token(&form.id, &old));
    }

    #[tokio::test]
    async fn quota_overflow_trims_to_most_recent() {
        let store = Arc::new(TestStore::default());
        let cache = TestCache {
            entries: HashMap::new(),
            // Tight quota: the full history will not fit.
            quota: Some(4096),
        };
        let mut engine = FormEngine::new(
            store,
            Box::new(cache),
            FormEngineConfig {
                response_cache_cap: 3,
            },
        );
        let form = engine
            .create_form("owner@x.com", scored_draft())
            .await
            .unwrap();

        for i in 0..12 {
            let mut answers = ResponseSet::new();
            answers.insert(
                "q1".into(),
                AnswerValue::Text(format!("filler answer number {i} {}", "x".repeat(256))),
            );
            engine
                .submit_response(&form.id, None, answers)
                .await
                .unwrap();
        }

        // The persisted cache was trimmed to the cap; in-memory history
        // is still complete.
        let snapshot = engine.cache.get(RESPONSES_SNAPSHOT_KEY).unwrap();
        let persisted: HashMap<String, Vec<SubmittedResponse>> =
            serde_json::from_str(&snapshot).unwrap();
        let persisted_total: usize = persisted.values().map(Vec::len).sum();
        assert!(persisted_total <= 3, "persisted {persisted_total} records");
        assert_eq!(engine.list_responses(&form.id).await.unwrap().len(), 12);
    }
}
