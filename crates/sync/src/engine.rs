// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External Sync Engine (§4.8): push, pull, and the closed/archived policy.

use crate::adapter::{ExternalItem, SyncAdapter};
use crate::element::{
    apply_fields_to_doc, apply_fields_to_task, doc_is_pushable, doc_to_fields, read_sync_state, task_is_pushable,
    task_to_fields, write_sync_state,
};
use crate::error::SyncResult;
use crate::hash::content_hash;
use sf_core::{
    AdapterType, Clock, ConflictStrategy, DocumentId, DocumentStatus, EventFilter, ExternalSyncState, Settings,
    Store, TaskField, TaskId, TaskStatus,
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub all: bool,
    pub force: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    WouldPush,
    SkippedNotPushable,
    SkippedUnchanged,
    SkippedNoEvents,
}

#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub pushed: usize,
    pub pulled: usize,
    pub created: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub errors: usize,
}

impl SyncSummary {
    fn record_push(&mut self, outcome: PushOutcome) {
        match outcome {
            PushOutcome::Pushed | PushOutcome::WouldPush => self.pushed += 1,
            _ => self.skipped += 1,
        }
    }
}

struct ProviderBinding {
    adapter: Arc<dyn SyncAdapter>,
    field_map: Arc<dyn TaskField>,
}

/// One provider × project × adapter-type combination the daemon pulls from.
#[derive(Debug, Clone)]
pub struct PullTarget {
    pub provider: String,
    pub project: String,
    pub adapter_type: AdapterType,
}

pub struct SyncEngine<C: Clock> {
    store: Arc<dyn Store>,
    settings: Arc<dyn Settings>,
    clock: C,
    conflict_strategy: ConflictStrategy,
    providers: HashMap<String, ProviderBinding>,
}

impl<C: Clock> SyncEngine<C> {
    pub fn new(store: Arc<dyn Store>, settings: Arc<dyn Settings>, clock: C) -> Self {
        Self { store, settings, clock, conflict_strategy: ConflictStrategy::default(), providers: HashMap::new() }
    }

    pub fn with_provider(mut self, name: impl Into<String>, adapter: Arc<dyn SyncAdapter>, field_map: Arc<dyn TaskField>) -> Self {
        self.providers.insert(name.into(), ProviderBinding { adapter, field_map });
        self
    }

    pub fn with_conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = strategy;
        self
    }

    fn binding(&self, provider: &str) -> Option<&ProviderBinding> {
        self.providers.get(provider)
    }

    /// Push algorithm (§4.8.1) for one linked task.
    pub async fn push_task(&self, task_id: &TaskId, opts: &SyncOptions) -> SyncResult<PushOutcome> {
        let mut task = self.store.get_task(task_id).await?;
        let Some(mut state) = read_sync_state(&task.meta) else {
            return Ok(PushOutcome::SkippedNotPushable);
        };
        if !state.is_pushable() || !task_is_pushable(&task) {
            return Ok(PushOutcome::SkippedNotPushable);
        }

        let fields = task_to_fields(&task);
        let current_hash = content_hash(&fields);
        if !opts.force && state.last_pushed_hash.as_deref() == Some(current_hash.as_str()) {
            return Ok(PushOutcome::SkippedUnchanged);
        }
        if !opts.force {
            if let Some(last_pushed_at) = state.last_pushed_at {
                let changed = self.has_events_since(task_id.as_str(), last_pushed_at).await?;
                if !changed {
                    return Ok(PushOutcome::SkippedNoEvents);
                }
            }
        }
        if opts.dry_run {
            return Ok(PushOutcome::WouldPush);
        }

        let Some(binding) = self.binding(&state.provider) else {
            return Err(crate::error::SyncError::NoFieldMap(state.provider.clone()));
        };
        let external = binding.field_map.to_external(&fields);
        binding.adapter.update(&state.external_id, &external).await?;

        let now = self.clock.utc_now();
        state.last_pushed_at = Some(now);
        state.last_pushed_hash = Some(current_hash);
        write_sync_state(&mut task.meta, &state, now);
        self.store.put_task(task).await?;
        Ok(PushOutcome::Pushed)
    }

    /// Push algorithm for one linked document; archived documents are never
    /// pushed (§4.8.3).
    pub async fn push_document(&self, document_id: &DocumentId, opts: &SyncOptions) -> SyncResult<PushOutcome> {
        let mut doc = self.store.get_document(document_id).await?;
        let Some(mut state) = read_sync_state(&doc.meta) else {
            return Ok(PushOutcome::SkippedNotPushable);
        };
        if !state.is_pushable() || !doc_is_pushable(&doc) {
            return Ok(PushOutcome::SkippedNotPushable);
        }

        let fields = doc_to_fields(&doc);
        let current_hash = content_hash(&fields);
        if !opts.force && state.last_pushed_hash.as_deref() == Some(current_hash.as_str()) {
            return Ok(PushOutcome::SkippedUnchanged);
        }
        if !opts.force {
            if let Some(last_pushed_at) = state.last_pushed_at {
                let changed = self.has_events_since(document_id.as_str(), last_pushed_at).await?;
                if !changed {
                    return Ok(PushOutcome::SkippedNoEvents);
                }
            }
        }
        if opts.dry_run {
            return Ok(PushOutcome::WouldPush);
        }

        let Some(binding) = self.binding(&state.provider) else {
            return Err(crate::error::SyncError::NoFieldMap(state.provider.clone()));
        };
        let external = binding.field_map.to_external(&fields);
        binding.adapter.update(&state.external_id, &external).await?;

        let now = self.clock.utc_now();
        state.last_pushed_at = Some(now);
        state.last_pushed_hash = Some(current_hash);
        write_sync_state(&mut doc.meta, &state, now);
        self.store.put_document(doc).await?;
        Ok(PushOutcome::Pushed)
    }

    async fn has_events_since(&self, element_id: &str, after: chrono::DateTime<chrono::Utc>) -> SyncResult<bool> {
        let filter = EventFilter { element_id: Some(element_id.to_string()), after: Some(after), ..Default::default() };
        Ok(!self.store.query_events(&filter).await?.is_empty())
    }

    /// Pushes every linked, pushable task and document, in store order.
    pub async fn push_all(&self, opts: &SyncOptions) -> SyncResult<SyncSummary> {
        let mut summary = SyncSummary::default();
        for task in self.store.list_tasks().await? {
            if read_sync_state(&task.meta).is_none() {
                continue;
            }
            match self.push_task(&task.id, opts).await {
                Ok(outcome) => summary.record_push(outcome),
                Err(_) => summary.errors += 1,
            }
        }
        for doc in self.store.list_documents().await? {
            if read_sync_state(&doc.meta).is_none() {
                continue;
            }
            match self.push_document(&doc.id, opts).await {
                Ok(outcome) => summary.record_push(outcome),
                Err(_) => summary.errors += 1,
            }
        }
        Ok(summary)
    }

    /// Pull algorithm (§4.8.2) for one provider × project × adapter-type.
    pub async fn pull(&self, target: &PullTarget, opts: &SyncOptions) -> SyncResult<SyncSummary> {
        let mut summary = SyncSummary::default();
        let Some(binding) = self.binding(&target.provider) else {
            return Err(crate::error::SyncError::NoFieldMap(target.provider.clone()));
        };

        let cursor_key = sf_core::settings::cursor_key(&target.provider, &target.project, adapter_type_str(target.adapter_type));
        let cursor = match self.settings.get(&cursor_key).await? {
            Some(raw) => raw.parse().unwrap_or_else(|_| epoch()),
            None => epoch(),
        };

        let items = binding.adapter.list_since(&target.project, cursor).await?;
        let index = self.build_link_index(target, &items).await?;

        for item in &items {
            let local = index.get(&item.external_id);
            match (local, target.adapter_type) {
                (None, AdapterType::Task) => {
                    if opts.all {
                        self.create_task_from_remote(target, item, binding.field_map.as_ref()).await?;
                        summary.created += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
                (None, AdapterType::Document) => {
                    if opts.all {
                        self.create_document_from_remote(target, item, binding.field_map.as_ref()).await?;
                        summary.created += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
                (Some(LinkedElement::Task(task_id)), AdapterType::Task) => {
                    match self.apply_pull_to_task(task_id, item, binding.field_map.as_ref()).await? {
                        PullApply::Applied => summary.pulled += 1,
                        PullApply::Conflict => summary.conflicts += 1,
                        PullApply::Skipped => summary.skipped += 1,
                    }
                }
                (Some(LinkedElement::Document(doc_id)), AdapterType::Document) => {
                    match self.apply_pull_to_document(doc_id, item, binding.field_map.as_ref()).await? {
                        PullApply::Applied => summary.pulled += 1,
                        PullApply::Conflict => summary.conflicts += 1,
                        PullApply::Skipped => summary.skipped += 1,
                    }
                }
                _ => summary.skipped += 1,
            }
        }

        if !items.is_empty() || cursor == epoch() {
            let now = self.clock.utc_now();
            self.settings.set(&cursor_key, now.to_rfc3339()).await?;
        }
        Ok(summary)
    }

    async fn build_link_index(&self, target: &PullTarget, _items: &[ExternalItem]) -> SyncResult<HashMap<String, LinkedElement>> {
        let mut index = HashMap::new();
        match target.adapter_type {
            AdapterType::Task => {
                for task in self.store.list_tasks().await? {
                    if let Some(state) = read_sync_state(&task.meta) {
                        if state.provider == target.provider && state.project == target.project {
                            index.insert(state.external_id.clone(), LinkedElement::Task(task.id));
                        }
                    }
                }
            }
            AdapterType::Document => {
                for doc in self.store.list_documents().await? {
                    if let Some(state) = read_sync_state(&doc.meta) {
                        if state.provider == target.provider && state.project == target.project {
                            index.insert(state.external_id.clone(), LinkedElement::Document(doc.id));
                        }
                    }
                }
            }
        }
        Ok(index)
    }

    async fn create_task_from_remote(&self, target: &PullTarget, item: &ExternalItem, field_map: &dyn TaskField) -> SyncResult<()> {
        let now = self.clock.utc_now();
        let local_fields = field_map.from_external(&item.fields);
        let id = sf_core::TaskId::new();
        let mut meta = sf_core::EntityMeta::new(id.to_string(), "task", "external-sync", now);
        meta.tags = local_fields.tags.clone();
        let mut task = sf_core::Task {
            meta,
            id,
            title: local_fields.title.unwrap_or_else(|| item.external_id.clone()),
            status: if item.is_open { TaskStatus::Open } else { TaskStatus::Closed },
            priority: local_fields.priority.as_deref().and_then(|p| p.parse().ok()).unwrap_or(3),
            complexity: 1,
            task_type: sf_core::TaskType::Task,
            description_ref: None,
            acceptance_criteria: local_fields.body,
            close_reason: None,
            assignee: None,
            owner: None,
            deadline: None,
            scheduled_for: None,
            closed_at: (!item.is_open).then_some(now),
            deleted_at: None,
            deleted_by: None,
            delete_reason: None,
        };
        let state = ExternalSyncState {
            last_pulled_at: Some(now),
            last_pulled_hash: Some(content_hash(&item.fields)),
            url: item.url.clone(),
            ..ExternalSyncState::new(target.provider.clone(), target.project.clone(), item.external_id.clone(), target.adapter_type, sf_core::SyncDirection::Bidirectional)
        };
        write_sync_state(&mut task.meta, &state, now);
        self.store.put_task(task).await?;
        Ok(())
    }

    async fn create_document_from_remote(&self, target: &PullTarget, item: &ExternalItem, field_map: &dyn TaskField) -> SyncResult<()> {
        let now = self.clock.utc_now();
        let local_fields = field_map.from_external(&item.fields);
        let id = sf_core::DocumentId::new();
        let mut meta = sf_core::EntityMeta::new(id.to_string(), "document", "external-sync", now);
        meta.tags = local_fields.tags.clone();
        let mut doc = sf_core::Document {
            meta,
            id,
            content_type: sf_core::ContentType::Markdown,
            content: local_fields.body.unwrap_or_default(),
            version: 1,
            previous_version_id: None,
            category: sf_core::DocumentCategory::Reference,
            status: if item.is_open { DocumentStatus::Active } else { DocumentStatus::Archived },
            immutable: false,
        };
        let state = ExternalSyncState {
            last_pulled_at: Some(now),
            last_pulled_hash: Some(content_hash(&item.fields)),
            url: item.url.clone(),
            ..ExternalSyncState::new(target.provider.clone(), target.project.clone(), item.external_id.clone(), target.adapter_type, sf_core::SyncDirection::Bidirectional)
        };
        write_sync_state(&mut doc.meta, &state, now);
        self.store.put_document(doc).await?;
        Ok(())
    }

    async fn apply_pull_to_task(&self, task_id: &TaskId, item: &ExternalItem, field_map: &dyn TaskField) -> SyncResult<PullApply> {
        let mut task = self.store.get_task(task_id).await?;
        let Some(mut state) = read_sync_state(&task.meta) else { return Ok(PullApply::Skipped) };

        let remote_hash = content_hash(&item.fields);
        if state.last_pulled_hash.as_deref() == Some(remote_hash.as_str()) {
            return Ok(PullApply::Skipped);
        }

        let now = self.clock.utc_now();
        let local_fields = task_to_fields(&task);
        let local_current_hash = content_hash(&local_fields);
        let local_changed = state.last_pushed_hash.as_deref().is_some_and(|h| h != local_current_hash.as_str());

        if local_changed {
            match self.conflict_strategy {
                ConflictStrategy::Manual => {
                    if !task.meta.tags.iter().any(|t| t == "sync-conflict") {
                        task.meta.tags.push("sync-conflict".to_string());
                        task.meta.touch(now);
                        self.store.put_task(task).await?;
                    }
                    return Ok(PullApply::Conflict);
                }
                ConflictStrategy::LocalWins => {
                    state.last_pulled_at = Some(now);
                    state.last_pulled_hash = Some(remote_hash);
                    write_sync_state(&mut task.meta, &state, now);
                    self.store.put_task(task).await?;
                    return Ok(PullApply::Conflict);
                }
                ConflictStrategy::RemoteWins | ConflictStrategy::LastWriteWins => {
                    let remote_wins = matches!(self.conflict_strategy, ConflictStrategy::RemoteWins) || item.updated_at >= task.meta.updated_at;
                    if !remote_wins {
                        state.last_pulled_at = Some(now);
                        state.last_pulled_hash = Some(remote_hash);
                        write_sync_state(&mut task.meta, &state, now);
                        self.store.put_task(task).await?;
                        return Ok(PullApply::Conflict);
                    }
                    // Remote wins: still a detected conflict, reported as such even though resolved automatically.
                    self.apply_remote_to_task(&mut task, &mut state, item, field_map, now, true).await?;
                    self.store.put_task(task).await?;
                    return Ok(PullApply::Conflict);
                }
            }
        }

        self.apply_remote_to_task(&mut task, &mut state, item, field_map, now, false).await?;
        self.store.put_task(task).await?;
        Ok(PullApply::Applied)
    }

    async fn apply_remote_to_task(
        &self,
        task: &mut sf_core::Task,
        state: &mut ExternalSyncState,
        item: &ExternalItem,
        field_map: &dyn TaskField,
        now: chrono::DateTime<chrono::Utc>,
        also_settle_push: bool,
    ) -> SyncResult<()> {
        let local_fields = field_map.from_external(&item.fields);
        apply_fields_to_task(task, &local_fields, now);

        if matches!(task.status, TaskStatus::Closed | TaskStatus::Tombstone) && item.is_open {
            task.reopen(now)?;
        }

        let remote_hash = content_hash(&item.fields);
        state.last_pulled_at = Some(now);
        state.last_pulled_hash = Some(remote_hash.clone());
        if also_settle_push {
            state.last_pushed_hash = Some(content_hash(&task_to_fields(task)));
            state.last_pushed_at = Some(now);
        }
        write_sync_state(&mut task.meta, state, now);
        Ok(())
    }

    async fn apply_pull_to_document(&self, document_id: &DocumentId, item: &ExternalItem, field_map: &dyn TaskField) -> SyncResult<PullApply> {
        let mut doc = self.store.get_document(document_id).await?;
        let Some(mut state) = read_sync_state(&doc.meta) else { return Ok(PullApply::Skipped) };

        let remote_hash = content_hash(&item.fields);
        if state.last_pulled_hash.as_deref() == Some(remote_hash.as_str()) {
            return Ok(PullApply::Skipped);
        }

        let now = self.clock.utc_now();
        let local_fields = doc_to_fields(&doc);
        let local_current_hash = content_hash(&local_fields);
        let local_changed = state.last_pushed_hash.as_deref().is_some_and(|h| h != local_current_hash.as_str());

        if local_changed && matches!(self.conflict_strategy, ConflictStrategy::Manual) {
            if !doc.meta.tags.iter().any(|t| t == "sync-conflict") {
                doc.meta.tags.push("sync-conflict".to_string());
                doc.meta.touch(now);
                self.store.put_document(doc).await?;
            }
            return Ok(PullApply::Conflict);
        }
        if local_changed && matches!(self.conflict_strategy, ConflictStrategy::LocalWins) {
            state.last_pulled_at = Some(now);
            state.last_pulled_hash = Some(remote_hash);
            write_sync_state(&mut doc.meta, &state, now);
            self.store.put_document(doc).await?;
            return Ok(PullApply::Conflict);
        }
        if local_changed
            && matches!(self.conflict_strategy, ConflictStrategy::LastWriteWins)
            && item.updated_at < doc.meta.updated_at
        {
            state.last_pulled_at = Some(now);
            state.last_pulled_hash = Some(remote_hash);
            write_sync_state(&mut doc.meta, &state, now);
            self.store.put_document(doc).await?;
            return Ok(PullApply::Conflict);
        }

        let local_fields = field_map.from_external(&item.fields);
        apply_fields_to_doc(&mut doc, &local_fields, now);
        if doc.status == DocumentStatus::Archived && item.is_open {
            doc.status = DocumentStatus::Active;
        }
        state.last_pulled_at = Some(now);
        state.last_pulled_hash = Some(remote_hash);
        if local_changed {
            state.last_pushed_hash = Some(content_hash(&doc_to_fields(&doc)));
            state.last_pushed_at = Some(now);
        }
        write_sync_state(&mut doc.meta, &state, now);
        self.store.put_document(doc).await?;
        Ok(PullApply::Applied)
    }

    /// Runs `push_all` followed by a pull of every given target, matching
    /// the daemon's `sync({all:true})` call (§4.9).
    pub async fn sync(&self, targets: &[PullTarget], opts: &SyncOptions) -> SyncResult<SyncSummary> {
        let mut total = self.push_all(opts).await?;
        for target in targets {
            let pulled = self.pull(target, opts).await?;
            total.pulled += pulled.pulled;
            total.created += pulled.created;
            total.skipped += pulled.skipped;
            total.conflicts += pulled.conflicts;
            total.errors += pulled.errors;
        }
        Ok(total)
    }
}

enum LinkedElement {
    Task(TaskId),
    Document(DocumentId),
}

enum PullApply {
    Applied,
    Conflict,
    Skipped,
}

fn adapter_type_str(t: AdapterType) -> &'static str {
    match t {
        AdapterType::Task => "task",
        AdapterType::Document => "document",
    }
}

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(0, 0).unwrap_or_default()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
