// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-mapping between the two synced element kinds (tasks, documents)
//! and the provider-agnostic `ExternalFields` shape, plus the `_externalSync`
//! metadata accessors. Single-writer discipline (only this crate writes
//! `_externalSync`) is enforced by going through these helpers exclusively.

use chrono::{DateTime, Utc};
use sf_core::{Document, DocumentStatus, EntityMeta, ExternalFields, ExternalSyncState, Task, TaskStatus};
use sf_core::sync_meta::EXTERNAL_SYNC_METADATA_KEY;

pub fn read_sync_state(meta: &EntityMeta) -> Option<ExternalSyncState> {
    meta.metadata.get(EXTERNAL_SYNC_METADATA_KEY).and_then(|v| serde_json::from_value(v.clone()).ok())
}

pub fn write_sync_state(meta: &mut EntityMeta, state: &ExternalSyncState, now: DateTime<Utc>) {
    if let Ok(value) = serde_json::to_value(state) {
        meta.metadata.insert(EXTERNAL_SYNC_METADATA_KEY.to_string(), value);
        meta.touch(now);
    }
}

pub fn task_to_fields(task: &Task) -> ExternalFields {
    ExternalFields {
        status: Some(task.status.to_string()),
        priority: Some(task.priority.to_string()),
        task_type: Some(task_type_str(task.task_type).to_string()),
        tags: task.meta.tags.clone(),
        assignee: task.assignee.map(|id| id.to_string()),
        title: Some(task.title.clone()),
        body: task.acceptance_criteria.clone(),
    }
}

fn task_type_str(t: sf_core::TaskType) -> &'static str {
    use sf_core::TaskType::*;
    match t {
        Bug => "bug",
        Feature => "feature",
        Task => "task",
        Chore => "chore",
    }
}

/// Applies a remote field-map diff to a local task. Title, tags, and
/// priority are free-form and applied directly; `status` is never set here
/// because every transition must go through `Task::transition_status`'s
/// validated table. The closed/archived reopen carve-out (§4.8.3) is handled
/// by the caller, which has the remote's `is_open` flag.
pub fn apply_fields_to_task(task: &mut Task, fields: &ExternalFields, now: DateTime<Utc>) {
    if let Some(title) = &fields.title {
        task.title = title.clone();
    }
    if let Some(priority) = fields.priority.as_deref().and_then(|p| p.parse::<u8>().ok()) {
        task.priority = priority;
    }
    task.meta.tags = fields.tags.clone();
    task.meta.touch(now);
}

pub fn task_is_pushable(task: &Task) -> bool {
    !matches!(task.status, TaskStatus::Closed | TaskStatus::Tombstone)
}

pub fn doc_to_fields(doc: &Document) -> ExternalFields {
    ExternalFields {
        status: Some(match doc.status {
            DocumentStatus::Active => "active".to_string(),
            DocumentStatus::Archived => "archived".to_string(),
        }),
        priority: None,
        task_type: None,
        tags: doc.meta.tags.clone(),
        assignee: None,
        title: None,
        body: Some(doc.content.clone()),
    }
}

pub fn apply_fields_to_doc(doc: &mut Document, fields: &ExternalFields, now: DateTime<Utc>) {
    if let Some(body) = &fields.body {
        doc.content = body.clone();
    }
    doc.meta.tags = fields.tags.clone();
    doc.meta.touch(now);
}

pub fn doc_is_pushable(doc: &Document) -> bool {
    doc.status != DocumentStatus::Archived
}
