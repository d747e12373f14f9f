// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project and recorded-step data model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a project.
    pub struct ProjectId;
}

crate::define_id! {
    /// Unique identifier for a recorded step within a project.
    pub struct StepId;
}

crate::define_id! {
    /// Unique identifier for a worker tab.
    pub struct TabId;
}

crate::define_id! {
    /// Unique identifier for a persisted test run.
    pub struct TestRunId;
}

/// One row of tabular data driving a data-driven run. Keyed by CSV column name.
pub type RowData = BTreeMap<String, String>;

/// The kind of UI interaction a recorded step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Input,
    Enter,
    Open,
    Navigate,
    Wait,
}

/// Maps a CSV column to the field a step's `input` targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub step_id: StepId,
    pub column: String,
}

/// One recorded UI interaction, as produced by the recorder (external collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub id: StepId,
    pub name: String,
    pub kind: EventKind,
    /// Opaque locator payload (selector or equivalent). Not interpreted here.
    pub locator: String,
    /// Wait duration in milliseconds, for `EventKind::Wait` steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<u64>,
}

/// A recorded project: target page plus the step sequence and optional data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_url: String,
    pub steps: Vec<RecordedStep>,
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RowData>>,
}

impl Project {
    /// Number of data rows this project drives, or 1 for a non-data-driven run.
    pub fn total_rows(&self) -> usize {
        self.rows.as_ref().map(|r| r.len()).unwrap_or(1).max(1)
    }

    pub fn steps_per_row(&self) -> usize {
        self.steps.len()
    }

    /// Resolve the value a field-mapped input step should receive for a given row.
    pub fn mapped_value<'a>(&self, step_id: &StepId, row: &'a RowData) -> Option<&'a str> {
        self.field_mappings
            .iter()
            .find(|m| &m.step_id == step_id)
            .and_then(|m| row.get(&m.column))
            .map(String::as_str)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
