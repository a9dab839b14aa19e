use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tds_core::TaskSet;

/// Task sets written by `tdsync plan`, checked before use.
pub fn read_task_sets(path: &Path) -> anyhow::Result<BTreeMap<String, TaskSet>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let task_sets: BTreeMap<String, TaskSet> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a task-set file", path.display()))?;
    for (id, task_set) in &task_sets {
        anyhow::ensure!(
            *id == task_set.datasource_id,
            "task set filed under '{id}' belongs to '{}'",
            task_set.datasource_id
        );
        task_set
            .validate()
            .with_context(|| format!("invalid task set for '{id}'"))?;
    }
    Ok(task_sets)
}
