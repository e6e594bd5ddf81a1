//! Named stage composition over a `ColumnStore`, with per-stage diagnostics.
//!
//! A stage is any `ColumnStore -> Result<ColumnStore>` function; a closure
//! capturing its configuration (a bound threshold, a fixed column list) is an
//! ordinary stage, the runner treats them all uniformly. The runner threads a
//! clone of the caller's store through the stages, so the original is never
//! observed mutated no matter what the stages do.

use crate::error::{Result, ScourError};
use crate::frame::{ColumnStore, DType};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

pub type StageFn = Box<dyn Fn(ColumnStore) -> Result<ColumnStore>>;

/// One named transform in a pipeline. Stateless: the name exists only for
/// diagnostics and error context.
pub struct Stage {
    name: String,
    func: StageFn,
}

impl Stage {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(ColumnStore) -> Result<ColumnStore> + 'static,
    {
        Stage {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Snapshot taken after a stage completes, computed from that stage's output
/// only. Immutable once produced; rendering it is the reporting layer's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub row_count: usize,
    pub dtypes: BTreeMap<String, DType>,
    pub null_counts: BTreeMap<String, usize>,
}

impl StageReport {
    fn capture(stage: &str, store: &ColumnStore) -> StageReport {
        let mut dtypes = BTreeMap::new();
        let mut null_counts = BTreeMap::new();
        for name in store.column_names() {
            // columns come straight off the store, lookups cannot fail
            if let (Ok(dtype), Ok(nulls)) = (store.dtype_of(name), store.null_count(name)) {
                dtypes.insert(name.clone(), dtype);
                null_counts.insert(name.clone(), nulls);
            }
        }
        StageReport {
            stage: stage.to_string(),
            row_count: store.row_count(),
            dtypes,
            null_counts,
        }
    }
}

/// A stage raised a shape/contract error. Carries the diagnostics of every
/// stage that completed before the failure; the failing stage contributes no
/// partial output.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {error}")]
pub struct StageFailure {
    pub stage: String,
    #[source]
    pub error: ScourError,
    pub completed: Vec<StageReport>,
}

/// Ordered sequence of stages run over an initial store.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    /// Builder-style append.
    pub fn stage<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(ColumnStore) -> Result<ColumnStore> + 'static,
    {
        self.stages.push(Stage::new(name, func));
        self
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order, capturing one report per completed stage.
    /// Stops at the first stage error and surfaces it together with the
    /// reports collected so far; later stages never execute.
    pub fn run(
        &self,
        initial: &ColumnStore,
    ) -> std::result::Result<(ColumnStore, Vec<StageReport>), StageFailure> {
        let mut current = initial.clone();
        let mut completed = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            current = match (stage.func)(current) {
                Ok(next) => {
                    info!(
                        "stage '{}' complete: {} row(s) out",
                        stage.name,
                        next.row_count()
                    );
                    completed.push(StageReport::capture(&stage.name, &next));
                    next
                }
                Err(error) => {
                    return Err(StageFailure {
                        stage: stage.name.clone(),
                        error,
                        completed,
                    })
                }
            };
        }
        Ok((current, completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{self, NumericOptions};
    use crate::filter;
    use crate::frame::Column;

    fn users() -> ColumnStore {
        ColumnStore::from_columns(vec![
            (
                "age".to_string(),
                Column::Text(vec![
                    Some("25".to_string()),
                    Some("thirty".to_string()),
                    Some("40".to_string()),
                ]),
            ),
            (
                "score".to_string(),
                Column::Float64(vec![Some(85.5), Some(90.0), None]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_run_threads_stages_and_reports() {
        let pipeline = Pipeline::new()
            .stage("coerce age", |s| {
                coerce::to_numeric(&s, "age", NumericOptions::default())
            })
            .stage("score >= 86", |s| {
                let mask = filter::min_mask(&s, "score", 86.0)?;
                filter::apply(&s, &mask)
            });

        let initial = users();
        let (out, reports) = pipeline.run(&initial).unwrap();

        assert_eq!(out.row_count(), 1);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].stage, "coerce age");
        assert_eq!(reports[0].row_count, 3);
        assert_eq!(reports[0].dtypes["age"], DType::Float64);
        assert_eq!(reports[0].null_counts["age"], 1);
        assert_eq!(reports[1].row_count, 1);
    }

    #[test]
    fn test_run_never_mutates_the_input() {
        let initial = users();
        let pipeline = Pipeline::new().stage("drop everything", |s| {
            let mask = filter::mask_from_bools(&s, &vec![false; s.row_count()])?;
            filter::apply(&s, &mask)
        });
        let (out, _) = pipeline.run(&initial).unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(initial, users());
    }

    #[test]
    fn test_run_stops_on_first_error() {
        let pipeline = Pipeline::new()
            .stage("keep all", Ok)
            .stage("bad column", |s| {
                coerce::to_numeric(&s, "no_such_column", NumericOptions::default())
            })
            .stage("never runs", |_| panic!("stage 3 must not execute"));

        let failure = pipeline.run(&users()).unwrap_err();
        assert_eq!(failure.stage, "bad column");
        assert_eq!(failure.completed.len(), 1);
        assert_eq!(failure.completed[0].stage, "keep all");
        assert!(matches!(failure.error, ScourError::UnknownColumn { .. }));
    }

    #[test]
    fn test_bound_threshold_closure_is_an_ordinary_stage() {
        let threshold = 88.0;
        let pipeline = Pipeline::new().stage("threshold filter", move |s| {
            let mask = filter::min_mask(&s, "score", threshold)?;
            filter::apply(&s, &mask)
        });
        let (out, _) = pipeline.run(&users()).unwrap();
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let (_, reports) = Pipeline::new()
            .stage("noop", Ok)
            .run(&users())
            .unwrap();
        let json = serde_json::to_string(&reports[0]).unwrap();
        assert!(json.contains("\"stage\":\"noop\""));
        assert!(json.contains("\"row_count\":3"));
    }
}
