//! Batch runner
//!
//! Evaluates a batch of rule cases over one shared [`ResolutionContext`],
//! either one after another or as concurrent tokio tasks. A store failure
//! aborts the batch: rules that had not finished are reported as cancelled
//! and the report carries the store error.

use crate::engine::{
    CancellationFlag, EvaluationResult, ResolutionContext, RuleEngine, RuleError, StoreError,
};
use crate::validator::testset::RuleCase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RuleStatus {
    Passed,
    Failed,
    /// The rule could not be lexed, parsed or evaluated
    Invalid { error: String },
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub id: String,
    pub rule: String,
    #[serde(flatten)]
    pub status: RuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
}

impl RuleReport {
    fn new(case: &RuleCase, status: RuleStatus) -> Self {
        Self {
            id: case.id.clone(),
            rule: case.rule.clone(),
            status,
            result: None,
        }
    }

    fn evaluated(case: &RuleCase, result: EvaluationResult) -> Self {
        let status = if result.verdict {
            RuleStatus::Passed
        } else {
            RuleStatus::Failed
        };
        Self {
            result: Some(result),
            ..Self::new(case, status)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<RuleReport>,
    /// Store error that aborted the batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl BatchReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            results: Vec::new(),
            aborted: None,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        log::info!(
            "Run {}: {} passed, {} failed, {} invalid, {} cancelled",
            self.run_id,
            self.passed(),
            self.failed(),
            self.invalid(),
            self.cancelled()
        );
        self
    }

    fn count(&self, matches: impl Fn(&RuleStatus) -> bool) -> usize {
        self.results.iter().filter(|r| matches(&r.status)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|s| *s == RuleStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| *s == RuleStatus::Failed)
    }

    pub fn invalid(&self) -> usize {
        self.count(|s| matches!(s, RuleStatus::Invalid { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| *s == RuleStatus::Cancelled)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Every rule passed and the batch ran to completion
    pub fn is_success(&self) -> bool {
        !self.is_aborted() && self.passed() == self.results.len()
    }

    /// Record one rule outcome
    fn record(&mut self, case: &RuleCase, outcome: Result<EvaluationResult, RuleError>) {
        let report = match outcome {
            Ok(result) => RuleReport::evaluated(case, result),
            Err(RuleError::Store(e)) => {
                self.abort(e);
                RuleReport::new(case, RuleStatus::Cancelled)
            }
            Err(RuleError::Cancelled) => RuleReport::new(case, RuleStatus::Cancelled),
            Err(e) => {
                log::warn!("Rule {} is invalid: {}", case.id, e);
                RuleReport::new(
                    case,
                    RuleStatus::Invalid {
                        error: e.to_string(),
                    },
                )
            }
        };
        self.results.push(report);
    }

    fn abort(&mut self, error: StoreError) {
        if self.aborted.is_none() {
            log::error!("Batch {} aborted: {}", self.run_id, error);
            self.aborted = Some(error.to_string());
        }
    }
}

/// Runs rule cases against one resolution context
pub struct BatchRunner {
    engine: RuleEngine,
    ctx: Arc<ResolutionContext>,
    concurrency: usize,
    cancel: CancellationFlag,
}

impl BatchRunner {
    pub fn new(engine: RuleEngine, ctx: Arc<ResolutionContext>) -> Self {
        Self {
            engine,
            ctx,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: CancellationFlag::new(),
        }
    }

    /// Limit the number of rules evaluated at once by `run_concurrent`
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Flag that cancels this runner's remaining rules when set.
    ///
    /// The runner sets it itself when a store failure aborts a batch.
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Evaluate the cases one after another, in order
    pub async fn run(&self, cases: &[RuleCase]) -> BatchReport {
        let mut report = BatchReport::start();
        for case in cases {
            let outcome = self
                .engine
                .evaluate_with_cancel(&case.rule, &self.ctx, &self.cancel)
                .await;
            if matches!(outcome, Err(RuleError::Store(_))) {
                self.cancel.cancel();
            }
            report.record(case, outcome);
        }
        report.finish()
    }

    /// Evaluate the cases as concurrent tasks; results keep case order
    pub async fn run_concurrent(&self, cases: &[RuleCase]) -> BatchReport {
        let mut report = BatchReport::start();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let mut handles = Vec::with_capacity(cases.len());
        for case in cases {
            let engine = self.engine.clone();
            let ctx = self.ctx.clone();
            let cancel = self.cancel.clone();
            let semaphore = semaphore.clone();
            let rule = case.rule.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = engine.evaluate_with_cancel(&rule, &ctx, &cancel).await;
                if matches!(outcome, Err(RuleError::Store(_))) {
                    cancel.cancel();
                }
                outcome
            }));
        }

        for (case, handle) in cases.iter().zip(handles) {
            match handle.await {
                Ok(outcome) => report.record(case, outcome),
                Err(e) => {
                    log::error!("Rule {} task failed: {}", case.id, e);
                    report.results.push(RuleReport::new(
                        case,
                        RuleStatus::Invalid {
                            error: format!("task failed: {}", e),
                        },
                    ));
                }
            }
        }
        report.finish()
    }
}
