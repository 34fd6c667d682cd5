// src/memory/store_server.rs — Async message passing for Store

use crate::core::types::{IterationRecord, Specification};
use crate::memory::store::{EvaluationRow, ReportDetail, ReportRow, Store, ValueLogRow};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum StoreCommand {
    InsertReport {
        prompt_text: String,
        spec: Specification,
        resp: oneshot::Sender<anyhow::Result<ReportRow>>,
    },
    GetReport {
        id: String,
        resp: oneshot::Sender<anyhow::Result<Option<ReportRow>>>,
    },
    GetReportDetail {
        id: String,
        resp: oneshot::Sender<anyhow::Result<Option<ReportDetail>>>,
    },
    DeleteReport {
        id: String,
        resp: oneshot::Sender<anyhow::Result<bool>>,
    },
    InsertEvaluation {
        report_id: String,
        score: f64,
        comments: String,
        resp: oneshot::Sender<anyhow::Result<EvaluationRow>>,
    },
    RecordIterationRun {
        prompt_text: String,
        initial_spec: Specification,
        history: Vec<IterationRecord>,
        resp: oneshot::Sender<anyhow::Result<ReportRow>>,
    },
    InsertValueLog {
        honesty: String,
        integrity: String,
        discipline: String,
        gratitude: String,
        resp: oneshot::Sender<anyhow::Result<ValueLogRow>>,
    },
    QueryRecentValueLogs {
        limit: u32,
        resp: oneshot::Sender<anyhow::Result<Vec<ValueLogRow>>>,
    },
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    pub async fn insert_report(
        &self,
        prompt_text: String,
        spec: Specification,
    ) -> anyhow::Result<ReportRow> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::InsertReport {
                prompt_text,
                spec,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn get_report(&self, id: String) -> anyhow::Result<Option<ReportRow>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::GetReport { id, resp: resp_tx })
            .await?;
        resp_rx.await?
    }

    pub async fn get_report_detail(&self, id: String) -> anyhow::Result<Option<ReportDetail>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::GetReportDetail { id, resp: resp_tx })
            .await?;
        resp_rx.await?
    }

    pub async fn delete_report(&self, id: String) -> anyhow::Result<bool> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::DeleteReport { id, resp: resp_tx })
            .await?;
        resp_rx.await?
    }

    pub async fn insert_evaluation(
        &self,
        report_id: String,
        score: f64,
        comments: String,
    ) -> anyhow::Result<EvaluationRow> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::InsertEvaluation {
                report_id,
                score,
                comments,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn record_iteration_run(
        &self,
        prompt_text: String,
        initial_spec: Specification,
        history: Vec<IterationRecord>,
    ) -> anyhow::Result<ReportRow> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::RecordIterationRun {
                prompt_text,
                initial_spec,
                history,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn insert_value_log(
        &self,
        honesty: String,
        integrity: String,
        discipline: String,
        gratitude: String,
    ) -> anyhow::Result<ValueLogRow> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::InsertValueLog {
                honesty,
                integrity,
                discipline,
                gratitude,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn query_recent_value_logs(&self, limit: u32) -> anyhow::Result<Vec<ValueLogRow>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::QueryRecentValueLogs {
                limit,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }
}

/// Helper to spawn the store server and return a handle.
pub fn spawn_store_server(store: Store) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(store, rx));
    (handle, join_handle)
}

/// The background task that owns the Store.
pub async fn run_store_server(store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::InsertReport {
                prompt_text,
                spec,
                resp,
            } => {
                let _ = resp.send(store.insert_report(&prompt_text, &spec));
            }
            StoreCommand::GetReport { id, resp } => {
                let _ = resp.send(store.get_report(&id));
            }
            StoreCommand::GetReportDetail { id, resp } => {
                let _ = resp.send(store.get_report_detail(&id));
            }
            StoreCommand::DeleteReport { id, resp } => {
                let _ = resp.send(store.delete_report(&id));
            }
            StoreCommand::InsertEvaluation {
                report_id,
                score,
                comments,
                resp,
            } => {
                let _ = resp.send(store.insert_evaluation(&report_id, score, &comments));
            }
            StoreCommand::RecordIterationRun {
                prompt_text,
                initial_spec,
                history,
                resp,
            } => {
                let res = store.record_iteration_run(&prompt_text, &initial_spec, &history);
                if let Err(ref e) = res {
                    tracing::error!("Failed to persist iteration run: {e}");
                }
                let _ = resp.send(res);
            }
            StoreCommand::InsertValueLog {
                honesty,
                integrity,
                discipline,
                gratitude,
                resp,
            } => {
                let res = store.insert_value_log(&honesty, &integrity, &discipline, &gratitude);
                let _ = resp.send(res);
            }
            StoreCommand::QueryRecentValueLogs { limit, resp } => {
                let _ = resp.send(store.query_recent_value_logs(limit));
            }
        }
    }
    tracing::debug!("Store server stopped: all handles dropped");
}
