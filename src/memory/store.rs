// src/memory/store.rs — SQLite operations

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

use crate::core::types::{IterationRecord, Specification};

/// Low-level SQLite operations for reports and their children.
pub struct Store {
    conn: Connection,
}

/// Sortable UTC timestamp; microsecond precision keeps insertion order.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    // -- Reports --

    pub fn insert_report(
        &self,
        prompt_text: &str,
        spec: &Specification,
    ) -> anyhow::Result<ReportRow> {
        insert_report_on(&self.conn, prompt_text, spec)
    }

    pub fn get_report(&self, id: &str) -> anyhow::Result<Option<ReportRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, prompt_text, json_spec, created_at FROM reports WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ReportRow {
                        id: row.get(0)?,
                        prompt_text: row.get(1)?,
                        json_spec: json_column(row, 2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Delete a report. Children go with it via ON DELETE CASCADE.
    pub fn delete_report(&self, id: &str) -> anyhow::Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM reports WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }

    /// Report plus all children, each list ordered by creation.
    pub fn get_report_detail(&self, id: &str) -> anyhow::Result<Option<ReportDetail>> {
        let Some(report) = self.get_report(id)? else {
            return Ok(None);
        };
        Ok(Some(ReportDetail {
            evaluations: self.query_evaluations(id)?,
            iterations: self.query_iterations(id)?,
            feedback_logs: self.query_feedback_logs(id)?,
            id: report.id,
            prompt_text: report.prompt_text,
            json_spec: report.json_spec,
            created_at: report.created_at,
        }))
    }

    // -- Evaluations --

    pub fn insert_evaluation(
        &self,
        report_id: &str,
        score: f64,
        comments: &str,
    ) -> anyhow::Result<EvaluationRow> {
        let row = EvaluationRow {
            id: new_id(),
            score,
            comments: comments.to_string(),
            created_at: now(),
        };
        self.conn.execute(
            "INSERT INTO evaluations (id, report_id, score, comments, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.id, report_id, row.score, row.comments, row.created_at],
        )?;
        Ok(row)
    }

    pub fn query_evaluations(&self, report_id: &str) -> anyhow::Result<Vec<EvaluationRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, score, comments, created_at FROM evaluations
             WHERE report_id = ?1 ORDER BY created_at, rowid",
        )?;

        let rows = stmt.query_map(params![report_id], |row| {
            Ok(EvaluationRow {
                id: row.get(0)?,
                score: row.get(1)?,
                comments: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Iterations --

    pub fn query_iterations(&self, report_id: &str) -> anyhow::Result<Vec<IterationRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, iteration_number, before_json, after_json, score_before,
             score_after, feedback, comments_after, created_at
             FROM iterations WHERE report_id = ?1 ORDER BY created_at, rowid",
        )?;

        let rows = stmt.query_map(params![report_id], |row| {
            Ok(IterationRow {
                id: row.get(0)?,
                iteration_number: row.get(1)?,
                before_json: json_column(row, 2)?,
                after_json: json_column(row, 3)?,
                score_before: row.get(4)?,
                score_after: row.get(5)?,
                feedback: row.get(6)?,
                comments_after: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Feedback logs --

    pub fn query_feedback_logs(&self, report_id: &str) -> anyhow::Result<Vec<FeedbackLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, feedback, created_at FROM feedback_logs
             WHERE report_id = ?1 ORDER BY created_at, rowid",
        )?;

        let rows = stmt.query_map(params![report_id], |row| {
            Ok(FeedbackLogRow {
                id: row.get(0)?,
                feedback: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Iteration runs --

    /// Persist a report, every iteration record, and one feedback log per
    /// non-empty feedback string in a single transaction.
    pub fn record_iteration_run(
        &self,
        prompt_text: &str,
        initial_spec: &Specification,
        history: &[IterationRecord],
    ) -> anyhow::Result<ReportRow> {
        let tx = self.conn.unchecked_transaction()?;
        let report = insert_report_on(&tx, prompt_text, initial_spec)?;
        for record in history {
            insert_iteration_on(&tx, &report.id, record)?;
            if !record.feedback.is_empty() {
                insert_feedback_on(&tx, &report.id, &record.feedback)?;
            }
        }
        tx.commit()?;
        Ok(report)
    }

    // -- Values journal --

    pub fn insert_value_log(
        &self,
        honesty: &str,
        integrity: &str,
        discipline: &str,
        gratitude: &str,
    ) -> anyhow::Result<ValueLogRow> {
        let row = ValueLogRow {
            id: new_id(),
            honesty: honesty.to_string(),
            integrity: integrity.to_string(),
            discipline: discipline.to_string(),
            gratitude: gratitude.to_string(),
            created_at: now(),
        };
        self.conn.execute(
            "INSERT INTO value_logs (id, honesty, integrity, discipline, gratitude, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.honesty,
                row.integrity,
                row.discipline,
                row.gratitude,
                row.created_at
            ],
        )?;
        Ok(row)
    }

    /// Most recent value logs, newest first.
    pub fn query_recent_value_logs(&self, limit: u32) -> anyhow::Result<Vec<ValueLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, honesty, integrity, discipline, gratitude, created_at
             FROM value_logs ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(ValueLogRow {
                id: row.get(0)?,
                honesty: row.get(1)?,
                integrity: row.get(2)?,
                discipline: row.get(3)?,
                gratitude: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Raw connection, used by tests that inspect child tables directly.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn insert_report_on(
    conn: &Connection,
    prompt_text: &str,
    spec: &Specification,
) -> anyhow::Result<ReportRow> {
    let row = ReportRow {
        id: new_id(),
        prompt_text: prompt_text.to_string(),
        json_spec: spec.to_value()?,
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO reports (id, prompt_text, json_spec, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![row.id, row.prompt_text, row.json_spec.to_string(), row.created_at],
    )?;
    Ok(row)
}

fn insert_iteration_on(
    conn: &Connection,
    report_id: &str,
    record: &IterationRecord,
) -> anyhow::Result<IterationRow> {
    let row = IterationRow {
        id: new_id(),
        iteration_number: record.iteration_number,
        before_json: record.before_json.to_value()?,
        after_json: record.after_json.to_value()?,
        score_before: record.score_before,
        score_after: record.score_after,
        feedback: record.feedback.clone(),
        comments_after: record.comments_after.clone(),
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO iterations (id, report_id, iteration_number, before_json, after_json,
         score_before, score_after, feedback, comments_after, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            row.id,
            report_id,
            row.iteration_number,
            row.before_json.to_string(),
            row.after_json.to_string(),
            row.score_before,
            row.score_after,
            row.feedback,
            row.comments_after,
            row.created_at
        ],
    )?;
    Ok(row)
}

fn insert_feedback_on(
    conn: &Connection,
    report_id: &str,
    feedback: &str,
) -> anyhow::Result<FeedbackLogRow> {
    let row = FeedbackLogRow {
        id: new_id(),
        feedback: feedback.to_string(),
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO feedback_logs (id, report_id, feedback, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![row.id, report_id, row.feedback, row.created_at],
    )?;
    Ok(row)
}

// -- Row types --

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub prompt_text: String,
    pub json_spec: Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRow {
    pub id: String,
    pub score: f64,
    pub comments: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IterationRow {
    pub id: String,
    pub iteration_number: u32,
    pub before_json: Value,
    pub after_json: Value,
    pub score_before: f64,
    pub score_after: f64,
    pub feedback: String,
    pub comments_after: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackLogRow {
    pub id: String,
    pub feedback: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueLogRow {
    pub id: String,
    pub honesty: String,
    pub integrity: String,
    pub discipline: String,
    pub gratitude: String,
    pub created_at: String,
}

/// A report with its nested history.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDetail {
    pub id: String,
    pub prompt_text: String,
    pub json_spec: Value,
    pub created_at: String,
    pub evaluations: Vec<EvaluationRow>,
    pub iterations: Vec<IterationRow>,
    pub feedback_logs: Vec<FeedbackLogRow>,
}
