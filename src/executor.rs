//! The execution collaborator: the one seam through which rendered statements
//! reach a database.
//!
//! The crate never opens connections. An [`Executor`] receives the SQL text,
//! the parameters to bind (if any), and the [`OperationTag`] of the builder
//! operation that produced it. Closures with the matching signature are
//! executors too, so a test or a small script can pass `|sql, params, tag| ..`.

use std::io::Write;

use serde_json::{Map, Value};

use crate::{
    error::ExecutionError,
    statement::{OperationTag, Params},
};

/// One result row, keyed by result column name.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows returned by a query (the validate statements).
    Rows(Vec<Row>),
    /// Acknowledgement of a write, with the affected row count when known.
    Affected(u64),
}

impl Outcome {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Outcome::Rows(rows) => rows,
            Outcome::Affected(_) => Vec::new(),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            Outcome::Rows(rows) => rows.len() as u64,
            Outcome::Affected(count) => *count,
        }
    }
}

pub trait Executor {
    fn execute(
        &mut self,
        sql: &str,
        params: Option<&Params>,
        tag: OperationTag,
    ) -> Result<Outcome, ExecutionError>;
}

impl<F> Executor for F
where
    F: FnMut(&str, Option<&Params>, OperationTag) -> Result<Outcome, ExecutionError>,
{
    fn execute(
        &mut self,
        sql: &str,
        params: Option<&Params>,
        tag: OperationTag,
    ) -> Result<Outcome, ExecutionError> {
        self(sql, params, tag)
    }
}

/// Writes each statement to `out` instead of running it. Queries yield no rows
/// and writes report zero affected rows.
#[derive(Debug)]
pub struct DumpExecutor<W: Write> {
    out: W,
}

impl<W: Write> DumpExecutor<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Executor for DumpExecutor<W> {
    fn execute(
        &mut self,
        sql: &str,
        params: Option<&Params>,
        tag: OperationTag,
    ) -> Result<Outcome, ExecutionError> {
        writeln!(self.out, "-- {tag}")?;
        if let Some(params) = params {
            for (name, value) in params {
                writeln!(self.out, "-- :{name} = {value}")?;
            }
        }
        writeln!(self.out, "{sql};")?;
        writeln!(self.out)?;
        if tag.is_query() {
            Ok(Outcome::Rows(Vec::new()))
        } else {
            Ok(Outcome::Affected(0))
        }
    }
}
