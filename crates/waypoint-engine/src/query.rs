//! Query instantiation and execution.
//!
//! A [`Query`] turns an [`ExecutionPlan`] into a chain of execution blocks
//! sharing one [`QueryContext`], then pulls rows from the last block.

use std::sync::Arc;

use smallvec::SmallVec;
use waypoint_common::types::{RegisterId, Value};
use waypoint_common::utils::error::{Error, Result};
use waypoint_core::execution::BatchPool;
use waypoint_core::graph::GraphAccess;
use waypoint_core::{
    Endpoint, ExecutionBlock, QueryContext, ShortestPathBlock, ShortestPathFinder,
    ShortestPathParams, SingletonBlock, TupleBatch, ValuesBlock, Warning,
};

use crate::config::Config;
use crate::plan::{EndpointRef, ExecutionPlan, PlanNode, RegisterPlan};

/// Rows and warnings of a fully drained query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Returned variables, in order.
    pub columns: Vec<String>,
    /// One entry per row, aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
    /// Warnings registered while running.
    pub warnings: Vec<Warning>,
}

impl QueryResult {
    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the values of one column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Handle that stops a running query from another thread.
#[derive(Debug, Clone)]
pub struct KillHandle {
    ctx: Arc<QueryContext>,
}

impl KillHandle {
    /// Kills the query. Pending and future pulls fail with [`Error::Killed`].
    pub fn kill(&self) {
        self.ctx.kill();
    }

    /// Returns true once the query has been killed.
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.ctx.is_killed()
    }
}

/// An instantiated query.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use waypoint_common::Value;
/// use waypoint_core::{Direction, MemoryGraph};
/// use waypoint_engine::plan::{EndpointRef, ExecutionPlan, ShortestPathNode};
/// use waypoint_engine::{Config, Query};
///
/// let graph = MemoryGraph::new();
/// graph.create_vertex_collection("v").unwrap();
/// graph.create_edge_collection("e").unwrap();
/// let a = graph.insert_vertex("v", Some("a"), Value::Null).unwrap();
/// let b = graph.insert_vertex("v", Some("b"), Value::Null).unwrap();
/// graph.insert_edge("e", None, &a, &b, Value::Null).unwrap();
///
/// let plan = ExecutionPlan::new().shortest_path(
///     ShortestPathNode::new(
///         EndpointRef::Constant("v/a".into()),
///         EndpointRef::Constant("v/b".into()),
///     )
///     .with_vertex_output("vertex")
///     .with_edge_collection("e", Direction::Outbound),
/// );
/// let mut query = Query::new(&plan, Arc::new(graph), &Config::default()).unwrap();
/// assert_eq!(query.execute().unwrap().row_count(), 2);
/// ```
pub struct Query {
    ctx: Arc<QueryContext>,
    root: Box<dyn ExecutionBlock>,
    columns: Vec<String>,
    output_registers: Vec<RegisterId>,
    batch_size: usize,
}

impl Query {
    /// Builds the block chain for `plan` and positions it at the start.
    ///
    /// # Errors
    ///
    /// Returns `Error::Plan` if the plan is malformed or names collections the
    /// graph does not have.
    pub fn new(plan: &ExecutionPlan, graph: Arc<dyn GraphAccess>, config: &Config) -> Result<Self> {
        config.validate()?;
        let registers = plan.register_plan()?;
        let pool = Arc::new(BatchPool::new(config.pool_capacity));
        let ctx = Arc::new(QueryContext::with_pool(Arc::clone(&pool), config.max_warnings));

        let mut root: Option<Box<dyn ExecutionBlock>> = None;
        for (depth, node) in plan.nodes().iter().enumerate() {
            let clear = &registers.regs_to_clear[depth];
            let block: Box<dyn ExecutionBlock> = match (node, root.take()) {
                (PlanNode::Singleton, None) => Box::new(SingletonBlock::new(Arc::clone(&pool), 0)),
                (PlanNode::Values { variables, rows }, Some(dep)) => Box::new(
                    ValuesBlock::new(dep, Arc::clone(&pool), variables.len(), rows.clone())?
                        .with_batch_size(config.batch_size)
                        .with_clear_registers(clear.iter().copied())?,
                ),
                (PlanNode::ShortestPath(sp), Some(dep)) => {
                    let finder = ShortestPathFinder::resolve(graph.as_ref(), &sp.options, &sp.edge_collections)
                        .map_err(|e| Error::Plan(e.to_string()))?;
                    let params = ShortestPathParams {
                        start: endpoint(&sp.start, &registers)?,
                        target: endpoint(&sp.target, &registers)?,
                        vertex_register: output_register(sp.vertex_out.as_deref(), &registers)?,
                        edge_register: output_register(sp.edge_out.as_deref(), &registers)?,
                        register_count: registers.nr_regs[depth],
                        clear_registers: clear.iter().copied().collect::<SmallVec<_>>(),
                    };
                    Box::new(
                        ShortestPathBlock::new(Arc::clone(&ctx), dep, Arc::clone(&graph), finder, params)?
                            .with_batch_size(config.batch_size),
                    )
                }
                _ => return Err(Error::Plan("a plan starts with its only singleton".into())),
            };
            root = Some(block);
        }
        let mut root = root.ok_or_else(|| Error::Plan("empty plan".into()))?;
        root.initialize_cursor(None, 0)?;

        let columns = plan.output_variables();
        let output_registers = columns
            .iter()
            .map(|c| {
                registers
                    .register(c)
                    .ok_or_else(|| Error::Plan(format!("returned variable '{c}' is not defined")))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            nodes = plan.nodes().len(),
            registers = root.register_count(),
            root = root.name(),
            "query instantiated"
        );
        Ok(Self {
            ctx,
            root,
            columns,
            output_registers,
            batch_size: config.batch_size,
        })
    }

    /// Returns the returned variables.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the register holding each returned variable.
    #[must_use]
    pub fn output_registers(&self) -> &[RegisterId] {
        &self.output_registers
    }

    /// Pulls at most `at_most` rows. `None` marks the end of the result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Killed` if the query was killed.
    pub fn get_some(&mut self, at_most: usize) -> Result<Option<TupleBatch>> {
        Ok(self.root.get_some(at_most)?)
    }

    /// Skips at most `at_most` rows and returns how many were skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Killed` if the query was killed.
    pub fn skip_some(&mut self, at_most: usize) -> Result<usize> {
        Ok(self.root.skip_some(at_most)?)
    }

    /// Rewinds the query to its first row.
    ///
    /// # Errors
    ///
    /// Propagates block errors.
    pub fn initialize_cursor(&mut self) -> Result<()> {
        Ok(self.root.initialize_cursor(None, 0)?)
    }

    /// Drains the remaining rows, projecting the returned variables.
    ///
    /// # Errors
    ///
    /// Returns `Error::Killed` if the query was killed while draining.
    pub fn execute(&mut self) -> Result<QueryResult> {
        let mut rows = Vec::new();
        while let Some(batch) = self.get_some(self.batch_size)? {
            for row in batch.rows() {
                rows.push(self.output_registers.iter().map(|&r| row[r].clone()).collect());
            }
            self.ctx.pool().give_back(batch);
        }
        tracing::debug!(rows = rows.len(), warnings = self.ctx.warning_count(), "query drained");
        Ok(QueryResult {
            columns: self.columns.clone(),
            rows,
            warnings: self.ctx.warnings(),
        })
    }

    /// Returns a handle that can kill this query from another thread.
    #[must_use]
    pub fn kill_handle(&self) -> KillHandle {
        KillHandle {
            ctx: Arc::clone(&self.ctx),
        }
    }

    /// Returns the warnings registered so far.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.ctx.warnings()
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("root", &self.root.name())
            .field("columns", &self.columns)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

fn endpoint(source: &EndpointRef, registers: &RegisterPlan) -> Result<Endpoint> {
    match source {
        EndpointRef::Constant(id) => Ok(Endpoint::constant(id.as_str())),
        EndpointRef::Variable(name) => registers
            .register(name)
            .map(Endpoint::Register)
            .ok_or_else(|| Error::Plan(format!("variable '{name}' is not defined"))),
    }
}

fn output_register(variable: Option<&str>, registers: &RegisterPlan) -> Result<Option<RegisterId>> {
    variable
        .map(|name| {
            registers
                .register(name)
                .ok_or_else(|| Error::Plan(format!("variable '{name}' is not defined")))
        })
        .transpose()
}
