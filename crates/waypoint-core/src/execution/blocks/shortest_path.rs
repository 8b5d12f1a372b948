//! Shortest path block.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use waypoint_common::types::{DocumentId, MAX_REGISTERS, RegisterId, Value};

use super::{BlockError, BlockInput, BlockResult, ExecutionBlock};
use crate::execution::{DEFAULT_BATCH_SIZE, QueryContext, TupleBatch, WarningCode};
use crate::graph::{GraphAccess, PathResult, ShortestPathFinder};

const INVALID_INPUT: &str =
    "Invalid input for Shortest Path: Only id strings or objects with _id are allowed";

/// Where a path endpoint comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A fixed identifier string.
    Constant(Arc<str>),
    /// The value of an input register, read per row.
    Register(RegisterId),
}

impl Endpoint {
    /// Creates a constant endpoint.
    pub fn constant(id: impl Into<Arc<str>>) -> Self {
        Endpoint::Constant(id.into())
    }

    /// Returns true for a constant endpoint.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Endpoint::Constant(_))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Constant(id) => write!(f, "'{id}'"),
            Endpoint::Register(reg) => write!(f, "register {reg}"),
        }
    }
}

/// Register layout of a shortest path block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPathParams {
    /// Start vertex.
    pub start: Endpoint,
    /// Target vertex.
    pub target: Endpoint,
    /// Register receiving path vertices, if requested.
    pub vertex_register: Option<RegisterId>,
    /// Register receiving path edges, if requested.
    pub edge_register: Option<RegisterId>,
    /// Registers per output row.
    pub register_count: usize,
    /// Registers reset to null in every output batch.
    pub clear_registers: SmallVec<[RegisterId; 4]>,
}

/// Streams the shortest path between two vertices for every input row.
///
/// Per input row the block resolves both endpoints, runs the finder, and then
/// emits one row per path vertex (or per edge when only edges are requested).
/// Each output row inherits the registers of its input row. A path longer
/// than the caller's `at_most` is spread over several calls; a single call
/// never mixes rows of two paths.
///
/// Rows whose endpoints cannot be resolved register a warning and yield
/// nothing. When both endpoints are constants the path is searched once for
/// the lifetime of the block and emitted for the first input row only.
pub struct ShortestPathBlock {
    ctx: Arc<QueryContext>,
    input: BlockInput,
    graph: Arc<dyn GraphAccess>,
    finder: ShortestPathFinder,
    params: ShortestPathParams,
    input_registers: usize,

    /// Current path, overwritten by every search.
    path: PathResult,
    /// Next path row to emit.
    pos_in_path: usize,
    /// Rows of the current path.
    path_length: usize,

    /// Whether the constant/constant path was already used since the last cursor reset.
    used_constant: bool,
    /// Outcome of the constant/constant search, once run.
    constant_found: Option<bool>,
    searches: u64,
}

impl ShortestPathBlock {
    /// Creates a shortest path block over `dependency`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPlan` if any register of `params` lies outside the
    /// layout: endpoint registers must be input registers, output registers
    /// must be distinct new registers.
    pub fn new(
        ctx: Arc<QueryContext>,
        dependency: Box<dyn ExecutionBlock>,
        graph: Arc<dyn GraphAccess>,
        finder: ShortestPathFinder,
        params: ShortestPathParams,
    ) -> Result<Self, BlockError> {
        let input_registers = dependency.register_count();
        validate(&params, input_registers)?;
        tracing::debug!(
            start = %params.start,
            target = %params.target,
            finder = finder.name(),
            collections = finder.collections().len(),
            "shortest path block created"
        );
        Ok(Self {
            input: BlockInput::new(Some(dependency), Arc::clone(ctx.pool()), DEFAULT_BATCH_SIZE),
            ctx,
            graph,
            finder,
            params,
            input_registers,
            path: PathResult::new(),
            pos_in_path: 0,
            path_length: 0,
            used_constant: false,
            constant_found: None,
            searches: 0,
        })
    }

    /// Sets the number of rows requested from the dependency per pull.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.input.set_batch_size(batch_size);
        self
    }

    /// Returns how many searches the finder has run.
    #[must_use]
    pub fn search_count(&self) -> u64 {
        self.searches
    }

    fn uses_constants(&self) -> bool {
        self.params.start.is_constant() && self.params.target.is_constant()
    }

    /// Rows emitted for the current path.
    fn rows_of_path(&self) -> usize {
        if self.params.vertex_register.is_none() && self.params.edge_register.is_some() {
            self.path.length()
        } else {
            self.path.vertex_count()
        }
    }

    fn begin_stream(&mut self) {
        self.pos_in_path = 0;
        self.path_length = self.rows_of_path();
    }

    fn warn_invalid(&self, detail: &str) {
        self.ctx
            .register_warning(WarningCode::BadParameter, format!("{INVALID_INPUT}: {detail}"));
    }

    fn resolve(&self, endpoint: &Endpoint, batch: &TupleBatch, row: usize) -> Option<DocumentId> {
        let resolved = match endpoint {
            Endpoint::Constant(id) => DocumentId::parse(id).map_err(|err| err.to_string()),
            Endpoint::Register(reg) => match batch.value(row, *reg) {
                value @ Value::Object(_) => self
                    .graph
                    .extract_identifier(value)
                    .map_err(|err| err.to_string()),
                Value::String(id) => DocumentId::parse(id).map_err(|err| err.to_string()),
                other => Err(format!("got {}", other.type_name())),
            },
        };
        resolved.map_err(|detail| self.warn_invalid(&detail)).ok()
    }

    /// Computes the path for the current input row.
    ///
    /// Returns false if the row yields no path.
    fn next_path(&mut self) -> Result<bool, BlockError> {
        let constants = self.uses_constants();
        if constants {
            if self.used_constant {
                return Ok(false);
            }
            self.used_constant = true;
            if let Some(found) = self.constant_found {
                if found {
                    self.begin_stream();
                }
                return Ok(found);
            }
        }

        let endpoints = {
            let Some((batch, row)) = self.input.current() else {
                return Err(BlockError::Internal("no input row to compute a path for".into()));
            };
            self.resolve(&self.params.start, batch, row).and_then(|start| {
                self.resolve(&self.params.target, batch, row)
                    .map(|target| (start, target))
            })
        };
        let Some((start, target)) = endpoints else {
            if constants {
                self.constant_found = Some(false);
            }
            return Ok(false);
        };

        self.path.clear();
        self.searches += 1;
        let found = self.finder.shortest_path(
            self.graph.as_ref(),
            &start,
            &target,
            &mut self.path,
            &mut || self.ctx.check_killed(),
        )?;
        tracing::debug!(
            %start,
            %target,
            found,
            length = self.path.length(),
            weight = self.path.weight(),
            "shortest path search"
        );

        if constants {
            self.constant_found = Some(found);
        }
        if found {
            self.begin_stream();
        }
        Ok(found)
    }

    /// Moves to an input row with a non-empty path. Returns false once the
    /// input is exhausted.
    fn ensure_path(&mut self, at_most: usize) -> Result<bool, BlockError> {
        while self.pos_in_path >= self.path_length {
            if !self.input.ensure_row(at_most)? {
                return Ok(false);
            }
            let found = self.next_path()?;
            if !found || self.path_length == 0 {
                self.input.advance();
            }
        }
        Ok(true)
    }

    /// Consumes `n` path rows, releasing the input row at the end of the path.
    fn consume(&mut self, n: usize) {
        self.pos_in_path += n;
        if self.pos_in_path >= self.path_length {
            self.input.advance();
        }
    }

    fn emit(&mut self, at_most: usize) -> Result<TupleBatch, BlockError> {
        let to_send = at_most.min(self.path_length - self.pos_in_path);
        let mut out = self.input.pool().request(to_send, self.params.register_count);
        {
            let Some((batch, row)) = self.input.current() else {
                return Err(BlockError::Internal("no input row to stream a path for".into()));
            };
            out.copy_row_from(0, batch, row, self.input_registers);
        }

        // Without vertex output, row i carries the edge leading into vertex i + 1.
        let edge_offset = usize::from(self.params.vertex_register.is_none());
        let graph = self.graph.as_ref();
        for j in 0..to_send {
            let pos = self.pos_in_path + j;
            out.copy_values_from_row(0, j, self.input_registers);
            if let Some(reg) = self.params.vertex_register {
                out.set_value(j, reg, self.path.vertex_to_value(graph, pos));
            }
            if let Some(reg) = self.params.edge_register {
                out.set_value(j, reg, self.path.edge_to_value(graph, pos + edge_offset));
            }
        }
        self.consume(to_send);

        for &reg in &self.params.clear_registers {
            out.clear_register(reg);
        }
        Ok(out)
    }
}

fn validate(params: &ShortestPathParams, input_registers: usize) -> Result<(), BlockError> {
    let registers = params.register_count;
    if registers > MAX_REGISTERS || registers < input_registers {
        return Err(BlockError::InvalidPlan(format!(
            "shortest path block has {registers} registers for {input_registers} input registers"
        )));
    }
    for endpoint in [&params.start, &params.target] {
        if let Endpoint::Register(reg) = endpoint {
            if *reg >= input_registers {
                return Err(BlockError::InvalidPlan(format!(
                    "endpoint register {reg} is not an input register"
                )));
            }
        }
    }
    for reg in [params.vertex_register, params.edge_register].into_iter().flatten() {
        if reg < input_registers || reg >= registers {
            return Err(BlockError::InvalidPlan(format!(
                "output register {reg} outside {input_registers}..{registers}"
            )));
        }
    }
    if params.vertex_register.is_some() && params.vertex_register == params.edge_register {
        return Err(BlockError::InvalidPlan(
            "vertex and edge output share a register".into(),
        ));
    }
    if let Some(reg) = params.clear_registers.iter().find(|reg| **reg >= registers) {
        return Err(BlockError::InvalidPlan(format!("cannot clear register {reg}")));
    }
    Ok(())
}

impl ExecutionBlock for ShortestPathBlock {
    fn initialize_cursor(&mut self, items: Option<&TupleBatch>, pos: usize) -> Result<(), BlockError> {
        self.pos_in_path = 0;
        self.path_length = 0;
        self.used_constant = false;
        self.input.initialize_cursor(items, pos)
    }

    fn get_some(&mut self, at_most: usize) -> BlockResult {
        self.ctx.check_killed()?;
        if at_most == 0 || !self.ensure_path(at_most)? {
            return Ok(None);
        }
        self.emit(at_most).map(Some)
    }

    fn skip_some(&mut self, at_most: usize) -> Result<usize, BlockError> {
        self.ctx.check_killed()?;
        let mut skipped = 0;
        while skipped < at_most && self.ensure_path(at_most - skipped)? {
            let n = (at_most - skipped).min(self.path_length - self.pos_in_path);
            self.consume(n);
            skipped += n;
        }
        Ok(skipped)
    }

    fn register_count(&self) -> usize {
        self.params.register_count
    }

    fn name(&self) -> &'static str {
        "ShortestPath"
    }
}
