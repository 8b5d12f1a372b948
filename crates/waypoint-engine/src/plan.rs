//! Execution plans and register planning.
//!
//! A plan is a linear chain of nodes starting at a singleton. Each node may
//! introduce variables; the register plan maps every variable to a register
//! and records how many registers rows carry after each node.

use indexmap::IndexMap;
use waypoint_common::types::{RegisterId, Value};
use waypoint_common::utils::error::{Error, Result};
use waypoint_core::{Direction, ShortestPathOptions};

/// Where a shortest path endpoint comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointRef {
    /// A fixed `collection/key` identifier.
    Constant(String),
    /// A variable introduced by an earlier node.
    Variable(String),
}

/// A shortest path node.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPathNode {
    /// Start vertex.
    pub start: EndpointRef,
    /// Target vertex.
    pub target: EndpointRef,
    /// Variable receiving path vertices.
    pub vertex_out: Option<String>,
    /// Variable receiving path edges.
    pub edge_out: Option<String>,
    /// Edge collections to follow, with their direction.
    pub edge_collections: Vec<(String, Direction)>,
    /// Weight configuration.
    pub options: ShortestPathOptions,
}

impl ShortestPathNode {
    /// Creates a node between two endpoints over no collections and with no outputs.
    #[must_use]
    pub fn new(start: EndpointRef, target: EndpointRef) -> Self {
        Self {
            start,
            target,
            vertex_out: None,
            edge_out: None,
            edge_collections: Vec::new(),
            options: ShortestPathOptions::default(),
        }
    }

    /// Binds path vertices to `variable`.
    #[must_use]
    pub fn with_vertex_output(mut self, variable: impl Into<String>) -> Self {
        self.vertex_out = Some(variable.into());
        self
    }

    /// Binds path edges to `variable`.
    #[must_use]
    pub fn with_edge_output(mut self, variable: impl Into<String>) -> Self {
        self.edge_out = Some(variable.into());
        self
    }

    /// Follows `collection` in `direction`.
    #[must_use]
    pub fn with_edge_collection(mut self, collection: impl Into<String>, direction: Direction) -> Self {
        self.edge_collections.push((collection.into(), direction));
        self
    }

    /// Sets the weight configuration.
    #[must_use]
    pub fn with_options(mut self, options: ShortestPathOptions) -> Self {
        self.options = options;
        self
    }

    fn endpoint_variables(&self) -> impl Iterator<Item = &str> {
        [&self.start, &self.target].into_iter().filter_map(|e| match e {
            EndpointRef::Variable(name) => Some(name.as_str()),
            EndpointRef::Constant(_) => None,
        })
    }
}

/// A node of an execution plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Produces one empty row.
    Singleton,

    /// Emits a constant table per input row.
    Values {
        /// One variable per column.
        variables: Vec<String>,
        /// Table rows.
        rows: Vec<Vec<Value>>,
    },

    /// Streams a shortest path per input row.
    ShortestPath(ShortestPathNode),
}

impl PlanNode {
    /// Variables introduced by this node.
    fn defines(&self) -> Vec<&str> {
        match self {
            PlanNode::Singleton => Vec::new(),
            PlanNode::Values { variables, .. } => variables.iter().map(String::as_str).collect(),
            PlanNode::ShortestPath(node) => node
                .vertex_out
                .iter()
                .chain(node.edge_out.iter())
                .map(String::as_str)
                .collect(),
        }
    }

    /// Variables read by this node.
    fn uses(&self) -> Vec<&str> {
        match self {
            PlanNode::ShortestPath(node) => node.endpoint_variables().collect(),
            PlanNode::Singleton | PlanNode::Values { .. } => Vec::new(),
        }
    }
}

/// Variable to register assignment of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPlan {
    /// Register of every variable, in definition order.
    pub var_info: IndexMap<String, RegisterId>,
    /// Registers per row after the node at each depth.
    pub nr_regs: Vec<usize>,
    /// Registers no longer needed after the node at each depth.
    pub regs_to_clear: Vec<Vec<RegisterId>>,
}

impl RegisterPlan {
    /// Returns the register of a variable.
    #[must_use]
    pub fn register(&self, variable: &str) -> Option<RegisterId> {
        self.var_info.get(variable).copied()
    }
}

/// A linear execution plan.
///
/// # Examples
///
/// ```
/// use waypoint_core::Direction;
/// use waypoint_engine::plan::{EndpointRef, ExecutionPlan, ShortestPathNode};
///
/// let plan = ExecutionPlan::new().shortest_path(
///     ShortestPathNode::new(
///         EndpointRef::Constant("cities/berlin".into()),
///         EndpointRef::Constant("cities/rome".into()),
///     )
///     .with_vertex_output("v")
///     .with_edge_collection("roads", Direction::Any),
/// );
/// assert_eq!(plan.register_plan().unwrap().nr_regs, vec![0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    nodes: Vec<PlanNode>,
    returning: Option<Vec<String>>,
}

impl ExecutionPlan {
    /// Creates a plan holding only the singleton root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![PlanNode::Singleton],
            returning: None,
        }
    }

    /// Appends a values node.
    #[must_use]
    pub fn values(mut self, variables: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        self.nodes.push(PlanNode::Values { variables, rows });
        self
    }

    /// Appends a shortest path node.
    #[must_use]
    pub fn shortest_path(mut self, node: ShortestPathNode) -> Self {
        self.nodes.push(PlanNode::ShortestPath(node));
        self
    }

    /// Restricts the result to the given variables. By default every
    /// variable is returned.
    #[must_use]
    pub fn returning(mut self, variables: Vec<String>) -> Self {
        self.returning = Some(variables);
        self
    }

    /// Returns the nodes, root first.
    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Returns the variables in the result, in order.
    #[must_use]
    pub fn output_variables(&self) -> Vec<String> {
        match &self.returning {
            Some(variables) => variables.clone(),
            None => self
                .nodes
                .iter()
                .flat_map(PlanNode::defines)
                .map(str::to_string)
                .collect(),
        }
    }

    /// Assigns registers to variables and checks that the plan is well formed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Plan` if the root is not a singleton, a variable is
    /// defined twice or used before its definition, a shortest path node has
    /// no edge collection, or a returned variable does not exist.
    pub fn register_plan(&self) -> Result<RegisterPlan> {
        if self.nodes.first() != Some(&PlanNode::Singleton)
            || self.nodes[1..].contains(&PlanNode::Singleton)
        {
            return Err(Error::Plan("a plan starts with its only singleton".into()));
        }

        let mut var_info: IndexMap<String, RegisterId> = IndexMap::new();
        let mut nr_regs = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            for used in node.uses() {
                if !var_info.contains_key(used) {
                    return Err(Error::Plan(format!("variable '{used}' is not defined")));
                }
            }
            if let PlanNode::ShortestPath(sp) = node {
                if sp.edge_collections.is_empty() {
                    return Err(Error::Plan("shortest path needs an edge collection".into()));
                }
            }
            if let PlanNode::Values { variables, rows } = node {
                if let Some(row) = rows.iter().find(|row| row.len() > variables.len()) {
                    return Err(Error::Plan(format!(
                        "values row has {} columns for {} variables",
                        row.len(),
                        variables.len()
                    )));
                }
            }
            for defined in node.defines() {
                let next = var_info.len();
                if var_info.insert(defined.to_string(), next).is_some() {
                    return Err(Error::Plan(format!("variable '{defined}' is defined twice")));
                }
            }
            nr_regs.push(var_info.len());
        }

        let output = self.output_variables();
        if let Some(missing) = output.iter().find(|v| !var_info.contains_key(v.as_str())) {
            return Err(Error::Plan(format!("returned variable '{missing}' is not defined")));
        }

        // A register is cleared after the last node that needs it, unless returned.
        let mut regs_to_clear = vec![Vec::new(); self.nodes.len()];
        for (variable, &register) in &var_info {
            if output.iter().any(|v| v == variable) {
                continue;
            }
            let defined_at = self
                .nodes
                .iter()
                .position(|n| n.defines().contains(&variable.as_str()))
                .unwrap_or(0);
            let last_use = self
                .nodes
                .iter()
                .rposition(|n| n.uses().contains(&variable.as_str()))
                .unwrap_or(defined_at)
                .max(defined_at);
            regs_to_clear[last_use].push(register);
        }

        Ok(RegisterPlan {
            var_info,
            nr_regs,
            regs_to_clear,
        })
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}
