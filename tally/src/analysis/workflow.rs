//! The analysis workflow as a static table, and the graph built from it.
//!
//! [`WORKFLOW`] lists every node with its outgoing edge; it can be inspected (and the
//! graph compiled) without touching any capability. [`build_graph`] pairs each entry
//! with its handler.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, Node, StateGraph, END, START,
};
use crate::llm::LlmClient;
use crate::state::AnalysisState;
use crate::warehouse::{QueryEngine, SchemaSource};

use super::nodes::{
    ClassifyIntentNode, ExecuteQueryNode, FetchSchemaNode, GenerateInsightsNode,
    GenerateQueryNode, HandleErrorNode,
};
use super::routes::{route_after_execute_query, route_after_generate_query, route_after_handle_error};
use super::{AnalyzerConfig, RetryCeiling};

/// Identifier of one workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    ClassifyIntent,
    FetchSchema,
    GenerateQuery,
    ExecuteQuery,
    GenerateInsights,
    HandleError,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::ClassifyIntent => "classify_intent",
            NodeId::FetchSchema => "fetch_schema",
            NodeId::GenerateQuery => "generate_query",
            NodeId::ExecuteQuery => "execute_query",
            NodeId::GenerateInsights => "generate_insights",
            NodeId::HandleError => "handle_error",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an edge leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    End,
}

impl Target {
    /// Id used in the compiled graph (`END` for the terminal).
    pub fn graph_id(&self) -> &'static str {
        match self {
            Target::Node(id) => id.as_str(),
            Target::End => END,
        }
    }
}

/// Router predicate attached to a conditional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Router {
    AfterGenerateQuery,
    AfterExecuteQuery,
    AfterHandleError,
}

impl Router {
    /// Branch label for `state`.
    pub fn route(&self, state: &AnalysisState, ceiling: RetryCeiling) -> &'static str {
        match self {
            Router::AfterGenerateQuery => route_after_generate_query(state).label(),
            Router::AfterExecuteQuery => route_after_execute_query(state).label(),
            Router::AfterHandleError => route_after_handle_error(state, ceiling).label(),
        }
    }
}

/// Outgoing edge of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSpec {
    Static(Target),
    Conditional {
        router: Router,
        branches: &'static [(&'static str, Target)],
    },
}

/// One row of the workflow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowEntry {
    pub id: NodeId,
    pub edge: EdgeSpec,
}

/// First node of every run.
pub const ENTRY: NodeId = NodeId::ClassifyIntent;

/// Every node and its outgoing edge.
pub const WORKFLOW: [WorkflowEntry; 6] = [
    WorkflowEntry {
        id: NodeId::ClassifyIntent,
        edge: EdgeSpec::Static(Target::Node(NodeId::FetchSchema)),
    },
    WorkflowEntry {
        id: NodeId::FetchSchema,
        edge: EdgeSpec::Static(Target::Node(NodeId::GenerateQuery)),
    },
    WorkflowEntry {
        id: NodeId::GenerateQuery,
        edge: EdgeSpec::Conditional {
            router: Router::AfterGenerateQuery,
            branches: &[
                ("execute", Target::Node(NodeId::ExecuteQuery)),
                ("error", Target::Node(NodeId::HandleError)),
            ],
        },
    },
    WorkflowEntry {
        id: NodeId::ExecuteQuery,
        edge: EdgeSpec::Conditional {
            router: Router::AfterExecuteQuery,
            branches: &[
                ("insights", Target::Node(NodeId::GenerateInsights)),
                ("error", Target::Node(NodeId::HandleError)),
            ],
        },
    },
    WorkflowEntry {
        id: NodeId::GenerateInsights,
        edge: EdgeSpec::Static(Target::End),
    },
    WorkflowEntry {
        id: NodeId::HandleError,
        edge: EdgeSpec::Conditional {
            router: Router::AfterHandleError,
            branches: &[
                ("retry", Target::Node(NodeId::GenerateQuery)),
                ("end", Target::End),
            ],
        },
    },
];

/// Capability ports the nodes call.
#[derive(Clone)]
pub struct Capabilities {
    pub llm: Arc<dyn LlmClient>,
    pub schema: Arc<dyn SchemaSource>,
    pub engine: Arc<dyn QueryEngine>,
}

fn handler(
    id: NodeId,
    capabilities: &Capabilities,
    config: &AnalyzerConfig,
) -> Arc<dyn Node<AnalysisState>> {
    let deadline = config.call_timeout;
    match id {
        NodeId::ClassifyIntent => {
            Arc::new(ClassifyIntentNode::new(capabilities.llm.clone(), deadline))
        }
        NodeId::FetchSchema => Arc::new(FetchSchemaNode::new(capabilities.schema.clone(), deadline)),
        NodeId::GenerateQuery => {
            Arc::new(GenerateQueryNode::new(capabilities.llm.clone(), deadline))
        }
        NodeId::ExecuteQuery => {
            Arc::new(ExecuteQueryNode::new(capabilities.engine.clone(), deadline))
        }
        NodeId::GenerateInsights => {
            Arc::new(GenerateInsightsNode::new(capabilities.llm.clone(), deadline))
        }
        NodeId::HandleError => Arc::new(HandleErrorNode::new(config.retry_ceiling)),
    }
}

/// Compiles [`WORKFLOW`] into a graph whose nodes call `capabilities`.
///
/// The step limit comes from the retry ceiling; `config.verbose` adds the node
/// enter/exit middleware.
pub fn build_graph(
    capabilities: &Capabilities,
    config: &AnalyzerConfig,
) -> Result<CompiledStateGraph<AnalysisState>, CompilationError> {
    let ceiling = config.retry_ceiling;
    let mut graph = StateGraph::<AnalysisState>::new().with_step_limit(ceiling.step_limit());
    if config.verbose {
        graph = graph.with_middleware(Arc::new(LoggingNodeMiddleware::<AnalysisState>::default()));
    }

    graph.add_edge(START, ENTRY.as_str());
    for entry in WORKFLOW.iter() {
        let id = entry.id.as_str();
        graph.add_node(id, handler(entry.id, capabilities, config));
        match entry.edge {
            EdgeSpec::Static(target) => {
                graph.add_edge(id, target.graph_id());
            }
            EdgeSpec::Conditional { router, branches } => {
                let path_map: BTreeMap<String, String> = branches
                    .iter()
                    .map(|(label, target)| (label.to_string(), target.graph_id().to_string()))
                    .collect();
                graph.add_conditional_edges(
                    id,
                    Arc::new(move |state: &AnalysisState| router.route(state, ceiling).to_string()),
                    Some(path_map),
                );
            }
        }
    }
    graph.compile()
}
