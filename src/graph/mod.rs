//! The learning flow graph: nodes, edges, and the persisted flow document.

pub mod builder;
pub mod layout;

pub use builder::{FlowAssembler, GeneratedUnit};
pub use layout::{GridLayout, LayoutConfig, Position};

use crate::activity::ActivityPayload;
use crate::error::SynthesisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Reading,
    Assessment,
    Recovery,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Unconditional,
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub title: String,
    pub description: String,
    pub payload: ActivityPayload,
    pub position: Position,
}

/// A directed edge. Conditional edges carry an opaque script evaluated by the
/// runtime collaborator; this engine never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub kind: EdgeKind,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_script: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMetadata {
    pub macro_subject: String,
    pub education_level: String,
    pub language: String,
    /// Estimated completion time in minutes.
    pub estimated_duration: u32,
    pub created_at: DateTime<Utc>,
}

/// The complete flow document submitted to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningFlow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub topics: Vec<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: FlowMetadata,
}

impl LearningFlow {
    /// Check the structural invariants every assembled flow must satisfy.
    ///
    /// Rules, per node kind: reading nodes have exactly one unconditional
    /// outgoing edge, assessments exactly one pass and one fail (the fail
    /// target being a recovery node), recovery nodes exactly one pass edge,
    /// and the single terminal node none at all.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        let mut by_id: HashMap<&str, &GraphNode> = HashMap::new();
        for node in &self.nodes {
            if by_id.insert(node.id.as_str(), node).is_some() {
                return Err(structural(format!("duplicate node id '{}'", node.id)));
            }
        }

        let mut outgoing: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        for edge in &self.edges {
            for endpoint in [&edge.source_node_id, &edge.target_node_id] {
                if !by_id.contains_key(endpoint.as_str()) {
                    return Err(structural(format!(
                        "edge '{}' references missing node '{endpoint}'",
                        edge.id
                    )));
                }
            }
            outgoing
                .entry(edge.source_node_id.as_str())
                .or_default()
                .push(edge);
        }

        let terminal_count = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Terminal)
            .count();
        if terminal_count != 1 {
            return Err(structural(format!(
                "expected exactly one terminal node, found {terminal_count}"
            )));
        }

        for node in &self.nodes {
            let out: &[&GraphEdge] = outgoing
                .get(node.id.as_str())
                .map(|edges| edges.as_slice())
                .unwrap_or(&[]);
            match node.kind {
                NodeKind::Terminal => {
                    if !out.is_empty() {
                        return Err(structural(format!(
                            "terminal node '{}' has {} outgoing edges",
                            node.id,
                            out.len()
                        )));
                    }
                }
                NodeKind::Reading => {
                    if out.len() != 1 || out[0].kind != EdgeKind::Unconditional {
                        return Err(structural(format!(
                            "reading node '{}' must have exactly one unconditional successor",
                            node.id
                        )));
                    }
                }
                NodeKind::Assessment => {
                    let passes: Vec<_> =
                        out.iter().filter(|e| e.kind == EdgeKind::Pass).collect();
                    let fails: Vec<_> =
                        out.iter().filter(|e| e.kind == EdgeKind::Fail).collect();
                    if out.len() != 2 || passes.len() != 1 || fails.len() != 1 {
                        return Err(structural(format!(
                            "assessment node '{}' must branch into one pass and one fail edge",
                            node.id
                        )));
                    }
                    let fail_target = by_id[fails[0].target_node_id.as_str()];
                    if fail_target.kind != NodeKind::Recovery {
                        return Err(structural(format!(
                            "fail edge of assessment '{}' must target a recovery node",
                            node.id
                        )));
                    }
                }
                NodeKind::Recovery => {
                    if out.len() != 1 || out[0].kind != EdgeKind::Pass {
                        return Err(structural(format!(
                            "recovery node '{}' must have exactly one pass edge",
                            node.id
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn structural(message: String) -> SynthesisError {
    SynthesisError::StructuralGraph(message)
}
