//! Flow assembly: nodes placed on the grid, then edges in a single pass.
//!
//! The assembler accumulates one node per generated unit. `finish` appends
//! the terminal node, injects a recovery node behind every assessment, and
//! connects the sequence. It never emits a dangling edge; a missing successor
//! aborts assembly with a structural error.

use crate::activity::ActivityPayload;
use crate::error::SynthesisError;
use crate::graph::layout::{GridLayout, LayoutConfig};
use crate::graph::{EdgeKind, GraphEdge, GraphNode, NodeKind};
use uuid::Uuid;

const PASS_CONDITION: &str = "outcome.score >= outcome.passThreshold";
const FAIL_CONDITION: &str = "outcome.score < outcome.passThreshold";
const TERMINAL_TITLE: &str = "Lesson complete";
const TERMINAL_MATERIAL: &str =
    "Congratulations! You reached the end of this learning path. Well done.";
const RECOVERY_FALLBACK: &str =
    "Review the related reading material, then try the activity again.";

/// One successfully generated unit, ready to become a node.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedUnit {
    Reading {
        title: String,
        description: String,
        payload: ActivityPayload,
    },
    Exercise {
        title: String,
        description: String,
        payload: ActivityPayload,
    },
}

/// Per-run accumulator for the node sequence. Create one per synthesis
/// invocation; it is never shared.
#[derive(Debug)]
pub struct FlowAssembler {
    layout: GridLayout,
    subject: String,
    nodes: Vec<GraphNode>,
}

impl FlowAssembler {
    pub fn new(config: LayoutConfig, subject: impl Into<String>) -> Self {
        Self {
            layout: GridLayout::new(config),
            subject: subject.into(),
            nodes: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Place the unit's node at the next grid slot.
    pub fn push_unit(&mut self, unit: GeneratedUnit) {
        let position = self.layout.advance();
        let node = match unit {
            GeneratedUnit::Reading {
                title,
                description,
                payload,
            } => GraphNode {
                id: next_id(),
                kind: NodeKind::Reading,
                title,
                description,
                payload,
                position,
            },
            GeneratedUnit::Exercise {
                title,
                description,
                payload,
            } => GraphNode {
                id: next_id(),
                kind: NodeKind::Assessment,
                title,
                description,
                payload,
                position,
            },
        };
        self.nodes.push(node);
    }

    /// Append the terminal node and connect the whole sequence.
    pub fn finish(
        mut self,
        lesson_title: &str,
    ) -> Result<(Vec<GraphNode>, Vec<GraphEdge>), SynthesisError> {
        let terminal_position = self.layout.advance();
        self.nodes.push(GraphNode {
            id: next_id(),
            kind: NodeKind::Terminal,
            title: TERMINAL_TITLE.to_string(),
            description: format!("End of '{lesson_title}'"),
            payload: ActivityPayload::Reading {
                title: "Congratulations!".to_string(),
                macro_subject: self.subject.clone(),
                material: TERMINAL_MATERIAL.to_string(),
            },
            position: terminal_position,
        });

        let mut edges = Vec::new();
        let mut recoveries: Vec<(usize, GraphNode)> = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            match node.kind {
                NodeKind::Terminal => {}
                NodeKind::Reading => {
                    let successor = self.successor_id(index, node)?;
                    edges.push(edge(EdgeKind::Unconditional, &node.id, &successor));
                }
                NodeKind::Assessment => {
                    let successor = self.successor_id(index, node)?;
                    let recovery = self.recovery_for(node);
                    edges.push(edge(EdgeKind::Pass, &node.id, &successor));
                    edges.push(edge(EdgeKind::Fail, &node.id, &recovery.id));
                    edges.push(edge(EdgeKind::Pass, &recovery.id, &successor));
                    recoveries.push((index, recovery));
                }
                NodeKind::Recovery => {
                    return Err(SynthesisError::StructuralGraph(format!(
                        "recovery node '{}' cannot appear in the planned sequence",
                        node.id
                    )));
                }
            }
        }

        let mut woven = Vec::with_capacity(self.nodes.len() + recoveries.len());
        let mut pending = recoveries.into_iter().peekable();
        for (index, node) in self.nodes.into_iter().enumerate() {
            woven.push(node);
            while pending.peek().map_or(false, |(anchor, _)| *anchor == index) {
                if let Some((_, recovery)) = pending.next() {
                    woven.push(recovery);
                }
            }
        }

        Ok((woven, edges))
    }

    fn successor_id(&self, index: usize, node: &GraphNode) -> Result<String, SynthesisError> {
        self.nodes
            .get(index + 1)
            .map(|successor| successor.id.clone())
            .ok_or_else(|| {
                SynthesisError::StructuralGraph(format!(
                    "node '{}' has no successor to connect to",
                    node.title
                ))
            })
    }

    fn recovery_for(&self, assessment: &GraphNode) -> GraphNode {
        let material = if assessment.description.is_empty() {
            RECOVERY_FALLBACK.to_string()
        } else {
            assessment.description.clone()
        };
        GraphNode {
            id: next_id(),
            kind: NodeKind::Recovery,
            title: format!("Review: {}", assessment.title),
            description: "Reached after a failed attempt.".to_string(),
            payload: ActivityPayload::Reading {
                title: format!("Review: {}", assessment.title),
                macro_subject: self.subject.clone(),
                material,
            },
            position: self.layout.below(assessment.position),
        }
    }
}

fn next_id() -> String {
    Uuid::new_v4().to_string()
}

fn edge(kind: EdgeKind, source: &str, target: &str) -> GraphEdge {
    let (condition_tag, condition_script) = match kind {
        EdgeKind::Unconditional => (None, None),
        EdgeKind::Pass => (Some("pass".to_string()), Some(PASS_CONDITION.to_string())),
        EdgeKind::Fail => (Some("fail".to_string()), Some(FAIL_CONDITION.to_string())),
    };
    GraphEdge {
        id: next_id(),
        kind,
        source_node_id: source.to_string(),
        target_node_id: target.to_string(),
        condition_tag,
        condition_script,
    }
}
