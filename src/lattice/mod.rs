use std::collections::{HashMap, VecDeque};

use crate::decoder::ModelInstance;
use crate::error::DecoderError;
use crate::types::WordId;

mod expand;

pub use expand::{ExpandOptions, ExpansionSummary};

pub type NodeIndex = usize;
pub type ArcIndex = usize;

/// Node as supplied by a graph provider, before index resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub index: usize,
    pub label: String,
}

/// Arc as supplied by a graph provider; endpoints use declared node indices.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArc {
    pub from: usize,
    pub to: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLattice {
    pub nodes: Vec<RawNode>,
    pub arcs: Vec<RawArc>,
}

/// Model binding of a phone node: the model position plus its double buffer.
#[derive(Debug, Clone)]
pub struct PhoneBinding {
    pub model: usize,
    pub current: ModelInstance,
    pub scratch: ModelInstance,
}

#[derive(Debug, Clone)]
pub struct PhoneNode {
    /// Word whose pronunciation produced this phone.
    pub word_id: WordId,
    /// `None` when no model carries the phone label; such a node is never scored.
    pub binding: Option<PhoneBinding>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Epsilon node with no word identity.
    Normal,
    /// Word boundary; `word_id` is `None` until expansion resolves the label.
    Word { word_id: Option<WordId> },
    /// Frame-scored node bound to an acoustic model instance.
    Phone(PhoneNode),
}

#[derive(Debug, Clone)]
pub struct LatticeNode {
    pub index: NodeIndex,
    pub label: String,
    pub kind: NodeKind,
    pub in_arcs: Vec<ArcIndex>,
    pub out_arcs: Vec<ArcIndex>,
}

impl LatticeNode {
    fn new(index: NodeIndex, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            index,
            label: label.into(),
            kind,
            in_arcs: Vec::new(),
            out_arcs: Vec::new(),
        }
    }

    pub fn is_phone(&self) -> bool {
        matches!(self.kind, NodeKind::Phone(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatticeArc {
    pub from: NodeIndex,
    pub to: NodeIndex,
    /// Reserved for arc weights; not applied during decoding.
    pub score: f64,
}

/// Recognition network with index-addressed nodes and arcs.
#[derive(Debug, Clone)]
pub struct LatticeGraph {
    nodes: Vec<LatticeNode>,
    arcs: Vec<LatticeArc>,
    entry: NodeIndex,
    exit: NodeIndex,
}

impl LatticeGraph {
    /// Builds adjacency from provider nodes/arcs. Nodes labelled
    /// `epsilon_label` become `Normal`, all others `Word`.
    pub fn load(raw: RawLattice, epsilon_label: &str) -> Result<Self, DecoderError> {
        if raw.nodes.is_empty() {
            return Err(DecoderError::graph("lattice has no nodes"));
        }

        let mut position_of = HashMap::with_capacity(raw.nodes.len());
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for (position, raw_node) in raw.nodes.into_iter().enumerate() {
            if position_of.insert(raw_node.index, position).is_some() {
                return Err(DecoderError::graph(format!(
                    "node index {} declared twice",
                    raw_node.index
                )));
            }
            let kind = if raw_node.label == epsilon_label {
                NodeKind::Normal
            } else {
                NodeKind::Word { word_id: None }
            };
            nodes.push(LatticeNode::new(position, raw_node.label, kind));
        }

        let mut graph = Self {
            nodes,
            arcs: Vec::with_capacity(raw.arcs.len()),
            entry: 0,
            exit: 0,
        };
        for raw_arc in raw.arcs {
            let resolve = |declared: usize| {
                position_of.get(&declared).copied().ok_or_else(|| {
                    DecoderError::graph(format!(
                        "arc {} -> {} references undeclared node {declared}",
                        raw_arc.from, raw_arc.to
                    ))
                })
            };
            let from = resolve(raw_arc.from)?;
            let to = resolve(raw_arc.to)?;
            graph.add_arc(from, to, raw_arc.score);
        }

        graph.locate_terminals()?;
        tracing::debug!(
            nodes = graph.nodes.len(),
            arcs = graph.arcs.len(),
            entry = graph.entry,
            exit = graph.exit,
            "lattice: loaded"
        );
        Ok(graph)
    }

    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> &LatticeNode {
        &self.nodes[index]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut LatticeNode {
        &mut self.nodes[index]
    }

    pub fn arcs(&self) -> &[LatticeArc] {
        &self.arcs
    }

    pub fn arc(&self, index: ArcIndex) -> &LatticeArc {
        &self.arcs[index]
    }

    pub fn entry(&self) -> NodeIndex {
        self.entry
    }

    pub fn exit(&self) -> NodeIndex {
        self.exit
    }

    pub fn zero_in_degree_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .filter(|n| n.in_arcs.is_empty())
            .map(|n| n.index)
            .collect()
    }

    pub fn zero_out_degree_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .filter(|n| n.out_arcs.is_empty())
            .map(|n| n.index)
            .collect()
    }

    /// Kahn ordering of all nodes, or `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeIndex>> {
        let mut pending: Vec<usize> = self.nodes.iter().map(|n| n.in_arcs.len()).collect();
        let mut ready: VecDeque<NodeIndex> = self
            .nodes
            .iter()
            .filter(|n| n.in_arcs.is_empty())
            .map(|n| n.index)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(index) = ready.pop_front() {
            order.push(index);
            for &arc in &self.nodes[index].out_arcs {
                let to = self.arcs[arc].to;
                pending[to] -= 1;
                if pending[to] == 0 {
                    ready.push_back(to);
                }
            }
        }
        (order.len() == self.nodes.len()).then_some(order)
    }

    /// Restores every bound phone instance to its initial scores.
    pub(crate) fn reset_instances(&mut self) {
        for node in &mut self.nodes {
            if let NodeKind::Phone(PhoneNode {
                binding: Some(binding),
                ..
            }) = &mut node.kind
            {
                binding.current.reset();
                binding.scratch.reset();
            }
        }
    }

    fn push_node(&mut self, label: impl Into<String>, kind: NodeKind) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(LatticeNode::new(index, label, kind));
        index
    }

    fn add_arc(&mut self, from: NodeIndex, to: NodeIndex, score: f64) -> ArcIndex {
        let index = self.arcs.len();
        self.arcs.push(LatticeArc { from, to, score });
        self.nodes[from].out_arcs.push(index);
        self.nodes[to].in_arcs.push(index);
        index
    }

    /// Re-derives entry/exit by arc degree and validates the structure.
    fn locate_terminals(&mut self) -> Result<(), DecoderError> {
        if self.topological_order().is_none() {
            return Err(DecoderError::graph("lattice contains a cycle"));
        }
        let entries = self.zero_in_degree_nodes();
        let exits = self.zero_out_degree_nodes();
        match (entries.as_slice(), exits.as_slice()) {
            ([entry], [exit]) => {
                self.entry = *entry;
                self.exit = *exit;
                Ok(())
            }
            ([], _) => Err(DecoderError::graph("no node without incoming arcs")),
            (_, []) => Err(DecoderError::graph("no node without outgoing arcs")),
            _ => Err(DecoderError::graph(format!(
                "expected one entry and one exit node, found entries {entries:?} and exits {exits:?}"
            ))),
        }
    }
}
