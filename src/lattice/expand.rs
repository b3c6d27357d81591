use crate::decoder::ModelInstance;
use crate::dictionary::Dictionary;
use crate::error::DecoderError;
use crate::model::AcousticModelSet;

use super::{LatticeGraph, NodeIndex, NodeKind, PhoneBinding, PhoneNode};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandOptions {
    /// Reject phones that match no model instead of leaving them unbound.
    pub strict_model_binding: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionSummary {
    pub expanded_words: usize,
    pub phone_nodes: usize,
    pub unbound_phones: usize,
    pub unknown_words: usize,
}

impl LatticeGraph {
    /// Rewrites every labelled word node into phone-model chains that feed
    /// back into the word node, which stays as a zero-cost word-id carrier.
    pub fn expand(
        &mut self,
        dictionary: &Dictionary,
        models: &AcousticModelSet,
        options: ExpandOptions,
    ) -> Result<ExpansionSummary, DecoderError> {
        let mut summary = ExpansionSummary::default();
        let original_count = self.nodes.len();

        for index in 0..original_count {
            if !matches!(self.nodes[index].kind, NodeKind::Word { .. }) {
                continue;
            }
            let label = self.nodes[index].label.clone();
            let Some(word_id) = dictionary.id(&label) else {
                tracing::warn!(word = label.as_str(), "lattice: word not in dictionary");
                summary.unknown_words += 1;
                continue;
            };
            self.nodes[index].kind = NodeKind::Word {
                word_id: Some(word_id),
            };

            let prons = dictionary.pronunciations(word_id);
            if prons.is_empty() {
                tracing::warn!(
                    word = label.as_str(),
                    "lattice: word has no pronunciation, kept as pass-through"
                );
                continue;
            }

            let incoming = std::mem::take(&mut self.nodes[index].in_arcs);
            // Alternatives hang off one epsilon node so the entry stays unique.
            let fan_out = (prons.len() > 1)
                .then(|| self.push_node(format!("{label}#alt"), NodeKind::Normal));

            let mut chain_heads = Vec::with_capacity(prons.len());
            for phones in prons {
                let (first, last) =
                    self.build_chain(&label, word_id, phones, models, options, &mut summary)?;
                self.add_arc(last, index, 0.0);
                chain_heads.push(first);
            }

            let receiver = fan_out.unwrap_or(chain_heads[0]);
            for arc in incoming {
                self.arcs[arc].to = receiver;
                self.nodes[receiver].in_arcs.push(arc);
            }
            if let Some(fan_out) = fan_out {
                for first in chain_heads {
                    self.add_arc(fan_out, first, 0.0);
                }
            }
            summary.expanded_words += 1;
        }

        self.locate_terminals()?;
        tracing::info!(
            expanded_words = summary.expanded_words,
            phone_nodes = summary.phone_nodes,
            unbound_phones = summary.unbound_phones,
            unknown_words = summary.unknown_words,
            nodes = self.nodes.len(),
            arcs = self.arcs.len(),
            "lattice: expanded words into phone models"
        );
        Ok(summary)
    }

    /// Appends a linear chain of phone nodes; returns its first and last node.
    fn build_chain(
        &mut self,
        word: &str,
        word_id: usize,
        phones: &[String],
        models: &AcousticModelSet,
        options: ExpandOptions,
        summary: &mut ExpansionSummary,
    ) -> Result<(NodeIndex, NodeIndex), DecoderError> {
        let mut first = None;
        let mut prev: Option<NodeIndex> = None;
        for phone in phones {
            let binding = match models.position_of(phone) {
                Some(position) => {
                    let states = models.models()[position].state_count();
                    let node = self.nodes.len();
                    Some(PhoneBinding {
                        model: position,
                        current: ModelInstance::new(node, states),
                        scratch: ModelInstance::new(node, states),
                    })
                }
                None if options.strict_model_binding => {
                    return Err(DecoderError::UnboundPhone {
                        phone: phone.clone(),
                        word: word.to_string(),
                    });
                }
                None => {
                    tracing::warn!(
                        phone = phone.as_str(),
                        word,
                        "lattice: phone matches no acoustic model, node left unscored"
                    );
                    summary.unbound_phones += 1;
                    None
                }
            };
            let node = self.push_node(
                phone.as_str(),
                NodeKind::Phone(PhoneNode { word_id, binding }),
            );
            summary.phone_nodes += 1;
            if let Some(prev) = prev {
                self.add_arc(prev, node, 0.0);
            }
            first.get_or_insert(node);
            prev = Some(node);
        }
        match (first, prev) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(DecoderError::invalid_input(format!(
                "empty pronunciation for word '{word}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::test_support::linear;
    use crate::lattice::{RawArc, RawLattice, RawNode};
    use crate::model::test_support::single_state_models;

    fn dictionary(entries: &[(&str, &[&str])]) -> Dictionary {
        let mut dict = Dictionary::new();
        for (word, phones) in entries {
            dict.add_pronunciation(word, phones.iter().copied());
        }
        dict
    }

    fn assert_single_entry_acyclic(graph: &LatticeGraph) {
        assert!(graph.topological_order().is_some(), "expansion created a cycle");
        assert_eq!(graph.zero_in_degree_nodes(), vec![graph.entry()]);
        assert_eq!(graph.zero_out_degree_nodes(), vec![graph.exit()]);
    }

    #[test]
    fn single_pronunciation_is_spliced_before_word_node() {
        let models = single_state_models(&["a", "b"], &[0.0, 1.0]);
        let dict = dictionary(&[("AB", &["a", "b"])]);
        let mut graph = LatticeGraph::load(linear(&["AB"]), "!NULL").unwrap();
        let summary = graph.expand(&dict, &models, ExpandOptions::default()).unwrap();

        assert_eq!(summary.expanded_words, 1);
        assert_eq!(summary.phone_nodes, 2);
        assert_eq!(graph.nodes().len(), 5);
        // entry -> a -> b -> AB -> exit
        let a = graph.arc(0).to;
        assert_eq!(graph.node(a).label, "a");
        let b = graph.arc(graph.node(a).out_arcs[0]).to;
        assert_eq!(graph.node(b).label, "b");
        let word = graph.arc(graph.node(b).out_arcs[0]).to;
        assert_eq!(word, 1);
        assert!(matches!(graph.node(1).kind, NodeKind::Word { word_id: Some(0) }));
        assert_eq!(graph.node(1).in_arcs.len(), 1);
        assert_single_entry_acyclic(&graph);
    }

    #[test]
    fn bound_phone_allocates_instances() {
        let models = single_state_models(&["a"], &[0.0]);
        let dict = dictionary(&[("A", &["a"])]);
        let mut graph = LatticeGraph::load(linear(&["A"]), "!NULL").unwrap();
        graph.expand(&dict, &models, ExpandOptions::default()).unwrap();
        let phone = graph.nodes().iter().find(|n| n.is_phone()).unwrap();
        let NodeKind::Phone(PhoneNode {
            word_id,
            binding: Some(binding),
        }) = &phone.kind
        else {
            panic!("phone node should be bound");
        };
        assert_eq!(*word_id, 0);
        assert_eq!(binding.model, 0);
        assert_eq!(binding.current.tokens().len(), 3);
        assert_eq!(binding.current.tokens()[0].path_score, 0.0);
        assert_eq!(binding.current.tokens()[1].path_score, f32::NEG_INFINITY);
        assert_eq!(binding.scratch.tokens().len(), 3);
    }

    #[test]
    fn unknown_phone_stays_unbound() {
        let models = single_state_models(&["a"], &[0.0]);
        let dict = dictionary(&[("A", &["zz"])]);
        let mut graph = LatticeGraph::load(linear(&["A"]), "!NULL").unwrap();
        let summary = graph.expand(&dict, &models, ExpandOptions::default()).unwrap();
        assert_eq!(summary.unbound_phones, 1);
        let phone = graph.nodes().iter().find(|n| n.is_phone()).unwrap();
        assert!(matches!(
            phone.kind,
            NodeKind::Phone(PhoneNode { binding: None, .. })
        ));
    }

    #[test]
    fn strict_binding_rejects_unknown_phone() {
        let models = single_state_models(&["a"], &[0.0]);
        let dict = dictionary(&[("A", &["zz"])]);
        let mut graph = LatticeGraph::load(linear(&["A"]), "!NULL").unwrap();
        let err = graph
            .expand(
                &dict,
                &models,
                ExpandOptions {
                    strict_model_binding: true,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DecoderError::UnboundPhone { .. }));
    }

    #[test]
    fn word_as_entry_moves_entry_to_first_phone() {
        let models = single_state_models(&["s", "a"], &[0.0, 1.0]);
        let dict = dictionary(&[("SIL", &["s"]), ("A", &["a"])]);
        let raw = RawLattice {
            nodes: vec![
                RawNode {
                    index: 0,
                    label: "SIL".to_string(),
                },
                RawNode {
                    index: 1,
                    label: "A".to_string(),
                },
            ],
            arcs: vec![RawArc {
                from: 0,
                to: 1,
                score: 0.0,
            }],
        };
        let mut graph = LatticeGraph::load(raw, "!NULL").unwrap();
        graph.expand(&dict, &models, ExpandOptions::default()).unwrap();
        let entry = graph.node(graph.entry());
        assert!(entry.is_phone());
        assert_eq!(entry.label, "s");
        assert_eq!(graph.exit(), 1);
        assert_single_entry_acyclic(&graph);
    }

    #[test]
    fn alternative_pronunciations_share_fan_out_node() {
        let models = single_state_models(&["a", "b"], &[0.0, 1.0]);
        let mut dict = dictionary(&[("X", &["a"])]);
        dict.add_pronunciation("X", ["b", "a"]);
        let mut graph = LatticeGraph::load(linear(&["X"]), "!NULL").unwrap();
        let summary = graph.expand(&dict, &models, ExpandOptions::default()).unwrap();

        assert_eq!(summary.phone_nodes, 3);
        let fan_out = graph.arc(0).to;
        assert!(matches!(graph.node(fan_out).kind, NodeKind::Normal));
        assert_eq!(graph.node(fan_out).out_arcs.len(), 2);
        assert_eq!(graph.node(1).in_arcs.len(), 2);
        assert_single_entry_acyclic(&graph);
    }

    #[test]
    fn branching_lattice_stays_acyclic_with_single_entry() {
        let models = single_state_models(&["a", "b", "c"], &[0.0, 1.0, 2.0]);
        let dict = dictionary(&[("A", &["a", "b"]), ("B", &["b"]), ("C", &["c", "a", "b"])]);
        let labels = ["!NULL", "A", "B", "C", "A", "!NULL"];
        let raw = RawLattice {
            nodes: labels
                .iter()
                .enumerate()
                .map(|(index, l)| RawNode {
                    index,
                    label: l.to_string(),
                })
                .collect(),
            arcs: [(0, 1), (0, 2), (1, 3), (2, 3), (2, 4), (3, 5), (4, 5), (1, 4)]
                .into_iter()
                .map(|(from, to)| RawArc {
                    from,
                    to,
                    score: 0.0,
                })
                .collect(),
        };
        let mut graph = LatticeGraph::load(raw, "!NULL").unwrap();
        let summary = graph.expand(&dict, &models, ExpandOptions::default()).unwrap();
        assert_eq!(summary.expanded_words, 4);
        assert_eq!(summary.phone_nodes, 2 + 1 + 3 + 2);
        assert_single_entry_acyclic(&graph);
        for node in graph.nodes() {
            if let NodeKind::Word { word_id } = node.kind {
                assert!(word_id.is_some());
                assert!(node.in_arcs.iter().all(|&a| graph.node(graph.arc(a).from).is_phone()));
            }
        }
    }

    #[test]
    fn unknown_word_is_left_in_place() {
        let models = single_state_models(&["a"], &[0.0]);
        let dict = dictionary(&[("A", &["a"])]);
        let mut graph = LatticeGraph::load(linear(&["Q"]), "!NULL").unwrap();
        let summary = graph.expand(&dict, &models, ExpandOptions::default()).unwrap();
        assert_eq!(summary.unknown_words, 1);
        assert_eq!(graph.nodes().len(), 3);
        assert!(matches!(graph.node(1).kind, NodeKind::Word { word_id: None }));
    }
}
