use std::path::Path;

use super::{read_text, LineReader};
use crate::error::DecoderError;
use crate::lattice::{RawArc, RawLattice, RawNode};

const CONTEXT: &str = "network";

pub fn read_network(path: &Path) -> Result<RawLattice, DecoderError> {
    parse_network(&read_text(path, "reading network")?)
}

/// SLF-style network: an `N=<nodes> L=<arcs>` header, node lines
/// `I=<idx> W=<label>` and arc lines `J=<idx> S=<from> E=<to> [l=<score>]`.
/// Other lines are ignored.
pub fn parse_network(text: &str) -> Result<RawLattice, DecoderError> {
    let mut reader = LineReader::new(CONTEXT, text);
    let mut lattice = RawLattice::default();
    let mut declared: Option<(usize, usize)> = None;

    while let Some((line_no, line)) = reader.next_line() {
        let fields = Fields::new(line);
        if line.starts_with("N=") {
            let nodes = reader.number(line_no, fields.require(&reader, line_no, "N")?, "node count")?;
            let arcs = reader.number(line_no, fields.require(&reader, line_no, "L")?, "arc count")?;
            declared = Some((nodes, arcs));
        } else if line.starts_with("I=") {
            let index = reader.number(line_no, fields.require(&reader, line_no, "I")?, "node index")?;
            let label = fields.require(&reader, line_no, "W")?;
            lattice.nodes.push(RawNode {
                index,
                label: label.to_string(),
            });
        } else if line.starts_with("J=") {
            let from = reader.number(line_no, fields.require(&reader, line_no, "S")?, "start node")?;
            let to = reader.number(line_no, fields.require(&reader, line_no, "E")?, "end node")?;
            let score = match fields.get("l") {
                Some(value) => reader.number(line_no, value, "arc score")?,
                None => 0.0,
            };
            lattice.arcs.push(RawArc { from, to, score });
        }
    }

    if let Some((nodes, arcs)) = declared {
        if nodes != lattice.nodes.len() || arcs != lattice.arcs.len() {
            tracing::warn!(
                declared_nodes = nodes,
                declared_arcs = arcs,
                nodes = lattice.nodes.len(),
                arcs = lattice.arcs.len(),
                "network: counts differ from header"
            );
        }
    }
    tracing::debug!(
        nodes = lattice.nodes.len(),
        arcs = lattice.arcs.len(),
        "network: parsed"
    );
    Ok(lattice)
}

/// `key=value` pairs of one line.
struct Fields<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            pairs: line
                .split_whitespace()
                .filter_map(|token| token.split_once('='))
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn require(&self, reader: &LineReader<'_>, line: usize, key: &str) -> Result<&'a str, DecoderError> {
        self.get(key)
            .ok_or_else(|| reader.error(line, format!("missing '{key}=' field")))
    }
}
