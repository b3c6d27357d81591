use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DecoderConfig;
use crate::decoder::DecodingEngine;
use crate::error::DecoderError;
use crate::lattice::{ExpandOptions, LatticeGraph};
use crate::model::AcousticModelSet;
use crate::pipeline::defaults::{LexiconFile, ModelFiles, NetworkFile, StatesFile};
use crate::pipeline::runtime::{Recognizer, RecognizerParts};
use crate::pipeline::traits::{DictionaryProvider, EmissionProvider, GraphProvider, ModelProvider};

pub struct RecognizerBuilder {
    config: DecoderConfig,
    dictionary: Option<Box<dyn DictionaryProvider>>,
    models: Option<Box<dyn ModelProvider>>,
    emissions: Option<Box<dyn EmissionProvider>>,
    graph: Option<Box<dyn GraphProvider>>,
}

impl RecognizerBuilder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            dictionary: None,
            models: None,
            emissions: None,
            graph: None,
        }
    }

    pub fn with_dictionary(mut self, dictionary: Box<dyn DictionaryProvider>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn with_models(mut self, models: Box<dyn ModelProvider>) -> Self {
        self.models = Some(models);
        self
    }

    pub fn with_emissions(mut self, emissions: Box<dyn EmissionProvider>) -> Self {
        self.emissions = Some(emissions);
        self
    }

    pub fn with_graph(mut self, graph: Box<dyn GraphProvider>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Loads every collaborator, expands the lattice and primes a decoder.
    /// Providers not set explicitly read the files named in the config.
    pub fn build(self) -> Result<Recognizer, DecoderError> {
        let config = self.config;
        let dictionary_provider = self
            .dictionary
            .unwrap_or_else(|| Box::new(LexiconFile(PathBuf::from(&config.lexicon_path))));
        let model_provider = self.models.unwrap_or_else(|| {
            Box::new(ModelFiles {
                models_path: PathBuf::from(&config.models_path),
                transitions_path: PathBuf::from(&config.transitions_path),
            })
        });
        let emission_provider = self
            .emissions
            .unwrap_or_else(|| Box::new(StatesFile(PathBuf::from(&config.states_path))));
        let graph_provider = self
            .graph
            .unwrap_or_else(|| Box::new(NetworkFile(PathBuf::from(&config.network_path))));

        let dictionary = dictionary_provider.load_dictionary()?;
        let tables = model_provider.load_models()?;
        let states = emission_provider.load_states()?;
        let models = Arc::new(AcousticModelSet::new(tables.models, tables.transitions, states)?);
        tracing::info!(
            words = dictionary.len(),
            models = models.models().len(),
            states = models.states().len(),
            dimension = ?models.dimension(),
            "recognizer: loaded acoustic models"
        );

        let mut graph = LatticeGraph::load(graph_provider.load_graph()?, &config.epsilon_label)?;
        let summary = graph.expand(
            &dictionary,
            &models,
            ExpandOptions {
                strict_model_binding: config.strict_model_binding,
            },
        )?;
        tracing::info!(
            nodes = graph.nodes().len(),
            arcs = graph.arcs().len(),
            phone_nodes = summary.phone_nodes,
            unbound_phones = summary.unbound_phones,
            "recognizer: expanded lattice"
        );

        let engine = DecodingEngine::new(graph, Arc::clone(&models), config.transition_log_base);
        Ok(Recognizer::from_parts(RecognizerParts {
            engine,
            dictionary,
            models,
            summary,
        }))
    }
}
