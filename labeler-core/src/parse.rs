//! # Colaboradores de Parsing
//!
//! O classificador não faz parsing: ele depende de duas etapas externas, aqui
//! representadas por traits.
//!
//! 1. [`Parser`]: sentença → [`ParseTree`] (saída bruta do parser).
//! 2. [`DependencyConverter`]: sentença + árvore → [`DependencyParse`].
//!
//! Ambas devolvem valores novos em vez de alterar a sentença; o classificador
//! anexa o resultado com [`Sentence::with_dependencies`].
//!
//! [`PrecomputedParser`] cobre o caso comum em que o parse foi feito antes, por
//! outro sistema, e veio junto com o documento (nos infons da sentença).

use crate::document::{DependencyParse, Sentence};
use crate::error::{Error, Result};

/// Saída textual de um parser (o formato depende do conversor usado).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    pub text: String,
}

impl ParseTree {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

pub trait Parser {
    fn parse(&self, sentence: &Sentence) -> Result<ParseTree>;
}

pub trait DependencyConverter {
    fn convert(&self, sentence: &Sentence, tree: &ParseTree) -> Result<DependencyParse>;
}

/// Lê o parse já pronto de um infon da sentença.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecomputedParser {
    infon_key: String,
}

impl PrecomputedParser {
    pub const DEFAULT_INFON: &'static str = "conllu";

    pub fn new(infon_key: impl Into<String>) -> Self {
        Self {
            infon_key: infon_key.into(),
        }
    }

    pub fn infon_key(&self) -> &str {
        &self.infon_key
    }
}

impl Default for PrecomputedParser {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INFON)
    }
}

impl Parser for PrecomputedParser {
    fn parse(&self, sentence: &Sentence) -> Result<ParseTree> {
        sentence
            .infons
            .get(&self.infon_key)
            .map(|text| ParseTree::new(text.as_str()))
            .ok_or_else(|| Error::Parse {
                offset: sentence.offset,
                message: format!("sentença sem o infon `{}`", self.infon_key),
            })
    }
}
