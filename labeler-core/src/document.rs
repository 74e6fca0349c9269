//! # Modelo de Documentos
//!
//! Estrutura no formato BioC usada em todo o pipeline de rotulagem:
//!
//! ```text
//! Collection
//!   └── Document (um laudo)
//!         └── Passage (ex: seção "impression")
//!               ├── Sentence  (texto + parse de dependências)
//!               └── Annotation (menções de achados, com localizações)
//! ```
//!
//! Todos os offsets são de **caractere** e relativos ao documento.
//! As menções ficam na passagem (e não na sentença) porque são produzidas pela
//! etapa de extração antes da segmentação em sentenças ser considerada.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::span::Span;

pub type Infons = BTreeMap<String, String>;

/// Lote de documentos processado pelo classificador, em ordem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub infons: Infons,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Um laudo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub infons: Infons,
    #[serde(default)]
    pub passages: Vec<Passage>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Aplica `f` a cada sentença, consumindo o documento e devolvendo um novo.
    ///
    /// A primeira falha interrompe e é propagada; o documento parcial é descartado.
    pub fn try_map_sentences<F>(self, mut f: F) -> Result<Document>
    where
        F: FnMut(Sentence) -> Result<Sentence>,
    {
        let mut passages = Vec::with_capacity(self.passages.len());
        for mut passage in self.passages {
            passage.sentences = passage
                .sentences
                .into_iter()
                .map(&mut f)
                .collect::<Result<Vec<_>>>()?;
            passages.push(passage);
        }
        Ok(Document { passages, ..self })
    }

    /// Libera todas as sentenças (texto e parse) de todas as passagens.
    ///
    /// Chamado pelo classificador depois que as detecções foram gravadas nas
    /// anotações: a partir daí as sentenças não são mais necessárias.
    /// Retorna quantas sentenças foram liberadas.
    pub fn release_sentences(&mut self) -> usize {
        self.passages.iter_mut().map(Passage::release_sentences).sum()
    }

    pub fn sentence_count(&self) -> usize {
        self.passages.iter().map(|p| p.sentences.len()).sum()
    }
}

/// Trecho contínuo de um laudo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    #[serde(default)]
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub infons: Infons,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Passage {
    pub fn release_sentences(&mut self) -> usize {
        let released = self.sentences.len();
        // `Vec::new()` em vez de `clear()` para devolver também a capacidade
        self.sentences = Vec::new();
        released
    }
}

/// Uma sentença e, após a conversão, seu parse de dependências.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub infons: Infons,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyParse>,
}

impl Sentence {
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_dependencies(self, dependencies: DependencyParse) -> Self {
        Self {
            dependencies: Some(dependencies),
            ..self
        }
    }

    /// Intervalo de offsets coberto pela sentença.
    ///
    /// Usa o texto quando presente; caso contrário, a extensão dos tokens com
    /// localização. `None` se nenhum dos dois existir.
    pub fn extent(&self) -> Option<Span> {
        if let Some(text) = &self.text {
            return Some(Span::new(self.offset, self.offset.saturating_add(text.chars().count())));
        }
        self.dependencies
            .as_ref()?
            .tokens
            .iter()
            .filter_map(|t| t.location.map(Location::span))
            .reduce(|a, b| a.cover(&b))
    }
}

/// Menção (ou qualquer anotação) com uma ou mais localizações.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub infons: Infons,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Annotation {
    pub fn new(id: impl Into<String>, text: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            infons: Infons::new(),
            locations: vec![location],
        }
    }

    /// Menor span que cobre todas as localizações.
    pub fn total_span(&self) -> Option<Span> {
        self.locations
            .iter()
            .map(|l| l.span())
            .reduce(|a, b| a.cover(&b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub offset: usize,
    pub length: usize,
}

impl Location {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Offsets vindos de fora são limitados a `usize::MAX`.
    pub fn span(self) -> Span {
        Span::new(self.offset, self.offset.saturating_add(self.length))
    }
}

/// Parse de dependências de uma sentença, como produzido pelo conversor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyParse {
    pub tokens: Vec<DepToken>,
    pub relations: Vec<DepRelation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepToken {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Ausente quando o token não pôde ser alinhado ao texto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Relação `governor -dependency-> dependent`; `governor = None` marca a raiz.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepRelation {
    pub dependency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governor: Option<String>,
    pub dependent: String,
}
