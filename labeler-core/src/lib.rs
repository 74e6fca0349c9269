//! # labeler-core · Classificação de Menções em Laudos Radiológicos
//!
//! Este crate decide, para cada menção de um achado num laudo (ex: "edema",
//! "pleural effusion"), se ela é **negada**, **incerta** ou **positiva**,
//! casando padrões gramaticais escritos à mão contra o grafo de dependências
//! de cada sentença.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: [`Collection`] de laudos com menções já anotadas.
//! 2.  **Parsing e Conversão** ([`parse`], [`conllu`]): cada sentença recebe seu parse de dependências.
//! 3.  **Grafo** ([`graph`], [`propagator`]): o parse vira um grafo; o escopo é propagado por coordenações.
//! 4.  **Detecção** ([`detector`]): cascata incerteza pré-negação → negação → incerteza pós-negação,
//!     usando os conjuntos de padrões de [`pattern`].
//! 5.  **Saída**: os infons das anotações recebem `negation`/`uncertainty` ([`aggregate`]);
//!     as sentenças são liberadas.
//!
//! ## Exemplo de Uso
//!
//! ```rust,no_run
//! use labeler_core::{Classifier, Collection, ConlluConverter, PatternPaths, PrecomputedParser};
//!
//! // 1. Carrega os três conjuntos de padrões distribuídos com o crate
//! let classifier = Classifier::new(&PatternPaths::bundled(), PrecomputedParser::default(), ConlluConverter)?;
//!
//! // 2. Lote em JSON (sentenças com o parse CoNLL-U no infon "conllu")
//! let json = std::fs::read_to_string("reports.json").unwrap();
//! let collection: Collection = serde_json::from_str(&json).unwrap();
//!
//! // 3. Classifica
//! let classified = classifier.classify(collection)?;
//! for doc in &classified.documents {
//!     for ann in doc.passages.iter().flat_map(|p| &p.annotations) {
//!         println!("{} {:?}", ann.text, ann.infons);
//!     }
//! }
//! # Ok::<(), labeler_core::Error>(())
//! ```

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod conllu;
pub mod detector;
pub mod document;
pub mod error;
pub mod graph;
pub mod parse;
pub mod pattern;
pub mod propagator;
pub mod span;

pub use classifier::Classifier;
pub use config::PatternPaths;
pub use conllu::ConlluConverter;
pub use detector::{Detection, Detector, Label, MentionDetector, Stage};
pub use document::{Annotation, Collection, Document, Location, Passage, Sentence};
pub use error::{Error, PatternError, Result};
pub use graph::{DependencyGraph, NodeId};
pub use parse::{DependencyConverter, ParseTree, Parser, PrecomputedParser};
pub use pattern::{Match, Pattern, PatternSet};
pub use span::Span;
