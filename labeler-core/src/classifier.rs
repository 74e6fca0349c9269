//! # Classificador de Menções · Orquestrador
//!
//! Conduz um lote de laudos pelo pipeline, um documento por vez e na ordem
//! recebida:
//!
//! 1. **Parsing** ([`Parser`]): cada sentença recebe sua árvore.
//! 2. **Conversão** ([`DependencyConverter`]): árvore → dependências.
//! 3. **Detecção** ([`detect_document`]): o [`MentionDetector`] grava
//!    negação/incerteza nas anotações.
//! 4. **Liberação**: as sentenças são descartadas; daqui em diante só as
//!    anotações importam, e o consumo de memória não cresce com o lote.
//!
//! Não há retentativa: a primeira falha de parsing, conversão ou construção de
//! grafo aborta o lote e é devolvida ao chamador.
//!
//! Com [`Classifier::verbose`], cada documento concluído gera um `info!` de
//! progresso.

use tracing::{debug, info};

use crate::aggregate::detect_document;
use crate::config::PatternPaths;
use crate::conllu::ConlluConverter;
use crate::detector::MentionDetector;
use crate::document::{Collection, Document};
use crate::error::Result;
use crate::parse::{DependencyConverter, Parser, PrecomputedParser};

pub struct Classifier<P = PrecomputedParser, C = ConlluConverter> {
    parser: P,
    converter: C,
    detector: MentionDetector,
    verbose: bool,
}

impl<P: Parser, C: DependencyConverter> Classifier<P, C> {
    /// Carrega os três conjuntos de padrões; falha imediatamente se algum
    /// recurso estiver ausente ou malformado.
    pub fn new(paths: &PatternPaths, parser: P, converter: C) -> Result<Self> {
        let detector = MentionDetector::load(paths)?;
        Ok(Self::with_detector(detector, parser, converter))
    }

    pub fn with_detector(detector: MentionDetector, parser: P, converter: C) -> Self {
        Self {
            parser,
            converter,
            detector,
            verbose: false,
        }
    }

    /// Liga o log de progresso por documento.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn detector(&self) -> &MentionDetector {
        &self.detector
    }

    /// Classifica todas as menções do lote.
    pub fn classify(&self, collection: Collection) -> Result<Collection> {
        let Collection {
            source,
            date,
            key,
            infons,
            documents,
        } = collection;

        let total = documents.len();
        info!(documents = total, "Classificando menções...");
        let documents = documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| -> Result<Document> {
                let document = self.classify_document(document)?;
                if self.verbose {
                    info!(document = %document.id, done = index + 1, total, "Progresso");
                }
                Ok(document)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Collection {
            source,
            date,
            key,
            infons,
            documents,
        })
    }

    /// Passos 1–4 para um único documento.
    pub fn classify_document(&self, document: Document) -> Result<Document> {
        let mut document = document.try_map_sentences(|sentence| {
            let tree = self.parser.parse(&sentence)?;
            let dependencies = self.converter.convert(&sentence, &tree)?;
            Ok(sentence.with_dependencies(dependencies))
        })?;

        let detections = detect_document(&mut document, &self.detector)?;
        let released = document.release_sentences();

        debug!(document = %document.id, detections, released, "Documento classificado");
        Ok(document)
    }
}
