//! # Detector de Negação e Incerteza
//!
//! Para cada menção (span) de uma sentença, o detector decide se algum
//! modificador de negação ou incerteza a governa gramaticalmente.
//!
//! ## Cascata de precedência
//!
//! Cada nó do grafo que intersecta a menção é testado contra três conjuntos de
//! padrões, **nesta ordem**, e o primeiro que casar decide:
//!
//! | Etapa | Conjunto                      | Rótulo       | Exemplo                        |
//! |-------|-------------------------------|--------------|--------------------------------|
//! | 1     | incerteza pré-negação         | UNCERTAINTY  | "cannot exclude effusion"      |
//! | 2     | negação                       | NEGATION     | "no evidence of edema"         |
//! | 3     | incerteza pós-negação         | UNCERTAINTY  | "possible consolidation"       |
//!
//! A etapa 1 existe porque várias construções incertas contêm uma negação
//! ("cannot exclude"), e precisam ser reconhecidas antes dela.
//! Nenhum match ⇒ a menção é POSITIVA (nenhuma [`Detection`] é produzida).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::PatternPaths;
use crate::document::Sentence;
use crate::error::Result;
use crate::graph::{DependencyGraph, NodeId};
use crate::pattern::{Match, PatternSet};
use crate::propagator::{propagate, PropagatedGraph};
use crate::span::Span;

/// Rótulo atribuído a uma menção. A ausência de rótulo significa POSITIVO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Negation,
    Uncertainty,
}

impl Label {
    /// Nome usado nos infons das anotações
    pub fn name(&self) -> &'static str {
        match self {
            Label::Negation => "negation",
            Label::Uncertainty => "uncertainty",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Etapa da cascata; cada uma corresponde a um conjunto de padrões.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreNegationUncertainty,
    Negation,
    PostNegationUncertainty,
}

impl Stage {
    /// Ordem fixa de avaliação.
    pub const CASCADE: [Stage; 3] = [
        Stage::PreNegationUncertainty,
        Stage::Negation,
        Stage::PostNegationUncertainty,
    ];

    pub fn label(self) -> Label {
        match self {
            Stage::Negation => Label::Negation,
            Stage::PreNegationUncertainty | Stage::PostNegationUncertainty => Label::Uncertainty,
        }
    }
}

/// `(rótulo, match, span)`: uma decisão do detector para um nó de uma menção.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection<'p> {
    pub label: Label,
    pub matched: Match<'p>,
    pub span: Span,
}

/// Capacidade de detectar negação/incerteza nas menções de uma sentença.
pub trait Detector {
    /// Constrói o grafo da sentença e devolve as detecções, preguiçosamente,
    /// na ordem de `locations` e, dentro de cada span, na ordem dos nós.
    fn detect<'d>(
        &'d self,
        sentence: &Sentence,
        locations: &[Span],
    ) -> Result<Box<dyn Iterator<Item = Detection<'d>> + 'd>>;
}

/// O detector de menções, com os três conjuntos de padrões.
#[derive(Debug, Clone)]
pub struct MentionDetector {
    pre_negation_uncertainty: PatternSet,
    negation: PatternSet,
    post_negation_uncertainty: PatternSet,
}

impl MentionDetector {
    pub fn new(
        pre_negation_uncertainty: PatternSet,
        negation: PatternSet,
        post_negation_uncertainty: PatternSet,
    ) -> Self {
        Self {
            pre_negation_uncertainty,
            negation,
            post_negation_uncertainty,
        }
    }

    /// Carrega os três conjuntos; falha no primeiro recurso inválido.
    pub fn load(paths: &PatternPaths) -> Result<Self> {
        Ok(Self::new(
            PatternSet::load(&paths.pre_negation_uncertainty)?,
            PatternSet::load(&paths.negation)?,
            PatternSet::load(&paths.post_negation_uncertainty)?,
        ))
    }

    pub fn patterns(&self, stage: Stage) -> &PatternSet {
        match stage {
            Stage::PreNegationUncertainty => &self.pre_negation_uncertainty,
            Stage::Negation => &self.negation,
            Stage::PostNegationUncertainty => &self.post_negation_uncertainty,
        }
    }

    /// Aplica a cascata a um nó; `None` significa POSITIVO.
    pub fn classify_node(&self, graph: &PropagatedGraph, node: NodeId) -> Option<(Label, Match<'_>)> {
        Stage::CASCADE.iter().find_map(|&stage| {
            self.patterns(stage)
                .first_match(graph, node)
                .map(|m| (stage.label(), m))
        })
    }

    /// Versão concreta de [`Detector::detect`].
    ///
    /// O grafo é construído e propagado aqui, uma única vez; o casamento só
    /// acontece à medida que o iterador é consumido.
    pub fn detections(&self, sentence: &Sentence, locations: &[Span]) -> Result<Detections<'_>> {
        let graph = DependencyGraph::from_sentence(sentence).map_err(|e| {
            error!(offset = sentence.offset, error = %e, "Não foi possível construir o grafo de dependências");
            e
        })?;

        Ok(Detections {
            detector: self,
            graph: propagate(graph),
            locations: locations.to_vec().into_iter(),
            pending: VecDeque::new(),
        })
    }
}

impl Detector for MentionDetector {
    fn detect<'d>(
        &'d self,
        sentence: &Sentence,
        locations: &[Span],
    ) -> Result<Box<dyn Iterator<Item = Detection<'d>> + 'd>> {
        Ok(Box::new(self.detections(sentence, locations)?))
    }
}

/// Iterador de detecções de uma sentença. Dono do grafo propagado.
pub struct Detections<'d> {
    detector: &'d MentionDetector,
    graph: PropagatedGraph,
    locations: std::vec::IntoIter<Span>,
    /// Nós ainda não testados do span corrente
    pending: VecDeque<(Span, NodeId)>,
}

impl<'d> Detections<'d> {
    pub fn graph(&self) -> &PropagatedGraph {
        &self.graph
    }
}

impl<'d> Iterator for Detections<'d> {
    type Item = Detection<'d>;

    fn next(&mut self) -> Option<Detection<'d>> {
        loop {
            if let Some((span, node)) = self.pending.pop_front() {
                if let Some((label, matched)) = self.detector.classify_node(&self.graph, node) {
                    return Some(Detection { label, matched, span });
                }
                continue;
            }
            let span = self.locations.next()?;
            self.pending.extend(self.graph.find_nodes(span).map(|n| (span, n)));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::error::Error;
    use crate::graph::tests::sentence;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Roda `f` com um subscriber de nível INFO que grava em memória; devolve a saída.
    pub(crate) fn captured_logs(f: impl FnOnce()) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    const NEGATION: &str = r#"[
        {"name": "no_evidence_of", "pattern": {"relations": [
            {"direction": "governed_by", "dependency": "nmod(:.*)?", "node": {"lemma": "evidence",
                "relations": [{"direction": "governs", "dependency": "neg|det", "node": {"lemma": "no"}}]}}
        ]}},
        {"name": "direct_negation", "pattern": {"relations": [
            {"direction": "governs", "dependency": "neg|det", "node": {"lemma": "no|not"}}
        ]}}
    ]"#;

    const PRE_NEGATION: &str = r#"[
        {"name": "may_represent", "pattern": {"relations": [
            {"direction": "governed_by", "dependency": "nmod(:.*)?", "node": {"lemma": "evidence",
                "relations": [{"direction": "governed_by", "dependency": "dobj|obj", "node": {"lemma": "represent",
                    "relations": [{"direction": "governs", "dependency": "aux", "node": {"lemma": "may"}}]}}]}}
        ]}}
    ]"#;

    const POST_NEGATION: &str = r#"[
        {"name": "possible", "pattern": {"relations": [
            {"direction": "governs", "dependency": "amod", "node": {"lemma": "possible"}}
        ]}}
    ]"#;

    fn detector() -> MentionDetector {
        MentionDetector::new(
            PatternSet::from_json("pre_negation_uncertainty", PRE_NEGATION).unwrap(),
            PatternSet::from_json("negation", NEGATION).unwrap(),
            PatternSet::from_json("post_negation_uncertainty", POST_NEGATION).unwrap(),
        )
    }

    /// "no evidence of edema": edema em [15, 20)
    fn no_evidence_of_edema() -> Sentence {
        sentence(0, &[
            ("no", "no", 2, "neg"),
            ("evidence", "evidence", 0, "root"),
            ("of", "of", 4, "case"),
            ("edema", "edema", 2, "nmod:of"),
        ])
    }

    /// "may represent no evidence of edema": edema em [29, 34)
    fn may_represent_no_evidence() -> Sentence {
        sentence(0, &[
            ("may", "may", 2, "aux"),
            ("represent", "represent", 0, "root"),
            ("no", "no", 4, "neg"),
            ("evidence", "evidence", 2, "dobj"),
            ("of", "of", 6, "case"),
            ("edema", "edema", 4, "nmod:of"),
        ])
    }

    #[test]
    fn test_negation_detected() {
        let d = detector();
        let found: Vec<Detection> = d.detections(&no_evidence_of_edema(), &[Span::new(15, 20)]).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, Label::Negation);
        assert_eq!(found[0].matched.pattern_name(), "no_evidence_of");
        assert_eq!(found[0].matched.node(), NodeId(3));
        assert_eq!(found[0].span, Span::new(15, 20));
    }

    #[test]
    fn test_pre_negation_uncertainty_wins() {
        let d = detector();
        let s = may_represent_no_evidence();
        let found: Vec<Detection> = d.detections(&s, &[Span::new(29, 34)]).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, Label::Uncertainty);
        assert_eq!(found[0].matched.pattern_name(), "may_represent");

        // o padrão de negação também casaria sozinho
        let graph = propagate(DependencyGraph::from_sentence(&s).unwrap());
        assert!(d.patterns(Stage::Negation).first_match(&graph, NodeId(5)).is_some());
    }

    #[test]
    fn test_post_negation_uncertainty() {
        let d = detector();
        let s = sentence(0, &[("possible", "possible", 2, "amod"), ("pneumonia", "pneumonia", 0, "root")]);
        let found: Vec<Detection> = d.detections(&s, &[Span::new(9, 18)]).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, Label::Uncertainty);
        assert_eq!(found[0].matched.pattern_name(), "possible");
    }

    #[test]
    fn test_no_match_is_positive() {
        let d = detector();
        let s = sentence(0, &[("mild", "mild", 2, "amod"), ("edema", "edema", 0, "root")]);
        assert_eq!(d.detections(&s, &[Span::new(5, 10)]).unwrap().count(), 0);
    }

    #[test]
    fn test_span_without_nodes_yields_nothing() {
        let d = detector();
        assert_eq!(d.detections(&no_evidence_of_edema(), &[Span::new(200, 210)]).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_span_yields_nothing() {
        let d = MentionDetector::new(
            PatternSet::default(),
            PatternSet::from_json("neg", r#"[{"name": "edema", "pattern": {"lemma": "edema"}}]"#).unwrap(),
            PatternSet::default(),
        );
        let s = sentence(0, &[("no", "no", 2, "neg"), ("edema", "edema", 0, "root")]);
        assert_eq!(d.detections(&s, &[Span::new(5, 5)]).unwrap().count(), 0);
        assert_eq!(d.detections(&s, &[Span::new(5, 6)]).unwrap().count(), 1);
    }

    #[test]
    fn test_order_follows_locations_then_nodes() {
        // "no edema no effusion" com dois spans, o segundo primeiro
        let d = detector();
        let s = sentence(0, &[
            ("no", "no", 2, "neg"),
            ("edema", "edema", 0, "root"),
            ("no", "no", 4, "neg"),
            ("effusion", "effusion", 2, "conj"),
        ]);
        let locations = [Span::new(12, 20), Span::new(0, 8)];
        let found: Vec<(Span, NodeId)> = d
            .detections(&s, &locations)
            .unwrap()
            .map(|det| (det.span, det.matched.node()))
            .collect();
        // o span [0, 8) cobre `no` e `edema`: só `edema` é negado
        assert_eq!(found, vec![(Span::new(12, 20), NodeId(3)), (Span::new(0, 8), NodeId(1))]);
    }

    #[test]
    fn test_at_most_one_detection_per_node() {
        // dois padrões de negação e um de pós-negação casam `edema`:
        // sai uma única detecção, do primeiro padrão
        let d = MentionDetector::new(
            PatternSet::default(),
            PatternSet::from_json("neg", r#"[
                {"name": "a", "pattern": {"lemma": "edema"}},
                {"name": "b", "pattern": {"lemma": "edema"}}
            ]"#).unwrap(),
            PatternSet::from_json("post", r#"[{"name": "c", "pattern": {"lemma": "edema"}}]"#).unwrap(),
        );
        let found: Vec<Detection> = d.detections(&no_evidence_of_edema(), &[Span::new(15, 20)]).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].matched.pattern_name(), "a");
    }

    #[test]
    fn test_malformed_graph_fails_before_any_detection() {
        let d = detector();
        let mut s = no_evidence_of_edema();
        s.offset = 57;
        s.dependencies.as_mut().unwrap().tokens[3].location = None;
        let result = d.detect(&s, &[Span::new(15, 20)]);
        match result {
            Err(Error::GraphConstruction { offset, .. }) => assert_eq!(offset, 57),
            Err(other) => panic!("erro inesperado: {}", other),
            Ok(_) => panic!("esperado GraphConstruction"),
        }
    }

    #[test]
    fn test_graph_failure_logs_sentence_offset() {
        let d = detector();
        let mut s = no_evidence_of_edema();
        s.offset = 57;
        s.dependencies = None;
        let logs = captured_logs(|| {
            assert!(d.detections(&s, &[Span::new(15, 20)]).is_err());
        });
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("offset=57"));
    }

    #[test]
    fn test_partial_iteration() {
        let d = detector();
        let s = no_evidence_of_edema();
        let mut it = d.detect(&s, &[Span::new(15, 20), Span::new(15, 20)]).unwrap();
        assert!(it.next().is_some());
        drop(it);
    }

    #[test]
    fn test_conjunct_inherits_negation_through_propagation() {
        // "no evidence of edema or effusion"
        let d = detector();
        let s = sentence(0, &[
            ("no", "no", 2, "neg"),
            ("evidence", "evidence", 0, "root"),
            ("of", "of", 4, "case"),
            ("edema", "edema", 2, "nmod:of"),
            ("or", "or", 6, "cc"),
            ("effusion", "effusion", 4, "conj:or"),
        ]);
        let found: Vec<Detection> = d.detections(&s, &[Span::new(24, 32)]).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, Label::Negation);
        assert_eq!(found[0].matched.node(), NodeId(5));
    }
}
