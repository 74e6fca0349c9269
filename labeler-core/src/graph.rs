//! # Grafo de Dependências
//!
//! Representação da sentença usada pelo casamento de padrões:
//! cada token vira um nó (com lemma, tag e intervalo de offsets) e cada
//! relação de dependência vira uma aresta dirigida `governor → dependent`.
//!
//! ```text
//!        evidence
//!       /   |    \
//!   det:neg nmod:of  ...
//!     /     |
//!    no   edema
//! ```
//!
//! Há no máximo uma aresta por par ordenado `(governor, dependent)`, como num
//! dígrafo simples. Os nós são numerados na ordem dos tokens, que também é a
//! ordem de descoberta usada pelo detector.

use std::collections::HashMap;

use crate::document::Sentence;
use crate::error::{Error, Result};
use crate::span::Span;

/// Índice de um nó dentro do seu grafo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub word: String,
    pub lemma: String,
    pub tag: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub governor: NodeId,
    pub dependent: NodeId,
    pub dependency: String,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Offset da sentença de origem (para diagnóstico)
    offset: usize,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Índices em `edges` das arestas que saem de cada nó
    outgoing: Vec<Vec<usize>>,
    /// Índices em `edges` das arestas que chegam a cada nó
    incoming: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Constrói o grafo a partir do parse de dependências da sentença.
    ///
    /// Falha com [`Error::GraphConstruction`] quando a sentença não tem parse,
    /// quando um token não tem localização, ou quando uma relação referencia um
    /// token inexistente ou liga um token a si mesmo.
    pub fn from_sentence(sentence: &Sentence) -> Result<Self> {
        let offset = sentence.offset;
        let fail = |reason: String| Error::GraphConstruction { offset, reason };

        let parse = sentence
            .dependencies
            .as_ref()
            .ok_or_else(|| fail("sentença sem parse de dependências".to_string()))?;

        let mut graph = DependencyGraph::new(offset);
        let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(parse.tokens.len());

        for token in &parse.tokens {
            let location = token
                .location
                .ok_or_else(|| fail(format!("token `{}` ({}) sem offsets", token.id, token.text)))?;
            let node = Node {
                word: token.text.clone(),
                lemma: token.lemma.clone().unwrap_or_else(|| token.text.to_lowercase()),
                tag: token.tag.clone().unwrap_or_default(),
                span: location.span(),
            };
            if ids.insert(token.id.as_str(), graph.add_node(node)).is_some() {
                return Err(fail(format!("id de token duplicado `{}`", token.id)));
            }
        }

        for relation in &parse.relations {
            let lookup = |id: &str| {
                ids.get(id)
                    .copied()
                    .ok_or_else(|| fail(format!("relação `{}` aponta para token desconhecido `{}`", relation.dependency, id)))
            };
            let dep = lookup(&relation.dependent)?;
            // raiz: sem governante, sem aresta
            let Some(governor) = relation.governor.as_deref() else {
                continue;
            };
            let gov = lookup(governor)?;
            if gov == dep {
                return Err(fail(format!("relação `{}` é um laço em `{}`", relation.dependency, governor)));
            }
            graph.add_edge(gov, dep, &relation.dependency);
        }

        Ok(graph)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        NodeId(self.nodes.len() - 1)
    }

    /// Adiciona `governor -dependency-> dependent`.
    ///
    /// Retorna `false` (sem alterar o grafo) se o par já estiver ligado.
    pub fn add_edge(&mut self, governor: NodeId, dependent: NodeId, dependency: &str) -> bool {
        if self.has_edge(governor, dependent) {
            return false;
        }
        let index = self.edges.len();
        self.edges.push(Edge {
            governor,
            dependent,
            dependency: dependency.to_string(),
        });
        self.outgoing[governor.0].push(index);
        self.incoming[dependent.0].push(index);
        true
    }

    pub fn has_edge(&self, governor: NodeId, dependent: NodeId) -> bool {
        self.outgoing
            .get(governor.0)
            .map(|out| out.iter().any(|&e| self.edges[e].dependent == dependent))
            .unwrap_or(false)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Arestas que saem de `id`, na ordem de inserção.
    pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing[id.0].iter().map(move |&e| &self.edges[e])
    }

    /// Arestas que chegam em `id`, na ordem de inserção.
    pub fn in_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming[id.0].iter().map(move |&e| &self.edges[e])
    }

    /// Nós cujo intervalo de token intersecta `span`, na ordem dos nós.
    pub fn find_nodes(&self, span: Span) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.span.intersects(&span))
            .map(|(i, _)| NodeId(i))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::document::{DepRelation, DepToken, DependencyParse, Location};

    /// Monta uma sentença com parse a partir de `(palavra, lemma, head, deprel)`.
    ///
    /// `head` é 1-based como em CoNLL-U (0 = raiz). Tokens são separados por um espaço.
    pub(crate) fn sentence(offset: usize, rows: &[(&str, &str, usize, &str)]) -> Sentence {
        let mut tokens = Vec::new();
        let mut relations = Vec::new();
        let mut cursor = offset;
        for (i, (word, lemma, head, deprel)) in rows.iter().enumerate() {
            let len = word.chars().count();
            tokens.push(DepToken {
                id: (i + 1).to_string(),
                text: word.to_string(),
                lemma: Some(lemma.to_string()),
                tag: None,
                location: Some(Location::new(cursor, len)),
            });
            relations.push(DepRelation {
                dependency: deprel.to_string(),
                governor: if *head == 0 { None } else { Some(head.to_string()) },
                dependent: (i + 1).to_string(),
            });
            cursor += len + 1;
        }
        let text: Vec<&str> = rows.iter().map(|r| r.0).collect();
        Sentence::new(offset, text.join(" ")).with_dependencies(DependencyParse { tokens, relations })
    }

    #[test]
    fn test_from_sentence_builds_nodes_and_edges() {
        let s = sentence(0, &[
            ("no", "no", 2, "neg"),
            ("evidence", "evidence", 0, "root"),
            ("of", "of", 4, "case"),
            ("edema", "edema", 2, "nmod:of"),
        ]);
        let g = DependencyGraph::from_sentence(&s).unwrap();
        assert_eq!(g.len(), 4);
        // a raiz não gera aresta
        assert_eq!(g.edges().len(), 3);
        assert!(g.has_edge(NodeId(1), NodeId(3)));
        assert_eq!(g.node(NodeId(3)).span, Span::new(15, 20));
    }

    #[test]
    fn test_find_nodes_by_overlap() {
        let s = sentence(100, &[("no", "no", 2, "neg"), ("pleural", "pleural", 3, "amod"), ("effusion", "effusion", 0, "root")]);
        let g = DependencyGraph::from_sentence(&s).unwrap();
        let found: Vec<NodeId> = g.find_nodes(Span::new(103, 119)).collect();
        assert_eq!(found, vec![NodeId(1), NodeId(2)]);
        assert_eq!(g.find_nodes(Span::new(0, 50)).count(), 0);
    }

    #[test]
    fn test_missing_offsets_is_graph_error() {
        let mut s = sentence(42, &[("no", "no", 2, "neg"), ("edema", "edema", 0, "root")]);
        s.dependencies.as_mut().unwrap().tokens[1].location = None;
        let err = DependencyGraph::from_sentence(&s).unwrap_err();
        assert!(matches!(err, Error::GraphConstruction { offset: 42, .. }));
    }

    #[test]
    fn test_unknown_token_reference() {
        let mut s = sentence(0, &[("no", "no", 2, "neg"), ("edema", "edema", 0, "root")]);
        s.dependencies.as_mut().unwrap().relations[0].governor = Some("9".into());
        assert!(DependencyGraph::from_sentence(&s).is_err());
    }

    #[test]
    fn test_root_relation_with_unknown_dependent() {
        let mut s = sentence(3, &[("no", "no", 2, "neg"), ("edema", "edema", 0, "root")]);
        s.dependencies.as_mut().unwrap().relations[1].dependent = "9".into();
        let err = DependencyGraph::from_sentence(&s).unwrap_err();
        assert!(matches!(err, Error::GraphConstruction { offset: 3, .. }));
    }

    #[test]
    fn test_sentence_without_parse() {
        let s = Sentence::new(7, "No edema.");
        let err = DependencyGraph::from_sentence(&s).unwrap_err();
        assert_eq!(err.sentence_offset(), Some(7));
    }

    #[test]
    fn test_add_edge_keeps_first() {
        let mut g = DependencyGraph::new(0);
        let a = g.add_node(Node { word: "a".into(), lemma: "a".into(), tag: String::new(), span: Span::new(0, 1) });
        let b = g.add_node(Node { word: "b".into(), lemma: "b".into(), tag: String::new(), span: Span::new(2, 3) });
        assert!(g.add_edge(a, b, "dep"));
        assert!(!g.add_edge(a, b, "amod"));
        assert_eq!(g.out_edges(a).next().unwrap().dependency, "dep");
    }
}
