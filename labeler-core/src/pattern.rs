//! # Padrões sobre o Grafo de Dependências
//!
//! Um padrão descreve uma configuração estrutural ao redor de um nó, por
//! exemplo "o nó é complemento de *evidence*, que por sua vez governa *no*".
//! Os padrões são escritos como dados (JSON) já na forma compilada: cada nó tem
//! restrições opcionais de `word`, `lemma` e `tag` (regex) e uma lista de
//! relações com outros nós.
//!
//! ```json
//! [
//!   {
//!     "name": "no_evidence_of",
//!     "pattern": {
//!       "relations": [
//!         { "direction": "governed_by", "dependency": "nmod(:.*)?",
//!           "node": { "lemma": "evidence",
//!                     "relations": [ { "direction": "governs", "dependency": "neg|det",
//!                                      "node": { "lemma": "no" } } ] } }
//!       ]
//!     }
//!   }
//! ]
//! ```
//!
//! ## Semântica do casamento
//!
//! - Regexes casam a string **inteira** (são ancoradas implicitamente).
//! - Cada nó do grafo é tentado como raiz, na ordem dos nós; para cada raiz é
//!   produzido no máximo um [`Match`], o primeiro encontrado por busca em
//!   profundidade com retrocesso sobre as relações na ordem declarada.
//! - Uma relação com `"absent": true` só é satisfeita se **nenhum** vizinho
//!   a satisfaz (ex: "não governado por *no*").
//! - A ordem dos padrões num conjunto é a ordem do arquivo e define a
//!   precedência dentro do conjunto.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, PatternError, Result};
use crate::graph::{DependencyGraph, Edge, Node, NodeId};

/// Sentido da relação, visto a partir do nó que a declara.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// O nó é o governante: `nó -dep-> vizinho`
    Governs,
    /// O nó é o dependente: `vizinho -dep-> nó`
    GovernedBy,
}

// === Forma serializada ===

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternSpec {
    name: String,
    pattern: NodeSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeSpec {
    name: Option<String>,
    word: Option<String>,
    lemma: Option<String>,
    tag: Option<String>,
    #[serde(default)]
    relations: Vec<RelationSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RelationSpec {
    direction: Direction,
    dependency: Option<String>,
    #[serde(default)]
    absent: bool,
    node: NodeSpec,
}

// === Forma compilada ===

/// Um padrão compilado.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    root: NodePattern,
}

#[derive(Debug, Clone)]
struct NodePattern {
    name: Option<String>,
    word: Option<Regex>,
    lemma: Option<Regex>,
    tag: Option<Regex>,
    relations: Vec<Relation>,
}

#[derive(Debug, Clone)]
struct Relation {
    direction: Direction,
    dependency: Option<Regex>,
    absent: bool,
    node: NodePattern,
}

fn compile_regex(pattern: &str, source: Option<String>) -> std::result::Result<Option<Regex>, PatternError> {
    source
        .map(|src| {
            Regex::new(&format!("^(?:{})$", src)).map_err(|source| PatternError::Regex {
                pattern: pattern.to_string(),
                source,
            })
        })
        .transpose()
}

impl NodePattern {
    fn compile(pattern: &str, spec: NodeSpec) -> std::result::Result<Self, PatternError> {
        Ok(Self {
            name: spec.name,
            word: compile_regex(pattern, spec.word)?,
            lemma: compile_regex(pattern, spec.lemma)?,
            tag: compile_regex(pattern, spec.tag)?,
            relations: spec
                .relations
                .into_iter()
                .map(|r| Relation::compile(pattern, r))
                .collect::<std::result::Result<_, _>>()?,
        })
    }

    fn accepts(&self, node: &Node) -> bool {
        let ok = |re: &Option<Regex>, value: &str| re.as_ref().map_or(true, |re| re.is_match(value));
        ok(&self.word, &node.word) && ok(&self.lemma, &node.lemma) && ok(&self.tag, &node.tag)
    }

    /// Tenta ligar este nó do padrão ao nó `id`. Em caso de falha, `captures`
    /// volta ao estado de entrada.
    fn bind(&self, graph: &DependencyGraph, id: NodeId, captures: &mut Vec<(String, NodeId)>) -> bool {
        if !self.accepts(graph.node(id)) {
            return false;
        }
        let mark = captures.len();
        if let Some(name) = &self.name {
            captures.push((name.clone(), id));
        }
        if bind_relations(&self.relations, graph, id, captures) {
            true
        } else {
            captures.truncate(mark);
            false
        }
    }
}

impl Relation {
    fn compile(pattern: &str, spec: RelationSpec) -> std::result::Result<Self, PatternError> {
        Ok(Self {
            direction: spec.direction,
            dependency: compile_regex(pattern, spec.dependency)?,
            absent: spec.absent,
            node: NodePattern::compile(pattern, spec.node)?,
        })
    }

    /// Vizinhos de `id` alcançáveis por uma aresta cujo rótulo satisfaz a relação.
    fn candidates(&self, graph: &DependencyGraph, id: NodeId) -> Vec<NodeId> {
        let label_ok = |e: &&Edge| self.dependency.as_ref().map_or(true, |re| re.is_match(&e.dependency));
        match self.direction {
            Direction::Governs => graph.out_edges(id).filter(label_ok).map(|e| e.dependent).collect(),
            Direction::GovernedBy => graph.in_edges(id).filter(label_ok).map(|e| e.governor).collect(),
        }
    }
}

fn bind_relations(
    relations: &[Relation],
    graph: &DependencyGraph,
    id: NodeId,
    captures: &mut Vec<(String, NodeId)>,
) -> bool {
    let Some((first, rest)) = relations.split_first() else {
        return true;
    };

    if first.absent {
        // capturas de uma relação ausente nunca são expostas
        let mut scratch = Vec::new();
        let blocked = first
            .candidates(graph, id)
            .into_iter()
            .any(|n| first.node.bind(graph, n, &mut scratch));
        return !blocked && bind_relations(rest, graph, id, captures);
    }

    for n in first.candidates(graph, id) {
        let mark = captures.len();
        if first.node.bind(graph, n, captures) && bind_relations(rest, graph, id, captures) {
            return true;
        }
        captures.truncate(mark);
    }
    false
}

impl Pattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sequência preguiçosa de matches sobre `graph`, um por nó raiz.
    ///
    /// Cada chamada recomeça do primeiro nó.
    pub fn find_iter<'p, 'g>(&'p self, graph: &'g DependencyGraph) -> Matches<'p, 'g> {
        Matches {
            pattern: self,
            graph,
            next: 0,
        }
    }
}

/// Resultado de aplicar um padrão a um grafo.
#[derive(Debug, Clone)]
pub struct Match<'p> {
    pattern: &'p Pattern,
    node: NodeId,
    captures: Vec<(String, NodeId)>,
}

impl<'p> Match<'p> {
    /// Nó ligado à raiz do padrão (`group(0)`).
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Nó capturado por um nó nomeado do padrão.
    pub fn group(&self, name: &str) -> Option<NodeId> {
        self.captures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn captures(&self) -> &[(String, NodeId)] {
        &self.captures
    }

    pub fn pattern(&self) -> &'p Pattern {
        self.pattern
    }

    pub fn pattern_name(&self) -> &'p str {
        &self.pattern.name
    }
}

impl PartialEq for Match<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.name == other.pattern.name
            && self.node == other.node
            && self.captures == other.captures
    }
}

/// Iterador retornado por [`Pattern::find_iter`].
pub struct Matches<'p, 'g> {
    pattern: &'p Pattern,
    graph: &'g DependencyGraph,
    next: usize,
}

impl<'p, 'g> Iterator for Matches<'p, 'g> {
    type Item = Match<'p>;

    fn next(&mut self) -> Option<Match<'p>> {
        while self.next < self.graph.len() {
            let id = NodeId(self.next);
            self.next += 1;
            let mut captures = Vec::new();
            if self.pattern.root.bind(self.graph, id, &mut captures) {
                return Some(Match {
                    pattern: self.pattern,
                    node: id,
                    captures,
                });
            }
        }
        None
    }
}

/// Conjunto ordenado de padrões carregado de um recurso.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    name: String,
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Carrega o conjunto a partir de um arquivo JSON.
    ///
    /// O nome do conjunto é o nome do arquivo sem extensão.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fail = |source: PatternError| Error::PatternLoad {
            path: path.to_path_buf(),
            source,
        };

        let json = std::fs::read_to_string(path).map_err(|e| fail(e.into()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let set = Self::from_json(name, &json).map_err(fail)?;

        debug!(path = %path.display(), patterns = set.len(), "Padrões carregados");
        Ok(set)
    }

    pub fn from_json(name: impl Into<String>, json: &str) -> std::result::Result<Self, PatternError> {
        let specs: Vec<PatternSpec> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        let mut patterns = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.name.clone()) {
                return Err(PatternError::DuplicateName(spec.name));
            }
            let root = NodePattern::compile(&spec.name, spec.pattern)?;
            patterns.push(Pattern {
                name: spec.name,
                root,
            });
        }
        Ok(Self {
            name: name.into(),
            patterns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    /// Primeiro match cujo nó raiz é `node`: padrões na ordem de carga, e
    /// dentro de cada padrão na ordem dos matches.
    pub fn first_match(&self, graph: &DependencyGraph, node: NodeId) -> Option<Match<'_>> {
        self.patterns
            .iter()
            .find_map(|p| p.find_iter(graph).find(|m| m.node() == node))
    }
}
