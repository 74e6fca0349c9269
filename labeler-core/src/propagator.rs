//! # Propagação de Dependências
//!
//! Antes do casamento de padrões, o escopo dos modificadores é estendido ao
//! longo de coordenações e aposições. Em "no edema or effusion", o parser liga
//! `no` apenas a `edema`; como `edema -conj:or-> effusion`, a propagação copia
//! as arestas que chegam em `edema` para `effusion`, e um padrão de negação
//! sobre `edema` passa a valer também para `effusion`.
//!
//! A reescrita roda duas rodadas (alcança cadeias `a → b → c`) e nunca
//! substitui uma aresta existente.
//!
//! [`propagate`] consome o [`DependencyGraph`] e devolve um [`PropagatedGraph`]:
//! o tipo garante que a propagação é aplicada exatamente uma vez antes do
//! casamento.

use std::ops::Deref;

use crate::graph::{DependencyGraph, Edge};

const ROUNDS: usize = 2;

/// Grafo já propagado, pronto para o casamento de padrões.
#[derive(Debug, Clone)]
pub struct PropagatedGraph(DependencyGraph);

impl PropagatedGraph {
    pub fn into_inner(self) -> DependencyGraph {
        self.0
    }
}

impl Deref for PropagatedGraph {
    type Target = DependencyGraph;

    fn deref(&self) -> &DependencyGraph {
        &self.0
    }
}

/// Relações cujo dependente herda os governantes do seu núcleo.
fn inherits_parents(dependency: &str) -> bool {
    dependency == "conj" || dependency.starts_with("conj:") || dependency == "appos"
}

pub fn propagate(mut graph: DependencyGraph) -> PropagatedGraph {
    for _ in 0..ROUNDS {
        let mut pending: Vec<Edge> = Vec::new();
        for node in graph.node_ids() {
            for edge in graph.out_edges(node) {
                if !inherits_parents(&edge.dependency) {
                    continue;
                }
                let child = edge.dependent;
                for parent in graph.in_edges(node) {
                    if parent.governor != child {
                        pending.push(Edge {
                            governor: parent.governor,
                            dependent: child,
                            dependency: parent.dependency.clone(),
                        });
                    }
                }
            }
        }
        let added = pending
            .into_iter()
            .filter(|e| graph.add_edge(e.governor, e.dependent, &e.dependency))
            .count();
        if added == 0 {
            break;
        }
    }
    PropagatedGraph(graph)
}
