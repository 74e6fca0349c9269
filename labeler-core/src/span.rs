//! # Spans de Caracteres
//!
//! Um [`Span`] é um intervalo semiaberto `[start, end)` de offsets de caractere
//! relativos ao documento. É usado tanto para localizar uma menção quanto para
//! o intervalo coberto por cada token do grafo de dependências.
//!
//! ## Exemplo
//! Em "no evidence of edema" começando no offset 100, a menção "edema":
//! `Span { start: 115, end: 120 }`

use serde::{Deserialize, Serialize};

/// Intervalo semiaberto de offsets (início inclusivo, fim exclusivo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Offset inicial (inclusivo)
    pub start: usize,
    /// Offset final (exclusivo)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Verdadeiro se os dois intervalos compartilham ao menos um offset.
    ///
    /// Spans vazios nunca se intersectam com nada.
    pub fn intersects(&self, other: &Span) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Menor span que cobre `self` e `other`.
    pub fn cover(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span::new(start, end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
