//! # Agregação das Detecções no Documento
//!
//! Liga o detector ao modelo de documentos: para cada sentença, reúne as
//! menções da passagem que a intersectam, roda o detector e grava o resultado
//! nos infons das anotações correspondentes:
//!
//! | infon                  | valor                     |
//! |------------------------|---------------------------|
//! | `negation`             | `"True"`                  |
//! | `negation_pattern`     | nome do padrão que casou  |
//! | `uncertainty`          | `"True"`                  |
//! | `uncertainty_pattern`  | nome do padrão que casou  |
//!
//! Uma anotação sem nenhum desses infons é positiva.

use tracing::debug;

use crate::detector::Detector;
use crate::document::{Annotation, Document, Passage};
use crate::error::Result;
use crate::span::Span;

pub const TRUE: &str = "True";

/// Roda `detector` sobre todas as sentenças e grava as detecções.
///
/// Todas as sentenças passam pelo detector, mesmo sem menções, de modo que um
/// grafo inválido sempre aborta o documento. Retorna o número de detecções.
pub fn detect_document<D: Detector + ?Sized>(document: &mut Document, detector: &D) -> Result<usize> {
    let mut recorded = 0;
    for passage in &mut document.passages {
        let Passage {
            sentences,
            annotations,
            ..
        } = passage;

        for sentence in sentences.iter() {
            let locations = mention_locations(annotations, sentence.extent());
            for detection in detector.detect(sentence, &locations)? {
                let pattern = detection.matched.pattern_name();
                debug!(
                    label = %detection.label,
                    pattern,
                    span = %detection.span,
                    offset = sentence.offset,
                    "Detecção"
                );
                for ann in annotations
                    .iter_mut()
                    .filter(|a| a.total_span() == Some(detection.span))
                {
                    ann.infons.insert(detection.label.name().to_string(), TRUE.to_string());
                    ann.infons
                        .insert(format!("{}_pattern", detection.label.name()), pattern.to_string());
                }
                recorded += 1;
            }
        }
    }
    Ok(recorded)
}

/// Spans totais das anotações que intersectam a sentença, na ordem das anotações.
fn mention_locations(annotations: &[Annotation], extent: Option<Span>) -> Vec<Span> {
    let Some(extent) = extent else {
        return Vec::new();
    };
    annotations
        .iter()
        .filter_map(Annotation::total_span)
        .filter(|span| span.intersects(&extent))
        .collect()
}
