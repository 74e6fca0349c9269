//! # Conversor CoNLL-U
//!
//! Converte um parse de dependências em CoNLL-U (10 colunas separadas por TAB)
//! no [`DependencyParse`] da sentença.
//!
//! ```text
//! # text = No evidence of edema.
//! 1   No        no        DET    DT   _   2   neg       _   _
//! 2   evidence  evidence  NOUN   NN   _   0   root      _   _
//! 3   of        of        ADP    IN   _   4   case      _   _
//! 4   edema     edema     NOUN   NN   _   2   nmod:of   _   _
//! 5   .         .         PUNCT  .    _   2   punct     _   _
//! ```
//!
//! - Comentários, faixas de palavras multi-token (`1-2`) e nós vazios (`3.1`)
//!   são ignorados.
//! - A tag é o XPOS; se ausente (`_`), o UPOS.
//! - `HEAD = 0` marca a raiz.
//! - O CoNLL-U não traz offsets: cada FORM é alinhada, da esquerda para a
//!   direita, ao texto da sentença. Um token que não pode ser alinhado fica sem
//!   localização, e a construção do grafo falhará para essa sentença.

use crate::document::{DepRelation, DepToken, DependencyParse, Location, Sentence};
use crate::error::{Error, Result};
use crate::parse::{DependencyConverter, ParseTree};

const COLUMNS: usize = 10;
const EMPTY: &str = "_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConlluConverter;

impl DependencyConverter for ConlluConverter {
    fn convert(&self, sentence: &Sentence, tree: &ParseTree) -> Result<DependencyParse> {
        let chars: Vec<char> = sentence.text.as_deref().unwrap_or_default().chars().collect();
        let mut cursor = 0;
        let mut parse = DependencyParse::default();

        for (index, line) in tree.text.lines().enumerate() {
            let line_no = index + 1;
            let fail = |message: String| Error::Convert {
                offset: sentence.offset,
                line: line_no,
                message,
            };

            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() != COLUMNS {
                return Err(fail(format!("esperadas {} colunas, encontradas {}", COLUMNS, cols.len())));
            }
            let id = cols[0];
            if id.contains('-') || id.contains('.') {
                continue;
            }
            id.parse::<usize>()
                .map_err(|_| fail(format!("id de token inválido `{}`", id)))?;
            let head: usize = cols[6]
                .parse()
                .map_err(|_| fail(format!("HEAD inválido `{}`", cols[6])))?;

            let form = cols[1];
            let field = |value: &str| (value != EMPTY).then(|| value.to_string());
            let location = align(&chars, form, &mut cursor)
                .map(|start| Location::new(sentence.offset + start, form.chars().count()));

            parse.tokens.push(DepToken {
                id: id.to_string(),
                text: form.to_string(),
                lemma: field(cols[2]),
                tag: field(cols[4]).or_else(|| field(cols[3])),
                location,
            });
            parse.relations.push(DepRelation {
                dependency: cols[7].to_string(),
                governor: (head != 0).then(|| head.to_string()),
                dependent: id.to_string(),
            });
        }

        Ok(parse)
    }
}

/// Procura `form` em `chars` a partir de `cursor`; avança o cursor se encontrar.
fn align(chars: &[char], form: &str, cursor: &mut usize) -> Option<usize> {
    let needle: Vec<char> = form.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return None;
    }
    let start = (*cursor..=chars.len() - needle.len()).find(|&i| chars[i..i + needle.len()] == needle[..])?;
    *cursor = start + needle.len();
    Some(start)
}
