//! # Erros do Classificador
//!
//! Um único enum de erro cobre as quatro falhas que interrompem o processamento:
//!
//! | Variante             | Quando ocorre                                         | Efeito                    |
//! |----------------------|-------------------------------------------------------|---------------------------|
//! | `PatternLoad`        | arquivo de padrões ausente ou malformado              | falha na inicialização    |
//! | `GraphConstruction`  | dependências da sentença não formam um grafo válido   | aborta o documento        |
//! | `Parse`              | o parser externo não produziu árvore para a sentença  | aborta o documento        |
//! | `Convert`            | a árvore não pôde ser convertida em dependências      | aborta o documento        |
//!
//! Nenhum erro é engolido dentro do laço de detecção.

use std::path::PathBuf;

use thiserror::Error;

/// Resultado padrão do crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Conjunto de padrões não pôde ser carregado.
    #[error("falha ao carregar padrões de {path}: {source}")]
    PatternLoad {
        path: PathBuf,
        #[source]
        source: PatternError,
    },

    /// O grafo de dependências da sentença é inválido.
    #[error("não foi possível construir o grafo de dependências [offset={offset}]: {reason}")]
    GraphConstruction { offset: usize, reason: String },

    /// Falha do parser externo.
    #[error("não foi possível fazer o parsing da sentença [offset={offset}]: {message}")]
    Parse { offset: usize, message: String },

    /// Falha na conversão árvore → dependências.
    #[error("não foi possível converter a sentença [offset={offset}] na linha {line}: {message}")]
    Convert {
        offset: usize,
        line: usize,
        message: String,
    },
}

/// Motivo de falha ao carregar um recurso de padrões.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("recurso ilegível: {0}")]
    Io(#[from] std::io::Error),

    #[error("recurso de padrões malformado: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex inválida no padrão `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("nome de padrão duplicado `{0}`")]
    DuplicateName(String),
}

impl Error {
    /// Offset da sentença envolvida, quando o erro é por sentença.
    pub fn sentence_offset(&self) -> Option<usize> {
        match self {
            Error::PatternLoad { .. } => None,
            Error::GraphConstruction { offset, .. }
            | Error::Parse { offset, .. }
            | Error::Convert { offset, .. } => Some(*offset),
        }
    }
}
