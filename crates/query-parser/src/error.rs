use crate::Pos;

/// Parser result.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised while reading a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The document doesn't follow the grammar.
    #[error("Syntax error: {message}")]
    Syntax { message: String, pos: Pos },
    /// Selections, values or types are nested deeper than the parser accepts.
    #[error("Syntax error: document is nested too deeply")]
    RecursionLimitExceeded { pos: Pos },
}

impl Error {
    pub(crate) fn syntax(message: impl Into<String>, pos: Pos) -> Self {
        Error::Syntax {
            message: message.into(),
            pos,
        }
    }

    /// Where the error was detected.
    pub fn position(&self) -> Pos {
        match self {
            Error::Syntax { pos, .. } | Error::RecursionLimitExceeded { pos } => *pos,
        }
    }
}
