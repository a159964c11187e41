use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The conversion target cannot receive content (e.g. a cell outside the table grid).
    #[error("invalid conversion target: {0}")]
    InvalidTarget(String),

    /// The input is not UTF-8 text.
    #[error("markup is not valid UTF-8 text")]
    InvalidMarkup(#[from] std::str::Utf8Error),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write document package")]
    Package(#[from] zip::result::ZipError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
