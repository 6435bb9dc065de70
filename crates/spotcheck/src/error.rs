use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid role mapping in {path}: {message}")]
    RoleMapping { path: Utf8PathBuf, message: String },

    #[error("table {table:?} does not exist in schema {schema:?}")]
    UnknownTable { schema: String, table: String },

    #[error("column {column:?} has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
