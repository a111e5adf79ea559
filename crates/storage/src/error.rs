#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("XML parsing error at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("document has no root element")]
    Empty,
    #[error("missing <Configuration> root element")]
    MissingRoot,
    #[error("failed to write XML: {0}")]
    Write(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to parse config.xml: {0}")]
    Codec(#[from] CodecError),
    #[error("config.xml not found in archive")]
    ConfigNotFound,
    #[error("config.xml is a directory, not a file")]
    ConfigIsDirectory,
}
