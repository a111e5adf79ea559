//! Reading and writing macropad configurations: `config.xml` and the ZIP
//! bundle that carries it together with the per-key bitmaps.

pub mod archive;
pub mod config_xml;
pub mod error;
pub mod xml;

pub use archive::{
    export_archive, export_xml, preview_import, preview_xml, Compression, ExportOptions,
    ExportResult, ImportPreview,
};
pub use config_xml::{build_config_xml, parse_config_xml, BuildResult, ParseResult};
pub use error::{ArchiveError, CodecError};

/// Every recoverable problem goes to the log as well as to the caller.
pub(crate) fn push_warning(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{message}");
    warnings.push(message);
}
