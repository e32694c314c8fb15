//! Content-Type to file extension resolution

use thiserror::Error;

/// Extensions preferred where a MIME type maps to several
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("text/html", ".html"),
    ("text/plain", ".txt"),
    ("image/jpeg", ".jpg"),
    ("image/tiff", ".tif"),
    ("application/msword", ".doc"),
    ("application/vnd.ms-excel", ".xls"),
    ("application/vnd.ms-powerpoint", ".ppt"),
];

/// Why a content type could not be turned into an extension
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Could not determine file type: response has no Content-Type")]
    Missing,

    #[error("Could not determine file type for '{0}'")]
    Unknown(String),
}

/// Result of resolving a Content-Type header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// Extension with a leading dot
    pub extension: String,

    /// Base MIME type, lower-cased
    pub mime_type: String,
}

/// Resolves a Content-Type header value to a file extension
///
/// Parameters after `;` are ignored.
///
/// # Example
///
/// ```
/// use civicweb_harvester::crawler::resolve_file_type;
///
/// let resolved = resolve_file_type(Some("application/pdf; charset=binary")).unwrap();
/// assert_eq!(resolved.extension, ".pdf");
/// ```
pub fn resolve_file_type(content_type: Option<&str>) -> Result<ResolvedType, ResolutionError> {
    let mime_type = content_type
        .and_then(|value| value.split(';').next())
        .map(|base| base.trim().to_ascii_lowercase())
        .filter(|base| !base.is_empty())
        .ok_or(ResolutionError::Missing)?;

    let extension = PREFERRED_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, ext)| ext.to_string())
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&mime_type)
                .and_then(|extensions| extensions.first())
                .map(|ext| format!(".{}", ext))
        })
        .ok_or_else(|| ResolutionError::Unknown(mime_type.clone()))?;

    Ok(ResolvedType {
        extension,
        mime_type,
    })
}
