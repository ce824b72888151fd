//! File-content validation
//!
//! Runs a fixed battery of checks over an upload's declared metadata and
//! leading bytes. The first hard failure wins and carries exactly one
//! reason; advisory observations accumulate as warnings on an accepted file.
//!
//! A failure to *read* the bytes is not a verdict: it surfaces as
//! [`ValidateError`] so callers can distinguish "could not judge" from
//! "judged invalid".

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::signatures;

/// How many leading bytes the signature and malware checks inspect
const SIGNATURE_READ_LEN: usize = 32;

/// Files smaller than this are flagged as unusually small
const TINY_FILE_BYTES: u64 = 100;

/// Declared metadata of a candidate upload.
///
/// The content itself is passed to [`validate_file`] separately, as a reader
/// over (at least) the file's leading bytes.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Filename as supplied by the user
    pub name: String,
    /// Declared MIME type (client-supplied, untrusted)
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Lowercased suffix after the last `.`, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
    }
}

/// Validation rules for one upload class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRules {
    /// Maximum size in bytes
    pub max_size: u64,
    /// Accepted declared MIME types (empty = no type restriction)
    pub allowed_types: Vec<String>,
    /// Accepted lowercase extensions (empty = no extension restriction)
    pub allowed_extensions: Vec<String>,
    /// Verify leading bytes against the declared type's signature
    pub check_magic_numbers: bool,
    /// Scan leading bytes for executable/script signatures
    pub scan_for_malware: bool,
}

impl UploadRules {
    /// Résumé uploads: PDF only, 5 MB.
    pub fn resume() -> Self {
        Self {
            max_size: 5 * 1024 * 1024,
            allowed_types: vec!["application/pdf".to_string()],
            allowed_extensions: vec!["pdf".to_string()],
            check_magic_numbers: true,
            scan_for_malware: true,
        }
    }

    /// Profile images: JPEG/PNG, 2 MB.
    pub fn profile_image() -> Self {
        Self {
            max_size: 2 * 1024 * 1024,
            allowed_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            check_magic_numbers: true,
            scan_for_malware: true,
        }
    }

    /// Company logos: JPEG/PNG/SVG, 1 MB.
    pub fn company_logo() -> Self {
        Self {
            max_size: 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/svg+xml".to_string(),
            ],
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "svg".to_string(),
            ],
            check_magic_numbers: true,
            scan_for_malware: true,
        }
    }

    /// Generic documents: PDF/Word/plain text, 10 MB.
    pub fn document() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            allowed_types: vec![
                "application/pdf".to_string(),
                "application/msword".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
                "text/plain".to_string(),
            ],
            allowed_extensions: vec![
                "pdf".to_string(),
                "doc".to_string(),
                "docx".to_string(),
                "txt".to_string(),
            ],
            check_magic_numbers: true,
            scan_for_malware: true,
        }
    }
}

/// Why an upload was rejected. Exactly one reason per rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Larger than the rules allow
    TooLarge { size: u64, max_size: u64 },
    /// Declared MIME type not in the allowlist
    TypeNotAllowed {
        mime_type: String,
        allowed: Vec<String>,
    },
    /// Extension missing or not in the allowlist
    ExtensionNotAllowed {
        extension: Option<String>,
        allowed: Vec<String>,
    },
    /// Leading bytes do not match any signature of the declared type
    SignatureMismatch,
    /// Leading bytes match a known executable/script signature
    SuspiciousContent,
    /// Name contains path separators or parent references
    UnsafeFileName,
}

impl RejectReason {
    /// User-facing message for this rejection.
    pub fn message(&self) -> String {
        match self {
            RejectReason::TooLarge { size, max_size } => format!(
                "File size ({:.2}MB) exceeds maximum allowed size ({:.2}MB)",
                *size as f64 / 1024.0 / 1024.0,
                *max_size as f64 / 1024.0 / 1024.0,
            ),
            RejectReason::TypeNotAllowed { mime_type, allowed } => format!(
                "File type \"{}\" is not allowed. Allowed types: {}",
                mime_type,
                allowed.join(", "),
            ),
            RejectReason::ExtensionNotAllowed { extension, allowed } => {
                let shown = match extension {
                    Some(extension) => format!(".{}", extension),
                    None => "(none)".to_string(),
                };
                format!(
                    "File extension \"{}\" is not allowed. Allowed extensions: {}",
                    shown,
                    allowed.join(", "),
                )
            }
            RejectReason::SignatureMismatch => {
                "File signature does not match the declared file type. \
                 This may indicate a corrupted or malicious file."
                    .to_string()
            }
            RejectReason::SuspiciousContent => {
                "File contains suspicious patterns that may indicate malware. \
                 Upload blocked for security reasons."
                    .to_string()
            }
            RejectReason::UnsafeFileName => "File name contains invalid characters".to_string(),
        }
    }
}

/// Non-fatal observation about an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadWarning {
    /// Extension does not match the declared MIME type
    ExtensionMismatch,
    /// File is smaller than 100 bytes
    UnusuallySmall,
    /// Filename has no extension
    NoExtension,
}

impl UploadWarning {
    /// User-facing message for this warning.
    pub fn message(&self) -> &'static str {
        match self {
            UploadWarning::ExtensionMismatch => {
                "File extension does not match the detected file type"
            }
            UploadWarning::UnusuallySmall => "File is unusually small",
            UploadWarning::NoExtension => "File has no extension",
        }
    }
}

/// Outcome of validating one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCheck {
    /// The file may proceed into a submission; warnings are advisory.
    Accepted { warnings: Vec<UploadWarning> },
    /// The file must not proceed. Exactly one reason.
    Rejected(RejectReason),
}

impl FileCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileCheck::Accepted { .. })
    }

    /// Warnings on an accepted file; empty when rejected.
    pub fn warnings(&self) -> &[UploadWarning] {
        match self {
            FileCheck::Accepted { warnings } => warnings,
            FileCheck::Rejected(_) => &[],
        }
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            FileCheck::Accepted { .. } => None,
            FileCheck::Rejected(reason) => Some(reason),
        }
    }
}

/// The byte-read underlying the signature checks failed.
///
/// Distinct from a rejection: this is an inability to judge, not a judgment
/// of "invalid".
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("unable to read file for security validation: {0}")]
    Read(#[from] std::io::Error),
}

/// Validate an upload against a rule set.
///
/// Checks run in a fixed order and the first hard failure wins. The content
/// reader is only consulted when a byte-level check is enabled, and only for
/// the first 32 bytes. The malware heuristic runs strictly after the
/// signature check and overrides it: a polyglot whose container signature
/// matches is still rejected when an executable signature is present.
pub async fn validate_file<R>(
    info: &FileInfo,
    content: R,
    rules: &UploadRules,
) -> Result<FileCheck, ValidateError>
where
    R: AsyncRead + Unpin,
{
    let mut warnings = Vec::new();

    // Size cap
    if info.size > rules.max_size {
        return Ok(reject(RejectReason::TooLarge {
            size: info.size,
            max_size: rules.max_size,
        }));
    }

    // Declared MIME allowlist
    if !rules.allowed_types.is_empty()
        && !rules.allowed_types.iter().any(|t| *t == info.mime_type)
    {
        return Ok(reject(RejectReason::TypeNotAllowed {
            mime_type: info.mime_type.clone(),
            allowed: rules.allowed_types.clone(),
        }));
    }

    // Extension allowlist (a missing extension fails a non-empty allowlist)
    let extension = info.extension();
    if !rules.allowed_extensions.is_empty() {
        let listed = extension
            .as_deref()
            .map(|ext| rules.allowed_extensions.iter().any(|a| a == ext))
            .unwrap_or(false);
        if !listed {
            return Ok(reject(RejectReason::ExtensionNotAllowed {
                extension,
                allowed: rules.allowed_extensions.clone(),
            }));
        }
    }

    // Extension vs declared type, advisory only
    if let Some(valid) = signatures::extensions_for(&info.mime_type) {
        let matches = extension
            .as_deref()
            .map(|ext| valid.iter().any(|v| *v == ext))
            .unwrap_or(false);
        if !matches {
            warnings.push(UploadWarning::ExtensionMismatch);
        }
    }

    // Leading-byte checks
    if rules.check_magic_numbers || rules.scan_for_malware {
        let leading = read_leading_bytes(content).await?;

        if rules.check_magic_numbers {
            if let Some(signature) = signatures::signature_for(&info.mime_type) {
                if !signatures::matches_any(&leading, signature.prefixes) {
                    return Ok(reject(RejectReason::SignatureMismatch));
                }
            }
        }

        // Runs after the signature check on purpose: a matching container
        // signature must not whitelist an embedded executable.
        if rules.scan_for_malware {
            if let Some(suspicious) = signatures::find_suspicious(&leading) {
                tracing::debug!(
                    kind = suspicious.description,
                    file = %info.name,
                    "suspicious byte prefix in upload"
                );
                return Ok(reject(RejectReason::SuspiciousContent));
            }
        }
    }

    // Path safety: the name may later derive a storage path
    if info.name.contains("..") || info.name.contains('/') || info.name.contains('\\') {
        return Ok(reject(RejectReason::UnsafeFileName));
    }

    if info.size < TINY_FILE_BYTES {
        warnings.push(UploadWarning::UnusuallySmall);
    }

    if extension.as_deref().map_or(true, str::is_empty) {
        warnings.push(UploadWarning::NoExtension);
    }

    Ok(FileCheck::Accepted { warnings })
}

fn reject(reason: RejectReason) -> FileCheck {
    tracing::debug!(reason = %reason.message(), "upload rejected");
    FileCheck::Rejected(reason)
}

/// Read up to [`SIGNATURE_READ_LEN`] bytes; a short file yields fewer.
async fn read_leading_bytes<R>(mut content: R) -> Result<Vec<u8>, ValidateError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; SIGNATURE_READ_LEN];
    let mut filled = 0;

    while filled < buf.len() {
        let n = content.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(buf[..filled].to_vec())
}
