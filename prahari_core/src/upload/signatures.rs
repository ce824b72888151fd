//! Byte-signature tables for upload validation
//!
//! Closed, typed tables: every entry names its MIME type once, so a typo'd
//! key cannot silently disable a check the way a loose string map can.

/// Known leading-byte signatures for a declared MIME type.
pub(crate) struct TypeSignature {
    pub mime_type: &'static str,
    /// Any one of these prefixes is an acceptable match.
    pub prefixes: &'static [&'static [u8]],
}

/// A leading-byte pattern that should never appear in an accepted upload.
pub(crate) struct SuspiciousSignature {
    pub prefix: &'static [u8],
    pub description: &'static str,
}

static TYPE_SIGNATURES: &[TypeSignature] = &[
    TypeSignature {
        mime_type: "application/pdf",
        prefixes: &[b"%PDF"],
    },
    TypeSignature {
        mime_type: "image/jpeg",
        prefixes: &[
            &[0xFF, 0xD8, 0xFF, 0xE0], // JFIF
            &[0xFF, 0xD8, 0xFF, 0xE1], // EXIF
            &[0xFF, 0xD8, 0xFF, 0xE8], // SPIFF
        ],
    },
    TypeSignature {
        mime_type: "image/png",
        prefixes: &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]],
    },
    TypeSignature {
        mime_type: "application/msword",
        prefixes: &[&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]], // CFB container
    },
    TypeSignature {
        mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        prefixes: &[
            &[0x50, 0x4B, 0x03, 0x04], // ZIP local file header
            &[0x50, 0x4B, 0x05, 0x06], // ZIP empty archive
            &[0x50, 0x4B, 0x07, 0x08], // ZIP spanned archive
        ],
    },
];

/// Extensions conventionally associated with a MIME type, for the
/// extension/declared-type cross-check.
static TYPE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/svg+xml", &["svg"]),
    ("application/msword", &["doc"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
    ("text/plain", &["txt"]),
    ("text/csv", &["csv"]),
];

/// Checked against every upload regardless of declared type or extension.
static SUSPICIOUS_SIGNATURES: &[SuspiciousSignature] = &[
    SuspiciousSignature {
        prefix: &[0x4D, 0x5A],
        description: "DOS/Windows executable",
    },
    SuspiciousSignature {
        prefix: &[0x7F, 0x45, 0x4C, 0x46],
        description: "ELF executable",
    },
    SuspiciousSignature {
        prefix: &[0xFE, 0xED, 0xFA, 0xCE],
        description: "Mach-O executable (32-bit)",
    },
    SuspiciousSignature {
        prefix: &[0xFE, 0xED, 0xFA, 0xCF],
        description: "Mach-O executable (64-bit)",
    },
    SuspiciousSignature {
        prefix: &[0x23, 0x21],
        description: "script shebang",
    },
];

/// Signature set for a declared MIME type, if one is known.
pub(crate) fn signature_for(mime_type: &str) -> Option<&'static TypeSignature> {
    TYPE_SIGNATURES.iter().find(|sig| sig.mime_type == mime_type)
}

/// Extensions conventionally used for a MIME type, if known.
pub(crate) fn extensions_for(mime_type: &str) -> Option<&'static [&'static str]> {
    TYPE_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, extensions)| *extensions)
}

/// Whether the leading bytes start with any of the candidate prefixes.
///
/// A buffer shorter than a candidate never matches it.
pub(crate) fn matches_any(leading: &[u8], prefixes: &[&[u8]]) -> bool {
    prefixes.iter().any(|prefix| leading.starts_with(prefix))
}

/// First suspicious pattern the leading bytes match, if any.
pub(crate) fn find_suspicious(leading: &[u8]) -> Option<&'static SuspiciousSignature> {
    SUSPICIOUS_SIGNATURES
        .iter()
        .find(|sig| leading.starts_with(sig.prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_signature_matches() {
        let sig = signature_for("application/pdf").expect("pdf signature missing");
        assert!(matches_any(b"%PDF-1.7\n", sig.prefixes));
        assert!(!matches_any(b"PDF without marker", sig.prefixes));
    }

    #[test]
    fn test_short_buffer_never_matches() {
        let sig = signature_for("image/png").expect("png signature missing");
        assert!(!matches_any(&[0x89, 0x50], sig.prefixes));
    }

    #[test]
    fn test_unknown_mime_has_no_signature() {
        assert!(signature_for("application/x-unknown").is_none());
        assert!(extensions_for("application/x-unknown").is_none());
    }

    #[test]
    fn test_suspicious_patterns() {
        assert!(find_suspicious(&[0x4D, 0x5A, 0x90, 0x00]).is_some());
        assert!(find_suspicious(b"#!/bin/sh\n").is_some());
        assert!(find_suspicious(&[0x7F, 0x45, 0x4C, 0x46, 0x02]).is_some());
        assert!(find_suspicious(b"%PDF-1.7\n").is_none());
    }

    #[test]
    fn test_docx_zip_variants() {
        let sig = signature_for(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        )
        .expect("docx signature missing");
        assert!(matches_any(&[0x50, 0x4B, 0x03, 0x04, 0x14], sig.prefixes));
        assert!(matches_any(&[0x50, 0x4B, 0x05, 0x06], sig.prefixes));
        assert!(!matches_any(&[0x50, 0x4B, 0x01, 0x02], sig.prefixes));
    }
}
