//! Storage-safe filename helpers
//!
//! Used when persisting an accepted upload: [`sanitize_file_name`] makes a
//! user-supplied name safe to embed in a path, [`generate_secure_file_name`]
//! sidesteps the user's name entirely with a collision-resistant one.

use chrono::Utc;
use rand::Rng;

/// Characters drawn for the random token (base36, matching lowercase ids)
const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random token in generated names
const TOKEN_LEN: usize = 13;

/// Longest sanitized name returned, in bytes
const MAX_NAME_LEN: usize = 255;

/// Make a user-supplied filename safe for storage.
///
/// Replaces everything outside `[A-Za-z0-9.-]` with `_`, collapses runs of
/// dots, strips a leading dot, and caps the length. Pure; no failure mode.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced = name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        }
    });

    let mut sanitized = String::with_capacity(name.len());
    let mut previous_dot = false;
    for c in replaced {
        if c == '.' {
            if !previous_dot {
                sanitized.push(c);
            }
            previous_dot = true;
        } else {
            sanitized.push(c);
            previous_dot = false;
        }
    }

    let mut sanitized = match sanitized.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => sanitized,
    };

    // All-ASCII by now, so byte truncation cannot split a char
    sanitized.truncate(MAX_NAME_LEN);
    sanitized
}

/// Generate a collision-resistant, traversal-safe name for a stored upload.
///
/// Shape: `<unix-millis>_<random-token>[.<extension>]`, keeping the original
/// extension when one exists. The extension is reduced to its alphanumeric
/// characters so the result is safe even for an unvalidated input name.
pub fn generate_secure_file_name(original_name: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let token = random_token(TOKEN_LEN);

    let extension: Option<String> = original_name.rsplit_once('.').map(|(_, ext)| {
        ext.chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
    });

    match extension {
        Some(ext) if !ext.is_empty() => format!("{}_{}.{}", timestamp, token, ext),
        _ => format!("{}_{}", timestamp, token),
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        let sanitized = sanitize_file_name("../../a.exe.pdf");

        assert_eq!(sanitized, "_._a.exe.pdf");
        assert!(!sanitized.contains('/'));
        assert!(!sanitized.contains('\\'));
        assert!(!sanitized.starts_with('.'));
    }

    #[test]
    fn test_sanitize_replaces_special_chars() {
        assert_eq!(
            sanitize_file_name("my resume (final).pdf"),
            "my_resume__final_.pdf"
        );
    }

    #[test]
    fn test_sanitize_collapses_dots_and_leading_dot() {
        assert_eq!(sanitize_file_name("..hidden..file"), "hidden.file");
        assert_eq!(sanitize_file_name(".env"), "env");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(300) + ".pdf";
        assert_eq!(sanitize_file_name(&long).len(), 255);
    }

    #[test]
    fn test_secure_name_keeps_extension() {
        let name = generate_secure_file_name("resume.pdf");

        assert!(name.ends_with(".pdf"));
        assert!(!name.contains('/'));
        assert!(name.contains('_'));
    }

    #[test]
    fn test_secure_name_without_extension() {
        let name = generate_secure_file_name("README");
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_secure_names_are_unique() {
        let a = generate_secure_file_name("resume.pdf");
        let b = generate_secure_file_name("resume.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn test_secure_name_scrubs_hostile_extension() {
        let name = generate_secure_file_name("x.p/df");
        assert!(!name.contains('/'));
    }
}
