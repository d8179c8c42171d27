//! Security validation constants and helpers
//!
//! Limits and name sanitizing that keep a hostile or corrupt image from
//! exhausting memory or writing outside the extraction folder.

use crate::Error;

/// Maximum image size we'll read into memory (64 MB; a Twiggy is under 1 MB)
pub const MAX_IMAGE_SIZE: usize = 64 * 1024 * 1024;

/// Validate that a size is within allocation limits
///
/// # Security
/// Prevents memory exhaustion from oversized input files
pub fn validate_allocation_size(size: u64, limit: usize, context: &str) -> crate::Result<usize> {
    if size > limit as u64 {
        return Err(Error::invalid_vault(format!(
            "{} size {} exceeds limit {}",
            context, size, limit
        )));
    }

    size.try_into()
        .map_err(|_| Error::invalid_vault(format!("{} size exceeds platform limits", context)))
}

/// Turn a volume or file title into a single host path component
///
/// `/` becomes `:`, NUL is dropped, and names the host would treat specially
/// (empty, `.`, `..`) get a leading underscore.
///
/// # Security
/// Prevents titles from escaping the extraction folder
pub fn host_file_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|&c| c != '\0')
        .map(|c| if c == '/' { ':' } else { c })
        .collect();

    match name.as_str() {
        "" | "." | ".." => format!("_{}", name),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_allocation_size() {
        assert_eq!(validate_allocation_size(1024, MAX_IMAGE_SIZE, "test").unwrap(), 1024);
        assert!(validate_allocation_size(
            MAX_IMAGE_SIZE as u64 + 1,
            MAX_IMAGE_SIZE,
            "test"
        )
        .is_err());
    }

    #[test]
    fn test_host_file_name_separator() {
        assert_eq!(host_file_name("WORK/NOTES.TEXT"), "WORK:NOTES.TEXT");
        assert_eq!(host_file_name("PLAIN"), "PLAIN");
    }

    #[test]
    fn test_host_file_name_special() {
        assert_eq!(host_file_name(""), "_");
        assert_eq!(host_file_name("."), "_.");
        assert_eq!(host_file_name(".."), "_..");
        assert_eq!(host_file_name("A\0B"), "AB");
    }
}
