// file: src/setup/kernel.rs
// version: 1.0.0
// guid: 8b3c6e01-f7a4-4d92-a5b8-3e0d9c1f62a7

//! Choosing the default VM kernel

use crate::error::SetupError;
use crate::Result;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Component {
    Number(u64),
    Text(String),
}

/// Split a version into numeric and textual runs; dots only separate
fn components(version: &str) -> Vec<Component> {
    let mut parts = Vec::new();
    let mut chars = version.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == '.' {
            chars.next();
            continue;
        }

        let class = char_class(c);
        let mut run = String::new();
        while let Some(&next) = chars.peek() {
            if next == '.' || char_class(next) != class {
                break;
            }
            run.push(next);
            chars.next();
        }

        let part = match class {
            CharClass::Digit => run
                .parse()
                .map(Component::Number)
                .unwrap_or(Component::Text(run)),
            _ => Component::Text(run),
        };
        parts.push(part);
    }

    parts
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum CharClass {
    Digit,
    Lower,
    Other,
}

fn char_class(c: char) -> CharClass {
    if c.is_ascii_digit() {
        CharClass::Digit
    } else if c.is_ascii_lowercase() {
        CharClass::Lower
    } else {
        CharClass::Other
    }
}

/// Compare two versions component by component; numbers sort before text
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    components(a).cmp(&components(b))
}

/// Highest version among `versions`
pub fn latest_version<I, S>(versions: I) -> Option<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a.as_ref(), b.as_ref()))
}

/// Highest kernel version installed under `kernels_dir`
pub fn default_kernel(kernels_dir: &Path) -> Result<String> {
    let installed = fs::read_dir(kernels_dir)
        .map_err(|e| {
            SetupError::system(format!(
                "Failed to list VM kernels in {}: {}",
                kernels_dir.display(),
                e
            ))
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned());

    latest_version(installed).ok_or_else(|| {
        SetupError::system(format!(
            "No VM kernels installed in {}",
            kernels_dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_latest_version_scenario() {
        let kernels = ["4.19.0-1", "4.19.0-2", "4.18.0-5"];
        assert_eq!(latest_version(kernels), Some("4.19.0-2"));
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(compare_versions("5.10.8", "5.4.100"), Ordering::Greater);
        assert_eq!(compare_versions("4.19.0", "4.19.0"), Ordering::Equal);
        assert_eq!(compare_versions("4.19", "4.19.1"), Ordering::Less);
    }

    #[test]
    fn test_text_components() {
        assert_eq!(
            compare_versions("5.15.52-1.fc32", "5.15.52-1.fc31"),
            Ordering::Greater
        );
        assert_eq!(compare_versions("1.0a", "1.0b"), Ordering::Less);
    }

    #[test]
    fn test_default_kernel_from_directory() {
        let dir = TempDir::new().unwrap();
        for kernel in ["4.19.0-1", "4.19.0-2", "4.18.0-5"] {
            std::fs::create_dir(dir.path().join(kernel)).unwrap();
        }
        assert_eq!(default_kernel(dir.path()).unwrap(), "4.19.0-2");
    }

    #[test]
    fn test_no_kernels() {
        let dir = TempDir::new().unwrap();
        assert!(default_kernel(dir.path()).is_err());
        assert!(default_kernel(&dir.path().join("missing")).is_err());
    }
}
