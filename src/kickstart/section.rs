// file: src/kickstart/section.rs
// version: 1.0.0
// guid: 5be2f8d0-6c41-4a97-b3e5-0d82c7a4f916

//! Locating the add-on block inside a full kickstart file

use crate::error::SetupError;
use crate::Result;

/// Return the body lines of `%addon <name>` ... `%end`
///
/// Blank lines and comments are dropped. A kickstart without the section
/// yields no lines.
pub fn extract_addon_section(content: &str, addon_name: &str) -> Result<Vec<String>> {
    let mut lines = content.lines().enumerate();

    let header = lines.by_ref().find(|(_, line)| {
        let mut tokens = line.split_whitespace();
        tokens.next() == Some("%addon") && tokens.next() == Some(addon_name)
    });
    let Some((header_index, _)) = header else {
        return Ok(Vec::new());
    };

    let mut body = Vec::new();
    for (_, line) in lines {
        let trimmed = line.trim();
        if trimmed == "%end" {
            return Ok(body);
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        body.push(trimmed.to_string());
    }

    Err(SetupError::kickstart(format!(
        "%addon {} starting at line {} has no matching %end",
        addon_name,
        header_index + 1
    )))
}
