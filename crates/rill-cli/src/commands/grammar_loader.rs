use std::fs;
use std::io::{self, Read};
use std::path::Path;

use super::Failure;

/// Grammar text with the name diagnostics and `#line` directives use.
pub struct Grammar {
    pub path: String,
    pub source: String,
}

pub fn load_grammar(path: &Path) -> Result<Grammar, Failure> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| Failure::error(format!("failed to read stdin: {e}")))?;
        return Ok(Grammar {
            path: "<stdin>".to_string(),
            source,
        });
    }

    let source = fs::read_to_string(path)
        .map_err(|e| Failure::error(format!("failed to read '{}': {e}", path.display())))?;
    if source.trim().is_empty() {
        return Err(Failure::error(format!("grammar '{}' is empty", path.display())));
    }
    Ok(Grammar {
        path: path.to_string_lossy().into_owned(),
        source,
    })
}
