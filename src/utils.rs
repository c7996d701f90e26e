use std::path::Path;

/// Returns `Some(value)` unless the value is empty.
pub fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Guesses the content type for an object uploaded from `path`.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "gz" | "tgz" => "application/gzip",
        _ => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }

    #[test]
    fn test_content_type_state_files() {
        assert_eq!(content_type_for(Path::new("state.json")), "application/json");
        assert_eq!(content_type_for(Path::new("state.YML")), "application/yaml");
        assert_eq!(content_type_for(Path::new("dump.tgz")), "application/gzip");
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(
            content_type_for(Path::new("blob.unknownext")),
            "application/octet-stream"
        );
    }
}
