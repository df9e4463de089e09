use std::path::Path;
use url::Url;

const SCHEMES: [&str; 6] = ["http://", "https://", "file://", "data:", "about:", "chrome://"];

/// Turn a user-supplied target into something Chrome can navigate to.
///
/// URLs with a scheme pass through. A path to an existing file (a saved chat
/// page) becomes a `file://` URL. `localhost` gets `http://`; anything else
/// is treated as a host and gets `https://`.
pub fn normalize_target(target: &str) -> String {
    let trimmed = target.trim();

    if SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed);
    if path.is_file() {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        match Url::from_file_path(&absolute) {
            Ok(url) => return url.to_string(),
            // Only relative paths are rejected
            Err(()) => {
                log::debug!("Could not build a file URL for {}", absolute.display());
                return trimmed.to_string();
            }
        }
    }

    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    format!("https://{}", trimmed)
}
