//! Path utilities for RAI data directories.

use std::path::{Path, PathBuf};

/// Get the default RAI data directory (~/.rai/).
///
/// Falls back to a relative `.rai` directory when the home directory
/// cannot be determined.
pub fn rai_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".rai"))
        .unwrap_or_else(|| PathBuf::from(".rai"))
}

/// Get the artifact cache root (<data>/cache/).
pub fn cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("cache")
}

/// Get the key/value state directory (<data>/state/).
pub fn state_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("state")
}

/// Get the bin directory (<data>/bin/).
pub fn bin_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("bin")
}

/// Get the path to the llama-server binary.
pub fn llama_server_path(data_dir: &Path) -> PathBuf {
    let binary_name = if cfg!(target_os = "windows") {
        "llama-server.exe"
    } else {
        "llama-server"
    };
    bin_dir(data_dir).join(binary_name)
}

/// Ensure the RAI data directories exist.
pub fn ensure_dirs(data_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    std::fs::create_dir_all(cache_dir(data_dir))?;
    std::fs::create_dir_all(state_dir(data_dir))?;
    std::fs::create_dir_all(bin_dir(data_dir))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_data_dir() {
        let data = Path::new("/tmp/rai-data");
        assert_eq!(cache_dir(data), data.join("cache"));
        assert_eq!(state_dir(data), data.join("state"));
        assert!(llama_server_path(data).starts_with(data.join("bin")));
    }

    #[test]
    fn test_ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        ensure_dirs(dir.path()).unwrap();
        assert!(cache_dir(dir.path()).is_dir());
        assert!(state_dir(dir.path()).is_dir());
        assert!(bin_dir(dir.path()).is_dir());
    }
}
