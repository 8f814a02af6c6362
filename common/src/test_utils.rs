use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `test_output/` under the workspace root, created on first use.
pub fn test_output_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .expect("crate manifest has a parent directory")
            .join("test_output");
        std::fs::create_dir_all(&dir).expect("Failed to create test_output directory");
        dir
    })
}

/// Returns the path to a test output file.
pub fn test_output_path(name: &str) -> PathBuf {
    test_output_dir().join(name)
}
