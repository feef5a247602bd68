use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn create_path_if_not_exists(filename: &str) -> std::io::Result<()> {
    if let Some(parent) = Path::new(filename).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_string_to_file(filename: &str, content: &str) -> anyhow::Result<()> {
    create_path_if_not_exists(filename)?;
    let mut file = File::create(Path::new(filename))?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Resolve `filename` against the directory holding `base_file`.
pub fn relative_to(base_file: &Path, filename: &str) -> PathBuf {
    match base_file.parent() {
        Some(dir) if Path::new(filename).is_relative() => dir.join(filename),
        _ => PathBuf::from(filename),
    }
}
