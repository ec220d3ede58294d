//! Level files on disk.
//!
//! A level file is the JSON form of a [`LevelRecord`] with the
//! `.mathmachine` extension.

use mathmachine_common::MathMachineResult;
use mathmachine_kernel::level::LevelRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Level file extension.
pub const LEVEL_EXTENSION: &str = "mathmachine";

/// Reads and validates a level file.
pub fn load_level_file<P: AsRef<Path>>(path: P) -> MathMachineResult<LevelRecord> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let record = LevelRecord::from_json(&text)?;
    info!(
        "Loaded level {} ({}x{})",
        path.display(),
        record.width,
        record.height
    );
    Ok(record)
}

/// Writes a level file, creating parent directories as needed.
pub fn save_level_file<P: AsRef<Path>>(path: P, record: &LevelRecord) -> MathMachineResult<()> {
    let path = path.as_ref();
    record.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, record.to_json()?)?;
    info!("Saved level to {}", path.display());
    Ok(())
}

/// Where a headless run writes its final snapshot: `<name>.out.mathmachine`
/// next to the input.
#[must_use]
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "level".into(), |s| s.to_string_lossy().into_owned());
    input.with_file_name(format!("{stem}.out.{LEVEL_EXTENSION}"))
}
