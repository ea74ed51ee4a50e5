use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{StoreError, StoreResult};

/// Writes the participant's copy of the consent statement, stamped with `at`.
pub fn write_receipt(path: &Path, at: DateTime<Local>) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let mut file = std::fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    write!(
        file,
        "You have consented to the collection of data that is produced from your participation in the experiment.\n\
         This study is anonymous, your name will not be collected.\n\
         The data will be used for non-commercial and academic purposes only.\n\n\
         Your consent has been recorded on {}\n",
        at.format("%B %d %Y at %I:%M %p")
    )
    .map_err(|e| StoreError::io(path, e))?;
    Ok(())
}
