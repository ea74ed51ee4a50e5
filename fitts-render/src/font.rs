use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use anyhow::{Context, Result, anyhow};

/// Searched in order when no font path is configured
pub const FONT_CANDIDATES: &[&str] = &[
    "assets/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn font_from_file(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// Loads `explicit` if given, otherwise the first readable [`FONT_CANDIDATES`] entry.
pub fn load_font(explicit: Option<&Path>) -> Result<FontArc> {
    if let Some(path) = explicit {
        return font_from_file(path);
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .filter(|p| p.is_file())
        .find_map(|p| font_from_file(&p).ok())
        .ok_or_else(|| {
            anyhow!(
                "no usable font found; set display.font_path (searched: {})",
                FONT_CANDIDATES.join(", ")
            )
        })
}
