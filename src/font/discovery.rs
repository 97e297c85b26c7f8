//! Finding a usable font file on disk when none is configured.

#[cfg(not(target_os = "windows"))]
use std::collections::HashMap;
use std::path::PathBuf;

/// Candidate files in priority order.
#[cfg(target_os = "windows")]
const FONT_PATHS: &[&str] = &[
    r"C:\Windows\Fonts\segoeui.ttf",
    r"C:\Windows\Fonts\arial.ttf",
    r"C:\Windows\Fonts\tahoma.ttf",
    r"C:\Windows\Fonts\consola.ttf",
];

/// Candidate file names in priority order, searched under the font dirs.
#[cfg(not(target_os = "windows"))]
const FONT_NAMES: &[&str] = &[
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
    "NotoSans-Regular.ttf",
    "NotoSans-Regular.otf",
    "Ubuntu-R.ttf",
    "Cantarell-Regular.otf",
    "DejaVuSansMono.ttf",
];

/// Return the first well-known system font that exists.
#[cfg(target_os = "windows")]
pub fn find_system_font() -> Option<PathBuf> {
    FONT_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Return the first well-known system font that exists.
#[cfg(not(target_os = "windows"))]
pub fn find_system_font() -> Option<PathBuf> {
    let mut index = HashMap::new();
    for dir in font_dirs() {
        index_font_dir(&dir, &mut index);
    }
    let found = find_in_index(FONT_NAMES, &index);
    if found.is_none() {
        log::warn!("font: none of {} candidate fonts found", FONT_NAMES.len());
    }
    found
}

#[cfg(not(target_os = "windows"))]
fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }
    dirs.push(PathBuf::from("/usr/share/fonts"));
    dirs.push(PathBuf::from("/usr/local/share/fonts"));
    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
    }
    dirs
}

/// Recursively map file name to full path. The first path seen for a name wins.
#[cfg(not(target_os = "windows"))]
fn index_font_dir(dir: &std::path::Path, index: &mut HashMap<String, PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            index_font_dir(&path, index);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            index.entry(name.to_owned()).or_insert(path);
        } else {
            // Non-UTF-8 filename
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn find_in_index(names: &[&str], index: &HashMap<String, PathBuf>) -> Option<PathBuf> {
    names.iter().find_map(|name| index.get(*name).cloned())
}
