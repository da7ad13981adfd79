//! File system utilities.
//!
//! Plain URL lists are newline-delimited UTF-8 files. Every read holds a
//! shared advisory lock and every write an exclusive one, each only for the
//! duration of that single call. A read followed by a write is therefore not
//! atomic: two concurrent runs can interleave between them and the last
//! writer wins.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{AppError, Result};

/// Read a newline-delimited list, returning an empty list if the file is missing.
pub fn read_plain_urls(path: &Path) -> Result<Vec<String>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::Io(e)),
    };
    file.lock_shared().map_err(|e| AppError::lock(path, e))?;

    let mut content = String::new();
    let read = file.read_to_string(&mut content);
    file.unlock().map_err(|e| AppError::lock(path, e))?;
    read?;

    Ok(content.lines().map(str::to_string).collect())
}

/// Rewrite a file with one entry per line.
pub fn write_plain_urls<I, S>(urls: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.lock().map_err(|e| AppError::lock(path, e))?;

    let written = (|| -> std::io::Result<()> {
        file.set_len(0)?;
        let mut writer = BufWriter::new(&file);
        for url in urls {
            writeln!(writer, "{}", url.as_ref())?;
        }
        writer.flush()
    })();

    file.unlock().map_err(|e| AppError::lock(path, e))?;
    written?;
    Ok(())
}

/// Save data to a JSON file with pretty printing
pub fn save_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load TOML configuration from a file
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let data: T = toml::from_str(&content)?;
    Ok(data)
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Remove a file, ignoring a missing one.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let urls = read_plain_urls(&tmp.path().join("nope.txt")).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("conf/lists.txt");

        write_plain_urls(["a", "b"], &path).unwrap();
        assert_eq!(read_plain_urls(&path).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_write_truncates_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.txt");

        write_plain_urls(["first", "second", "third"], &path).unwrap();
        write_plain_urls(["only"], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "only\n");
    }

    #[test]
    fn test_remove_if_exists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fix-downloaded.txt");
        remove_if_exists(&path).unwrap();

        fs::write(&path, "x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
