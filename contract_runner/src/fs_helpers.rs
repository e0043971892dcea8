//! Filesystem helpers shared across `contract-runner` modules.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::error::RunnerError;

/// Reads a feature file in full.
///
/// # Errors
///
/// Returns [`RunnerError::Io`] when the file or its parent directory cannot
/// be opened or read.
pub fn read_feature_file(path: &Utf8Path) -> Result<String, RunnerError> {
    let (parent, file_name) = split_path(path)?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| RunnerError::Io {
        path: parent.to_path_buf(),
        source: err,
    })?;
    dir.read_to_string(file_name).map_err(|err| RunnerError::Io {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Opens `path`, creating it and any missing parents first.
///
/// # Errors
///
/// Returns [`RunnerError::Io`] when the directory cannot be created or
/// opened.
pub fn ensure_dir(path: &Utf8Path) -> Result<Dir, RunnerError> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(dir),
        Err(open_err) if open_err.kind() == std::io::ErrorKind::NotFound => {
            Dir::create_ambient_dir_all(path, ambient_authority()).map_err(|io_err| {
                RunnerError::Io {
                    path: path.to_path_buf(),
                    source: io_err,
                }
            })?;
            Dir::open_ambient_dir(path, ambient_authority()).map_err(|io_err| RunnerError::Io {
                path: path.to_path_buf(),
                source: io_err,
            })
        }
        Err(open_err) => Err(RunnerError::Io {
            path: path.to_path_buf(),
            source: open_err,
        }),
    }
}

fn split_path(path: &Utf8Path) -> Result<(&Utf8Path, &str), RunnerError> {
    let file_name = path.file_name().ok_or_else(|| RunnerError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    Ok((parent, file_name))
}
