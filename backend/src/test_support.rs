//! Test utilities for the storefront crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for `cfg(test)` and when the `test-support` feature is enabled.

pub mod cap_fs {
    //! Capability-safe file helpers for tests.
    //!
    //! The crate avoids direct `std::fs` calls, so key files written by tests
    //! go through `cap_std::fs::Dir` as well.

    use std::ffi::OsString;
    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Write bytes to a file through `cap_std`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use storefront::test_support::cap_fs::{read_file_to_string, write_file};
    ///
    /// let path = std::env::temp_dir().join("storefront-cap-fs-example.txt");
    /// write_file(&path, b"signing key\n")?;
    /// assert_eq!(read_file_to_string(&path)?, "signing key\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.write(Path::new(&file_name), contents)
    }

    /// Read a UTF-8 text file through `cap_std`.
    pub fn read_file_to_string(path: &Path) -> io::Result<String> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.read_to_string(Path::new(&file_name))
    }

    fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "path must include a file name")
        })?;
        Ok((parent, file_name.to_os_string()))
    }
}

pub mod app;
pub mod clock;
pub mod memory;

pub use app::{IMPORTED_TEST_PRICE, TestStorefront, feed_game};
pub use clock::MutableClock;
pub use memory::{InMemoryStore, StaticGameFeed};

/// Write `key` into a fresh temporary directory and return both.
///
/// Keep the directory alive for as long as the path is in use.
pub fn token_key_file(key: &[u8]) -> std::io::Result<(tempfile::TempDir, std::path::PathBuf)> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("token_key");
    cap_fs::write_file(&path, key)?;
    Ok((directory, path))
}
