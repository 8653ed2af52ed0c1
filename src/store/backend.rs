//! Storage backends.
//!
//! [`StorageBackend`] is the seam between [`FileStore`](super::FileStore) and
//! durable storage. [`LocalDirectory`] keeps one file per entry directly
//! inside a root directory:
//!
//! ```text
//! {root}/
//! ├── report.txt
//! ├── image.png
//! └── .upload-ab12cd34-5678-90ab-cdef-123456789012.tmp   (in-flight write)
//! ```

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::FileName;

/// Prefix of in-flight temporary files.
const TEMP_PREFIX: &str = ".upload-";

/// Suffix of in-flight temporary files.
const TEMP_SUFFIX: &str = ".tmp";

/// Storage operations used by the file store.
///
/// Every method takes validated [`FileName`]s, so implementations never see a
/// name that could escape their root. A missing entry is reported with
/// [`io::ErrorKind::NotFound`]; an entry that exists but is not a regular
/// file is reported with [`io::ErrorKind::InvalidInput`] where the operation
/// would otherwise replace or extend it.
pub trait StorageBackend: Send + Sync {
    /// Names of all stored files.
    fn list(&self) -> io::Result<Vec<String>>;

    /// Full content of a file.
    fn read(&self, name: &FileName) -> io::Result<Vec<u8>>;

    /// Create or replace a file. The previous content is discarded.
    fn write(&self, name: &FileName, content: &[u8]) -> io::Result<()>;

    /// Append to a file, creating it if absent.
    fn append(&self, name: &FileName, content: &[u8]) -> io::Result<()>;

    /// Remove a file.
    fn remove(&self, name: &FileName) -> io::Result<()>;

    /// Replace `destination` with the content of `source`.
    fn copy(&self, source: &FileName, destination: &FileName) -> io::Result<()>;

    /// Rename `source` to `destination`, replacing any existing destination.
    fn rename(&self, source: &FileName, destination: &FileName) -> io::Result<()>;
}

/// A storage root on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    /// Absolute path of the storage root.
    root: PathBuf,
}

impl LocalDirectory {
    /// Open a storage root, creating the directory if it doesn't exist.
    ///
    /// The path is canonicalized so the root is absolute for the lifetime of
    /// the store. Temporary files left behind by an interrupted write are
    /// removed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = fs::canonicalize(&root)?;

        let storage = Self { root };
        let removed = storage.cleanup_temp_files()?;
        if removed > 0 {
            tracing::info!(removed, "Removed stale temporary files");
        }

        Ok(storage)
    }

    /// Absolute path of the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a name inside the root.
    ///
    /// Always a direct child of the root: a validated name has no separators
    /// and no parent segments.
    pub fn path_of(&self, name: &FileName) -> PathBuf {
        let path = self.root.join(name.as_str());
        debug_assert_eq!(path.parent(), Some(self.root.as_path()));
        path
    }

    /// Path of an existing regular file.
    ///
    /// Symbolic links and directories are treated as absent.
    fn regular_file(&self, name: &FileName) -> io::Result<PathBuf> {
        let path = self.path_of(name);
        if fs::symlink_metadata(&path)?.is_file() {
            Ok(path)
        } else {
            Err(not_a_file(io::ErrorKind::NotFound, name))
        }
    }

    /// Open an existing regular file for reading.
    ///
    /// The opened handle is compared with the entry that was checked, so a
    /// link swapped in between the check and the open is refused.
    fn open_regular(&self, name: &FileName) -> io::Result<File> {
        let path = self.path_of(name);
        let checked = fs::symlink_metadata(&path)?;
        if !checked.is_file() {
            return Err(not_a_file(io::ErrorKind::NotFound, name));
        }

        let file = File::open(&path)?;
        if !same_entry(&checked, &file.metadata()?) {
            tracing::warn!(name = %name, "Entry changed while being opened");
            return Err(not_a_file(io::ErrorKind::NotFound, name));
        }
        Ok(file)
    }

    /// Path of an entry that may be created or replaced.
    ///
    /// A directory in the way is refused. A symbolic link is replaced as a
    /// link, never written through.
    fn replaceable(&self, name: &FileName) -> io::Result<PathBuf> {
        let path = self.path_of(name);
        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => {
                Err(not_a_file(io::ErrorKind::InvalidInput, name))
            }
            Ok(_) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(path),
            Err(e) => Err(e),
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(format!("{TEMP_PREFIX}{}{TEMP_SUFFIX}", Uuid::new_v4()))
    }

    /// Run `fill` against a fresh temporary file, then move it over `target`.
    ///
    /// Readers see either the old content or the new content, never a
    /// partially written file.
    fn replace_with<F>(&self, target: &Path, fill: F) -> io::Result<()>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        let temp = self.temp_path();
        let result = fill(&temp).and_then(|()| fs::rename(&temp, target));
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }

    /// Remove temporary files left by interrupted writes.
    pub fn cleanup_temp_files(&self) -> io::Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(&self.root)?.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if is_temp_name(name)
                && entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                && fs::remove_file(entry.path()).is_ok()
            {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

fn not_a_file(kind: io::ErrorKind, name: &FileName) -> io::Error {
    io::Error::new(kind, format!("{name} is not a regular file"))
}

/// Whether an opened file is the entry its path metadata described.
#[cfg(unix)]
fn same_entry(checked: &fs::Metadata, opened: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    opened.is_file() && checked.dev() == opened.dev() && checked.ino() == opened.ino()
}

#[cfg(not(unix))]
fn same_entry(_checked: &fs::Metadata, opened: &fs::Metadata) -> bool {
    opened.is_file()
}

impl StorageBackend for LocalDirectory {
    fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            // file_type() does not follow symlinks
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // Skip anything the API could not address, temporary files included
            if FileName::parse(&name).is_ok() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn read(&self, name: &FileName) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.open_regular(name)?.read_to_end(&mut content)?;
        Ok(content)
    }

    fn write(&self, name: &FileName, content: &[u8]) -> io::Result<()> {
        let target = self.replaceable(name)?;
        self.replace_with(&target, |temp| {
            let mut file = File::create(temp)?;
            file.write_all(content)?;
            file.sync_all()
        })
    }

    fn append(&self, name: &FileName, content: &[u8]) -> io::Result<()> {
        let path = self.path_of(name);

        match fs::symlink_metadata(&path) {
            Ok(metadata) if !metadata.is_file() => {
                return Err(not_a_file(io::ErrorKind::InvalidInput, name));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let mut file = File::options().create(true).append(true).open(&path)?;
        file.write_all(content)?;
        file.sync_data()
    }

    fn remove(&self, name: &FileName) -> io::Result<()> {
        // Unlinking removes a link itself, never its target
        fs::remove_file(self.regular_file(name)?)
    }

    fn copy(&self, source: &FileName, destination: &FileName) -> io::Result<()> {
        let mut source = self.open_regular(source)?;
        let target = self.replaceable(destination)?;
        self.replace_with(&target, |temp| {
            let mut file = File::create(temp)?;
            io::copy(&mut source, &mut file)?;
            file.sync_all()
        })
    }

    fn rename(&self, source: &FileName, destination: &FileName) -> io::Result<()> {
        let source = self.regular_file(source)?;
        fs::rename(source, self.replaceable(destination)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, LocalDirectory) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalDirectory::open(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    fn name(raw: &str) -> FileName {
        FileName::parse(raw).unwrap()
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("storage");

        assert!(!root.exists());

        let storage = LocalDirectory::open(&root).unwrap();

        assert!(root.is_dir());
        assert!(storage.root().is_absolute());
        assert_eq!(storage.root(), fs::canonicalize(&root).unwrap());
    }

    #[test]
    fn test_open_removes_stale_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let stale = temp_dir.path().join(".upload-stale.tmp");
        fs::write(&stale, b"partial").unwrap();
        fs::write(temp_dir.path().join("keep.txt"), b"keep").unwrap();

        let storage = LocalDirectory::open(temp_dir.path()).unwrap();

        assert!(!stale.exists());
        assert_eq!(storage.list().unwrap(), vec!["keep.txt".to_string()]);
    }

    #[test]
    fn test_path_of_is_direct_child() {
        let (_temp_dir, storage) = setup_storage();

        let path = storage.path_of(&name("report.txt"));

        assert_eq!(path.parent(), Some(storage.root()));
        assert_eq!(path.file_name().unwrap(), "report.txt");
    }

    #[test]
    fn test_write_and_read() {
        let (_temp_dir, storage) = setup_storage();

        storage.write(&name("a.txt"), b"Hello, World!").unwrap();

        assert_eq!(storage.read(&name("a.txt")).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let (_temp_dir, storage) = setup_storage();

        storage.write(&name("a.txt"), b"one").unwrap();
        storage.write(&name("a.txt"), b"two").unwrap();

        let entries: Vec<_> = fs::read_dir(storage.root()).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(storage.read(&name("a.txt")).unwrap(), b"two");
    }

    #[test]
    fn test_read_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let err = storage.read(&name("missing.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_append_creates_then_extends() {
        let (_temp_dir, storage) = setup_storage();

        storage.append(&name("log.txt"), b"first").unwrap();
        storage.append(&name("log.txt"), b" second").unwrap();

        assert_eq!(storage.read(&name("log.txt")).unwrap(), b"first second");
    }

    #[test]
    fn test_append_to_directory_is_invalid_input() {
        let (_temp_dir, storage) = setup_storage();
        fs::create_dir(storage.root().join("subdir")).unwrap();

        let err = storage.append(&name("subdir"), b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_directory_destination_is_invalid_input() {
        let (_temp_dir, storage) = setup_storage();
        fs::create_dir(storage.root().join("subdir")).unwrap();
        storage.write(&name("a.txt"), b"a").unwrap();

        let results = [
            storage.write(&name("subdir"), b"data"),
            storage.append(&name("subdir"), b"data"),
            storage.copy(&name("a.txt"), &name("subdir")),
            storage.rename(&name("a.txt"), &name("subdir")),
        ];
        for result in results {
            assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidInput);
        }

        assert!(storage.root().join("subdir").is_dir());
        assert_eq!(storage.read(&name("a.txt")).unwrap(), b"a");
        assert_eq!(storage.list().unwrap(), vec!["a.txt".to_string()]);
    }

    #[test]
    fn test_same_entry_for_opened_file() {
        let (_temp_dir, storage) = setup_storage();
        storage.write(&name("a.txt"), b"a").unwrap();
        let path = storage.path_of(&name("a.txt"));

        let checked = fs::symlink_metadata(&path).unwrap();
        let opened = File::open(&path).unwrap().metadata().unwrap();

        assert!(same_entry(&checked, &opened));
    }

    #[cfg(unix)]
    #[test]
    fn test_same_entry_detects_swapped_link() {
        let (_temp_dir, storage) = setup_storage();
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, b"secret").unwrap();
        storage.write(&name("doc.txt"), b"mine").unwrap();
        let checked = fs::symlink_metadata(storage.path_of(&name("doc.txt"))).unwrap();

        fs::remove_file(storage.path_of(&name("doc.txt"))).unwrap();
        std::os::unix::fs::symlink(&secret, storage.path_of(&name("doc.txt"))).unwrap();
        let followed = File::open(storage.path_of(&name("doc.txt")))
            .unwrap()
            .metadata()
            .unwrap();

        assert!(!same_entry(&checked, &followed));
    }

    #[test]
    fn test_remove() {
        let (_temp_dir, storage) = setup_storage();
        storage.write(&name("gone.txt"), b"x").unwrap();

        storage.remove(&name("gone.txt")).unwrap();

        assert!(!storage.path_of(&name("gone.txt")).exists());
        let err = storage.remove(&name("gone.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_copy_replaces_destination() {
        let (_temp_dir, storage) = setup_storage();
        storage.write(&name("src.bin"), &[0, 159, 146, 150]).unwrap();
        storage.write(&name("dst.bin"), b"old content").unwrap();

        storage.copy(&name("src.bin"), &name("dst.bin")).unwrap();

        assert_eq!(storage.read(&name("src.bin")).unwrap(), [0, 159, 146, 150]);
        assert_eq!(storage.read(&name("dst.bin")).unwrap(), [0, 159, 146, 150]);
    }

    #[test]
    fn test_copy_missing_source() {
        let (_temp_dir, storage) = setup_storage();

        let err = storage.copy(&name("nope"), &name("dst")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!storage.path_of(&name("dst")).exists());
    }

    #[test]
    fn test_rename() {
        let (_temp_dir, storage) = setup_storage();
        storage.write(&name("old.txt"), b"content").unwrap();

        storage.rename(&name("old.txt"), &name("new.txt")).unwrap();

        assert_eq!(storage.list().unwrap(), vec!["new.txt".to_string()]);
        assert_eq!(storage.read(&name("new.txt")).unwrap(), b"content");
    }

    #[test]
    fn test_list_skips_directories_and_hidden_files() {
        let (_temp_dir, storage) = setup_storage();
        storage.write(&name("b.txt"), b"b").unwrap();
        storage.write(&name("a.txt"), b"a").unwrap();
        fs::create_dir(storage.root().join("nested")).unwrap();
        fs::write(storage.root().join(".hidden"), b"h").unwrap();

        assert_eq!(
            storage.list().unwrap(),
            vec!["a.txt".to_string(), "b.txt".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let (_temp_dir, storage) = setup_storage();
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, b"secret").unwrap();
        std::os::unix::fs::symlink(&secret, storage.root().join("link.txt")).unwrap();

        assert!(storage.list().unwrap().is_empty());
        assert_eq!(
            storage.read(&name("link.txt")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(
            storage.append(&name("link.txt"), b"x").unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert_eq!(
            storage
                .copy(&name("link.txt"), &name("stolen.txt"))
                .unwrap_err()
                .kind(),
            io::ErrorKind::NotFound
        );

        // Writing replaces the link itself, not its target
        storage.write(&name("link.txt"), b"replaced").unwrap();
        assert_eq!(fs::read(&secret).unwrap(), b"secret");
        assert_eq!(storage.read(&name("link.txt")).unwrap(), b"replaced");
    }

    #[test]
    fn test_large_file() {
        let (_temp_dir, storage) = setup_storage();
        let content = vec![0xAB; 1024 * 1024];

        storage.write(&name("large.bin"), &content).unwrap();

        assert_eq!(storage.read(&name("large.bin")).unwrap(), content);
    }
}
