//! Archive stores: where catalog locations resolve to member files.
//!
//! A vendor archive is a named collection of measurement files. The selection
//! engine only needs to list member names and open one member as a
//! [`LineSource`]; how archives are stored is up to the implementation.

use crate::error::{BeadError, BeadResult};
use lib_touchstone::{LineSource, ReaderSource};
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// Read-only access to vendor archives, shared by the scan workers.
pub trait ArchiveStore: Sync {
    /// Member names of the archive at `location`, `None` if it does not exist.
    fn member_names(&self, location: &str) -> BeadResult<Option<Vec<String>>>;

    /// Open one member for reading.
    fn open_member(&self, location: &str, member: &str) -> BeadResult<Box<dyn LineSource + Send>>;

    /// Whether the archive at `location` exists.
    fn contains(&self, location: &str) -> bool {
        matches!(self.member_names(location), Ok(Some(_)))
    }
}

/// Archives on disk under a root directory.
///
/// A location naming a `.zip` file is read in place. Without the file, the
/// directory named after the archive's stem is used, so vendor archives may
/// also be extracted. Any other location must be a directory of member files.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

/// What a location resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchivePath {
    /// Zip file, members read without extracting.
    Zip(PathBuf),
    /// Directory of extracted members.
    Directory(PathBuf),
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File or directory backing `location`, if there is one.
    pub fn resolve(&self, location: &str) -> Option<ArchivePath> {
        let path = self.root.join(location);
        if path.is_dir() {
            return Some(ArchivePath::Directory(path));
        }

        let is_zip = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            return None;
        }
        if path.is_file() {
            return Some(ArchivePath::Zip(path));
        }

        let extracted = path.with_extension("");
        extracted.is_dir().then_some(ArchivePath::Directory(extracted))
    }
}

impl ArchiveStore for DirectoryStore {
    fn member_names(&self, location: &str) -> BeadResult<Option<Vec<String>>> {
        let names = match self.resolve(location) {
            None => return Ok(None),
            Some(ArchivePath::Zip(path)) => zip_members(&path)?,
            Some(ArchivePath::Directory(dir)) => {
                let mut names = Vec::new();
                collect_members(&dir, "", &mut names)?;
                names.sort();
                names
            }
        };
        Ok(Some(names))
    }

    fn open_member(&self, location: &str, member: &str) -> BeadResult<Box<dyn LineSource + Send>> {
        let not_found = || BeadError::MemberNotFound {
            location: location.to_string(),
            member: member.to_string(),
        };

        match self.resolve(location).ok_or_else(not_found)? {
            ArchivePath::Zip(path) => {
                let bytes = read_zip_member(&path, member)?.ok_or_else(not_found)?;
                Ok(Box::new(ReaderSource::new(member, Cursor::new(bytes))))
            }
            ArchivePath::Directory(dir) => {
                let path = member.split('/').fold(dir, |path, part| path.join(part));
                if !path.is_file() {
                    return Err(not_found());
                }

                let file = File::open(&path)?;
                Ok(Box::new(ReaderSource::new(member, BufReader::new(file))))
            }
        }
    }

    fn contains(&self, location: &str) -> bool {
        self.resolve(location).is_some()
    }
}

fn open_zip(path: &Path) -> BeadResult<ZipArchive<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// File members of a zip archive in archive order; directory entries are
/// left out.
fn zip_members(path: &Path) -> BeadResult<Vec<String>> {
    let mut archive = open_zip(path)?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if !entry.is_dir() {
            names.push(entry.name().to_string());
        }
    }
    tracing::debug!("{:?}: {} members", path, names.len());
    Ok(names)
}

/// Decompressed content of one zip member, `None` if there is no such member.
fn read_zip_member(path: &Path, member: &str) -> BeadResult<Option<Vec<u8>>> {
    let mut archive = open_zip(path)?;
    let mut entry = match archive.by_name(member) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// Walk `dir` and push every file as a `/`-separated path relative to the
/// archive root.
fn collect_members(dir: &Path, prefix: &str, names: &mut Vec<String>) -> BeadResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let name = if prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", prefix, file_name)
        };

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_members(&entry.path(), &name, names)?;
        } else {
            names.push(name);
        }
    }
    Ok(())
}

/// In-memory archives, kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    archives: Vec<(String, Vec<(String, String)>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an (initially empty) archive.
    pub fn add_archive(&mut self, location: impl Into<String>) -> &mut Self {
        let location = location.into();
        if self.archive(&location).is_none() {
            self.archives.push((location, Vec::new()));
        }
        self
    }

    /// Add a member, creating its archive on first use. A member added twice
    /// keeps its first position and takes the new content.
    pub fn insert(
        &mut self,
        location: impl Into<String>,
        member: impl Into<String>,
        content: impl Into<String>,
    ) -> &mut Self {
        let location = location.into();
        let (member, content) = (member.into(), content.into());

        self.add_archive(location.as_str());
        if let Some((_, members)) = self.archives.iter_mut().find(|(l, _)| *l == location) {
            match members.iter_mut().find(|(m, _)| *m == member) {
                Some(existing) => existing.1 = content,
                None => members.push((member, content)),
            }
        }
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_member(
        mut self,
        location: impl Into<String>,
        member: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.insert(location, member, content);
        self
    }

    fn archive(&self, location: &str) -> Option<&[(String, String)]> {
        self.archives
            .iter()
            .find(|(l, _)| l == location)
            .map(|(_, members)| members.as_slice())
    }
}

impl ArchiveStore for MemoryStore {
    fn member_names(&self, location: &str) -> BeadResult<Option<Vec<String>>> {
        Ok(self
            .archive(location)
            .map(|members| members.iter().map(|(name, _)| name.clone()).collect()))
    }

    fn open_member(&self, location: &str, member: &str) -> BeadResult<Box<dyn LineSource + Send>> {
        let content = self
            .archive(location)
            .and_then(|members| members.iter().find(|(name, _)| name == member))
            .map(|(_, content)| content.clone())
            .ok_or_else(|| BeadError::MemberNotFound {
                location: location.to_string(),
                member: member.to_string(),
            })?;

        Ok(Box::new(ReaderSource::from_string(member, content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ComponentCurve;
    use lib_touchstone::TouchstoneDocument;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn read_all(source: &mut dyn LineSource) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(line) = source.read_line().unwrap() {
            bytes.extend(line);
        }
        bytes
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lib-bead-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_store_keeps_insertion_order() {
        let store = MemoryStore::new()
            .with_member("a.zip", "Z.s2p", "z")
            .with_member("a.zip", "A.s2p", "a")
            .with_member("a.zip", "Z.s2p", "zz");

        let names = store.member_names("a.zip").unwrap().unwrap();
        assert_eq!(names, vec!["Z.s2p", "A.s2p"]);
        assert_eq!(store.member_names("missing.zip").unwrap(), None);
        assert!(store.contains("a.zip"));
        assert!(!store.contains("missing.zip"));

        let mut source = store.open_member("a.zip", "Z.s2p").unwrap();
        assert_eq!(source.name(), "Z.s2p");
        assert_eq!(read_all(source.as_mut()), b"zz");
    }

    #[test]
    fn test_memory_store_missing_member() {
        let mut store = MemoryStore::new();
        store.add_archive("empty.zip");
        assert_eq!(store.member_names("empty.zip").unwrap(), Some(vec![]));

        let err = store.open_member("empty.zip", "x.s2p").err().unwrap();
        assert!(matches!(err, BeadError::MemberNotFound { .. }));
    }

    #[test]
    fn test_directory_store_walks_members() {
        let root = scratch_dir("walk");
        let archive = root.join("blm18-s-v17");
        fs::create_dir_all(archive.join("sub")).unwrap();
        fs::write(archive.join("BLM18AG331SN1.s2p"), "# MHZ S RI R 50\n").unwrap();
        fs::write(archive.join("sub").join("BLM18AG102SN1.s2p"), "x\n").unwrap();

        let store = DirectoryStore::new(&root);
        let names = store.member_names("blm18-s-v17").unwrap().unwrap();
        assert_eq!(names, vec!["BLM18AG331SN1.s2p", "sub/BLM18AG102SN1.s2p"]);

        // archive name resolves to its extracted directory
        assert_eq!(store.member_names("blm18-s-v17.zip").unwrap(), Some(names));
        assert_eq!(store.member_names("blm21-s-v17.zip").unwrap(), None);
        assert!(store.contains("blm18-s-v17.zip"));
        assert!(!store.contains("blm21-s-v17.zip"));

        let mut source = store.open_member("blm18-s-v17.zip", "sub/BLM18AG102SN1.s2p").unwrap();
        assert_eq!(source.name(), "sub/BLM18AG102SN1.s2p");
        assert_eq!(read_all(source.as_mut()), b"x\n");

        let err = store.open_member("blm18-s-v17", "nope.s2p").err().unwrap();
        assert!(matches!(err, BeadError::MemberNotFound { .. }));

        fs::remove_dir_all(&root).unwrap();
    }

    const BEAD_S2P: &str = "# MHZ S RI R 50
1 0.0238 0.0952 0.9762 -0.0952 0.9762 -0.0952 0.0238 0.0952
100 0.7674 0 0.2326 0 0.2326 0 0.7674 0
";

    fn write_zip(path: &Path, members: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        writer
            .add_directory("sub/", SimpleFileOptions::default())
            .unwrap();
        for (name, content) in members {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_directory_store_reads_zip_in_place() {
        let root = scratch_dir("zip");
        write_zip(
            &root.join("blm18-s-v17.zip"),
            &[("BLM18AG331SN1.s2p", BEAD_S2P), ("sub/BLM18AG102SN1.s2p", "x\n")],
        );
        // an extracted copy next to the zip is not consulted
        fs::create_dir_all(root.join("blm18-s-v17")).unwrap();

        let store = DirectoryStore::new(&root);
        assert_eq!(
            store.resolve("blm18-s-v17.zip"),
            Some(ArchivePath::Zip(root.join("blm18-s-v17.zip")))
        );
        assert!(store.contains("blm18-s-v17.zip"));

        let names = store.member_names("blm18-s-v17.zip").unwrap().unwrap();
        assert_eq!(names, vec!["BLM18AG331SN1.s2p", "sub/BLM18AG102SN1.s2p"]);

        let source = store.open_member("blm18-s-v17.zip", "BLM18AG331SN1.s2p").unwrap();
        let curve = ComponentCurve::build(TouchstoneDocument::new(source)).unwrap();
        assert_eq!(curve.name(), "BLM18AG331SN1");
        assert_eq!(curve.len(), 2);
        let z = curve.impedances()[1];
        assert!((z.norm() - 330.0).abs() < 1.0, "|Z| = {}", z.norm());

        let mut source = store.open_member("blm18-s-v17.zip", "sub/BLM18AG102SN1.s2p").unwrap();
        assert_eq!(read_all(source.as_mut()), b"x\n");

        let err = store.open_member("blm18-s-v17.zip", "nope.s2p").err().unwrap();
        assert!(matches!(err, BeadError::MemberNotFound { .. }));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_corrupt_zip_is_an_error() {
        let root = scratch_dir("badzip");
        fs::write(root.join("blm18-s-v17.zip"), "not a zip").unwrap();

        let store = DirectoryStore::new(&root);
        assert!(store.contains("blm18-s-v17.zip"));
        let err = store.member_names("blm18-s-v17.zip").unwrap_err();
        assert!(matches!(err, BeadError::Zip(_)));

        fs::remove_dir_all(&root).unwrap();
    }
}
