// crates/signet-providers/src/fs.rs
// ============================================================================
// Module: Filesystem Document Store
// Description: Capability-scoped DocumentStore over a local directory tree.
// Purpose: Provide durable artifact storage without a hosted object store.
// Dependencies: signet-core, cap-std, url
// ============================================================================

//! ## Overview
//! Buckets are directories under a root opened with ambient authority once at
//! construction; all subsequent access is capability-scoped to that root, so
//! path traversal cannot escape it. Object paths are additionally validated
//! to be relative and free of parent components before any I/O. Content
//! types are accepted for interface compatibility and not persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use signet_core::DocumentStore;
use signet_core::StorageError;
use url::Url;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Filesystem-backed implementation of [`DocumentStore`].
#[derive(Debug)]
pub struct FsDocumentStore {
    /// Capability-scoped root directory.
    root: Dir,
    /// Absolute root path used for signed URL construction.
    root_path: PathBuf,
}

impl FsDocumentStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Upload`] when the root cannot be created or
    /// opened.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root_path = root.into();
        std::fs::create_dir_all(&root_path)
            .map_err(|err| StorageError::Upload(err.to_string()))?;
        let root_path = root_path
            .canonicalize()
            .map_err(|err| StorageError::Upload(err.to_string()))?;
        let root = Dir::open_ambient_dir(&root_path, ambient_authority())
            .map_err(|err| StorageError::Upload(err.to_string()))?;
        Ok(Self {
            root,
            root_path,
        })
    }

    /// Joins and validates a bucket-relative object path.
    fn object_path(bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        validate_segment(bucket)?;
        let relative = Path::new(path);
        if relative.components().any(|component| {
            !matches!(component, Component::Normal(_))
        }) || path.is_empty()
        {
            return Err(StorageError::Upload(format!("invalid object path: {path}")));
        }
        Ok(Path::new(bucket).join(relative))
    }
}

/// Rejects empty or traversing bucket names.
fn validate_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty() || segment.contains('/') || segment.contains("..") {
        return Err(StorageError::Upload(format!("invalid bucket name: {segment}")));
    }
    Ok(())
}

impl DocumentStore for FsDocumentStore {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let object = Self::object_path(bucket, path)?;
        if let Some(parent) = object.parent() {
            self.root
                .create_dir_all(parent)
                .map_err(|err| StorageError::Upload(err.to_string()))?;
        }
        self.root.write(&object, bytes).map_err(|err| StorageError::Upload(err.to_string()))
    }

    fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let object = Self::object_path(bucket, path)?;
        match self.root.read(&object) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            }),
            Err(err) => Err(StorageError::Download(err.to_string())),
        }
    }

    fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_seconds: u64,
    ) -> Result<String, StorageError> {
        let object = Self::object_path(bucket, path)?;
        if !self.root.exists(&object) {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }
        let absolute = self.root_path.join(&object);
        let mut url = Url::from_file_path(&absolute)
            .map_err(|()| StorageError::SignedUrl("root path is not absolute".to_string()))?;
        url.query_pairs_mut().append_pair("ttl", &ttl_seconds.to_string());
        Ok(url.to_string())
    }
}
