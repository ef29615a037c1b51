//! Resource collections and identifiers.
//!
//! URLs such as `/thing/123.json` look like static files on purpose: every
//! resource lives at `<class>/<collection>/<id>.<ext>` below the storage root,
//! where `<class>` is fixed by the collection. The extension is always explicit
//! in the URL and is never inferred from content.

use crate::error::StorageError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// W3C recommends not aging more than a year.
pub const ONE_YEAR_SECONDS: u64 = 60 * 60 * 24 * 365;

/// Whether the entries of a collection may change after they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Entries may be overwritten; clients revalidate every time.
    Mutable,
    /// Entries are content addressed and never change once written.
    Immutable,
}

impl Mutability {
    /// Directory below the storage root holding this class.
    pub fn dir_name(self) -> &'static str {
        match self {
            Mutability::Mutable => "mutable",
            Mutability::Immutable => "immutable",
        }
    }

    /// `Cache-Control` value for every read from this class.
    pub fn cache_control(self) -> String {
        match self {
            Mutability::Mutable => "public, max-age=0".to_string(),
            Mutability::Immutable => format!("public, max-age={ONE_YEAR_SECONDS}"),
        }
    }
}

/// A named bucket of resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Scenes.
    Place,
    /// Objects.
    Thing,
    /// Thumbnails.
    Thumb,
    /// Uploaded media blobs.
    Media,
    /// Person records.
    Person,
    /// Scene back-references.
    Refs,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Place,
        Collection::Thing,
        Collection::Thumb,
        Collection::Media,
        Collection::Person,
        Collection::Refs,
    ];

    /// The URL segment, which is also the directory name on disk.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Place => "place",
            Collection::Thing => "thing",
            Collection::Thumb => "thumb",
            Collection::Media => "media",
            Collection::Person => "fbusr",
            Collection::Refs => "pRefs",
        }
    }

    pub fn mutability(self) -> Mutability {
        match self {
            Collection::Place | Collection::Person | Collection::Refs => Mutability::Mutable,
            Collection::Thing | Collection::Thumb | Collection::Media => Mutability::Immutable,
        }
    }

    /// The only extension accepted on upload, if the collection restricts it.
    pub fn upload_extension(self) -> Option<&'static str> {
        match self {
            Collection::Place | Collection::Thing | Collection::Person | Collection::Refs => {
                Some("json")
            }
            Collection::Thumb => Some("png"),
            Collection::Media => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| StorageError::NotFound(format!("collection '{s}'")))
    }
}

/// A validated `(collection, id, extension)` triple taken from a URL.
///
/// Construction rejects anything that could name a file outside the
/// collection root, so every `Resource` maps to exactly one path below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    collection: Collection,
    id: String,
    extension: String,
}

impl Resource {
    /// Parses the final URL segment (`"42.json"`) of a resource in `collection`.
    ///
    /// The extension is whatever follows the last dot, so earlier dots belong
    /// to the id (`archive.tar.gz` is id `archive.tar`, extension `gz`).
    pub fn parse(collection: Collection, file: &str) -> Result<Self, StorageError> {
        if file.contains("..") || file.contains('/') || file.contains('\\') {
            return Err(StorageError::Traversal(format!("{collection}/{file}")));
        }

        let (id, extension) = file.rsplit_once('.').ok_or_else(|| {
            StorageError::InvalidIdentifier(format!("'{file}' has no file extension"))
        })?;

        // A leading dot would make a hidden file, the namespace of in-flight writes.
        let valid_id = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        let valid_ext = !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_id || !valid_ext {
            return Err(StorageError::InvalidIdentifier(file.to_string()));
        }

        Ok(Self {
            collection,
            id: id.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn mutability(&self) -> Mutability {
        self.collection.mutability()
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }

    /// `<class>/<collection>/<id>.<ext>`, relative to the storage root.
    pub fn relative_path(&self) -> PathBuf {
        [
            self.mutability().dir_name(),
            self.collection.name(),
            self.file_name().as_str(),
        ]
        .iter()
        .collect()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}.{}", self.collection, self.id, self.extension)
    }
}
