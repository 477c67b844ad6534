//! Path rewriting for version 2 key-value engines.
//!
//! A v1 engine uses the same path for every operation on a secret. A v2
//! engine expects an operation-specific segment (`data`, `metadata`,
//! `delete`, `undelete`, `destroy`) right after the mount prefix:
//!
//! ```text
//! secret/app/db  --read-->  secret/data/app/db
//! secret/app/db  --list-->  secret/metadata/app/db?list=true
//! ```
//!
//! Rewriting is a plain string splice. Whatever follows the mount prefix in
//! the caller's path, irregular slashes included, is kept verbatim.

use crate::mount::MountInfo;
use crate::transport::HttpMethod;

/// Query suffix appended to list requests, for both engine versions.
const LIST_SUFFIX: &str = "?list=true";

/// The logical key-value operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperation {
    Read,
    Write,
    List,
    Delete,
    VersionDelete,
    VersionUndelete,
    VersionDestroy,
}

impl LogicalOperation {
    /// Segment injected after the mount prefix on a v2 engine.
    pub const fn qualifier(self) -> &'static str {
        match self {
            Self::Read | Self::Write => "data",
            Self::List | Self::Delete => "metadata",
            Self::VersionDelete => "delete",
            Self::VersionUndelete => "undelete",
            Self::VersionDestroy => "destroy",
        }
    }

    /// Whether the request is decorated with `?list=true`.
    pub const fn is_list(self) -> bool {
        matches!(self, Self::List)
    }

    pub const fn method(self) -> HttpMethod {
        match self {
            Self::Read | Self::List => HttpMethod::Get,
            Self::Write | Self::VersionDelete | Self::VersionUndelete | Self::VersionDestroy => {
                HttpMethod::Post
            }
            Self::Delete => HttpMethod::Delete,
        }
    }

    /// Whether `status` counts as success for this operation.
    ///
    /// Vault answers 404 when listing a prefix with no keys beneath it, which
    /// is an empty result rather than an error.
    pub const fn accepts_status(self, status: u16) -> bool {
        matches!(status, 200..=299) || (self.is_list() && status == 404)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::List => "list",
            Self::Delete => "delete",
            Self::VersionDelete => "version-delete",
            Self::VersionUndelete => "version-undelete",
            Self::VersionDestroy => "version-destroy",
        }
    }
}

impl std::fmt::Display for LogicalOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inject `qualifier` right after the mount prefix when the mount is a v2
/// engine; any other engine version returns `path` untouched.
///
/// The remainder is taken positionally: everything in `path` past the first
/// `mount_path.len()` bytes. A path shorter than the prefix contributes
/// nothing.
pub fn add_qualifier(mount: &MountInfo, path: &str, qualifier: &str) -> String {
    if !mount.is_v2() {
        return path.to_owned();
    }

    let prefix = mount.mount_path();
    let remainder = path.get(prefix.len()..).unwrap_or_default();

    let mut adjusted = String::with_capacity(prefix.len() + qualifier.len() + 1 + remainder.len());
    adjusted.push_str(prefix);
    if !qualifier.is_empty() {
        adjusted.push('/');
        adjusted.push_str(qualifier);
    }
    adjusted.push_str(remainder);
    adjusted
}

pub fn adjust_path_for_read_or_write(path: &str, mount: &MountInfo) -> String {
    add_qualifier(mount, path, LogicalOperation::Read.qualifier())
}

/// Lists use the `metadata` segment and always carry `?list=true`.
pub fn adjust_path_for_list(path: &str, mount: &MountInfo) -> String {
    let mut adjusted = add_qualifier(mount, path, LogicalOperation::List.qualifier());
    adjusted.push_str(LIST_SUFFIX);
    adjusted
}

pub fn adjust_path_for_delete(path: &str, mount: &MountInfo) -> String {
    add_qualifier(mount, path, LogicalOperation::Delete.qualifier())
}

pub fn adjust_path_for_version_delete(path: &str, mount: &MountInfo) -> String {
    add_qualifier(mount, path, LogicalOperation::VersionDelete.qualifier())
}

pub fn adjust_path_for_version_undelete(path: &str, mount: &MountInfo) -> String {
    add_qualifier(mount, path, LogicalOperation::VersionUndelete.qualifier())
}

pub fn adjust_path_for_version_destroy(path: &str, mount: &MountInfo) -> String {
    add_qualifier(mount, path, LogicalOperation::VersionDestroy.qualifier())
}

/// Rewrite `path` for `operation` against `mount`.
pub fn adjust_path(path: &str, mount: &MountInfo, operation: LogicalOperation) -> String {
    match operation {
        LogicalOperation::Read | LogicalOperation::Write => adjust_path_for_read_or_write(path, mount),
        LogicalOperation::List => adjust_path_for_list(path, mount),
        LogicalOperation::Delete => adjust_path_for_delete(path, mount),
        LogicalOperation::VersionDelete => adjust_path_for_version_delete(path, mount),
        LogicalOperation::VersionUndelete => adjust_path_for_version_undelete(path, mount),
        LogicalOperation::VersionDestroy => adjust_path_for_version_destroy(path, mount),
    }
}
