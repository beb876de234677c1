//! File tools -- read, write and list files under a root directory.
//!
//! Paths supplied by the model are resolved relative to `root_dir` and
//! validated against traversal (`../../etc/passwd`).  Absolute paths are
//! accepted only when they land inside the root.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use clawd_agent::tools::{optional_str, require_str};
use clawd_agent::{ToolArgs, ToolError, ToolHandler, ToolRegistry};

use crate::error::{AdapterError, Result};

/// Files larger than this are refused by `read_file`.
pub const MAX_READ_BYTES: u64 = 100_000;

/// Characters returned by `read_file`.
pub const MAX_READ_CHARS: usize = 10_000;

/// Entries returned by `list_directory`.
pub const MAX_LIST_ENTRIES: usize = 50;

/// File operations confined to a root directory.
#[derive(Debug, Clone)]
pub struct Filesystem {
    root_dir: PathBuf,
}

impl Filesystem {
    /// Root the tools at `root_dir` (canonicalized when it exists).
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let root_dir = root_dir.canonicalize().unwrap_or(root_dir);
        Self { root_dir }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Resolve `raw_path` against the root without touching the filesystem
    /// and reject anything that escapes it.
    fn safe_resolve(&self, raw_path: &str, tool_name: &str) -> Result<PathBuf> {
        let candidate = if Path::new(raw_path).is_absolute() {
            PathBuf::from(raw_path)
        } else {
            self.root_dir.join(raw_path)
        };
        let normalized = normalize_path(&candidate);

        if !normalized.starts_with(&self.root_dir) {
            return Err(AdapterError::InvalidParams {
                tool_name: tool_name.to_owned(),
                reason: format!(
                    "path `{raw_path}` is outside the root directory `{}`",
                    self.root_dir.display()
                ),
            });
        }
        Ok(normalized)
    }

    /// Contents of a file, at most [`MAX_READ_CHARS`] characters.
    pub async fn read_file(&self, path: &str) -> Result<String> {
        let full_path = self.safe_resolve(path, "read_file")?;
        debug!(path = %full_path.display(), "reading file");

        let meta = match tokio::fs::metadata(&full_path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(format!("File not found: {path}"));
            }
            Err(e) => return Err(e.into()),
        };
        if meta.len() > MAX_READ_BYTES {
            return Ok(format!("File too large: {} bytes", meta.len()));
        }

        let raw = tokio::fs::read_to_string(&full_path).await?;
        Ok(raw.chars().take(MAX_READ_CHARS).collect())
    }

    /// Write `content`, creating parent directories.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<String> {
        let full_path = self.safe_resolve(path, "write_file")?;
        debug!(path = %full_path.display(), bytes = content.len(), "writing file");

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, content).await?;
        Ok(format!("Written {} bytes to {path}", content.len()))
    }

    /// One `[DIR] name` / `[FILE] name` line per entry, sorted by name.
    pub async fn list_directory(&self, path: &str) -> Result<String> {
        let full_path = self.safe_resolve(path, "list_directory")?;
        debug!(path = %full_path.display(), "listing directory");

        let mut read_dir = match tokio::fs::read_dir(&full_path).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(format!("Directory not found: {path}"));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        entries.sort();

        if entries.is_empty() {
            return Ok("(empty)".to_owned());
        }
        Ok(entries
            .into_iter()
            .take(MAX_LIST_ENTRIES)
            .map(|(name, is_dir)| {
                let tag = if is_dir { "[DIR]" } else { "[FILE]" };
                format!("{tag} {name}")
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Collapse `.` and `..` components lexically.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }
    components.iter().collect()
}

// ---------------------------------------------------------------------------
// Tool wiring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum FsOp {
    Read,
    Write,
    List,
}

struct FsTool {
    fs: Arc<Filesystem>,
    op: FsOp,
}

#[async_trait]
impl ToolHandler for FsTool {
    async fn call(&self, args: ToolArgs) -> std::result::Result<String, ToolError> {
        let output = match self.op {
            FsOp::Read => self.fs.read_file(require_str(&args, "path")?).await?,
            FsOp::Write => {
                let path = require_str(&args, "path")?;
                let content = require_str(&args, "content")?;
                self.fs.write_file(path, content).await?
            }
            FsOp::List => {
                let path = optional_str(&args, "path").unwrap_or(".");
                self.fs.list_directory(path).await?
            }
        };
        Ok(output)
    }
}

/// Register `read_file`, `write_file` and `list_directory`.
pub fn register(registry: &mut ToolRegistry, fs: Arc<Filesystem>) {
    let tool = |op| Arc::new(FsTool { fs: Arc::clone(&fs), op });

    registry.register(
        "read_file",
        "Read contents of a file",
        tool(FsOp::Read),
        Some(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path to read"}
            },
            "required": ["path"]
        })),
    );
    registry.register(
        "write_file",
        "Write content to a file",
        tool(FsOp::Write),
        Some(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path to write"},
                "content": {"type": "string", "description": "Content to write"}
            },
            "required": ["path", "content"]
        })),
    );
    registry.register(
        "list_directory",
        "List files in a directory",
        tool(FsOp::List),
        Some(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Directory path"}
            }
        })),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_in(dir: &tempfile::TempDir) -> Filesystem {
        Filesystem::new(dir.path())
    }

    #[test]
    fn normalize_path_resolves_parent_and_current_components() {
        assert_eq!(
            normalize_path(Path::new("/tmp/sandbox/sub/../other")),
            PathBuf::from("/tmp/sandbox/other")
        );
        assert_eq!(
            normalize_path(Path::new("/tmp/./sandbox/./file.txt")),
            PathBuf::from("/tmp/sandbox/file.txt")
        );
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);
        assert!(fs.safe_resolve("../../etc/passwd", "read_file").is_err());
        assert!(fs.safe_resolve("/etc/passwd", "read_file").is_err());
        assert!(fs.safe_resolve("a/../b.txt", "read_file").is_ok());
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);

        let msg = fs.write_file("notes/today.txt", "buy milk").await.unwrap();
        assert_eq!(msg, "Written 8 bytes to notes/today.txt");
        assert_eq!(fs.read_file("notes/today.txt").await.unwrap(), "buy milk");
    }

    #[tokio::test]
    async fn missing_and_oversized_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);

        assert_eq!(fs.read_file("nope.txt").await.unwrap(), "File not found: nope.txt");

        std::fs::write(dir.path().join("big.txt"), "x".repeat(100_001)).unwrap();
        assert_eq!(
            fs.read_file("big.txt").await.unwrap(),
            "File too large: 100001 bytes"
        );
    }

    #[tokio::test]
    async fn read_is_capped_in_characters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wide.txt"), "é".repeat(20_000)).unwrap();
        let content = fs_in(&dir).read_file("wide.txt").await.unwrap();
        assert_eq!(content.chars().count(), MAX_READ_CHARS);
    }

    #[tokio::test]
    async fn listing_tags_and_caps_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        let fs = fs_in(&dir);

        assert_eq!(fs.list_directory(".").await.unwrap(), "[FILE] a.txt\n[DIR] sub");

        for i in 0..60 {
            std::fs::write(dir.path().join(format!("f{i:02}.txt")), "").unwrap();
        }
        let listing = fs.list_directory(".").await.unwrap();
        assert_eq!(listing.lines().count(), MAX_LIST_ENTRIES);
        assert_eq!(
            fs.list_directory("missing").await.unwrap(),
            "Directory not found: missing"
        );
    }

    #[tokio::test]
    async fn handlers_validate_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ToolRegistry::new();
        register(&mut registry, Arc::new(fs_in(&dir)));

        let write = registry.handler("write_file").unwrap();
        let err = write.call(ToolArgs::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument(ref a) if a == "path"));

        let read = registry.handler("read_file").unwrap();
        let mut args = ToolArgs::new();
        args.insert("path".into(), json!("../outside"));
        assert!(matches!(
            read.call(args).await,
            Err(ToolError::InvalidArgument { .. })
        ));

        let list = registry.handler("list_directory").unwrap();
        assert_eq!(list.call(ToolArgs::new()).await.unwrap(), "(empty)");
    }
}
