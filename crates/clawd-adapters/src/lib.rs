//! Built-in tools for Clawd.
//!
//! Each module exposes plain async operations plus a `register` function
//! that wires them into a [`ToolRegistry`]:
//!
//! - [`system`] -- `get_time`, `get_system_info`.
//! - [`filesystem`] -- `read_file`, `write_file`, `list_directory` under a root.
//! - [`shell`] -- `run_command` for a small whitelist of read-only programs.
//! - [`web`] -- `web_search` (DuckDuckGo instant answers) and `fetch_url`.
//! - [`memory_tools`] -- `remember_fact`, `recall_fact`, `search_history`,
//!   `add_task`, `complete_task`.

pub mod error;
pub mod filesystem;
pub mod memory_tools;
pub mod shell;
pub mod system;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;

use clawd_agent::{SharedMemory, ToolRegistry};
use tracing::info;

pub use error::{AdapterError, Result};
pub use filesystem::Filesystem;
pub use shell::ShellTool;
pub use web::WebTools;

/// Which built-in tools to register and where the file tools are rooted.
#[derive(Debug, Clone)]
pub struct BuiltinOptions {
    pub root_dir: PathBuf,
    pub enable_shell: bool,
    pub enable_web: bool,
}

impl Default for BuiltinOptions {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            enable_shell: true,
            enable_web: true,
        }
    }
}

/// Register the stateless built-in tools.
///
/// # Errors
///
/// [`AdapterError::ConfigError`] when the web client cannot be built.
pub fn register_builtin_tools(registry: &mut ToolRegistry, options: &BuiltinOptions) -> Result<()> {
    system::register(registry);
    filesystem::register(registry, Arc::new(Filesystem::new(&options.root_dir)));
    if options.enable_shell {
        shell::register(registry, ShellTool::new(&options.root_dir));
    }
    if options.enable_web {
        web::register(registry, Arc::new(WebTools::new()?));
    }

    info!(
        tool_count = registry.len(),
        root = %options.root_dir.display(),
        shell = options.enable_shell,
        web = options.enable_web,
        "built-in tools registered"
    );
    Ok(())
}

/// Register the tools bound to one user's memory.
pub fn register_memory_tools(registry: &mut ToolRegistry, memory: SharedMemory) {
    memory_tools::register(registry, memory);
}
