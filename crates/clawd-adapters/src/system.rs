//! Clock and host information.

use clawd_agent::{ToolArgs, ToolError, ToolRegistry};

/// Local date and time as `YYYY-MM-DD HH:MM:SS`.
pub fn current_time() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Operating system, architecture and Clawd version.
pub fn system_info() -> String {
    format!(
        "OS: {} ({}), Arch: {}, Clawd: {}",
        std::env::consts::OS,
        std::env::consts::FAMILY,
        std::env::consts::ARCH,
        env!("CARGO_PKG_VERSION"),
    )
}

/// Register `get_time` and `get_system_info`.
pub fn register(registry: &mut ToolRegistry) {
    registry.register_fn(
        "get_time",
        "Get current date and time",
        None,
        |_args: ToolArgs| Ok::<_, ToolError>(current_time()),
    );
    registry.register_fn(
        "get_system_info",
        "Get system information",
        None,
        |_args: ToolArgs| Ok::<_, ToolError>(system_info()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_has_expected_shape() {
        let now = current_time();
        assert_eq!(now.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&now, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn system_info_names_the_os() {
        let info = system_info();
        assert!(info.contains(std::env::consts::OS));
        assert!(info.contains(env!("CARGO_PKG_VERSION")));
    }
}
