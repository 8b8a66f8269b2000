//! Well-known filesystem locations.
//!
//! The socket lives at a single shared path; only one daemon owns it at a
//! time. The daemon unlinks any stale file before binding, so a second
//! instance silently takes the path over from a first.

use std::path::PathBuf;

/// Environment override for the socket location.
pub const SOCKET_ENV: &str = "CODEPET_SOCKET";

const SOCKET_FILE: &str = "codepet.sock";
const HOOK_LOG_FILE: &str = "codepet_hook.log";

/// Resolve the socket path: `$CODEPET_SOCKET` if set, else the temp dir.
pub fn socket_path() -> PathBuf {
    match std::env::var_os(SOCKET_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(SOCKET_FILE),
    }
}

/// Side-channel log for failures the hook client swallows.
pub fn hook_log_path() -> PathBuf {
    std::env::temp_dir().join(HOOK_LOG_FILE)
}
