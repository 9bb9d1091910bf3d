//! Admin interface target resolution.
//!
//! Built once at startup and handed to the connector. Precedence, lowest to
//! highest: built-in defaults, credential file, YAML, environment, CLI flags.
//! The environment is passed in as a lookup so resolution stays testable.
//!
//! Error messages name the env var, never its value.

use anyhow::{bail, Context, Result};
use pxr_reconcile::Propagation;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::{parse_credentials_file, Credentials};

pub const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
pub const DEFAULT_ADMIN_PORT: u16 = 6032;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_ADMIN_HOST: &str = "PXR_ADMIN_HOST";
pub const ENV_ADMIN_PORT: &str = "PXR_ADMIN_PORT";
pub const ENV_ADMIN_USER: &str = "PXR_ADMIN_USER";
/// Password env var used when `/admin/password_env` is not set.
pub const DEFAULT_PASSWORD_ENV: &str = "PXR_ADMIN_PASSWORD";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where and as whom to log in. **The password is redacted in `Debug`.**
#[derive(Clone, PartialEq, Eq)]
pub struct AdminTarget {
    pub host: String,
    pub port: u16,
    /// Takes precedence over host/port when set.
    pub unix_socket: Option<PathBuf>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub connect_timeout: Duration,
}

impl AdminTarget {
    /// Human-readable address for logs and error messages.
    pub fn address(&self) -> String {
        match &self.unix_socket {
            Some(sock) => sock.display().to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

impl std::fmt::Debug for AdminTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("unix_socket", &self.unix_socket)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Explicit command-line values. `None` leaves the lower layers in charge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminOverrides {
    pub host: Option<String>,
    /// Kept wide so an out-of-range flag reaches validation instead of clap.
    pub port: Option<i64>,
    pub user: Option<String>,
    pub unix_socket: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Non-blank string at `pointer`, trimmed.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Integer at `pointer`. Numeric strings are accepted; anything else present
/// at the pointer is an error.
fn read_int_at(config: &Value, pointer: &str) -> Result<Option<i64>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => bail!("CONFIG_INVALID leaf={pointer}: expected an integer"),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .with_context(|| format!("CONFIG_INVALID leaf={pointer}: expected an integer")),
        Some(_) => bail!("CONFIG_INVALID leaf={pointer}: expected an integer"),
    }
}

fn read_bool_at(config: &Value, pointer: &str) -> Result<Option<bool>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => bail!("CONFIG_INVALID leaf={pointer}: expected true or false"),
    }
}

fn load_credentials(path: &Path) -> Result<Credentials> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read credentials file: {}", path.display()))?;
    parse_credentials_file(&raw)
        .with_context(|| format!("invalid credentials file: {}", path.display()))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the admin target from config, environment and flags.
///
/// `env` returns the value of a named environment variable; blank values
/// count as unset. The port is validated after every layer has applied, so
/// an out-of-range value fails here, before any connection attempt.
pub fn resolve_admin_target<F>(
    config_json: &Value,
    overrides: &AdminOverrides,
    env: F,
) -> Result<AdminTarget>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    // 1) credential file
    let cred_path = overrides.credentials_file.clone().or_else(|| {
        read_str_at(config_json, "/admin/credentials_file").map(PathBuf::from)
    });
    let creds = match &cred_path {
        Some(path) => load_credentials(path)?,
        None => Credentials::default(),
    };

    let mut host = DEFAULT_ADMIN_HOST.to_string();
    let mut port = i64::from(DEFAULT_ADMIN_PORT);
    let mut user = creds.user;
    let mut password = creds.password;

    // 2) YAML
    if let Some(h) = read_str_at(config_json, "/admin/host") {
        host = h;
    }
    if let Some(p) = read_int_at(config_json, "/admin/port")? {
        port = p;
    }
    if let Some(u) = read_str_at(config_json, "/admin/user") {
        user = Some(u);
    }
    let mut unix_socket = read_str_at(config_json, "/admin/unix_socket").map(PathBuf::from);
    let password_env = read_str_at(config_json, "/admin/password_env")
        .unwrap_or_else(|| DEFAULT_PASSWORD_ENV.to_string());
    let timeout_ms = match read_int_at(config_json, "/admin/connect_timeout_ms")? {
        None => DEFAULT_CONNECT_TIMEOUT_MS,
        Some(ms) if ms > 0 => ms as u64,
        Some(ms) => bail!("CONFIG_INVALID leaf=/admin/connect_timeout_ms: must be positive (got {ms})"),
    };

    // 3) environment
    if let Some(h) = env(ENV_ADMIN_HOST) {
        host = h.trim().to_string();
    }
    if let Some(p) = env(ENV_ADMIN_PORT) {
        port = p
            .trim()
            .parse::<i64>()
            .with_context(|| format!("CONFIG_INVALID: env var '{ENV_ADMIN_PORT}' is not an integer"))?;
    }
    if let Some(u) = env(ENV_ADMIN_USER) {
        user = Some(u.trim().to_string());
    }
    if let Some(pw) = env(password_env.as_str()) {
        password = Some(pw);
    }

    // 4) flags
    if let Some(h) = &overrides.host {
        host = h.clone();
    }
    if let Some(p) = overrides.port {
        port = p;
    }
    if let Some(u) = &overrides.user {
        user = Some(u.clone());
    }
    if let Some(sock) = &overrides.unix_socket {
        unix_socket = Some(sock.clone());
    }

    let Ok(port) = u16::try_from(port) else {
        bail!("CONFIG_INVALID: admin port {port} is outside 0..=65535");
    };

    Ok(AdminTarget {
        host,
        port,
        unix_socket,
        user,
        password,
        connect_timeout: Duration::from_millis(timeout_ms),
    })
}

/// Propagation toggles from `/propagation/*`; both default to on.
pub fn propagation_defaults(config_json: &Value) -> Result<Propagation> {
    let mut out = Propagation::default();
    if let Some(b) = read_bool_at(config_json, "/propagation/save_to_disk")? {
        out.save_to_disk = b;
    }
    if let Some(b) = read_bool_at(config_json, "/propagation/load_to_runtime")? {
        out.load_to_runtime = b;
    }
    Ok(out)
}
