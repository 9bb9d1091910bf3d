//! my.cnf-style credential files.
//!
//! Only the `[client]` section is read, and only its `user` and `password`
//! options. Other sections and options are skipped without complaint so the
//! same file can serve the mysql client.

use anyhow::{bail, Result};

/// Login pair read from a credential file. **Values are redacted in `Debug`.**
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

pub fn parse_credentials_file(contents: &str) -> Result<Credentials> {
    let mut out = Credentials::default();
    let mut in_client = false;

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let Some(section) = rest.strip_suffix(']') else {
                bail!("credentials file line {}: unterminated section header", idx + 1);
            };
            in_client = section.trim().eq_ignore_ascii_case("client");
            continue;
        }
        if !in_client {
            continue;
        }

        // Bare options (`skip-ssl`) carry no value.
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim() {
            "user" => out.user = Some(value.to_string()),
            "password" => out.password = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(out)
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}
