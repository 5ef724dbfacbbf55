// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `/etc/mockview/mockview.toml`, the XDG config dir, then
//! `./mockview.toml`, followed by the conventional `OPENAI_API_KEY` and then
//! `MOCKVIEW_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MockviewConfig;

/// Config sections, used to turn `MOCKVIEW_SECTION_KEY` into `section.key`.
const SECTIONS: &[&str] = &[
    "server",
    "openai",
    "audio",
    "interview",
    "limits",
    "session",
    "websocket",
    "reports",
    "logging",
];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/mockview/mockview.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "mockview.toml";

/// Per-user config file in the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mockview").join("mockview.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. [`SYSTEM_CONFIG_PATH`]
/// 3. [`user_config_path`]
/// 4. [`LOCAL_CONFIG_PATH`]
/// 5. `OPENAI_API_KEY`
/// 6. `MOCKVIEW_*` environment variables
pub fn load_config() -> Result<MockviewConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the defaults (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MockviewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MockviewConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MockviewConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MockviewConfig::default()))
        .merge(Toml::file(path))
        .merge(openai_key_provider())
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MockviewConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(openai_key_provider())
        .merge(env_provider())
}

/// `MOCKVIEW_*` variables, mapped by section prefix rather than by splitting on
/// `_`, so `MOCKVIEW_OPENAI_API_KEY` becomes `openai.api_key`.
fn env_provider() -> Env {
    Env::prefixed("MOCKVIEW_").map(|key| map_env_key(key.as_str()).into())
}

/// The bare `OPENAI_API_KEY` most deployments already export.
fn openai_key_provider() -> Env {
    Env::raw()
        .only(&["OPENAI_API_KEY"])
        .map(|_| "openai.api_key".into())
}

/// Maps a lowercased, prefix-stripped env key to its dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_section_prefixes() {
        assert_eq!(map_env_key("openai_api_key"), "openai.api_key");
        assert_eq!(map_env_key("server_port"), "server.port");
        assert_eq!(
            map_env_key("websocket_inactivity_timeout_secs"),
            "websocket.inactivity_timeout_secs"
        );
        assert_eq!(map_env_key("limits_max_concurrent_calls"), "limits.max_concurrent_calls");
    }

    #[test]
    fn leaves_unknown_keys_alone() {
        assert_eq!(map_env_key("unknown_thing"), "unknown_thing");
    }

    #[test]
    fn str_overrides_defaults() {
        let config = load_config_from_str("[server]\nport = 9001\n").unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
