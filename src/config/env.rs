//! Environment variable configuration
//!
//! Provides `SKIPAWARE_*` overrides for run options.

use std::env;
use std::path::PathBuf;

use crate::models::{RunOptions, Verbosity};

/// Environment variable prefix
const ENV_PREFIX: &str = "SKIPAWARE";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Verbosity from SKIPAWARE_VERBOSITY
    pub verbosity: Option<Verbosity>,
    /// Exit-first switch from SKIPAWARE_EXITFIRST
    pub exit_first: Option<bool>,
    /// Post-mortem switch from SKIPAWARE_PDB
    pub pdb: Option<bool>,
    /// Tag expression from SKIPAWARE_MATCH
    pub tag_match: Option<String>,
    /// Pattern from SKIPAWARE_PATTERN
    pub pattern: Option<String>,
    /// Restart switch from SKIPAWARE_RESTART
    pub restart: Option<bool>,
    /// Ledger path from SKIPAWARE_RESTART_FILE
    pub restart_file: Option<PathBuf>,
    /// Config file from SKIPAWARE_CONFIG
    pub config_file: Option<String>,
    /// Profile name from SKIPAWARE_PROFILE
    pub profile: Option<String>,
    /// Output format from SKIPAWARE_FORMAT
    pub format: Option<String>,
    /// Log level from SKIPAWARE_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            verbosity: get_env("VERBOSITY").and_then(|v| Verbosity::from_str(&v)),
            exit_first: get_env_bool("EXITFIRST"),
            pdb: get_env_bool("PDB"),
            tag_match: get_env("MATCH"),
            pattern: get_env("PATTERN"),
            restart: get_env_bool("RESTART"),
            restart_file: get_env("RESTART_FILE").map(PathBuf::from),
            config_file: get_env("CONFIG"),
            profile: get_env("PROFILE"),
            format: get_env("FORMAT"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.verbosity.is_some()
            || self.exit_first.is_some()
            || self.pdb.is_some()
            || self.tag_match.is_some()
            || self.pattern.is_some()
            || self.restart.is_some()
            || self.restart_file.is_some()
            || self.config_file.is_some()
            || self.profile.is_some()
            || self.format.is_some()
            || self.log_level.is_some()
    }

    /// Apply the variables that are set over `options`
    pub fn apply(&self, mut options: RunOptions) -> RunOptions {
        if let Some(verbosity) = self.verbosity {
            options.verbosity = verbosity;
        }
        if let Some(exit_first) = self.exit_first {
            options.exit_first = exit_first;
        }
        if let Some(pdb) = self.pdb {
            options.pdb_mode = pdb;
        }
        if let Some(expr) = &self.tag_match {
            options.tag_match = Some(expr.clone());
        }
        if let Some(pattern) = &self.pattern {
            options.pattern = Some(pattern.clone());
        }
        if let Some(restart) = self.restart {
            options.restart = restart;
        }
        if let Some(path) = &self.restart_file {
            options.restart_file = path.clone();
        }
        options
    }

    /// Get format with fallback
    pub fn format_or(&self, default: &str) -> String {
        self.format.clone().unwrap_or_else(|| default.to_string())
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_VERBOSITY:    {:?}", ENV_PREFIX, self.verbosity);
        println!("  {}_EXITFIRST:    {:?}", ENV_PREFIX, self.exit_first);
        println!("  {}_PDB:          {:?}", ENV_PREFIX, self.pdb);
        println!("  {}_MATCH:        {:?}", ENV_PREFIX, self.tag_match);
        println!("  {}_PATTERN:      {:?}", ENV_PREFIX, self.pattern);
        println!("  {}_RESTART:      {:?}", ENV_PREFIX, self.restart);
        println!("  {}_RESTART_FILE: {:?}", ENV_PREFIX, self.restart_file);
        println!("  {}_CONFIG:       {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_PROFILE:      {:?}", ENV_PREFIX, self.profile);
        println!("  {}_FORMAT:       {:?}", ENV_PREFIX, self.format);
        println!("  {}_LOG:          {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn verbosity(self, verbosity: &str) -> Self {
        self.var("VERBOSITY", verbosity)
    }

    pub fn exit_first(self, exit_first: bool) -> Self {
        self.var("EXITFIRST", exit_first.to_string())
    }

    pub fn pdb(self, pdb: bool) -> Self {
        self.var("PDB", pdb.to_string())
    }

    pub fn tag_match(self, expr: impl Into<String>) -> Self {
        self.var("MATCH", expr)
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.var("PATTERN", pattern)
    }

    pub fn restart(self, restart: bool) -> Self {
        self.var("RESTART", restart.to_string())
    }

    pub fn restart_file(self, path: impl Into<String>) -> Self {
        self.var("RESTART_FILE", path)
    }

    pub fn profile(self, name: impl Into<String>) -> Self {
        self.var("PROFILE", name)
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.var("FORMAT", format)
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all SKIPAWARE environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_VERBOSITY     Output verbosity (quiet, normal, verbose)");
    println!("  {ENV_PREFIX}_EXITFIRST     Stop on first failure or error (true/false)");
    println!("  {ENV_PREFIX}_PDB           Offer post-mortem debugging (true/false)");
    println!("  {ENV_PREFIX}_MATCH         Tag expression selecting cases");
    println!("  {ENV_PREFIX}_PATTERN       Substring selecting cases or sub-tests");
    println!("  {ENV_PREFIX}_RESTART       Skip cases recorded in the restart ledger");
    println!("  {ENV_PREFIX}_RESTART_FILE  Path to the restart ledger");
    println!("  {ENV_PREFIX}_CONFIG        Path to configuration file");
    println!("  {ENV_PREFIX}_PROFILE       Run profile name");
    println!("  {ENV_PREFIX}_FORMAT        Report format (text, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_LOG           Log level (error, warn, info, debug, trace)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_MATCH='not slow'");
    println!("  export {ENV_PREFIX}_EXITFIRST=1");
    println!("  skipaware run --restart");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.tag_match.is_none());
        assert!(!config.has_any());
        assert_eq!(config.format_or("text"), "text");
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .tag_match("db and not slow")
            .pattern("parse")
            .verbosity("verbose")
            .restart_file("/tmp/ledger")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.tag_match.as_deref(), Some("db and not slow"));
        assert_eq!(config.pattern.as_deref(), Some("parse"));
        assert_eq!(config.verbosity, Some(Verbosity::Verbose));
        assert_eq!(config.restart_file, Some(PathBuf::from("/tmp/ledger")));
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = EnvBuilder::new().exit_first(true).pdb(false).apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.exit_first, Some(true));
        assert_eq!(config.pdb, Some(false));
    }

    #[test]
    fn test_apply_overrides_only_set_values() {
        let env = EnvConfig {
            exit_first: Some(true),
            tag_match: Some("slow".to_string()),
            ..Default::default()
        };
        let options = env.apply(RunOptions::new().pdb_mode(true).with_tag_match("db"));

        assert!(options.exit_first);
        assert!(options.pdb_mode);
        assert_eq!(options.tag_match.as_deref(), Some("slow"));
        assert!(env.has_any());
    }
}
