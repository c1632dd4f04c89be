//! Filters configuration: parse/write `filter.conf` and apply it to AppState.
//!
//! The file remembers which role filters are active so the next session
//! starts with the same selection.

use std::collections::BTreeSet;

use super::AppState;
use crate::error::{Context, Result};
use crate::model::Role;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FiltersConfig {
    /// Roles the results are restricted to; empty means all roles.
    pub roles: BTreeSet<Role>,
}

impl FiltersConfig {
    pub fn from_app(app: &AppState) -> Self {
        Self {
            roles: app.role_filters.clone(),
        }
    }

    pub fn save_from_app(app: &AppState, path: &str) -> Result<()> {
        Self::from_app(app)
            .write_file(path)
            .with_ctx(|| format!("write filter config {path}"))
    }

    /// Load `path`; fall back to the config directory copy, else write an empty config to `path`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = super::config_file_read_path("filter.conf") {
            return Self::from_file(&existing).unwrap_or_default();
        }
        let cfg = Self::default();
        if let Err(e) = cfg.write_file(path) {
            tracing::debug!(path, error = %e, "could not write default filter config");
        }
        cfg
    }

    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse `roles = admin,editor` lines. Unknown role names are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            if lhs.trim() != "roles" {
                continue;
            }
            cfg.roles = rhs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
                .filter_map(|s| match s.parse::<Role>() {
                    Ok(role) => Some(role),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping role in filter config");
                        None
                    }
                })
                .collect();
        }
        cfg
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        let mut buf = String::new();
        buf.push_str("# user-directory filters\n");
        buf.push_str("# Comma-separated roles: admin, editor, viewer, guest, owner, inactive\n");
        buf.push_str("# Leave empty (or None) to show every role.\n");
        let roles = if self.roles.is_empty() {
            "None".to_string()
        } else {
            self.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(",")
        };
        buf.push_str(&format!("roles = {roles}\n"));
        std::fs::write(path, buf)
    }

    pub fn apply_to(&self, app: &mut AppState) {
        app.role_filters = self.roles.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_list_and_skips_unknowns() {
        let cfg = FiltersConfig::parse("# c\nroles = Admin, guest ,wizard\n");
        assert_eq!(cfg.roles, BTreeSet::from([Role::Admin, Role::Guest]));
        assert!(FiltersConfig::parse("roles = None").roles.is_empty());
    }
}
