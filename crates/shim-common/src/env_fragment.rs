// EnvironmentFragment: the shell-sourceable result of one shim invocation.

use std::io::Write;
use std::path::Path;

use crate::action_command::{command_lines, ActionCommand};
use crate::constants::variables;
use crate::errors::{Result, ShimError};

/// Environment mutations collected from lifecycle script output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentFragment {
    /// `set-env` assignments in order of appearance; repeats are kept.
    exports: Vec<(String, String)>,
    /// `add-path` entries in order of appearance.
    paths: Vec<String>,
}

impl EnvironmentFragment {
    /// Collect commands from captured output in two independent passes:
    /// all `set-env` commands, then all `add-path` commands.
    pub fn from_output(output: &str) -> Self {
        let mut fragment = Self::default();

        for line in command_lines(output) {
            if let Some(ActionCommand::SetEnv { name, value }) =
                ActionCommand::try_parse_set_env(line)
            {
                fragment.exports.push((name, value));
            }
        }

        for line in command_lines(output) {
            if let Some(ActionCommand::AddPath { path }) = ActionCommand::try_parse_add_path(line) {
                fragment.paths.push(path);
            }
        }

        fragment
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.paths.is_empty()
    }

    pub fn exports(&self) -> &[(String, String)] {
        &self.exports
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Render as POSIX shell.
    ///
    /// Only the first `"` of each value is escaped; values containing more
    /// than one double quote produce a line the shell will not parse as
    /// intended. Multiple add-path entries share one `PATH` line, newest first.
    pub fn render(&self) -> String {
        let mut script = String::new();

        for (name, value) in &self.exports {
            script.push_str(&format!(
                "export {name}=\"{}\"\n",
                value.replacen('"', "\\\"", 1)
            ));
        }

        if !self.paths.is_empty() {
            let mut prepended: Vec<&str> = self.paths.iter().map(String::as_str).collect();
            prepended.reverse();
            script.push_str(&format!(
                "export {path}=\"{}:${{{path}}}\"\n",
                prepended.join(":"),
                path = variables::PATH
            ));
        }

        script
    }

    /// Write the rendered fragment to `target`, replacing any existing file.
    ///
    /// The content goes to a temporary file in the same directory first and is
    /// renamed into place, so readers never observe a partial fragment.
    pub fn persist(&self, target: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| ShimError::Io {
            path: target.to_path_buf(),
            source,
        };

        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(self.render().as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(target).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %target.display(), "Environment fragment written");
        Ok(())
    }
}

/// Translate captured script output into fragment text.
pub fn translate(output: &str) -> String {
    EnvironmentFragment::from_output(output).render()
}
