// Legacy workflow commands that mutate the environment of later steps:
//
//   ::set-env name=<NAME>::<VALUE>
//   ::add-path::<VALUE>
//
// Commands may appear anywhere in a line; the value always runs to the end of
// that line. Every other workflow command is ignored.

/// Marker that opens a set-env command.
pub const SET_ENV_PREFIX: &str = "::set-env";

/// Marker that opens an add-path command, including its data delimiter.
pub const ADD_PATH_PREFIX: &str = "::add-path::";

/// The delimiter that separates command properties from data.
pub const COMMAND_DELIMITER: &str = "::";

const NAME_PROPERTY: &str = "name=";

/// A recognized environment-mutating command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCommand {
    SetEnv { name: String, value: String },
    AddPath { path: String },
}

impl ActionCommand {
    /// Parse the first well-formed `::set-env` command in `line`.
    ///
    /// Requires whitespace after `::set-env`, a non-empty name ending at the
    /// next `::`, and a non-empty value.
    pub fn try_parse_set_env(line: &str) -> Option<ActionCommand> {
        line.match_indices(SET_ENV_PREFIX).find_map(|(idx, _)| {
            let rest = &line[idx + SET_ENV_PREFIX.len()..];
            let properties = rest.trim_start_matches([' ', '\t']);
            if properties.len() == rest.len() {
                return None;
            }

            let body = properties.strip_prefix(NAME_PROPERTY)?;
            let end = body.find(COMMAND_DELIMITER)?;
            let name = &body[..end];
            let value = &body[end + COMMAND_DELIMITER.len()..];
            if name.is_empty() || value.is_empty() {
                return None;
            }

            Some(ActionCommand::SetEnv {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
    }

    /// Parse the first `::add-path::` command with a non-empty value in `line`.
    pub fn try_parse_add_path(line: &str) -> Option<ActionCommand> {
        line.match_indices(ADD_PATH_PREFIX).find_map(|(idx, _)| {
            let value = &line[idx + ADD_PATH_PREFIX.len()..];
            (!value.is_empty()).then(|| ActionCommand::AddPath {
                path: value.to_string(),
            })
        })
    }
}

/// Split captured output into lines. Both `\n` and `\r` end a line, and a
/// missing trailing newline is fine.
pub fn command_lines(output: &str) -> impl Iterator<Item = &str> {
    output.split(['\n', '\r']).filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_env(name: &str, value: &str) -> Option<ActionCommand> {
        Some(ActionCommand::SetEnv {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    #[test]
    fn parse_set_env_simple() {
        assert_eq!(
            ActionCommand::try_parse_set_env("::set-env name=GREETING::hi"),
            set_env("GREETING", "hi")
        );
    }

    #[test]
    fn parse_set_env_mid_line_and_extra_whitespace() {
        assert_eq!(
            ActionCommand::try_parse_set_env("log: ::set-env \t name=A::b c"),
            set_env("A", "b c")
        );
    }

    #[test]
    fn parse_set_env_value_runs_to_end_of_line() {
        assert_eq!(
            ActionCommand::try_parse_set_env("::set-env name=URL::http://x::y"),
            set_env("URL", "http://x::y")
        );
    }

    #[test]
    fn parse_set_env_rejects_malformed() {
        assert_eq!(ActionCommand::try_parse_set_env("::set-envname=A::b"), None);
        assert_eq!(ActionCommand::try_parse_set_env("::set-env name=::b"), None);
        assert_eq!(ActionCommand::try_parse_set_env("::set-env name=A::"), None);
        assert_eq!(ActionCommand::try_parse_set_env("::set-env name=A"), None);
        assert_eq!(ActionCommand::try_parse_set_env("::set-output name=A::b"), None);
    }

    #[test]
    fn parse_set_env_skips_to_later_well_formed_occurrence() {
        assert_eq!(
            ActionCommand::try_parse_set_env("::set-env broken ::set-env name=B::2"),
            set_env("B", "2")
        );
    }

    #[test]
    fn parse_add_path() {
        assert_eq!(
            ActionCommand::try_parse_add_path("::add-path::/opt/tool"),
            Some(ActionCommand::AddPath {
                path: "/opt/tool".to_string()
            })
        );
        assert_eq!(ActionCommand::try_parse_add_path("::add-path::"), None);
        assert_eq!(ActionCommand::try_parse_add_path("add-path::/x"), None);
    }

    #[test]
    fn lines_split_on_cr_and_lf() {
        let lines: Vec<&str> = command_lines("a\r\nb\nc").collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn bare_carriage_return_ends_a_value() {
        let commands: Vec<_> = command_lines("::set-env name=A::x\ry\n")
            .filter_map(ActionCommand::try_parse_set_env)
            .collect();
        assert_eq!(commands, vec![set_env("A", "x").unwrap()]);
    }
}
