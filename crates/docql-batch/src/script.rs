//! Renders a command batch into one begin/commit-framed script

use docql_core::settings::TransactionSettings;

/// Builds the line-oriented script submitted to the engine:
///
/// ```text
/// BEGIN
/// <command 1>
/// <command 2>
/// COMMIT
/// ```
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    begin_marker: String,
    commit_marker: String,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::from_settings(&TransactionSettings::default())
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &TransactionSettings) -> Self {
        Self {
            begin_marker: settings.begin_marker.clone(),
            commit_marker: settings.commit_marker.clone(),
        }
    }

    pub fn with_begin_marker(mut self, marker: impl Into<String>) -> Self {
        self.begin_marker = marker.into();
        self
    }

    pub fn with_commit_marker(mut self, marker: impl Into<String>) -> Self {
        self.commit_marker = marker.into();
        self
    }

    /// Render the commands, one per line, between the two markers
    pub fn build<S: AsRef<str>>(&self, commands: &[S]) -> String {
        let capacity = self.begin_marker.len()
            + self.commit_marker.len()
            + commands.iter().map(|c| c.as_ref().len() + 1).sum::<usize>()
            + 2;
        let mut script = String::with_capacity(capacity);

        script.push_str(&self.begin_marker);
        script.push('\n');
        for command in commands {
            script.push_str(&normalize_line_breaks(command.as_ref()));
            script.push('\n');
        }
        script.push_str(&self.commit_marker);
        script.push('\n');
        script
    }
}

/// Replace every line break (`\r\n`, `\n`, `\r`) with a single space
pub fn normalize_line_breaks(command: &str) -> String {
    command.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
