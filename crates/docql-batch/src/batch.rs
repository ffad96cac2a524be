//! Ordered, append-only list of accepted commands

/// Commands accepted for one open transaction, in submission order
#[derive(Debug, Clone, Default)]
pub struct CommandBatch {
    commands: Vec<String>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command. Blank text is ignored and returns `false`.
    pub fn push(&mut self, command: &str) -> bool {
        if command.trim().is_empty() {
            return false;
        }
        self.commands.push(command.to_string());
        true
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Total bytes of command text held
    pub fn text_len(&self) -> usize {
        self.commands.iter().map(String::len).sum()
    }
}
