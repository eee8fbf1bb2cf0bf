/// A conversation command recognized by every ingest producer. Commands
/// act on the conversation itself and never reach a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Models,
    Use(String),
    Clear,
}

impl Command {
    /// Parses `text` as a command. Only the whole trimmed message counts;
    /// a command word inside a longer sentence goes to the model like any
    /// other text. An empty message reads as a help request.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        match lower.as_str() {
            "" | "help" => Some(Self::Help),
            "models" => Some(Self::Models),
            "clear" => Some(Self::Clear),
            _ => lower
                .strip_prefix("use ")
                .map(|alias| Self::Use(alias.trim().to_string())),
        }
    }
}
