use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutputBlock {
    /// A narrative paragraph or feedback line.
    Text(String),
    /// A progress notification, e.g. an item joining the inventory.
    Event(String),
}

/// Buffered output for one turn. The engine never prints; the front-end
/// decides how blocks are rendered.
#[derive(Default, Debug, Clone)]
pub struct Output {
    pub blocks: Vec<OutputBlock>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&mut self, s: impl Into<String>) {
        let s = s.into();
        if !s.trim().is_empty() {
            self.blocks.push(OutputBlock::Text(s));
        }
    }

    pub fn event(&mut self, s: impl Into<String>) {
        let s = s.into();
        if !s.trim().is_empty() {
            self.blocks.push(OutputBlock::Event(s));
        }
    }

    /// All lines joined with newlines. Handy for assertions in tests.
    pub fn flattened(&self) -> String {
        self.blocks
            .iter()
            .map(|b| match b {
                OutputBlock::Text(s) | OutputBlock::Event(s) => s.as_str(),
            })
            .collect::<Vec<&str>>()
            .join("\n")
    }
}
