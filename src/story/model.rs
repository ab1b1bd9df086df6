use std::collections::HashMap;

///////////////////////////////
/// STORY STRUCTS AND ENUMS ///
///////////////////////////////

/// Runtime story type used by the session loop.
#[derive(Clone, Debug)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub desc: String,
    pub start: String,
    pub nodes: HashMap<String, Node>,
}

/// A single beat of the story. Every node may emit narrative pages and
/// award an inventory item on entry; what happens afterwards depends on
/// its kind.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub pages: Vec<String>,
    pub grant: Option<String>,
    pub kind: NodeKind,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Branch(Branch),
    Passage { next: String },
    SelectionPuzzle(SelectionPuzzle),
    TextPuzzle(TextPuzzle),
    Ending(Ending),
}

/// A scene with mutually exclusive player choices.
#[derive(Clone, Debug)]
pub struct Branch {
    pub text: String,
    pub choices: Vec<Choice>,
    pub allow_back: bool,
}

#[derive(Clone, Debug)]
pub struct Choice {
    pub label: String,
    pub target: String,
}

/// Shared puzzle fields: the question, the expected answer (compared
/// trimmed and case-insensitively), and the two feedback messages.
#[derive(Clone, Debug)]
pub struct PuzzleDef {
    pub prompt: String,
    pub answer: String,
    pub retry_text: String,
    pub failure_text: String,
}

/// Puzzle answered by picking one of a fixed list of options.
#[derive(Clone, Debug)]
pub struct SelectionPuzzle {
    pub puzzle: PuzzleDef,
    pub options: Vec<String>,
    pub on_solved: String,
}

/// Puzzle answered with typed text; the player may ask for the hint.
#[derive(Clone, Debug)]
pub struct TextPuzzle {
    pub puzzle: PuzzleDef,
    pub hint: String,
    pub on_solved: String,
}

#[derive(Clone, Debug)]
pub enum Ending {
    Success { bonus: u32, replay: ReplayStyle },
    Failure,
}

/// How a success ending offers the replay question.
///
/// `Manager` endings hand control back to the session manager, which
/// clears the inventory before asking. `Direct` endings ask their own
/// question and leave the inventory untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayStyle {
    Manager,
    Direct,
}
