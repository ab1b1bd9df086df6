mod loader;
mod model;
mod validator;

pub use loader::{StoryError, load_story_from_file, load_story_from_str};

// Minimal, intentional surface area: re-export only what the engine uses.
pub use model::{
    Branch, Choice, Ending, Node, NodeKind, PuzzleDef, ReplayStyle, SelectionPuzzle, Story,
    TextPuzzle,
};
pub use validator::{ValidationError, validate_story};
