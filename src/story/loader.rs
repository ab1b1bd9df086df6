use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::model::{
    Branch, Choice, Ending, Node, NodeKind, PuzzleDef, ReplayStyle, SelectionPuzzle, Story,
    TextPuzzle,
};
use super::validator::validate_story;

/// Errors produced while loading a story file.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("failed to read story file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse story TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid story: {0}")]
    Invalid(String),
}

////////////////////
/// TOML STRUCTS ///
////////////////////

#[derive(Deserialize)]
struct StoryFile {
    story: StoryHeader,
    #[serde(default)]
    node: Vec<NodeConfig>, // [[node]] blocks
}

#[derive(Deserialize)]
struct StoryHeader {
    id: String,
    title: String,
    start: String,
    #[serde(default)]
    desc: String,
}

#[derive(Deserialize)]
struct NodeConfig {
    id: String,

    #[serde(default)]
    pages: Vec<String>,

    /// Item awarded when the node is entered.
    #[serde(default)]
    grant: Option<String>,

    // Branch fields
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    choice: Vec<ChoiceConfig>, // [[node.choice]]
    #[serde(default)]
    allow_back: Option<bool>,

    // Passage field
    #[serde(default)]
    next: Option<String>,

    // Puzzle sub-table
    #[serde(default)]
    puzzle: Option<PuzzleConfig>,

    // Ending fields: ending = "success" | "failure"
    #[serde(default)]
    ending: Option<String>,
    #[serde(default)]
    bonus: Option<u32>,
    #[serde(default)]
    replay: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceConfig {
    label: String,
    target: String,
}

#[derive(Deserialize)]
struct PuzzleConfig {
    prompt: String,
    answer: String,
    retry: String,
    failure: String,
    on_solved: String,

    /// Present on selection puzzles only.
    #[serde(default)]
    options: Vec<String>,

    /// Present on text puzzles only.
    #[serde(default)]
    hint: Option<String>,
}

//////////////////////
/// LOADER ENTRIES ///
//////////////////////

pub fn load_story_from_file(path: &Path) -> Result<Story, StoryError> {
    let contents = fs::read_to_string(path)?;
    load_story_from_str(&contents)
}

pub fn load_story_from_str(contents: &str) -> Result<Story, StoryError> {
    let story_file: StoryFile = toml::from_str(contents)?;

    if story_file.story.id.trim().is_empty() {
        return Err(StoryError::Invalid("story.id may not be empty".into()));
    }
    if story_file.story.start.trim().is_empty() {
        return Err(StoryError::Invalid("story.start may not be empty".into()));
    }

    let mut nodes: HashMap<String, Node> = HashMap::new();

    for node_cfg in story_file.node {
        if nodes.contains_key(&node_cfg.id) {
            return Err(StoryError::Invalid(format!(
                "Duplicate node id: {}",
                node_cfg.id
            )));
        }

        let node = build_node(node_cfg)?;
        nodes.insert(node.id.clone(), node);
    }

    let story = Story {
        id: story_file.story.id,
        title: story_file.story.title,
        desc: normalize_multiline_desc(&story_file.story.desc),
        start: story_file.story.start,
        nodes,
    };

    let errors = validate_story(&story);
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<&str>>()
            .join("; ");
        return Err(StoryError::Invalid(joined));
    }

    Ok(story)
}

/// Decides the node kind from which optional fields are present. Exactly
/// one kind's fields may be used per node.
fn build_node(cfg: NodeConfig) -> Result<Node, StoryError> {
    let has_choices = !cfg.choice.is_empty();
    let has_next = cfg.next.is_some();
    let has_puzzle = cfg.puzzle.is_some();
    let has_ending = cfg.ending.is_some();

    let kind_count = [has_choices, has_next, has_puzzle, has_ending]
        .iter()
        .filter(|present| **present)
        .count();
    if kind_count != 1 {
        return Err(StoryError::Invalid(format!(
            "node '{}' must have exactly one of: choices, next, puzzle, ending",
            cfg.id
        )));
    }

    let kind = if has_choices {
        let text = cfg.text.as_deref().unwrap_or("");
        if text.trim().is_empty() {
            return Err(StoryError::Invalid(format!(
                "branch node '{}' has no scene text",
                cfg.id
            )));
        }
        NodeKind::Branch(Branch {
            text: normalize_multiline_desc(text),
            choices: cfg
                .choice
                .into_iter()
                .map(|c| Choice {
                    label: c.label,
                    target: c.target,
                })
                .collect(),
            allow_back: cfg.allow_back.unwrap_or(true),
        })
    } else if let Some(next) = cfg.next {
        NodeKind::Passage { next }
    } else if let Some(puzzle_cfg) = cfg.puzzle {
        build_puzzle_kind(&cfg.id, puzzle_cfg)?
    } else {
        build_ending_kind(&cfg.id, &cfg.ending.unwrap_or_default(), cfg.bonus, cfg.replay)?
    };

    Ok(Node {
        id: cfg.id,
        pages: cfg
            .pages
            .iter()
            .map(|p| normalize_multiline_desc(p))
            .collect(),
        grant: cfg.grant,
        kind,
    })
}

fn build_puzzle_kind(node_id: &str, cfg: PuzzleConfig) -> Result<NodeKind, StoryError> {
    if cfg.answer.trim().is_empty() {
        return Err(StoryError::Invalid(format!(
            "puzzle node '{}' has an empty answer",
            node_id
        )));
    }

    let def = PuzzleDef {
        prompt: normalize_multiline_desc(&cfg.prompt),
        answer: cfg.answer,
        retry_text: normalize_multiline_desc(&cfg.retry),
        failure_text: normalize_multiline_desc(&cfg.failure),
    };

    if cfg.options.is_empty() {
        Ok(NodeKind::TextPuzzle(TextPuzzle {
            puzzle: def,
            hint: cfg.hint.unwrap_or_default(),
            on_solved: cfg.on_solved,
        }))
    } else {
        if cfg.hint.is_some() {
            return Err(StoryError::Invalid(format!(
                "puzzle node '{}' mixes options with a hint",
                node_id
            )));
        }
        Ok(NodeKind::SelectionPuzzle(SelectionPuzzle {
            puzzle: def,
            options: cfg.options,
            on_solved: cfg.on_solved,
        }))
    }
}

fn build_ending_kind(
    node_id: &str,
    ending: &str,
    bonus: Option<u32>,
    replay: Option<String>,
) -> Result<NodeKind, StoryError> {
    match ending {
        "failure" => {
            if bonus.is_some() || replay.is_some() {
                return Err(StoryError::Invalid(format!(
                    "failure ending '{}' may not carry a bonus or replay style",
                    node_id
                )));
            }
            Ok(NodeKind::Ending(Ending::Failure))
        }
        "success" => {
            let replay = match replay.as_deref() {
                None | Some("manager") => ReplayStyle::Manager,
                Some("direct") => ReplayStyle::Direct,
                Some(other) => {
                    return Err(StoryError::Invalid(format!(
                        "success ending '{}' has unknown replay style '{}'",
                        node_id, other
                    )));
                }
            };
            Ok(NodeKind::Ending(Ending::Success {
                bonus: bonus.unwrap_or(0),
                replay,
            }))
        }
        other => Err(StoryError::Invalid(format!(
            "node '{}' has unknown ending kind '{}'",
            node_id, other
        ))),
    }
}

fn normalize_multiline_desc(raw: &str) -> String {
    let mut result = String::new();
    let mut pending_blank_lines = 0usize;
    let mut first_text_seen = false;

    for line in raw.lines() {
        // Strip *all* leading/trailing whitespace so indentation in TOML
        // doesn't affect what the player sees.
        let trimmed = line.trim();

        let is_blank = trimmed.is_empty();

        if is_blank {
            pending_blank_lines += 1;
            continue;
        }

        if !first_text_seen {
            result.push_str(trimmed);
            first_text_seen = true;
        } else {
            match pending_blank_lines {
                0 => {
                    // Wrapped line: single newline in TOML → space in output
                    result.push(' ');
                    result.push_str(trimmed);
                }
                1 => {
                    // One blank line → one visible newline
                    result.push('\n');
                    result.push_str(trimmed);
                }
                _ => {
                    // Two or more blank lines → paragraph break
                    result.push_str("\n\n");
                    result.push_str(trimmed);
                }
            }
        }

        pending_blank_lines = 0;
    }

    result
}
