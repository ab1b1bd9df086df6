use super::model::{Ending, NodeKind, Story};

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self {
        ValidationError {
            message: msg.into(),
        }
    }
}

/// Referential-integrity checks over a built story. Runs as part of
/// loading but is also callable on its own for authoring tools.
pub fn validate_story(story: &Story) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = Vec::new();

    if story.nodes.is_empty() {
        errors.push(ValidationError::new("story has no nodes"));
    }

    if !story.nodes.contains_key(&story.start) {
        errors.push(ValidationError::new(format!(
            "start node '{}' not found among nodes",
            story.start
        )));
    }

    for (node_id, node) in &story.nodes {
        match &node.kind {
            NodeKind::Branch(branch) => {
                if branch.choices.is_empty() {
                    errors.push(ValidationError::new(format!(
                        "branch node '{}' has no choices",
                        node_id
                    )));
                }
                for choice in &branch.choices {
                    if choice.label.trim().is_empty() {
                        errors.push(ValidationError::new(format!(
                            "branch node '{}' has a choice with an empty label",
                            node_id
                        )));
                    }
                    if !story.nodes.contains_key(&choice.target) {
                        errors.push(ValidationError::new(format!(
                            "node '{}' choice '{}' targets missing node '{}'",
                            node_id, choice.label, choice.target
                        )));
                    }
                }
            }
            NodeKind::Passage { next } => {
                if !story.nodes.contains_key(next) {
                    errors.push(ValidationError::new(format!(
                        "passage node '{}' continues to missing node '{}'",
                        node_id, next
                    )));
                }
                // Follow the chain: passages must reach a prompting node or
                // an ending, or the session would walk them forever.
                let mut seen = vec![node_id.as_str()];
                let mut current = next.as_str();
                loop {
                    if seen.contains(&current) {
                        errors.push(ValidationError::new(format!(
                            "passage node '{}' leads into a passage cycle",
                            node_id
                        )));
                        break;
                    }
                    seen.push(current);
                    match story.nodes.get(current) {
                        Some(node) => match &node.kind {
                            NodeKind::Passage { next } => current = next,
                            _ => break,
                        },
                        None => break,
                    }
                }
            }
            NodeKind::SelectionPuzzle(sp) => {
                if !story.nodes.contains_key(&sp.on_solved) {
                    errors.push(ValidationError::new(format!(
                        "puzzle node '{}' on_solved targets missing node '{}'",
                        node_id, sp.on_solved
                    )));
                }
                if sp.options.len() < 2 {
                    errors.push(ValidationError::new(format!(
                        "selection puzzle '{}' needs at least two options",
                        node_id
                    )));
                }
                let answer = sp.puzzle.answer.trim().to_uppercase();
                if !sp
                    .options
                    .iter()
                    .any(|o| o.trim().to_uppercase() == answer)
                {
                    errors.push(ValidationError::new(format!(
                        "selection puzzle '{}' does not list its answer among its options",
                        node_id
                    )));
                }
            }
            NodeKind::TextPuzzle(tp) => {
                if !story.nodes.contains_key(&tp.on_solved) {
                    errors.push(ValidationError::new(format!(
                        "puzzle node '{}' on_solved targets missing node '{}'",
                        node_id, tp.on_solved
                    )));
                }
            }
            NodeKind::Ending(Ending::Success { bonus, .. }) => {
                if *bonus == 0 {
                    errors.push(ValidationError::new(format!(
                        "success ending '{}' awards no score bonus",
                        node_id
                    )));
                }
            }
            NodeKind::Ending(Ending::Failure) => {}
        }

        if let Some(item) = &node.grant {
            if item.trim().is_empty() {
                errors.push(ValidationError::new(format!(
                    "node '{}' grants an item with an empty name",
                    node_id
                )));
            }
        }
    }

    errors
}
