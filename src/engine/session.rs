use serde::Serialize;

use super::output::Output;
use super::player::Player;
use super::puzzle::{AttemptTracker, Graded, Outcome};
use crate::story::{Branch, Ending, Node, NodeKind, ReplayStyle, SelectionPuzzle, Story};

/// Fixed request line shown at every free-text puzzle prompt.
pub const ANSWER_REQUEST: &str = "Enter your answer (or type 'HINT' for a clue):";

const MANAGER_REPLAY_QUESTION: &str = "Would you like to play again?";
const DIRECT_REPLAY_QUESTION: &str =
    "Would you like to play again to discover the other endings?";

/// What the session needs from the player next. `None` in a [`Turn`]
/// means the session has ended and the front-end may shut down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Prompt {
    /// Pick one option by index.
    Choice { text: String, options: Vec<String> },
    /// Type an answer.
    Answer { text: String },
    /// Yes or no.
    Confirm { text: String },
}

/// The player's response to the pending prompt. `Cancelled` is a valid
/// reply to every prompt; it is how backing out of a dialog reaches the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Choice(usize),
    Text(String),
    Yes,
    No,
    Cancelled,
}

/// One synchronous engine step: everything to show, then what to ask.
#[derive(Debug)]
pub struct Turn {
    pub output: Output,
    pub prompt: Option<Prompt>,
}

/// Where the session is paused, as an explicit value rather than a call
/// stack. Node positions are story node ids.
#[derive(Debug, Clone)]
enum Phase {
    Idle,
    AwaitingChoice { node: String },
    PuzzleSelect { node: String, tracker: AttemptTracker },
    PuzzleText { node: String, tracker: AttemptTracker },
    AwaitingReplay { style: ReplayStyle },
    Ended,
}

/// One player's run of a story: owns the player, counts playthroughs,
/// and drives node transitions. Score and the playthrough counter
/// persist across restarts; the inventory is cleared by manager-style
/// replay only.
pub struct Session {
    story: Story,
    player: Player,
    attempts: u32,
    phase: Phase,
}

impl Session {
    pub fn new(story: Story, player_name: &str) -> Self {
        Session {
            story,
            player: Player::new(player_name),
            attempts: 0,
            phase: Phase::Idle,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Number of playthroughs started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// Begins the first playthrough. Later playthroughs start through the
    /// replay question, not through this method.
    pub fn start(&mut self) -> Turn {
        let mut out = Output::new();
        let prompt = self.begin_run(&mut out);
        Turn {
            output: out,
            prompt,
        }
    }

    /// Feeds one reply into the state machine and advances until the next
    /// input is needed or the session ends.
    pub fn step(&mut self, reply: Reply) -> Turn {
        let mut out = Output::new();
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let prompt = match phase {
            Phase::Idle | Phase::Ended => {
                self.phase = Phase::Ended;
                None
            }
            Phase::AwaitingChoice { node } => self.step_choice(node, reply, &mut out),
            Phase::PuzzleSelect { node, tracker } => {
                self.step_puzzle_select(node, tracker, reply, &mut out)
            }
            Phase::PuzzleText { node, tracker } => {
                self.step_puzzle_text(node, tracker, reply, &mut out)
            }
            Phase::AwaitingReplay { style } => self.step_replay(style, reply, &mut out),
        };
        Turn {
            output: out,
            prompt,
        }
    }

    fn begin_run(&mut self, out: &mut Output) -> Option<Prompt> {
        self.attempts += 1;
        let start = self.story.start.clone();
        self.enter_node(&start, out)
    }

    /// Walks forward from `id`, applying grants and emitting pages, until
    /// a node demands input or the run terminates. Passage nodes chain
    /// without pausing.
    fn enter_node(&mut self, id: &str, out: &mut Output) -> Option<Prompt> {
        let mut current = id.to_string();
        loop {
            let Some(node) = self.story.nodes.get(&current).cloned() else {
                // Unreachable for validated stories.
                out.say(format!("Error: unknown story node '{}'.", current));
                self.phase = Phase::Ended;
                return None;
            };

            self.apply_grant(&node, out);
            for page in &node.pages {
                out.say(self.fill(page));
            }

            match node.kind {
                NodeKind::Branch(branch) => {
                    let prompt = self.branch_prompt(&branch);
                    self.phase = Phase::AwaitingChoice { node: current };
                    return Some(prompt);
                }
                NodeKind::Passage { next } => {
                    current = next;
                }
                NodeKind::SelectionPuzzle(sp) => {
                    let prompt = self.selection_prompt(&sp);
                    self.phase = Phase::PuzzleSelect {
                        node: current,
                        tracker: AttemptTracker::new(),
                    };
                    return Some(prompt);
                }
                NodeKind::TextPuzzle(tp) => {
                    out.say(self.fill(&tp.puzzle.prompt));
                    self.phase = Phase::PuzzleText {
                        node: current,
                        tracker: AttemptTracker::new(),
                    };
                    return Some(Self::answer_prompt());
                }
                NodeKind::Ending(Ending::Failure) => {
                    return self.offer_replay(ReplayStyle::Manager);
                }
                NodeKind::Ending(Ending::Success { bonus, replay }) => {
                    self.player.increase_score(bonus);
                    return self.offer_replay(replay);
                }
            }
        }
    }

    fn apply_grant(&mut self, node: &Node, out: &mut Output) {
        let Some(item) = &node.grant else {
            return;
        };
        // Duplicate adds are silent: no notification either.
        if self.player.add_item(item) {
            out.event(format!("{} added to your collected objects!", item));
            out.event(format!(
                "Current items: {}",
                self.player.inventory().join(", ")
            ));
        }
    }

    fn step_choice(&mut self, node_id: String, reply: Reply, out: &mut Output) -> Option<Prompt> {
        let Some(NodeKind::Branch(branch)) = self.node_kind(&node_id) else {
            return self.corrupt_phase(&node_id, out);
        };

        match reply {
            Reply::Choice(index) => {
                if let Some(choice) = branch.choices.get(index) {
                    out.say(format!("You chose: {}", choice.label));
                    let target = choice.target.clone();
                    self.enter_node(&target, out)
                } else {
                    // Defensive: unreachable through the shipped front-end.
                    out.say("Invalid choice");
                    self.reprompt_choice(node_id, &branch)
                }
            }
            Reply::Cancelled => {
                if branch.allow_back {
                    out.say("Dialog canceled. Returning to previous scene.");
                    self.offer_replay(ReplayStyle::Manager)
                } else {
                    out.say("Dialog canceled. Game will continue.");
                    self.reprompt_choice(node_id, &branch)
                }
            }
            _ => self.reprompt_choice(node_id, &branch),
        }
    }

    fn step_puzzle_select(
        &mut self,
        node_id: String,
        mut tracker: AttemptTracker,
        reply: Reply,
        out: &mut Output,
    ) -> Option<Prompt> {
        let Some(NodeKind::SelectionPuzzle(sp)) = self.node_kind(&node_id) else {
            return self.corrupt_phase(&node_id, out);
        };

        match reply {
            Reply::Choice(index) if index < sp.options.len() => {
                match tracker.grade(&sp.options[index], &sp.puzzle.answer) {
                    Graded::Solved => self.resolve_puzzle(Outcome::Solved, &sp.on_solved, out),
                    Graded::Retry => {
                        out.say(self.fill(&sp.puzzle.retry_text));
                        let prompt = self.selection_prompt(&sp);
                        self.phase = Phase::PuzzleSelect {
                            node: node_id,
                            tracker,
                        };
                        Some(prompt)
                    }
                    Graded::Failed => {
                        out.say(self.fill(&sp.puzzle.failure_text));
                        self.resolve_puzzle(Outcome::Failed, &sp.on_solved, out)
                    }
                }
            }
            Reply::Cancelled => {
                // Backing out costs nothing and shows no failure text.
                out.say("Puzzle canceled. Returning to game.");
                self.resolve_puzzle(Outcome::Cancelled, &sp.on_solved, out)
            }
            _ => {
                let prompt = self.selection_prompt(&sp);
                self.phase = Phase::PuzzleSelect {
                    node: node_id,
                    tracker,
                };
                Some(prompt)
            }
        }
    }

    fn step_puzzle_text(
        &mut self,
        node_id: String,
        mut tracker: AttemptTracker,
        reply: Reply,
        out: &mut Output,
    ) -> Option<Prompt> {
        let Some(NodeKind::TextPuzzle(tp)) = self.node_kind(&node_id) else {
            return self.corrupt_phase(&node_id, out);
        };

        let reprompt = |session: &mut Self, tracker: AttemptTracker| {
            session.phase = Phase::PuzzleText {
                node: node_id.clone(),
                tracker,
            };
            Some(Self::answer_prompt())
        };

        match reply {
            Reply::Text(text) => {
                let submitted = text.trim();
                if submitted.is_empty() {
                    // Not an attempt, just a re-prompt.
                    out.say("You didn't enter an answer. Try again.");
                    return reprompt(self, tracker);
                }
                if submitted.eq_ignore_ascii_case("HINT") {
                    out.say(format!("Hint: {}", tp.hint));
                    return reprompt(self, tracker);
                }
                match tracker.grade(submitted, &tp.puzzle.answer) {
                    Graded::Solved => self.resolve_puzzle(Outcome::Solved, &tp.on_solved, out),
                    Graded::Retry => {
                        out.say(self.fill(&tp.puzzle.retry_text));
                        reprompt(self, tracker)
                    }
                    Graded::Failed => {
                        out.say(self.fill(&tp.puzzle.failure_text));
                        self.resolve_puzzle(Outcome::Failed, &tp.on_solved, out)
                    }
                }
            }
            Reply::Cancelled => {
                out.say("Input canceled. Returning to game.");
                self.resolve_puzzle(Outcome::Cancelled, &tp.on_solved, out)
            }
            _ => reprompt(self, tracker),
        }
    }

    fn step_replay(
        &mut self,
        style: ReplayStyle,
        reply: Reply,
        out: &mut Output,
    ) -> Option<Prompt> {
        match reply {
            Reply::Yes => self.begin_run(out),
            Reply::No | Reply::Cancelled => {
                out.say(format!(
                    "Thank you for playing {}, {}\nYou played the game: {} time(s).",
                    self.story.title,
                    self.player.describe(),
                    self.attempts
                ));
                self.phase = Phase::Ended;
                None
            }
            _ => {
                let prompt = Self::replay_prompt(style);
                self.phase = Phase::AwaitingReplay { style };
                Some(prompt)
            }
        }
    }

    /// Routes a finished puzzle. Failure and cancellation both restart
    /// the session; the tags stay separate so that can diverge later.
    fn resolve_puzzle(
        &mut self,
        outcome: Outcome,
        on_solved: &str,
        out: &mut Output,
    ) -> Option<Prompt> {
        match outcome {
            Outcome::Solved => self.enter_node(on_solved, out),
            Outcome::Failed | Outcome::Cancelled => self.offer_replay(ReplayStyle::Manager),
        }
    }

    fn offer_replay(&mut self, style: ReplayStyle) -> Option<Prompt> {
        if style == ReplayStyle::Manager {
            // Cleared before asking, so a declined replay reports an
            // empty collection.
            self.player.clear_inventory();
        }
        let prompt = Self::replay_prompt(style);
        self.phase = Phase::AwaitingReplay { style };
        Some(prompt)
    }

    fn branch_prompt(&self, branch: &Branch) -> Prompt {
        Prompt::Choice {
            text: self.fill(&branch.text),
            options: branch.choices.iter().map(|c| c.label.clone()).collect(),
        }
    }

    fn selection_prompt(&self, sp: &SelectionPuzzle) -> Prompt {
        Prompt::Choice {
            text: self.fill(&sp.puzzle.prompt),
            options: sp.options.clone(),
        }
    }

    fn answer_prompt() -> Prompt {
        Prompt::Answer {
            text: ANSWER_REQUEST.to_string(),
        }
    }

    fn replay_prompt(style: ReplayStyle) -> Prompt {
        let text = match style {
            ReplayStyle::Manager => MANAGER_REPLAY_QUESTION,
            ReplayStyle::Direct => DIRECT_REPLAY_QUESTION,
        };
        Prompt::Confirm {
            text: text.to_string(),
        }
    }

    fn reprompt_choice(&mut self, node_id: String, branch: &Branch) -> Option<Prompt> {
        let prompt = self.branch_prompt(branch);
        self.phase = Phase::AwaitingChoice { node: node_id };
        Some(prompt)
    }

    fn node_kind(&self, id: &str) -> Option<NodeKind> {
        self.story.nodes.get(id).map(|n| n.kind.clone())
    }

    fn corrupt_phase(&mut self, node_id: &str, out: &mut Output) -> Option<Prompt> {
        out.say(format!(
            "Error: session paused at unknown or mismatched node '{}'.",
            node_id
        ));
        self.phase = Phase::Ended;
        None
    }

    fn fill(&self, text: &str) -> String {
        text.replace("{player}", self.player.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::load_story_from_str;

    const STORY: &str = r#"
        [story]
        id = "t"
        title = "Test Manor"
        start = "gate"

        [[node]]
        id = "gate"
        pages = ["You stand at a gate."]
        text = "Which way, {player}?"
        [[node.choice]]
        label = "Take the key"
        target = "key_room"
        [[node.choice]]
        label = "Face the riddle"
        target = "riddle"
        [[node.choice]]
        label = "Walk away"
        target = "walk_away"
        [[node.choice]]
        label = "Read the carving"
        target = "word"
        [[node.choice]]
        label = "Slip through the hedge"
        target = "secret_end"

        [[node]]
        id = "key_room"
        grant = "Red Key"
        text = "A key glints on the floor."
        [[node.choice]]
        label = "Pocket it and leave"
        target = "good_end"

        [[node]]
        id = "riddle"
        [node.puzzle]
        prompt = "What am I?"
        answer = "A. Your shadow"
        retry = "Wrong answer, try again!"
        failure = "You fail and are trapped."
        options = ["A. Your shadow", "B. A ghost", "C. The wind"]
        on_solved = "good_end"

        [[node]]
        id = "word"
        [node.puzzle]
        prompt = "Unscramble U N A H T E D."
        answer = "HAUNTED"
        retry = "Try again!"
        failure = "The shadows deepen."
        hint = "Rearrange the letters for something spooky."
        on_solved = "good_end"

        [[node]]
        id = "walk_away"
        pages = ["The gate closes behind you."]
        ending = "failure"

        [[node]]
        id = "good_end"
        pages = ["You escape, {player}."]
        ending = "success"
        bonus = 50

        [[node]]
        id = "secret_end"
        grant = "Hedge Charm"
        pages = ["A second way out."]
        ending = "success"
        bonus = 75
        replay = "direct"
    "#;

    fn session() -> Session {
        let story = load_story_from_str(STORY).unwrap();
        Session::new(story, "Mina")
    }

    fn expect_choice(turn: &Turn) -> (&str, &[String]) {
        match turn.prompt.as_ref().expect("session ended early") {
            Prompt::Choice { text, options } => (text.as_str(), options.as_slice()),
            other => panic!("expected choice prompt, got {:?}", other),
        }
    }

    fn expect_confirm(turn: &Turn) -> &str {
        match turn.prompt.as_ref().expect("session ended early") {
            Prompt::Confirm { text } => text.as_str(),
            other => panic!("expected confirm prompt, got {:?}", other),
        }
    }

    #[test]
    fn start_enters_the_start_node() {
        let mut session = session();
        let turn = session.start();
        assert_eq!(session.attempts(), 1);
        let (text, options) = expect_choice(&turn);
        assert_eq!(text, "Which way, Mina?");
        assert_eq!(options.len(), 5);
        assert!(turn.output.flattened().contains("You stand at a gate."));
    }

    #[test]
    fn choice_transitions_and_grants_item() {
        let mut session = session();
        session.start();
        let turn = session.step(Reply::Choice(0));
        let flat = turn.output.flattened();
        assert!(flat.contains("You chose: Take the key"));
        assert!(flat.contains("Red Key added to your collected objects!"));
        assert!(flat.contains("Current items: Red Key"));
        assert_eq!(session.player().inventory(), ["Red Key".to_string()]);
    }

    #[test]
    fn out_of_range_choice_reports_sentinel_and_reprompts() {
        let mut session = session();
        session.start();
        let turn = session.step(Reply::Choice(9));
        assert!(turn.output.flattened().contains("Invalid choice"));
        let (text, _) = expect_choice(&turn);
        assert_eq!(text, "Which way, Mina?");
    }

    #[test]
    fn cancelling_a_scene_offers_manager_replay() {
        let mut session = session();
        session.start();
        session.player.add_item("Red Key");
        let turn = session.step(Reply::Cancelled);
        assert!(
            turn.output
                .flattened()
                .contains("Dialog canceled. Returning to previous scene.")
        );
        assert_eq!(expect_confirm(&turn), "Would you like to play again?");
        // Manager replay clears the inventory before asking.
        assert!(session.player().inventory().is_empty());
    }

    #[test]
    fn selection_puzzle_solves_and_awards_bonus() {
        let mut session = session();
        session.start();
        let turn = session.step(Reply::Choice(1)); // Face the riddle
        let (text, options) = expect_choice(&turn);
        assert_eq!(text, "What am I?");
        assert_eq!(options.len(), 3);

        let turn = session.step(Reply::Choice(0));
        assert!(turn.output.flattened().contains("You escape, Mina."));
        assert_eq!(session.player().score(), 50);
        expect_confirm(&turn);
    }

    #[test]
    fn selection_puzzle_exhausts_attempts_with_one_failure_message() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(1));

        let turn = session.step(Reply::Choice(2));
        assert!(turn.output.flattened().contains("Wrong answer, try again!"));
        let turn = session.step(Reply::Choice(2));
        assert!(turn.output.flattened().contains("Wrong answer, try again!"));
        let turn = session.step(Reply::Choice(2));
        let flat = turn.output.flattened();
        assert_eq!(flat.matches("You fail and are trapped.").count(), 1);
        assert!(!flat.contains("Wrong answer, try again!"));
        assert_eq!(expect_confirm(&turn), "Would you like to play again?");
        assert_eq!(session.player().score(), 0);
    }

    #[test]
    fn cancelling_a_selection_puzzle_skips_the_failure_message() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(1));
        let turn = session.step(Reply::Cancelled);
        let flat = turn.output.flattened();
        assert!(flat.contains("Puzzle canceled. Returning to game."));
        assert!(!flat.contains("You fail and are trapped."));
        expect_confirm(&turn);
    }

    #[test]
    fn replay_yes_restarts_and_preserves_score() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(1));
        session.step(Reply::Choice(0)); // solved, +50, replay prompt
        let turn = session.step(Reply::Yes);
        assert_eq!(session.attempts(), 2);
        assert_eq!(session.player().score(), 50);
        let (text, _) = expect_choice(&turn);
        assert_eq!(text, "Which way, Mina?");
    }

    #[test]
    fn replay_decline_prints_summary_and_ends() {
        let mut session = session();
        session.start();
        let turn = session.step(Reply::Choice(2)); // Walk away -> failure ending
        assert!(turn.output.flattened().contains("The gate closes behind you."));
        let turn = session.step(Reply::No);
        let flat = turn.output.flattened();
        assert!(flat.contains("Thank you for playing Test Manor, Mina!"));
        assert!(flat.contains("Final score: 0"));
        assert!(flat.contains("You played the game: 1 time(s)."));
        assert!(turn.prompt.is_none());
        assert!(session.is_ended());
    }

    #[test]
    fn cancelled_replay_counts_as_decline() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(2));
        let turn = session.step(Reply::Cancelled);
        assert!(turn.prompt.is_none());
        assert!(session.is_ended());
    }

    #[test]
    fn starting_n_times_counts_n_attempts() {
        let mut session = session();
        session.start();
        for _ in 0..3 {
            session.step(Reply::Choice(2)); // failure ending
            session.step(Reply::Yes); // replay
        }
        assert_eq!(session.attempts(), 4);
    }

    #[test]
    fn text_puzzle_hint_and_empty_input_cost_nothing() {
        let mut session = session();
        session.start();
        let turn = session.step(Reply::Choice(3)); // Read the carving
        assert!(matches!(turn.prompt, Some(Prompt::Answer { .. })));
        assert!(turn.output.flattened().contains("Unscramble U N A H T E D."));

        let turn = session.step(Reply::Text("hint".into()));
        assert!(
            turn.output
                .flattened()
                .contains("Hint: Rearrange the letters for something spooky.")
        );

        let turn = session.step(Reply::Text("   ".into()));
        assert!(
            turn.output
                .flattened()
                .contains("You didn't enter an answer. Try again.")
        );

        // Two wrong scoring attempts, then the hint/empty inputs must not
        // have counted: a third wrong answer is the one that fails.
        session.step(Reply::Text("SPOOKY".into()));
        session.step(Reply::Text("DAUNTED".into()));
        let turn = session.step(Reply::Text("UNHATED".into()));
        assert!(turn.output.flattened().contains("The shadows deepen."));
        assert_eq!(expect_confirm(&turn), "Would you like to play again?");
    }

    #[test]
    fn text_puzzle_accepts_lowercase_answer() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(3));
        let turn = session.step(Reply::Text("haunted".into()));
        assert!(turn.output.flattened().contains("You escape, Mina."));
        assert_eq!(session.player().score(), 50);
    }

    #[test]
    fn cancelling_a_text_puzzle_skips_the_failure_message() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(3));
        let turn = session.step(Reply::Cancelled);
        let flat = turn.output.flattened();
        assert!(flat.contains("Input canceled. Returning to game."));
        assert!(!flat.contains("The shadows deepen."));
        expect_confirm(&turn);
    }

    #[test]
    fn direct_replay_keeps_inventory_and_asks_its_own_question() {
        let mut session = session();
        session.start();
        let turn = session.step(Reply::Choice(4)); // Slip through the hedge
        assert_eq!(
            expect_confirm(&turn),
            "Would you like to play again to discover the other endings?"
        );
        assert_eq!(session.player().score(), 75);
        // Unlike manager replay, the inventory survives the question.
        assert_eq!(session.player().inventory(), ["Hedge Charm".to_string()]);

        let turn = session.step(Reply::No);
        assert!(
            turn.output
                .flattened()
                .contains("Collected objects: [Hedge Charm]")
        );
    }

    #[test]
    fn step_after_end_stays_ended() {
        let mut session = session();
        session.start();
        session.step(Reply::Choice(2));
        session.step(Reply::No);
        let turn = session.step(Reply::Yes);
        assert!(turn.prompt.is_none());
        assert!(turn.output.blocks.is_empty());
    }
}
