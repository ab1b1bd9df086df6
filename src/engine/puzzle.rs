/// Fixed attempt budget shared by every puzzle.
pub const MAX_ATTEMPTS: u8 = 3;

/// How a puzzle's attempt loop terminated. Cancellation is kept distinct
/// from failure even though both currently route to the same restart,
/// so the contract stays explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Solved,
    Failed,
    Cancelled,
}

/// Verdict for a single scoring submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Graded {
    Solved,
    /// Wrong, but attempts remain.
    Retry,
    /// Wrong, and the budget is spent.
    Failed,
}

pub fn normalize(answer: &str) -> String {
    answer.trim().to_uppercase()
}

pub fn is_correct(candidate: &str, answer: &str) -> bool {
    normalize(candidate) == normalize(answer)
}

/// Counts scoring attempts against [`MAX_ATTEMPTS`]. Hints, empty
/// submissions, and cancellations never pass through `grade`, so they
/// never consume an attempt.
#[derive(Debug, Clone, Default)]
pub struct AttemptTracker {
    used: u8,
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used(&self) -> u8 {
        self.used
    }

    pub fn grade(&mut self, candidate: &str, answer: &str) -> Graded {
        if is_correct(candidate, answer) {
            return Graded::Solved;
        }
        self.used += 1;
        if self.used < MAX_ATTEMPTS {
            Graded::Retry
        } else {
            Graded::Failed
        }
    }
}
