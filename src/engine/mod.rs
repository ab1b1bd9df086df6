mod output;
mod player;
mod puzzle;
mod session;

pub use output::{Output, OutputBlock};
pub use player::{DEFAULT_NAME, Player};
pub use puzzle::{AttemptTracker, Graded, MAX_ATTEMPTS, Outcome, is_correct, normalize};
pub use session::{ANSWER_REQUEST, Prompt, Reply, Session, Turn};
