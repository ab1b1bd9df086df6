/// Fallback used when the player submits an empty name.
pub const DEFAULT_NAME: &str = "Player";

/// The player's identity and progress. The name is fixed at construction;
/// the score only ever grows, and the inventory never holds duplicates.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    score: u32,
    inventory: Vec<String>,
}

impl Player {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Player {
            name: if name.is_empty() {
                DEFAULT_NAME.to_string()
            } else {
                name.to_string()
            },
            score: 0,
            inventory: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn increase_score(&mut self, amount: u32) {
        self.score += amount;
    }

    /// Adds an item to the inventory in collection order. Returns true if
    /// the item is new; re-adding an existing item is a silent no-op.
    pub fn add_item(&mut self, item: &str) -> bool {
        if self.inventory.iter().any(|held| held == item) {
            return false;
        }
        self.inventory.push(item.to_string());
        true
    }

    /// Empties the inventory. Score is untouched; it persists across
    /// playthroughs.
    pub fn clear_inventory(&mut self) {
        self.inventory.clear();
    }

    /// Deterministic end-of-run summary body.
    pub fn describe(&self) -> String {
        format!(
            "{}!\nFinal score: {}\nCollected objects: [{}]",
            self.name,
            self.score,
            self.inventory.join(", ")
        )
    }
}
