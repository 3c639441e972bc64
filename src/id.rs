use rand::{Rng, RngCore};

/// Upper bound for a randomly chosen starting id.
const RANDOM_START_MAX: u64 = 1 << 32;

/// Monotonic call-id generator.
///
/// Each session starts at a random offset so ids from different sessions rarely
/// collide once their call logs are archived side by side.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u64) -> Self {
        Self { next: start }
    }

    pub fn random_start(rng: &mut dyn RngCore) -> Self {
        Self::starting_from(rng.random_range(1..=RANDOM_START_MAX))
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
