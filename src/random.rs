const MODULUS: u64 = 2_147_483_647;
const MULTIPLIER: u64 = 16_807;

/// Park-Miller minimal standard generator with explicit state.
///
/// Identical seeds yield identical sequences on every platform, which is what
/// makes scribble patterns reproducible.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        let mut state = seed as u64 % MODULUS;
        if state == 0 {
            state = MODULUS - 1;
        }
        Self { state }
    }

    /// Uniform value in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.state = self.state * MULTIPLIER % MODULUS;
        (self.state - 1) as f64 / (MODULUS - 1) as f64
    }

    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        let min = min as f64;
        let max = max as f64;
        (min + self.next() * (max - min)) as f32
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.next() < probability
    }
}

/// Seed derived from text: the sum of its UTF-16 code units.
pub fn seed_from_text(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0u32, |acc, unit| acc.wrapping_add(unit as u32))
}
