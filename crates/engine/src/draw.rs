//! Random source for the fallback ladder.

/// Picks an index in `0..len`. Callers guarantee `len > 0`.
pub trait TargetDraw: Send + Sync {
    fn draw(&self, len: usize) -> usize;
}

/// Uniform draw from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDraw;

impl TargetDraw for RandomDraw {
    fn draw(&self, len: usize) -> usize {
        use rand::Rng;
        rand::rng().random_range(0..len)
    }
}
