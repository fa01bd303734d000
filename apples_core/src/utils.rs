use rand::Rng;

/// Every shuffle in the game runs this many passes.
pub const SHUFFLE_PASSES: usize = 7;

pub trait VecExtensions<T> {
    fn take_at(&mut self, index: usize) -> Option<T>;
}

impl<T> VecExtensions<T> for Vec<T> {
    /// Removes the element at `index` keeping the order of the rest, or
    /// leaves the vector untouched when `index` is out of bounds.
    fn take_at(&mut self, index: usize) -> Option<T> {
        if index < self.len() {
            Some(self.remove(index))
        } else {
            None
        }
    }
}

pub trait SliceExtensions<T> {
    fn multi_pass_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R);
}

impl<T> SliceExtensions<T> for [T] {
    /// Each pass swaps every position with a uniformly random one. Not a
    /// Fisher-Yates shuffle, slightly biased, kept for parity with the
    /// statistical tests.
    fn multi_pass_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.is_empty() {
            return;
        }
        for _ in 0..SHUFFLE_PASSES {
            for i in 0..self.len() {
                let k = rng.gen_range(0..self.len());
                self.swap(i, k);
            }
        }
    }
}
