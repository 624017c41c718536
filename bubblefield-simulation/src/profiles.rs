use bubblefield_core::Profile;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Chooses which profile a new avatar bubble shows.
///
/// Lists of at least `rotation_threshold` profiles are walked in rotation order, and the
/// order is reshuffled after every two full cycles. Shorter lists are sampled without
/// replacement until every profile has been used, then sampling starts over.
#[derive(Debug, Clone)]
pub struct ProfilePicker {
    rotation_threshold: usize,
    rotation_index: usize,
    order: Vec<usize>,
    used: Vec<bool>,
}

impl ProfilePicker {
    pub fn new(rotation_threshold: usize) -> Self {
        ProfilePicker {
            rotation_threshold,
            rotation_index: 0,
            order: Vec::new(),
            used: Vec::new(),
        }
    }

    /// Forgets rotation position and used profiles
    pub fn reset(&mut self) {
        self.rotation_index = 0;
        self.order.clear();
        self.used.clear();
    }

    pub fn pick<'a, R: Rng + ?Sized>(
        &mut self,
        profiles: &'a [Profile],
        rng: &mut R,
    ) -> Option<&'a Profile> {
        if profiles.is_empty() {
            return None;
        }
        let index = if profiles.len() >= self.rotation_threshold {
            self.next_in_rotation(profiles.len(), rng)
        } else {
            self.next_unused(profiles.len(), rng)
        };
        profiles.get(index)
    }

    fn next_in_rotation<R: Rng + ?Sized>(&mut self, len: usize, rng: &mut R) -> usize {
        if self.order.len() != len {
            self.order = (0..len).collect();
            self.rotation_index = 0;
        }

        let index = self.order[self.rotation_index % len];
        self.rotation_index += 1;
        if self.rotation_index >= len * 2 {
            self.rotation_index = 0;
            self.order.shuffle(rng);
            debug!("Reshuffled profile rotation ({len} profiles)");
        }
        index
    }

    fn next_unused<R: Rng + ?Sized>(&mut self, len: usize, rng: &mut R) -> usize {
        if self.used.len() != len {
            self.used = vec![false; len];
        }
        if self.used.iter().all(|&used| used) {
            self.used.iter_mut().for_each(|used| *used = false);
            debug!("All {len} profiles used, starting over");
        }

        let available: Vec<usize> = (0..len).filter(|&i| !self.used[i]).collect();
        let index = available[rng.gen_range(0..available.len())];
        self.used[index] = true;
        index
    }
}
