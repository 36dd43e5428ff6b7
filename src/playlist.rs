use std::path::{Path, PathBuf};

use anyhow::{Result, ensure};
use rand::Rng;
use rand::seq::SliceRandom;

/// A one-time random permutation of the image set, traversed cyclically and
/// forever. The permutation is computed at construction and never reshuffled;
/// state beyond it is a single index that wraps modulo the length.
#[derive(Debug)]
pub struct ShuffledCycle {
    order: Vec<PathBuf>,
    index: usize,
}

impl ShuffledCycle {
    pub fn new<R: Rng>(mut images: Vec<PathBuf>, rng: &mut R) -> Result<Self> {
        ensure!(!images.is_empty(), "cannot start a slideshow with no images");
        images.shuffle(rng);
        Ok(Self {
            order: images,
            index: 0,
        })
    }

    /// Next image in the cycle; wraps after the last element, never exhausts.
    pub fn advance(&mut self) -> &Path {
        let item = &self.order[self.index];
        self.index = (self.index + 1) % self.order.len();
        item
    }

    pub fn order(&self) -> &[PathBuf] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
