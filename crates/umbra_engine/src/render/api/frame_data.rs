//! Per-frame resource ring
//!
//! The CPU writes frame N+1 while the GPU still reads frame N, so every
//! GPU-visible buffer exists once per frame in flight. `FrameResources` holds
//! those copies and the index of the slot being written this frame.

use crate::render::constants::FRAMES_IN_FLIGHT;

/// Ring of `FRAMES_IN_FLIGHT` per-frame copies of `T`
#[derive(Debug, Clone)]
pub struct FrameResources<T> {
    slots: [T; FRAMES_IN_FLIGHT],
    current: usize,
    frame: u64,
}

impl<T: Default> Default for FrameResources<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> FrameResources<T> {
    /// Build every slot with `init(slot_index)`
    pub fn from_fn(init: impl FnMut(usize) -> T) -> Self {
        Self {
            slots: std::array::from_fn(init),
            current: 0,
            frame: 0,
        }
    }

    /// Slot written this frame
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    /// Mutable slot written this frame
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.current]
    }

    /// Index of the slot written this frame
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of frames advanced since creation
    pub fn frame_number(&self) -> u64 {
        self.frame
    }

    /// Move to the next slot, returning its index
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % FRAMES_IN_FLIGHT;
        self.frame += 1;
        self.current
    }

    /// Slot by index
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// All slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        FRAMES_IN_FLIGHT
    }

    /// Always false; the ring has a fixed non-zero size
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let mut ring: FrameResources<u32> = FrameResources::default();
        assert_eq!(ring.current_index(), 0);
        for expected in (1..FRAMES_IN_FLIGHT).chain(std::iter::once(0)) {
            assert_eq!(ring.advance(), expected);
        }
        assert_eq!(ring.frame_number(), FRAMES_IN_FLIGHT as u64);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut ring = FrameResources::from_fn(|i| i * 10);
        *ring.current_mut() += 1;
        ring.advance();
        assert_eq!(*ring.current(), 10);
        assert_eq!(ring.get(0), Some(&1));
        assert_eq!(ring.iter().count(), ring.len());
    }
}
