//! Fixed-capacity brick storage
//!
//! Bricks live in a slot array for the whole session. Placing a brick checks
//! a slot out of the free list; removing one goes through a queue that is
//! only drained at the end of a tick, so the active set never changes while
//! the collision pass is iterating it. The queue is shareable so removals
//! can be requested from outside the tick (e.g. after a fade-out finishes).
//!
//! Every checkout bumps the slot's generation, so a request that outlives its
//! brick (say, a fade-out that ends after a level change) can't remove
//! whatever now occupies the reused slot.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::collision::Collidable;
use super::geometry::Rect;
use super::presets::BrickPreset;
use super::raycast::TargetId;

/// Slot index plus the checkout it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrickHandle {
    pub index: usize,
    pub generation: u32,
}

impl BrickHandle {
    pub const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for BrickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.generation)
    }
}

/// Result of the ball striking a brick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrickHit {
    /// Undestructible brick, nothing happens
    Deflected,
    /// Lost one of its extra hits
    Damaged { remaining: u8 },
    /// Broken; the caller queues the removal
    Destroyed { preset: Option<&'static BrickPreset> },
}

#[derive(Debug, Clone)]
pub struct Brick {
    pub handle: BrickHandle,
    pub rect: Rect,
    pub preset: Option<&'static BrickPreset>,
    /// Extra hits left beyond the final one
    pub supplementary_hits: u8,
    pub undestructible: bool,
    /// On the field (checked out of the pool)
    pub placed: bool,
    /// Broken this tick, waiting for the removal drain
    pub destroyed: bool,
    hit_box: Rect,
    hit_box_frame: Option<u64>,
}

impl Brick {
    fn empty(index: usize) -> Self {
        Self {
            handle: BrickHandle::new(index, 0),
            rect: Rect::ZERO,
            preset: None,
            supplementary_hits: 0,
            undestructible: false,
            placed: false,
            destroyed: false,
            hit_box: Rect::ZERO,
            hit_box_frame: None,
        }
    }

    /// Still has to be broken to clear the level
    pub fn is_breakable(&self) -> bool {
        self.placed && !self.destroyed && !self.undestructible
    }

    /// Apply one ball hit
    pub fn take_hit(&mut self) -> BrickHit {
        if self.undestructible {
            return BrickHit::Deflected;
        }
        if self.supplementary_hits > 0 {
            self.supplementary_hits -= 1;
            return BrickHit::Damaged {
                remaining: self.supplementary_hits,
            };
        }
        self.destroyed = true;
        BrickHit::Destroyed {
            preset: self.preset,
        }
    }
}

impl Collidable for Brick {
    fn hit_box(&self) -> Rect {
        self.hit_box
    }

    fn is_active(&self) -> bool {
        self.placed && !self.destroyed
    }

    fn update_state(&mut self, frame: u64) {
        if self.hit_box_frame != Some(frame) {
            self.hit_box = self.rect;
            self.hit_box_frame = Some(frame);
        }
    }
}

/// Shareable handle for deferred removal requests
#[derive(Debug, Clone, Default)]
pub struct RemovalQueue {
    pending: Arc<Mutex<Vec<BrickHandle>>>,
}

impl RemovalQueue {
    pub fn request(&self, handle: BrickHandle) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if !pending.contains(&handle) {
            pending.push(handle);
        }
    }

    fn take(&self) -> Vec<BrickHandle> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *pending)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arena of brick slots with a free list
#[derive(Debug)]
pub struct BrickPool {
    slots: Vec<Brick>,
    /// Free slot indices; popped from the end
    free: Vec<usize>,
    removals: RemovalQueue,
}

impl BrickPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(Brick::empty).collect(),
            free: Self::all_free(capacity),
            removals: RemovalQueue::default(),
        }
    }

    /// Reversed so the lowest slot is handed out first
    fn all_free(capacity: usize) -> Vec<usize> {
        (0..capacity).rev().collect()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn placed_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Place a brick; `None` when the pool is exhausted
    pub fn checkout(&mut self, rect: Rect, preset: &'static BrickPreset) -> Option<BrickHandle> {
        let Some(index) = self.free.pop() else {
            log::debug!("Brick pool exhausted, skipping placement of `{}`", preset.id);
            return None;
        };
        let brick = &mut self.slots[index];
        brick.handle.generation = brick.handle.generation.wrapping_add(1);
        brick.rect = rect;
        brick.preset = Some(preset);
        brick.supplementary_hits = preset.supplementary_hits;
        brick.undestructible = preset.undestructible;
        brick.placed = true;
        brick.destroyed = false;
        brick.hit_box_frame = None;
        Some(brick.handle)
    }

    /// The placed brick `handle` was issued for; `None` once its slot is reused
    pub fn get(&self, handle: BrickHandle) -> Option<&Brick> {
        self.slots
            .get(handle.index)
            .filter(|b| b.placed && b.handle == handle)
    }

    pub fn get_mut(&mut self, handle: BrickHandle) -> Option<&mut Brick> {
        self.slots
            .get_mut(handle.index)
            .filter(|b| b.placed && b.handle == handle)
    }

    /// Queue a removal; applied by the next `drain_removals`
    pub fn request_removal(&self, handle: BrickHandle) {
        self.removals.request(handle);
    }

    /// Handle for requesting removals from outside the tick
    pub fn removal_queue(&self) -> RemovalQueue {
        self.removals.clone()
    }

    /// Return every queued brick to the free list
    pub fn drain_removals(&mut self) -> Vec<BrickHandle> {
        let mut removed = Vec::new();
        for handle in self.removals.take() {
            match self.slots.get_mut(handle.index) {
                Some(brick) if brick.placed && brick.handle == handle => {
                    brick.placed = false;
                    brick.destroyed = false;
                    brick.preset = None;
                    self.free.push(handle.index);
                    removed.push(handle);
                }
                _ => log::warn!("Ignoring removal of brick {handle}: not on the field"),
            }
        }
        removed
    }

    /// Return every placed brick to the pool at once (level transition)
    pub fn clear(&mut self) -> Vec<BrickHandle> {
        // Drop stale requests; every brick is coming back anyway
        self.removals.take();
        let mut removed = Vec::new();
        for brick in self.slots.iter_mut().filter(|b| b.placed) {
            brick.placed = false;
            brick.destroyed = false;
            brick.preset = None;
            removed.push(brick.handle);
        }
        // Same hand-out order as a fresh pool
        self.free = Self::all_free(self.slots.len());
        removed
    }

    /// Placed bricks in slot order
    pub fn placed(&self) -> impl Iterator<Item = &Brick> {
        self.slots.iter().filter(|b| b.placed)
    }

    /// Placed bricks as collision targets, in slot order
    pub fn targets_mut(&mut self) -> impl Iterator<Item = (TargetId, &mut Brick)> {
        self.slots
            .iter_mut()
            .filter(|b| b.placed)
            .map(|b| (TargetId::Brick(b.handle), b))
    }

    /// Bricks still standing between the player and the next level
    pub fn breakable_remaining(&self) -> usize {
        self.slots.iter().filter(|b| b.is_breakable()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::presets::preset;

    fn rect() -> Rect {
        Rect::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_checkout_and_exhaustion() {
        let mut pool = BrickPool::with_capacity(2);
        let red = preset("red").unwrap();
        assert_eq!(pool.checkout(rect(), red), Some(BrickHandle::new(0, 1)));
        assert_eq!(pool.checkout(rect(), red), Some(BrickHandle::new(1, 1)));
        assert_eq!(pool.checkout(rect(), red), None);
        assert_eq!(pool.placed_count(), 2);
    }

    #[test]
    fn test_removal_is_deferred() {
        let mut pool = BrickPool::with_capacity(4);
        let handle = pool.checkout(rect(), preset("red").unwrap()).unwrap();

        pool.request_removal(handle);
        pool.request_removal(handle);
        assert!(pool.get(handle).is_some(), "still placed until drained");
        assert_eq!(pool.removal_queue().len(), 1);

        assert_eq!(pool.drain_removals(), vec![handle]);
        assert!(pool.get(handle).is_none());
        assert_eq!(pool.free_count(), 4);

        // Draining again is a no-op
        assert!(pool.drain_removals().is_empty());
    }

    #[test]
    fn test_slot_never_both_free_and_placed() {
        let mut pool = BrickPool::with_capacity(3);
        let red = preset("red").unwrap();
        let a = pool.checkout(rect(), red).unwrap();
        let b = pool.checkout(rect(), red).unwrap();
        pool.request_removal(a);
        pool.drain_removals();
        // Unknown and already-returned handles are ignored
        pool.request_removal(a);
        pool.request_removal(BrickHandle::new(99, 1));
        pool.drain_removals();
        assert_eq!(pool.free_count() + pool.placed_count(), pool.capacity());
        assert_eq!(pool.placed().map(|br| br.handle).collect::<Vec<_>>(), vec![b]);
        // Reuse the returned slot under a new generation
        let c = pool.checkout(rect(), red).unwrap();
        assert_eq!(c.index, a.index);
        assert_ne!(c, a);
        assert!(pool.get(a).is_none());
    }

    #[test]
    fn test_late_removal_spares_reused_slot() {
        let mut pool = BrickPool::with_capacity(2);
        let red = preset("red").unwrap();
        let old = pool.checkout(rect(), red).unwrap();
        let queue = pool.removal_queue();

        // Level changes before the fade-out reports back
        pool.clear();
        let fresh = pool.checkout(rect(), red).unwrap();
        assert_eq!(fresh.index, old.index);

        queue.request(old);
        assert!(pool.drain_removals().is_empty());
        assert!(pool.get(fresh).is_some());
        assert_eq!(pool.placed_count(), 1);
    }

    #[test]
    fn test_removal_from_another_thread() {
        let mut pool = BrickPool::with_capacity(2);
        let handle = pool.checkout(rect(), preset("red").unwrap()).unwrap();
        let queue = pool.removal_queue();
        std::thread::spawn(move || queue.request(handle)).join().unwrap();
        assert_eq!(pool.drain_removals(), vec![handle]);
    }

    #[test]
    fn test_take_hit_progression() {
        let mut pool = BrickPool::with_capacity(2);
        let gold = pool.checkout(rect(), preset("gold").unwrap()).unwrap();
        let brick = pool.get_mut(gold).unwrap();
        assert_eq!(brick.take_hit(), BrickHit::Damaged { remaining: 1 });
        assert_eq!(brick.take_hit(), BrickHit::Damaged { remaining: 0 });
        assert!(matches!(brick.take_hit(), BrickHit::Destroyed { .. }));
        assert!(!brick.is_active());

        let steel = pool.checkout(rect(), preset("steel").unwrap()).unwrap();
        let brick = pool.get_mut(steel).unwrap();
        assert_eq!(brick.take_hit(), BrickHit::Deflected);
        assert_eq!(pool.breakable_remaining(), 0);
    }

    #[test]
    fn test_clear_returns_everything() {
        let mut pool = BrickPool::with_capacity(5);
        let red = preset("red").unwrap();
        let handles: Vec<_> = (0..3).filter_map(|_| pool.checkout(rect(), red)).collect();
        pool.request_removal(handles[0]);
        pool.request_removal(handles[2]);
        pool.drain_removals();
        pool.checkout(rect(), red);
        assert_eq!(pool.clear().len(), 2);
        assert_eq!(pool.free_count(), 5);
        assert!(pool.removal_queue().is_empty());

        // Lowest slot first again, whatever order the bricks went back in
        assert_eq!(pool.checkout(rect(), red).map(|h| h.index), Some(0));
        assert_eq!(pool.checkout(rect(), red).map(|h| h.index), Some(1));
    }
}
