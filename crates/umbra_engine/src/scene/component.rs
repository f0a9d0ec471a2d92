//! Component identity and frame-dirty tracking
//!
//! Every scene object carries a [`Component`]: a process-unique id, a display
//! name and a counter of frame resources that still hold stale GPU data.
//!
//! With `FRAMES_IN_FLIGHT` ring-buffered frame resources, a CPU-side change is
//! only fully visible to the GPU once each of those resources has been
//! rewritten. [`Component::mark_dirty`] therefore sets the counter to
//! `FRAMES_IN_FLIGHT`, and the frame loop calls [`Component::tick`] once per
//! frame after rewriting the current slot.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::render::constants::FRAMES_IN_FLIGHT;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique component identifier
///
/// Ids are never reused and increase strictly in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Get the raw id value
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocate the next component id
pub fn next_component_id() -> ComponentId {
    ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Identity plus GPU synchronization state for a scene object
pub struct Component {
    id: ComponentId,
    name: String,
    dirty_frames: AtomicU32,
}

impl Component {
    /// Create a component with the next global id and a clean sync state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: next_component_id(),
            name: name.into(),
            dirty_frames: AtomicU32::new(0),
        }
    }

    /// Unique id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Display name (not guaranteed unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flag every in-flight frame resource as stale
    ///
    /// Takes `&self` so state changes may be reported from any thread.
    pub fn mark_dirty(&self) {
        self.dirty_frames.store(FRAMES_IN_FLIGHT as u32, Ordering::Release);
    }

    /// Record that one more frame resource has been rewritten
    pub fn tick(&self) {
        // Err means the counter was already zero
        let _ = self
            .dirty_frames
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Whether any frame resource still holds stale data
    pub fn needs_sync(&self) -> bool {
        self.pending_frames() > 0
    }

    /// Number of frame resources not yet rewritten since the last change
    pub fn pending_frames(&self) -> u32 {
        self.dirty_frames.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dirty_frames", &self.pending_frames())
            .finish()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq<str> for Component {
    fn eq(&self, other: &str) -> bool {
        self.name == other
    }
}

impl PartialEq<&str> for Component {
    fn eq(&self, other: &&str) -> bool {
        self.name == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_strictly_increase_in_construction_order() {
        let components: Vec<Component> = (0..16).map(|i| Component::new(format!("c{}", i))).collect();
        for pair in components.windows(2) {
            assert!(pair[0].id() < pair[1].id());
        }
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| thread::spawn(|| (0..250).map(|_| next_component_id()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().expect("id thread");
            for pair in ids.windows(2) {
                assert!(pair[0] < pair[1]);
            }
            for id in ids {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_new_component_is_synchronized() {
        let component = Component::new("Fresh");
        assert_eq!(component.pending_frames(), 0);
        assert!(!component.needs_sync());
    }

    #[test]
    fn test_dirty_survives_until_every_frame_resource_rewritten() {
        let component = Component::new("Lamp");
        component.mark_dirty();

        for _ in 0..FRAMES_IN_FLIGHT - 1 {
            component.tick();
            assert!(component.needs_sync());
        }
        component.tick();
        assert!(!component.needs_sync());

        // Extra ticks clamp at zero
        component.tick();
        assert_eq!(component.pending_frames(), 0);
    }

    #[test]
    fn test_mark_dirty_resets_countdown() {
        let component = Component::new("Lamp");
        component.mark_dirty();
        component.tick();
        component.mark_dirty();
        assert_eq!(component.pending_frames(), FRAMES_IN_FLIGHT as u32);
    }

    #[test]
    fn test_mark_dirty_from_another_thread() {
        let component = Arc::new(Component::new("Shared"));
        let remote = Arc::clone(&component);
        thread::spawn(move || remote.mark_dirty()).join().expect("mark thread");
        assert!(component.needs_sync());
    }

    #[test]
    fn test_equality_by_id_and_lookup_by_name() {
        let a = Component::new("Skull");
        let b = Component::new("Skull");

        assert_ne!(a, b);
        assert_eq!(a, a);
        assert!(a == "Skull");
        assert!(b == "Skull");
        assert!(a != "Box");
    }
}
