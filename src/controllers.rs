//! Per-tick behavior composition.
//!
//! A controller is a callback invoked once per projectile per tick with
//! `(&mut Danmaku, dt)`. Multiple controllers compose into one ordered
//! multicast aggregate; the update loop skips the whole aggregate through a
//! cached non-empty flag so idle bullets pay nothing.

use std::sync::Arc;

use bevy::prelude::*;

use crate::danmaku::Danmaku;

/// A reusable, shareable per-tick behavior.
///
/// One instance can steer many projectiles at once (e.g. a prototype's
/// initial controller set), so it only gets `&self`; keep per-bullet state in
/// the [`Danmaku`] itself or use [`Controllers::add_fn`] with a capturing
/// closure for one-off stateful behavior.
pub trait DanmakuController: Send + Sync {
    fn update(&self, danmaku: &mut Danmaku, dt: f32);
}

impl<F> DanmakuController for F
where
    F: Fn(&mut Danmaku, f32) + Send + Sync,
{
    fn update(&self, danmaku: &mut Danmaku, dt: f32) {
        self(danmaku, dt)
    }
}

/// Token returned by [`Controllers::add`] / [`Controllers::add_fn`], used for
/// targeted removal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ControllerId(u32);

enum Slot {
    Shared(Arc<dyn DanmakuController>),
    Func(Box<dyn FnMut(&mut Danmaku, f32) + Send + Sync>),
}

/// Ordered multicast aggregate of controllers attached to one projectile.
///
/// Invocation order is registration order. `clear` drops the entire
/// aggregate in one operation; it is the fast path for "wipe behavior"
/// interactions.
#[derive(Component, Default)]
pub struct Controllers {
    slots: Vec<(ControllerId, Slot)>,
    next_id: u32,
    check: bool,
}

impl Controllers {
    /// Attaches a shared controller object.
    pub fn add(&mut self, controller: Arc<dyn DanmakuController>) -> ControllerId {
        self.push(Slot::Shared(controller))
    }

    /// Attaches an owned callback.
    pub fn add_fn(
        &mut self,
        controller: impl FnMut(&mut Danmaku, f32) + Send + Sync + 'static,
    ) -> ControllerId {
        self.push(Slot::Func(Box::new(controller)))
    }

    /// Detaches one controller. Returns false if `id` was not attached.
    pub fn remove(&mut self, id: ControllerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.check = !self.slots.is_empty();
        self.slots.len() != before
    }

    /// Drops the entire aggregate in one operation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.check = false;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Cached non-empty flag, recomputed on mutation. Gates invocation in the
    /// update loop.
    pub(crate) fn should_run(&self) -> bool {
        self.check
    }

    pub(crate) fn invoke(&mut self, danmaku: &mut Danmaku, dt: f32) {
        for (_, slot) in &mut self.slots {
            match slot {
                Slot::Shared(controller) => controller.update(danmaku, dt),
                Slot::Func(controller) => controller(danmaku, dt),
            }
        }
    }

    fn push(&mut self, slot: Slot) -> ControllerId {
        let id = ControllerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.slots.push((id, slot));
        self.check = true;
        id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn invocation_follows_registration_order() {
        let mut controllers = Controllers::default();
        let mut danmaku = Danmaku::default();

        controllers.add_fn(|d, _| d.speed += 1.0);
        controllers.add_fn(|d, _| d.speed *= 10.0);
        controllers.invoke(&mut danmaku, 1.0 / 60.0);

        assert_eq!(danmaku.speed, 10.0);
    }

    #[test]
    fn remove_detaches_only_the_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter: Arc<dyn DanmakuController> = {
            let calls = calls.clone();
            Arc::new(move |_: &mut Danmaku, _: f32| {
                calls.fetch_add(1, Ordering::Relaxed);
            })
        };

        let mut controllers = Controllers::default();
        let first = controllers.add(counter.clone());
        controllers.add(counter);

        assert!(controllers.remove(first));
        assert!(!controllers.remove(first));
        assert!(controllers.should_run());

        let mut danmaku = Danmaku::default();
        controllers.invoke(&mut danmaku, 1.0 / 60.0);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn clear_empties_the_aggregate_and_the_check_flag() {
        let mut controllers = Controllers::default();
        controllers.add_fn(|_, _| {});
        controllers.add_fn(|_, _| {});

        controllers.clear();

        assert!(controllers.is_empty());
        assert!(!controllers.should_run());
    }
}
