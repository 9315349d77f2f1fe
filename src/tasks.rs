//! Multi-tick cooperative behaviors.
//!
//! A task is a resumable step sequence owned by exactly one projectile. The
//! scheduler resumes every task once per tick (after controllers, before
//! motion integration) and drops it the tick it reports [`TaskStep::Done`].
//! Tasks never block: spanning ticks means returning `Continue` and being
//! resumed on the next one.

use bevy::prelude::*;

use crate::danmaku::Danmaku;

/// Result of resuming a task for one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskStep {
    Continue,
    Done,
}

/// A suspendable, resumable step sequence. Finite and not restartable.
pub trait DanmakuTask: Send + Sync {
    fn resume(&mut self, danmaku: &mut Danmaku) -> TaskStep;
}

impl<F> DanmakuTask for F
where
    F: FnMut(&mut Danmaku) -> TaskStep + Send + Sync,
{
    fn resume(&mut self, danmaku: &mut Danmaku) -> TaskStep {
        self(danmaku)
    }
}

/// Adapts an iterator of "not yet done" steps: each yielded item is one tick
/// of continuation, exhaustion completes the task.
struct StepIter<I>(I);

impl<I> DanmakuTask for StepIter<I>
where
    I: Iterator<Item = ()> + Send + Sync,
{
    fn resume(&mut self, _danmaku: &mut Danmaku) -> TaskStep {
        match self.0.next() {
            Some(()) => TaskStep::Continue,
            None => TaskStep::Done,
        }
    }
}

/// The per-projectile task list.
#[derive(Component, Default)]
pub struct Tasks {
    list: Vec<Box<dyn DanmakuTask>>,
}

impl Tasks {
    pub fn start(&mut self, task: impl DanmakuTask + 'static) {
        self.list.push(Box::new(task));
    }

    pub fn start_boxed(&mut self, task: Box<dyn DanmakuTask>) {
        self.list.push(task);
    }

    /// Starts a task from an iterator of steps; each yielded item keeps the
    /// task alive for one more tick.
    pub fn start_iter<I>(&mut self, steps: I)
    where
        I: IntoIterator<Item = ()>,
        I::IntoIter: Send + Sync + 'static,
    {
        self.list.push(Box::new(StepIter(steps.into_iter())));
    }

    /// Starts a task built from the owning projectile. A factory that
    /// produces nothing is a logged usage error, not a crash.
    pub fn start_with<F>(&mut self, danmaku: &Danmaku, factory: F)
    where
        F: FnOnce(&Danmaku) -> Option<Box<dyn DanmakuTask>>,
    {
        match factory(danmaku) {
            Some(task) => self.list.push(task),
            None => error!("attempted to start a null danmaku task"),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Resumes every task once, compacting out the completed ones. The scan
    /// tolerates removal without skipping or double-visiting entries.
    pub(crate) fn advance(&mut self, danmaku: &mut Danmaku) {
        self.list
            .retain_mut(|task| task.resume(danmaku) == TaskStep::Continue);
    }
}
