//! Size-class pooling allocator for call frames.
//!
//! Frame sizes are rounded up to one of [`SIZE_CLASSES`] capacities
//! (8, 16, ..., 1024 slots). Each class keeps its own locked free list.
//! When it runs dry the class allocates one contiguous span of
//! `span_entries` frames and cuts it into entries. Frames larger than the
//! biggest class are allocated on demand and dropped on release.
use std::{
    ops::{Deref, DerefMut},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Serialize;
use tracing::debug;

use crate::{config::AllocatorConfig, runtime::frame::Frame};

pub const SIZE_CLASSES: usize = 8;
const SMALLEST_CLASS: usize = 8;

/// Capacity of frames in `class`.
pub const fn class_capacity(class: usize) -> usize {
    SMALLEST_CLASS << class
}

/// The smallest class that fits `size` slots, if any.
pub fn class_for(size: usize) -> Option<usize> {
    (0..SIZE_CLASSES).find(|&class| class_capacity(class) >= size)
}

#[derive(Default)]
struct SizeClass {
    free: Vec<Frame>,
    allocated: u64,
    released: u64,
    refills: u64,
}

pub struct FrameAllocator {
    classes: [Mutex<SizeClass>; SIZE_CLASSES],
    span_entries: usize,
    unpooled: AtomicU64,
}

impl FrameAllocator {
    pub fn new(config: &AllocatorConfig) -> Self {
        Self {
            classes: std::array::from_fn(|_| Mutex::new(SizeClass::default())),
            span_entries: config.span_entries.max(1),
            unpooled: AtomicU64::new(0),
        }
    }

    fn class(&self, class: usize) -> MutexGuard<'_, SizeClass> {
        self.classes[class]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hands out a cleared frame with at least `size` slots.
    pub fn alloc(&self, size: usize) -> Frame {
        let Some(class) = class_for(size) else {
            self.unpooled.fetch_add(1, Ordering::Relaxed);
            return Frame::new(size);
        };

        let mut pool = self.class(class);
        if pool.free.is_empty() {
            let capacity = class_capacity(class);
            pool.free.extend(Frame::carve(capacity, self.span_entries));
            pool.refills += 1;
            debug!(capacity, entries = self.span_entries, "refilled frame class");
        }
        pool.allocated += 1;
        match pool.free.pop() {
            Some(frame) => frame,
            None => Frame::new(class_capacity(class)),
        }
    }

    /// Clears `frame` and returns it to its class. Oversized frames are
    /// dropped.
    pub fn free(&self, mut frame: Frame) {
        let Some(class) = class_for(frame.len()) else {
            return;
        };
        if class_capacity(class) != frame.len() {
            return;
        }
        frame.clear();
        let mut pool = self.class(class);
        pool.released += 1;
        pool.free.push(frame);
    }

    /// Allocates a frame that returns itself to this allocator on drop.
    pub fn lease(&self, size: usize) -> FrameLease<'_> {
        FrameLease {
            allocator: self,
            frame: Some(self.alloc(size)),
        }
    }

    pub fn stats(&self) -> AllocatorStats {
        let classes = (0..SIZE_CLASSES)
            .map(|class| {
                let pool = self.class(class);
                ClassStats {
                    capacity: class_capacity(class),
                    free: pool.free.len(),
                    allocated: pool.allocated,
                    released: pool.released,
                    refills: pool.refills,
                }
            })
            .collect();
        AllocatorStats {
            classes,
            unpooled: self.unpooled.load(Ordering::Relaxed),
        }
    }
}

impl Default for FrameAllocator {
    fn default() -> Self {
        Self::new(&AllocatorConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub capacity: usize,
    pub free: usize,
    pub allocated: u64,
    pub released: u64,
    pub refills: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatorStats {
    pub classes: Vec<ClassStats>,
    pub unpooled: u64,
}

impl AllocatorStats {
    /// Frames currently handed out from pooled classes.
    pub fn in_use(&self) -> u64 {
        self.classes
            .iter()
            .map(|c| c.allocated.saturating_sub(c.released))
            .sum()
    }
}

/// A frame on loan from a [`FrameAllocator`].
pub struct FrameLease<'a> {
    allocator: &'a FrameAllocator,
    frame: Option<Frame>,
}

impl FrameLease<'_> {
    /// Swaps in a frame of at least `size` slots unless the current one
    /// already fits, in which case it is cleared and kept.
    pub fn reserve(&mut self, size: usize) {
        match self.frame.as_mut() {
            Some(frame) if frame.len() >= size => frame.clear(),
            _ => {
                if let Some(old) = self.frame.replace(self.allocator.alloc(size)) {
                    self.allocator.free(old);
                }
            }
        }
    }
}

impl Deref for FrameLease<'_> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        match &self.frame {
            Some(frame) => frame,
            None => unreachable!("frame lease used after release"),
        }
    }
}

impl DerefMut for FrameLease<'_> {
    fn deref_mut(&mut self) -> &mut Frame {
        match &mut self.frame {
            Some(frame) => frame,
            None => unreachable!("frame lease used after release"),
        }
    }
}

impl Drop for FrameLease<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.allocator.free(frame);
        }
    }
}
