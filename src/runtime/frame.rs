use std::{
    ops::{Index, IndexMut},
    ptr::NonNull,
    sync::Arc,
};

use crate::runtime::value::Value;

/// One contiguous block of slots, carved into equally sized frames.
///
/// The block is freed when the last frame cut from it is dropped.
struct Span {
    slots: NonNull<[Value]>,
}

impl Span {
    fn new(len: usize) -> Self {
        let slots: Box<[Value]> = vec![Value::Null; len].into_boxed_slice();
        Self {
            slots: NonNull::from(Box::leak(slots)),
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        // SAFETY: `slots` came from `Box::leak` in `Span::new` and every frame
        // pointing into it holds an `Arc` to this span, so none is left.
        drop(unsafe { Box::from_raw(self.slots.as_ptr()) });
    }
}

// SAFETY: a span only owns `Value`s, which are `Send + Sync`. Access to its
// slots goes through the frames, each of which owns a disjoint range.
unsafe impl Send for Span {}
unsafe impl Sync for Span {}

/// A flat value array used by one call as operand stack plus locals.
///
/// The operand stack occupies `[0, stack_size)` and grows downward from
/// `stack_size`; locals follow at `stack_size + i`.
pub struct Frame {
    span: Arc<Span>,
    start: NonNull<Value>,
    len: usize,
}

// SAFETY: a frame is the only handle to its range of the span.
unsafe impl Send for Frame {}
unsafe impl Sync for Frame {}

impl Frame {
    /// A frame with its own span.
    pub fn new(len: usize) -> Self {
        let mut frames = Frame::carve(len, 1);
        match frames.pop() {
            Some(frame) => frame,
            None => unreachable!("carving one entry yields one frame"),
        }
    }

    /// Allocates one span of `len * entries` slots and cuts it into
    /// `entries` frames of `len` slots each.
    pub fn carve(len: usize, entries: usize) -> Vec<Frame> {
        let span = Arc::new(Span::new(len * entries));
        let base = span.slots.cast::<Value>();
        (0..entries)
            .map(|entry| Frame {
                span: Arc::clone(&span),
                // SAFETY: `entry * len + len <= len * entries`, so the range
                // stays inside the span.
                start: unsafe { base.add(entry * len) },
                len,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether both frames were cut from the same span.
    pub fn shares_span(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.span, &other.span)
    }

    pub fn as_ptr(&self) -> *const Value {
        self.start.as_ptr()
    }

    fn slots(&self) -> &[Value] {
        // SAFETY: `start..start + len` lies inside the span kept alive by
        // `self.span`, and no other frame covers it.
        unsafe { std::slice::from_raw_parts(self.start.as_ptr(), self.len) }
    }

    fn slots_mut(&mut self) -> &mut [Value] {
        // SAFETY: as in `slots`; `&mut self` makes the borrow exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.start.as_ptr(), self.len) }
    }

    /// Drops every value the frame holds.
    pub fn clear(&mut self) {
        self.slots_mut().fill(Value::Null);
    }

    pub fn is_clear(&self) -> bool {
        self.slots().iter().all(|v| matches!(v, Value::Null))
    }

    #[inline(always)]
    pub fn take(&mut self, index: usize) -> Value {
        std::mem::take(&mut self.slots_mut()[index])
    }
}

impl Index<usize> for Frame {
    type Output = Value;

    #[inline(always)]
    fn index(&self, index: usize) -> &Value {
        &self.slots()[index]
    }
}

impl IndexMut<usize> for Frame {
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Value {
        &mut self.slots_mut()[index]
    }
}
