use crate::buffer::color::{BYTES_PER_PIXEL, ColorBuffer};

/// Pool configuration for spare node buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolOpts {
    /// Maximum number of buffers kept between a reset and the next build.
    pub max_retained_buffers: usize,
}

impl Default for BufferPoolOpts {
    fn default() -> Self {
        Self {
            max_retained_buffers: 64,
        }
    }
}

impl BufferPoolOpts {
    /// Set [`BufferPoolOpts::max_retained_buffers`].
    pub fn with_max_retained_buffers(mut self, max: usize) -> Self {
        self.max_retained_buffers = max;
        self
    }
}

/// Counters describing pool reuse.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Buffers currently waiting in the pool.
    pub retained_buffers: usize,
    /// Bytes held by retained buffers.
    pub retained_bytes: usize,
    /// Buffers handed out from the pool.
    pub reused_buffers: u64,
    /// Buffers allocated because the pool was empty.
    pub alloc_buffers: u64,
    /// Buffers dropped on release because the pool was full or the size did not match.
    pub dropped_on_release: u64,
    /// Buffers dropped by [`BufferPool::drain`] after a build.
    pub drained_buffers: u64,
}

/// Spare canvas-sized color buffers for merging tree nodes.
///
/// Only buffers matching the pool's canvas size are retained.
#[derive(Debug)]
pub(crate) struct BufferPool {
    opts: BufferPoolOpts,
    width: u32,
    height: u32,
    stats: BufferPoolStats,
    buffers: Vec<ColorBuffer>,
}

impl BufferPool {
    pub(crate) fn new(opts: BufferPoolOpts) -> Self {
        Self {
            opts,
            width: 0,
            height: 0,
            stats: BufferPoolStats::default(),
            buffers: Vec::new(),
        }
    }

    pub(crate) fn stats(&self) -> BufferPoolStats {
        self.stats.clone()
    }

    fn byte_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(BYTES_PER_PIXEL)
    }

    /// Switch to a new canvas size, dropping buffers of the old one.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.drain();
    }

    /// Pop a spare buffer or allocate a transparent one. Pooled buffers keep stale pixels.
    pub(crate) fn take(&mut self) -> ColorBuffer {
        if let Some(buf) = self.buffers.pop() {
            self.stats.retained_buffers = self.buffers.len();
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(self.byte_len());
            self.stats.reused_buffers = self.stats.reused_buffers.saturating_add(1);
            return buf;
        }

        self.stats.alloc_buffers = self.stats.alloc_buffers.saturating_add(1);
        ColorBuffer::new(self.width, self.height)
    }

    pub(crate) fn release(&mut self, buf: ColorBuffer) {
        if buf.width() != self.width
            || buf.height() != self.height
            || self.buffers.len() >= self.opts.max_retained_buffers
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        self.buffers.push(buf);
        self.stats.retained_buffers = self.buffers.len();
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(self.byte_len());
    }

    /// Drop every retained buffer.
    pub(crate) fn drain(&mut self) {
        let n = self.buffers.len() as u64;
        self.buffers.clear();
        self.stats.drained_buffers = self.stats.drained_buffers.saturating_add(n);
        self.stats.retained_buffers = 0;
        self.stats.retained_bytes = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tree/pool.rs"]
mod tests;
