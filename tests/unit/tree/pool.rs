use super::*;

fn pool(max: usize) -> BufferPool {
    let mut p = BufferPool::new(BufferPoolOpts::default().with_max_retained_buffers(max));
    p.resize(8, 8);
    p
}

#[test]
fn take_reuses_released_buffers() {
    let mut p = pool(4);
    let a = p.take();
    p.release(a);
    let _ = p.take();

    let st = p.stats();
    assert_eq!(st.alloc_buffers, 1);
    assert_eq!(st.reused_buffers, 1);
    assert_eq!(st.retained_buffers, 0);
}

#[test]
fn pool_honors_retention_cap() {
    let mut p = pool(1);
    let a = p.take();
    let b = p.take();
    p.release(a);
    p.release(b);

    let st = p.stats();
    assert_eq!(st.retained_buffers, 1);
    assert_eq!(st.retained_bytes, 8 * 8 * 4);
    assert_eq!(st.dropped_on_release, 1);
}

#[test]
fn foreign_sizes_are_dropped() {
    let mut p = pool(4);
    p.release(ColorBuffer::new(2, 2));
    assert_eq!(p.stats().retained_buffers, 0);
    assert_eq!(p.stats().dropped_on_release, 1);
}

#[test]
fn resize_and_drain_empty_the_pool() {
    let mut p = pool(4);
    let a = p.take();
    let b = p.take();
    p.release(a);
    p.release(b);
    p.resize(8, 8);
    assert_eq!(p.stats().retained_buffers, 2);

    p.resize(4, 4);
    let st = p.stats();
    assert_eq!(st.retained_buffers, 0);
    assert_eq!(st.retained_bytes, 0);
    assert_eq!(st.drained_buffers, 2);
    assert_eq!(p.take().width(), 4);
}
