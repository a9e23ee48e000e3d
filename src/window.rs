//! Stages that keep or drop a fixed number of items at either end of the stream.

use crate::buffer::RingBuffer;
use crate::stage::{filter_fn, Arg, Filter};

/// Forward the first `n` items, then drain the rest of the input
pub fn first<T: Send>(n: usize) -> impl Filter<T> {
    filter_fn(move |arg: Arg<T>| {
        for item in arg.iter().take(n) {
            arg.emit(item)?;
        }
        arg.drain();
        Ok(())
    })
    .named("first")
}

/// Forward everything except the first `n` items
pub fn drop_first<T: Send>(n: usize) -> impl Filter<T> {
    filter_fn(move |arg: Arg<T>| {
        for item in arg.iter().skip(n) {
            arg.emit(item)?;
        }
        Ok(())
    })
    .named("drop_first")
}

/// Forward only the last `n` items, once the input has ended
pub fn last<T: Send>(n: usize) -> impl Filter<T> {
    filter_fn(move |arg: Arg<T>| {
        let mut window = RingBuffer::new(n);
        for item in arg.iter() {
            window.push(item);
        }
        for item in window.drain() {
            arg.emit(item)?;
        }
        Ok(())
    })
    .named("last")
}

/// Forward everything except the last `n` items.
///
/// Streams: each item is emitted as soon as `n` newer items have arrived.
pub fn drop_last<T: Send>(n: usize) -> impl Filter<T> {
    filter_fn(move |arg: Arg<T>| {
        let mut window = RingBuffer::new(n);
        for item in arg.iter() {
            if let Some(oldest) = window.push(item) {
                arg.emit(oldest)?;
            }
        }
        Ok(())
    })
    .named("drop_last")
}
