//! Shared fixtures for the unit tests.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{render::RenderStrategy, tracker::ProgressSnapshot};

/// An in-memory surface whose contents stay readable after the writer is moved away.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Observations made by a [`CountingStrategy`].
#[derive(Default)]
pub(crate) struct Counts {
    pub(crate) renders: AtomicUsize,
    pub(crate) finishes: AtomicUsize,
    pub(crate) last: Mutex<Option<ProgressSnapshot>>,
}

/// A strategy that draws nothing and counts calls.
pub(crate) struct CountingStrategy(pub(crate) Arc<Counts>);

impl RenderStrategy for CountingStrategy {
    fn render(&self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        self.0.renders.fetch_add(1, Ordering::SeqCst);
        *self.0.last.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn finish(&self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        self.0.finishes.fetch_add(1, Ordering::SeqCst);
        *self.0.last.lock() = Some(snapshot.clone());
        Ok(())
    }
}
