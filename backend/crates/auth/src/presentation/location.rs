//! Location
//!
//! In-process navigation history. The current path is published on a
//! watch channel so route guards can follow it.

use std::sync::Mutex;

use tokio::sync::watch;

use crate::domain::navigator::Navigator;

#[derive(Debug)]
pub struct Location {
    current: watch::Sender<String>,
    history: Mutex<Vec<String>>,
}

impl Location {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        let (current, _) = watch::channel(initial.clone());
        Self {
            current,
            history: Mutex::new(vec![initial]),
        }
    }

    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Every path visited, oldest first
    pub fn history(&self) -> Vec<String> {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// User-initiated navigation
    pub fn push(&self, path: impl Into<String>) {
        let path = path.into();
        match self.history.lock() {
            Ok(mut history) => history.push(path.clone()),
            Err(poisoned) => poisoned.into_inner().push(path.clone()),
        }
        self.current.send_replace(path);
    }
}

impl Navigator for Location {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "Navigate");
        self.push(path);
    }
}
