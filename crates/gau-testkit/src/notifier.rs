use std::sync::Mutex;

use gau_alloc::Notifier;

use crate::lock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// [`Notifier`] that keeps every notice in arrival order.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.notices)
            .iter()
            .filter_map(|n| match n {
                Notice::Error(m) => Some(m.clone()),
                Notice::Success(_) => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        lock(&self.notices)
            .iter()
            .filter_map(|n| match n {
                Notice::Success(m) => Some(m.clone()),
                Notice::Error(_) => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        lock(&self.notices).push(Notice::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        lock(&self.notices).push(Notice::Error(message.to_string()));
    }
}
