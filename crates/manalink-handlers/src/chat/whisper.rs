//! Correlation of whisper responses with the whispers that caused them.
//!
//! The server answers every whisper with a response that does not name
//! the recipient. Responses arrive in send order, so recipients are queued
//! on send and popped on response.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO of recipients awaiting a whisper response.
#[derive(Debug, Default)]
pub struct WhisperQueue {
    pending: Mutex<VecDeque<String>>,
}

impl WhisperQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, recipient: &str) {
        self.lock().push_back(recipient.to_string());
    }

    /// The oldest recipient without removing it.
    pub fn front(&self) -> Option<String> {
        self.lock().front().cloned()
    }

    /// Removes and returns the oldest recipient.
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    /// Recipients in send order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
