//! Synchronous notification lists used by the curve and fit registries.
//!
//! A [`Signal`] holds any number of subscribers. Callbacks registered with
//! [`Signal::connect`] run immediately, in registration order, inside
//! [`Signal::emit`]. Subscribers created with [`Signal::subscribe`] receive a
//! clone of every event through a channel they drain at their own pace; the
//! event is already queued by the time `emit` returns.

use std::fmt;
use std::sync::mpsc::{Receiver, Sender, channel};

type Callback<E> = Box<dyn FnMut(&E)>;

pub struct Signal<E> {
    callbacks: Vec<Callback<E>>,
    senders: Vec<Sender<E>>,
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
            senders: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("callbacks", &self.callbacks.len())
            .field("channels", &self.senders.len())
            .finish()
    }
}

impl<E: Clone> Signal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback that is invoked for every emitted event.
    pub fn connect(&mut self, callback: impl FnMut(&E) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Register a channel subscriber.
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (sender, receiver) = channel();
        self.senders.push(sender);
        receiver
    }

    pub fn emit(&mut self, event: &E) {
        for callback in &mut self.callbacks {
            callback(event);
        }

        // receivers that were dropped are forgotten
        self.senders
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.len() + self.senders.len()
    }
}
