use crate::rail::RailId;

/// Notifications for the (excluded) animation, VFX and audio layers. Fire-and-forget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    /// `height_delta` is how far the capsule actually shrank or grew (meters, non-negative).
    CrouchChanged { crouched: bool, height_delta: f32 },
    Jumped { force: f32 },
    GrindStarted { rail: RailId },
    GrindEnded { rail: RailId },
}

/// Trigger-zone crossings resolved to a rail by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RailEvent {
    Entered(RailId),
    Exited(RailId),
}

/// Per-tick queue of typed events, drained by exactly one consumer.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: T) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
