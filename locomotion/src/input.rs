use std::collections::VecDeque;

use crate::math::Vec2;

/// Discrete action events delivered between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Planar move axis: `x` strafes right, `y` moves forward.
    Move(Vec2),
    /// Crouch pressed (`true`) or released (`false`).
    Crouch(bool),
    Jump,
    Fire,
    /// Back to the spawn point.
    Restart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActionKind {
    Move,
    Crouch,
    Jump,
    Fire,
    Restart,
}

impl InputEvent {
    fn kind(&self) -> ActionKind {
        match self {
            InputEvent::Move(_) => ActionKind::Move,
            InputEvent::Crouch(_) => ActionKind::Crouch,
            InputEvent::Jump => ActionKind::Jump,
            InputEvent::Fire => ActionKind::Fire,
            InputEvent::Restart => ActionKind::Restart,
        }
    }
}

/// The input one tick consumes: at most one transition per action.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    pub movement: Option<Vec2>,
    pub crouch: Option<bool>,
    pub jump: bool,
    pub fire: bool,
    pub restart: bool,
}

impl InputFrame {
    pub fn is_empty(&self) -> bool {
        self.movement.is_none()
            && self.crouch.is_none()
            && !self.jump
            && !self.fire
            && !self.restart
    }
}

/// Latches input events between fixed ticks.
///
/// Each [`InputQueue::drain_tick`] takes the oldest pending event of every action kind;
/// later events of the same kind stay queued for the following ticks, so a press and
/// release inside one tick are both observed.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain_tick(&mut self) -> InputFrame {
        let mut frame = InputFrame::default();
        let mut taken: Vec<ActionKind> = Vec::with_capacity(5);
        let mut kept = VecDeque::with_capacity(self.pending.len());

        for event in self.pending.drain(..) {
            let kind = event.kind();
            if taken.contains(&kind) {
                kept.push_back(event);
                continue;
            }
            taken.push(kind);
            match event {
                InputEvent::Move(axis) => frame.movement = Some(axis),
                InputEvent::Crouch(pressed) => frame.crouch = Some(pressed),
                InputEvent::Jump => frame.jump = true,
                InputEvent::Fire => frame.fire = true,
                InputEvent::Restart => frame.restart = true,
            }
        }

        self.pending = kept;
        frame
    }
}

/// Capability to stop and resume listening to player input.
///
/// Grinding suspends free movement by disabling the gates of the locomotion and jump
/// controllers; disabling also drops whatever input was latched.
pub trait InputGate {
    fn enable_input(&mut self);
    fn disable_input(&mut self);
    fn input_enabled(&self) -> bool;
}

/// Enable or disable every gate in `gates`.
pub fn set_gates(gates: &mut [&mut dyn InputGate], enabled: bool) {
    for gate in gates.iter_mut() {
        if enabled {
            gate.enable_input();
        } else {
            gate.disable_input();
        }
    }
}
