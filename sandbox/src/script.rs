//! Scripted input timeline standing in for a keyboard, mouse and camera.

use locomotion::InputEvent;
use locomotion::math::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cue {
    Input(InputEvent),
    /// Camera orientation in radians. Pitch is negative when looking down.
    Look { yaw: f32, pitch: f32 },
}

#[derive(Debug, Default)]
pub struct Script {
    cues: Vec<(u32, Cue)>,
    cursor: usize,
}

impl Script {
    pub fn new(mut cues: Vec<(u32, Cue)>) -> Self {
        cues.sort_by_key(|(tick, _)| *tick);
        Self { cues, cursor: 0 }
    }

    /// Run onto the seeded rail, jump off, slide, build a rail, then restart.
    pub fn demo() -> Self {
        use Cue::{Input, Look};
        use InputEvent::*;

        let forward = Vec2::new(0.0, 1.0);
        let right = Vec2::new(1.0, 0.0);
        let look_down = -std::f32::consts::FRAC_PI_4;

        Self::new(vec![
            (0, Input(Move(forward))),
            (60, Input(Jump)),
            (130, Input(Move(forward))),
            (160, Input(Crouch(true))),
            (200, Input(Crouch(false))),
            (210, Input(Move(Vec2::zeros()))),
            (240, Look { yaw: 0.0, pitch: look_down }),
            (241, Input(Fire)),
            (250, Input(Move(right))),
            (290, Input(Move(Vec2::zeros()))),
            (300, Input(Fire)),
            (301, Input(Fire)),
            (360, Input(Restart)),
        ])
    }

    /// Cues scheduled at or before `tick` that have not been handed out yet.
    pub fn due(&mut self, tick: u32) -> Vec<Cue> {
        let start = self.cursor;
        while self
            .cues
            .get(self.cursor)
            .is_some_and(|(at, _)| *at <= tick)
        {
            self.cursor += 1;
        }
        self.cues[start..self.cursor]
            .iter()
            .map(|(_, cue)| *cue)
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.cues.len()
    }

    pub fn last_tick(&self) -> u32 {
        self.cues.last().map_or(0, |(tick, _)| *tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_cues_in_tick_order_once() {
        let mut script = Script::new(vec![
            (5, Cue::Input(InputEvent::Fire)),
            (1, Cue::Input(InputEvent::Jump)),
            (5, Cue::Input(InputEvent::Restart)),
        ]);

        assert!(script.due(0).is_empty());
        assert_eq!(script.due(1), vec![Cue::Input(InputEvent::Jump)]);
        assert!(script.due(4).is_empty());
        assert_eq!(
            script.due(7),
            vec![
                Cue::Input(InputEvent::Fire),
                Cue::Input(InputEvent::Restart)
            ]
        );
        assert!(script.is_finished());
        assert!(script.due(8).is_empty());
    }

    #[test]
    fn demo_ends_with_a_restart() {
        let script = Script::demo();
        assert_eq!(
            script.cues.last().map(|(_, cue)| *cue),
            Some(Cue::Input(InputEvent::Restart))
        );
        assert_eq!(script.last_tick(), 360);
    }
}
