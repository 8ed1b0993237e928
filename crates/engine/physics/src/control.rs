use serde::{Deserialize, Serialize};

/// Player input for one tick
///
/// Supplied by the input mapper every tick. `turn` is expected in `[-1, 1]`
/// with positive values steering right; out-of-range or non-finite values are
/// clamped before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    pub turn: f32,
    pub brake: bool,
    pub paddle: bool,
    pub jump_requested: bool,
}

impl ControlInput {
    /// Steering only
    pub fn turn(turn: f32) -> Self {
        Self {
            turn,
            ..Self::default()
        }
    }

    pub fn with_brake(mut self, brake: bool) -> Self {
        self.brake = brake;
        self
    }

    pub fn with_paddle(mut self, paddle: bool) -> Self {
        self.paddle = paddle;
        self
    }

    pub fn with_jump(mut self, jump: bool) -> Self {
        self.jump_requested = jump;
        self
    }

    /// Copy with `turn` forced into `[-1, 1]`
    pub fn clamped(self) -> Self {
        let turn = if self.turn.is_finite() {
            self.turn.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self { turn, ..self }
    }
}
