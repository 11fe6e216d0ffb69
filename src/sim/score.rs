//! Kill streak scoring
//!
//! Every kill made while the previous one is still "warm" extends the streak,
//! and the award doubles with each step: 5, 10, 20, 40, ...

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Streak length beyond which awards stop doubling
const MAX_STREAK_SHIFT: u32 = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    /// Kills in the current streak (0 = no streak)
    pub streak: u32,
    /// Ticks left before the streak lapses
    pub streak_timer: u32,
    pub best_streak: u32,
    pub kills: u32,
}

impl Scoreboard {
    /// Award a kill and return the points granted
    pub fn record_kill(&mut self, tuning: &Tuning) -> u64 {
        self.streak = if self.streak_timer > 0 { self.streak + 1 } else { 1 };
        self.streak_timer = tuning.streak_window_ticks;
        self.best_streak = self.best_streak.max(self.streak);
        self.kills += 1;

        let shift = (self.streak - 1).min(MAX_STREAK_SHIFT);
        let award = tuning.streak_base.saturating_mul(1u64 << shift);
        self.score = self.score.saturating_add(award);
        award
    }

    /// Decay the streak window by one tick
    pub fn tick(&mut self) {
        if self.streak_timer > 0 {
            self.streak_timer -= 1;
            if self.streak_timer == 0 {
                self.streak = 0;
            }
        }
    }
}
