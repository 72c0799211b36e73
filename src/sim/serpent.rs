//! The player's serpent
//!
//! Tile-aligned head, velocity with at most one nonzero axis, ordered body
//! tiles (oldest first; the last appended tile is the head). Turning is
//! rejected only when it exactly reverses the current velocity.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::Projectile;
use crate::GameConfig;
use crate::consts::*;

/// Cardinal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Velocity delta in pixels per tick
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -BLOCK),
            Dir::Down => (0, BLOCK),
            Dir::Left => (-BLOCK, 0),
            Dir::Right => (BLOCK, 0),
        }
    }
}

/// Fixed-capacity circular buffer of direction-key frame stamps.
///
/// The only contracts: entries older than the window fall out, and "is there
/// any entry" feeds the collision resolver's grace nudge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputBuffer {
    stamps: [u64; 8],
    len: usize,
}

impl InputBuffer {
    pub fn push(&mut self, frame: u64) {
        if self.len == self.stamps.len() {
            self.stamps.copy_within(1.., 0);
            self.len -= 1;
        }
        self.stamps[self.len] = frame;
        self.len += 1;
    }

    /// Drop entries older than the window
    pub fn prune(&mut self, now: u64) {
        let mut keep = 0;
        for i in 0..self.len {
            if now.saturating_sub(self.stamps[i]) <= INPUT_BUFFER_FRAMES {
                self.stamps[keep] = self.stamps[i];
                keep += 1;
            }
        }
        self.len = keep;
    }

    pub fn has_entries(&self) -> bool {
        self.len > 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Serpent {
    /// Head position, tile-aligned
    pub x: i32,
    pub y: i32,
    /// Velocity; at most one axis nonzero, each in {-BLOCK, 0, BLOCK}
    pub dx: i32,
    pub dy: i32,
    /// Body tiles, oldest first; the back equals the head once moving
    pub body: VecDeque<(i32, i32)>,
    /// Target length; the body is trimmed from the front past this
    pub length: usize,
    pub food_streak: u32,
    pub is_powered_up: bool,
    pub is_dead: bool,
    /// Remaining frames of the segment-loss flash
    pub flash_frames: u32,
    /// Remaining frames of the death animation (cosmetic)
    pub death_frames: u32,
    pub input_buffer: InputBuffer,
    /// Ticks of axis lock left after a wall bounce
    pub bounce_cooldown: u32,
    bounce_block_x: bool,
    bounce_block_y: bool,
    pub venom: Vec<Projectile>,
    pub can_spit: bool,
    spit_cooldown: u32,
    pub enable_idle_animation: bool,
    pub palette: u8,
}

impl Serpent {
    pub fn new(config: &GameConfig, x: i32, y: i32) -> Self {
        let mut body = VecDeque::new();
        body.push_back((x, y));
        Self {
            x,
            y,
            dx: 0,
            dy: 0,
            body,
            length: config.start_length.max(1),
            food_streak: 0,
            is_powered_up: false,
            is_dead: false,
            flash_frames: 0,
            death_frames: 0,
            input_buffer: InputBuffer::default(),
            bounce_cooldown: 0,
            bounce_block_x: false,
            bounce_block_y: false,
            venom: Vec::new(),
            can_spit: true,
            spit_cooldown: 0,
            enable_idle_animation: config.enable_idle_animation,
            palette: config.snake_palette,
        }
    }

    /// The serpent outlives levels; this moves it to the new spawn and wipes
    /// per-level state
    pub fn reset_for_level(&mut self, config: &GameConfig, x: i32, y: i32, idle_animation: bool) {
        self.x = x;
        self.y = y;
        self.dx = 0;
        self.dy = 0;
        self.body.clear();
        self.body.push_back((x, y));
        self.length = config.start_length.max(1);
        self.food_streak = 0;
        self.is_powered_up = false;
        self.is_dead = false;
        self.flash_frames = 0;
        self.death_frames = 0;
        self.input_buffer.clear();
        self.bounce_cooldown = 0;
        self.bounce_block_x = false;
        self.bounce_block_y = false;
        self.venom.clear();
        self.can_spit = true;
        self.spit_cooldown = 0;
        self.enable_idle_animation = idle_animation;
    }

    pub fn is_moving(&self) -> bool {
        self.dx != 0 || self.dy != 0
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_frames > 0
    }

    pub fn head_vec(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn vel_vec(&self) -> Vec2 {
        Vec2::new(self.dx as f32, self.dy as f32)
    }

    /// Apply a direction key. The request is rejected iff it exactly negates
    /// the current velocity; accepted keys stamp the input buffer.
    pub fn steer(&mut self, dir: Dir, frame: u64) -> bool {
        let (dx, dy) = dir.delta();
        if self.is_moving() && dx == -self.dx && dy == -self.dy {
            return false;
        }
        self.dx = dx;
        self.dy = dy;
        self.input_buffer.push(frame);
        true
    }

    /// Per-tick housekeeping before the move is proposed
    pub fn begin_tick(&mut self, frame: u64) {
        self.input_buffer.prune(frame);
        self.flash_frames = self.flash_frames.saturating_sub(1);
        self.death_frames = self.death_frames.saturating_sub(1);
        if self.spit_cooldown > 0 {
            self.spit_cooldown -= 1;
            if self.spit_cooldown == 0 {
                self.can_spit = true;
            }
        }
    }

    /// Next head position from the current velocity. During a wall-bounce
    /// cooldown only the unblocked axis advances.
    pub fn proposed_step(&mut self) -> (i32, i32) {
        if self.bounce_cooldown > 0 {
            self.bounce_cooldown -= 1;
            if self.bounce_cooldown == 0 {
                self.bounce_block_x = false;
                self.bounce_block_y = false;
            }
            let dx = if self.bounce_block_x { 0 } else { self.dx };
            let dy = if self.bounce_block_y { 0 } else { self.dy };
            (self.x + dx, self.y + dy)
        } else {
            (self.x + self.dx, self.y + self.dy)
        }
    }

    /// Lock the clamped axes for the bounce window
    pub fn start_bounce(&mut self, blocked_x: bool, blocked_y: bool) {
        self.bounce_cooldown = BOUNCE_COOLDOWN;
        self.bounce_block_x = blocked_x;
        self.bounce_block_y = blocked_y;
    }

    /// Commit the resolved head position and roll the body forward
    pub fn commit_head(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        if self.is_moving() {
            self.body.push_back((x, y));
            while self.body.len() > self.length {
                self.body.pop_front();
            }
        }
        debug_assert_eq!(self.body.back(), Some(&(self.x, self.y)));
    }

    /// The new head tile landing on an older body tile kills the serpent.
    /// The just-appended back entry is excluded; a stationary or bouncing
    /// serpent cannot bite itself.
    pub fn self_hit(&self) -> bool {
        if self.body.len() <= 1 || !self.is_moving() || self.bounce_cooldown > 0 {
            return false;
        }
        self.body
            .iter()
            .take(self.body.len() - 1)
            .any(|&t| t == (self.x, self.y))
    }

    /// Food pickup: grow, advance the streak, maybe power up
    pub fn handle_food_eaten(&mut self) {
        self.length += 1;
        self.food_streak += 1;
        if self.food_streak >= POWER_UP_STREAK {
            self.is_powered_up = true;
            self.food_streak = 0;
        }
    }

    pub fn consume_power_up(&mut self) {
        self.is_powered_up = false;
    }

    /// Spend a body segment to spawn venom in the facing direction.
    /// No-op unless moving, long enough, and off cooldown.
    pub fn spit_venom(&mut self) -> bool {
        if !self.can_spit || !self.is_moving() || self.body.len() < 2 {
            return false;
        }
        self.body.pop_front();
        self.length -= 1;
        let dir = self.vel_vec().normalize_or_zero();
        let center = self.head_vec() + Vec2::splat(BLOCK as f32 / 2.0);
        self.venom.push(Projectile::new(center, dir * VENOM_SPEED, VENOM_LIFETIME));
        self.can_spit = false;
        self.spit_cooldown = SPIT_COOLDOWN;
        true
    }

    /// A boss shell connected. Powered-up serpents shrug it off; otherwise a
    /// spare segment is spent, or the serpent dies.
    pub fn take_shell_hit(&mut self) {
        if self.is_powered_up {
            return;
        }
        if self.body.len() >= 2 {
            self.body.pop_front();
            self.length = self.length.saturating_sub(1).max(1);
            self.flash_frames = FLASH_FRAMES;
        } else {
            self.die();
        }
    }

    pub fn die(&mut self) {
        self.is_dead = true;
        self.death_frames = DEATH_ANIM_FRAMES;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serpent() -> Serpent {
        Serpent::new(&GameConfig::default(), 400, 400)
    }

    #[test]
    fn test_reverse_is_rejected() {
        let mut s = serpent();
        assert!(s.steer(Dir::Right, 0));
        assert!(!s.steer(Dir::Left, 0));
        assert_eq!((s.dx, s.dy), (BLOCK, 0));
    }

    #[test]
    fn test_reverse_after_turn_same_tick_rejected() {
        let mut s = serpent();
        s.steer(Dir::Right, 0);
        // Turn up, then immediately try down: only the first is accepted
        assert!(s.steer(Dir::Up, 1));
        assert!(!s.steer(Dir::Down, 1));
        assert_eq!((s.dx, s.dy), (0, -BLOCK));
    }

    #[test]
    fn test_stationary_serpent_accepts_any_direction() {
        let mut s = serpent();
        assert!(s.steer(Dir::Left, 0));
    }

    #[test]
    fn test_velocity_single_axis_invariant() {
        let mut s = serpent();
        for (d, f) in [(Dir::Right, 0), (Dir::Down, 1), (Dir::Left, 2), (Dir::Up, 3)] {
            s.steer(d, f);
            assert_eq!(s.dx * s.dy, 0);
            assert!(s.dx.abs() <= BLOCK && s.dy.abs() <= BLOCK);
        }
    }

    #[test]
    fn test_body_trims_to_length() {
        let mut s = serpent();
        s.steer(Dir::Right, 0);
        for i in 1..=5 {
            s.commit_head(400 + i * BLOCK, 400);
        }
        assert_eq!(s.body.len(), 1);
        assert_eq!(s.body.back(), Some(&(s.x, s.y)));

        s.handle_food_eaten();
        s.commit_head(s.x + BLOCK, 400);
        s.commit_head(s.x + BLOCK, 400);
        assert_eq!(s.body.len(), 2);
    }

    #[test]
    fn test_streak_of_five_powers_up() {
        let mut s = serpent();
        for _ in 0..4 {
            s.handle_food_eaten();
        }
        assert!(!s.is_powered_up);
        assert_eq!(s.food_streak, 4);
        s.handle_food_eaten();
        assert!(s.is_powered_up);
        assert_eq!(s.food_streak, 0);
        assert_eq!(s.length, 6);
    }

    #[test]
    fn test_spit_requires_segment_and_cooldown() {
        let mut s = serpent();
        s.steer(Dir::Up, 0);
        // Length 1: no-op
        assert!(!s.spit_venom());
        assert!(s.venom.is_empty());

        s.handle_food_eaten();
        s.commit_head(400, 380);
        s.commit_head(400, 360);
        assert_eq!(s.body.len(), 2);
        assert!(s.spit_venom());
        assert_eq!(s.venom.len(), 1);
        // Venom flies up at 1.5 tiles per frame
        assert_eq!(s.venom[0].vel.y, -VENOM_SPEED);
        // Cooldown blocks an immediate second spit
        s.handle_food_eaten();
        assert!(!s.spit_venom());
        for f in 0..SPIT_COOLDOWN as u64 {
            s.begin_tick(f);
        }
        assert!(s.can_spit);
    }

    #[test]
    fn test_shell_hit_spends_segment_then_kills() {
        let mut s = serpent();
        s.steer(Dir::Right, 0);
        s.handle_food_eaten();
        s.commit_head(420, 400);
        s.commit_head(440, 400);
        assert_eq!(s.body.len(), 2);

        s.take_shell_hit();
        assert!(!s.is_dead);
        assert!(s.is_flashing());
        assert_eq!(s.body.len(), 1);

        s.take_shell_hit();
        assert!(s.is_dead);
        assert_eq!(s.death_frames, DEATH_ANIM_FRAMES);
    }

    #[test]
    fn test_powered_up_ignores_shells() {
        let mut s = serpent();
        s.is_powered_up = true;
        s.take_shell_hit();
        assert!(!s.is_dead);
    }

    #[test]
    fn test_self_hit_excludes_new_head() {
        let mut s = serpent();
        s.length = 5;
        s.steer(Dir::Right, 0);
        s.commit_head(420, 400);
        s.commit_head(440, 400);
        assert!(!s.self_hit());
        // Force the head back onto an older tile
        s.commit_head(420, 400);
        assert!(s.self_hit());
    }

    #[test]
    fn test_input_buffer_window() {
        let mut b = InputBuffer::default();
        b.push(0);
        b.push(3);
        b.prune(8);
        assert!(b.has_entries());
        b.prune(12);
        // Frame 3 is exactly 9 frames old now, outside the window
        assert!(!b.has_entries());
    }

    #[test]
    fn test_bounce_moves_unblocked_axis_only() {
        let mut s = serpent();
        s.steer(Dir::Left, 0);
        s.x = 0;
        s.start_bounce(true, false);
        let (nx, ny) = s.proposed_step();
        assert_eq!((nx, ny), (0, 400));
        s.steer(Dir::Down, 1);
        let (nx, ny) = s.proposed_step();
        assert_eq!((nx, ny), (0, 420));
    }
}
