//! The boss tank
//!
//! Free-floating position with a turn-rate-limited body and an independently
//! aimed turret. State re-selection runs on a fixed cadence; everything else
//! is per-tick steering toward the chosen target point.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::PlayArea;
use super::projectile::Projectile;
use crate::consts::*;
use crate::normalize_angle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossState {
    Patrol,
    Chase,
    Strafe,
    Reposition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    /// Hull heading, radians
    pub body_angle: f32,
    pub speed: f32,
    pub turret_angle: f32,
    pub state: BossState,
    pub hp: i32,
    pub damage_flash: u32,
    pub shells: Vec<Projectile>,
    target: Vec2,
    move_timer: u32,
    attack_timer: u32,
    /// Countdown to a scheduled follow-up volley
    followup: Option<u32>,
}

impl Boss {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            body_angle: 0.0,
            speed: 0.0,
            turret_angle: 0.0,
            state: BossState::Patrol,
            hp: BOSS_START_HP,
            damage_flash: 0,
            shells: Vec::new(),
            target: pos,
            move_timer: 0,
            attack_timer: BOSS_ATTACK_INTERVAL,
            followup: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Register a hit; returns the damage applied. HP never goes below zero.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.hp = (self.hp - amount).max(0);
        self.damage_flash = BOSS_DAMAGE_FLASH;
        amount
    }

    fn select_state(&mut self, head: Vec2, head_vel: Vec2, rng: &mut impl Rng) {
        let to_boss = self.pos - head;
        let dist = to_boss.length();
        if dist < BOSS_REPOSITION_DIST {
            self.state = BossState::Reposition;
            // Back off along the ray from the serpent through the boss
            self.target = head + to_boss.normalize_or_zero() * BOSS_STANDOFF_DIST;
        } else if dist > BOSS_CHASE_DIST {
            self.state = BossState::Chase;
            self.target = head + head_vel * BOSS_MOVE_LEAD_FRAMES;
        } else {
            self.state = BossState::Strafe;
            let perp = Vec2::new(-to_boss.y, to_boss.x).normalize_or_zero();
            let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            self.target = head + perp * side * BOSS_STANDOFF_DIST;
        }
    }

    fn steer(&mut self, play: &PlayArea) {
        let to_target = self.target - self.pos;
        if to_target.length() > 1.0 {
            let desired = to_target.y.atan2(to_target.x);
            let max_step = BOSS_BODY_TURN_DEGREES.to_radians();
            let delta = normalize_angle(desired - self.body_angle).clamp(-max_step, max_step);
            self.body_angle = normalize_angle(self.body_angle + delta);
        }

        let max_speed = if self.state == BossState::Chase {
            BOSS_CHASE_SPEED
        } else {
            BOSS_MAX_SPEED
        };
        if to_target.length() > max_speed * 4.0 {
            self.speed = (self.speed + BOSS_ACCEL).min(max_speed);
        } else {
            // Ease in near the target instead of orbiting it
            self.speed *= 0.9;
        }

        self.pos += Vec2::from_angle(self.body_angle) * self.speed;

        // Keep the hull inside the play area
        let margin = 30.0;
        self.pos.x = self.pos.x.clamp(margin, play.width as f32 - margin);
        self.pos.y = self.pos.y.clamp(play.top as f32 + margin, play.bottom as f32 - margin);
    }

    /// Turn the turret toward the lead point; large errors rotate up to
    /// twice as fast.
    fn aim(&mut self, head: Vec2, head_vel: Vec2) -> f32 {
        let aim_point = head + head_vel * BOSS_TURRET_LEAD_FRAMES;
        let to_aim = aim_point - self.pos;
        let desired = to_aim.y.atan2(to_aim.x);
        let err = normalize_angle(desired - self.turret_angle);

        let base = BOSS_TURRET_TURN_DEGREES.to_radians();
        let mult = (err.abs() / base).clamp(1.0, 2.0);
        let step = err.clamp(-base * mult, base * mult);
        self.turret_angle = normalize_angle(self.turret_angle + step);

        normalize_angle(desired - self.turret_angle)
    }

    fn fire_volley(&mut self) {
        let spread = BOSS_SPREAD_DEGREES.to_radians();
        let n = BOSS_VOLLEY_SIZE;
        for i in 0..n {
            let t = i as f32 / (n - 1) as f32 - 0.5;
            let angle = self.turret_angle + t * spread;
            let vel = Vec2::from_angle(angle) * BOSS_SHELL_SPEED;
            self.shells.push(Projectile::new(self.pos, vel, BOSS_SHELL_LIFETIME));
        }
    }

    /// One simulation tick. Shell flight is advanced by the engine in the
    /// projectile phase, not here.
    pub fn tick(&mut self, head: Vec2, head_vel: Vec2, play: &PlayArea, rng: &mut impl Rng) {
        self.damage_flash = self.damage_flash.saturating_sub(1);

        if self.move_timer == 0 {
            self.select_state(head, head_vel, rng);
            self.move_timer = BOSS_MOVEMENT_DELAY;
        }
        self.move_timer -= 1;

        self.steer(play);
        let aim_err = self.aim(head, head_vel);

        if let Some(delay) = self.followup {
            if delay == 0 {
                self.fire_volley();
                self.followup = None;
            } else {
                self.followup = Some(delay - 1);
            }
        }

        if self.attack_timer > 0 {
            self.attack_timer -= 1;
        }
        if self.attack_timer == 0 {
            if aim_err.abs() < BOSS_FIRE_CONE_DEGREES.to_radians() {
                self.fire_volley();
                if rng.random_bool(BOSS_FOLLOWUP_CHANCE) {
                    self.followup = Some(BOSS_FOLLOWUP_DELAY);
                }
            }
            self.attack_timer = BOSS_ATTACK_INTERVAL;
        }
    }
}
