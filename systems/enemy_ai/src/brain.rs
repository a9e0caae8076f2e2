//! Per-enemy decision pass: chase, bite windup, blind gating and local avoidance.

use std::time::Duration;

use ashfall_core::{AiState, EnemyId, Event, Obstacle};
use ashfall_system_collision::{resolve_all, SpatialGrid, DEFAULT_PASSES};
use glam::Vec2;

use crate::{AiTuning, Enemy, EnemyRoster};

/// What the enemies are hunting this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    /// Position of the player after the movement pass.
    pub position: Vec2,
    /// Collision radius of the player.
    pub radius: f32,
    /// Whether the player can still be attacked.
    pub alive: bool,
}

/// Per-tick AI pass over the enemy roster.
#[derive(Debug)]
pub struct EnemyAi {
    passes: usize,
    obstacles: Vec<Obstacle>,
    neighbours: Vec<(EnemyId, Vec2, f32)>,
    corrupted: Vec<EnemyId>,
}

impl EnemyAi {
    /// Creates an AI pass resolving enemies against obstacles for `passes` passes.
    #[must_use]
    pub fn new(passes: usize) -> Self {
        Self {
            passes: passes.max(1),
            obstacles: Vec::new(),
            neighbours: Vec::new(),
            corrupted: Vec::new(),
        }
    }

    /// Applies every tackle reported by the movement pass of the same tick.
    pub fn absorb_tackles(&self, roster: &mut EnemyRoster, events: &[Event], now: Duration) {
        for event in events {
            if let Event::EnemyTackled { enemy, impulse } = event {
                if roster.tackle(*enemy, *impulse, now) {
                    log::trace!("enemy {} tackled", enemy.get());
                }
            }
        }
    }

    /// Advances every enemy by one tick.
    ///
    /// Dead enemies from previous ticks are removed first. Knockback always
    /// integrates; decisions and locomotion are skipped while an enemy is
    /// blinded. Enemies whose position becomes non-finite are despawned.
    pub fn update(
        &mut self,
        roster: &mut EnemyRoster,
        grid: &SpatialGrid,
        target: Target,
        delta: Duration,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        roster.remove_dead(out);

        let tuning = *roster.tuning();
        let dt = delta.as_secs_f32();
        self.neighbours.clear();
        self.neighbours.extend(
            roster
                .iter()
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| (enemy.id, enemy.position, enemy.radius)),
        );
        self.corrupted.clear();

        for enemy in roster.enemies_mut().values_mut() {
            self.integrate_knockback(enemy, &tuning, grid, dt);

            if enemy.is_alive() {
                if enemy.is_blinded(now) {
                    enemy.state = AiState::Idle;
                    enemy.windup_started = None;
                } else {
                    decide(enemy, target, &tuning, now, out);
                    if enemy.state == AiState::Chasing && !enemy.is_stunned(now) {
                        self.chase(enemy, target, &tuning, grid, dt);
                    }
                }
            }

            if !enemy.position.is_finite() || !enemy.knockback.is_finite() {
                log::warn!("enemy {} reached a non-finite state", enemy.id.get());
                self.corrupted.push(enemy.id);
            }
        }

        for index in 0..self.corrupted.len() {
            let _ = roster.despawn(self.corrupted[index], out);
        }
    }

    fn integrate_knockback(&mut self, enemy: &mut Enemy, tuning: &AiTuning, grid: &SpatialGrid, dt: f32) {
        if enemy.knockback == Vec2::ZERO {
            return;
        }
        enemy.position += enemy.knockback * dt;
        enemy.knockback *= (-tuning.knockback_damping * dt).exp();
        if enemy.knockback.length() < tuning.knockback_rest {
            enemy.knockback = Vec2::ZERO;
        }
        self.settle(enemy, grid);
    }

    fn chase(&mut self, enemy: &mut Enemy, target: Target, tuning: &AiTuning, grid: &SpatialGrid, dt: f32) {
        let profile = enemy.kind.profile();
        let to_target = target.position - enemy.position;
        let gap = to_target.length() - enemy.radius - target.radius;
        let Some(mut direction) = to_target.try_normalize() else {
            return;
        };
        enemy.facing = direction.x.atan2(direction.y);
        if gap <= profile.strike_range * 0.5 {
            return;
        }

        let probe = enemy.position + direction * tuning.avoidance_lookahead;
        if let Some(hit) = grid.first_hit(enemy.position, probe, enemy.radius, &mut self.obstacles) {
            let away = hit.obstacle.position - enemy.position;
            let side = if direction.perp_dot(away) > 0.0 {
                -direction.perp()
            } else {
                direction.perp()
            };
            direction = (direction + side).try_normalize().unwrap_or(direction);
        }

        let mut separation = Vec2::ZERO;
        for &(other, position, radius) in &self.neighbours {
            if other == enemy.id {
                continue;
            }
            let offset = enemy.position - position;
            let distance = offset.length();
            let minimum = enemy.radius + radius + tuning.separation;
            if distance < minimum && distance > f32::EPSILON {
                separation += offset / distance * (minimum - distance);
            }
        }

        let velocity = direction * profile.speed + separation * tuning.separation_strength;
        enemy.position += velocity * dt;
        self.settle(enemy, grid);
    }

    fn settle(&mut self, enemy: &mut Enemy, grid: &SpatialGrid) {
        if !enemy.position.is_finite() {
            return;
        }
        grid.query_near(enemy.position, enemy.radius, &mut self.obstacles);
        let _ = resolve_all(&mut enemy.position, enemy.radius, &self.obstacles, self.passes);
    }
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self::new(DEFAULT_PASSES)
    }
}

fn decide(enemy: &mut Enemy, target: Target, tuning: &AiTuning, now: Duration, out: &mut Vec<Event>) {
    let profile = enemy.kind.profile();
    let distance = enemy.position.distance(target.position);
    let gap = distance - enemy.radius - target.radius;

    match enemy.state {
        AiState::Idle => {
            if target.alive && distance <= profile.aggro_range {
                enemy.state = AiState::Chasing;
            }
        }
        AiState::Chasing => {
            let rested = enemy
                .last_bite
                .map_or(true, |at| now >= at + profile.bite_cooldown);
            if !target.alive || distance > profile.aggro_range * tuning.leash {
                enemy.state = AiState::Idle;
            } else if gap <= profile.strike_range && rested {
                enemy.state = AiState::Attacking;
                enemy.windup_started = Some(now);
            }
        }
        AiState::Attacking => {
            if !target.alive || gap > profile.strike_range * 1.5 {
                enemy.state = AiState::Chasing;
                enemy.windup_started = None;
                return;
            }
            let started = enemy.windup_started.unwrap_or(now);
            if now >= started + profile.bite_windup {
                out.push(Event::PlayerHit {
                    enemy: enemy.id,
                    damage: profile.bite_damage,
                });
                enemy.last_bite = Some(now);
                enemy.windup_started = None;
                enemy.state = AiState::Chasing;
            } else if enemy.windup_started.is_none() {
                enemy.windup_started = Some(now);
            }
        }
        AiState::Dead => {}
    }
}
