#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player movement controller: locomotion, stamina, rolling and collision.
//!
//! The controller owns the player's transform, health and stamina. Movement is
//! integrated in short sub-steps with obstacle resolution after every step so
//! rushing and rolling cannot tunnel through thin geometry. Charging into an
//! attacking enemy tackles it; the tackle is reported as an event for the AI
//! pass rather than applied to the enemy directly.

use std::{collections::HashMap, time::Duration};

use ashfall_core::{
    AiState, AudioCue, EnemyId, EnemyView, Event, InputSnapshot, Locomotion, Obstacle,
    PlayerState, Roll, SurfaceMaterial,
};
use ashfall_system_collision::{push_out_of_circle, resolve_all, SpatialGrid, DEFAULT_PASSES};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tuning values of the movement controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Walking speed in units per second.
    pub walk_speed: f32,
    /// Speed multiplier applied while rushing.
    pub rush_multiplier: f32,
    /// Stamina drained per second of rushing.
    pub rush_drain: f32,
    /// Flat stamina cost of a roll.
    pub roll_cost: f32,
    /// Duration of a roll.
    #[serde(with = "ashfall_core::seconds")]
    pub roll_duration: Duration,
    /// Speed multiplier applied while rolling.
    pub roll_multiplier: f32,
    /// Invulnerability granted when a roll starts.
    #[serde(with = "ashfall_core::seconds")]
    pub roll_invulnerability: Duration,
    /// Stamina regained per second once regeneration is allowed.
    pub stamina_regen: f32,
    /// Delay after spending stamina or taking damage before stamina regenerates.
    #[serde(with = "ashfall_core::seconds")]
    pub stamina_regen_delay: Duration,
    /// Health regained per second once regeneration is allowed.
    pub health_regen: f32,
    /// Delay after taking damage before health regenerates.
    #[serde(with = "ashfall_core::seconds")]
    pub health_regen_delay: Duration,
    /// Longest distance covered by one collision sub-step.
    pub max_step: f32,
    /// Distance travelled per footstep cue.
    pub stride: f32,
    /// Knockback impulse per unit of speed per unit of mass.
    pub tackle_force: f32,
    /// Minimum time between two tackles of the same enemy.
    #[serde(with = "ashfall_core::seconds")]
    pub tackle_cooldown: Duration,
    /// Invulnerability granted after taking a hit.
    #[serde(with = "ashfall_core::seconds")]
    pub hit_invulnerability: Duration,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            walk_speed: 4.5,
            rush_multiplier: 1.8,
            rush_drain: 25.0,
            roll_cost: 25.0,
            roll_duration: Duration::from_millis(450),
            roll_multiplier: 2.6,
            roll_invulnerability: Duration::from_millis(350),
            stamina_regen: 20.0,
            stamina_regen_delay: Duration::from_secs(1),
            health_regen: 2.0,
            health_regen_delay: Duration::from_secs(5),
            max_step: 0.2,
            stride: 1.4,
            tackle_force: 60.0,
            tackle_cooldown: Duration::from_millis(500),
            hit_invulnerability: Duration::from_millis(250),
        }
    }
}

/// Read-only surroundings the controller moves through.
#[derive(Clone, Copy, Debug)]
pub struct Surroundings<'a> {
    /// Static obstacles of the sector.
    pub grid: &'a SpatialGrid,
    /// Enemies as they were at the start of the movement pass.
    pub enemies: &'a EnemyView,
    /// Surface reported with footstep cues.
    pub ground: SurfaceMaterial,
    /// Resolver passes per sub-step.
    pub passes: usize,
}

impl<'a> Surroundings<'a> {
    /// Creates surroundings with the default number of resolver passes.
    #[must_use]
    pub fn new(grid: &'a SpatialGrid, enemies: &'a EnemyView, ground: SurfaceMaterial) -> Self {
        Self {
            grid,
            enemies,
            ground,
            passes: DEFAULT_PASSES,
        }
    }
}

/// Moves the player and maintains health and stamina.
#[derive(Debug)]
pub struct PlayerController {
    tuning: MovementTuning,
    nearby: Vec<Obstacle>,
    tackled: HashMap<EnemyId, Duration>,
    stride_progress: f32,
    dash_held: bool,
    last_safe: Vec2,
    death_reported: bool,
}

impl PlayerController {
    /// Creates a controller with the provided tuning.
    #[must_use]
    pub fn new(tuning: MovementTuning) -> Self {
        Self {
            tuning,
            nearby: Vec::new(),
            tackled: HashMap::new(),
            stride_progress: 0.0,
            dash_held: false,
            last_safe: Vec2::ZERO,
            death_reported: false,
        }
    }

    /// Tuning used by the controller.
    #[must_use]
    pub const fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    /// Forgets per-sector bookkeeping and anchors the fallback position at `spawn`.
    pub fn reset(&mut self, spawn: Vec2) {
        self.nearby.clear();
        self.tackled.clear();
        self.stride_progress = 0.0;
        self.dash_held = false;
        self.last_safe = spawn;
        self.death_reported = false;
    }

    /// Advances the player by one tick.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        input: &InputSnapshot,
        surroundings: Surroundings<'_>,
        delta: Duration,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        let dash_pressed = input.dash && !self.dash_held;
        self.dash_held = input.dash;
        let cooldown = self.tuning.tackle_cooldown;
        self.tackled.retain(|_, at| now < *at + cooldown);

        if !player.position.is_finite() {
            log::warn!("player position became non-finite; restoring last safe position");
            player.position = self.last_safe;
        }

        if !player.is_alive() {
            player.velocity = Vec2::ZERO;
            player.locomotion = Locomotion::Idle;
            player.roll = None;
            return;
        }

        let dt = delta.as_secs_f32();
        let movement = input.movement();

        self.update_roll(player, movement, dash_pressed, now, out);
        let rushing = self.update_rush(player, input, movement, dt, now, out);
        self.regenerate(player, rushing, dt, now);

        let velocity = match (player.roll, movement) {
            (Some(roll), _) => {
                player.locomotion = Locomotion::Rolling;
                roll.direction * self.tuning.walk_speed * self.tuning.roll_multiplier
            }
            (None, Some(direction)) if rushing => {
                player.locomotion = Locomotion::Rushing;
                direction * self.tuning.walk_speed * self.tuning.rush_multiplier
            }
            (None, Some(direction)) => {
                player.locomotion = Locomotion::Moving;
                direction * self.tuning.walk_speed
            }
            (None, None) => {
                player.locomotion = Locomotion::Idle;
                Vec2::ZERO
            }
        };

        if let Some(aim) = input.aim_direction() {
            player.facing = yaw_of(aim);
        } else if let Some(roll) = player.roll {
            player.facing = yaw_of(roll.direction);
        } else if let Some(direction) = movement {
            player.facing = yaw_of(direction);
        }

        let start = player.position;
        self.integrate(player, velocity * dt, velocity.length(), surroundings, now, out);

        if !player.position.is_finite() {
            log::warn!("discarding non-finite player step");
            player.position = start;
        }
        player.velocity = if dt > 0.0 {
            (player.position - start) / dt
        } else {
            Vec2::ZERO
        };
        self.last_safe = player.position;

        if player.locomotion == Locomotion::Rolling {
            self.stride_progress = 0.0;
        } else {
            let stride = self.tuning.stride.max(0.01);
            self.stride_progress += player.position.distance(start);
            if self.stride_progress >= stride {
                self.stride_progress %= stride;
                out.push(Event::Cue(AudioCue::Footstep {
                    surface: surroundings.ground,
                }));
            }
        }
    }

    /// Applies a hit reported by the AI pass.
    ///
    /// Hits landing during an invulnerability window are ignored. Returns
    /// whether health was removed.
    pub fn take_hit(
        &mut self,
        player: &mut PlayerState,
        damage: f32,
        now: Duration,
        out: &mut Vec<Event>,
    ) -> bool {
        if !player.is_alive() || now < player.invulnerable_until {
            return false;
        }
        if !damage.is_finite() || damage <= 0.0 {
            return false;
        }

        player.health = (player.health - damage).clamp(0.0, player.max_health);
        player.last_damage = Some(now);
        player.invulnerable_until = now + self.tuning.hit_invulnerability;
        out.push(Event::DamageTaken {
            amount: damage,
            health: player.health,
        });

        if !player.is_alive() && !self.death_reported {
            self.death_reported = true;
            player.locomotion = Locomotion::Idle;
            player.roll = None;
            log::debug!("player died");
            out.push(Event::PlayerDied);
        }
        true
    }

    fn update_roll(
        &mut self,
        player: &mut PlayerState,
        movement: Option<Vec2>,
        dash_pressed: bool,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        if let Some(roll) = player.roll {
            if now >= roll.started_at + self.tuning.roll_duration {
                player.roll = None;
            }
        }

        if !dash_pressed || player.roll.is_some() {
            return;
        }
        if player.arsenal.reloading || player.stamina < self.tuning.roll_cost {
            log::trace!("roll rejected (stamina {:.1})", player.stamina);
            return;
        }

        let direction = movement.unwrap_or_else(|| player.forward());
        player.stamina = (player.stamina - self.tuning.roll_cost).clamp(0.0, player.max_stamina);
        player.last_stamina_use = Some(now);
        player.invulnerable_until = player
            .invulnerable_until
            .max(now + self.tuning.roll_invulnerability);
        player.roll = Some(Roll {
            direction,
            started_at: now,
        });
        out.push(Event::RollStarted { direction });
        out.push(Event::Cue(AudioCue::Roll));
    }

    fn update_rush(
        &mut self,
        player: &mut PlayerState,
        input: &InputSnapshot,
        movement: Option<Vec2>,
        dt: f32,
        now: Duration,
        out: &mut Vec<Event>,
    ) -> bool {
        if !input.rush {
            player.rush_exhausted = false;
        }
        let wants_rush = input.rush
            && movement.is_some()
            && player.roll.is_none()
            && !player.rush_exhausted
            && player.stamina > 0.0;
        if !wants_rush {
            return false;
        }

        player.stamina = (player.stamina - self.tuning.rush_drain * dt).clamp(0.0, player.max_stamina);
        player.last_stamina_use = Some(now);
        if player.stamina <= 0.0 {
            player.rush_exhausted = true;
            out.push(Event::StaminaDepleted);
            return false;
        }
        true
    }

    fn regenerate(&self, player: &mut PlayerState, rushing: bool, dt: f32, now: Duration) {
        let elapsed = |since: Option<Duration>, delay: Duration| {
            since.map_or(true, |at| now >= at + delay)
        };

        let stamina_delay = self.tuning.stamina_regen_delay;
        if !rushing
            && player.roll.is_none()
            && elapsed(player.last_stamina_use, stamina_delay)
            && elapsed(player.last_damage, stamina_delay)
        {
            player.stamina =
                (player.stamina + self.tuning.stamina_regen * dt).clamp(0.0, player.max_stamina);
        }

        if elapsed(player.last_damage, self.tuning.health_regen_delay) {
            player.health =
                (player.health + self.tuning.health_regen * dt).clamp(0.0, player.max_health);
        }
    }

    fn integrate(
        &mut self,
        player: &mut PlayerState,
        displacement: Vec2,
        speed: f32,
        surroundings: Surroundings<'_>,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        let distance = displacement.length();
        if !distance.is_finite() {
            return;
        }
        let max_step = self.tuning.max_step.max(0.01);
        let steps = (distance / max_step).ceil().max(1.0) as u32;
        let step = displacement / steps as f32;
        let heading = displacement.try_normalize().unwrap_or_else(|| player.forward());

        for _ in 0..steps {
            player.position += step;

            surroundings
                .grid
                .query_near(player.position, player.radius, &mut self.nearby);
            let _ = resolve_all(
                &mut player.position,
                player.radius,
                &self.nearby,
                surroundings.passes,
            );

            for enemy in surroundings.enemies.iter() {
                if enemy.state == AiState::Dead {
                    continue;
                }
                if !push_out_of_circle(
                    &mut player.position,
                    player.radius,
                    enemy.position,
                    enemy.radius,
                ) {
                    continue;
                }
                if player.is_charging() && enemy.state == AiState::Attacking {
                    self.tackle(enemy.id, enemy.mass, heading, speed, now, out);
                }
            }

            // Enemies may push the player back into geometry.
            let _ = resolve_all(
                &mut player.position,
                player.radius,
                &self.nearby,
                surroundings.passes,
            );
        }
    }

    fn tackle(
        &mut self,
        enemy: EnemyId,
        mass: f32,
        heading: Vec2,
        speed: f32,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        if self.tackled.contains_key(&enemy) {
            return;
        }
        let impulse = heading * speed * self.tuning.tackle_force / mass.max(1.0);
        let _ = self.tackled.insert(enemy, now);
        log::trace!("tackled enemy {} with impulse {impulse:?}", enemy.get());
        out.push(Event::EnemyTackled { enemy, impulse });
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(MovementTuning::default())
    }
}

/// Restores health, clamped to the maximum. Returns the amount actually restored.
pub fn restore_health(player: &mut PlayerState, amount: f32) -> f32 {
    if !player.is_alive() || !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    let before = player.health;
    player.health = (player.health + amount).clamp(0.0, player.max_health);
    player.health - before
}

fn yaw_of(direction: Vec2) -> f32 {
    direction.x.atan2(direction.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ashfall_core::Loadout;

    #[test]
    fn yaw_matches_forward_convention() {
        let mut player = PlayerState::spawn(Vec2::ZERO, &Loadout::standard());
        player.facing = yaw_of(Vec2::new(1.0, 0.0));
        assert_relative_eq!(player.forward().x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(player.forward().y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn restore_health_clamps_to_maximum() {
        let mut player = PlayerState::spawn(Vec2::ZERO, &Loadout::standard());
        player.health = 90.0;

        let restored = restore_health(&mut player, 25.0);

        assert_relative_eq!(restored, 10.0);
        assert_relative_eq!(player.health, player.max_health);
    }

    #[test]
    fn dead_players_are_not_healed() {
        let mut player = PlayerState::spawn(Vec2::ZERO, &Loadout::standard());
        player.health = 0.0;
        assert_eq!(restore_health(&mut player, 50.0), 0.0);
    }

    #[test]
    fn tuning_parses_from_toml_with_defaults() {
        let tuning: MovementTuning = toml::from_str(
            r#"
walk_speed = 5.0
roll_duration = 0.5
"#,
        )
        .expect("tuning parses");

        assert_relative_eq!(tuning.walk_speed, 5.0);
        assert_eq!(tuning.roll_duration, Duration::from_millis(500));
        assert_eq!(tuning.max_step, MovementTuning::default().max_step);
    }
}
