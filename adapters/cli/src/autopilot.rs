//! Scripted player used for headless runs.

use ashfall_core::{AiState, InputSnapshot, WeaponKind};
use ashfall_world::{query, World};
use glam::Vec2;

const ENGAGE_RANGE: f32 = 16.0;
const KITE_RANGE: f32 = 3.5;
const SHOTGUN_RANGE: f32 = 5.0;
const ROLL_RANGE: f32 = 2.2;
const ROLL_STAMINA: f32 = 40.0;
const GRENADE_CROWD: usize = 5;
const GRENADE_RADIUS: f32 = 7.0;
const GRENADE_HOLD: u32 = 30;
const WANDER_PERIOD: u32 = 180;

/// Derives one input snapshot per tick from the current world state.
///
/// Fights the nearest enemy, backs off when it gets close, rolls through
/// attackers, and lobs a grenade into crowds.
#[derive(Debug, Default)]
pub struct Autopilot {
    tick: u32,
    holding: u32,
    thrown: bool,
}

impl Autopilot {
    /// Creates an autopilot at the start of a run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for the next tick.
    pub fn input_for(&mut self, world: &World) -> InputSnapshot {
        self.tick = self.tick.wrapping_add(1);
        let player = query::player(world);
        let hud = query::hud(world);
        let mut input = InputSnapshot::default();

        let Some(enemy) = query::nearest_enemy(world, player.position) else {
            self.holding = 0;
            self.thrown = false;
            wander(self.tick, &mut input);
            input.reload = !hud.reloading && hud.ammo < hud.magazine / 2;
            return input;
        };

        let offset = enemy.position - player.position;
        let distance = offset.length();
        input.aim = offset.try_normalize();

        if distance < KITE_RANGE {
            steer(-offset, &mut input);
        } else if distance > ENGAGE_RANGE {
            steer(offset, &mut input);
        }

        if enemy.state == AiState::Attacking
            && distance < ROLL_RANGE + enemy.radius
            && player.stamina >= ROLL_STAMINA
            && !hud.reloading
        {
            input.dash = true;
            steer(Vec2::new(-offset.y, offset.x), &mut input);
        }

        let crowd = query::enemy_view(world)
            .iter()
            .filter(|other| other.state != AiState::Dead)
            .filter(|other| other.position.distance(enemy.position) < GRENADE_RADIUS)
            .count();
        let grenades = player.arsenal.ammo_for(WeaponKind::Grenade);

        if hud.weapon == WeaponKind::Grenade {
            // Releasing and switching in one tick would cancel the throw.
            if self.holding >= GRENADE_HOLD {
                self.holding = 0;
                self.thrown = true;
            } else if !self.thrown && grenades > 0 {
                self.holding += 1;
                input.fire = true;
            } else {
                self.thrown = false;
                input.select_weapon = Some(WeaponKind::Rifle);
            }
            return input;
        }

        let wanted = if crowd >= GRENADE_CROWD && grenades > 0 && distance > SHOTGUN_RANGE {
            WeaponKind::Grenade
        } else if distance < SHOTGUN_RANGE {
            WeaponKind::Shotgun
        } else {
            WeaponKind::Rifle
        };
        if wanted != hud.weapon && !hud.reloading {
            input.select_weapon = Some(wanted);
            return input;
        }

        input.fire = distance <= ENGAGE_RANGE;
        input
    }
}

fn steer(direction: Vec2, input: &mut InputSnapshot) {
    input.forward = direction.y > 0.25;
    input.backward = direction.y < -0.25;
    input.right = direction.x > 0.25;
    input.left = direction.x < -0.25;
}

fn wander(tick: u32, input: &mut InputSnapshot) {
    match (tick / WANDER_PERIOD) % 4 {
        0 => input.forward = true,
        1 => input.right = true,
        2 => input.backward = true,
        _ => input.left = true,
    }
}
