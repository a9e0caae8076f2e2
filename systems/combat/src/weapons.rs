//! Trigger handling: fire gating, ammunition, reloads, switching and throwable charge.

use std::time::Duration;

use ashfall_core::{
    Arsenal, AudioCue, EffectKind, Event, InputSnapshot, Loadout, PlayerState, ProjectileId,
    VisualNode, WeaponBehavior, WeaponKind, WeaponTuning,
};
use ashfall_system_particles::EffectRequest;
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    ballistics, flight, ground, lift, Battlefield, CombatTuning, Payload, Projectile,
    TRAJECTORY_POINTS,
};

/// Fires, reloads and switches the player's weapons and flies their projectiles.
#[derive(Debug)]
pub struct WeaponSystem {
    tuning: CombatTuning,
    loadout: Loadout,
    unlimited_ammo: bool,
    projectiles: Vec<Projectile>,
    next_id: u32,
    trajectory: Vec<Vec3>,
    fire_held: bool,
    rng: ChaCha8Rng,
    scratch: flight::Scratch,
}

impl WeaponSystem {
    /// Creates a weapon system for the provided loadout.
    #[must_use]
    pub fn new(tuning: CombatTuning, loadout: Loadout, seed: u64) -> Self {
        Self {
            tuning,
            loadout,
            unlimited_ammo: false,
            projectiles: Vec::new(),
            next_id: 0,
            trajectory: Vec::with_capacity(TRAJECTORY_POINTS),
            fire_held: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            scratch: flight::Scratch::default(),
        }
    }

    /// Tuning used by the system.
    #[must_use]
    pub const fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Weapons the player carries.
    #[must_use]
    pub const fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    /// Replaces the loadout. Used when a sector loads.
    pub fn set_loadout(&mut self, loadout: Loadout) {
        self.loadout = loadout;
    }

    /// Toggles the debug mode in which firing never consumes ammo.
    pub fn set_unlimited_ammo(&mut self, enabled: bool) {
        self.unlimited_ammo = enabled;
    }

    /// Reports whether firing currently consumes ammo.
    #[must_use]
    pub const fn unlimited_ammo(&self) -> bool {
        self.unlimited_ammo
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Predicted path of the throwable being charged. Empty when not charging.
    #[must_use]
    pub fn trajectory(&self) -> &[Vec3] {
        &self.trajectory
    }

    /// Charge ratio of the throwable being held, if any.
    #[must_use]
    pub fn charge(&self, player: &PlayerState, now: Duration) -> Option<f32> {
        let started = player.arsenal.charge_started?;
        match self.loadout.get(player.arsenal.active)?.behavior {
            WeaponBehavior::Throwable { max_charge, .. } => {
                Some(ballistics::charge_ratio(started, now, max_charge))
            }
            _ => None,
        }
    }

    /// Adds one charge to the first throwable in the loadout. Returns whether a charge was added.
    pub fn add_throwable_charge(&self, player: &mut PlayerState) -> bool {
        let Some(tuning) = self
            .loadout
            .weapons
            .iter()
            .find(|tuning| !tuning.reloads())
        else {
            return false;
        };
        let held = player.arsenal.ammo_for(tuning.kind);
        if held >= tuning.magazine {
            return false;
        }
        let _ = player.arsenal.ammo.insert(tuning.kind, held + 1);
        true
    }

    /// Drops every projectile in flight and releases their visual nodes.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        for projectile in self.projectiles.drain(..) {
            out.push(Event::NodeDetached {
                node: VisualNode::Projectile(projectile.id),
            });
        }
        self.trajectory.clear();
        self.fire_held = false;
    }

    /// Restarts the spread random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Handles the tick's weapon input and advances every projectile.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        input: &InputSnapshot,
        mut field: Battlefield<'_>,
        delta: Duration,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        let fire_pressed = input.fire && !self.fire_held;
        self.fire_held = input.fire;

        if player.is_alive() {
            if let Some(kind) = input.select_weapon {
                self.switch(&mut player.arsenal, kind, out);
            }
            self.finish_reload(&mut player.arsenal, now, out);

            if let Some(weapon) = self.loadout.get(player.arsenal.active).copied() {
                if input.reload && player.arsenal.active_ammo() < weapon.magazine {
                    let _ = start_reload(&mut player.arsenal, &weapon, now, out);
                }
                match weapon.behavior {
                    WeaponBehavior::Projectile {
                        pellets,
                        spread,
                        speed,
                        lifetime,
                        stagger,
                    } => {
                        if input.fire && self.ready(&mut player.arsenal, &weapon, now, out) {
                            let shot = Shot {
                                pellets,
                                spread,
                                speed,
                                lifetime,
                                stagger,
                            };
                            self.fire(player, &weapon, shot, &mut field, now, out);
                        }
                    }
                    WeaponBehavior::Continuous { range, half_width } => {
                        if input.fire && self.ready(&mut player.arsenal, &weapon, now, out) {
                            self.pulse(
                                player,
                                &weapon,
                                range,
                                half_width,
                                fire_pressed,
                                &mut field,
                                now,
                                out,
                            );
                        }
                    }
                    WeaponBehavior::Throwable { .. } => {
                        self.throw(player, &weapon, input.fire, fire_pressed, now, out);
                    }
                }
            }
        } else {
            player.arsenal.charge_started = None;
            self.trajectory.clear();
        }

        flight::advance(
            &mut self.projectiles,
            &mut field,
            &self.tuning,
            &mut self.scratch,
            delta.as_secs_f32(),
            now,
            out,
        );
    }

    fn switch(&mut self, arsenal: &mut Arsenal, kind: WeaponKind, out: &mut Vec<Event>) {
        if kind == arsenal.active {
            return;
        }
        if arsenal.reloading {
            log::trace!("switch to {kind:?} rejected while reloading");
            return;
        }
        let Some(tuning) = self.loadout.get(kind) else {
            return;
        };
        if !tuning.reloads() && arsenal.ammo_for(kind) == 0 && !self.unlimited_ammo {
            out.push(Event::Cue(AudioCue::EmptyClick { weapon: kind }));
            return;
        }

        arsenal.active = kind;
        arsenal.charge_started = None;
        arsenal.reloading = false;
        self.trajectory.clear();
        out.push(Event::WeaponSwitched { weapon: kind });
    }

    fn finish_reload(&self, arsenal: &mut Arsenal, now: Duration, out: &mut Vec<Event>) {
        if !arsenal.reloading || now <= arsenal.reload_end {
            return;
        }
        let weapon = arsenal.active;
        let magazine = self
            .loadout
            .get(weapon)
            .map_or(0, |tuning| tuning.magazine);
        let _ = arsenal.ammo.insert(weapon, magazine);
        arsenal.reloading = false;
        out.push(Event::ReloadFinished { weapon });
        out.push(Event::Cue(AudioCue::ReloadEnd { weapon }));
    }

    /// Checks the reload, ammo and cooldown gates; an empty trigger pull starts a reload.
    fn ready(
        &self,
        arsenal: &mut Arsenal,
        weapon: &WeaponTuning,
        now: Duration,
        out: &mut Vec<Event>,
    ) -> bool {
        if arsenal.reloading {
            return false;
        }
        if !self.has_round(arsenal) {
            out.push(Event::Cue(AudioCue::EmptyClick {
                weapon: weapon.kind,
            }));
            let _ = start_reload(arsenal, weapon, now, out);
            return false;
        }
        cooled(arsenal, weapon, now)
    }

    fn has_round(&self, arsenal: &Arsenal) -> bool {
        self.unlimited_ammo || arsenal.active_ammo() > 0
    }

    fn consume(&self, arsenal: &mut Arsenal, now: Duration) {
        arsenal.last_shot = Some(now);
        if self.unlimited_ammo {
            return;
        }
        if let Some(ammo) = arsenal.ammo.get_mut(&arsenal.active) {
            *ammo = ammo.saturating_sub(1);
        }
    }

    fn fire(
        &mut self,
        player: &mut PlayerState,
        weapon: &WeaponTuning,
        shot: Shot,
        field: &mut Battlefield<'_>,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        self.consume(&mut player.arsenal, now);
        let forward = player.forward();
        let muzzle = lift(
            player.position + forward * player.radius,
            self.tuning.muzzle_height,
        );

        let half_spread = shot.spread.max(0.0) * 0.5;
        for _ in 0..shot.pellets.max(1) {
            let offset = if half_spread > 0.0 {
                self.rng.gen_range(-half_spread..=half_spread)
            } else {
                0.0
            };
            let direction = Vec2::from_angle(-offset).rotate(forward);
            self.launch(
                weapon.kind,
                muzzle,
                lift(direction * shot.speed, 0.0),
                now + shot.lifetime,
                None,
                Payload::Bullet {
                    damage: weapon.damage,
                    stagger: shot.stagger,
                },
                weapon.impact,
                out,
            );
        }

        field
            .pool
            .request(EffectRequest::single(EffectKind::MuzzleFlash, muzzle));
        out.push(Event::WeaponFired {
            weapon: weapon.kind,
        });
        out.push(Event::Cue(AudioCue::WeaponFire {
            weapon: weapon.kind,
        }));
    }

    #[allow(clippy::too_many_arguments)]
    fn pulse(
        &mut self,
        player: &mut PlayerState,
        weapon: &WeaponTuning,
        range: f32,
        half_width: f32,
        fire_pressed: bool,
        field: &mut Battlefield<'_>,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        self.consume(&mut player.arsenal, now);
        let origin = player.position;
        let forward = player.forward();
        let end = origin + forward * range.max(0.0);

        let reach = match field
            .grid
            .first_hit(origin, end, 0.0, &mut self.scratch.obstacles)
        {
            Some(hit) => {
                let point = lift(origin.lerp(end, hit.t), self.tuning.muzzle_height * 0.5);
                flight::strike_obstacle(&hit.obstacle, weapon.damage, point, weapon.impact, field, out);
                range * hit.t
            }
            None => range,
        };

        self.scratch.targets.clear();
        self.scratch.targets.extend(
            field
                .roster
                .iter()
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| (enemy.id, enemy.position, enemy.radius, enemy.mass)),
        );
        for &(enemy, position, radius, _) in &self.scratch.targets {
            let relative = position - origin;
            let along = relative.dot(forward);
            if along < 0.0 || along > reach + radius {
                continue;
            }
            if relative.perp_dot(forward).abs() > half_width + radius {
                continue;
            }
            let _ = field
                .roster
                .apply_damage(enemy, weapon.damage, Some(weapon.kind), out);
            field.pool.request(EffectRequest::burst(
                weapon.impact,
                lift(position, 1.0),
                2,
                1.5,
            ));
        }

        let tip = lift(origin + forward * reach, self.tuning.muzzle_height);
        field
            .pool
            .request(EffectRequest::burst(weapon.impact, tip, 2, 1.0));
        out.push(Event::WeaponFired {
            weapon: weapon.kind,
        });
        if fire_pressed {
            out.push(Event::Cue(AudioCue::WeaponFire {
                weapon: weapon.kind,
            }));
        }
    }

    fn throw(
        &mut self,
        player: &mut PlayerState,
        weapon: &WeaponTuning,
        held: bool,
        pressed: bool,
        now: Duration,
        out: &mut Vec<Event>,
    ) {
        let WeaponBehavior::Throwable {
            min_distance,
            max_distance,
            max_charge,
            blast_radius,
            fuse,
        } = weapon.behavior
        else {
            return;
        };

        let started = match player.arsenal.charge_started {
            Some(started) => started,
            None => {
                if !pressed || player.arsenal.reloading {
                    return;
                }
                if !self.has_round(&player.arsenal) {
                    out.push(Event::Cue(AudioCue::EmptyClick {
                        weapon: weapon.kind,
                    }));
                    return;
                }
                if !cooled(&player.arsenal, weapon, now) {
                    return;
                }
                player.arsenal.charge_started = Some(now);
                now
            }
        };

        let ratio = ballistics::charge_ratio(started, now, max_charge);
        let forward = player.forward();
        let distance = ballistics::throw_distance(min_distance, max_distance, ratio);
        let origin = lift(
            player.position + forward * player.radius,
            self.tuning.muzzle_height,
        );
        let velocity = ballistics::launch_velocity(forward, distance, origin.y);

        if held {
            ballistics::sample_trajectory(origin, velocity, &mut self.trajectory);
            return;
        }

        player.arsenal.charge_started = None;
        self.trajectory.clear();
        self.consume(&mut player.arsenal, now);
        self.launch(
            weapon.kind,
            origin,
            velocity,
            now + fuse,
            Some(ratio),
            Payload::Explosive {
                damage: weapon.damage,
                blast_radius,
                fuse_end: now + fuse,
            },
            weapon.impact,
            out,
        );
        log::trace!(
            "{:?} thrown {distance:.1} units toward {:?}",
            weapon.kind,
            ground(origin) + forward * distance
        );
        out.push(Event::WeaponFired {
            weapon: weapon.kind,
        });
        out.push(Event::Cue(AudioCue::WeaponFire {
            weapon: weapon.kind,
        }));
    }

    #[allow(clippy::too_many_arguments)]
    fn launch(
        &mut self,
        weapon: WeaponKind,
        position: Vec3,
        velocity: Vec3,
        expires_at: Duration,
        charge: Option<f32>,
        payload: Payload,
        impact: EffectKind,
        out: &mut Vec<Event>,
    ) {
        let id = ProjectileId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.projectiles.push(Projectile {
            id,
            weapon,
            position,
            velocity,
            expires_at,
            charge,
            payload,
            impact,
        });
        out.push(Event::NodeAttached {
            node: VisualNode::Projectile(id),
        });
    }
}

#[derive(Clone, Copy, Debug)]
struct Shot {
    pellets: u8,
    spread: f32,
    speed: f32,
    lifetime: Duration,
    stagger: Option<Duration>,
}

fn cooled(arsenal: &Arsenal, weapon: &WeaponTuning, now: Duration) -> bool {
    arsenal
        .last_shot
        .map_or(true, |at| now > at + weapon.fire_rate)
}

/// Starts a reload of the weapon unless it never reloads or one is already running.
fn start_reload(
    arsenal: &mut Arsenal,
    weapon: &WeaponTuning,
    now: Duration,
    out: &mut Vec<Event>,
) -> bool {
    if !weapon.reloads() || arsenal.reloading {
        return false;
    }
    let ready_at = now + weapon.reload_time;
    arsenal.reloading = true;
    arsenal.reload_end = ready_at;
    arsenal.charge_started = None;
    log::trace!("reloading {:?} until {ready_at:?}", weapon.kind);
    out.push(Event::ReloadStarted {
        weapon: weapon.kind,
        ready_at,
    });
    out.push(Event::Cue(AudioCue::ReloadStart {
        weapon: weapon.kind,
    }));
    true
}
