#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state and frame orchestration for Ashfall.
//!
//! The world owns every system together with the shared collision grid and
//! particle pool, and advances them in a fixed order on each tick: player
//! movement, enemy AI, weapons and projectiles, then the particle pool.
//! Adapters mutate it only through [`apply`] and read it through [`query`].

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use ashfall_core::{
    BossSpec, Command, EffectKind, EnemyKind, Event, HordeSpec, InputSnapshot, Obstacle,
    ObstacleId, PickupKind, PlayerState, SectorContent, SpawnRejection, SpawnRequest,
    SurfaceMaterial,
};
use ashfall_system_collision::SpatialGrid;
use ashfall_system_combat::{lift, Battlefield, WeaponSystem};
use ashfall_system_enemy_ai::{EnemyAi, EnemyRoster, Target};
use ashfall_system_movement::{restore_health, PlayerController, Surroundings};
use ashfall_system_particles::{EffectRequest, ParticlePool};
use glam::Vec2;

pub mod config;
mod dispatch;
mod pickups;

pub use config::{ConfigError, SimulationConfig};
pub use dispatch::{dispatch, push_hud, Collaborators};
pub use pickups::Pickup;

const WEAPON_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;
const LOOT_SEED_SALT: u64 = 0xc2b2_ae3d_27d4_eb4f;
const PARTICLE_SEED_SALT: u64 = 0x1656_67b1_9e37_79f9;

#[derive(Debug)]
struct ActiveSector {
    name: String,
    ground: SurfaceMaterial,
    spawn_points: Vec<Vec2>,
    hordes: VecDeque<HordeSpec>,
    boss: Option<BossSpec>,
    elapsed: Duration,
}

/// Represents the authoritative Ashfall world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    sector: Option<ActiveSector>,
    grid: SpatialGrid,
    durability: BTreeMap<ObstacleId, f32>,
    player: PlayerState,
    controller: PlayerController,
    roster: EnemyRoster,
    ai: EnemyAi,
    weapons: WeaponSystem,
    pool: ParticlePool,
    loot: pickups::Loot,
    next_interaction: Duration,
    now: Duration,
    tick_index: u64,
    score: u64,
    prop_hits: Vec<(ObstacleId, f32)>,
    kills: Vec<(EnemyKind, Vec2)>,
}

impl World {
    /// Creates an empty world. Nothing simulates until a sector is loaded.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let seed = config.seed;
        let loadout = ashfall_core::Loadout::standard();
        let mut pool = ParticlePool::new(config.particle_budget, seed ^ PARTICLE_SEED_SALT);
        pool.prewarm(config.particle_prewarm);
        Self {
            grid: SpatialGrid::new(config.cell_size),
            durability: BTreeMap::new(),
            player: PlayerState::spawn(Vec2::ZERO, &loadout),
            controller: PlayerController::new(config.movement),
            roster: EnemyRoster::new(config.ai, seed),
            ai: EnemyAi::new(config.resolver_passes),
            weapons: WeaponSystem::new(config.combat, loadout, seed ^ WEAPON_SEED_SALT),
            pool,
            loot: pickups::Loot::new(seed ^ LOOT_SEED_SALT),
            sector: None,
            next_interaction: Duration::ZERO,
            now: Duration::ZERO,
            tick_index: 0,
            score: 0,
            prop_hits: Vec::new(),
            kills: Vec::new(),
            config,
        }
    }

    fn load_sector(&mut self, content: SectorContent, out: &mut Vec<Event>) {
        self.teardown(out);
        if let Err(error) = config::validate_sector(&content) {
            log::warn!("refusing to load sector {}: {error}", content.name);
            return;
        }

        let obstacles: Vec<Obstacle> = content
            .obstacles
            .iter()
            .zip(1_u32..)
            .map(|(spec, id)| Obstacle {
                id: ObstacleId::new(id),
                position: spec.position,
                shape: spec.shape,
                material: spec.material,
                durability: spec.durability,
            })
            .collect();
        self.grid = SpatialGrid::new(self.config.cell_size);
        self.grid.rebuild(obstacles.iter().copied());
        self.durability = obstacles
            .iter()
            .filter_map(|obstacle| obstacle.durability.map(|left| (obstacle.id, left)))
            .collect();

        let seed = self.config.seed;
        self.roster.reseed(seed);
        self.weapons.reseed(seed ^ WEAPON_SEED_SALT);
        self.loot.reseed(seed ^ LOOT_SEED_SALT);
        self.weapons.set_loadout(content.loadout.clone());
        self.player = PlayerState::spawn(content.player_spawn, &content.loadout);
        self.controller.reset(content.player_spawn);
        self.next_interaction = Duration::ZERO;
        self.score = 0;

        let mut hordes = content.hordes.clone();
        hordes.sort_by_key(|horde| horde.at);
        log::debug!(
            "loaded sector {} with {} obstacles and {} scheduled hordes",
            content.name,
            self.grid.len(),
            hordes.len()
        );
        out.push(Event::SectorLoaded {
            obstacles: self.grid.len(),
            spawn_points: content.spawn_points.len(),
        });
        self.sector = Some(ActiveSector {
            name: content.name,
            ground: content.ground,
            spawn_points: content.spawn_points,
            hordes: hordes.into(),
            boss: content.boss,
            elapsed: Duration::ZERO,
        });
    }

    /// Clears every projectile, effect, enemy and pickup in one step.
    fn teardown(&mut self, out: &mut Vec<Event>) {
        let Some(sector) = self.sector.take() else {
            return;
        };
        self.weapons.reset(out);
        self.roster.clear(out);
        self.loot.clear(out);
        self.pool.reset();
        self.grid.clear();
        self.durability.clear();
        self.player = PlayerState::spawn(Vec2::ZERO, self.weapons.loadout());
        self.controller.reset(Vec2::ZERO);
        log::debug!("tore down sector {}", sector.name);
        out.push(Event::SectorTornDown);
    }

    fn tick(&mut self, delta: Duration, now: Duration, input: &InputSnapshot, out: &mut Vec<Event>) {
        let delta = delta.min(self.config.max_delta);
        self.tick_index = self.tick_index.wrapping_add(1);
        self.now = now;
        out.push(Event::TimeAdvanced { delta, now });

        let Some(sector) = self.sector.as_mut() else {
            return;
        };
        sector.elapsed += delta;
        let ground = sector.ground;
        let start = out.len();

        let view = self.roster.view(now);
        let mut surroundings = Surroundings::new(&self.grid, &view, ground);
        surroundings.passes = self.config.resolver_passes;
        self.controller
            .update(&mut self.player, input, surroundings, delta, now, out);
        self.ai.absorb_tackles(&mut self.roster, &out[start..], now);

        self.run_schedule(out);
        let target = Target {
            position: self.player.position,
            radius: self.player.radius,
            alive: self.player.is_alive(),
        };
        let bites = out.len();
        self.ai
            .update(&mut self.roster, &self.grid, target, delta, now, out);
        for index in bites..out.len() {
            if let Event::PlayerHit { damage, .. } = out[index] {
                let _ = self.controller.take_hit(&mut self.player, damage, now, out);
            }
        }

        let combat = out.len();
        let field = Battlefield {
            grid: &self.grid,
            roster: &mut self.roster,
            pool: &mut self.pool,
        };
        self.weapons
            .update(&mut self.player, input, field, delta, now, out);
        self.settle_combat(combat, out);

        if now >= self.next_interaction {
            self.next_interaction = now + self.config.interaction_interval;
            self.interact(out);
        }

        self.pool.update(delta, out);

        for event in &out[start..] {
            if let Event::ScoreDelta { points } = *event {
                self.score = self.score.saturating_add(u64::from(points));
            }
        }
        log::trace!(
            "tick {} simulated {:?} with {} events",
            self.tick_index,
            delta,
            out.len() - start
        );
    }

    fn run_schedule(&mut self, out: &mut Vec<Event>) {
        let Some(sector) = self.sector.as_mut() else {
            return;
        };
        while let Some(horde) = sector.hordes.front().copied() {
            if horde.at > sector.elapsed {
                break;
            }
            let _ = sector.hordes.pop_front();
            let Some(origin) = sector.spawn_points.get(horde.spawn_point).copied() else {
                continue;
            };
            let spawned =
                self.roster
                    .spawn_horde(origin, horde.count, horde.kind, &self.grid, out);
            log::debug!("horde of {spawned}/{} arrived at {origin:?}", horde.count);
        }

        if let Some(boss) = sector.boss.filter(|boss| boss.at <= sector.elapsed) {
            sector.boss = None;
            let request = SpawnRequest {
                origin: boss.position,
                kind: Some(boss.kind),
                position: Some(boss.position),
                boss: Some(boss.id),
            };
            let _ = self.roster.spawn(request, &self.grid, out);
        }
    }

    fn settle_combat(&mut self, from: usize, out: &mut Vec<Event>) {
        self.prop_hits.clear();
        self.kills.clear();
        for event in &out[from..] {
            match *event {
                Event::PropHit { obstacle, damage } => self.prop_hits.push((obstacle, damage)),
                Event::EnemyKilled { kind, position, .. } => self.kills.push((kind, position)),
                _ => {}
            }
        }

        for index in 0..self.prop_hits.len() {
            let (obstacle, damage) = self.prop_hits[index];
            let Some(left) = self.durability.get_mut(&obstacle) else {
                continue;
            };
            *left -= damage;
            if *left <= 0.0 {
                self.destroy_obstacle(obstacle, out);
            }
        }
        for &(kind, position) in &self.kills {
            self.loot.roll(kind, position, out);
        }
    }

    /// Removes an obstacle from the grid. The world is the grid's only structural writer.
    fn destroy_obstacle(&mut self, id: ObstacleId, out: &mut Vec<Event>) {
        let _ = self.durability.remove(&id);
        let Some(obstacle) = self.grid.remove(id) else {
            return;
        };
        log::debug!("obstacle {} destroyed", id.get());
        self.pool.request(EffectRequest::burst(
            EffectKind::Debris,
            lift(obstacle.position, 0.5),
            12,
            3.0,
        ));
        out.push(Event::ObstacleDestroyed { obstacle: id });
    }

    fn interact(&mut self, out: &mut Vec<Event>) {
        if !self.player.is_alive() {
            return;
        }
        let point = self.player.position;
        let reach = self.player.radius + self.config.pickup_radius;
        let health = self.config.health_pickup;
        let player = &mut self.player;
        let weapons = &self.weapons;
        self.loot.collect(
            point,
            reach,
            |kind| match kind {
                PickupKind::Health => restore_health(player, health) > 0.0,
                PickupKind::ThrowableCharge => weapons.add_throwable_charge(player),
            },
            out,
        );
        self.roster.sight_bosses(point, out);
    }

    fn require_sector(&self, out: &mut Vec<Event>) -> bool {
        if self.sector.is_none() {
            out.push(Event::SpawnRejected {
                reason: SpawnRejection::NoSector,
            });
            return false;
        }
        true
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadSector { content } => world.load_sector(*content, out_events),
        Command::TeardownSector => world.teardown(out_events),
        Command::Tick { delta, now, input } => world.tick(delta, now, &input, out_events),
        Command::SpawnEnemy(request) => {
            if world.require_sector(out_events) {
                let _ = world.roster.spawn(request, &world.grid, out_events);
            }
        }
        Command::SpawnHorde {
            origin,
            count,
            kind,
        } => {
            if world.require_sector(out_events) {
                let _ = world
                    .roster
                    .spawn_horde(origin, count, kind, &world.grid, out_events);
            }
        }
        Command::SetUnlimitedAmmo { enabled } => {
            log::debug!("unlimited ammo {}", if enabled { "on" } else { "off" });
            world.weapons.set_unlimited_ammo(enabled);
        }
        Command::RemoveObstacle { obstacle } => world.destroy_obstacle(obstacle, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use ashfall_core::{
        EffectKind, EnemySnapshot, EnemyView, HudSnapshot, Obstacle, PlayerState,
    };
    use ashfall_system_collision::SpatialGrid;
    use ashfall_system_combat::Projectile;
    use ashfall_system_particles::ParticlePool;
    use glam::{Mat4, Vec2, Vec3};

    use super::{Pickup, SimulationConfig, World};

    /// Settings the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Reports whether a sector is currently active.
    #[must_use]
    pub fn is_sector_loaded(world: &World) -> bool {
        world.sector.is_some()
    }

    /// Name of the active sector.
    #[must_use]
    pub fn sector_name(world: &World) -> Option<&str> {
        world.sector.as_ref().map(|sector| sector.name.as_str())
    }

    /// Sector time simulated since the active sector loaded.
    #[must_use]
    pub fn sector_elapsed(world: &World) -> Duration {
        world
            .sector
            .as_ref()
            .map_or(Duration::ZERO, |sector| sector.elapsed)
    }

    /// Reports whether a circle of `radius` at `point` overlaps static geometry.
    #[must_use]
    pub fn is_point_blocked(world: &World, point: Vec2, radius: f32) -> bool {
        let mut scratch = Vec::new();
        world.grid.is_blocked(point, radius, &mut scratch)
    }

    /// Obstacles whose bounds come within `radius` of `point`, in identifier order.
    #[must_use]
    pub fn obstacles_near(world: &World, point: Vec2, radius: f32) -> Vec<Obstacle> {
        let mut found = Vec::new();
        world.grid.query_near(point, radius, &mut found);
        found
    }

    /// Read-only access to the collision grid.
    #[must_use]
    pub fn grid(world: &World) -> &SpatialGrid {
        &world.grid
    }

    /// Living enemy closest to `point`.
    #[must_use]
    pub fn nearest_enemy(world: &World, point: Vec2) -> Option<EnemySnapshot> {
        world
            .roster
            .nearest_living(point)
            .map(|enemy| enemy.snapshot(world.now))
    }

    /// Captures a read-only view of every enemy in the sector.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        world.roster.view(world.now)
    }

    /// Authoritative state of the player.
    #[must_use]
    pub fn player(world: &World) -> &PlayerState {
        &world.player
    }

    /// Projectiles and thrown weapons in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> &[Projectile] {
        world.weapons.projectiles()
    }

    /// Predicted path of the throwable being charged. Empty when not charging.
    #[must_use]
    pub fn trajectory(world: &World) -> &[Vec3] {
        world.weapons.trajectory()
    }

    /// Pickups lying on the ground.
    #[must_use]
    pub fn pickups(world: &World) -> &[Pickup] {
        world.loot.pickups()
    }

    /// Read-only access to the particle pool.
    #[must_use]
    pub fn particles(world: &World) -> &ParticlePool {
        &world.pool
    }

    /// Instance transforms of the provided effect kind for the instanced draw path.
    #[must_use]
    pub fn particle_instances(world: &World, kind: EffectKind) -> &[Mat4] {
        world.pool.instances(kind)
    }

    /// Score accumulated in the active sector.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score
    }

    /// Reports whether firing currently consumes ammo.
    #[must_use]
    pub fn unlimited_ammo(world: &World) -> bool {
        world.weapons.unlimited_ammo()
    }

    /// Data the HUD presents after a tick.
    #[must_use]
    pub fn hud(world: &World) -> HudSnapshot {
        let player = &world.player;
        let arsenal = &player.arsenal;
        HudSnapshot {
            health: player.health,
            max_health: player.max_health,
            stamina: player.stamina,
            max_stamina: player.max_stamina,
            weapon: arsenal.active,
            ammo: arsenal.active_ammo(),
            magazine: world
                .weapons
                .loadout()
                .get(arsenal.active)
                .map_or(0, |tuning| tuning.magazine),
            reloading: arsenal.reloading,
            charge: world.weapons.charge(player, world.now),
            enemies: world.roster.iter().filter(|enemy| enemy.is_alive()).count(),
            boss: world.roster.boss_health(),
        }
    }
}
