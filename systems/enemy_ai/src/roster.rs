//! Living enemies, budgeted spawning, knockback and removal.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use ashfall_core::{
    AiState, BossId, EnemyId, EnemyKind, EnemySnapshot, EnemyView, Event, Obstacle, SpawnRejection,
    SpawnRequest, VisualNode, WeaponKind,
};
use ashfall_system_collision::SpatialGrid;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::AiTuning;

/// Authoritative state of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Enemy {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Boss identity, when the enemy is a boss.
    pub boss: Option<BossId>,
    /// Position on the ground plane.
    pub position: Vec2,
    /// Yaw in radians, using the player's convention.
    pub facing: f32,
    /// Decaying impulse velocity added on top of locomotion.
    pub knockback: Vec2,
    /// Current AI state.
    pub state: AiState,
    /// Remaining health.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// Scale rolled at spawn.
    pub scale: f32,
    /// Collision radius after scaling.
    pub radius: f32,
    /// Mass after scaling.
    pub mass: f32,
    /// Locomotion is suppressed while `now < stun_until`.
    pub stun_until: Duration,
    /// Decision logic is suppressed while `now < blind_until`.
    pub blind_until: Duration,
    /// Timestamp at which the current bite started winding up.
    pub windup_started: Option<Duration>,
    /// Timestamp of the last bite that connected.
    pub last_bite: Option<Duration>,
}

impl Enemy {
    /// Reports whether the enemy has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state != AiState::Dead
    }

    /// Reports whether decision logic is suppressed at `now`.
    #[must_use]
    pub fn is_blinded(&self, now: Duration) -> bool {
        now < self.blind_until
    }

    /// Reports whether locomotion is suppressed at `now`.
    #[must_use]
    pub fn is_stunned(&self, now: Duration) -> bool {
        now < self.stun_until
    }

    /// Time left on the stun timer.
    #[must_use]
    pub fn stun_remaining(&self, now: Duration) -> Duration {
        self.stun_until.saturating_sub(now)
    }

    /// Captures the enemy as a read-only snapshot.
    #[must_use]
    pub fn snapshot(&self, now: Duration) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            radius: self.radius,
            mass: self.mass,
            state: self.state,
            blinded: self.is_blinded(now),
            health: self.health,
            boss: self.boss,
        }
    }
}

/// Every enemy of the active sector plus boss bookkeeping.
#[derive(Debug)]
pub struct EnemyRoster {
    tuning: AiTuning,
    enemies: BTreeMap<EnemyId, Enemy>,
    next_id: u32,
    active_boss: Option<EnemyId>,
    sighted: BTreeSet<BossId>,
    defeated: BTreeSet<BossId>,
    rng: ChaCha8Rng,
    scratch: Vec<Obstacle>,
    doomed: Vec<EnemyId>,
}

impl EnemyRoster {
    /// Creates an empty roster whose random placement is driven by `seed`.
    #[must_use]
    pub fn new(tuning: AiTuning, seed: u64) -> Self {
        Self {
            tuning,
            enemies: BTreeMap::new(),
            next_id: 0,
            active_boss: None,
            sighted: BTreeSet::new(),
            defeated: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            scratch: Vec::new(),
            doomed: Vec::new(),
        }
    }

    /// Tuning used for spawning and the AI pass.
    #[must_use]
    pub const fn tuning(&self) -> &AiTuning {
        &self.tuning
    }

    /// Number of enemies in the roster, including dead ones awaiting removal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    /// Reports whether the roster holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Looks up an enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Iterates over enemies in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Captures every enemy into a read-only view.
    #[must_use]
    pub fn view(&self, now: Duration) -> EnemyView {
        EnemyView::from_snapshots(
            self.enemies
                .values()
                .map(|enemy| enemy.snapshot(now))
                .collect(),
        )
    }

    /// Nearest living enemy to `point`. Ties resolve to the lower identifier.
    #[must_use]
    pub fn nearest_living(&self, point: Vec2) -> Option<&Enemy> {
        self.enemies
            .values()
            .filter(|enemy| enemy.is_alive())
            .fold(None, |best: Option<&Enemy>, enemy| match best {
                Some(current)
                    if current.position.distance_squared(point)
                        <= enemy.position.distance_squared(point) =>
                {
                    Some(current)
                }
                _ => Some(enemy),
            })
    }

    /// Boss currently alive in the sector with its remaining health fraction.
    #[must_use]
    pub fn boss_health(&self) -> Option<(BossId, f32)> {
        let enemy = self.enemies.get(&self.active_boss?)?;
        let boss = enemy.boss?;
        Some((boss, (enemy.health / enemy.max_health).clamp(0.0, 1.0)))
    }

    /// Reports whether the boss was defeated in this sector.
    #[must_use]
    pub fn is_defeated(&self, boss: BossId) -> bool {
        self.defeated.contains(&boss)
    }

    /// Spawns a single enemy, honouring the enemy budget and the one-boss limit.
    ///
    /// Rejections are reported through [`Event::SpawnRejected`].
    pub fn spawn(
        &mut self,
        request: SpawnRequest,
        grid: &SpatialGrid,
        out: &mut Vec<Event>,
    ) -> Option<EnemyId> {
        match self.place(request, grid) {
            Ok(id) => {
                if let Some(enemy) = self.enemies.get(&id) {
                    out.push(Event::EnemySpawned {
                        enemy: id,
                        kind: enemy.kind,
                        position: enemy.position,
                        boss: enemy.boss,
                    });
                    out.push(Event::NodeAttached {
                        node: VisualNode::Enemy(id),
                    });
                }
                Some(id)
            }
            Err(reason) => {
                log::warn!("spawn rejected: {reason:?}");
                out.push(Event::SpawnRejected { reason });
                None
            }
        }
    }

    /// Spawns up to `count` enemies around `origin`. Returns how many spawned.
    ///
    /// The horde stops at the first budget rejection.
    pub fn spawn_horde(
        &mut self,
        origin: Vec2,
        count: u32,
        kind: Option<EnemyKind>,
        grid: &SpatialGrid,
        out: &mut Vec<Event>,
    ) -> usize {
        let mut spawned = 0;
        for _ in 0..count {
            if self.enemies.len() >= self.tuning.max_enemies {
                log::warn!("horde truncated at {spawned} of {count} by the enemy budget");
                out.push(Event::SpawnRejected {
                    reason: SpawnRejection::Budget,
                });
                break;
            }
            let request = SpawnRequest {
                kind,
                ..SpawnRequest::near(origin)
            };
            if self.spawn(request, grid, out).is_some() {
                spawned += 1;
            }
        }
        log::debug!("horde of {spawned} spawned around {origin:?}");
        spawned
    }

    /// Removes health from an enemy. Returns whether the damage killed it.
    ///
    /// Kills emit score and, for bosses, defeat events.
    pub fn apply_damage(
        &mut self,
        id: EnemyId,
        amount: f32,
        weapon: Option<WeaponKind>,
        out: &mut Vec<Event>,
    ) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return false;
        };
        if !enemy.is_alive() {
            return false;
        }

        enemy.health = (enemy.health - amount).max(0.0);
        out.push(Event::DamageDealt {
            enemy: id,
            amount,
            weapon,
        });
        if enemy.health > 0.0 {
            return false;
        }

        enemy.state = AiState::Dead;
        enemy.windup_started = None;
        out.push(Event::EnemyKilled {
            enemy: id,
            kind: enemy.kind,
            weapon,
            position: enemy.position,
        });
        out.push(Event::ScoreDelta {
            points: enemy.kind.profile().score,
        });
        if let Some(boss) = enemy.boss {
            let _ = self.defeated.insert(boss);
            self.active_boss = None;
            log::debug!("boss {} defeated", boss.get());
            out.push(Event::BossDefeated { boss });
        }
        true
    }

    /// Interrupts an enemy: forces it idle and suppresses locomotion and decisions.
    pub fn stun(&mut self, id: EnemyId, now: Duration, stun: Duration, blind: Duration) -> bool {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return false;
        };
        if !enemy.is_alive() {
            return false;
        }
        enemy.state = AiState::Idle;
        enemy.windup_started = None;
        enemy.stun_until = enemy.stun_until.max(now + stun);
        enemy.blind_until = enemy.blind_until.max(now + blind);
        true
    }

    /// Adds an impulse to the enemy's knockback velocity.
    pub fn push(&mut self, id: EnemyId, impulse: Vec2) -> bool {
        if !impulse.is_finite() {
            return false;
        }
        match self.enemies.get_mut(&id) {
            Some(enemy) => {
                enemy.knockback += impulse;
                true
            }
            None => false,
        }
    }

    /// Applies a tackle: a stun with the tackle durations plus a knockback impulse.
    pub fn tackle(&mut self, id: EnemyId, impulse: Vec2, now: Duration) -> bool {
        let (stun, blind) = (self.tuning.tackle_stun, self.tuning.tackle_blind);
        self.stun(id, now, stun, blind) && self.push(id, impulse)
    }

    /// Emits [`Event::BossSighted`] the first time the living boss is within range of `point`.
    pub fn sight_bosses(&mut self, point: Vec2, out: &mut Vec<Event>) {
        let Some(enemy) = self.active_boss.and_then(|id| self.enemies.get(&id)) else {
            return;
        };
        let Some(boss) = enemy.boss else {
            return;
        };
        if enemy.position.distance(point) > self.tuning.sighting_range {
            return;
        }
        if self.sighted.insert(boss) {
            log::debug!("boss {} sighted", boss.get());
            out.push(Event::BossSighted { boss });
        }
    }

    /// Removes every dead enemy and permanently releases its visual node.
    pub fn remove_dead(&mut self, out: &mut Vec<Event>) {
        self.doomed.clear();
        self.doomed.extend(
            self.enemies
                .values()
                .filter(|enemy| !enemy.is_alive())
                .map(|enemy| enemy.id),
        );
        for index in 0..self.doomed.len() {
            let id = self.doomed[index];
            let _ = self.despawn(id, out);
        }
    }

    /// Removes an enemy immediately. Returns whether it existed.
    ///
    /// `EnemyDespawned` is reported only for enemies removed while still alive.
    pub fn despawn(&mut self, id: EnemyId, out: &mut Vec<Event>) -> bool {
        let Some(enemy) = self.enemies.remove(&id) else {
            return false;
        };
        if self.active_boss == Some(id) {
            self.active_boss = None;
        }
        if enemy.is_alive() {
            out.push(Event::EnemyDespawned { enemy: id });
        } else {
            log::trace!("removing dead enemy {}", id.get());
        }
        out.push(Event::NodeDetached {
            node: VisualNode::Enemy(id),
        });
        true
    }

    /// Removes every enemy and forgets boss history. Used by sector teardown.
    pub fn clear(&mut self, out: &mut Vec<Event>) {
        for id in self.enemies.keys() {
            out.push(Event::NodeDetached {
                node: VisualNode::Enemy(*id),
            });
        }
        self.enemies.clear();
        self.active_boss = None;
        self.sighted.clear();
        self.defeated.clear();
        self.doomed.clear();
    }

    /// Restarts the placement random stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub(crate) fn enemies_mut(&mut self) -> &mut BTreeMap<EnemyId, Enemy> {
        &mut self.enemies
    }

    fn place(&mut self, request: SpawnRequest, grid: &SpatialGrid) -> Result<EnemyId, SpawnRejection> {
        if self.enemies.len() >= self.tuning.max_enemies {
            return Err(SpawnRejection::Budget);
        }
        if let Some(boss) = request.boss {
            if self.defeated.contains(&boss) {
                return Err(SpawnRejection::BossDefeated);
            }
            if self.active_boss.is_some() {
                return Err(SpawnRejection::BossAlreadyPresent);
            }
        }

        let kind = match (request.kind, request.boss) {
            (Some(kind), _) => kind,
            (None, Some(_)) => EnemyKind::Matriarch,
            (None, None) => {
                let index = self.rng.gen_range(0..EnemyKind::RANDOM_POOL.len());
                EnemyKind::RANDOM_POOL[index]
            }
        };
        let profile = kind.profile();
        let (low, high) = profile.scale_range;
        let scale = if high > low {
            self.rng.gen_range(low..=high)
        } else {
            low
        };
        let radius = profile.radius * scale;

        let position = match request.position {
            Some(position) if position.is_finite() => position,
            Some(_) => return Err(SpawnRejection::Blocked),
            None => self
                .find_open_position(request.origin, radius, grid)
                .ok_or(SpawnRejection::Blocked)?,
        };

        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let health = profile.health * scale;
        let facing = {
            let to_origin = request.origin - position;
            to_origin.x.atan2(to_origin.y)
        };
        let enemy = Enemy {
            id,
            kind,
            boss: request.boss,
            position,
            facing: if facing.is_finite() { facing } else { 0.0 },
            knockback: Vec2::ZERO,
            state: AiState::Idle,
            health,
            max_health: health,
            scale,
            radius,
            mass: profile.base_mass * scale * scale * scale,
            stun_until: Duration::ZERO,
            blind_until: Duration::ZERO,
            windup_started: None,
            last_bite: None,
        };
        let _ = self.enemies.insert(id, enemy);
        if request.boss.is_some() {
            self.active_boss = Some(id);
        }
        log::debug!("spawned {kind:?} {} at {position:?}", id.get());
        Ok(id)
    }

    fn find_open_position(&mut self, origin: Vec2, radius: f32, grid: &SpatialGrid) -> Option<Vec2> {
        if !origin.is_finite() {
            return None;
        }
        let low = self.tuning.spawn_min_distance.max(0.0);
        let high = self.tuning.spawn_max_distance.max(low);
        for _ in 0..self.tuning.spawn_attempts.max(1) {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = if high > low {
                self.rng.gen_range(low..high)
            } else {
                low
            };
            let candidate = origin + Vec2::new(angle.sin(), angle.cos()) * distance;
            if !grid.is_blocked(candidate, radius, &mut self.scratch) {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> EnemyRoster {
        EnemyRoster::new(AiTuning::default(), 11)
    }

    #[test]
    fn random_spawns_land_inside_the_ring() {
        let mut roster = roster();
        let grid = SpatialGrid::default();
        let mut events = Vec::new();
        let origin = Vec2::new(5.0, -3.0);

        for _ in 0..20 {
            let id = roster
                .spawn(SpawnRequest::near(origin), &grid, &mut events)
                .expect("spawned");
            let enemy = roster.get(id).expect("present");
            let distance = enemy.position.distance(origin);
            assert!((6.0..=14.0).contains(&distance), "distance {distance}");
            assert_ne!(enemy.kind, EnemyKind::Matriarch);
        }
    }

    #[test]
    fn boss_requests_default_to_the_matriarch() {
        let mut roster = roster();
        let grid = SpatialGrid::default();
        let mut events = Vec::new();
        let request = SpawnRequest {
            boss: Some(BossId::new(1)),
            position: Some(Vec2::new(10.0, 10.0)),
            ..SpawnRequest::near(Vec2::ZERO)
        };

        let id = roster.spawn(request, &grid, &mut events).expect("spawned");

        assert_eq!(roster.get(id).map(|enemy| enemy.kind), Some(EnemyKind::Matriarch));
        assert_eq!(roster.boss_health(), Some((BossId::new(1), 1.0)));
    }

    #[test]
    fn damage_below_health_does_not_kill() {
        let mut roster = roster();
        let grid = SpatialGrid::default();
        let mut events = Vec::new();
        let request = SpawnRequest {
            kind: Some(EnemyKind::Brute),
            ..SpawnRequest::near(Vec2::ZERO)
        };
        let id = roster.spawn(request, &grid, &mut events).expect("spawned");
        events.clear();

        assert!(!roster.apply_damage(id, 10.0, Some(WeaponKind::Pistol), &mut events));
        assert_eq!(
            events,
            vec![Event::DamageDealt {
                enemy: id,
                amount: 10.0,
                weapon: Some(WeaponKind::Pistol),
            }]
        );
    }

    #[test]
    fn dead_enemies_ignore_further_damage_and_stuns() {
        let mut roster = roster();
        let grid = SpatialGrid::default();
        let mut events = Vec::new();
        let id = roster
            .spawn(SpawnRequest::near(Vec2::ZERO), &grid, &mut events)
            .expect("spawned");

        assert!(roster.apply_damage(id, 10_000.0, None, &mut events));
        events.clear();

        assert!(!roster.apply_damage(id, 5.0, None, &mut events));
        assert!(!roster.stun(id, Duration::ZERO, Duration::from_secs(1), Duration::from_secs(1)));
        assert!(events.is_empty());
    }

    #[test]
    fn clear_detaches_every_enemy_and_forgets_bosses() {
        let mut roster = roster();
        let grid = SpatialGrid::default();
        let mut events = Vec::new();
        let boss = BossId::new(3);
        let request = SpawnRequest {
            boss: Some(boss),
            ..SpawnRequest::near(Vec2::ZERO)
        };
        let id = roster.spawn(request, &grid, &mut events).expect("spawned");
        let _ = roster.apply_damage(id, 1.0e6, None, &mut events);
        assert!(roster.is_defeated(boss));
        events.clear();

        roster.clear(&mut events);

        assert!(roster.is_empty());
        assert!(!roster.is_defeated(boss));
        assert_eq!(
            events,
            vec![Event::NodeDetached {
                node: VisualNode::Enemy(id),
            }]
        );
    }
}
