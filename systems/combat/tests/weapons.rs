use std::time::Duration;

use ashfall_core::{
    AudioCue, EnemyId, EnemyKind, Event, InputSnapshot, Loadout, Obstacle, ObstacleId,
    ObstacleShape, PlayerState, SpawnRequest, SurfaceMaterial, VisualNode, WeaponKind,
    WeaponTuning,
};
use ashfall_system_collision::SpatialGrid;
use ashfall_system_combat::{
    ballistics, Battlefield, CombatTuning, WeaponSystem, TRAJECTORY_POINTS,
};
use ashfall_system_enemy_ai::{AiTuning, EnemyRoster};
use ashfall_system_particles::ParticlePool;
use glam::{Vec2, Vec3};

const FRAME: Duration = Duration::from_millis(16);

struct Rig {
    weapons: WeaponSystem,
    player: PlayerState,
    grid: SpatialGrid,
    roster: EnemyRoster,
    pool: ParticlePool,
    now: Duration,
}

impl Rig {
    fn new() -> Self {
        let loadout = Loadout::standard();
        Self {
            player: PlayerState::spawn(Vec2::ZERO, &loadout),
            weapons: WeaponSystem::new(CombatTuning::default(), loadout, 11),
            grid: SpatialGrid::default(),
            roster: EnemyRoster::new(AiTuning::default(), 11),
            pool: ParticlePool::default(),
            now: Duration::ZERO,
        }
    }

    fn step(&mut self, input: &InputSnapshot, delta: Duration) -> Vec<Event> {
        self.now += delta;
        let mut events = Vec::new();
        let field = Battlefield {
            grid: &self.grid,
            roster: &mut self.roster,
            pool: &mut self.pool,
        };
        self.weapons
            .update(&mut self.player, input, field, delta, self.now, &mut events);
        events
    }

    fn enemy(&mut self, kind: EnemyKind, position: Vec2) -> EnemyId {
        let mut events = Vec::new();
        let request = SpawnRequest {
            kind: Some(kind),
            position: Some(position),
            ..SpawnRequest::near(Vec2::ZERO)
        };
        self.roster
            .spawn(request, &self.grid, &mut events)
            .expect("enemy spawned")
    }

    fn select(&mut self, weapon: WeaponKind) -> Vec<Event> {
        let input = InputSnapshot {
            select_weapon: Some(weapon),
            ..InputSnapshot::default()
        };
        self.step(&input, FRAME)
    }

    fn set_ammo(&mut self, weapon: WeaponKind, rounds: u32) {
        let _ = self.player.arsenal.ammo.insert(weapon, rounds);
    }
}

fn firing() -> InputSnapshot {
    InputSnapshot {
        fire: true,
        ..InputSnapshot::default()
    }
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

fn shots(events: &[Event]) -> usize {
    count(events, |event| matches!(event, Event::WeaponFired { .. }))
}

#[test]
fn empty_trigger_pull_clicks_and_starts_a_reload() {
    let mut rig = Rig::new();
    rig.set_ammo(WeaponKind::Pistol, 0);

    let events = rig.step(&firing(), FRAME);

    assert!(events.contains(&Event::Cue(AudioCue::EmptyClick {
        weapon: WeaponKind::Pistol,
    })));
    assert!(events.contains(&Event::ReloadStarted {
        weapon: WeaponKind::Pistol,
        ready_at: FRAME + WeaponTuning::standard(WeaponKind::Pistol).reload_time,
    }));
    assert!(rig.player.arsenal.reloading);
    assert!(rig.weapons.projectiles().is_empty());
    assert_eq!(shots(&events), 0);
}

#[test]
fn reload_completes_strictly_after_its_end() {
    let mut rig = Rig::new();
    rig.set_ammo(WeaponKind::Pistol, 5);
    let reload = InputSnapshot {
        reload: true,
        ..InputSnapshot::default()
    };
    let _ = rig.step(&reload, FRAME);
    let reload_end = rig.player.arsenal.reload_end;
    assert!(rig.player.arsenal.reloading);

    let idle = InputSnapshot::default();
    let remaining = reload_end - rig.now;
    let events = rig.step(&idle, remaining);
    assert_eq!(rig.now, reload_end);
    assert!(rig.player.arsenal.reloading);
    assert!(!events.contains(&Event::ReloadFinished {
        weapon: WeaponKind::Pistol,
    }));

    let events = rig.step(&idle, Duration::from_millis(1));
    assert!(!rig.player.arsenal.reloading);
    assert_eq!(rig.player.arsenal.active_ammo(), 12);
    assert!(events.contains(&Event::ReloadFinished {
        weapon: WeaponKind::Pistol,
    }));
    assert!(events.contains(&Event::Cue(AudioCue::ReloadEnd {
        weapon: WeaponKind::Pistol,
    })));
}

#[test]
fn fire_rate_spaces_out_shots() {
    let mut rig = Rig::new();
    let fire = firing();

    assert_eq!(shots(&rig.step(&fire, FRAME)), 1);
    assert_eq!(shots(&rig.step(&fire, Duration::from_millis(100))), 0);
    assert_eq!(shots(&rig.step(&fire, Duration::from_millis(150))), 0);
    assert_eq!(shots(&rig.step(&fire, Duration::from_millis(10))), 1);
    assert_eq!(rig.player.arsenal.active_ammo(), 10);
}

#[test]
fn unlimited_ammo_never_drains_the_magazine() {
    let mut rig = Rig::new();
    rig.weapons.set_unlimited_ammo(true);
    let fire = firing();

    let mut fired = 0;
    for _ in 0..20 {
        fired += shots(&rig.step(&fire, Duration::from_millis(300)));
    }

    assert_eq!(fired, 20);
    assert_eq!(rig.player.arsenal.active_ammo(), 12);
    assert!(!rig.player.arsenal.reloading);
}

#[test]
fn shotgun_launches_every_pellet() {
    let mut rig = Rig::new();
    let input = InputSnapshot {
        fire: true,
        select_weapon: Some(WeaponKind::Shotgun),
        ..InputSnapshot::default()
    };

    let events = rig.step(&input, FRAME);

    assert!(events.contains(&Event::WeaponSwitched {
        weapon: WeaponKind::Shotgun,
    }));
    let attached = count(&events, |event| {
        matches!(
            event,
            Event::NodeAttached {
                node: VisualNode::Projectile(_),
            }
        )
    });
    assert_eq!(attached, 8);
    assert_eq!(rig.weapons.projectiles().len(), 8);
    assert_eq!(rig.player.arsenal.active_ammo(), 5);
    assert!(rig
        .weapons
        .projectiles()
        .iter()
        .all(|projectile| projectile.velocity.z > 0.0));
}

#[test]
fn beam_ammo_only_decreases_and_never_underflows() {
    let mut rig = Rig::new();
    let _ = rig.select(WeaponKind::Flamethrower);
    rig.set_ammo(WeaponKind::Flamethrower, 10);
    let fire = firing();

    let mut previous = rig.player.arsenal.active_ammo();
    let mut pulses = 0;
    for _ in 0..40 {
        pulses += shots(&rig.step(&fire, Duration::from_millis(60)));
        let ammo = rig.player.arsenal.active_ammo();
        assert!(ammo <= previous);
        previous = ammo;
    }

    assert_eq!(pulses, 10);
    assert_eq!(previous, 0);
    assert!(rig.player.arsenal.reloading);
}

#[test]
fn switching_is_rejected_while_reloading() {
    let mut rig = Rig::new();
    rig.set_ammo(WeaponKind::Pistol, 3);
    let reload = InputSnapshot {
        reload: true,
        ..InputSnapshot::default()
    };
    let _ = rig.step(&reload, FRAME);

    let events = rig.select(WeaponKind::Shotgun);

    assert_eq!(rig.player.arsenal.active, WeaponKind::Pistol);
    assert!(rig.player.arsenal.reloading);
    assert_eq!(
        count(&events, |event| matches!(event, Event::WeaponSwitched { .. })),
        0
    );
}

#[test]
fn switching_away_cancels_a_held_charge() {
    let mut rig = Rig::new();
    let _ = rig.select(WeaponKind::Grenade);
    let _ = rig.step(&firing(), FRAME);
    let _ = rig.step(&firing(), Duration::from_millis(200));
    assert!(rig.player.arsenal.charge_started.is_some());
    assert_eq!(rig.weapons.trajectory().len(), TRAJECTORY_POINTS);
    assert!(rig.weapons.charge(&rig.player, rig.now).is_some());

    let input = InputSnapshot {
        fire: true,
        select_weapon: Some(WeaponKind::Pistol),
        ..InputSnapshot::default()
    };
    let events = rig.step(&input, FRAME);

    assert!(events.contains(&Event::WeaponSwitched {
        weapon: WeaponKind::Pistol,
    }));
    assert!(rig.player.arsenal.charge_started.is_none());
    assert!(rig.weapons.trajectory().is_empty());
    assert_eq!(rig.player.arsenal.ammo_for(WeaponKind::Grenade), 3);
}

#[test]
fn empty_throwable_cannot_be_selected() {
    let mut rig = Rig::new();
    rig.set_ammo(WeaponKind::Grenade, 0);

    let events = rig.select(WeaponKind::Grenade);

    assert_eq!(rig.player.arsenal.active, WeaponKind::Pistol);
    assert!(events.contains(&Event::Cue(AudioCue::EmptyClick {
        weapon: WeaponKind::Grenade,
    })));

    assert!(rig.weapons.add_throwable_charge(&mut rig.player));
    let events = rig.select(WeaponKind::Grenade);
    assert!(events.contains(&Event::WeaponSwitched {
        weapon: WeaponKind::Grenade,
    }));
}

#[test]
fn thrown_grenade_damages_stuns_and_pushes_enemies() {
    let mut rig = Rig::new();
    let _ = rig.select(WeaponKind::Grenade);

    let _ = rig.step(&firing(), FRAME);
    let charge_started = rig.now;
    let _ = rig.step(&firing(), Duration::from_millis(600));
    let preview_end = *rig.weapons.trajectory().last().expect("preview sampled");
    assert!(preview_end.y.abs() < 1e-3);

    // Predict the landing the same way the preview does.
    let ratio = ballistics::charge_ratio(charge_started, rig.now + FRAME, Duration::from_millis(1_200));
    let distance = ballistics::throw_distance(4.0, 18.0, ratio);
    let origin = Vec3::new(0.0, CombatTuning::default().muzzle_height, rig.player.radius);
    let velocity = ballistics::launch_velocity(Vec2::Y, distance, origin.y);
    let airborne = ballistics::flight_time(velocity.y, origin.y);
    let landing = ballistics::position_at(origin, velocity, airborne);
    let centre = Vec2::new(landing.x, landing.z);
    assert!((centre.y - (rig.player.radius + distance)).abs() < 1e-2);

    let brute = rig.enemy(EnemyKind::Brute, centre + Vec2::new(1.2, 0.0));
    let far = rig.enemy(EnemyKind::Walker, centre + Vec2::new(-12.0, 0.0));
    let health = rig.roster.get(brute).expect("brute").health;

    let mut events = rig.step(&InputSnapshot::default(), FRAME);
    assert_eq!(rig.weapons.projectiles().len(), 1);
    assert_eq!(rig.player.arsenal.ammo_for(WeaponKind::Grenade), 2);
    let thrown = rig.weapons.projectiles()[0];
    assert!(thrown.charge.is_some());
    assert!(rig.weapons.trajectory().is_empty());

    for _ in 0..200 {
        if rig.weapons.projectiles().is_empty() {
            break;
        }
        events.extend(rig.step(&InputSnapshot::default(), FRAME));
    }

    assert!(rig.weapons.projectiles().is_empty());
    assert!(events.contains(&Event::Cue(AudioCue::Explosion)));
    assert!(events.contains(&Event::NodeDetached {
        node: VisualNode::Projectile(thrown.id),
    }));

    let struck = rig.roster.get(brute).expect("brute survives");
    assert!(struck.health < health);
    assert!(struck.stun_remaining(rig.now) > Duration::ZERO);
    assert!(struck.knockback.x > 0.0);

    let untouched = rig.roster.get(far).expect("walker");
    assert_eq!(untouched.health, untouched.max_health);
    assert!(rig.pool.pending_count() > 0);
}

#[test]
fn bullet_damages_the_first_enemy_and_is_consumed() {
    let mut rig = Rig::new();
    let walker = rig.enemy(EnemyKind::Walker, Vec2::new(0.0, 5.0));
    let behind = rig.enemy(EnemyKind::Walker, Vec2::new(0.0, 8.0));

    let mut events = rig.step(&firing(), FRAME);
    for _ in 0..20 {
        events.extend(rig.step(&InputSnapshot::default(), FRAME));
    }

    let damaged: Vec<EnemyId> = events
        .iter()
        .filter_map(|event| match event {
            Event::DamageDealt { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(damaged, vec![walker]);
    assert_eq!(
        rig.roster.get(behind).map(|enemy| enemy.health),
        Some(rig.roster.get(behind).expect("walker").max_health)
    );
    assert!(rig.weapons.projectiles().is_empty());
    assert!(events.contains(&Event::Cue(AudioCue::Impact {
        material: SurfaceMaterial::Flesh,
    })));
}

fn wall(id: u32, y: f32, durability: Option<f32>) -> Obstacle {
    Obstacle {
        id: ObstacleId::new(id),
        position: Vec2::new(0.0, y),
        shape: ObstacleShape::Box {
            half_extents: Vec2::new(2.0, 0.25),
        },
        material: SurfaceMaterial::Wood,
        durability,
    }
}

#[test]
fn walls_stop_bullets_and_breakable_props_report_hits() {
    let mut rig = Rig::new();
    rig.grid.rebuild([wall(1, 5.0, None)]);
    let hidden = rig.enemy(EnemyKind::Walker, Vec2::new(0.0, 8.0));

    let mut events = rig.step(&firing(), FRAME);
    for _ in 0..20 {
        events.extend(rig.step(&InputSnapshot::default(), FRAME));
    }
    assert_eq!(
        count(&events, |event| matches!(event, Event::DamageDealt { .. })),
        0
    );
    assert_eq!(
        count(&events, |event| matches!(event, Event::PropHit { .. })),
        0
    );
    assert!(events.contains(&Event::Cue(AudioCue::Impact {
        material: SurfaceMaterial::Wood,
    })));
    let hidden = rig.roster.get(hidden).expect("walker");
    assert_eq!(hidden.health, hidden.max_health);

    let mut rig = Rig::new();
    rig.grid.rebuild([wall(2, 5.0, Some(30.0))]);
    let mut events = rig.step(&firing(), FRAME);
    for _ in 0..20 {
        events.extend(rig.step(&InputSnapshot::default(), FRAME));
    }
    assert!(events.contains(&Event::PropHit {
        obstacle: ObstacleId::new(2),
        damage: WeaponTuning::standard(WeaponKind::Pistol).damage,
    }));
}

#[test]
fn unspent_projectiles_expire() {
    let mut rig = Rig::new();
    let mut events = rig.step(&firing(), FRAME);
    let id = rig.weapons.projectiles()[0].id;

    for _ in 0..60 {
        events.extend(rig.step(&InputSnapshot::default(), FRAME));
    }

    assert!(rig.weapons.projectiles().is_empty());
    assert!(events.contains(&Event::NodeDetached {
        node: VisualNode::Projectile(id),
    }));
}

#[test]
fn dead_players_do_not_fire_but_projectiles_keep_flying() {
    let mut rig = Rig::new();
    let _ = rig.step(&firing(), FRAME);
    assert_eq!(rig.weapons.projectiles().len(), 1);
    let before = rig.weapons.projectiles()[0].position;

    rig.player.health = 0.0;
    let events = rig.step(&firing(), Duration::from_millis(300));

    assert_eq!(shots(&events), 0);
    assert_eq!(rig.weapons.projectiles().len(), 1);
    assert!(rig.weapons.projectiles()[0].position.z > before.z);
}
