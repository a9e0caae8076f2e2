//! Projectile ageing, hit resolution and explosions.

use std::time::Duration;

use ashfall_core::{
    AudioCue, EffectKind, EnemyId, Event, Obstacle, SurfaceMaterial, VisualNode, WeaponKind,
    GRAVITY,
};
use ashfall_system_collision::{resolve::surface_distance, segment_circle};
use ashfall_system_particles::EffectRequest;
use glam::{Vec2, Vec3};

use crate::{ground, lift, Battlefield, CombatTuning, Payload, Projectile};

/// Reusable buffers for hit resolution.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) targets: Vec<(EnemyId, Vec2, f32, f32)>,
}

enum Fate {
    Flying,
    Spent,
}

/// Advances every projectile and removes the ones that hit or expired.
pub(crate) fn advance(
    projectiles: &mut Vec<Projectile>,
    field: &mut Battlefield<'_>,
    tuning: &CombatTuning,
    scratch: &mut Scratch,
    dt: f32,
    now: Duration,
    out: &mut Vec<Event>,
) {
    let mut index = 0;
    while index < projectiles.len() {
        match step(&mut projectiles[index], field, tuning, scratch, dt, now, out) {
            Fate::Flying => index += 1,
            Fate::Spent => {
                let spent = projectiles.swap_remove(index);
                out.push(Event::NodeDetached {
                    node: VisualNode::Projectile(spent.id),
                });
            }
        }
    }
}

fn step(
    projectile: &mut Projectile,
    field: &mut Battlefield<'_>,
    tuning: &CombatTuning,
    scratch: &mut Scratch,
    dt: f32,
    now: Duration,
    out: &mut Vec<Event>,
) -> Fate {
    let start = projectile.position;
    if matches!(projectile.payload, Payload::Explosive { .. }) {
        projectile.velocity.y -= GRAVITY * dt;
    }
    projectile.position += projectile.velocity * dt;
    let end = projectile.position;
    if !end.is_finite() || !projectile.velocity.is_finite() {
        log::warn!("discarding non-finite projectile {}", projectile.id.get());
        return Fate::Spent;
    }

    match projectile.payload {
        Payload::Bullet { damage, stagger } => {
            let (from, to) = (ground(start), ground(end));
            let wall = field
                .grid
                .first_hit(from, to, tuning.projectile_radius, &mut scratch.obstacles);
            let victim = field
                .roster
                .iter()
                .filter(|enemy| enemy.is_alive())
                .filter_map(|enemy| {
                    segment_circle(from, to, enemy.position, enemy.radius + tuning.projectile_radius)
                        .map(|t| (t, enemy.id))
                })
                .fold(None, |best: Option<(f32, EnemyId)>, candidate| match best {
                    Some(current) if current.0 <= candidate.0 => Some(current),
                    _ => Some(candidate),
                });

            match (victim, wall) {
                (Some((t, enemy)), wall) if wall.map_or(true, |hit| t <= hit.t) => {
                    let point = start.lerp(end, t);
                    let _ = field
                        .roster
                        .apply_damage(enemy, damage, Some(projectile.weapon), out);
                    if let Some(stagger) = stagger {
                        let _ = field.roster.stun(enemy, now, stagger, stagger);
                    }
                    field
                        .pool
                        .request(EffectRequest::burst(EffectKind::Blood, point, 6, 2.5));
                    out.push(Event::Cue(AudioCue::Impact {
                        material: SurfaceMaterial::Flesh,
                    }));
                    Fate::Spent
                }
                (_, Some(hit)) => {
                    let point = start.lerp(end, hit.t);
                    strike_obstacle(&hit.obstacle, damage, point, projectile.impact, field, out);
                    Fate::Spent
                }
                _ if now >= projectile.expires_at => Fate::Spent,
                _ => Fate::Flying,
            }
        }
        Payload::Explosive {
            damage,
            blast_radius,
            fuse_end,
        } => {
            let contact = field
                .grid
                .first_hit(
                    ground(start),
                    ground(end),
                    tuning.throwable_radius,
                    &mut scratch.obstacles,
                )
                .map(|hit| ground(start.lerp(end, hit.t)));
            let at = match contact {
                Some(point) => point,
                None if end.y <= 0.0 || now >= fuse_end => ground(end),
                None => return Fate::Flying,
            };
            detonate(
                at,
                projectile.weapon,
                damage,
                blast_radius,
                field,
                tuning,
                scratch,
                now,
                out,
            );
            Fate::Spent
        }
    }
}

/// Reports an impact on an obstacle and queues its effects.
pub(crate) fn strike_obstacle(
    obstacle: &Obstacle,
    damage: f32,
    point: Vec3,
    impact: EffectKind,
    field: &mut Battlefield<'_>,
    out: &mut Vec<Event>,
) {
    out.push(Event::Cue(AudioCue::Impact {
        material: obstacle.material,
    }));
    field
        .pool
        .request(EffectRequest::burst(impact, point, 5, 2.0));
    if obstacle.is_breakable() {
        out.push(Event::PropHit {
            obstacle: obstacle.id,
            damage,
        });
    }
}

/// Deals radial damage with linear falloff, staggering and pushing every enemy caught.
#[allow(clippy::too_many_arguments)]
pub(crate) fn detonate(
    at: Vec2,
    weapon: WeaponKind,
    damage: f32,
    blast_radius: f32,
    field: &mut Battlefield<'_>,
    tuning: &CombatTuning,
    scratch: &mut Scratch,
    now: Duration,
    out: &mut Vec<Event>,
) {
    let blast_radius = blast_radius.max(f32::EPSILON);
    log::debug!("{weapon:?} detonated at {at:?}");
    out.push(Event::Cue(AudioCue::Explosion));

    scratch.targets.clear();
    scratch.targets.extend(
        field
            .roster
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| (enemy.id, enemy.position, enemy.radius, enemy.mass)),
    );
    for &(enemy, position, radius, mass) in &scratch.targets {
        let offset = position - at;
        let reach = (offset.length() - radius).max(0.0);
        let falloff = 1.0 - reach / blast_radius;
        if falloff <= 0.0 {
            continue;
        }
        let killed = field
            .roster
            .apply_damage(enemy, damage * falloff, Some(weapon), out);
        if killed {
            continue;
        }
        let _ = field
            .roster
            .stun(enemy, now, tuning.explosion_stun, tuning.explosion_blind);
        let direction = offset.try_normalize().unwrap_or(Vec2::Y);
        let _ = field.roster.push(
            enemy,
            direction * tuning.explosion_force * falloff / mass.max(1.0),
        );
    }

    field
        .grid
        .query_near(at, blast_radius, &mut scratch.obstacles);
    for obstacle in scratch.obstacles.iter().filter(|obstacle| obstacle.is_breakable()) {
        let falloff = 1.0 - surface_distance(at, obstacle).max(0.0) / blast_radius;
        if falloff > 0.0 {
            out.push(Event::PropHit {
                obstacle: obstacle.id,
                damage: damage * falloff,
            });
        }
    }

    let pool = &mut *field.pool;
    pool.request(EffectRequest::burst(EffectKind::Debris, lift(at, 0.3), 14, 5.0));
    pool.request(EffectRequest::burst(EffectKind::Ember, lift(at, 0.3), 6, 4.0));
    pool.request(EffectRequest::burst(EffectKind::Smoke, lift(at, 0.5), 5, 1.2));
    pool.request(EffectRequest::single(EffectKind::Scorch, lift(at, 0.0)));
}
