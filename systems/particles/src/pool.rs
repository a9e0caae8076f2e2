use std::collections::VecDeque;
use std::time::Duration;

use ashfall_core::{EffectKind, Event, Landing, VisualNode, GRAVITY};
use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{EffectRequest, MaterialHandle, MaterialInstance, Particle, SlotHandle};

/// Particles materialised per tick unless configured otherwise.
pub const DEFAULT_SPAWN_BUDGET: usize = 48;

/// Height at which falling particles land.
pub const GROUND_LEVEL: f32 = 0.0;

/// Smallest step used for aging so life strictly decreases on every tick.
const MIN_AGE_STEP: f32 = 1e-3;

const SMOKE_RISE: f32 = 0.6;

/// Fixed-size-growing pool of particles, decals and their material instances.
#[derive(Debug)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    free: Vec<u32>,
    active: Vec<u32>,
    materials: [Vec<MaterialInstance>; EffectKind::COUNT],
    free_materials: [Vec<u32>; EffectKind::COUNT],
    pending: VecDeque<EffectRequest>,
    attached: Vec<u32>,
    batches: [Vec<Mat4>; EffectKind::COUNT],
    spawn_budget: usize,
    rng: ChaCha8Rng,
}

impl ParticlePool {
    /// Creates an empty pool materialising at most `spawn_budget` particles per tick.
    #[must_use]
    pub fn new(spawn_budget: usize, seed: u64) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
            materials: std::array::from_fn(|_| Vec::new()),
            free_materials: std::array::from_fn(|_| Vec::new()),
            pending: VecDeque::new(),
            attached: Vec::new(),
            batches: std::array::from_fn(|_| Vec::new()),
            spawn_budget: spawn_budget.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Grows the pool so that at least `count` slots are free.
    pub fn prewarm(&mut self, count: usize) {
        while self.free.len() < count {
            let index = self.grow(EffectKind::Spark);
            self.free.push(index);
        }
        log::debug!("particle pool prewarmed to {} slots", self.slots.len());
    }

    /// Acquires a slot for `kind`, reusing a free slot before growing the pool.
    ///
    /// The slot starts with the kind's full life at the origin; callers place it.
    pub fn acquire_slot(&mut self, kind: EffectKind) -> SlotHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => self.grow(kind),
        };
        let material = kind.needs_material().then(|| self.acquire_material(kind));
        let active_index = self.active.len();
        self.active.push(index);

        let slot = &mut self.slots[index as usize];
        *slot = Particle::vacant(kind);
        slot.life = kind.max_life();
        slot.max_life = kind.max_life();
        slot.material = material;
        slot.in_use = true;
        slot.active_index = active_index;
        SlotHandle::new(index)
    }

    /// Returns a slot and its material instance to their free-lists.
    ///
    /// Releasing a slot that is already free is a no-op that returns `false`.
    pub fn release(&mut self, handle: SlotHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index() as usize) else {
            return false;
        };
        if !slot.in_use {
            return false;
        }
        slot.in_use = false;
        let active_index = slot.active_index;
        let material = slot.material.take();

        if let Some(material) = material {
            self.free_materials[material.kind.index()].push(material.index);
        }

        let _ = self.active.swap_remove(active_index);
        if let Some(&moved) = self.active.get(active_index) {
            self.slots[moved as usize].active_index = active_index;
        }
        self.free.push(handle.index());
        true
    }

    /// Queues a request; it is materialised by subsequent calls to [`ParticlePool::update`].
    pub fn request(&mut self, request: EffectRequest) {
        if request.count == 0 || !request.position.is_finite() || !request.velocity.is_finite() {
            return;
        }
        self.pending.push_back(request);
    }

    /// Advances the pool by one tick.
    ///
    /// Newly grown slots are announced through [`Event::NodeAttached`] exactly
    /// once; slots are never detached because the pool does not shrink.
    pub fn update(&mut self, delta: Duration, out: &mut Vec<Event>) {
        for index in self.attached.drain(..) {
            out.push(Event::NodeAttached {
                node: VisualNode::Particle(index),
            });
        }

        self.drain_requests();
        self.age(delta.as_secs_f32());
        self.rebuild_batches();

        for index in self.attached.drain(..) {
            out.push(Event::NodeAttached {
                node: VisualNode::Particle(index),
            });
        }
    }

    /// Releases every slot in use and drops queued requests. Capacity is kept.
    pub fn reset(&mut self) {
        while let Some(&index) = self.active.last() {
            let _ = self.release(SlotHandle::new(index));
        }
        self.pending.clear();
        for batch in &mut self.batches {
            batch.clear();
        }
    }

    /// Number of slots available for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of slots currently acquired.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.active.len()
    }

    /// Total number of slots ever created.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of particles still waiting for spawn budget.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending
            .iter()
            .map(|request| usize::from(request.count))
            .sum()
    }

    /// Free material instances held for `kind`.
    #[must_use]
    pub fn free_material_count(&self, kind: EffectKind) -> usize {
        self.free_materials[kind.index()].len()
    }

    /// Particle stored in the slot, if it is in use.
    #[must_use]
    pub fn particle(&self, handle: SlotHandle) -> Option<&Particle> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.in_use)
    }

    /// Material instance owned by the slot, if any.
    #[must_use]
    pub fn material(&self, handle: SlotHandle) -> Option<&MaterialInstance> {
        let material = self.particle(handle)?.material?;
        self.materials[material.kind.index()].get(material.index as usize)
    }

    /// Iterates over every slot in use.
    pub fn active(&self) -> impl Iterator<Item = (SlotHandle, &Particle)> + '_ {
        self.active
            .iter()
            .map(move |&index| (SlotHandle::new(index), &self.slots[index as usize]))
    }

    /// Instance transforms for an instanced effect kind, rebuilt every tick.
    #[must_use]
    pub fn instances(&self, kind: EffectKind) -> &[Mat4] {
        &self.batches[kind.index()]
    }

    fn grow(&mut self, kind: EffectKind) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Particle::vacant(kind));
        self.attached.push(index);
        index
    }

    fn acquire_material(&mut self, kind: EffectKind) -> MaterialHandle {
        let list = kind.index();
        let index = match self.free_materials[list].pop() {
            Some(index) => {
                self.materials[list][index as usize] = MaterialInstance::fresh(kind);
                index
            }
            None => {
                self.materials[list].push(MaterialInstance::fresh(kind));
                (self.materials[list].len() - 1) as u32
            }
        };
        MaterialHandle { kind, index }
    }

    fn drain_requests(&mut self) {
        let mut budget = self.spawn_budget;
        while budget > 0 {
            let Some(request) = self.pending.front_mut() else {
                break;
            };
            let batch = usize::from(request.count).min(budget);
            request.count -= batch as u16;
            let template = *request;
            if request.count == 0 {
                let _ = self.pending.pop_front();
            }
            for _ in 0..batch {
                self.spawn_one(&template);
            }
            budget -= batch;
        }
    }

    fn spawn_one(&mut self, request: &EffectRequest) {
        let scatter = request.scatter.max(0.0);
        let jitter = if scatter > 0.0 {
            Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(0.2..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            ) * scatter
        } else {
            Vec3::ZERO
        };
        let spin = self.rng.gen_range(-6.0..=6.0);
        let rotation = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let scale = match request.kind {
            EffectKind::Debris => self.rng.gen_range(0.08..=0.2),
            EffectKind::BloodPool | EffectKind::Scorch => self.rng.gen_range(0.6..=1.2),
            EffectKind::Smoke => self.rng.gen_range(0.5..=0.9),
            _ => self.rng.gen_range(0.03..=0.07),
        };

        let handle = self.acquire_slot(request.kind);
        let slot = &mut self.slots[handle.index() as usize];
        slot.position = request.position;
        slot.velocity = request.velocity + jitter;
        slot.rotation = rotation;
        slot.spin = spin;
        slot.scale = scale;
    }

    fn age(&mut self, dt: f32) {
        let step = dt.max(MIN_AGE_STEP);
        let mut cursor = self.active.len();
        while cursor > 0 {
            cursor -= 1;
            let index = self.active[cursor];
            let handle = SlotHandle::new(index);
            let slot = &mut self.slots[index as usize];
            slot.life -= slot.kind.decay_rate() * step;

            let mut landed_now = false;
            if slot.kind.falls() && !slot.landed {
                slot.velocity.y -= GRAVITY * dt;
                slot.position += slot.velocity * dt;
                slot.rotation += slot.spin * dt;
                if slot.position.y <= GROUND_LEVEL {
                    slot.position.y = GROUND_LEVEL;
                    landed_now = true;
                }
            } else if slot.kind == EffectKind::Smoke {
                slot.position += (slot.velocity + Vec3::Y * SMOKE_RISE) * dt;
                slot.velocity *= 0.9;
            }

            if !slot.position.is_finite() || !slot.life.is_finite() {
                log::warn!("discarding non-finite particle in slot {index}");
                let _ = self.release(handle);
                continue;
            }

            if landed_now {
                match slot.kind.landing() {
                    Landing::Release => {
                        let _ = self.release(handle);
                        continue;
                    }
                    Landing::Settle => {
                        slot.landed = true;
                        slot.velocity = Vec3::ZERO;
                        slot.spin = 0.0;
                    }
                    Landing::Decal(decal) => {
                        let position = slot.position;
                        let _ = self.release(handle);
                        self.place_decal(decal, position);
                        continue;
                    }
                }
            }

            if slot.life <= 0.0 {
                let _ = self.release(handle);
                continue;
            }

            if let Some(material) = slot.material {
                let opacity = (slot.life / slot.max_life).clamp(0.0, 1.0);
                if let Some(instance) =
                    self.materials[material.kind.index()].get_mut(material.index as usize)
                {
                    instance.opacity = opacity;
                }
            }
        }
    }

    fn place_decal(&mut self, kind: EffectKind, position: Vec3) {
        let rotation = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let scale = self.rng.gen_range(0.6..=1.2);
        let handle = self.acquire_slot(kind);
        let slot = &mut self.slots[handle.index() as usize];
        slot.position = Vec3::new(position.x, GROUND_LEVEL, position.z);
        slot.rotation = rotation;
        slot.scale = scale;
        slot.landed = true;
    }

    fn rebuild_batches(&mut self) {
        for batch in &mut self.batches {
            batch.clear();
        }
        for &index in &self.active {
            let slot = &self.slots[index as usize];
            if !slot.kind.instanced() {
                continue;
            }
            self.batches[slot.kind.index()].push(Mat4::from_scale_rotation_translation(
                Vec3::splat(slot.scale),
                Quat::from_rotation_y(slot.rotation),
                slot.position,
            ));
        }
    }
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new(DEFAULT_SPAWN_BUDGET, 0)
    }
}
