//! Typed callback contracts implemented by the presentation layer.
//!
//! The simulation never calls these directly from a system. The world
//! dispatches a tick's events to them once the tick has completed, so a
//! collaborator cannot influence the tick it observes. Every method defaults
//! to a no-op so implementors only override what they present.

use crate::{
    BossId, EnemyId, EnemyKind, HudSnapshot, PickupKind, SurfaceMaterial, VisualNode, WeaponKind,
};

/// Audio engine entry points, one per cue.
pub trait AudioCues {
    /// A stride landed on the provided surface.
    fn footstep(&mut self, _surface: SurfaceMaterial) {}
    /// A projectile struck the provided material.
    fn impact(&mut self, _material: SurfaceMaterial) {}
    /// A weapon discharged.
    fn weapon_fired(&mut self, _weapon: WeaponKind) {}
    /// The trigger was pulled on an empty weapon.
    fn empty_click(&mut self, _weapon: WeaponKind) {}
    /// A reload began.
    fn reload_started(&mut self, _weapon: WeaponKind) {}
    /// A reload completed.
    fn reload_finished(&mut self, _weapon: WeaponKind) {}
    /// The player rolled.
    fn roll(&mut self) {}
    /// A thrown weapon detonated.
    fn explosion(&mut self) {}
}

/// Score and statistics accumulation.
pub trait StatSink {
    /// Damage was dealt to an enemy.
    fn damage_dealt(&mut self, _enemy: EnemyId, _amount: f32, _weapon: Option<WeaponKind>) {}
    /// The player took damage.
    fn damage_taken(&mut self, _amount: f32) {}
    /// An enemy of the provided kind was killed.
    fn kill(&mut self, _kind: EnemyKind, _weapon: Option<WeaponKind>) {}
    /// Points were awarded.
    fn score(&mut self, _points: u32) {}
    /// A pickup was collected.
    fn pickup(&mut self, _kind: PickupKind) {}
    /// A boss was seen for the first time.
    fn boss_sighted(&mut self, _boss: BossId) {}
    /// A boss was defeated.
    fn boss_defeated(&mut self, _boss: BossId) {}
}

/// Scene graph attach and detach target.
pub trait SceneSink {
    /// A visual node must be created and attached.
    fn attach(&mut self, _node: VisualNode) {}
    /// A visual node must be detached and its resources released.
    fn detach(&mut self, _node: VisualNode) {}
}

/// HUD data push.
pub trait HudSink {
    /// Latest HUD data after a tick.
    fn push(&mut self, _hud: &HudSnapshot) {}
}

/// Collaborator that ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl AudioCues for Silent {}
impl StatSink for Silent {}
impl SceneSink for Silent {}
impl HudSink for Silent {}
