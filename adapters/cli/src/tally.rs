//! Collaborators that accumulate a run's statistics instead of presenting them.

use std::collections::BTreeMap;

use ashfall_core::{
    collaborators::{AudioCues, HudSink, SceneSink, StatSink},
    BossId, EnemyId, EnemyKind, HudSnapshot, PickupKind, SurfaceMaterial, VisualNode, WeaponKind,
};
use ashfall_world::Collaborators;

/// Audio cues counted by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CueCount {
    /// Footsteps played.
    pub footsteps: u32,
    /// Shots, pulses and throws.
    pub shots: u32,
    /// Empty trigger pulls.
    pub empty_clicks: u32,
    /// Reloads started.
    pub reloads: u32,
    /// Rolls.
    pub rolls: u32,
    /// Explosions.
    pub explosions: u32,
}

impl AudioCues for CueCount {
    fn footstep(&mut self, _surface: SurfaceMaterial) {
        self.footsteps += 1;
    }

    fn weapon_fired(&mut self, _weapon: WeaponKind) {
        self.shots += 1;
    }

    fn empty_click(&mut self, _weapon: WeaponKind) {
        self.empty_clicks += 1;
    }

    fn reload_started(&mut self, _weapon: WeaponKind) {
        self.reloads += 1;
    }

    fn roll(&mut self) {
        self.rolls += 1;
    }

    fn explosion(&mut self) {
        self.explosions += 1;
    }
}

/// Combat statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// Points awarded.
    pub score: u64,
    /// Kills per enemy kind.
    pub kills: BTreeMap<EnemyKind, u32>,
    /// Damage dealt to enemies.
    pub damage_dealt: f32,
    /// Damage the player absorbed.
    pub damage_taken: f32,
    /// Pickups collected.
    pub pickups: u32,
    /// Bosses that were seen.
    pub bosses_sighted: Vec<BossId>,
    /// Bosses that were defeated.
    pub bosses_defeated: Vec<BossId>,
}

impl Stats {
    /// Total number of kills across every kind.
    #[must_use]
    pub fn total_kills(&self) -> u32 {
        self.kills.values().sum()
    }
}

impl StatSink for Stats {
    fn damage_dealt(&mut self, _enemy: EnemyId, amount: f32, _weapon: Option<WeaponKind>) {
        self.damage_dealt += amount;
    }

    fn damage_taken(&mut self, amount: f32) {
        self.damage_taken += amount;
    }

    fn kill(&mut self, kind: EnemyKind, weapon: Option<WeaponKind>) {
        log::debug!("{kind:?} killed with {weapon:?}");
        *self.kills.entry(kind).or_default() += 1;
    }

    fn score(&mut self, points: u32) {
        self.score += u64::from(points);
    }

    fn pickup(&mut self, kind: PickupKind) {
        log::debug!("picked up {kind:?}");
        self.pickups += 1;
    }

    fn boss_sighted(&mut self, boss: BossId) {
        log::info!("boss {} sighted", boss.get());
        self.bosses_sighted.push(boss);
    }

    fn boss_defeated(&mut self, boss: BossId) {
        log::info!("boss {} defeated", boss.get());
        self.bosses_defeated.push(boss);
    }
}

/// Visual node bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneCount {
    /// Nodes currently attached.
    pub live: usize,
    /// Most nodes attached at once.
    pub peak: usize,
}

impl SceneSink for SceneCount {
    fn attach(&mut self, _node: VisualNode) {
        self.live += 1;
        self.peak = self.peak.max(self.live);
    }

    fn detach(&mut self, node: VisualNode) {
        match self.live.checked_sub(1) {
            Some(live) => self.live = live,
            None => log::warn!("{node:?} detached without being attached"),
        }
    }
}

/// Running statistics of a headless session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    /// Audio cues.
    pub cues: CueCount,
    /// Combat statistics.
    pub stats: Stats,
    /// Scene nodes.
    pub scene: SceneCount,
    /// Last HUD data pushed.
    pub hud: Option<HudSnapshot>,
}

impl Tally {
    /// Borrows the tally as the world's event collaborators.
    pub fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators {
            audio: &mut self.cues,
            stats: &mut self.stats,
            scene: &mut self.scene,
        }
    }
}

impl HudSink for Tally {
    fn push(&mut self, hud: &HudSnapshot) {
        self.hud = Some(*hud);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_count_tracks_the_peak() {
        let mut scene = SceneCount::default();
        for id in 1..=3 {
            scene.attach(VisualNode::Enemy(EnemyId::new(id)));
        }
        scene.detach(VisualNode::Enemy(EnemyId::new(1)));
        scene.detach(VisualNode::Enemy(EnemyId::new(2)));

        assert_eq!(scene, SceneCount { live: 1, peak: 3 });
    }

    #[test]
    fn kills_are_grouped_by_kind() {
        let mut stats = Stats::default();
        stats.kill(EnemyKind::Walker, Some(WeaponKind::Pistol));
        stats.kill(EnemyKind::Walker, None);
        stats.kill(EnemyKind::Runner, Some(WeaponKind::Grenade));

        assert_eq!(stats.total_kills(), 3);
        assert_eq!(stats.kills.get(&EnemyKind::Walker), Some(&2));
    }
}
