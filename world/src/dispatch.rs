//! Routes a completed tick's events to the presentation collaborators.

use ashfall_core::{
    collaborators::{AudioCues, HudSink, SceneSink, StatSink},
    AudioCue, Event,
};

use crate::{query, World};

/// Presentation layers that observe the simulation.
pub struct Collaborators<'a> {
    /// Audio engine.
    pub audio: &'a mut dyn AudioCues,
    /// Score and statistics accumulation.
    pub stats: &'a mut dyn StatSink,
    /// Scene graph attach and detach target.
    pub scene: &'a mut dyn SceneSink,
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Forwards every event to the collaborator method that presents it.
pub fn dispatch(events: &[Event], collaborators: &mut Collaborators<'_>) {
    for event in events {
        match *event {
            Event::Cue(cue) => play(cue, collaborators.audio),
            Event::NodeAttached { node } => collaborators.scene.attach(node),
            Event::NodeDetached { node } => collaborators.scene.detach(node),
            Event::DamageDealt {
                enemy,
                amount,
                weapon,
            } => collaborators.stats.damage_dealt(enemy, amount, weapon),
            Event::DamageTaken { amount, .. } => collaborators.stats.damage_taken(amount),
            Event::EnemyKilled { kind, weapon, .. } => collaborators.stats.kill(kind, weapon),
            Event::ScoreDelta { points } => collaborators.stats.score(points),
            Event::PickupCollected { kind, .. } => collaborators.stats.pickup(kind),
            Event::BossSighted { boss } => collaborators.stats.boss_sighted(boss),
            Event::BossDefeated { boss } => collaborators.stats.boss_defeated(boss),
            _ => {}
        }
    }
}

/// Pushes the HUD data of the active sector. Nothing is pushed between sectors.
pub fn push_hud(world: &World, hud: &mut dyn HudSink) {
    if query::is_sector_loaded(world) {
        hud.push(&query::hud(world));
    }
}

fn play(cue: AudioCue, audio: &mut dyn AudioCues) {
    match cue {
        AudioCue::Footstep { surface } => audio.footstep(surface),
        AudioCue::Impact { material } => audio.impact(material),
        AudioCue::WeaponFire { weapon } => audio.weapon_fired(weapon),
        AudioCue::EmptyClick { weapon } => audio.empty_click(weapon),
        AudioCue::ReloadStart { weapon } => audio.reload_started(weapon),
        AudioCue::ReloadEnd { weapon } => audio.reload_finished(weapon),
        AudioCue::Roll => audio.roll(),
        AudioCue::Explosion => audio.explosion(),
    }
}
