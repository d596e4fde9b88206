//! Entry and exit choreography for scene elements.
//!
//! Every animated element is described by a [`Track`] keyed by its [`Role`]
//! and the [`Phase`] of the scene it belongs to. The renderer asks for a
//! [`Pose`] at a time offset; nothing here keeps per-frame state except
//! [`Presence`], which sequences an outgoing scene's exit before the next
//! scene's entrance.

use raylib::prelude::ease;

use crate::constants::*;
use crate::scene::Overlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Scene,
    Panel,
    Tag,
    Headline,
    Narrative,
    Detail(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Active,
    Exit,
}

/// Visual offsets applied on top of an element's layout position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub opacity: f32,
    pub dx: f32,
    pub dy: f32,
    pub scale: f32,
    pub rotation: f32,
}

impl Pose {
    pub const REST: Pose = Pose { opacity: 1.0, dx: 0.0, dy: 0.0, scale: 1.0, rotation: 0.0 };

    const fn faded(opacity: f32, dx: f32, dy: f32, scale: f32) -> Self {
        Pose { opacity, dx, dy, scale, rotation: 0.0 }
    }

    fn lerp(self, to: Pose, t: f32) -> Pose {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return to;
        }
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Pose {
            opacity: mix(self.opacity, to.opacity),
            dx: mix(self.dx, to.dx),
            dy: mix(self.dy, to.dy),
            scale: mix(self.scale, to.scale),
            rotation: mix(self.rotation, to.rotation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseOut,
}

impl Easing {
    fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => ease::linear_none(t, 0.0, 1.0, 1.0),
            Easing::EaseOut => ease::cubic_out(t, 0.0, 1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub delay: f32,
    pub duration: f32,
    pub from: Pose,
    pub to: Pose,
    pub easing: Easing,
}

impl Track {
    pub fn end(&self) -> f32 {
        self.delay + self.duration
    }

    pub fn pose_at(&self, t: f32) -> Pose {
        let local = ((t - self.delay) / self.duration.max(f32::EPSILON)).clamp(0.0, 1.0);
        self.from.lerp(self.to, self.easing.apply(local))
    }
}

const fn track(delay: f32, duration: f32, from: Pose, to: Pose) -> Track {
    Track { delay, duration, from, to, easing: Easing::EaseOut }
}

pub fn track_for(role: Role, phase: Phase) -> Track {
    match (role, phase) {
        (Role::Scene, Phase::Exit) => track(
            0.0,
            SCENE_FADE_DURATION,
            Pose::REST,
            Pose::faded(0.0, 0.0, 0.0, 0.98),
        ),
        // Children leave with their scene.
        (_, Phase::Exit) => track(0.0, 0.0, Pose::REST, Pose::REST),
        (Role::Scene, _) => track(0.0, SCENE_FADE_DURATION, Pose::faded(0.0, 0.0, 0.0, 1.04), Pose::REST),
        (Role::Panel, _) => track(0.45, 0.9, Pose::faded(0.0, 0.0, 24.0, 1.0), Pose::faded(0.98, 0.0, 0.0, 1.0)),
        (Role::Tag, _) => track(0.6, 0.6, Pose::faded(0.0, -20.0, 0.0, 1.0), Pose::REST),
        (Role::Headline, _) => track(0.75, 0.75, Pose::faded(0.0, 0.0, 16.0, 1.0), Pose::REST),
        (Role::Narrative, _) => track(0.9, 0.75, Pose::faded(0.0, 0.0, 12.0, 1.0), Pose::REST),
        (Role::Detail(i), _) => track(
            DETAIL_DELAY + DETAIL_STAGGER * i as f32,
            DETAIL_DURATION,
            Pose::faded(0.0, 0.0, 12.0, 1.0),
            Pose::faded(0.92, 0.0, 0.0, 1.0),
        ),
    }
}

pub fn pose(role: Role, phase: Phase, t: f32) -> Pose {
    track_for(role, phase).pose_at(t)
}

/// Time after which every entrance track of a scene with `details` bullets
/// has settled.
pub fn settle_time(details: usize) -> f32 {
    let mut roles = vec![Role::Scene, Role::Panel, Role::Tag, Role::Headline, Role::Narrative];
    roles.extend((0..details).map(Role::Detail));
    roles
        .into_iter()
        .map(|role| track_for(role, Phase::Enter).end())
        .fold(0.0, f32::max)
}

/// Flares fade in and spin a full turn every `duration` seconds, restarting
/// from transparent on each loop, once their `delay` has elapsed.
pub fn flare_pose(overlay: &Overlay, t: f32) -> Pose {
    let local = t - overlay.delay;
    if local < 0.0 || overlay.duration <= 0.0 {
        return Pose { opacity: 0.0, rotation: 0.0, ..Pose::REST };
    }
    let cycle = Easing::Linear.apply((local / overlay.duration).fract());
    Pose {
        opacity: overlay.opacity * cycle,
        rotation: 360.0 * cycle,
        ..Pose::REST
    }
}

/// The scene currently drawn, with its phase and time within that phase.
/// `age` counts from the scene's entrance and keeps running through its exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visible {
    pub index: usize,
    pub phase: Phase,
    pub t: f32,
    pub age: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Shown { index: usize, since: f32 },
    Leaving { index: usize, shown: f32, since: f32, next: usize },
}

/// One-at-a-time scene presence: a new scene starts entering only once the
/// previous one has finished its exit.
#[derive(Debug, Clone, Copy)]
pub struct Presence {
    stage: Stage,
}

impl Presence {
    pub fn new(index: usize, now: f32) -> Self {
        Self { stage: Stage::Shown { index, since: now } }
    }

    /// Requests `index` to be shown. Re-selecting the scene already shown is
    /// a no-op; selecting during an exit only retargets the entrance.
    pub fn show(&mut self, index: usize, now: f32) {
        self.stage = match self.stage {
            Stage::Shown { index: shown, .. } if shown == index => self.stage,
            Stage::Shown { index: current, since: shown } => Stage::Leaving { index: current, shown, since: now, next: index },
            Stage::Leaving { index: leaving, shown, since, .. } => Stage::Leaving { index: leaving, shown, since, next: index },
        };
    }

    /// `details` reports the bullet count of a scene, which decides when its
    /// entrance has settled.
    pub fn visible(&mut self, now: f32, details: impl Fn(usize) -> usize) -> Visible {
        if let Stage::Leaving { since, next, .. } = self.stage {
            if now - since >= SCENE_FADE_DURATION {
                self.stage = Stage::Shown { index: next, since: since + SCENE_FADE_DURATION };
            }
        }

        match self.stage {
            Stage::Leaving { index, shown, since, .. } => Visible { index, phase: Phase::Exit, t: now - since, age: now - shown },
            Stage::Shown { index, since } => {
                let t = now - since;
                let phase = if t < settle_time(details(index)) { Phase::Enter } else { Phase::Active };
                Visible { index, phase, t, age: t }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three(_: usize) -> usize {
        3
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn scene_entrance_fades_and_settles() {
        let start = pose(Role::Scene, Phase::Enter, 0.0);
        assert_eq!(start.opacity, 0.0);
        assert!(close(start.scale, 1.04));
        assert_eq!(pose(Role::Scene, Phase::Enter, SCENE_FADE_DURATION), Pose::REST);
    }

    #[test]
    fn panel_waits_for_its_delay() {
        assert_eq!(pose(Role::Panel, Phase::Enter, 0.3).opacity, 0.0);
        assert!(close(pose(Role::Panel, Phase::Enter, 0.3).dy, 24.0));
        let settled = pose(Role::Panel, Phase::Active, 5.0);
        assert!(close(settled.opacity, 0.98));
        assert_eq!(settled.dy, 0.0);
    }

    #[test]
    fn details_are_staggered() {
        let t = DETAIL_DELAY + DETAIL_STAGGER * 1.5;
        assert!(pose(Role::Detail(0), Phase::Enter, t).opacity > pose(Role::Detail(1), Phase::Enter, t).opacity);
        assert_eq!(pose(Role::Detail(2), Phase::Enter, t).opacity, 0.0);
    }

    #[test]
    fn settle_time_covers_the_last_detail() {
        assert!(close(settle_time(3), DETAIL_DELAY + 2.0 * DETAIL_STAGGER + DETAIL_DURATION));
        assert!(close(settle_time(0), 0.9 + 0.75));
    }

    #[test]
    fn flares_loop_after_their_delay() {
        let overlay = Overlay { size: 100.0, blur: 10.0, opacity: 0.4, x: 0.0, y: 0.0, hue: 0.0, delay: 1.0, duration: 10.0 };
        assert_eq!(flare_pose(&overlay, 0.5).opacity, 0.0);
        let mid = flare_pose(&overlay, 6.0);
        assert!(close(mid.rotation, 180.0));
        assert!(close(mid.opacity, 0.2));
        assert!(close(flare_pose(&overlay, 11.0).rotation, 0.0));
    }

    #[test]
    fn presence_waits_for_exit_before_entering() {
        let mut presence = Presence::new(0, 0.0);
        assert_eq!(presence.visible(0.5, three).phase, Phase::Enter);
        assert_eq!(presence.visible(10.0, three).phase, Phase::Active);

        presence.show(1, 10.0);
        let leaving = presence.visible(10.5, three);
        assert_eq!((leaving.index, leaving.phase), (0, Phase::Exit));
        assert!(close(leaving.t, 0.5));
        assert!(close(leaving.age, 10.5));

        let entering = presence.visible(10.0 + SCENE_FADE_DURATION + 0.25, three);
        assert_eq!((entering.index, entering.phase), (1, Phase::Enter));
        assert!(close(entering.t, 0.25));
    }

    #[test]
    fn presence_retargets_during_exit_and_ignores_reselect() {
        let mut presence = Presence::new(2, 0.0);
        presence.show(2, 1.0);
        assert_eq!(presence.visible(1.0, three), Visible { index: 2, phase: Phase::Enter, t: 1.0, age: 1.0 });

        presence.show(3, 4.0);
        presence.show(4, 4.5);
        let v = presence.visible(4.0 + SCENE_FADE_DURATION + 0.01, three);
        assert_eq!(v.index, 4);
        assert_eq!(v.phase, Phase::Enter);
    }
}
