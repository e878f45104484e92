use glam::Vec2;
use log::trace;

use crate::types::{Canvas, Rgba};

/// What a particle represents; scenarios branch their collision rules on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Rain,
    Meltwater,
    Debris,
    Lava,
    Smoke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleState {
    /// Moving under integration.
    Free,
    /// At rest against the ground; skipped by integration.
    Settled,
}

/// A point mass owned by exactly one [`ParticleSystem`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: Rgba,
    pub state: ParticleState,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, vel: Vec2, size: f32, color: Rgba) -> Self {
        Self {
            pos,
            vel,
            size,
            color,
            state: ParticleState::Free,
            kind,
        }
    }

    /// A particle already resting at `pos`.
    pub fn at_rest(kind: ParticleKind, pos: Vec2, size: f32, color: Rgba) -> Self {
        Self {
            state: ParticleState::Settled,
            ..Self::new(kind, pos, Vec2::ZERO, size, color)
        }
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.state == ParticleState::Settled
    }

    pub fn settle(&mut self) {
        self.state = ParticleState::Settled;
        self.vel = Vec2::ZERO;
    }

    pub fn release(&mut self, vel: Vec2) {
        self.state = ParticleState::Free;
        self.vel = vel;
    }
}

/// The particle population of one scenario.
///
/// Order carries no meaning. The collection is optionally capped; spawns
/// past the cap are dropped rather than evicting live particles.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    cap: Option<usize>,
    dropped: u64,
}

impl ParticleSystem {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            particles: Vec::with_capacity(cap.unwrap_or(256).min(1024)),
            cap,
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawns refused because the cap was reached.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn free_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut().filter(|p| !p.is_settled())
    }

    pub fn count_free(&self) -> usize {
        self.particles.iter().filter(|p| !p.is_settled()).count()
    }

    /// Adds `p` unless the cap is reached. Returns whether it was added.
    pub fn spawn(&mut self, p: Particle) -> bool {
        if self.cap.is_some_and(|cap| self.particles.len() >= cap) {
            self.dropped += 1;
            return false;
        }
        self.particles.push(p);
        true
    }

    /// Spawns as many of `batch` as fit. Returns the number added.
    pub fn spawn_batch<I: IntoIterator<Item = Particle>>(&mut self, batch: I) -> usize {
        let mut added = 0;
        let mut refused = 0;
        for p in batch {
            if self.spawn(p) {
                added += 1;
            } else {
                refused += 1;
            }
        }
        if refused > 0 {
            trace!("particle cap {:?} reached, dropped {refused} spawns", self.cap);
        }
        added
    }

    /// Forward Euler step for free particles: `vel.y += accel(kind)`, then
    /// `pos += vel`.
    pub fn integrate_by(&mut self, accel: impl Fn(ParticleKind) -> f32) {
        for p in self.free_mut() {
            p.vel.y += accel(p.kind);
            p.pos += p.vel;
        }
    }

    /// [`Self::integrate_by`] with the same gravity for every kind.
    pub fn integrate(&mut self, gravity: f32) {
        self.integrate_by(|_| gravity);
    }

    /// Keeps the particles for which `f` returns `true`. `f` may mutate
    /// each particle; this is where scenarios run their collision rules.
    pub fn retain_mut(&mut self, f: impl FnMut(&mut Particle) -> bool) {
        self.particles.retain_mut(f);
    }

    /// Removes every particle, settled or not, outside the canvas grown by
    /// `margin` on all sides. Returns the number removed.
    pub fn cull(&mut self, canvas: Canvas, margin: f32) -> usize {
        let before = self.particles.len();
        self.particles
            .retain(|p| canvas.contains_with_margin(p.pos, margin));
        before - self.particles.len()
    }
}
