//! Visual-only particle layer
//!
//! Particles never feed back into gameplay: the simulation spawns them,
//! advances them first in every substep, and the renderer reads them out.
//! All randomness comes from the game state's seeded RNG so replays of the
//! same seed produce the same effects.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::sim::geometry::Rect;
use crate::{map_range, rotate_point};

/// A single visual effect entity
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub size: Vec2,
    pub opacity: f32,
    /// Style hint for the renderer (CSS-style color name)
    pub color: &'static str,
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    /// Ground-contact spark, falls back onto its spawn height
    Slide {
        origin_y: f32,
        gravity: f32,
        vel: Vec2,
        time: f32,
    },
    /// Fading trail segment left by the wave player
    WaveTrail { time: f32 },
    /// Death explosion: one growing ring plus flying shards
    DeathBurst { vel: Vec2, grow: bool, age: f32 },
    /// Speck orbiting an orb, spiraling inward
    OrbAmbient {
        center: Vec2,
        deg: f32,
        r: f32,
        v_deg: f32,
        v_r: f32,
    },
    /// Speck swirling into a portal mouth
    PortalAmbient {
        center: Vec2,
        deg: f32,
        r_start: f32,
        r: f32,
    },
    /// Expanding or collapsing activation ring (orbs, pads, portals)
    Flash {
        r_start: f32,
        r_end: f32,
        r_acc: f32,
        r: f32,
        v: f32,
    },
    /// Spark shaken loose from a pad surface
    PadSpark { origin: Vec2, vel: Vec2, acc: Vec2 },
}

/// Owns every live particle; drained of expired entries each substep
#[derive(Debug, Clone, Default)]
pub struct Particles {
    items: Vec<Particle>,
}

impl Particles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn spawn_slide(&mut self, rng: &mut Pcg32, x: f32, y: f32, direction: f32, gravity: f32) {
        let vel = Vec2::new(
            rng.random::<f32>() / -20.0 * direction,
            rng.random::<f32>() / 10.0 * gravity,
        );
        self.items.push(Particle {
            pos: Vec2::new(x, y),
            size: Vec2::splat(0.1),
            opacity: 1.0,
            color: "#0F5",
            kind: Kind::Slide {
                origin_y: y,
                gravity,
                vel,
                time: 0.0,
            },
        });
    }

    pub fn spawn_wave_trail(&mut self, x: f32, y: f32) {
        self.items.push(Particle {
            pos: Vec2::new(x, y),
            size: Vec2::splat(0.3),
            opacity: 1.0,
            color: "#0F5",
            kind: Kind::WaveTrail { time: 0.0 },
        });
    }

    /// One growing ring plus twenty shards flying out of the death point
    pub fn spawn_death_burst(&mut self, rng: &mut Pcg32, x: f32, y: f32) {
        let pos = Vec2::new(x, y);
        self.items.push(Particle {
            pos,
            size: Vec2::splat(1.0),
            opacity: 1.0,
            color: "#0F5",
            kind: Kind::DeathBurst {
                vel: Vec2::ZERO,
                grow: true,
                age: 1.0,
            },
        });
        for _ in 0..20 {
            let vel = Vec2::new(
                (rng.random::<f32>() - 0.5) / 3.0,
                (rng.random::<f32>() - 0.5) / 3.0,
            );
            self.items.push(Particle {
                pos,
                size: Vec2::splat(0.3),
                opacity: 1.0,
                color: "#0F5",
                kind: Kind::DeathBurst {
                    vel,
                    grow: false,
                    age: 1.0,
                },
            });
        }
    }

    pub fn spawn_orb_ambient(&mut self, rng: &mut Pcg32, x: f32, y: f32, color: &'static str) {
        let center = Vec2::new(x, y);
        self.items.push(Particle {
            pos: center,
            size: Vec2::splat(0.1),
            opacity: 1.0,
            color,
            kind: Kind::OrbAmbient {
                center,
                deg: rng.random::<f32>() * 360.0,
                r: 0.6,
                v_deg: 0.0,
                v_r: 0.0,
            },
        });
    }

    pub fn spawn_portal_ambient(
        &mut self,
        rng: &mut Pcg32,
        x: f32,
        y: f32,
        color: &'static str,
        base_deg: f32,
    ) {
        let center = Vec2::new(x, y);
        let r_start = 0.8 + rng.random::<f32>() * 0.4;
        self.items.push(Particle {
            pos: center,
            size: Vec2::splat(0.1),
            opacity: 1.0,
            color,
            kind: Kind::PortalAmbient {
                center,
                deg: base_deg + rng.random::<f32>() * 180.0,
                r_start,
                r: r_start,
            },
        });
    }

    /// Activation ring. `r_acc > 0` grows from `r_start` out to `r_end`;
    /// `r_acc < 0` collapses inward.
    pub fn spawn_flash(
        &mut self,
        x: f32,
        y: f32,
        color: &'static str,
        r_start: f32,
        r_end: f32,
        r_acc: f32,
    ) {
        self.items.push(Particle {
            pos: Vec2::new(x, y),
            size: Vec2::splat(r_start * 2.0),
            opacity: 0.5,
            color,
            kind: Kind::Flash {
                r_start,
                r_end,
                r_acc: r_acc * 0.001,
                r: r_start,
                v: 0.0,
            },
        });
    }

    pub fn spawn_pad_spark(
        &mut self,
        rng: &mut Pcg32,
        surface: Rect,
        acc: Vec2,
        color: &'static str,
    ) {
        let pos = Vec2::new(
            surface.x + rng.random::<f32>() * surface.w - 0.5,
            surface.y + rng.random::<f32>() * surface.h - 0.5,
        );
        self.items.push(Particle {
            pos,
            size: Vec2::splat(0.1),
            opacity: 1.0,
            color,
            kind: Kind::PadSpark {
                origin: pos,
                vel: Vec2::ZERO,
                acc,
            },
        });
    }

    /// Advance every particle and drop the expired ones
    pub fn tick(&mut self, dt: f32) {
        self.items.retain_mut(|p| p.tick(dt));
    }
}

impl Particle {
    /// Returns false once the particle has burned out
    fn tick(&mut self, dt: f32) -> bool {
        match &mut self.kind {
            Kind::Slide {
                origin_y,
                gravity,
                vel,
                time,
            } => {
                *time += dt;
                vel.y -= 0.005 * dt * *gravity;
                self.pos += *vel * dt;
                let landed = if *gravity < 0.0 {
                    self.pos.y >= *origin_y
                } else {
                    self.pos.y <= *origin_y
                };
                if landed {
                    self.pos.y = *origin_y;
                    vel.y = 0.0;
                    *time += 1.0;
                }
                self.opacity = map_range(*time, 0.0, 15.0, 1.0, 0.0);
                *time < 15.0
            }
            Kind::WaveTrail { time } => {
                *time += dt;
                self.opacity = map_range(*time, 0.0, 100.0, 1.0, 0.0);
                *time < 100.0
            }
            Kind::DeathBurst { vel, grow, age } => {
                *age += 0.2 * dt;
                self.pos += *vel * dt;
                if *grow {
                    self.size = Vec2::splat(*age);
                }
                self.opacity = map_range(*age, 1.0, 5.0, 1.0, 0.0);
                *age < 5.0
            }
            Kind::OrbAmbient {
                center,
                deg,
                r,
                v_deg,
                v_r,
            } => {
                *deg += *v_deg * dt;
                *r += *v_r * dt;
                self.pos = rotate_point(*center, *center - Vec2::new(*r, 0.0), *deg);
                *v_deg += 2.0 * dt;
                *v_r -= 0.01 * dt;
                *r > 0.0
            }
            Kind::PortalAmbient {
                center,
                deg,
                r_start,
                r,
            } => {
                *r -= 0.06 * dt;
                self.pos = rotate_point(*center, *center - Vec2::new(*r, 0.0), *deg);
                self.opacity = map_range(*r, *r_start, 0.0, 1.0, 0.0);
                *r > 0.0
            }
            Kind::Flash {
                r_start,
                r_end,
                r_acc,
                r,
                v,
            } => {
                *v += *r_acc * dt;
                *r += *v * dt;
                self.size = Vec2::splat(*r * 2.0);
                self.opacity = map_range(*r, *r_start, *r_end, 0.75, 0.0);
                // Sign-aware: a collapsing ring ends at r_end from above.
                *r * *r_acc < *r_end * *r_acc
            }
            Kind::PadSpark { origin, vel, acc } => {
                self.pos += *vel * dt;
                *vel += 0.01 * *acc * dt;
                let dist = (self.pos.y - origin.y).abs() + (self.pos.x - origin.x).abs();
                self.opacity = map_range(dist, 0.0, 0.8, 1.0, 0.0);
                dist < 0.8
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_death_burst_spawns_ring_and_shards() {
        let mut particles = Particles::new();
        particles.spawn_death_burst(&mut rng(), 3.0, 4.0);
        assert_eq!(particles.len(), 21);
    }

    #[test]
    fn test_wave_trail_expires() {
        let mut particles = Particles::new();
        particles.spawn_wave_trail(0.0, 0.0);
        for _ in 0..99 {
            particles.tick(1.0);
        }
        assert_eq!(particles.len(), 1);
        particles.tick(1.0);
        assert!(particles.is_empty());
    }

    #[test]
    fn test_collapsing_flash_expires_at_zero() {
        let mut particles = Particles::new();
        particles.spawn_flash(0.0, 0.0, "yellow", 0.75, 0.0, -1.0);
        let mut guard = 0;
        while !particles.is_empty() {
            particles.tick(1.0);
            guard += 1;
            assert!(guard < 100_000, "flash never expired");
        }
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = Particles::new();
        let mut b = Particles::new();
        a.spawn_slide(&mut rng(), 1.0, 2.0, 1.0, 1.0);
        b.spawn_slide(&mut rng(), 1.0, 2.0, 1.0, 1.0);
        a.tick(0.5);
        b.tick(0.5);
        assert_eq!(a.items[0].pos, b.items[0].pos);
    }
}
