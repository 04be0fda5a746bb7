use episode_data::Action;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

pub const AGENT_RADIUS: f32 = 0.06;
pub const BOX_HALF_SIZE: f32 = 0.08;
const MOVE_SPEED: f32 = 0.03;
const TURN_RATE: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    pub with_box: bool,
}

/// A single agent in the unit square, optionally with one pushable box.
pub struct BoxPushWorld {
    config: WorldConfig,
    agent: (f32, f32),
    heading: f32,
    box_center: Option<(f32, f32)>,
    rng: StdRng,
}

impl BoxPushWorld {
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let mut world = Self {
            config,
            agent: (0.5, 0.5),
            heading: 0.0,
            box_center: None,
            rng: StdRng::seed_from_u64(seed),
        };
        world.reset();
        world
    }
    pub fn reset(&mut self) {
        let margin = 2.0 * AGENT_RADIUS;
        self.agent = (
            self.rng.gen_range(margin..1.0 - margin),
            self.rng.gen_range(margin..1.0 - margin),
        );
        self.heading = self.rng.gen_range(-PI..PI);
        self.box_center = None;
        if self.config.with_box {
            // rejection sampling terminates quickly: the box may go almost anywhere
            loop {
                let margin = 2.0 * BOX_HALF_SIZE;
                let candidate = (
                    self.rng.gen_range(margin..1.0 - margin),
                    self.rng.gen_range(margin..1.0 - margin),
                );
                if !disc_overlaps_box(self.agent, candidate) {
                    self.box_center = Some(candidate);
                    break;
                }
            }
        }
    }
    /// Applies `[forward, turn]` and returns the distance the box moved.
    pub fn step(&mut self, action: Action) -> f32 {
        let [forward, turn] = action;
        self.heading += turn * TURN_RATE;
        let delta = (
            forward * MOVE_SPEED * self.heading.cos(),
            forward * MOVE_SPEED * self.heading.sin(),
        );
        let target = clamp_to_arena(
            (self.agent.0 + delta.0, self.agent.1 + delta.1),
            AGENT_RADIUS,
        );
        match self.box_center {
            Some(box_center) if disc_overlaps_box(target, box_center) => {
                let pushed = clamp_to_arena(
                    (box_center.0 + delta.0, box_center.1 + delta.1),
                    BOX_HALF_SIZE,
                );
                if disc_overlaps_box(target, pushed) {
                    // box is against a wall: the agent is blocked
                    0.0
                } else {
                    self.agent = target;
                    self.box_center = Some(pushed);
                    distance(box_center, pushed)
                }
            }
            _ => {
                self.agent = target;
                0.0
            }
        }
    }
    pub fn agent(&self) -> (f32, f32) {
        self.agent
    }
    pub fn heading(&self) -> f32 {
        self.heading
    }
    pub fn box_center(&self) -> Option<(f32, f32)> {
        self.box_center
    }
}

fn clamp_to_arena(point: (f32, f32), half_extent: f32) -> (f32, f32) {
    (
        point.0.clamp(half_extent, 1.0 - half_extent),
        point.1.clamp(half_extent, 1.0 - half_extent),
    )
}

fn disc_overlaps_box(center: (f32, f32), box_center: (f32, f32)) -> bool {
    let closest = (
        center.0.clamp(box_center.0 - BOX_HALF_SIZE, box_center.0 + BOX_HALF_SIZE),
        center.1.clamp(box_center.1 - BOX_HALF_SIZE, box_center.1 + BOX_HALF_SIZE),
    );
    distance(center, closest) < AGENT_RADIUS
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_facing_box() -> BoxPushWorld {
        let mut world = BoxPushWorld::new(WorldConfig { with_box: true }, 0);
        world.agent = (0.3, 0.5);
        world.heading = 0.0;
        world.box_center = Some((0.3 + AGENT_RADIUS + BOX_HALF_SIZE + 0.01, 0.5));
        world
    }

    #[test]
    fn noop_keeps_the_agent_still() {
        let mut world = world_facing_box();
        let before = world.agent();
        assert_eq!(world.step([0.0, 0.0]), 0.0);
        assert_eq!(world.agent(), before);
    }

    #[test]
    fn driving_into_the_box_pushes_it() {
        let mut world = world_facing_box();
        let start = world.box_center().unwrap();
        let moved: f32 = (0..5).map(|_| world.step([1.0, 0.0])).sum();
        assert!(moved > 0.0);
        assert!(world.box_center().unwrap().0 > start.0);
    }

    #[test]
    fn agent_stays_inside_the_arena() {
        let mut world = BoxPushWorld::new(WorldConfig { with_box: false }, 3);
        for _ in 0..200 {
            world.step([1.0, 0.0]);
        }
        let (x, y) = world.agent();
        assert!((AGENT_RADIUS..=1.0 - AGENT_RADIUS).contains(&x));
        assert!((AGENT_RADIUS..=1.0 - AGENT_RADIUS).contains(&y));
    }

    #[test]
    fn reset_never_places_the_box_on_the_agent() {
        let mut world = BoxPushWorld::new(WorldConfig { with_box: true }, 21);
        for _ in 0..50 {
            world.reset();
            assert!(!disc_overlaps_box(world.agent(), world.box_center().unwrap()));
        }
    }
}
