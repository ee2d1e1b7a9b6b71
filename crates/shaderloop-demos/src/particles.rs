//! Bouncing particles integrated by a compute kernel and drawn as instanced
//! quads from the same shader's buffers.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use rand::Rng;

use shaderloop_engine::geometry::{Geometry, unit_quad};
use shaderloop_engine::pass::WorkgroupCount;
use shaderloop_engine::resource::{BindingDesc, Resource};
use shaderloop_engine::run::{FrameCtx, FrameHooks};
use shaderloop_engine::shader::Shader;
use shaderloop_engine::window::SetupCtx;

const SOURCE: &str = include_str!("shaders/particles.wgsl");

pub const PARTICLE_COUNT: u32 = 2000;
pub const WORKGROUP_SIZE: u32 = 64;

const PARAMS: u32 = 0;
const PARTICLES_IN: u32 = 1;
const PARTICLES_OUT: u32 = 2;

// Element offsets into the params uniform.
const GRAVITY: usize = 2;
const FRICTION: usize = 3;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub pos: [f32; 2],
    pub spd: [f32; 2],
}

impl Particle {
    /// One explicit integration step, matching the kernel.
    pub fn step(mut self, p: &Params) -> Self {
        self.pos[0] += self.spd[0];
        self.pos[1] += self.spd[1];

        for (axis, bound) in [p.width, p.height].into_iter().enumerate() {
            if self.pos[axis] < 0.0 {
                self.pos[axis] = self.pos[axis].abs();
                self.spd[axis] *= -p.friction;
            }
            if self.pos[axis] > bound {
                self.pos[axis] = 2.0 * bound - self.pos[axis];
                self.spd[axis] *= -p.friction;
            }
        }

        self.spd[1] -= p.gravity;
        self
    }
}

/// Simulation parameters uploaded as the params uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Params {
    pub width: f32,
    pub height: f32,
    pub gravity: f32,
    /// Fraction of speed kept after hitting a wall.
    pub friction: f32,
}

impl Params {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            gravity: 0.05,
            friction: 0.9,
        }
    }

    fn to_vec(self) -> Vec<f32> {
        vec![self.width, self.height, self.gravity, self.friction]
    }
}

pub fn random_particles(rng: &mut impl Rng, count: u32, params: &Params, speed: f32) -> Vec<Particle> {
    (0..count)
        .map(|_| Particle {
            pos: [
                rng.random::<f32>() * params.width,
                rng.random::<f32>() * params.height,
            ],
            spd: [
                rng.random_range(-speed..=speed),
                rng.random_range(-speed..=speed),
            ],
        })
        .collect()
}

pub fn shader(params: &Params, particles: &[Particle]) -> Result<Shader> {
    use wgpu::ShaderStages as S;
    let data: Vec<f32> = bytemuck::cast_slice(particles).to_vec();
    let blank = vec![0.0f32; data.len()];

    Shader::new(SOURCE)
        .with_label("particles")
        .with_resources([
            Resource::uniform(
                BindingDesc::new(PARAMS, S::VERTEX | S::FRAGMENT | S::COMPUTE).with_label("params"),
                params.to_vec(),
            ),
            Resource::storage(
                BindingDesc::new(PARTICLES_IN, S::VERTEX | S::COMPUTE).with_label("particles in"),
                data,
                true,
            ),
            Resource::storage(
                BindingDesc::new(PARTICLES_OUT, S::COMPUTE).with_label("particles out"),
                blank,
                false,
            ),
        ])
        .with_ping_pong(PARTICLES_IN, PARTICLES_OUT)
}

fn params_mut(shader: &mut Shader) -> Result<&mut Resource> {
    shader
        .resource_mut(PARAMS)
        .context("particle shader has no params uniform")
}

pub fn set_gravity(shader: &mut Shader, gravity: f32) -> Result<()> {
    params_mut(shader)?.write_f32(GRAVITY, &[gravity])
}

pub fn set_friction(shader: &mut Shader, friction: f32) -> Result<()> {
    params_mut(shader)?.write_f32(FRICTION, &[friction])
}

pub fn geometry(params: &Params, particles: &[Particle]) -> Result<Geometry> {
    Ok(unit_quad(shader(params, particles)?)?.with_instance_count(particles.len() as u32))
}

/// Integrates every particle once per rendered frame.
pub struct Particles {
    workgroups: WorkgroupCount,
}

impl Particles {
    pub fn new(count: u32) -> Self {
        Self {
            workgroups: WorkgroupCount::covering(count, WORKGROUP_SIZE).into(),
        }
    }
}

impl FrameHooks for Particles {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        ctx.run_compute(self.workgroups)?;
        ctx.swap_buffers()
    }
}

pub fn setup(setup: &SetupCtx<'_>) -> Result<(Geometry, Particles)> {
    let (width, height) = setup.size;
    let params = Params::new(width as f32, height as f32);
    let particles = random_particles(&mut rand::rng(), PARTICLE_COUNT, &params, 4.0);
    Ok((geometry(&params, &particles)?, Particles::new(PARTICLE_COUNT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_gpu;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shaderloop_engine::device::read_buffer_as;
    use shaderloop_engine::pass::run_compute_pass;

    fn params() -> Params {
        Params::new(100.0, 50.0)
    }

    #[test]
    fn particles_reflect_off_walls() {
        let p = params();
        let moved = Particle {
            pos: [99.0, 1.0],
            spd: [3.0, -2.0],
        }
        .step(&p);

        assert_eq!(moved.pos, [98.0, 1.0]);
        assert!((moved.spd[0] + 3.0 * p.friction).abs() < 1e-6);
        assert!((moved.spd[1] - (2.0 * p.friction - p.gravity)).abs() < 1e-6);
    }

    #[test]
    fn random_particles_start_inside_the_area() {
        let p = params();
        let particles = random_particles(&mut StdRng::seed_from_u64(5), 500, &p, 2.0);
        assert_eq!(particles.len(), 500);
        for particle in &particles {
            assert!((0.0..=p.width).contains(&particle.pos[0]));
            assert!((0.0..=p.height).contains(&particle.pos[1]));
            assert!(particle.spd.iter().all(|s| s.abs() <= 2.0));
        }
    }

    #[test]
    fn setters_update_params() {
        let mut shader = shader(&params(), &[Particle::zeroed(); 4]).unwrap();
        set_gravity(&mut shader, 0.5).unwrap();
        set_friction(&mut shader, 0.25).unwrap();

        let uniform = shader.resource(PARAMS).unwrap();
        assert_eq!(uniform.read_f32(GRAVITY), Some(0.5));
        assert_eq!(uniform.read_f32(FRICTION), Some(0.25));
        assert!(uniform.needs_update());
    }

    #[test]
    fn workgroups_cover_every_particle() {
        assert_eq!(Particles::new(PARTICLE_COUNT).workgroups, WorkgroupCount::new(32, 1, 1));
        assert_eq!(Particles::new(64).workgroups, WorkgroupCount::new(1, 1, 1));
    }

    #[test]
    fn kernel_matches_host_step() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let p = params();
        // Not a multiple of the workgroup size, so the bounds check is exercised.
        let particles = random_particles(&mut StdRng::seed_from_u64(9), 100, &p, 3.0);
        let mut shader = shader(&p, &particles).unwrap();

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        run_compute_pass(&mut encoder, &ctx, &mut shader, Particles::new(100).workgroups).unwrap();
        ctx.queue.submit(Some(encoder.finish()));
        shader.swap_buffers().unwrap();

        let stepped = read_buffer_as::<Particle>(&ctx, shader.current_buffer().unwrap()).unwrap();
        assert_eq!(stepped.len(), particles.len());
        for (got, host) in stepped.iter().zip(&particles) {
            let expected = host.step(&p);
            for i in 0..2 {
                assert!((got.pos[i] - expected.pos[i]).abs() < 1e-4);
                assert!((got.spd[i] - expected.spd[i]).abs() < 1e-4);
            }
        }
    }
}
