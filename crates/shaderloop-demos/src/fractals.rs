//! Mandelbrot and Julia sets drawn by a single fragment shader over a quad.

use std::f32::consts::TAU;

use anyhow::{Context, Result};

use shaderloop_engine::geometry::{Geometry, unit_quad, unit_quad_indexed};
use shaderloop_engine::resource::{BindingDesc, Resource};
use shaderloop_engine::run::{FrameCtx, FrameHooks};
use shaderloop_engine::shader::Shader;
use shaderloop_engine::window::SetupCtx;

const MANDELBROT_SOURCE: &str = include_str!("shaders/mandelbrot.wgsl");
const JULIA_SOURCE: &str = include_str!("shaders/julia.wgsl");

const PARAMS_BINDING: u32 = 0;
const MAX_ITERATIONS: f32 = 150.0;

// Element offsets into the params uniform.
const SCALE: usize = 2;
const C0: usize = 4;

/// Scale oscillation: zoom in until `MAX_SCALE`, then out until `MIN_SCALE`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Zoom {
    scale: f32,
    zooming_in: bool,
}

impl Zoom {
    pub const MAX_SCALE: f32 = 30_000.0;
    pub const MIN_SCALE: f32 = 0.5;
    const IN: f32 = 1.01;
    const OUT: f32 = 0.99;

    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            zooming_in: true,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zooming_in(&self) -> bool {
        self.zooming_in
    }

    /// Advances one frame and returns the new scale.
    pub fn step(&mut self) -> f32 {
        if self.scale > Self::MAX_SCALE {
            self.zooming_in = false;
        }
        if self.scale < Self::MIN_SCALE {
            self.zooming_in = true;
        }
        self.scale *= if self.zooming_in { Self::IN } else { Self::OUT };
        self.scale
    }
}

/// Point circling the origin, used as the Julia constant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Orbit {
    angle: f32,
    radius: f32,
    speed: f32,
}

impl Orbit {
    pub fn new(radius: f32, speed: f32) -> Self {
        Self {
            angle: 0.0,
            radius,
            speed,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Advances one frame and returns the new point.
    pub fn step(&mut self) -> [f32; 2] {
        self.angle = (self.angle + self.speed) % TAU;
        [self.angle.cos() * self.radius, self.angle.sin() * self.radius]
    }
}

fn params_mut(shader: &mut Shader) -> Result<&mut Resource> {
    shader
        .resource_mut(PARAMS_BINDING)
        .context("fractal shader has no params uniform")
}

pub fn set_scale(shader: &mut Shader, scale: f32) -> Result<()> {
    params_mut(shader)?.write_f32(SCALE, &[scale])
}

pub fn set_offset(shader: &mut Shader, offset: [f32; 2]) -> Result<()> {
    params_mut(shader)?.write_f32(0, &offset)
}

pub fn set_c0(shader: &mut Shader, c0: [f32; 2]) -> Result<()> {
    params_mut(shader)?.write_f32(C0, &c0)
}

pub fn scale(shader: &Shader) -> Option<f32> {
    shader.resource(PARAMS_BINDING)?.read_f32(SCALE)
}

fn params(data: Vec<f32>) -> Resource {
    Resource::uniform(
        BindingDesc::new(PARAMS_BINDING, wgpu::ShaderStages::FRAGMENT).with_label("fractal params"),
        data,
    )
}

pub fn mandelbrot_shader(offset: [f32; 2], scale: f32) -> Shader {
    Shader::new(MANDELBROT_SOURCE)
        .with_label("mandelbrot")
        .with_resources([params(vec![offset[0], offset[1], scale, MAX_ITERATIONS])])
}

pub fn julia_shader(scale: f32, c0: [f32; 2]) -> Shader {
    Shader::new(JULIA_SOURCE)
        .with_label("julia")
        .with_resources([params(vec![0.0, 0.0, scale, MAX_ITERATIONS, c0[0], c0[1]])])
}

/// Zooms the Mandelbrot set in and out.
pub struct Mandelbrot {
    zoom: Zoom,
}

impl FrameHooks for Mandelbrot {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let scale = self.zoom.step();
        set_scale(ctx.shader_mut()?, scale)
    }
}

pub fn mandelbrot(_: &SetupCtx<'_>) -> Result<(Geometry, Mandelbrot)> {
    let zoom = Zoom::new(0.1);
    let geometry = unit_quad_indexed(mandelbrot_shader([-1.5, 0.0], zoom.scale()))?;
    Ok((geometry, Mandelbrot { zoom }))
}

/// Sweeps the Julia constant around a circle.
pub struct Julia {
    orbit: Orbit,
}

impl FrameHooks for Julia {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let c0 = self.orbit.step();
        set_c0(ctx.shader_mut()?, c0)
    }
}

pub fn julia(_: &SetupCtx<'_>) -> Result<(Geometry, Julia)> {
    let geometry = unit_quad(julia_shader(0.5, [0.0, 0.0]))?;
    Ok((
        geometry,
        Julia {
            orbit: Orbit::new(0.7885, 0.01),
        },
    ))
}
