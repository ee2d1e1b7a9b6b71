//! Game of Life computed per pixel in a fragment shader.
//!
//! The state lives in a texture the size of the drawable. Each frame renders
//! the next generation from it, then copies the rendered frame back into it.

use anyhow::{Context, Result};
use rand::Rng;

use shaderloop_engine::device::SurfaceOptions;
use shaderloop_engine::geometry::{Geometry, unit_quad};
use shaderloop_engine::resource::{BindingDesc, Resource, TextureOptions};
use shaderloop_engine::run::{FrameCtx, FrameHooks};
use shaderloop_engine::shader::Shader;
use shaderloop_engine::window::SetupCtx;

const SOURCE: &str = include_str!("shaders/conway_fragment.wgsl");

const STATE_BINDING: u32 = 1;

/// Swapchain textures are copied from, so the surface needs `COPY_SRC`.
pub fn surface_options() -> SurfaceOptions {
    SurfaceOptions::default().with_usage(wgpu::TextureUsages::COPY_SRC)
}

/// RGBA texels, each fully alive (255) or dead (0) with opaque alpha.
pub fn random_texels(rng: &mut impl Rng, width: u32, height: u32) -> Vec<u8> {
    let mut texels = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        let v = if rng.random_bool(0.5) { 255 } else { 0 };
        texels.extend_from_slice(&[v, v, v, 255]);
    }
    texels
}

pub fn shader(format: wgpu::TextureFormat, (width, height): (u32, u32), texels: Vec<u8>) -> Shader {
    use wgpu::ShaderStages as S;
    let state = TextureOptions::new_2d(width, height, format, texels)
        .with_sample_type(wgpu::TextureSampleType::Float { filterable: false });

    Shader::new(SOURCE).with_label("conway fragment").with_resources([
        Resource::uniform(
            BindingDesc::new(0, S::VERTEX | S::FRAGMENT).with_label("size"),
            vec![width as f32, height as f32],
        ),
        Resource::texture(
            BindingDesc::new(STATE_BINDING, S::FRAGMENT).with_label("state"),
            state,
        ),
        Resource::sampler(
            BindingDesc::new(2, S::FRAGMENT).with_label("state sampler"),
            wgpu::SamplerBindingType::NonFiltering,
        ),
    ])
}

/// Feeds each rendered frame back as the next state.
pub struct ConwayFragment;

impl FrameHooks for ConwayFragment {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let state = ctx
            .geometry
            .shader()
            .and_then(|s| s.resource(STATE_BINDING))
            .and_then(Resource::device_texture)
            .context("state texture is not allocated")?;

        let copy = wgpu::Extent3d {
            width: state.width().min(ctx.drawable.width()),
            height: state.height().min(ctx.drawable.height()),
            depth_or_array_layers: 1,
        };
        ctx.encoder.copy_texture_to_texture(
            ctx.drawable.as_image_copy(),
            state.as_image_copy(),
            copy,
        );
        Ok(())
    }
}

pub fn setup(setup: &SetupCtx<'_>) -> Result<(Geometry, ConwayFragment)> {
    let (width, height) = setup.size;
    let texels = random_texels(&mut rand::rng(), width, height);
    let geometry = unit_quad(shader(setup.format, setup.size, texels))?;
    Ok((geometry, ConwayFragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_gpu;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shaderloop_engine::device::OffscreenTarget;
    use shaderloop_engine::resource::LifecycleState;
    use shaderloop_engine::run::{LoopOptions, RenderLoop};
    use std::time::{Duration, Instant};

    #[test]
    fn texels_are_opaque_and_binary() {
        let texels = random_texels(&mut StdRng::seed_from_u64(3), 8, 4);
        assert_eq!(texels.len(), 8 * 4 * 4);
        for px in texels.chunks_exact(4) {
            assert!(px[0] == 0 || px[0] == 255);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[0], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn surface_can_be_copied_from() {
        let usage = surface_options().usage;
        assert!(usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC));
    }

    #[test]
    fn frames_copy_back_into_the_state_texture() {
        let Some(gpu) = test_gpu::headless() else { return };
        let format = OffscreenTarget::DEFAULT_FORMAT;
        let target = OffscreenTarget::new(&gpu, 8, 8, format);
        let texels = random_texels(&mut StdRng::seed_from_u64(11), 8, 8);
        let geometry = unit_quad(shader(format, (8, 8), texels)).unwrap();
        let mut run = RenderLoop::new(gpu, target, geometry, ConwayFragment, LoopOptions::default()).unwrap();

        let t0 = Instant::now();
        run.start(t0).unwrap();
        for i in 0..2 {
            run.tick(t0 + Duration::from_millis(i)).unwrap();
        }

        let state = run.geometry().shader().unwrap().resource(STATE_BINDING).unwrap();
        assert_eq!(state.state(), LifecycleState::Allocated);
        // The copy goes device to device; the host texels are uploaded once.
        assert_eq!(state.stats().allocations, 1);
        assert_eq!(state.stats().uploads, 0);
        run.stop().unwrap();
    }
}
