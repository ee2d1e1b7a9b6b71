//! Game of Life stepped by a compute shader over ping-pong cell buffers and
//! drawn as one instanced quad per cell.
//!
//! [`setup`] steps a large grid every frame; [`setup_paced`] steps a small one
//! on a fixed period so single generations can be followed.

use std::time::Duration;

use anyhow::Result;
use rand::Rng;

use shaderloop_engine::geometry::{Geometry, unit_quad};
use shaderloop_engine::pass::WorkgroupCount;
use shaderloop_engine::resource::{BindingDesc, Resource};
use shaderloop_engine::run::{FrameCtx, FrameHooks, LoopOptions};
use shaderloop_engine::shader::Shader;
use shaderloop_engine::window::SetupCtx;

const SOURCE: &str = include_str!("shaders/conway_compute.wgsl");

pub const GRID_SIZE: u32 = 1024;
pub const WORKGROUP_SIZE: u32 = 8;

pub const PACED_GRID_SIZE: u32 = 64;
pub const PACED_INTERVAL: Duration = Duration::from_millis(200);

const CELLS_IN: u32 = 1;
const CELLS_OUT: u32 = 2;

const NEIGHBORS: [(i64, i64); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// Random initial grid; roughly 40% of the cells start alive.
pub fn random_cells(rng: &mut impl Rng, grid: u32) -> Vec<u32> {
    (0..grid * grid)
        .map(|_| u32::from(rng.random::<f32>() > 0.6))
        .collect()
}

/// One generation on the host, with the same wrapping rules as the kernel.
pub fn step_cells(cells: &[u32], grid: u32) -> Vec<u32> {
    let n = grid as i64;
    let at = |x: i64, y: i64| cells[(y.rem_euclid(n) * n + x.rem_euclid(n)) as usize];

    (0..n * n)
        .map(|i| {
            let (x, y) = (i % n, i / n);
            let neighbors: u32 = NEIGHBORS.iter().map(|(dx, dy)| at(x + dx, y + dy)).sum();
            match neighbors {
                2 => at(x, y),
                3 => 1,
                _ => 0,
            }
        })
        .collect()
}

/// Cell shader with `cells` as the first generation.
///
/// The grid must be a power of two so unsigned wrap-around in the kernel
/// lands on the opposite edge.
pub fn shader(grid: u32, cells: Vec<u32>) -> Result<Shader> {
    anyhow::ensure!(grid.is_power_of_two(), "grid size {grid} is not a power of two");
    anyhow::ensure!(
        cells.len() == (grid * grid) as usize,
        "{} cells do not fill a {grid}x{grid} grid",
        cells.len()
    );

    use wgpu::ShaderStages as S;
    let blank = vec![0u32; cells.len()];
    Shader::new(SOURCE.replace("WORKGROUP_SIZE", &WORKGROUP_SIZE.to_string()))
        .with_label("conway compute")
        .with_resources([
            Resource::uniform(
                BindingDesc::new(0, S::VERTEX | S::FRAGMENT | S::COMPUTE).with_label("grid"),
                vec![grid as f32, grid as f32],
            ),
            Resource::storage(
                BindingDesc::new(CELLS_IN, S::VERTEX | S::COMPUTE).with_label("cells in"),
                cells,
                true,
            ),
            Resource::storage(
                BindingDesc::new(CELLS_OUT, S::COMPUTE).with_label("cells out"),
                blank,
                false,
            ),
        ])
        .with_ping_pong(CELLS_IN, CELLS_OUT)
}

pub fn workgroups(grid: u32) -> WorkgroupCount {
    let n = WorkgroupCount::covering(grid, WORKGROUP_SIZE);
    (n, n).into()
}

/// Steps the simulation once per rendered frame.
pub struct ConwayCompute {
    workgroups: WorkgroupCount,
}

impl ConwayCompute {
    pub fn new(grid: u32) -> Self {
        Self {
            workgroups: workgroups(grid),
        }
    }
}

impl FrameHooks for ConwayCompute {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        ctx.run_compute(self.workgroups)?;
        ctx.swap_buffers()
    }
}

pub fn geometry(grid: u32, cells: Vec<u32>) -> Result<Geometry> {
    Ok(unit_quad(shader(grid, cells)?)?.with_instance_count(grid * grid))
}

fn setup_grid(grid: u32) -> Result<(Geometry, ConwayCompute)> {
    let cells = random_cells(&mut rand::rng(), grid);
    Ok((geometry(grid, cells)?, ConwayCompute::new(grid)))
}

pub fn setup(_: &SetupCtx<'_>) -> Result<(Geometry, ConwayCompute)> {
    setup_grid(GRID_SIZE)
}

/// One generation every [`PACED_INTERVAL`]; run with [`paced_loop_options`].
pub fn setup_paced(_: &SetupCtx<'_>) -> Result<(Geometry, ConwayCompute)> {
    setup_grid(PACED_GRID_SIZE)
}

pub fn paced_loop_options() -> LoopOptions {
    LoopOptions::default().with_delay(PACED_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_gpu;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shaderloop_engine::device::{GpuCtx, OffscreenTarget, read_buffer_as};
    use shaderloop_engine::pass::run_compute_pass;
    use shaderloop_engine::run::{FrameOutcome, RenderLoop};
    use std::time::Instant;

    fn glider(grid: u32) -> Vec<u32> {
        let mut cells = vec![0; (grid * grid) as usize];
        for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            cells[(y * grid + x) as usize] = 1;
        }
        cells
    }

    #[test]
    fn blinker_oscillates() {
        let grid = 5;
        let mut cells = vec![0; 25];
        for x in 1..4 {
            cells[2 * 5 + x] = 1;
        }
        let next = step_cells(&cells, grid);
        let vertical: Vec<usize> = (0..25).filter(|&i| next[i] == 1).collect();
        assert_eq!(vertical, vec![7, 12, 17]);
        assert_eq!(step_cells(&next, grid), cells);
    }

    #[test]
    fn glider_wraps_around_edges() {
        let grid = 8;
        let mut cells = glider(grid);
        // A glider returns to its shape shifted by (1, 1) every four generations.
        for _ in 0..4 * grid {
            cells = step_cells(&cells, grid);
        }
        assert_eq!(cells, glider(grid));
    }

    #[test]
    fn shader_rejects_bad_grids() {
        assert!(shader(12, vec![0; 144]).is_err());
        assert!(shader(16, vec![0; 10]).is_err());

        let shader = shader(16, vec![0; 256]).unwrap();
        assert!(shader.has_ping_pong());
        assert!(!shader.source().contains("WORKGROUP_SIZE"));
    }

    #[test]
    fn workgroups_cover_the_grid() {
        assert_eq!(workgroups(1024), WorkgroupCount::new(128, 128, 1));
        assert_eq!(workgroups(12), WorkgroupCount::new(2, 2, 1));
        assert_eq!(ConwayCompute::new(PACED_GRID_SIZE).workgroups, WorkgroupCount::new(8, 8, 1));
    }

    #[test]
    fn paced_variant_runs_on_a_fixed_period() {
        assert!(PACED_GRID_SIZE.is_power_of_two());
        assert_eq!(paced_loop_options().delay, Some(Duration::from_millis(200)));
    }

    #[test]
    fn paced_loop_steps_one_generation_per_period() {
        let Some(gpu) = test_gpu::headless() else { return };
        let grid = 16;
        let cells = random_cells(&mut StdRng::seed_from_u64(21), grid);
        let target = OffscreenTarget::new(&gpu, 8, 8, OffscreenTarget::DEFAULT_FORMAT);
        let geometry = geometry(grid, cells.clone()).unwrap();
        let mut run = RenderLoop::new(gpu, target, geometry, ConwayCompute::new(grid), paced_loop_options()).unwrap();

        let t0 = Instant::now();
        run.start(t0).unwrap();
        assert_eq!(run.tick(t0).unwrap(), FrameOutcome::Rendered);
        assert_eq!(run.tick(t0 + PACED_INTERVAL / 2).unwrap(), FrameOutcome::NotDue);
        assert_eq!(run.tick(t0 + PACED_INTERVAL).unwrap(), FrameOutcome::Rendered);
        assert_eq!(run.frames_rendered(), 2);

        let ctx = run.gpu().ctx();
        let buffer = run.geometry().shader().unwrap().current_buffer().unwrap();
        let stepped = read_buffer_as::<u32>(&ctx, buffer).unwrap();
        assert_eq!(stepped, step_cells(&step_cells(&cells, grid), grid));
        run.stop().unwrap();
    }

    fn gpu_step(ctx: &GpuCtx<'_>, shader: &mut Shader, grid: u32) -> Vec<u32> {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        run_compute_pass(&mut encoder, ctx, shader, workgroups(grid)).unwrap();
        ctx.queue.submit(Some(encoder.finish()));
        shader.swap_buffers().unwrap();
        read_buffer_as::<u32>(ctx, shader.current_buffer().unwrap()).unwrap()
    }

    #[test]
    fn kernel_matches_host_generation() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let grid = 16;

        let cells = random_cells(&mut StdRng::seed_from_u64(7), grid);
        let mut shader = shader(grid, cells.clone()).unwrap();

        let first = gpu_step(&ctx, &mut shader, grid);
        let expected = step_cells(&cells, grid);
        assert_eq!(first, expected);

        // Second step reads what the first one wrote.
        let second = gpu_step(&ctx, &mut shader, grid);
        assert_eq!(second, step_cells(&expected, grid));
    }
}
