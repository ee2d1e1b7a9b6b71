use std::sync::mpsc;

use anyhow::{Context, Result};

use super::GpuCtx;

/// Copies `buffer` into a mappable staging buffer and returns its bytes.
///
/// Blocks until the device has finished all submitted work. `buffer` must have
/// been created with `COPY_SRC` usage. Intended for verification and tooling,
/// not for per-frame use.
pub fn read_buffer(ctx: &GpuCtx<'_>, buffer: &wgpu::Buffer) -> Result<Vec<u8>> {
    let size = buffer.size();
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("shaderloop readback staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("shaderloop readback encoder"),
        });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // Receiver outlives the poll below; a send failure cannot happen.
        let _ = tx.send(result);
    });

    ctx.device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("failed to wait for device")?;

    rx.recv()
        .context("readback map callback was dropped")?
        .context("failed to map readback buffer")?;

    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(bytes)
}

/// Like [`read_buffer`], decoding the bytes as a slice of `T`.
pub fn read_buffer_as<T: bytemuck::Pod>(ctx: &GpuCtx<'_>, buffer: &wgpu::Buffer) -> Result<Vec<T>> {
    let bytes = read_buffer(ctx, buffer)?;
    Ok(bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect())
}
