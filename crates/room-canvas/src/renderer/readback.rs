//! Synchronous texel reads from the off-screen targets.

use super::targets::Targets;
use crate::picking::{
    decode_id, padded_bytes_per_row, scale_to_texture, unpad_rows, unproject, DepthSnapshot,
    IdTarget, Readback, DEPTH_CLEAR,
};
use glam::{Mat4, Vec2, Vec3};

/// Copies a `width` x `height` region at `origin` into a staging buffer and
/// blocks until it is mapped. Rows come back padded.
fn read_region(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    origin: [u32; 2],
    size: [u32; 2],
    bytes_per_texel: u32,
) -> Option<Vec<u8>> {
    let bytes_per_row = padded_bytes_per_row(size[0], bytes_per_texel);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging"),
        size: (bytes_per_row * size[1]) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: origin[0],
                y: origin[1],
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size[1]),
            },
        },
        wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            log::warn!("readback mapping failed: {e}");
            return None;
        }
        Err(_) => return None,
    }

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Some(data)
}

/// Reads the whole pre-depth target for the label obstruction test.
pub fn depth_snapshot(device: &wgpu::Device, queue: &wgpu::Queue, targets: &Targets) -> Option<DepthSnapshot> {
    let data = read_region(
        device,
        queue,
        &targets.pre_depth_tex,
        [0, 0],
        [targets.width, targets.height],
        4,
    )?;
    Some(DepthSnapshot::from_padded(&data, targets.width, targets.height))
}

fn decode_depth(texel: &[u8]) -> Option<f32> {
    let bytes: [u8; 4] = texel.get(..4)?.try_into().ok()?;
    let depth = f32::from_le_bytes(bytes);
    (depth < DEPTH_CLEAR).then_some(depth)
}

/// [`Readback`] over the live targets of one rendered frame.
pub struct GpuReadback<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub targets: &'a Targets,
    /// Window size the pointer positions refer to.
    pub window: Vec2,
    pub view_projection_inverse: Mat4,
    /// Unset until a frame has been rendered into the targets.
    pub ready: bool,
}

impl GpuReadback<'_> {
    fn texel(&self, position: Vec2) -> Option<[u32; 2]> {
        if !self.ready {
            return None;
        }
        let p = scale_to_texture(position, self.window, self.targets.size());
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let (x, y) = (p.x as u32, p.y as u32);
        (x < self.targets.width && y < self.targets.height).then_some([x, y])
    }
}

impl Readback for GpuReadback<'_> {
    fn read_id(&mut self, target: IdTarget, position: Vec2) -> Option<Option<u32>> {
        let texel = self.texel(position)?;
        let texture = self.targets.id_texture(target);
        let data = read_region(self.device, self.queue, texture, texel, [1, 1], 4)?;
        let rgba: [u8; 4] = unpad_rows(&data, 1, 1, 4).try_into().ok()?;
        Some(decode_id(rgba))
    }

    fn read_coords(&mut self, position: Vec2) -> Option<Vec3> {
        let texel = self.texel(position)?;
        let data = read_region(self.device, self.queue, &self.targets.pre_depth_tex, texel, [1, 1], 4)?;
        let depth = decode_depth(&data)?;
        Some(unproject(
            texel[0] as f32 + 0.5,
            texel[1] as f32 + 0.5,
            depth,
            self.targets.size(),
            &self.view_projection_inverse,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_depth_has_no_coordinate() {
        assert_eq!(decode_depth(&DEPTH_CLEAR.to_le_bytes()), None);
        assert_eq!(decode_depth(&0.25f32.to_le_bytes()), Some(0.25));
        assert_eq!(decode_depth(&[0, 0]), None);
    }
}
