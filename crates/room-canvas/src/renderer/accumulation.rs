//! Multi-frame sampling: sub-pixel jitter, soft-shadow light samples and
//! the SSAO spiral kernel, plus the frame counter driving them.

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SPIRAL_SAMPLES_PER_FRAME: u32 = 32;
/// Radius of the disc light samples are scattered on.
const LIGHT_SAMPLE_RADIUS: f32 = 25.0;
const LIGHT_SAMPLE_SEED: u64 = 0x5eed;

/// Sub-pixel offsets in `[-0.5, 0.5]` pixels; the first one is centered.
pub fn anti_aliasing_kernel(count: u32) -> Vec<Vec2> {
    // R2 low-discrepancy sequence.
    let g = 1.324_717_957_244_746_f64;
    let a = (1.0 / g, 1.0 / (g * g));
    (0..count.max(1))
        .map(|i| {
            if i == 0 {
                return Vec2::ZERO;
            }
            let i = i as f64;
            Vec2::new(
                ((0.5 + a.0 * i).fract() - 0.5) as f32,
                ((0.5 + a.1 * i).fract() - 0.5) as f32,
            )
        })
        .collect()
}

/// Converts a pixel offset into a clip-space translation.
pub fn ndc_offset(offset: Vec2, frame_size: Vec2) -> Vec2 {
    2.0 * offset / frame_size.max(Vec2::ONE)
}

/// Light positions scattered on a disc around `eye`, facing `center`.
/// `eye` comes first and the rest are sorted by distance to it.
pub fn light_samples<R: Rng>(eye: Vec3, center: Vec3, count: u32, rng: &mut R) -> Vec<Vec3> {
    let n = (eye - center).normalize_or_zero();
    let u = n.cross(Vec3::new(0.0, 0.03, 0.0));
    let v = n.cross(u);

    let mut samples = Vec::with_capacity(count as usize + 1);
    samples.push(eye);
    for _ in 0..count {
        let r = rng.gen::<f32>() * LIGHT_SAMPLE_RADIUS;
        let theta = rng.gen::<f32>() * std::f32::consts::TAU;
        samples.push(eye + u * (r * theta.cos()) + v * (r * theta.sin()));
    }
    samples.sort_by(|a, b| {
        a.distance_squared(eye)
            .total_cmp(&b.distance_squared(eye))
    });
    samples
}

/// `(angle, alpha)` pairs, `samples_per_frame` wide and `frames` high.
pub fn ssao_spiral_kernel(samples_per_frame: u32, spiral_turns: f32, frames: u32) -> Vec<[f32; 2]> {
    let total = (samples_per_frame * frames) as f32;
    let mut texels = vec![[0.0; 2]; (samples_per_frame * frames) as usize];
    for y in 0..frames {
        for x in 0..samples_per_frame {
            let id = (x * frames + y) as f32;
            let alpha = (id + 0.5) / total;
            let angle = alpha * spiral_turns * std::f32::consts::TAU;
            texels[(x + y * samples_per_frame) as usize] = [angle, alpha];
        }
    }
    texels
}

/// 4x4 random rotation texels for SSAO.
pub fn ssao_noise(rng: &mut StdRng) -> Vec<u8> {
    (0..16)
        .flat_map(|_| {
            let v: u8 = rng.gen();
            [v, v, v, 255]
        })
        .collect()
}

/// Progressive refinement state: the jitter and light sequences and the
/// index of the next sub-frame.
#[derive(Debug)]
pub struct MultiFrame {
    count: u32,
    frame: u32,
    kernel: Vec<Vec2>,
    lights: Vec<Vec3>,
    rng: StdRng,
}

impl MultiFrame {
    pub fn new(count: u32, light_eye: Vec3, light_center: Vec3) -> Self {
        let mut rng = StdRng::seed_from_u64(LIGHT_SAMPLE_SEED);
        let count = count.max(1);
        Self {
            count,
            frame: 0,
            kernel: anti_aliasing_kernel(count),
            lights: light_samples(light_eye, light_center, count, &mut rng),
            rng,
        }
    }

    /// Rebuilds both sequences and restarts accumulation.
    pub fn regenerate(&mut self, count: u32, light_eye: Vec3, light_center: Vec3) {
        self.count = count.max(1);
        self.kernel = anti_aliasing_kernel(self.count);
        self.lights = light_samples(light_eye, light_center, self.count, &mut self.rng);
        self.restart();
    }

    pub fn restart(&mut self) {
        self.frame = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Index of the sub-frame about to be rendered.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_complete(&self) -> bool {
        self.frame >= self.count
    }

    pub fn jitter(&self) -> Vec2 {
        self.kernel
            .get(self.frame as usize)
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    pub fn light_eye(&self) -> Option<Vec3> {
        self.lights.get(self.frame as usize).copied()
    }

    /// Blend weight of the current sub-frame into the running average.
    pub fn blend_weight(&self) -> f32 {
        1.0 / (self.frame as f32 + 1.0)
    }

    pub fn advance(&mut self) {
        if self.frame < self.count {
            self.frame += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_starts_centered_and_stays_in_pixel() {
        let k = anti_aliasing_kernel(64);
        assert_eq!(k.len(), 64);
        assert_eq!(k[0], Vec2::ZERO);
        assert!(k.iter().all(|o| o.x.abs() <= 0.5 && o.y.abs() <= 0.5));
        assert_ne!(k[1], k[2]);
    }

    #[test]
    fn ndc_offset_scales_by_frame() {
        let o = ndc_offset(Vec2::new(0.5, -0.25), Vec2::new(100.0, 50.0));
        assert_eq!(o, Vec2::new(0.01, -0.01));
    }

    #[test]
    fn light_samples_start_at_eye_and_are_sorted() {
        let eye = Vec3::new(-15.0, 23.0, 28.0);
        let mut rng = StdRng::seed_from_u64(1);
        let s = light_samples(eye, Vec3::new(7.8, 0.0, 3.9), 16, &mut rng);
        assert_eq!(s.len(), 17);
        assert_eq!(s[0], eye);
        for w in s.windows(2) {
            assert!(w[0].distance_squared(eye) <= w[1].distance_squared(eye));
        }
        // 0.03 scales the disc basis, so samples stay within 25 * 0.03 of the eye.
        assert!(s.iter().all(|p| p.distance(eye) <= 25.0 * 0.03 + 1e-3));
    }

    #[test]
    fn spiral_kernel_interleaves_frames() {
        let frames = 4;
        let k = ssao_spiral_kernel(2, 1.0, frames);
        assert_eq!(k.len(), 8);
        // Texel (x = 1, y = 0) holds sample id 1 * frames + 0.
        let [angle, alpha] = k[1];
        assert!((alpha - 4.5 / 8.0).abs() < 1e-6);
        assert!((angle - alpha * std::f32::consts::TAU).abs() < 1e-5);
        // Texel (x = 0, y = 1) holds sample id 1.
        assert!((k[2][1] - 1.5 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn multi_frame_cycles_and_restarts() {
        let mut mf = MultiFrame::new(4, Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO);
        assert_eq!(mf.frame(), 0);
        assert_eq!(mf.jitter(), Vec2::ZERO);
        assert_eq!(mf.light_eye(), Some(Vec3::new(0.0, 10.0, 10.0)));
        for _ in 0..10 {
            mf.advance();
        }
        assert!(mf.is_complete());
        assert_eq!(mf.frame(), 4);
        mf.restart();
        assert_eq!(mf.frame(), 0);
        assert_eq!(mf.blend_weight(), 1.0);
    }

    #[test]
    fn changing_count_regenerates_sequences() {
        let mut mf = MultiFrame::new(4, Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO);
        mf.advance();
        mf.regenerate(8, Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO);
        assert_eq!(mf.count(), 8);
        assert_eq!(mf.frame(), 0);
        for _ in 0..7 {
            mf.advance();
        }
        assert!(!mf.is_complete());
        assert!(mf.light_eye().is_some());
    }
}
