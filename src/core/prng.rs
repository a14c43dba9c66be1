// Minimal PRNG for arena layouts and baseline policies.
//
// This is NOT cryptographically secure.
// It only has to make episode layouts reproducible from a seed.

use glam::Vec3;

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        // Convert to [0,1).
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    #[inline]
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    #[inline]
    pub fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u32;
        let v = self.next_u32() % span;
        low + v as usize
    }

    /// Uniform point on the ground plane (y = 0) inside a disc around the origin.
    pub fn gen_point_in_disc(&mut self, radius: f32) -> Vec3 {
        let radius = radius.max(0.0);
        // sqrt keeps the density uniform over the area rather than the radius.
        let r = radius * self.next_f32_01().sqrt();
        let theta = self.gen_range_f32(0.0, std::f32::consts::TAU);
        Vec3::new(r * theta.cos(), 0.0, r * theta.sin())
    }
}
