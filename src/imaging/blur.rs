//! In-place stack blur over RGBA pixel buffers.
//!
//! Approximates a Gaussian blur with two sliding-window passes (horizontal,
//! then vertical). Each pass keeps a triangular-weighted window of `2r + 1`
//! pixels in a fixed ring buffer and updates per-channel running sums as the
//! window advances, so the cost per pixel is constant regardless of radius.
//!
//! Averaging avoids division: the weighted sum is multiplied by a per-radius
//! constant and shifted right, giving the average rounded to nearest. Both
//! constants come from tables built at compile time.
//!
//! Reads past the image border clamp to the nearest edge pixel. All four
//! channels are blurred, alpha included.
//!
//! # Example
//!
//! ```
//! use tab_thumbnails::imaging::stack_blur;
//!
//! let mut pixels = vec![0u8; 4 * 4 * 4];
//! pixels[0..4].copy_from_slice(&[255, 255, 255, 255]);
//! stack_blur(&mut pixels, 4, 4, 2).unwrap();
//! assert!(pixels[0] < 255);
//! ```

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Smallest accepted radius. Zero is coerced to this.
pub const MIN_RADIUS: u32 = 1;

/// Largest accepted radius. Larger values are clamped to this.
pub const MAX_RADIUS: u32 = 254;

/// Bits covering every rounded window sum: `255 * 255^2 + 255^2 / 2 < 2^24`.
const NUMERATOR_BITS: u32 = 24;

const TABLE_LEN: usize = MAX_RADIUS as usize + 1;

/// Multiply constants indexed by radius.
const MUL_TABLE: [u32; TABLE_LEN] = build_tables().0;

/// Shift constants indexed by radius.
const SHG_TABLE: [u32; TABLE_LEN] = build_tables().1;

/// For each radius `r` the window weights sum to `div = (r + 1)^2`. With
/// `shg = 24 + ceil(log2(div))` and `mul = ceil(2^shg / div)`,
/// `(n * mul) >> shg` equals `n / div` exactly for every `n < 2^24`.
const fn build_tables() -> ([u32; TABLE_LEN], [u32; TABLE_LEN]) {
    let mut mul = [0u32; TABLE_LEN];
    let mut shg = [0u32; TABLE_LEN];
    let mut r = 0;
    while r < TABLE_LEN {
        let div = ((r + 1) * (r + 1)) as u64;
        let log2 = u64::BITS - (div - 1).leading_zeros();
        let s = NUMERATOR_BITS + log2;
        mul[r] = (1u64 << s).div_ceil(div) as u32;
        shg[r] = s;
        r += 1;
    }
    (mul, shg)
}

// ============================================================================
// Public API
// ============================================================================

/// Clamps a requested radius into `[MIN_RADIUS, MAX_RADIUS]`.
#[inline]
#[must_use]
pub const fn clamp_radius(radius: u32) -> u32 {
    if radius < MIN_RADIUS {
        MIN_RADIUS
    } else if radius > MAX_RADIUS {
        MAX_RADIUS
    } else {
        radius
    }
}

/// Blurs an RGBA buffer in place.
///
/// `radius` is clamped into `[1, 254]`. Empty and single-pixel images are
/// left untouched.
///
/// # Errors
///
/// Returns [`Error::InvalidPixelBuffer`] if `pixels.len()` is not
/// `width * height * 4`.
pub fn stack_blur(pixels: &mut [u8], width: u32, height: u32, radius: u32) -> Result<()> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(Error::invalid_pixel_buffer(width, height, pixels.len()));
    }

    if width as u64 * height as u64 <= 1 {
        return Ok(());
    }

    let radius = clamp_radius(radius) as usize;
    let width = width as usize;
    let height = height as usize;
    let mut window = BlurWindow::new(radius);

    for y in 0..height {
        window.run(pixels, y * width, 1, width);
    }

    for x in 0..width {
        window.run(pixels, x, width, height);
    }

    Ok(())
}

// ============================================================================
// BlurWindow
// ============================================================================

type Rgba = [u64; 4];

/// Ring buffer and running sums for one blur pass over a line of pixels.
///
/// Entries `0..=r` of the window hold pixels that are leaving (weights
/// rising toward the centre), entries `r+1..2r+1` hold pixels that are
/// entering. `in_sum` and `out_sum` track those two halves; `sum` is the
/// triangular-weighted total.
struct BlurWindow {
    radius: usize,
    half: u64,
    mul: u64,
    shg: u32,
    stack: Vec<Rgba>,
}

impl BlurWindow {
    fn new(radius: usize) -> Self {
        let div = ((radius + 1) * (radius + 1)) as u64;
        Self {
            radius,
            half: div / 2,
            mul: MUL_TABLE[radius] as u64,
            shg: SHG_TABLE[radius],
            stack: vec![[0; 4]; 2 * radius + 1],
        }
    }

    /// Blurs `len` pixels starting at pixel index `start`, advancing `step`
    /// pixels each time. Rows use `step = 1`, columns use `step = width`.
    fn run(&mut self, pixels: &mut [u8], start: usize, step: usize, len: usize) {
        let radius = self.radius;
        let size = self.stack.len();
        let last = len - 1;
        let offset = |i: usize| (start + i * step) * 4;

        let mut sum: Rgba = [0; 4];
        let mut in_sum: Rgba = [0; 4];
        let mut out_sum: Rgba = [0; 4];

        let first = read(pixels, offset(0));
        let weight = (radius as u64 + 1) * (radius as u64 + 2) / 2;
        for c in 0..4 {
            out_sum[c] = first[c] * (radius as u64 + 1);
            sum[c] = first[c] * weight;
        }
        for slot in self.stack.iter_mut().take(radius + 1) {
            *slot = first;
        }

        for i in 1..=radius {
            let pixel = read(pixels, offset(i.min(last)));
            self.stack[radius + i] = pixel;
            let weight = (radius + 1 - i) as u64;
            for c in 0..4 {
                sum[c] += pixel[c] * weight;
                in_sum[c] += pixel[c];
            }
        }

        let mut stack_in = 0;
        let mut stack_out = radius + 1;

        for i in 0..len {
            let at = offset(i);
            for c in 0..4 {
                pixels[at + c] = (((sum[c] + self.half) * self.mul) >> self.shg) as u8;
            }

            let leaving = self.stack[stack_in];
            let entering = read(pixels, offset((i + radius + 1).min(last)));
            for c in 0..4 {
                sum[c] -= out_sum[c];
                out_sum[c] -= leaving[c];
                in_sum[c] += entering[c];
                sum[c] += in_sum[c];
            }
            self.stack[stack_in] = entering;
            stack_in = (stack_in + 1) % size;

            let centre = self.stack[stack_out];
            for c in 0..4 {
                out_sum[c] += centre[c];
                in_sum[c] -= centre[c];
            }
            stack_out = (stack_out + 1) % size;
        }
    }
}

#[inline]
fn read(pixels: &[u8], at: usize) -> Rgba {
    [
        pixels[at] as u64,
        pixels[at + 1] as u64,
        pixels[at + 2] as u64,
        pixels[at + 3] as u64,
    ]
}

// ============================================================================
// Tests
// ============================================================================
