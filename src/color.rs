//! Skin-tone color correction.
//!
//! Before compositing, the warped patch is nudged toward the source's chroma
//! by per-channel mean matching over the masked region, at half strength.
//! This is deliberately not a histogram match: it keeps the target's texture
//! and only aligns the overall tone.

use crate::image::Image;
use crate::mask::Mask;

/// Mask values above this count as "inside" for the mean computation.
const MASK_THRESHOLD: u8 = 127;

/// Multiplies `warped` toward the per-channel means of `src` over the masked
/// region. Alpha is preserved. A no-op when the masked region is empty.
pub fn match_masked_means(warped: &mut Image, src: &Image, mask: &Mask) {
    let mask_data = mask.data();
    let src_data = src.data();
    let warped_data = warped.data();

    let mut src_sum = [0u64; 3];
    let mut warped_sum = [0u64; 3];
    let mut count = 0u64;
    for (i, &m) in mask_data.iter().enumerate() {
        if m > MASK_THRESHOLD {
            let o = 4 * i;
            for ch in 0..3 {
                src_sum[ch] += src_data[o + ch] as u64;
                warped_sum[ch] += warped_data[o + ch] as u64;
            }
            count += 1;
        }
    }
    if count == 0 {
        return;
    }

    let mut factors = [1.0f32; 3];
    for ch in 0..3 {
        let src_mean = src_sum[ch] as f32 / count as f32;
        let warped_mean = warped_sum[ch] as f32 / count as f32;
        factors[ch] = 1.0 + 0.5 * (src_mean - warped_mean) / warped_mean.max(1.0);
    }
    log::trace!("color correction factors {:?}", factors);

    let data = warped.data_mut();
    for px in data.chunks_exact_mut(4) {
        for ch in 0..3 {
            px[ch] = (px[ch] as f32 * factors[ch]).round().clamp(0.0, 255.0) as u8;
        }
    }
}
