//! Analytic coverage back-end.
//!
//! For each edge and each pixel row it crosses, exact area/cover
//! contributions are accumulated per pixel cell; a left-to-right sweep
//! then converts the accumulators into alpha:
//!
//! ```text
//! cover[x] = Σ dy · wind          signed vertical extent per cell
//! area[x]  = Σ (fx₀+fx₁)·dy·wind  twice the signed trapezoidal area
//! α        = clamp(|cover_accum·2·256 − area|, 0, 131072) · 255 / 131072
//! ```

use crate::image::{Image, PixelFormat};

use super::{Edge, SweepScratch, FULL_COVERAGE, ONE_PIXEL, PIXEL_BITS, PIXEL_MASK};

pub(super) fn render(edges: &[Edge], image: &mut Image, scratch: &mut SweepScratch) {
    let ext = image.extents();
    let w = ext.width as usize;
    let h = ext.height as usize;
    let stride = ext.stride as usize;
    let format = image.format();

    let SweepScratch { area, cover, alpha, buckets, active } = scratch;

    area.clear();
    area.resize(w, 0);
    cover.clear();
    cover.resize(w, 0);
    if format == PixelFormat::Bgra32 {
        alpha.clear();
        alpha.resize(w, 0);
    }

    // Bucket edges by the first pixel row they enter. Only the outer
    // vector grows; inner vectors keep their capacity across renders.
    if buckets.len() < h {
        buckets.resize_with(h, Vec::new);
    }
    for bucket in buckets.iter_mut().take(h) {
        bucket.clear();
    }
    for (i, e) in edges.iter().enumerate() {
        let row = ((e.yl >> PIXEL_BITS) - ext.y_origin).max(0);
        if (row as usize) < h {
            buckets[row as usize].push(i as u32);
        }
    }

    active.clear();

    for row in 0..h {
        let y_top = (ext.y_origin + row as i32) << PIXEL_BITS;

        active.extend_from_slice(&buckets[row]);

        // Walk active edges, dropping expired ones unordered.
        let mut x_min = w;
        let mut x_max = 0usize;
        let mut j = 0;
        while j < active.len() {
            let e = &edges[active[j] as usize];
            if e.yh <= y_top {
                active.swap_remove(j);
                continue;
            }
            edge_sweep_row(area, cover, w, ext.x_origin, y_top, e, &mut x_min, &mut x_max);
            j += 1;
        }

        if x_min > x_max {
            continue;
        }

        let cover_accum = prefix_sum_cover(cover, x_min, x_max);

        // If cover doesn't cancel at the right edge of the touched
        // range, the rest of the row is constant alpha.
        let tail = if cover_accum != 0 {
            Some(coverage_to_byte(cover_accum * (2 * ONE_PIXEL)))
        } else {
            None
        };

        match format {
            PixelFormat::A8 => {
                let row_buf = &mut image.buffer_mut()[row * stride..row * stride + w];
                if let Some(byte) = tail {
                    row_buf[x_max + 1..].fill(byte);
                }
                sweep_row_to_alpha(row_buf, area, cover, x_min, x_max);
            }
            PixelFormat::Bgra32 => {
                alpha.fill(0);
                if let Some(byte) = tail {
                    alpha[x_max + 1..].fill(byte);
                }
                sweep_row_to_alpha(alpha, area, cover, x_min, x_max);

                // Coverage expands to premultiplied white.
                let row_buf = &mut image.buffer_mut()[row * stride..row * stride + 4 * w];
                for (x, &a) in alpha.iter().enumerate() {
                    row_buf[4 * x..4 * x + 4].copy_from_slice(&[a, a, a, a]);
                }
            }
        }
    }
}

/// Adds one edge piece's area/cover into a single cell.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
fn cell_add(
    area: &mut [i32],
    cover: &mut [i32],
    width: usize,
    col: i32,
    fx0: i32,
    fy0: i32,
    fx1: i32,
    fy1: i32,
    wind: i32,
    x_min: &mut usize,
    x_max: &mut usize,
) {
    if col < 0 || col as usize >= width {
        return;
    }
    let col = col as usize;
    let dy = fy1 - fy0;
    area[col] += (fx0 + fx1) * dy * wind;
    cover[col] += dy * wind;
    *x_min = (*x_min).min(col);
    *x_max = (*x_max).max(col);
}

/// Walks one edge through the pixel cells of a single pixel row,
/// accumulating area/cover. `y_top` is the row's top in 24.8.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
fn edge_sweep_row(
    area: &mut [i32],
    cover: &mut [i32],
    width: usize,
    x_org: i32,
    y_top: i32,
    edge: &Edge,
    x_min: &mut usize,
    x_max: &mut usize,
) {
    let y_bot = y_top + ONE_PIXEL;

    let ey0 = edge.yl.max(y_top);
    let ey1 = edge.yh.min(y_bot);
    if ey0 >= ey1 {
        return;
    }

    // X at the clipped endpoints.
    let x0 = edge.xl + ((((ey0 - edge.yl) as i64) * edge.slope) >> 16) as i32;
    let x1 = edge.xl + ((((ey1 - edge.yl) as i64) * edge.slope) >> 16) as i32;

    // Fractional y within this pixel row, in [0, ONE_PIXEL].
    let fy0 = ey0 - y_top;
    let fy1 = ey1 - y_top;

    let cx0 = x0 >> PIXEL_BITS;
    let fx0 = x0 & PIXEL_MASK;
    let cx1 = x1 >> PIXEL_BITS;
    let fx1 = x1 & PIXEL_MASK;
    let wind = edge.wind;

    // Fast path: both endpoints in the same pixel column.
    if cx0 == cx1 {
        cell_add(area, cover, width, cx0 - x_org, fx0, fy0, fx1, fy1, wind, x_min, x_max);
        return;
    }

    let total_dx = x1 - x0;
    let total_dy = fy1 - fy0;

    // fy increment per pixel column (x advances by exactly ONE_PIXEL).
    let delta_fy = ((ONE_PIXEL as i64 * total_dy as i64) / total_dx as i64) as i32;

    if total_dx > 0 {
        // Left-to-right edge.
        let x_b = (cx0 + 1) << PIXEL_BITS;
        let mut fy_b = fy0 + (((x_b - x0) as i64 * total_dy as i64) / total_dx as i64) as i32;
        cell_add(area, cover, width, cx0 - x_org, fx0, fy0, ONE_PIXEL, fy_b, wind, x_min, x_max);

        let mut fy_prev = fy_b;
        let mut cx = cx0 + 1;
        while cx < cx1 {
            fy_b = fy_prev + delta_fy;
            cell_add(area, cover, width, cx - x_org, 0, fy_prev, ONE_PIXEL, fy_b, wind, x_min, x_max);
            fy_prev = fy_b;
            cx += 1;
        }

        cell_add(area, cover, width, cx1 - x_org, 0, fy_prev, fx1, fy1, wind, x_min, x_max);
    } else {
        // Right-to-left edge.
        let x_b = cx0 << PIXEL_BITS;
        let mut fy_b = fy0 + (((x_b - x0) as i64 * total_dy as i64) / total_dx as i64) as i32;
        cell_add(area, cover, width, cx0 - x_org, fx0, fy0, 0, fy_b, wind, x_min, x_max);

        let mut fy_prev = fy_b;
        let mut cx = cx0 - 1;
        while cx > cx1 {
            fy_b = fy_prev - delta_fy;
            cell_add(area, cover, width, cx - x_org, ONE_PIXEL, fy_prev, 0, fy_b, wind, x_min, x_max);
            fy_prev = fy_b;
            cx -= 1;
        }

        cell_add(area, cover, width, cx1 - x_org, ONE_PIXEL, fy_prev, fx1, fy1, wind, x_min, x_max);
    }
}

/// Prefix-sums cover in place. Returns the final accumulator.
fn prefix_sum_cover(cover: &mut [i32], x_min: usize, x_max: usize) -> i32 {
    let mut accum = 0;
    for c in &mut cover[x_min..=x_max] {
        accum += *c;
        *c = accum;
    }
    accum
}

#[inline]
fn coverage_to_byte(value: i32) -> u8 {
    let alpha = value.abs().min(FULL_COVERAGE);
    ((alpha as u32 * 255 + FULL_COVERAGE as u32 / 2) >> (2 * PIXEL_BITS as u32 + 1)) as u8
}

/// Converts prefix-summed cover + area to alpha bytes and clears the
/// scratch for the next row.
fn sweep_row_to_alpha(row: &mut [u8], area: &mut [i32], cover: &mut [i32], x_min: usize, x_max: usize) {
    let mut x = x_min;

    #[cfg(target_arch = "x86_64")]
    {
        x = sweep_row_to_alpha_sse2(row, area, cover, x, x_max);
    }

    while x <= x_max {
        let val = cover[x] * (2 * ONE_PIXEL) - area[x];
        row[x] = coverage_to_byte(val);
        area[x] = 0;
        cover[x] = 0;
        x += 1;
    }
}

/// SSE2 lane for 8-pixel blocks; identical semantics to the scalar
/// loop. Returns the first unprocessed column.
#[cfg(target_arch = "x86_64")]
fn sweep_row_to_alpha_sse2(
    row: &mut [u8],
    area: &mut [i32],
    cover: &mut [i32],
    mut x: usize,
    x_max: usize,
) -> usize {
    use core::arch::x86_64::*;

    // SAFETY: all loads/stores stay within `x..x + 8`, and the loop
    // guard keeps `x + 7 <= x_max < row.len() <= area.len()`. SSE2 is
    // part of the x86-64 baseline.
    unsafe {
        let clamp_v = _mm_set1_epi32(FULL_COVERAGE);
        let bias_v = _mm_set1_epi32(FULL_COVERAGE / 2);
        let zero = _mm_setzero_si128();

        while x + 7 <= x_max {
            let c0 = _mm_loadu_si128(cover.as_ptr().add(x) as *const __m128i);
            let c1 = _mm_loadu_si128(cover.as_ptr().add(x + 4) as *const __m128i);
            let a0 = _mm_loadu_si128(area.as_ptr().add(x) as *const __m128i);
            let a1 = _mm_loadu_si128(area.as_ptr().add(x + 4) as *const __m128i);

            // v = |cover·512 − area|
            let mut v0 = _mm_sub_epi32(_mm_slli_epi32(c0, PIXEL_BITS + 1), a0);
            let mut v1 = _mm_sub_epi32(_mm_slli_epi32(c1, PIXEL_BITS + 1), a1);
            let s0 = _mm_srai_epi32(v0, 31);
            let s1 = _mm_srai_epi32(v1, 31);
            v0 = _mm_sub_epi32(_mm_xor_si128(v0, s0), s0);
            v1 = _mm_sub_epi32(_mm_xor_si128(v1, s1), s1);

            // Clamp to FULL_COVERAGE.
            let lt0 = _mm_cmplt_epi32(v0, clamp_v);
            let lt1 = _mm_cmplt_epi32(v1, clamp_v);
            v0 = _mm_or_si128(_mm_and_si128(lt0, v0), _mm_andnot_si128(lt0, clamp_v));
            v1 = _mm_or_si128(_mm_and_si128(lt1, v1), _mm_andnot_si128(lt1, clamp_v));

            // (v·255 + bias) >> 17, with v·255 = (v << 8) − v.
            let r0 = _mm_srai_epi32(
                _mm_add_epi32(_mm_sub_epi32(_mm_slli_epi32(v0, 8), v0), bias_v),
                2 * PIXEL_BITS + 1,
            );
            let r1 = _mm_srai_epi32(
                _mm_add_epi32(_mm_sub_epi32(_mm_slli_epi32(v1, 8), v1), bias_v),
                2 * PIXEL_BITS + 1,
            );

            let halves = _mm_packs_epi32(r0, r1);
            let bytes = _mm_packus_epi16(halves, halves);
            _mm_storel_epi64(row.as_mut_ptr().add(x) as *mut __m128i, bytes);

            _mm_storeu_si128(area.as_mut_ptr().add(x) as *mut __m128i, zero);
            _mm_storeu_si128(area.as_mut_ptr().add(x + 4) as *mut __m128i, zero);
            _mm_storeu_si128(cover.as_mut_ptr().add(x) as *mut __m128i, zero);
            _mm_storeu_si128(cover.as_mut_ptr().add(x + 4) as *mut __m128i, zero);

            x += 8;
        }
    }

    x
}
