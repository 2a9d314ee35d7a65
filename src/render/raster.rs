//! Pixel-level helpers shared by the CPU surface: vello_cpu conversions, gradient rasterization
//! and CSS-like filter kernels on premultiplied RGBA8 buffers.

use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::foundation::error::{DotfxError, DotfxResult};
use crate::render::style::{FilterOp, Gradient, GradientKind};

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> DotfxResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| DotfxError::surface("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| DotfxError::surface("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(DotfxError::surface("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

pub(crate) fn image_paint(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> DotfxResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Gradient parameter `t` of surface-space point `p` for a gradient stretched over `bounds`.
pub(crate) fn gradient_t(kind: GradientKind, bounds: Rect, p: Point) -> f64 {
    let c = bounds.center();
    let (hw, hh) = (bounds.width() / 2.0, bounds.height() / 2.0);
    match kind {
        GradientKind::Linear { angle_deg } => {
            let (sin, cos) = angle_deg.to_radians().sin_cos();
            let half = (hw * cos).abs() + (hh * sin).abs();
            if half <= f64::EPSILON {
                return 0.0;
            }
            0.5 + ((p.x - c.x) * cos + (p.y - c.y) * sin) / (2.0 * half)
        }
        GradientKind::Radial => {
            let r = hw.hypot(hh);
            if r <= f64::EPSILON {
                return 0.0;
            }
            (p - c).hypot() / r
        }
    }
}

/// Rasterize `gradient` over a `width` x `height` surface (premultiplied RGBA8), positioned on
/// `bounds`. Outside the bounds the end colors extend.
pub(crate) fn rasterize_gradient(
    gradient: &Gradient,
    bounds: Rect,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let mut bytes = vec![0u8; (width as usize) * (height as usize) * 4];
    for y in 0..height {
        for x in 0..width {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let t = gradient_t(gradient.kind, bounds, p);
            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            bytes[idx..idx + 4].copy_from_slice(&gradient.sample(t).to_rgba8_premul());
        }
    }
    bytes
}

/// Apply a filter chain in place on a premultiplied RGBA8 buffer. `url()` references have no
/// local resource and are skipped.
pub(crate) fn apply_filters(
    bytes: &mut Vec<u8>,
    width: u32,
    height: u32,
    ops: &[FilterOp],
) -> DotfxResult<()> {
    for op in ops {
        match op {
            FilterOp::Blur(px) => {
                let sigma = px.max(0.0) as f32;
                if sigma <= 0.0 {
                    continue;
                }
                let radius = (sigma * 3.0).ceil() as u32;
                let kernel = gaussian_kernel_q16(radius, sigma)?;
                let mut out = vec![0u8; bytes.len()];
                let mut tmp = vec![0u8; bytes.len()];
                blur_rgba8_premul_q16(bytes, &mut out, &mut tmp, width, height, &kernel);
                *bytes = out;
            }
            FilterOp::Url(r) => {
                tracing::trace!(reference = %r, "url() filter has no local resource, skipped");
            }
            other => {
                if let Some(m) = color_matrix_for(other) {
                    let src = bytes.clone();
                    color_matrix_rgba8_premul(&src, bytes, m);
                }
            }
        }
    }
    Ok(())
}

/// 4x5 row-major color matrix (straight color) of a non-spatial filter function.
pub(crate) fn color_matrix_for(op: &FilterOp) -> Option<[f32; 20]> {
    let m = match *op {
        FilterOp::Brightness(v) => {
            let v = v.max(0.0) as f32;
            [
                v, 0.0, 0.0, 0.0, 0.0, //
                0.0, v, 0.0, 0.0, 0.0, //
                0.0, 0.0, v, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ]
        }
        FilterOp::Contrast(v) => {
            let v = v.max(0.0) as f32;
            let o = 0.5 - 0.5 * v;
            [
                v, 0.0, 0.0, 0.0, o, //
                0.0, v, 0.0, 0.0, o, //
                0.0, 0.0, v, 0.0, o, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ]
        }
        FilterOp::Grayscale(v) => {
            let k = 1.0 - v.clamp(0.0, 1.0) as f32;
            [
                0.2126 + 0.7874 * k,
                0.7152 - 0.7152 * k,
                0.0722 - 0.0722 * k,
                0.0,
                0.0,
                0.2126 - 0.2126 * k,
                0.7152 + 0.2848 * k,
                0.0722 - 0.0722 * k,
                0.0,
                0.0,
                0.2126 - 0.2126 * k,
                0.7152 - 0.7152 * k,
                0.0722 + 0.9278 * k,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOp::Sepia(v) => {
            let k = 1.0 - v.clamp(0.0, 1.0) as f32;
            [
                0.393 + 0.607 * k,
                0.769 - 0.769 * k,
                0.189 - 0.189 * k,
                0.0,
                0.0,
                0.349 - 0.349 * k,
                0.686 + 0.314 * k,
                0.168 - 0.168 * k,
                0.0,
                0.0,
                0.272 - 0.272 * k,
                0.534 - 0.534 * k,
                0.131 + 0.869 * k,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOp::Saturate(v) => {
            let s = v.max(0.0) as f32;
            [
                0.213 + 0.787 * s,
                0.715 - 0.715 * s,
                0.072 - 0.072 * s,
                0.0,
                0.0,
                0.213 - 0.213 * s,
                0.715 + 0.285 * s,
                0.072 - 0.072 * s,
                0.0,
                0.0,
                0.213 - 0.213 * s,
                0.715 - 0.715 * s,
                0.072 + 0.928 * s,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOp::HueRotate(deg) => {
            let (sin, cos) = deg.to_radians().sin_cos();
            let (s, c) = (sin as f32, cos as f32);
            [
                0.213 + c * 0.787 - s * 0.213,
                0.715 - c * 0.715 - s * 0.715,
                0.072 - c * 0.072 + s * 0.928,
                0.0,
                0.0,
                0.213 - c * 0.213 + s * 0.143,
                0.715 + c * 0.285 + s * 0.140,
                0.072 - c * 0.072 - s * 0.283,
                0.0,
                0.0,
                0.213 - c * 0.213 - s * 0.787,
                0.715 - c * 0.715 + s * 0.715,
                0.072 + c * 0.928 + s * 0.072,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        FilterOp::Invert(v) => {
            let a = v.clamp(0.0, 1.0) as f32;
            let d = 1.0 - 2.0 * a;
            [
                d, 0.0, 0.0, 0.0, a, //
                0.0, d, 0.0, 0.0, a, //
                0.0, 0.0, d, 0.0, a, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ]
        }
        FilterOp::Opacity(v) => {
            let a = v.clamp(0.0, 1.0) as f32;
            [
                1.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, a, 0.0,
            ]
        }
        FilterOp::Blur(_) | FilterOp::Url(_) => return None,
    };
    Some(m)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> DotfxResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(DotfxError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(DotfxError::surface("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Keep the kernel normalized after rounding.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    tmp: &mut [u8],
    width: u32,
    height: u32,
    kernel_q16: &[u32],
) {
    if kernel_q16.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    blur_pass_q16(src, tmp, width, height, kernel_q16, true);
    blur_pass_q16(tmp, dst, width, height, kernel_q16, false);
}

fn blur_pass_q16(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    k: &[u32],
    horizontal: bool,
) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = if horizontal {
                    ((x + d).clamp(0, w - 1), y)
                } else {
                    (x, (y + d).clamp(0, h - 1))
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: [f32; 20]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pa = f32::from(s[3]) / 255.0;
        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = f32::from(s[0]) / 255.0 * inv_a;
        let g = f32::from(s[1]) / 255.0 * inv_a;
        let b = f32::from(s[2]) / 255.0 * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        d[0] = to_u8(out_r * out_a);
        d[1] = to_u8(out_g * out_a);
        d[2] = to_u8(out_b * out_a);
        d[3] = to_u8(out_a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
