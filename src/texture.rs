//! Image decoding and CPU-rendered sphere sprites.
//!
//! Each body gets a small orthographic sphere sprite rendered on the CPU
//! from its equirectangular texture. When the asset is missing or fails to
//! decode, the same shading is applied to the body's flat display color.

use eframe::egui::{self, Color32};
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

pub struct BodyTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl BodyTexture {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        use std::io::Cursor;
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| format!("Failed to guess format: {}", e))?;
        let img = reader
            .decode()
            .map_err(|e| format!("Failed to decode image: {}", e))?
            .to_rgb8();
        let width = img.width();
        let height = img.height();
        let pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        Ok(Self { width, height, pixels })
    }

    pub fn sample(&self, u: f64, v: f64) -> [u8; 3] {
        let x = ((u * self.width as f64) as u32).min(self.width - 1);
        let y = ((v * self.height as f64) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn render_sphere(&self, size: usize, rot: &Matrix3<f64>) -> egui::ColorImage {
        render_sphere_with(size, rot, |u, v| self.sample(u, v))
    }
}

/// Shaded sphere sprite from a flat color, used when the texture asset is
/// unavailable.
pub fn fallback_sphere(color: Color32, size: usize) -> egui::ColorImage {
    let rgb = [color.r(), color.g(), color.b()];
    render_sphere_with(size, &Matrix3::identity(), |_, _| rgb)
}

fn render_sphere_with(
    size: usize,
    rot: &Matrix3<f64>,
    sample: impl Fn(f64, f64) -> [u8; 3],
) -> egui::ColorImage {
    let mut pixels = vec![Color32::TRANSPARENT; size * size];
    let center = size as f64 / 2.0;
    let radius = center;
    let inv_rot = rot.transpose();

    for py in 0..size {
        for px in 0..size {
            let dx = px as f64 - center;
            let dy = py as f64 - center;
            let dist_sq = dx * dx + dy * dy;

            if dist_sq < radius * radius {
                let z = (radius * radius - dist_sq).sqrt();
                let x = dx / radius;
                let y = -dy / radius;
                let z = z / radius;

                let v = inv_rot * Vector3::new(x, y, z);

                let lat = v.y.asin();
                let lon = (-v.z).atan2(v.x);

                let u = (lon + PI) / (2.0 * PI);
                let vt = (PI / 2.0 - lat) / PI;

                let [r, g, b] = sample(u, vt);

                let shade = (0.35 + 0.65 * z.max(0.0)) as f32;
                let r = (r as f32 * shade) as u8;
                let g = (g as f32 * shade) as u8;
                let b = (b as f32 * shade) as u8;

                pixels[py * size + px] = Color32::from_rgb(r, g, b);
            }
        }
    }

    egui::ColorImage {
        size: [size, size],
        pixels,
        source_size: egui::Vec2::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_sphere_fills_disc_and_leaves_corners_transparent() {
        let size = 32;
        let img = fallback_sphere(Color32::from_rgb(200, 100, 0), size);
        assert_eq!(img.size, [size, size]);
        assert_eq!(img.pixels[0], Color32::TRANSPARENT);
        assert_eq!(img.pixels[size - 1], Color32::TRANSPARENT);
        let center = img.pixels[(size / 2) * size + size / 2];
        assert!(center.r() > 150, "center should be brightly shaded");
        assert_eq!(center.a(), 255);
    }

    #[test]
    fn fallback_sphere_shades_toward_the_rim() {
        let size = 64;
        let img = fallback_sphere(Color32::WHITE, size);
        let center = img.pixels[(size / 2) * size + size / 2];
        let near_rim = img.pixels[(size / 2) * size + 2];
        assert!(center.r() > near_rim.r());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(BodyTexture::from_bytes(b"definitely not an image").is_err());
    }
}
