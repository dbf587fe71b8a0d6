//! Shared synthetic-image builders for image-based unit tests.

use image::{GrayImage, Luma, RgbaImage};

use crate::geometry::Circle;

/// Dark disks on a light background (grounds against the basket).
pub(crate) fn draw_disks(
    w: u32,
    h: u32,
    disks: &[(f64, f64, f64)],
    disk_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(w, h, Luma([bg_pix]));
    for &(cx, cy, r) in disks {
        stamp_disk(&mut img, cx, cy, r, disk_pix);
    }
    img
}

/// Binary mask with a single filled disk (255 on 0).
pub(crate) fn draw_filled_disk_mask(w: u32, h: u32, cx: f64, cy: f64, r: f64) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    stamp_disk(&mut mask, cx, cy, r, 255);
    mask
}

/// Synthetic portafilter photo: a light basket disk bounded by the rim
/// circle on a dark table, with dark particle disks inside.
pub(crate) fn draw_portafilter(
    w: u32,
    h: u32,
    rim: Circle,
    particles: &[(f64, f64, f64)],
) -> RgbaImage {
    let mut gray = GrayImage::from_pixel(w, h, Luma([50]));
    stamp_disk(&mut gray, rim.cx, rim.cy, rim.r, 205);
    for &(cx, cy, r) in particles {
        stamp_disk(&mut gray, cx, cy, r, 35);
    }
    let mut img = RgbaImage::new(w, h);
    for (g, p) in gray.iter().zip(img.pixels_mut()) {
        *p = image::Rgba([*g, *g, *g, 255]);
    }
    img
}

fn stamp_disk(img: &mut GrayImage, cx: f64, cy: f64, r: f64, pix: u8) {
    let (w, h) = img.dimensions();
    let x0 = ((cx - r).floor().max(0.0)) as u32;
    let y0 = ((cy - r).floor().max(0.0)) as u32;
    let x1 = (((cx + r).ceil() + 1.0) as u32).min(w);
    let y1 = (((cy + r).ceil() + 1.0) as u32).min(h);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if (dx * dx + dy * dy).sqrt() <= r {
                img.put_pixel(x, y, Luma([pix]));
            }
        }
    }
}
