use std::ops::{Index, IndexMut};
use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::{error::Result, math::Size, vec::Vec4};

/// Color attachment 0 plus a depth attachment, both `width * height` row-major.
#[derive(Clone, Debug)]
pub struct RenderTarget {
    size: Size<usize>,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl RenderTarget {
    pub const DEPTH_CLEAR: f32 = 1.0;

    pub fn new(width: usize, height: usize) -> Self {
        RenderTarget {
            size: Size::new(width, height),
            color: vec![Vec4::zero(); width * height],
            depth: vec![Self::DEPTH_CLEAR; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    pub fn size(&self) -> Size<usize> {
        self.size
    }

    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(Self::DEPTH_CLEAR);
    }

    pub fn color(&self) -> &[Vec4] {
        &self.color
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth[self.linear_index(x, y)]
    }

    /// Both attachments at once, for writers that need to test depth and write color.
    pub fn attachments_mut(&mut self) -> (&mut [Vec4], &mut [f32]) {
        (&mut self.color, &mut self.depth)
    }

    fn linear_index(&self, x: usize, y: usize) -> usize {
        if x >= self.size.width || y >= self.size.height {
            panic!("out of bounds");
        }
        y * self.size.width + x
    }

    /// Encodes the linear color attachment as 8-bit sRGB, the way a `*Srgb` surface format would.
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.size.width as u32, self.size.height as u32, |x, y| {
            let c = self[(x as usize, y as usize)].to_array();
            Rgba([
                linear_to_srgb8(c[0]),
                linear_to_srgb8(c[1]),
                linear_to_srgb8(c[2]),
                (c[3].clamp(0., 1.) * 255.).round() as u8,
            ])
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_rgba8()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

impl Index<(usize, usize)> for RenderTarget {
    type Output = Vec4;

    fn index(&self, (x, y): (usize, usize)) -> &Vec4 {
        &self.color[self.linear_index(x, y)]
    }
}

impl IndexMut<(usize, usize)> for RenderTarget {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Vec4 {
        let idx = self.linear_index(x, y);
        &mut self.color[idx]
    }
}

pub fn linear_to_srgb8(chan: f32) -> u8 {
    let chan = chan.clamp(0., 1.);
    let encoded = if chan <= 0.003_130_8 {
        chan * 12.92
    } else {
        1.055 * chan.powf(1. / 2.4) - 0.055
    };
    (encoded * 255.).round() as u8
}

pub fn srgb8_to_linear(chan: u8) -> f32 {
    let chan = chan as f32 / 255.;
    if chan <= 0.040_45 {
        chan / 12.92
    } else {
        ((chan + 0.055) / 1.055).powf(2.4)
    }
}
