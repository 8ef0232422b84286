/// Textures come in two variants behind one `sample` call: a solid
/// color, or a decoded 2D image. Image sampling wraps (tiles) in both
/// axes; when both dimensions are powers of two the wrap is a bit mask,
/// otherwise a Euclidean modulo handles negative coordinates.
use super::framebuffer::Rgba;
use crate::error::LoadError;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum Texture {
    Solid(Rgba),
    Image(ImageTexture),
}

#[derive(Debug, Clone)]
pub struct ImageTexture {
    width: i32,
    height: i32,
    width_f: f32,
    height_f: f32,
    scale: f32,
    /// Both dimensions are powers of two, enabling the masked fast path.
    pot: bool,
    pixels: Vec<Rgba>,
}

impl Texture {
    pub fn solid(color: Rgba) -> Self {
        Texture::Solid(color)
    }

    /// Build an image texture from decoded pixels. Any positive
    /// dimensions are accepted; non-power-of-two images just take the
    /// modulo sampling path.
    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|p| Rgba::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Texture::Image(ImageTexture {
            width: width as i32,
            height: height as i32,
            width_f: width as f32,
            height_f: height as f32,
            scale: 1.0,
            pot: width.is_power_of_two() && height.is_power_of_two(),
            pixels,
        })
    }

    /// Decode an image file into a texture.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let img = image::open(path)
            .map_err(|err| LoadError::TextureLoad(path.to_path_buf(), err))?;
        Ok(Self::from_image(&img))
    }

    /// UV multiplier applied at sample time. A scale of 2 tiles the
    /// image twice per UV unit.
    pub fn set_scale(&mut self, scale: f32) {
        if let Texture::Image(img) = self {
            img.scale = scale;
        }
    }

    /// Resolve a color at (u, v). The v axis is flipped to match the
    /// OBJ convention of a bottom-left UV origin. Coordinates outside
    /// [0, 1) wrap.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> Rgba {
        match self {
            Texture::Solid(color) => *color,
            Texture::Image(img) => {
                let x = (u * img.scale * img.width_f) as i32;
                let y = ((1.0 - v) * img.scale * img.height_f) as i32;

                let (xi, yi) = if img.pot {
                    (x & (img.width - 1), y & (img.height - 1))
                } else {
                    (x.rem_euclid(img.width), y.rem_euclid(img.height))
                };

                img.pixels[(yi * img.width + xi) as usize]
            }
        }
    }
}
