//! CPU images and GPU textures.

use std::rc::Rc;

use bitflags::bitflags;
use image::imageops::{self, FilterType};

use super::backend::{Owned, PixelFormat, TextureId};

bitflags! {
    /// Sampling options for `RenderContext::create_texture`.
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct TextureFlags: u32 {
        const LINEAR = 0x1;
        const NEAREST = 0x2;
        const MIPMAP = 0x4;
        const REPEAT = 0x8;
        const CLAMP = 0x10;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FilterMode {
    Linear,
    Nearest,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WrapMode {
    Repeat,
    Clamp,
}

/// Sampler settings resolved from [`TextureFlags`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureSampling {
    pub filter: FilterMode,
    pub mipmap: bool,
    pub wrap: WrapMode,
}

impl TextureSampling {
    /// Filter: LINEAR, then NEAREST, then MIPMAP, else linear.
    /// Wrap: REPEAT, then CLAMP, else repeat.
    pub fn from_flags(flags: TextureFlags) -> Self {
        let (filter, mipmap) = if flags.contains(TextureFlags::LINEAR) {
            (FilterMode::Linear, false)
        } else if flags.contains(TextureFlags::NEAREST) {
            (FilterMode::Nearest, false)
        } else if flags.contains(TextureFlags::MIPMAP) {
            (FilterMode::Linear, true)
        } else {
            (FilterMode::Linear, false)
        };
        let wrap = if flags.contains(TextureFlags::REPEAT) {
            WrapMode::Repeat
        } else if flags.contains(TextureFlags::CLAMP) {
            WrapMode::Clamp
        } else {
            WrapMode::Repeat
        };
        Self { filter, mipmap, wrap }
    }
}

/// Channel layout of the source image.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    Alpha,
    Rgb,
    Rgba,
}

impl TextureFormat {
    pub fn from_comps(comps: u32) -> Option<Self> {
        match comps {
            1 => Some(TextureFormat::Alpha),
            3 => Some(TextureFormat::Rgb),
            4 => Some(TextureFormat::Rgba),
            _ => None,
        }
    }

    pub fn pixel_format(self) -> PixelFormat {
        match self {
            TextureFormat::Alpha => PixelFormat::Alpha8,
            TextureFormat::Rgb | TextureFormat::Rgba => PixelFormat::Rgba8,
        }
    }
}

/// 8-bit image with 1 to 4 interleaved channels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub comps: u32,
    pub data: Vec<u8>,
}

impl Image {
    /// Zeroed image.
    pub fn new(width: u32, height: u32, comps: u32) -> Self {
        Self {
            width,
            height,
            comps,
            data: vec![0; width as usize * height as usize * comps as usize],
        }
    }

    /// Byte count implied by the dimensions and channel count.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.comps as usize
    }

    /// Whether `data` holds exactly `width * height * comps` bytes.
    pub fn has_valid_data(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// Decodes PNG, JPEG, BMP or TGA bytes.
    ///
    /// Gray images keep one channel, RGB keeps three, everything else is
    /// converted to RGBA.
    pub fn from_memory(bytes: &[u8]) -> Option<Image> {
        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                log::error!("failed to decode image: {e}");
                return None;
            }
        };
        let (width, height) = (decoded.width(), decoded.height());
        let (comps, data) = match decoded {
            image::DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            image::DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            other => (4, other.into_rgba8().into_raw()),
        };
        Some(Image {
            width,
            height,
            comps,
            data,
        })
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| ((y * self.width + x) * self.comps) as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        let o = self.offset(x, y)?;
        self.data.get(o..o + self.comps as usize)
    }

    /// Writes `value`, truncated to the image's channel count.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: &[u8]) {
        let Some(o) = self.offset(x, y) else { return };
        let n = (self.comps as usize).min(value.len());
        self.data[o..o + n].copy_from_slice(&value[..n]);
    }

    /// Row-major data in the texture's GPU format (RGB expanded to RGBA).
    fn gpu_bytes(&self) -> Vec<u8> {
        match self.comps {
            3 => self
                .data
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            _ => self.data.clone(),
        }
    }
}

/// One level of texture data in the GPU pixel format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Level 0 from `image`, followed by a box-filtered chain down to 1x1 when
/// `mipmap` is set.
pub(crate) fn build_levels(image: &Image, format: TextureFormat, mipmap: bool) -> Vec<MipLevel> {
    let mut levels = vec![MipLevel {
        width: image.width,
        height: image.height,
        data: image.gpu_bytes(),
    }];
    if !mipmap {
        return levels;
    }

    while let Some(last) = levels.last() {
        if last.width <= 1 && last.height <= 1 {
            break;
        }
        let (w, h) = ((last.width / 2).max(1), (last.height / 2).max(1));
        let data = match format.pixel_format() {
            PixelFormat::Alpha8 => {
                image::GrayImage::from_raw(last.width, last.height, last.data.clone())
                    .map(|img| imageops::resize(&img, w, h, FilterType::Triangle).into_raw())
            }
            PixelFormat::Rgba8 => {
                image::RgbaImage::from_raw(last.width, last.height, last.data.clone())
                    .map(|img| imageops::resize(&img, w, h, FilterType::Triangle).into_raw())
            }
        };
        let Some(data) = data else {
            log::warn!(
                "mip chain stopped at {}x{}: level data size mismatch",
                last.width,
                last.height
            );
            break;
        };
        levels.push(MipLevel {
            width: w,
            height: h,
            data,
        });
    }
    levels
}

#[derive(Debug)]
struct TextureInner {
    handle: Owned<TextureId>,
    width: u32,
    height: u32,
    format: TextureFormat,
    sampling: TextureSampling,
}

/// GPU texture. Cheap to clone; released when the last clone drops.
#[derive(Debug, Clone)]
pub struct Texture(Rc<TextureInner>);

impl Texture {
    pub(crate) fn new(
        handle: Owned<TextureId>,
        width: u32,
        height: u32,
        format: TextureFormat,
        sampling: TextureSampling,
    ) -> Self {
        Self(Rc::new(TextureInner {
            handle,
            width,
            height,
            format,
            sampling,
        }))
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.0.handle.id()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.0.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.0.height
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.0.format
    }

    #[inline]
    pub fn sampling(&self) -> TextureSampling {
        self.0.sampling
    }

    #[inline]
    pub fn is_alpha_only(&self) -> bool {
        self.0.format == TextureFormat::Alpha
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_precedence() {
        let s = TextureSampling::from_flags(TextureFlags::NEAREST | TextureFlags::MIPMAP);
        assert_eq!((s.filter, s.mipmap), (FilterMode::Nearest, false));

        let s = TextureSampling::from_flags(TextureFlags::MIPMAP | TextureFlags::CLAMP);
        assert_eq!((s.filter, s.mipmap, s.wrap), (FilterMode::Linear, true, WrapMode::Clamp));

        let s = TextureSampling::from_flags(TextureFlags::empty());
        assert_eq!((s.filter, s.wrap), (FilterMode::Linear, WrapMode::Repeat));
    }

    #[test]
    fn rgb_is_expanded_for_upload() {
        let mut img = Image::new(2, 1, 3);
        img.set_pixel(1, 0, &[10, 20, 30]);
        let levels = build_levels(&img, TextureFormat::Rgb, false);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].data, [0, 0, 0, 255, 10, 20, 30, 255]);
    }

    #[test]
    fn mip_chain_reaches_one_pixel() {
        let img = Image::new(8, 2, 1);
        let levels = build_levels(&img, TextureFormat::Alpha, true);
        let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, [(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert_eq!(levels[1].data.len(), 4);
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut img = Image::new(2, 2, 4);
        img.set_pixel(5, 5, &[1, 2, 3, 4]);
        img.set_pixel(1, 1, &[1, 2, 3, 4, 5]);
        assert_eq!(img.pixel(1, 1), Some(&[1u8, 2, 3, 4][..]));
        assert!(img.pixel(2, 0).is_none());
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(Image::from_memory(b"not an image").is_none());
    }

    #[test]
    fn decodes_png() {
        let mut png = Vec::new();
        let buf = image::RgbImage::from_raw(1, 1, vec![1, 2, 3]).unwrap();
        buf.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let img = Image::from_memory(&png).unwrap();
        assert_eq!((img.width, img.height, img.comps), (1, 1, 3));
        assert_eq!(img.data, [1, 2, 3]);
    }
}
