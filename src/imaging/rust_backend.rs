//! Pure Rust codec backend. Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (AVIF) | `avif-parse` container metadata, no pixel decode |
//! | Identify (others) | `image::image_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image` crate decoders |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1) + BT.601 YUV→RGB |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6, lossy at the run quality) |
//! | Encode → WebP | `WebPEncoder::new_lossless` (the `image` crate has no lossy WebP) |
//! | Encode → JPEG | `JpegEncoder::new_with_quality`, alpha dropped |
//! | Encode → PNG | `PngEncoder` |
//! | Encode → GIF, TIFF | `DynamicImage::save_with_format` |
//!
//! The output codec is chosen from the format *name* of the request,
//! case-insensitively, not from the output file extension.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// AVIF encoder speed (1 slowest .. 10 fastest).
const AVIF_SPEED: u8 = 6;

/// Backend built on the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

fn failed(what: &str, path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("{} {}: {}", what, path.display(), e))
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    if is_avif(path) {
        return avif::decode(path);
    }
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| failed("Failed to decode", path, e))
}

fn create_writer(path: &Path) -> Result<BufWriter<File>, BackendError> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Encode `img` as `format` into `path`.
fn save_image(img: &DynamicImage, path: &Path, format: &str, quality: u32) -> Result<(), BackendError> {
    let quality = quality.clamp(1, 100) as u8;
    let encode_err = |e: image::ImageError| failed("Failed to encode", path, e);

    match format.to_ascii_lowercase().as_str() {
        "avif" => {
            let encoder = AvifEncoder::new_with_speed_quality(create_writer(path)?, AVIF_SPEED, quality);
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        "webp" => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder = WebPEncoder::new_lossless(create_writer(path)?);
            rgba.write_with_encoder(encoder).map_err(encode_err)
        }
        "jpg" | "jpeg" => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(create_writer(path)?, quality);
            rgb.write_with_encoder(encoder).map_err(encode_err)
        }
        "png" => {
            let encoder = PngEncoder::new(create_writer(path)?);
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        "gif" => DynamicImage::ImageRgba8(img.to_rgba8())
            .save_with_format(path, ImageFormat::Gif)
            .map_err(encode_err),
        "tif" | "tiff" => DynamicImage::ImageRgba8(img.to_rgba8())
            .save_with_format(path, ImageFormat::Tiff)
            .map_err(encode_err),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if is_avif(path) {
            return avif::identify(path);
        }
        let (width, height) =
            image::image_dimensions(path).map_err(|e| failed("Failed to read dimensions of", path, e))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, &params.format, params.quality.value())
    }
}

/// AVIF sources: container parsing with `avif-parse`, AV1 decoding with `rav1d`.
mod avif {
    use super::{BackendError, Dimensions, DynamicImage, failed};
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib as dav1d;
    use std::path::Path;
    use std::ptr::NonNull;

    fn read(path: &Path) -> Result<avif_parse::AvifData, BackendError> {
        let bytes = std::fs::read(path)?;
        avif_parse::read_avif(&mut std::io::Cursor::new(&bytes))
            .map_err(|e| failed("Failed to parse AVIF", path, format!("{e:?}")))
    }

    /// Dimensions from the container's primary item metadata.
    pub(super) fn identify(path: &Path) -> Result<Dimensions, BackendError> {
        let data = read(path)?;
        let meta = data
            .primary_item_metadata()
            .map_err(|e| failed("Failed to read AVIF metadata of", path, format!("{e:?}")))?;
        Ok(Dimensions {
            width: meta.max_frame_width.get(),
            height: meta.max_frame_height.get(),
        })
    }

    /// Decode the primary item into an RGB8 image.
    pub(super) fn decode(path: &Path) -> Result<DynamicImage, BackendError> {
        let data = read(path)?;
        let av1: &[u8] = &data.primary_item;

        let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
        let settings_ptr = NonNull::new(settings.as_mut_ptr())
            .ok_or_else(|| BackendError::ProcessingFailed("rav1d settings unavailable".into()))?;
        unsafe { dav1d::dav1d_default_settings(settings_ptr) };
        let mut settings = unsafe { settings.assume_init() };
        settings.n_threads = 1;
        settings.max_frame_delay = 1;

        let mut ctx = None;
        let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
        if rc.0 != 0 {
            return Err(BackendError::ProcessingFailed(format!("rav1d open failed ({})", rc.0)));
        }

        // The context is closed on every path once this returns.
        let decoded = (|| {
            let mut input = Dav1dData::default();
            let buf = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut input), av1.len()) };
            if buf.is_null() {
                return Err(BackendError::ProcessingFailed("rav1d data_create failed".into()));
            }
            unsafe { std::ptr::copy_nonoverlapping(av1.as_ptr(), buf, av1.len()) };

            let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut input)) };
            if rc.0 != 0 {
                unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut input)) };
                return Err(BackendError::ProcessingFailed(format!(
                    "rav1d send_data failed ({})",
                    rc.0
                )));
            }

            let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
            let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
            if rc.0 != 0 {
                return Err(BackendError::ProcessingFailed(format!(
                    "rav1d get_picture failed ({})",
                    rc.0
                )));
            }

            let rgb = picture_to_rgb(&pic);
            unsafe { dav1d::dav1d_picture_unref(NonNull::new(&mut pic)) };
            rgb
        })();

        unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };
        decoded
    }

    fn picture_to_rgb(pic: &Dav1dPicture) -> Result<DynamicImage, BackendError> {
        let width = pic.p.w as u32;
        let height = pic.p.h as u32;
        let plane = |i: usize| {
            pic.data[i]
                .map(|p| p.as_ptr() as *const u8)
                .ok_or_else(|| BackendError::ProcessingFailed(format!("AVIF plane {i} missing")))
        };

        let luma = plane(0)?;
        let planes = match pic.p.layout {
            DAV1D_PIXEL_LAYOUT_I400 => Planes {
                luma,
                chroma: None,
                luma_stride: pic.stride[0],
                chroma_stride: 0,
                subsample: (false, false),
            },
            layout => {
                let subsample = match layout {
                    DAV1D_PIXEL_LAYOUT_I420 => (true, true),
                    DAV1D_PIXEL_LAYOUT_I422 => (true, false),
                    DAV1D_PIXEL_LAYOUT_I444 => (false, false),
                    other => {
                        return Err(BackendError::ProcessingFailed(format!(
                            "Unsupported AVIF pixel layout: {other}"
                        )));
                    }
                };
                Planes {
                    luma,
                    chroma: Some((plane(1)?, plane(2)?)),
                    luma_stride: pic.stride[0],
                    chroma_stride: pic.stride[1],
                    subsample,
                }
            }
        };

        let rgb = planes.to_rgb8(width, height, pic.p.bpc as u32);
        image::RgbImage::from_raw(width, height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| BackendError::ProcessingFailed("decoded AVIF buffer has the wrong size".into()))
    }

    struct Planes {
        luma: *const u8,
        chroma: Option<(*const u8, *const u8)>,
        luma_stride: isize,
        chroma_stride: isize,
        subsample: (bool, bool),
    }

    impl Planes {
        /// BT.601 YCbCr to interleaved RGB8.
        fn to_rgb8(&self, width: u32, height: u32, bpc: u32) -> Vec<u8> {
            let scale = 255.0 / ((1u32 << bpc) - 1) as f32;
            let center = (1u32 << (bpc - 1)) as f32;
            let mut out = Vec::with_capacity((width * height * 3) as usize);

            for y in 0..height {
                for x in 0..width {
                    let luma = sample(self.luma, self.luma_stride, x, y, bpc);
                    let rgb = match self.chroma {
                        None => [luma; 3],
                        Some((cb_plane, cr_plane)) => {
                            let cx = if self.subsample.0 { x / 2 } else { x };
                            let cy = if self.subsample.1 { y / 2 } else { y };
                            let cb = sample(cb_plane, self.chroma_stride, cx, cy, bpc) - center;
                            let cr = sample(cr_plane, self.chroma_stride, cx, cy, bpc) - center;
                            [
                                luma + 1.402 * cr,
                                luma - 0.344136 * cb - 0.714136 * cr,
                                luma + 1.772 * cb,
                            ]
                        }
                    };
                    out.extend(rgb.map(|c| (c * scale).clamp(0.0, 255.0) as u8));
                }
            }
            out
        }
    }

    /// One sample of a plane; depths above 8 bits are stored as `u16`.
    fn sample(plane: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
        let row = y as isize * stride;
        if bpc <= 8 {
            (unsafe { *plane.offset(row + x as isize) }) as f32
        } else {
            (unsafe { *(plane.offset(row + x as isize * 2) as *const u16) }) as f32
        }
    }
}
