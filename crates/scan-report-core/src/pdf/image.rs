//! Raster images as PDF image XObjects.
//!
//! JPEG files in RGB or grayscale are embedded as-is with `DCTDecode`; every
//! other format is decoded with the `image` crate and stored as Flate
//! compressed samples, with the alpha channel (if any) as a soft mask.

use image::{DynamicImage, GrayImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
enum Samples {
    /// Original JPEG bytes, decoded by the viewer
    Jpeg(Vec<u8>),
    /// Uncompressed 8-bit samples
    Raw(Vec<u8>),
}

/// An image ready to be written into a PDF.
#[derive(Debug, Clone)]
pub struct PdfImage {
    width: u32,
    height: u32,
    color_space: &'static [u8],
    samples: Samples,
    alpha: Option<Vec<u8>>,
}

impl PdfImage {
    /// Decode PNG, JPEG or any other format the `image` crate understands.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes).map_err(|e| Error::Image(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| Error::Image(e.to_string()))?;

        if format == ImageFormat::Jpeg {
            let color_space: Option<&'static [u8]> = match &decoded {
                DynamicImage::ImageLuma8(_) => Some(b"DeviceGray"),
                DynamicImage::ImageRgb8(_) => Some(b"DeviceRGB"),
                _ => None,
            };
            if let Some(color_space) = color_space {
                return Ok(Self {
                    width: decoded.width(),
                    height: decoded.height(),
                    color_space,
                    samples: Samples::Jpeg(bytes.to_vec()),
                    alpha: None,
                });
            }
        }

        Ok(Self::from_dynamic(&decoded))
    }

    /// Convert a decoded image into raw RGB samples plus an optional mask.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let alpha = image.color().has_alpha().then(|| {
            image
                .to_rgba8()
                .pixels()
                .map(|p| p.0[3])
                .collect::<Vec<u8>>()
        });

        Self {
            width: image.width(),
            height: image.height(),
            color_space: b"DeviceRGB",
            samples: Samples::Raw(image.to_rgb8().into_raw()),
            alpha,
        }
    }

    /// Wrap a grayscale raster (used for generated QR codes).
    pub fn from_gray(image: GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            color_space: b"DeviceGray",
            samples: Samples::Raw(image.into_raw()),
            alpha: None,
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Height divided by width, 1.0 for degenerate images.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            1.0
        } else {
            self.height as f32 / self.width as f32
        }
    }

    /// Add the image (and its soft mask) to a document.
    pub fn add_to_document(&self, doc: &mut Document) -> ObjectId {
        let mut dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(self.width))),
            ("Height", Object::Integer(i64::from(self.height))),
            ("ColorSpace", Object::Name(self.color_space.to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);

        if let Some(alpha) = &self.alpha {
            let mask_id = doc.add_object(raw_stream(
                Dictionary::from_iter([
                    ("Type", Object::Name(b"XObject".to_vec())),
                    ("Subtype", Object::Name(b"Image".to_vec())),
                    ("Width", Object::Integer(i64::from(self.width))),
                    ("Height", Object::Integer(i64::from(self.height))),
                    ("ColorSpace", Object::Name(b"DeviceGray".to_vec())),
                    ("BitsPerComponent", Object::Integer(8)),
                ]),
                alpha.clone(),
            ));
            dict.set("SMask", Object::Reference(mask_id));
        }

        let stream = match &self.samples {
            Samples::Jpeg(bytes) => {
                dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
                Stream::new(dict, bytes.clone()).with_compression(false)
            }
            Samples::Raw(samples) => raw_stream(dict, samples.clone()),
        };

        doc.add_object(Object::Stream(stream))
    }
}

/// A Flate-compressed stream of raw samples.
fn raw_stream(dict: Dictionary, samples: Vec<u8>) -> Stream {
    let mut stream = Stream::new(dict, samples);
    // Falls back to the uncompressed samples if compression fails
    let _ = stream.compress();
    stream
}
