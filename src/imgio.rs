use crate::{
    error::{Result, StackError},
    image::Image,
    pixel::Pixel,
};
use failure::{err_msg, Error};
use image_lib::{
    codecs::jpeg::{JpegDecoder, JpegEncoder},
    DynamicImage, ExtendedColorType,
};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Seek, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::debug;

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Png,
    Jpeg,
}

impl Format {
    /// Picks the codec from the file extension, ignoring case.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Format> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => Ok(Format::Png),
            Some("jpg") | Some("jpeg") => Ok(Format::Jpeg),
            _ => Err(StackError::UnknownFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<Image<Pixel>> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let file = File::open(path).map_err(|err| StackError::io(path, err))?;
    let image = decode(BufReader::new(file), format).map_err(|err| StackError::Decode {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    debug!("Read {} ({}x{})", path.display(), image.width(), image.height());
    Ok(image)
}

/// Encodes fully in memory, then moves the file into place so a failure never
/// leaves a partial image at `path`.
pub fn save(path: impl AsRef<Path>, image: &Image<Pixel>, jpeg_quality: u8) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let mut bytes = Vec::new();
    encode(image, &mut bytes, format, jpeg_quality).map_err(|err| StackError::Encode {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|err| StackError::io(path, err))?;
    file.write_all(&bytes)
        .map_err(|err| StackError::io(path, err))?;
    file.persist(path)
        .map_err(|err| StackError::io(path, err.error))?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub fn decode<R: BufRead + Seek>(
    reader: R,
    format: Format,
) -> std::result::Result<Image<Pixel>, Error> {
    match format {
        Format::Png => decode_png(reader),
        Format::Jpeg => decode_jpeg(reader),
    }
}

pub fn encode<W: Write>(
    image: &Image<Pixel>,
    writer: W,
    format: Format,
    jpeg_quality: u8,
) -> std::result::Result<(), Error> {
    match format {
        Format::Png => encode_png(image, writer),
        Format::Jpeg => encode_jpeg(image, writer, jpeg_quality),
    }
}

fn decode_png(reader: impl Read) -> std::result::Result<Image<Pixel>, Error> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let buf = &buf[..info.buffer_size()];
    let samples: Vec<u16> = match info.bit_depth {
        // 8 bit values scale to the 16 bit range by repeating the byte
        png::BitDepth::Eight => buf.iter().map(|&v| u16::from(v) * 257).collect(),
        // big-endian
        png::BitDepth::Sixteen => buf
            .chunks_exact(2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .collect(),
        depth => return Err(err_msg(format!("Unsupported bit depth {:?}", depth))),
    };
    const OPAQUE: u16 = u16::MAX;
    let data: Vec<Pixel> = match info.color_type {
        png::ColorType::Grayscale => samples
            .iter()
            .map(|&l| Pixel::from_straight16(l, l, l, OPAQUE))
            .collect(),
        png::ColorType::GrayscaleAlpha => samples
            .chunks_exact(2)
            .map(|c| Pixel::from_straight16(c[0], c[0], c[0], c[1]))
            .collect(),
        png::ColorType::Rgb => samples
            .chunks_exact(3)
            .map(|c| Pixel::from_straight16(c[0], c[1], c[2], OPAQUE))
            .collect(),
        png::ColorType::Rgba => samples
            .chunks_exact(4)
            .map(|c| Pixel::from_straight16(c[0], c[1], c[2], c[3]))
            .collect(),
        ty => return Err(err_msg(format!("Unsupported color type {:?}", ty))),
    };
    Ok(Image::new(data, (info.width as usize, info.height as usize)))
}

fn decode_jpeg<R: BufRead + Seek>(reader: R) -> std::result::Result<Image<Pixel>, Error> {
    let decoded = DynamicImage::from_decoder(JpegDecoder::new(reader)?)?.into_rgb8();
    let (width, height) = decoded.dimensions();
    let data = decoded
        .pixels()
        .map(|pix| {
            let [r, g, b] = pix.0;
            let wide = |c: u8| u16::from(c) * 257;
            Pixel::from_straight16(wide(r), wide(g), wide(b), u16::MAX)
        })
        .collect();
    Ok(Image::new(data, (width as usize, height as usize)))
}

fn encode_png(image: &Image<Pixel>, writer: impl Write) -> std::result::Result<(), Error> {
    let mut encoder = png::Encoder::new(writer, image.width() as u32, image.height() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    let output = image
        .into_iter()
        .flat_map(|pix| pix.to_straight8())
        .collect::<Vec<u8>>();
    writer.write_image_data(&output)?;
    writer.finish()?;
    Ok(())
}

// JPEG has no alpha; the premultiplied color channels are written as-is.
fn encode_jpeg(
    image: &Image<Pixel>,
    writer: impl Write,
    quality: u8,
) -> std::result::Result<(), Error> {
    let output = image
        .into_iter()
        .flat_map(|pix| [pix.r, pix.g, pix.b])
        .collect::<Vec<u8>>();
    let mut encoder = JpegEncoder::new_with_quality(writer, quality);
    encoder.encode(
        &output,
        image.width() as u32,
        image.height() as u32,
        ExtendedColorType::Rgb8,
    )?;
    Ok(())
}
