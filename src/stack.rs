use crate::{
    alg::{median_pixel, upper_median},
    error::{Result, StackError},
    image::Image,
    pixel::{Channel, Pixel},
};
use rayon::prelude::*;
use tracing::info;

/// A median needs a clear majority of background observations at each position.
pub const MIN_FRAMES: usize = 5;

/// What ends up in the alpha channel of the stacked image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaPolicy {
    /// Alpha is carried over unchanged from the first frame.
    FirstFrame,
    /// Alpha is aggregated with the same upper-median rule as the color channels.
    Median,
}

impl Default for AlphaPolicy {
    fn default() -> Self {
        AlphaPolicy::FirstFrame
    }
}

pub fn validate(images: &[Image<Pixel>]) -> Result<()> {
    if images.len() < MIN_FRAMES {
        return Err(StackError::InsufficientFrames {
            found: images.len(),
            required: MIN_FRAMES,
        });
    }
    let expected = images[0].size;
    for (index, image) in images.iter().enumerate().skip(1) {
        if image.size != expected {
            return Err(StackError::DimensionMismatch {
                index,
                expected,
                found: image.size,
            });
        }
    }
    Ok(())
}

/// Median-stacks `images`, keeping the first frame's alpha.
pub fn stack(images: &[Image<Pixel>]) -> Result<Image<Pixel>> {
    stack_with(images, AlphaPolicy::FirstFrame, median_pixel)
}

/// Stacks `images` one row per task. `aggregate` sees every frame's sample at a
/// position; only its R, G and B are written to the output.
pub fn stack_with<F>(
    images: &[Image<Pixel>],
    alpha: AlphaPolicy,
    aggregate: F,
) -> Result<Image<Pixel>>
where
    F: Fn(&[Pixel]) -> Pixel + Sync,
{
    validate(images)?;
    let mut result = images[0].clone();
    let width = result.width();
    info!(
        "Stacking {} images of {}x{}",
        images.len(),
        width,
        result.height()
    );
    if width == 0 {
        return Ok(result);
    }
    result
        .data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let rows = images.iter().map(|image| image.row(y)).collect::<Vec<_>>();
            let mut samples = Vec::with_capacity(images.len());
            let mut alphas = Vec::with_capacity(images.len());
            for (x, out) in row.iter_mut().enumerate() {
                samples.clear();
                samples.extend(rows.iter().map(|row| row[x]));
                let median = aggregate(&samples);
                write_median(out, median, &samples, alpha, &mut alphas);
            }
        });
    Ok(result)
}

/// Single-threaded reference for `stack_with(images, alpha, median_pixel)`.
pub fn stack_serial(images: &[Image<Pixel>], alpha: AlphaPolicy) -> Result<Image<Pixel>> {
    validate(images)?;
    let mut result = images[0].clone();
    let mut samples = Vec::with_capacity(images.len());
    let mut alphas = Vec::with_capacity(images.len());
    for coord in images[0].iter_index() {
        samples.clear();
        samples.extend(images.iter().map(|image| image[coord]));
        let median = median_pixel(&samples);
        write_median(&mut result[coord], median, &samples, alpha, &mut alphas);
    }
    Ok(result)
}

fn write_median(
    out: &mut Pixel,
    median: Pixel,
    samples: &[Pixel],
    alpha: AlphaPolicy,
    scratch: &mut Vec<u8>,
) {
    for &c in &Channel::COLOR {
        out[c] = median[c];
    }
    if alpha == AlphaPolicy::Median {
        scratch.clear();
        scratch.extend(samples.iter().map(|pix| pix.a));
        out.a = upper_median(scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn random_image(size: (usize, usize)) -> Image<Pixel> {
        let data = (0..size.0 * size.1)
            .map(|_| {
                Pixel::new(
                    rand::random(),
                    rand::random(),
                    rand::random(),
                    rand::random(),
                )
            })
            .collect();
        Image::new(data, size)
    }

    fn counting<'a>(calls: &'a AtomicUsize) -> impl Fn(&[Pixel]) -> Pixel + Sync + 'a {
        move |samples| {
            calls.fetch_add(1, Ordering::SeqCst);
            median_pixel(samples)
        }
    }

    #[test]
    fn too_few_frames() {
        let images = vec![random_image((4, 4)); 4];
        let calls = AtomicUsize::new(0);
        match stack_with(&images, AlphaPolicy::FirstFrame, counting(&calls)) {
            Err(StackError::InsufficientFrames { found, required }) => {
                assert_eq!((found, required), (4, MIN_FRAMES))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            stack(&[]),
            Err(StackError::InsufficientFrames { found: 0, .. })
        ));
    }

    #[test]
    fn mismatched_dimensions() {
        let mut images = vec![random_image((50, 50)); 5];
        images[3] = random_image((100, 100));
        let calls = AtomicUsize::new(0);
        match stack_with(&images, AlphaPolicy::FirstFrame, counting(&calls)) {
            Err(StackError::DimensionMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 3);
                assert_eq!(expected, (50, 50));
                assert_eq!(found, (100, 100));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_frame_different_is_mismatch() {
        let mut images = vec![random_image((50, 50)); 5];
        images[0] = random_image((100, 100));
        assert!(matches!(
            validate(&images),
            Err(StackError::DimensionMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn aggregator_called_once_per_position() {
        let images = vec![random_image((7, 3)); 5];
        let calls = AtomicUsize::new(0);
        stack_with(&images, AlphaPolicy::FirstFrame, counting(&calls)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 21);
    }

    #[test]
    fn identical_frames_reproduce_input() {
        let image = random_image((16, 9));
        let images = vec![image.clone(); 5];
        assert_eq!(stack(&images).unwrap(), image);
    }

    #[test]
    fn median_per_position() {
        let values = [10u8, 50, 30, 20, 40];
        let images = values
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                let mut image = Image::new_val(Pixel::new(0, 7, 7, 200 + i as u8), (2, 2));
                image[(0, 0)].r = r;
                image
            })
            .collect::<Vec<_>>();
        let result = stack(&images).unwrap();
        assert_eq!(result[(0, 0)], Pixel::new(30, 7, 7, 200));
        assert_eq!(result[(1, 1)], Pixel::new(0, 7, 7, 200));

        let result = stack_with(&images, AlphaPolicy::Median, median_pixel).unwrap();
        assert_eq!(result[(0, 0)], Pixel::new(30, 7, 7, 202));
    }

    #[test]
    fn six_frames_take_upper_median() {
        let images = (1..=6u8)
            .map(|i| Image::new_val(Pixel::new(i * 10, 0, 0, 255), (2, 2)))
            .collect::<Vec<_>>();
        let result = stack(&images).unwrap();
        assert!(result.data.iter().all(|&pix| pix == Pixel::new(40, 0, 0, 255)));
    }

    #[test]
    fn moving_object_is_removed() {
        let background = random_image((8, 8));
        let images = (0..5)
            .map(|i| {
                let mut image = background.clone();
                image[(i, i)] = Pixel::new(255, 0, 0, 255);
                image
            })
            .collect::<Vec<_>>();
        let result = stack(&images).unwrap();
        for coord in background.iter_index() {
            let (want, got) = (background[coord], result[coord]);
            assert_eq!((got.r, got.g, got.b), (want.r, want.g, want.b));
        }
    }

    #[test]
    fn empty_rows() {
        let images = vec![Image::<Pixel>::zero((0, 3)); 5];
        assert_eq!(stack(&images).unwrap().size, (0, 3));
    }

    #[test]
    fn parallel_matches_serial() {
        let images = (0..5)
            .map(|_| random_image((1000, 1000)))
            .collect::<Vec<_>>();
        for &alpha in &[AlphaPolicy::FirstFrame, AlphaPolicy::Median] {
            let parallel = stack_with(&images, alpha, median_pixel).unwrap();
            let serial = stack_serial(&images, alpha).unwrap();
            assert!(parallel == serial);
        }
    }
}
