use crate::pixel::{Channel, Pixel};

/// Upper median: for an even count this is the element at `len / 2`, never an
/// average of the two middle values.
///
/// # Panics
///
/// Panics if `seq` is empty.
pub fn upper_median(seq: &mut [u8]) -> u8 {
    debug_assert!(!seq.is_empty(), "median of an empty sequence");
    seq.sort_unstable();
    seq[seq.len() / 2]
}

/// Per-channel median of R, G and B across `samples`. Alpha is always 0.
///
/// # Panics
///
/// Panics if `samples` is empty.
pub fn median_pixel(samples: &[Pixel]) -> Pixel {
    let mut values = Vec::with_capacity(samples.len());
    let mut channel = |c: Channel| {
        values.clear();
        values.extend(samples.iter().map(|pix| pix[c]));
        upper_median(&mut values)
    };
    let r = channel(Channel::R);
    let g = channel(Channel::G);
    let b = channel(Channel::B);
    Pixel::new(r, g, b, 0)
}
