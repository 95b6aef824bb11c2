use super::image::GifImage;
use crate::error::{Error, Result};

/// Interlace bit of the image descriptor's packed byte.
const INTERLACE_MASK: u8 = 0x40;

/// Row order of an interlaced image: every 8th row from row 0, every 8th
/// row from row 4, every 4th row from row 2, every 2nd row from row 1.
fn interlaced_row_order(height: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(height);
    order.extend((0..height).step_by(8));
    order.extend((4..height).step_by(8));
    order.extend((2..height).step_by(4));
    order.extend((1..height).step_by(2));
    order
}

impl GifImage {
    /// Convert between interlaced and non-interlaced row order.
    ///
    /// Reorders the frame's index stream and flips the interlace bit in the
    /// copied frame header. Only single-frame stills are supported; the row
    /// permutation interacts badly with partial frames in animations.
    pub fn set_interlacing(&mut self, make_interlaced: bool) -> Result<()> {
        if self.frames().len() != 1 || self.is_animated() {
            return Err(Error::Unsupported(
                "changing interlacing of animated GIFs is not supported".into(),
            ));
        }

        let frame = &mut self.frames_mut()[0];
        let width = frame.width as usize;
        let height = frame.height as usize;

        // interlacing doesn't matter for a single line
        if height <= 1 {
            return Ok(());
        }
        if frame.interlaced == make_interlaced {
            return Ok(());
        }
        if frame.pixels.len() != width * height {
            return Err(Error::Unsupported(
                "frame pixel count does not match its descriptor".into(),
            ));
        }

        let order = interlaced_row_order(height);
        let mut reordered = vec![0u8; frame.pixels.len()];
        if make_interlaced {
            // file row r shows display row order[r]
            for (r, &display) in order.iter().enumerate() {
                reordered[r * width..(r + 1) * width]
                    .copy_from_slice(&frame.pixels[display * width..(display + 1) * width]);
            }
        } else {
            for (r, &display) in order.iter().enumerate() {
                reordered[display * width..(display + 1) * width]
                    .copy_from_slice(&frame.pixels[r * width..(r + 1) * width]);
            }
        }
        frame.pixels = reordered;
        frame.interlaced = make_interlaced;

        let offset = frame.packed_byte_offset;
        if make_interlaced {
            frame.raw_header[offset] |= INTERLACE_MASK;
        } else {
            frame.raw_header[offset] &= !INTERLACE_MASK;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_order_height_8() {
        assert_eq!(interlaced_row_order(8), vec![0, 4, 2, 6, 1, 3, 5, 7]);
    }

    #[test]
    fn test_row_order_height_10() {
        assert_eq!(interlaced_row_order(10), vec![0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_row_order_is_a_permutation() {
        for height in 1..40 {
            let mut order = interlaced_row_order(height);
            order.sort_unstable();
            let expected: Vec<usize> = (0..height).collect();
            assert_eq!(order, expected, "height {height}");
        }
    }
}
