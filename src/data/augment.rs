use serde::{Serialize, Deserialize};

use crate::data::batch::ImageShape;

/// Fixed geometric view of an image, applied to every channel alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Augmentation {
    #[default]
    Identity,
    FlipHorizontal,
    FlipVertical,
    Rotate180,
}

impl Augmentation {
    /// Returns the transformed copy of a channel-major flattened image.
    pub fn apply(self, image: &[f64], shape: ImageShape) -> Vec<f64> {
        let (h, w) = (shape.height, shape.width);
        if self == Augmentation::Identity {
            return image.to_vec();
        }
        let mut out = vec![0.0; image.len()];
        for c in 0..shape.channels {
            let base = c * h * w;
            for y in 0..h {
                for x in 0..w {
                    let (sy, sx) = match self {
                        Augmentation::Identity => (y, x),
                        Augmentation::FlipHorizontal => (y, w - 1 - x),
                        Augmentation::FlipVertical => (h - 1 - y, x),
                        Augmentation::Rotate180 => (h - 1 - y, w - 1 - x),
                    };
                    out[base + y * w + x] = image[base + sy * w + sx];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: ImageShape = ImageShape { channels: 1, height: 2, width: 3 };
    const IMG: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

    #[test]
    fn test_flips() {
        assert_eq!(Augmentation::FlipHorizontal.apply(&IMG, SHAPE), vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);
        assert_eq!(Augmentation::FlipVertical.apply(&IMG, SHAPE), vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
        assert_eq!(Augmentation::Rotate180.apply(&IMG, SHAPE), vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(Augmentation::Identity.apply(&IMG, SHAPE), IMG.to_vec());
    }

    #[test]
    fn test_channels_transformed_independently() {
        let shape = ImageShape { channels: 2, height: 1, width: 2 };
        assert_eq!(
            Augmentation::FlipHorizontal.apply(&[1.0, 2.0, 3.0, 4.0], shape),
            vec![2.0, 1.0, 4.0, 3.0]
        );
    }
}
