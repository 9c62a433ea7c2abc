//! Display orientation of a video track.
//!
//! Phones record portrait video as landscape samples plus a display matrix
//! telling players how to rotate them. Thumbnails must honour that matrix
//! or they come out sideways. This module reads the matrix (or the legacy
//! `rotate` tag) from a stream and applies the resulting transform to a
//! decoded image.

use ffmpeg_next::format::stream::Stream;
use ffmpeg_sys_next::{AVPacketSideDataType, av_packet_side_data_get};
use image::DynamicImage;

/// Clockwise rotation needed to display a decoded frame upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Frame is already upright.
    #[default]
    None,
    /// Rotate 90° clockwise.
    Clockwise90,
    /// Rotate 180°.
    Rotate180,
    /// Rotate 270° clockwise (90° counter-clockwise).
    Clockwise270,
}

impl Rotation {
    /// Snap an angle in degrees (clockwise) to the nearest quarter turn.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Rotation::None;
        }
        let quarter_turns = (degrees / 90.0).round() as i64;
        match quarter_turns.rem_euclid(4) {
            1 => Rotation::Clockwise90,
            2 => Rotation::Rotate180,
            3 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }

    /// Clockwise angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

/// Transform recorded on a video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    /// Rotation applied first.
    pub rotation: Rotation,
    /// Horizontal mirror applied after the rotation.
    pub mirrored: bool,
}

impl Orientation {
    /// Derive the orientation from a 3×3 display matrix in FFmpeg's layout
    /// (16.16 fixed point for the first two columns).
    pub fn from_display_matrix(matrix: &[i32; 9]) -> Self {
        let mut matrix = *matrix;
        let determinant = matrix[0] as i64 * matrix[4] as i64 - matrix[1] as i64 * matrix[3] as i64;
        let mirrored = determinant < 0;
        if mirrored {
            // Undo the horizontal flip so the remaining transform is a pure rotation.
            matrix[0] = matrix[0].saturating_neg();
            matrix[3] = matrix[3].saturating_neg();
            matrix[6] = matrix[6].saturating_neg();
        }

        let fixed = |value: i32| value as f64 / 65536.0;
        let column_zero_scale = fixed(matrix[0]).hypot(fixed(matrix[3]));
        let column_one_scale = fixed(matrix[1]).hypot(fixed(matrix[4]));
        if column_zero_scale == 0.0 || column_one_scale == 0.0 {
            return Self::default();
        }

        // Counter-clockwise angle encoded by the matrix.
        let counter_clockwise = -(fixed(matrix[1]) / column_one_scale)
            .atan2(fixed(matrix[0]) / column_zero_scale)
            .to_degrees();

        Self {
            rotation: Rotation::from_degrees(-counter_clockwise),
            mirrored,
        }
    }

    /// Read the orientation of `stream`.
    ///
    /// Prefers the display matrix in the codec parameters' side data and
    /// falls back to the `rotate` metadata tag written by older muxers.
    pub fn from_stream(stream: &Stream<'_>) -> Self {
        if let Some(matrix) = display_matrix(stream) {
            return Self::from_display_matrix(&matrix);
        }

        stream
            .metadata()
            .get("rotate")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .map(|degrees| Self {
                rotation: Rotation::from_degrees(degrees),
                mirrored: false,
            })
            .unwrap_or_default()
    }

    /// Display size of a frame whose coded size is `width` × `height`.
    pub fn display_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.rotation.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Apply the transform to a decoded image.
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        let rotated = match self.rotation {
            Rotation::None => image,
            Rotation::Clockwise90 => image.rotate90(),
            Rotation::Rotate180 => image.rotate180(),
            Rotation::Clockwise270 => image.rotate270(),
        };
        if self.mirrored { rotated.fliph() } else { rotated }
    }
}

fn display_matrix(stream: &Stream<'_>) -> Option<[i32; 9]> {
    let parameters = stream.parameters();
    // SAFETY: `parameters` borrows the stream's codec parameters, which stay
    // alive for the duration of this call. The side data entry, when
    // present, is owned by those parameters and is only read here.
    unsafe {
        let raw = &*parameters.as_ptr();
        let entry = av_packet_side_data_get(
            raw.coded_side_data,
            raw.nb_coded_side_data,
            AVPacketSideDataType::AV_PKT_DATA_DISPLAYMATRIX,
        );
        if entry.is_null() || (*entry).data.is_null() || (*entry).size < 9 * size_of::<i32>() {
            return None;
        }
        let data = (*entry).data as *const i32;
        let mut matrix = [0_i32; 9];
        for (index, slot) in matrix.iter_mut().enumerate() {
            *slot = data.add(index).read_unaligned();
        }
        Some(matrix)
    }
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, Rgb, RgbImage};

    use super::*;

    const ONE: i32 = 1 << 16;

    fn matrix(a: i32, b: i32, c: i32, d: i32) -> [i32; 9] {
        [a, b, 0, c, d, 0, 0, 0, 1 << 30]
    }

    #[test]
    fn identity_matrix_is_upright() {
        let orientation = Orientation::from_display_matrix(&matrix(ONE, 0, 0, ONE));
        assert_eq!(orientation, Orientation::default());
    }

    #[test]
    fn portrait_phone_matrix_rotates_clockwise() {
        // What iPhones write for portrait recordings.
        let orientation = Orientation::from_display_matrix(&matrix(0, ONE, -ONE, 0));
        assert_eq!(orientation.rotation, Rotation::Clockwise90);
        assert!(!orientation.mirrored);
    }

    #[test]
    fn upside_down_and_counter_clockwise() {
        let half = Orientation::from_display_matrix(&matrix(-ONE, 0, 0, -ONE));
        assert_eq!(half.rotation, Rotation::Rotate180);

        let quarter = Orientation::from_display_matrix(&matrix(0, -ONE, ONE, 0));
        assert_eq!(quarter.rotation, Rotation::Clockwise270);
    }

    #[test]
    fn negative_determinant_is_mirrored() {
        let orientation = Orientation::from_display_matrix(&matrix(-ONE, 0, 0, ONE));
        assert!(orientation.mirrored);
        assert_eq!(orientation.rotation, Rotation::None);
    }

    #[test]
    fn degenerate_matrix_is_ignored() {
        let orientation = Orientation::from_display_matrix(&[0; 9]);
        assert_eq!(orientation, Orientation::default());
    }

    #[test]
    fn degrees_snap_to_quarter_turns() {
        assert_eq!(Rotation::from_degrees(89.6), Rotation::Clockwise90);
        assert_eq!(Rotation::from_degrees(-90.0), Rotation::Clockwise270);
        assert_eq!(Rotation::from_degrees(540.0), Rotation::Rotate180);
        assert_eq!(Rotation::from_degrees(f64::NAN), Rotation::None);
    }

    #[test]
    fn apply_rotates_and_swaps_dimensions() {
        let mut source = RgbImage::new(4, 2);
        source.put_pixel(0, 0, Rgb([255, 0, 0]));
        let orientation = Orientation {
            rotation: Rotation::Clockwise90,
            mirrored: false,
        };

        assert_eq!(orientation.display_dimensions(4, 2), (2, 4));
        let rotated = orientation.apply(DynamicImage::ImageRgb8(source));
        assert_eq!(rotated.dimensions(), (2, 4));
        // Top-left moves to top-right under a clockwise quarter turn.
        assert_eq!(rotated.get_pixel(1, 0).0[0], 255);
    }
}
