use std::path::Path;

use image::{ImageBuffer, Rgb};

use crate::raster::{unpack_rgb, Planes};

/// where the S key drops its snapshot, relative to the working directory
pub const SNAPSHOT_PATH: &str = "output.png";

/// Write the colour plane as 24-bit RGB. The in-memory layout keeps row 0
/// at the top; the file is written bottom-up, so PNG row y is taken from
/// memory row height - 1 - y.
pub fn save_colour_plane(planes: &Planes, path: &Path) -> Result<(), image::ImageError> {
    let scene = planes.scene();
    let img = ImageBuffer::from_fn(scene.width as u32, scene.height as u32, |x, y| {
        let row = scene.height - 1 - y as usize;
        let (r, g, b) = unpack_rgb(planes.colour_at(row * scene.width + x as usize));
        Rgb([r, g, b])
    });
    img.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Scene;

    #[test]
    fn test_snapshot_flips_rows() {
        let planes = Planes::new(Scene {
            width: 3,
            height: 2,
        });
        // top-left red in memory, bottom-right blue
        planes.set_pixel(0, 0, 1.0, 0.0, 0.0);
        planes.set_pixel(2, 1, 0.0, 0.0, 1.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SNAPSHOT_PATH);
        save_colour_plane(&planes, &path).unwrap();

        let img = image::open(&path).unwrap().into_rgb8();
        assert_eq!(img.dimensions(), (3, 2));
        // memory row 0 lands at the bottom of the file
        assert_eq!(img.get_pixel(0, 1), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(2, 0), &Rgb([0, 0, 255]));
    }
}
