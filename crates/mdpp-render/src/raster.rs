//! PNG rasterization of a [`CategoryGrid`].

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::category::{Category, CategoryGrid};
use crate::error::RenderError;

const GRID_LINE: Rgb<u8> = Rgb([64, 64, 64]);

impl Category {
    /// Fill colour of the category in a raster plot.
    pub fn color(&self) -> Rgb<u8> {
        match self {
            Self::Available => Rgb([255, 255, 255]),
            Self::Keepout => Rgb([160, 160, 160]),
            Self::Probe => Rgb([220, 40, 40]),
            Self::Decap => Rgb([40, 80, 220]),
        }
    }
}

impl CategoryGrid {
    /// Draw each cell as a `cell_px` square with one-pixel grid lines.
    pub fn to_image(&self, cell_px: u32) -> Result<RgbImage, RenderError> {
        let size = u32::try_from(self.size()).map_err(|_| RenderError::InvalidScale { cell_px })?;
        let side = size
            .checked_mul(cell_px)
            .and_then(|s| s.checked_add(1))
            .filter(|_| cell_px > 0)
            .ok_or(RenderError::InvalidScale { cell_px })?;

        let cells = self.as_array();
        let img = RgbImage::from_fn(side, side, |x, y| {
            if x % cell_px == 0 || y % cell_px == 0 {
                return GRID_LINE;
            }
            let (row, col) = ((y / cell_px) as usize, (x / cell_px) as usize);
            cells
                .get((row, col))
                .map(Category::color)
                .unwrap_or(GRID_LINE)
        });
        Ok(img)
    }

    /// Write [`to_image`](Self::to_image) to `path` as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>, cell_px: u32) -> Result<(), RenderError> {
        self.to_image(cell_px)?
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::categorize;
    use crate::{Category, RenderError};
    use ndarray::array;

    fn two_by_two() -> crate::CategoryGrid {
        let mask = array![false, false, true, false];
        categorize(2, &[3], &[0], mask.view()).unwrap()
    }

    #[test]
    fn image_has_grid_lines_and_cell_colors() {
        let img = two_by_two().to_image(10).unwrap();
        assert_eq!(img.dimensions(), (21, 21));
        assert_eq!(*img.get_pixel(0, 0), super::GRID_LINE);
        assert_eq!(*img.get_pixel(5, 5), Category::Probe.color());
        assert_eq!(*img.get_pixel(15, 5), Category::Keepout.color());
        assert_eq!(*img.get_pixel(5, 15), Category::Available.color());
        assert_eq!(*img.get_pixel(15, 15), Category::Decap.color());
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        assert!(matches!(
            two_by_two().to_image(0),
            Err(RenderError::InvalidScale { cell_px: 0 })
        ));
    }

    #[test]
    fn png_round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!("mdpp-render-{}.png", std::process::id()));
        two_by_two().save_png(&path, 4).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
        let _ = std::fs::remove_file(&path);
    }
}
