use anyhow::{anyhow, Result};
use ndarray::{Array2, ArrayViewD, Axis, Ix2};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct FieldVisualiser {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    gradient: Box<dyn colorgrad::Gradient>,
}

impl FieldVisualiser {
    pub fn new(output_dir: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| anyhow!("Failed to create '{}': {}", output_dir.display(), e))?;

        let gradient = Box::new(colorgrad::preset::viridis());

        Ok(Self {
            output_dir,
            width,
            height,
            gradient,
        })
    }

    /// Render a padded-grid field to `<output_dir>/<field_name>.png`.
    ///
    /// 3D fields are cut through the middle of the second axis.
    pub fn plot_field(&self, data: ArrayViewD<'_, f64>, field_name: &str) -> Result<PathBuf> {
        let data = to_plane(data)?;
        let filename = self.output_dir.join(format!("{}.png", field_name));
        self.draw(&data, field_name, &filename)?;
        info!(file = %filename.display(), "saved field image");
        Ok(filename)
    }

    fn draw(&self, data: &Array2<f64>, field_name: &str, filename: &Path) -> Result<()> {
        let root = BitMapBackend::new(filename, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (nx, nz) = data.dim();
        let min_val = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max_val = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let title = format!("{} [{:.4}, {:.4}]", field_name, min_val, max_val);
        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d(0..nx, 0..nz)?;

        chart
            .configure_mesh()
            .x_desc("X (grid points)")
            .y_desc("Z (grid points)")
            .draw()?;

        // Depth increases downward
        chart.draw_series(data.indexed_iter().map(|((i, k), &value)| {
            let color = self.value_to_color(value, min_val, max_val);
            Rectangle::new(
                [(i, nz - 1 - k), (i + 1, nz - k)],
                color.filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    fn value_to_color(&self, value: f64, min_val: f64, max_val: f64) -> RGBColor {
        let normalized = if max_val > min_val {
            (value - min_val) / (max_val - min_val)
        } else {
            0.5
        };
        let normalized = normalized.clamp(0.0, 1.0);
        let color_rgba = self.gradient.at(normalized as f32).to_rgba8();
        RGBColor(color_rgba[0], color_rgba[1], color_rgba[2])
    }
}

/// Reduce a 1-3D field to the plane that gets plotted
fn to_plane(data: ArrayViewD<'_, f64>) -> Result<Array2<f64>> {
    match data.ndim() {
        1 => {
            let n = data.len();
            Ok(data.to_owned().into_shape_with_order((n, 1))?)
        }
        2 => Ok(data.to_owned().into_dimensionality::<Ix2>()?),
        3 => {
            let mid = data.len_of(Axis(1)) / 2;
            Ok(data
                .index_axis(Axis(1), mid)
                .to_owned()
                .into_dimensionality::<Ix2>()?)
        }
        n => Err(anyhow!("Cannot plot a {}-dimensional field", n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_to_plane_takes_middle_slice() {
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 5, 4]), |idx| (idx[1] * 10 + idx[2]) as f64);
        let plane = to_plane(data.view()).unwrap();
        assert_eq!(plane.dim(), (3, 4));
        assert_eq!(plane[[0, 3]], 23.0);
    }

    #[test]
    fn test_to_plane_1d() {
        let data = ArrayD::from_elem(IxDyn(&[7]), 1.0);
        assert_eq!(to_plane(data.view()).unwrap().dim(), (7, 1));
    }
}
