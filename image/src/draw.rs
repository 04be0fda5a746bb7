use super::{Color3, ImageOwned, ImageOwned3, ImageRef};

/// Primitive rasterization in continuous coordinates, where the image spans
/// `[0, 1]` on both axes and `y` grows downward.
pub trait Canvas {
    fn fill_rect(&mut self, min: (f32, f32), max: (f32, f32), color: Color3);
    fn fill_disc(&mut self, center: (f32, f32), radius: f32, color: Color3);
}

impl Canvas for ImageOwned3 {
    fn fill_rect(&mut self, min: (f32, f32), max: (f32, f32), color: Color3) {
        let (x_range, y_range) = (
            pixel_range(min.0, max.0, self.width()),
            pixel_range(min.1, max.1, self.height()),
        );
        for y in y_range {
            for x in x_range.clone() {
                self.set_pixel_color(x, y, color);
            }
        }
    }
    fn fill_disc(&mut self, center: (f32, f32), radius: f32, color: Color3) {
        let (width, height) = (self.width(), self.height());
        let x_range = pixel_range(center.0 - radius, center.0 + radius, width);
        let y_range = pixel_range(center.1 - radius, center.1 + radius, height);
        for y in y_range {
            for x in x_range.clone() {
                let dx = (x as f32 + 0.5) / width as f32 - center.0;
                let dy = (y as f32 + 0.5) / height as f32 - center.1;
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel_color(x, y, color);
                }
            }
        }
    }
}

fn pixel_range(min: f32, max: f32, size: u32) -> std::ops::Range<u32> {
    let to_pixel = |v: f32| ((v * size as f32).round().max(0.0) as u32).min(size);
    to_pixel(min)..to_pixel(max)
}
