use super::{ImageOwned, ImageRef, Zero};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Color3(pub u8, pub u8, pub u8);

impl Color3 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }
}

pub struct WColor3(pub u32, pub u32, pub u32);

impl WColor3 {
    pub const fn new(r: u32, g: u32, b: u32) -> Self {
        Self(r, g, b)
    }
}

impl Zero for WColor3 {
    fn zero() -> Self {
        Self::new(0, 0, 0)
    }
}

impl std::ops::AddAssign for WColor3 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.1 += rhs.1;
        self.2 += rhs.2;
    }
}

impl std::ops::Div<u32> for WColor3 {
    type Output = Self;
    fn div(self, rhs: u32) -> Self {
        Self::new(self.0 / rhs, self.1 / rhs, self.2 / rhs)
    }
}

impl From<Color3> for WColor3 {
    fn from(c: Color3) -> Self {
        Self::new(c.0.into(), c.1.into(), c.2.into())
    }
}

pub struct ImageRef3<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl ImageRef3<'_> {
    pub fn new(width: u32, height: u32, data: &[u8]) -> ImageRef3 {
        ImageRef3 {
            width,
            height,
            data,
        }
    }
    /// Averages `factor`×`factor` pixel blocks. Panics if either side is not a
    /// multiple of `factor`.
    pub fn downscale_by_average(&self, factor: u32) -> ImageOwned3 {
        assert!(
            factor > 0 && self.width() % factor == 0 && self.height() % factor == 0,
            "attempted to downscale to a problematic size"
        );
        let new_width = self.width() / factor;
        let new_height = self.height() / factor;
        let sample_size = factor * factor;
        let mut rescaled_image = ImageOwned3::zeroed(new_width, new_height);
        for y in 0..new_height {
            for x in 0..new_width {
                let mut sum = WColor3::zero();
                for y_inner in 0..factor {
                    for x_inner in 0..factor {
                        let original_color =
                            self.get_pixel_color(x * factor + x_inner, y * factor + y_inner);
                        sum += original_color.into();
                    }
                }
                // the average of u8 samples always fits in a u8
                let average = sum / sample_size;
                rescaled_image.set_pixel_color(
                    x,
                    y,
                    Color3::new(average.0 as u8, average.1 as u8, average.2 as u8),
                );
            }
        }
        rescaled_image
    }
    /// Row-major (height, width, channel) copy of the pixel data.
    pub fn to_array(&self) -> Array3<u8> {
        Array3::from_shape_vec(
            (self.height as usize, self.width as usize, 3),
            self.data.to_vec(),
        )
        .expect("image data length is always width * height * 3")
    }
}

impl ImageRef for ImageRef3<'_> {
    type Owned = ImageOwned3;
    type Color = Color3;
    fn get_pixel_color(&self, x: u32, y: u32) -> Self::Color {
        let pixel = (3 * (x + y * self.width)) as usize;
        Self::Color::new(self.data[pixel], self.data[pixel + 1], self.data[pixel + 2])
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageOwned3 {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageOwned3 {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (3 * width * height) as usize,
            "image data length doesn't match its size"
        );
        Self {
            width,
            height,
            data,
        }
    }
    pub fn filled(width: u32, height: u32, color: Color3) -> Self {
        let data = [color.0, color.1, color.2].repeat((width * height) as usize);
        Self::new(width, height, data)
    }
}

impl ImageRef for ImageOwned3 {
    type Owned = Self;
    type Color = Color3;
    fn get_pixel_color(&self, x: u32, y: u32) -> Self::Color {
        self.as_ref().get_pixel_color(x, y)
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
}

impl ImageOwned for ImageOwned3 {
    type Ref<'a> = ImageRef3<'a>;
    fn zeroed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (3 * width * height) as usize],
        }
    }
    fn as_ref(&self) -> Self::Ref<'_> {
        ImageRef3::new(self.width, self.height, &self.data)
    }
    fn set_pixel_color(&mut self, x: u32, y: u32, color: Self::Color) {
        let pixel = (3 * (x + y * self.width)) as usize;
        self.data[pixel] = color.0;
        self.data[pixel + 1] = color.1;
        self.data[pixel + 2] = color.2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downscale_averages_blocks() {
        let mut image = ImageOwned3::zeroed(4, 2);
        image.set_pixel_color(0, 0, Color3::new(200, 100, 40));
        image.set_pixel_color(1, 1, Color3::new(200, 100, 40));
        let small = image.as_ref().downscale_by_average(2);
        assert_eq!((small.width(), small.height()), (2, 1));
        assert_eq!(small.get_pixel_color(0, 0), Color3::new(100, 50, 20));
        assert_eq!(small.get_pixel_color(1, 0), Color3::new(0, 0, 0));
    }

    #[test]
    fn array_is_height_major() {
        let mut image = ImageOwned3::zeroed(3, 2);
        image.set_pixel_color(2, 1, Color3::new(1, 2, 3));
        let array = image.as_ref().to_array();
        assert_eq!(array.dim(), (2, 3, 3));
        assert_eq!(array[[1, 2, 0]], 1);
        assert_eq!(array[[1, 2, 2]], 3);
    }
}
