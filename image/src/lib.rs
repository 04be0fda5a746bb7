mod draw;
mod image3;

pub use draw::Canvas;
pub use image3::{Color3, ImageOwned3, ImageRef3, WColor3};

pub trait Zero {
    fn zero() -> Self;
}

pub trait ImageRef {
    type Owned: ImageOwned;
    type Color;
    fn get_pixel_color(&self, x: u32, y: u32) -> Self::Color;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

pub trait ImageOwned: ImageRef {
    type Ref<'a>: ImageRef
    where
        Self: 'a;
    fn zeroed(width: u32, height: u32) -> Self;
    fn as_ref(&self) -> Self::Ref<'_>;
    fn set_pixel_color(&mut self, x: u32, y: u32, color: Self::Color);
}
