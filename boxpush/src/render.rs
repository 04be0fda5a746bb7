use super::world::{BoxPushWorld, AGENT_RADIUS, BOX_HALF_SIZE};
use image::{Canvas, Color3, ImageOwned, ImageOwned3};
use ndarray::Array3;

const FLOOR_COLOR: Color3 = Color3::new(214, 208, 190);
const AGENT_COLOR: Color3 = Color3::new(200, 40, 40);
const NOSE_COLOR: Color3 = Color3::new(30, 30, 30);
const BOX_COLOR: Color3 = Color3::new(40, 70, 190);

/// Supersampling factor; shapes are drawn at this multiple of the frame size
/// and averaged down to soften their edges.
const SUPERSAMPLING: u32 = 2;

/// Renders the world as a `(size, size, 3)` observation.
pub fn render(world: &BoxPushWorld, size: usize) -> Array3<u8> {
    let canvas_size = size as u32 * SUPERSAMPLING;
    let mut canvas = ImageOwned3::filled(canvas_size, canvas_size, FLOOR_COLOR);
    if let Some((x, y)) = world.box_center() {
        canvas.fill_rect(
            (x - BOX_HALF_SIZE, y - BOX_HALF_SIZE),
            (x + BOX_HALF_SIZE, y + BOX_HALF_SIZE),
            BOX_COLOR,
        );
    }
    let (x, y) = world.agent();
    canvas.fill_disc((x, y), AGENT_RADIUS, AGENT_COLOR);
    let nose = (
        x + 0.6 * AGENT_RADIUS * world.heading().cos(),
        y + 0.6 * AGENT_RADIUS * world.heading().sin(),
    );
    canvas.fill_disc(nose, 0.35 * AGENT_RADIUS, NOSE_COLOR);
    canvas
        .as_ref()
        .downscale_by_average(SUPERSAMPLING)
        .as_ref()
        .to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorldConfig;

    #[test]
    fn render_has_frame_shape_and_shows_the_agent() {
        let world = BoxPushWorld::new(WorldConfig { with_box: true }, 5);
        let frame = render(&world, 64);
        assert_eq!(frame.dim(), (64, 64, 3));
        let (x, y) = world.agent();
        let (px, py) = ((x * 64.0) as usize, (y * 64.0) as usize);
        // the pixel at the agent's center is dominated by red
        assert!(frame[[py, px, 0]] > frame[[py, px, 2]]);
    }
}
