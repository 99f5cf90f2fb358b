use crate::config::Config;
use crate::engine::{Point, Rect, Renderer, Size};
use rand::Rng;

/// A block scrolling right to left. `speed` is the world speed when it was
/// spawned and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Point,
    pub size: Size,
    pub speed: f32,
}

/// New obstacle at `x` with a random size. Every obstacle's top is at the
/// same height; only how far it reaches down varies.
pub fn spawn<R: Rng>(x: f32, speed: f32, config: &Config, rng: &mut R) -> Obstacle {
    let width = config.obstacle_width.sample(rng);
    let height = config.obstacle_height.sample(rng);
    Obstacle {
        position: Point {
            x,
            y: config.ground_y() - config.obstacle_y_offset,
        },
        size: Size { width, height },
        speed,
    }
}

pub fn update(obstacle: &mut Obstacle) {
    obstacle.position.x -= obstacle.speed;
}

pub fn bounding_box(obstacle: &Obstacle) -> Rect {
    Rect::new(obstacle.position, obstacle.size)
}

/// Entirely past the left edge of the canvas
pub fn is_off_screen(obstacle: &Obstacle) -> bool {
    bounding_box(obstacle).right() < 0.0
}

pub fn draw(obstacle: &Obstacle, renderer: &dyn Renderer, color: &str) {
    renderer.fill_rect(&bounding_box(obstacle), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn obstacle_at(x: f32, width: f32) -> Obstacle {
        Obstacle {
            position: Point { x, y: 230.0 },
            size: Size {
                width,
                height: 50.0,
            },
            speed: 5.0,
        }
    }

    #[test]
    fn spawned_sizes_stay_in_range_with_a_fixed_top() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let obstacle = spawn(835.0, 5.0, &config, &mut rng);
            assert!((20.0..50.0).contains(&obstacle.size.width));
            assert!((30.0..80.0).contains(&obstacle.size.height));
            assert_relative_eq!(obstacle.position.y, 230.0);
            assert_relative_eq!(obstacle.position.x, 835.0);
        }
    }

    #[test]
    fn moves_left_by_its_own_speed() {
        let mut obstacle = obstacle_at(100.0, 30.0);
        obstacle.speed = 6.5;
        update(&mut obstacle);
        update(&mut obstacle);
        assert_relative_eq!(obstacle.position.x, 87.0);
    }

    #[test]
    fn off_screen_only_once_the_right_edge_passes_zero() {
        assert!(!is_off_screen(&obstacle_at(-29.0, 30.0)));
        assert!(!is_off_screen(&obstacle_at(-30.0, 30.0)));
        assert!(is_off_screen(&obstacle_at(-30.5, 30.0)));
    }
}
