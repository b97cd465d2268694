//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use pixelgraph::image::{Color, PixelBuffer};
use std::time::{Duration, Instant};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Poll `condition` until it holds or the test timeout expires
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + test_timeout();
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert two colors are approximately equal channel by channel
pub fn assert_color_eq(a: Color, b: Color, epsilon: f32) {
    let close = (a.r - b.r).abs() < epsilon
        && (a.g - b.g).abs() < epsilon
        && (a.b - b.b).abs() < epsilon
        && (a.a - b.a).abs() < epsilon;
    assert!(
        close,
        "Expected {:?} to be approximately equal to {:?} (epsilon: {})",
        a, b, epsilon
    );
}

/// Assert every pixel of `image` equals `color`
pub fn assert_uniform(image: &PixelBuffer, color: Color) {
    for (i, &p) in image.pixels().iter().enumerate() {
        assert_eq!(p, color, "pixel {} of {}x{}", i, image.width(), image.height());
    }
}
