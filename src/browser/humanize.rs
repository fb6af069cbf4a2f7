//! Human-like cursor and scroll activity
//!
//! The plan is drawn up front so no random generator is held across an
//! await point. Executing it is best-effort: every failed step is logged at
//! debug level and skipped.

use crate::config::Viewport;
use chromiumoxide::layout::Point;
use chromiumoxide::Page;
use rand::Rng;
use std::time::Duration;

/// One step of simulated activity
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Glide the cursor to `to` in `steps` intermediate moves
    Move { to: (f64, f64), steps: u32 },
    /// Run a scroll expression in the page
    Scroll(&'static str),
    Pause(Duration),
}

/// Builds a random gesture plan for a window of the given size
///
/// 1–3 cursor glides, 1–2 partial scrolls, then two deep scrolls that
/// trigger lazily loaded content.
pub fn plan(viewport: Viewport) -> Vec<Gesture> {
    let mut rng = rand::thread_rng();
    let mut gestures = Vec::new();

    let max_x = f64::from(viewport.width.clamp(20, 1000));
    let max_y = f64::from(viewport.height.clamp(20, 800));

    for _ in 0..rng.gen_range(1..=3) {
        gestures.push(Gesture::Move {
            to: (rng.gen_range(10.0..max_x), rng.gen_range(10.0..max_y)),
            steps: rng.gen_range(8..=25),
        });
        gestures.push(Gesture::Pause(Duration::from_millis(rng.gen_range(0..120))));
    }

    for _ in 0..rng.gen_range(1..=2) {
        gestures.push(Gesture::Scroll("window.scrollBy(0, window.innerHeight / 3)"));
        gestures.push(Gesture::Pause(Duration::from_millis(rng.gen_range(0..180))));
    }

    gestures.push(Gesture::Scroll(
        "window.scrollBy(0, document.body.scrollHeight / 2)",
    ));
    gestures.push(Gesture::Pause(Duration::from_millis(300)));
    gestures.push(Gesture::Scroll("window.scrollBy(0, document.body.scrollHeight)"));
    gestures.push(Gesture::Pause(Duration::from_millis(500)));

    gestures
}

/// Plays a gesture plan on a page, ignoring failures
pub async fn perform(page: &Page, gestures: &[Gesture]) {
    let mut cursor = (0.0_f64, 0.0_f64);

    for gesture in gestures {
        match gesture {
            Gesture::Move { to, steps } => {
                let steps = (*steps).max(1);
                for i in 1..=steps {
                    let t = f64::from(i) / f64::from(steps);
                    let point = Point::new(
                        cursor.0 + (to.0 - cursor.0) * t,
                        cursor.1 + (to.1 - cursor.1) * t,
                    );
                    if let Err(e) = page.move_mouse(point).await {
                        tracing::debug!("Mouse move failed: {}", e);
                        break;
                    }
                }
                cursor = *to;
            }
            Gesture::Scroll(expression) => {
                if let Err(e) = page.evaluate(*expression).await {
                    tracing::debug!("Scroll failed: {}", e);
                }
            }
            Gesture::Pause(duration) => tokio::time::sleep(*duration).await,
        }
    }
}
