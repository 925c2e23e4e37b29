pub mod coefficients;
pub mod dc_blocker;
pub mod delay_line;
pub mod limiter;
pub mod pan;
pub mod saturation;
pub mod smoother;
pub mod utils;

pub use coefficients::Coefficients;
pub use dc_blocker::DcBlocker;
pub use delay_line::{LaneDelayLine, StereoDelayLine, RING_CAPACITY};
pub use limiter::LookaheadLimiter;
pub use pan::equal_power_pan;
pub use saturation::Saturation;
pub use smoother::OnePole;
