pub mod servo_pwm;

pub use servo_pwm::ServoPwm;
