/// Single-axis PID loop with output clamped to `[-output_limit, output_limit]`.
///
/// The integral term is clamped to the output limits (anti-windup) and the
/// derivative acts on the measurement rather than the error, so a setpoint
/// change does not produce a derivative kick.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    output_limit: f32,
    integral: f32,
    last_input: Option<f32>,
    last_output: Option<f32>,
}

impl Pid {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32, output_limit: f32) -> Self {
        Pid {
            kp,
            ki,
            kd,
            setpoint,
            output_limit: output_limit.abs(),
            integral: 0.,
            last_input: None,
            last_output: None,
        }
    }

    /// Compute a new output for `input`, `dt` seconds after the previous update
    pub fn update(&mut self, input: f32, dt: f32) -> f32 {
        let error = self.setpoint - input;
        let d_input = input - self.last_input.unwrap_or(input);

        let proportional = self.kp * error;
        self.integral = self.clamp(self.integral + self.ki * error * dt);
        let derivative = if dt > 0. {
            -self.kd * d_input / dt
        } else {
            0.
        };

        let output = self.clamp(proportional + self.integral + derivative);
        self.last_input = Some(input);
        self.last_output = Some(output);
        output
    }

    /// Clear integral and derivative history
    pub fn reset(&mut self) {
        self.integral = 0.;
        self.last_input = None;
        self.last_output = None;
    }

    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn last_output(&self) -> Option<f32> {
        self.last_output
    }

    fn clamp(&self, value: f32) -> f32 {
        value.clamp(-self.output_limit, self.output_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_only() {
        let mut pid = Pid::new(0.5, 0., 0., 100., 30.);
        assert_eq!(pid.update(80., 1.), 10.);
        assert_eq!(pid.update(120., 1.), -10.);
    }

    #[test]
    fn test_output_is_clamped() {
        let mut pid = Pid::new(1.0, 0., 0., 0., 30.);
        assert_eq!(pid.update(-500., 1.), 30.);
        assert_eq!(pid.update(500., 1.), -30.);
    }

    #[test]
    fn test_negative_limit_is_treated_as_magnitude() {
        let mut pid = Pid::new(1.0, 0., 0., 0., -20.);
        assert_eq!(pid.update(-500., 1.), 20.);
        assert_eq!(pid.update(500., 1.), -20.);
    }

    #[test]
    fn test_integral_accumulates_and_is_clamped() {
        let mut pid = Pid::new(0., 1.0, 0., 10., 30.);
        assert_eq!(pid.update(0., 1.), 10.);
        assert_eq!(pid.update(0., 1.), 20.);
        assert_eq!(pid.update(0., 1.), 30.);
        assert_eq!(pid.update(0., 1.), 30.);
        // Integral was held at the limit, so it unwinds immediately
        assert_eq!(pid.update(20., 1.), 20.);
    }

    #[test]
    fn test_derivative_on_measurement() {
        let mut pid = Pid::new(0., 0., 2.0, 0., 30.);
        // No history yet, so no derivative term
        assert_eq!(pid.update(5., 1.), 0.);
        assert_eq!(pid.update(8., 1.), -6.);
        // Setpoint change alone causes no kick
        pid.set_setpoint(100.);
        assert_eq!(pid.update(8., 1.), 0.);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut pid = Pid::new(0., 1.0, 1.0, 10., 30.);
        pid.update(0., 1.);
        pid.update(4., 1.);
        assert!(pid.last_output().is_some());

        pid.reset();
        assert_eq!(pid.last_output(), None);
        // Fresh integral and no derivative from the stale input
        assert_eq!(pid.update(4., 1.), 6.);
    }
}
