use std::cell::Cell;
use std::fmt::Debug;

/// Time source of a simulation run.
pub trait SystemSimulator: Debug {
    fn get_current_time_in_s(&self) -> f32;

    fn get_current_tick(&self) -> u64;
}

/// Discrete clock advancing in fixed steps of `tick_length` seconds.
#[derive(Debug)]
pub struct SimulationClock {
    tick: Cell<u64>,
    tick_length: f32,
}

impl SimulationClock {
    pub fn new(tick_length: f32) -> SimulationClock {
        SimulationClock { tick: Cell::new(0), tick_length }
    }

    pub fn tick_length(&self) -> f32 {
        self.tick_length
    }

    /// Moves the clock one tick forward and returns the new tick.
    pub fn advance(&self) -> u64 {
        let tick = self.tick.get() + 1;
        self.tick.set(tick);
        tick
    }
}

impl SystemSimulator for SimulationClock {
    fn get_current_time_in_s(&self) -> f32 {
        self.tick.get() as f32 * self.tick_length
    }

    fn get_current_tick(&self) -> u64 {
        self.tick.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_follows_the_tick_count() {
        let clock = SimulationClock::new(0.25);

        clock.advance();
        clock.advance();

        assert_eq!(clock.get_current_tick(), 2);
        assert!((clock.get_current_time_in_s() - 0.5).abs() < f32::EPSILON);
    }
}
