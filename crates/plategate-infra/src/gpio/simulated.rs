//! Bench stand-ins for the relay and motion sensor

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use plategate_domain::hardware::{MotionSensor, Relay};
use plategate_types::HardwareError;

/// Relay that only logs; remembers every state it was driven to
#[derive(Debug, Default)]
pub struct SimulatedRelay {
    asserted: bool,
    history: Vec<bool>,
}

impl SimulatedRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    pub fn history(&self) -> &[bool] {
        &self.history
    }
}

impl Relay for SimulatedRelay {
    fn set(&mut self, asserted: bool) -> Result<(), HardwareError> {
        if asserted != self.asserted {
            tracing::info!(
                "[simulated] barrier {}",
                if asserted { "OPEN" } else { "CLOSED" }
            );
        }
        self.asserted = asserted;
        self.history.push(asserted);
        Ok(())
    }
}

/// Motion sensor triggered once per line read from a reader (stdin by default)
pub struct SimulatedMotionSensor {
    events: Receiver<()>,
    closed: bool,
}

impl SimulatedMotionSensor {
    /// Trigger on every Enter pressed in the terminal
    pub fn from_stdin() -> Self {
        tracing::info!("[simulated] press Enter to simulate a vehicle");
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                if line.is_err() || tx.send(()).is_err() {
                    break;
                }
            }
        });
        Self {
            events: rx,
            closed: false,
        }
    }
}

impl MotionSensor for SimulatedMotionSensor {
    fn is_triggered(&mut self) -> Result<bool, HardwareError> {
        match self.events.try_recv() {
            Ok(()) => Ok(true),
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => {
                if !self.closed {
                    tracing::info!("[simulated] input closed, no further triggers");
                    self.closed = true;
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn wait_for_trigger(sensor: &mut SimulatedMotionSensor) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if sensor.is_triggered().unwrap() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_relay_records_states() {
        let mut relay = SimulatedRelay::new();
        relay.set(true).unwrap();
        assert!(relay.is_asserted());
        relay.release().unwrap();
        assert!(!relay.is_asserted());
        assert_eq!(relay.history(), &[true, false]);
    }

    #[test]
    fn test_one_trigger_per_line() {
        let mut sensor = SimulatedMotionSensor::from_reader(Cursor::new("\n\n"));
        assert!(wait_for_trigger(&mut sensor));
        assert!(wait_for_trigger(&mut sensor));
        assert!(!wait_for_trigger(&mut sensor));
    }

    #[test]
    fn test_empty_input_never_triggers() {
        let mut sensor = SimulatedMotionSensor::from_reader(Cursor::new(""));
        thread::sleep(Duration::from_millis(20));
        assert!(!sensor.is_triggered().unwrap());
        assert!(!sensor.is_triggered().unwrap());
    }
}
