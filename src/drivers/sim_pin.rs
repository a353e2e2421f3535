//! In-memory GPIO pin for host builds.
//!
//! Clones share the same level, so a test (or the host simulation) can
//! keep a tap on a pin whose driver owns another clone.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[derive(Debug, Clone)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
}

impl SimPin {
    /// New pin at the given level (`true` = HIGH).
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(high)),
        }
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    /// Force the level from outside (e.g. simulate a button press).
    pub fn set_level(&self, high: bool) {
        self.level.set(high);
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}
