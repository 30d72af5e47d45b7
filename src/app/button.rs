//! Push button trigger.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;

/// Sampling period of [`ButtonTrigger::wait_for_press`].
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Fires once for every press-and-release of a button.
///
/// The button counts as pressed while its pin reads high, or low after
/// [`ButtonTrigger::active_low`].
pub struct ButtonTrigger<P: InputPin> {
    pin: P,
    active_low: bool,
    held: bool,
}

impl<P: InputPin> ButtonTrigger<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
            held: false,
        }
    }

    pub fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    /// Sample the pin once. Returns `true` on the release that completes a
    /// press.
    pub fn poll(&mut self) -> Result<bool, P::Error> {
        let down = if self.active_low {
            self.pin.is_low()?
        } else {
            self.pin.is_high()?
        };

        let released = self.held && !down;
        self.held = down;
        Ok(released)
    }

    pub async fn wait_for_press(&mut self) -> Result<(), P::Error> {
        while !self.poll()? {
            Timer::after(POLL_INTERVAL).await;
        }
        Ok(())
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}
