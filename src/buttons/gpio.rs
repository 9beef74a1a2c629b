//! Button pad input and the polling loop that feeds the menu.
//!
//! The rppal backed pad is feature-gated so the crate builds on hosts
//! without GPIO; those get a pad that never reports a press.

use crate::buttons::menu::{Button, Menu, MenuAction};
use crate::error::Result;
use crate::timelapse::TimelapseController;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Polling period, doubling as a simple debounce.
pub const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// BCM pin numbers of the five-way switch.
pub const PIN_UP: u8 = 19;
pub const PIN_DOWN: u8 = 16;
pub const PIN_LEFT: u8 = 26;
pub const PIN_RIGHT: u8 = 20;
pub const PIN_SELECT: u8 = 21;

/// BCM pin a button is wired to.
pub fn bcm_pin(button: Button) -> u8 {
    match button {
        Button::Up => PIN_UP,
        Button::Down => PIN_DOWN,
        Button::Left => PIN_LEFT,
        Button::Right => PIN_RIGHT,
        Button::Select => PIN_SELECT,
    }
}

/// Source of button states.
pub trait ButtonPad: Send {
    /// Buttons currently held down.
    fn held(&mut self) -> Result<Vec<Button>>;
}

#[cfg(feature = "gpio")]
mod raspberry_pi {
    use super::*;
    use crate::error::TimelapseError;
    use rppal::gpio::{Gpio, InputPin};

    /// Five-way switch wired to GPIO with pull-ups; pressed reads low.
    pub struct GpioButtonPad {
        pins: Vec<(Button, InputPin)>,
    }

    impl GpioButtonPad {
        pub fn new() -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| {
                TimelapseError::gpio_error(format!("Failed to initialize GPIO: {}", e))
            })?;

            let mut pins = Vec::with_capacity(Button::ALL.len());
            for button in Button::ALL {
                let pin = bcm_pin(button);
                let input = gpio
                    .get(pin)
                    .map_err(|e| {
                        TimelapseError::gpio_error(format!("Failed to access pin {}: {}", pin, e))
                    })?
                    .into_input_pullup();
                pins.push((button, input));
            }

            Ok(Self { pins })
        }
    }

    impl ButtonPad for GpioButtonPad {
        fn held(&mut self) -> Result<Vec<Button>> {
            Ok(self
                .pins
                .iter()
                .filter(|(_, pin)| pin.is_low())
                .map(|(button, _)| *button)
                .collect())
        }
    }
}

#[cfg(not(feature = "gpio"))]
mod mock {
    use super::*;

    /// Pad for systems without GPIO support.
    pub struct MockButtonPad;

    impl MockButtonPad {
        pub fn new() -> Result<Self> {
            Ok(Self)
        }
    }

    impl ButtonPad for MockButtonPad {
        fn held(&mut self) -> Result<Vec<Button>> {
            Ok(Vec::new())
        }
    }
}

// Re-export the appropriate pad
#[cfg(feature = "gpio")]
pub use raspberry_pi::GpioButtonPad as DefaultButtonPad;

#[cfg(not(feature = "gpio"))]
pub use mock::MockButtonPad as DefaultButtonPad;

/// Poll `pad` and drive `controller` from the button menu until aborted.
pub fn spawn_button_loop<P>(
    mut pad: P,
    controller: Arc<TimelapseController>,
    period: Duration,
) -> JoinHandle<()>
where
    P: ButtonPad + 'static,
{
    tokio::spawn(async move {
        let mut menu = Menu::default();
        let mut previous: Vec<Button> = Vec::new();
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Button menu ready");

        loop {
            ticks.tick().await;
            let held = match pad.held() {
                Ok(held) => held,
                Err(e) => {
                    warn!("Failed to read buttons: {}", e);
                    continue;
                }
            };

            for button in held.iter().filter(|b| !previous.contains(b)) {
                apply_press(&mut menu, *button, &controller);
            }
            previous = held;
        }
    })
}

fn apply_press(menu: &mut Menu, button: Button, controller: &TimelapseController) {
    match menu.press(button, controller.is_running()) {
        MenuAction::None => {}
        MenuAction::Redraw => {
            debug!("{}", menu.display_lines(&controller.status()).join(" | "));
        }
        MenuAction::Start(config) => match controller.start(config) {
            Ok(handle) => info!("Time-lapse {} started from buttons", handle.run_id()),
            Err(e) => warn!("Could not start time-lapse: {}", e),
        },
        MenuAction::Stop => controller.stop(),
    }
}
