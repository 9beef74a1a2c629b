//! Physical button control.
//!
//! [`Menu`] is the five-way switch state machine; [`gpio`] reads the
//! switch and turns presses into controller calls.

pub mod gpio;
pub mod menu;

// Re-export commonly used items
pub use gpio::{bcm_pin, spawn_button_loop, ButtonPad, DefaultButtonPad, BUTTON_POLL_INTERVAL};
pub use menu::{Button, Menu, MenuAction, MenuStage};
