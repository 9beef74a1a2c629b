//! Five-way button menu for configuring and starting a time-lapse.

use crate::timelapse::{TimelapseConfig, TimelapseStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval shown when the menu first comes up, in seconds.
pub const DEFAULT_MENU_INTERVAL_SECS: u32 = 10;

/// Image count shown when the menu first comes up.
pub const DEFAULT_MENU_COUNT: u32 = 4;

/// Physical buttons on the camera board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Select,
}

impl Button {
    pub const ALL: [Button; 5] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Select,
    ];
}

/// Which screen the menu is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuStage {
    /// Editing interval and image count
    #[default]
    Configure,
    /// Waiting for a second Select before starting
    Confirm,
}

/// What the caller should do after a button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Nothing changed
    None,
    /// The menu changed and the display should be redrawn
    Redraw,
    /// Start a run with this configuration
    Start(TimelapseConfig),
    /// Stop the active run
    Stop,
}

/// Button menu state. Pure: it never touches the controller itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    interval_secs: u32,
    total_count: u32,
    stage: MenuStage,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new(DEFAULT_MENU_INTERVAL_SECS, DEFAULT_MENU_COUNT)
    }
}

impl Menu {
    pub fn new(interval_secs: u32, total_count: u32) -> Self {
        Self {
            interval_secs,
            total_count: total_count.max(1),
            stage: MenuStage::Configure,
        }
    }

    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    pub fn stage(&self) -> MenuStage {
        self.stage
    }

    /// Configuration that Select-Select would start.
    pub fn config(&self) -> TimelapseConfig {
        TimelapseConfig::new(
            Duration::from_secs(u64::from(self.interval_secs)),
            self.total_count,
        )
    }

    /// Handle one press. `running` is whether a run is currently active.
    pub fn press(&mut self, button: Button, running: bool) -> MenuAction {
        if running {
            self.stage = MenuStage::Configure;
            return match button {
                Button::Select => MenuAction::Stop,
                _ => MenuAction::None,
            };
        }

        match (self.stage, button) {
            (MenuStage::Confirm, Button::Select) => {
                self.stage = MenuStage::Configure;
                MenuAction::Start(self.config())
            }
            (MenuStage::Confirm, _) => {
                self.stage = MenuStage::Configure;
                MenuAction::Redraw
            }
            (MenuStage::Configure, Button::Select) => {
                self.stage = MenuStage::Confirm;
                MenuAction::Redraw
            }
            (MenuStage::Configure, Button::Up) => {
                self.total_count = self.total_count.saturating_add(1);
                MenuAction::Redraw
            }
            (MenuStage::Configure, Button::Down) => {
                self.total_count = self.total_count.saturating_sub(1).max(1);
                MenuAction::Redraw
            }
            (MenuStage::Configure, Button::Right) => {
                self.interval_secs = self.interval_secs.saturating_add(1);
                MenuAction::Redraw
            }
            (MenuStage::Configure, Button::Left) => {
                self.interval_secs = self.interval_secs.saturating_sub(1);
                MenuAction::Redraw
            }
        }
    }

    /// Text lines for a small status display.
    pub fn display_lines(&self, status: &TimelapseStatus) -> Vec<String> {
        if status.running {
            return vec![
                format!("next {:04}", status.time_to_next_capture.max(0.0).ceil() as u64),
                format!("img {:04}/{:04}", status.images_taken, status.total_count),
                format!("left {}", format_hms(status.time_remaining_total)),
            ];
        }

        let mut lines = vec![
            format!("d={:04}", self.interval_secs),
            format!("N={:04}", self.total_count),
            format!("T={}", format_hms(self.config().planned_duration().as_secs_f64())),
        ];
        match self.stage {
            MenuStage::Confirm => lines.push("OK?".to_string()),
            MenuStage::Configure if status.state.is_terminal() => lines.push(status.summary()),
            MenuStage::Configure => {}
        }
        lines
    }
}

fn format_hms(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timelapse::RunState;

    #[test]
    fn test_adjusting_values() {
        let mut menu = Menu::default();
        assert_eq!(menu.press(Button::Up, false), MenuAction::Redraw);
        assert_eq!(menu.press(Button::Right, false), MenuAction::Redraw);
        assert_eq!(menu.total_count(), 5);
        assert_eq!(menu.interval_secs(), 11);

        for _ in 0..20 {
            menu.press(Button::Down, false);
            menu.press(Button::Left, false);
        }
        assert_eq!(menu.total_count(), 1);
        assert_eq!(menu.interval_secs(), 0);
    }

    #[test]
    fn test_select_twice_starts() {
        let mut menu = Menu::new(15, 600);
        assert_eq!(menu.press(Button::Select, false), MenuAction::Redraw);
        assert_eq!(menu.stage(), MenuStage::Confirm);

        let action = menu.press(Button::Select, false);
        assert_eq!(
            action,
            MenuAction::Start(TimelapseConfig::new(Duration::from_secs(15), 600))
        );
        assert_eq!(menu.stage(), MenuStage::Configure);
    }

    #[test]
    fn test_other_button_cancels_confirm() {
        let mut menu = Menu::default();
        menu.press(Button::Select, false);
        assert_eq!(menu.press(Button::Up, false), MenuAction::Redraw);
        assert_eq!(menu.stage(), MenuStage::Configure);
        // the cancelling press is not applied
        assert_eq!(menu.total_count(), DEFAULT_MENU_COUNT);
    }

    #[test]
    fn test_select_while_running_stops() {
        let mut menu = Menu::default();
        assert_eq!(menu.press(Button::Select, true), MenuAction::Stop);
        assert_eq!(menu.press(Button::Up, true), MenuAction::None);
        assert_eq!(menu.total_count(), DEFAULT_MENU_COUNT);
    }

    #[test]
    fn test_display_lines() {
        let mut menu = Menu::new(10, 4);
        let idle = TimelapseStatus::idle();
        assert_eq!(
            menu.display_lines(&idle),
            vec!["d=0010", "N=0004", "T=00:00:30"]
        );

        menu.press(Button::Select, false);
        assert_eq!(menu.display_lines(&idle).last().unwrap(), "OK?");

        let running = TimelapseStatus {
            state: RunState::Running,
            running: true,
            images_taken: 2,
            total_count: 4,
            time_to_next_capture: 7.4,
            time_remaining_total: 27.4,
            ..Default::default()
        };
        assert_eq!(
            menu.display_lines(&running),
            vec!["next 0008", "img 0002/0004", "left 00:00:27"]
        );
    }
}
