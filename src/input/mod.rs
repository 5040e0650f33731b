//! Pointer and keyboard injection using enigo.
//!
//! The physical pointer and keyboard are singleton resources; the controller
//! is held `&mut` by the automation context, which serializes access by
//! construction.

use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::error::Result;

/// Pause between composite input steps so the OS registers each one.
const STEP_DELAY: Duration = Duration::from_millis(50);

pub struct InputController {
    enigo: Enigo,
}

impl InputController {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("failed to create input controller: {e:?}"))?;
        Ok(Self { enigo })
    }

    /// Move the pointer to absolute screen coordinates.
    pub fn move_mouse(&mut self, x: i32, y: i32) -> Result<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| anyhow!("failed to move mouse: {e:?}").into())
    }

    /// Move to the coordinates, settle, left-click.
    pub fn click_at(&mut self, x: i32, y: i32) -> Result<()> {
        self.move_mouse(x, y)?;
        thread::sleep(STEP_DELAY);
        self.button(Button::Left, Direction::Click)
    }

    pub fn double_click_at(&mut self, x: i32, y: i32) -> Result<()> {
        self.move_mouse(x, y)?;
        thread::sleep(STEP_DELAY);
        self.button(Button::Left, Direction::Click)?;
        thread::sleep(STEP_DELAY);
        self.button(Button::Left, Direction::Click)
    }

    pub fn right_click_at(&mut self, x: i32, y: i32) -> Result<()> {
        self.move_mouse(x, y)?;
        thread::sleep(STEP_DELAY);
        self.button(Button::Right, Direction::Click)
    }

    /// Press-move-release drag with evenly interpolated intermediate points
    /// spread over `duration`.
    pub fn drag(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        duration: Duration,
    ) -> Result<()> {
        self.move_mouse(from.0, from.1)?;
        thread::sleep(STEP_DELAY);
        self.button(Button::Left, Direction::Press)?;

        let steps = (duration.as_millis() / 10).clamp(1, 200) as i32;
        for i in 1..=steps {
            let x = from.0 + (to.0 - from.0) * i / steps;
            let y = from.1 + (to.1 - from.1) * i / steps;
            self.move_mouse(x, y)?;
            thread::sleep(duration / steps as u32);
        }

        self.button(Button::Left, Direction::Release)
    }

    pub fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        if dx != 0 {
            self.enigo
                .scroll(dx, Axis::Horizontal)
                .map_err(|e| anyhow!("failed to scroll: {e:?}"))?;
        }
        if dy != 0 {
            self.enigo
                .scroll(dy, Axis::Vertical)
                .map_err(|e| anyhow!("failed to scroll: {e:?}"))?;
        }
        Ok(())
    }

    pub fn type_text(&mut self, text: &str) -> Result<()> {
        self.enigo
            .text(text)
            .map_err(|e| anyhow!("failed to type text: {e:?}").into())
    }

    /// Press a key given by name, e.g. `"enter"`, `"esc"`, `"f5"`, `"a"`.
    pub fn press_key(&mut self, name: &str) -> Result<()> {
        let key = parse_key(name)?;
        self.key(key, Direction::Click)
    }

    /// Press a modifier combination around a key, e.g. `("ctrl", "alt")` + `"del"`.
    /// Modifiers are released in reverse order.
    pub fn hotkey(&mut self, modifiers: &[&str], name: &str) -> Result<()> {
        let mods: Vec<Key> = modifiers
            .iter()
            .map(|m| parse_key(m))
            .collect::<Result<_>>()?;
        let key = parse_key(name)?;

        for m in &mods {
            self.key(*m, Direction::Press)?;
        }
        thread::sleep(Duration::from_millis(20));
        self.key(key, Direction::Click)?;
        thread::sleep(Duration::from_millis(20));
        for m in mods.iter().rev() {
            self.key(*m, Direction::Release)?;
        }
        Ok(())
    }

    fn button(&mut self, button: Button, direction: Direction) -> Result<()> {
        self.enigo
            .button(button, direction)
            .map_err(|e| anyhow!("mouse button failed: {e:?}").into())
    }

    fn key(&mut self, key: Key, direction: Direction) -> Result<()> {
        self.enigo
            .key(key, direction)
            .map_err(|e| anyhow!("key press failed: {e:?}").into())
    }
}

/// Map a key name to an enigo key. Single characters type themselves;
/// everything else goes through the named table.
pub fn parse_key(name: &str) -> Result<Key> {
    let lower = name.to_lowercase();

    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Key::Unicode(c));
    }

    let key = match lower.as_str() {
        "ctrl" | "control" => Key::Control,
        "alt" | "option" => Key::Alt,
        "shift" => Key::Shift,
        "meta" | "win" | "windows" | "cmd" | "command" | "super" => Key::Meta,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => return Err(anyhow!("unknown key name: {other:?}").into()),
    };

    Ok(key)
}
