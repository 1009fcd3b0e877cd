/// Keyboard-driven tweak panel drawn over the scene
use crossterm::event::KeyCode;
use perpetual_core::{ControlKind, ParamError, ParameterStore, Rgba};

use crate::renderer::AsciiRenderer;

const PANEL_FG: Rgba = Rgba::rgb(230, 230, 230);
const PANEL_BG: Rgba = Rgba::rgb(30, 30, 36);
const FOLDER_FG: Rgba = Rgba::rgb(250, 200, 80);
const SELECTED_BG: Rgba = Rgba::rgb(70, 90, 140);
const PANEL_WIDTH: usize = 34;

/// Selection and visibility of the panel. Values live in the store.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    selected: usize,
    hidden: bool,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Handle a panel key. Returns `Ok(false)` for keys the panel does not
    /// use.
    pub fn handle_key(&mut self, code: KeyCode, store: &mut ParameterStore) -> Result<bool, ParamError> {
        let count = store.controls().len();
        if count == 0 {
            return Ok(false);
        }
        self.selected = self.selected.min(count - 1);
        let path = store.controls()[self.selected].path.clone();

        match code {
            KeyCode::Tab => self.selected = (self.selected + 1) % count,
            KeyCode::BackTab => self.selected = (self.selected + count - 1) % count,
            KeyCode::Char('h') => self.hidden = !self.hidden,
            KeyCode::Char(']') => {
                store.nudge(&path, 1.0)?;
            }
            KeyCode::Char('[') => {
                store.nudge(&path, -1.0)?;
            }
            KeyCode::Char(' ') => match store.controls()[self.selected].kind {
                ControlKind::Bool => {
                    store.toggle(&path)?;
                }
                _ => return Ok(false),
            },
            KeyCode::Char('r') => {
                store.reset(&path)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Draw the panel in the top-right corner, grouped by folder.
    pub fn render(&self, store: &ParameterStore, renderer: &mut AsciiRenderer) {
        if self.hidden || renderer.width() < PANEL_WIDTH {
            return;
        }
        let x = renderer.width() - PANEL_WIDTH;
        let mut y = 1;
        let mut folder = "";

        for (index, control) in store.controls().iter().enumerate() {
            if control.folder() != folder {
                folder = control.folder();
                renderer.print_text(x, y, &format!("{folder:<width$}", width = PANEL_WIDTH), FOLDER_FG, Some(PANEL_BG));
                y += 1;
            }

            let line = format!(
                "{marker} {key:<20}{value:>11}",
                marker = if index == self.selected { '>' } else { ' ' },
                key = control.key(),
                value = truncate(&control.value.to_string(), 11),
            );
            let bg = if index == self.selected { SELECTED_BG } else { PANEL_BG };
            renderer.print_text(x, y, &line, PANEL_FG, Some(bg));

            if let perpetual_core::ParamValue::Color(color) = control.value {
                // Swatch in the last column.
                renderer.print_text(x + PANEL_WIDTH - 1, y, " ", PANEL_FG, Some(color.over(&Rgba::BLACK)));
            }
            y += 1;
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('~');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perpetual_core::params::paths;

    fn select(panel: &mut Panel, store: &mut ParameterStore, path: &str) {
        let index = store.controls().iter().position(|c| c.path == path).unwrap();
        while panel.selected() != index {
            panel.handle_key(KeyCode::Tab, store).unwrap();
        }
    }

    #[test]
    fn tab_wraps_around() {
        let mut store = ParameterStore::demo();
        let mut panel = Panel::new();
        panel.handle_key(KeyCode::BackTab, &mut store).unwrap();
        assert_eq!(panel.selected(), store.controls().len() - 1);
        panel.handle_key(KeyCode::Tab, &mut store).unwrap();
        assert_eq!(panel.selected(), 0);
    }

    #[test]
    fn brackets_nudge_selected_number() {
        let mut store = ParameterStore::demo();
        let mut panel = Panel::new();
        select(&mut panel, &mut store, paths::SPEED);
        panel.handle_key(KeyCode::Char(']'), &mut store).unwrap();
        assert!((store.number(paths::SPEED).unwrap() - 0.21).abs() < 1e-9);
        panel.handle_key(KeyCode::Char('r'), &mut store).unwrap();
        assert_eq!(store.number(paths::SPEED).unwrap(), 0.2);
    }

    #[test]
    fn space_toggles_booleans_only() {
        let mut store = ParameterStore::demo();
        let mut panel = Panel::new();
        select(&mut panel, &mut store, paths::DEBUG);
        assert!(panel.handle_key(KeyCode::Char(' '), &mut store).unwrap());
        assert!(store.boolean(paths::DEBUG).unwrap());

        select(&mut panel, &mut store, paths::RADIUS);
        assert!(!panel.handle_key(KeyCode::Char(' '), &mut store).unwrap());
    }

    #[test]
    fn nudging_a_boolean_is_an_error() {
        let mut store = ParameterStore::demo();
        let mut panel = Panel::new();
        select(&mut panel, &mut store, paths::DEBUG);
        assert!(panel.handle_key(KeyCode::Char(']'), &mut store).is_err());
    }

    #[test]
    fn renders_folders_and_selection() {
        let store = ParameterStore::demo();
        let panel = Panel::new();
        let mut renderer = AsciiRenderer::new(80, 24);
        panel.render(&store, &mut renderer);
        let x = 80 - PANEL_WIDTH;
        assert_eq!(renderer.cell(x, 1).unwrap().ch, 'S');
        assert_eq!(renderer.cell(x, 2).unwrap().ch, '>');
        assert_eq!(renderer.cell(x, 2).unwrap().bg, SELECTED_BG);
    }

    #[test]
    fn hidden_panel_draws_nothing() {
        let mut store = ParameterStore::demo();
        let mut panel = Panel::new();
        panel.handle_key(KeyCode::Char('h'), &mut store).unwrap();
        assert!(panel.is_hidden());
        let mut renderer = AsciiRenderer::new(80, 24);
        panel.render(&store, &mut renderer);
        assert_eq!(renderer.cell(80 - PANEL_WIDTH, 1).unwrap().ch, ' ');
    }

    #[test]
    fn truncates_long_values() {
        assert_eq!(truncate("rgba(255, 255, 255, 1)", 11), "rgba(255, ~");
        assert_eq!(truncate("0.2", 11), "0.2");
    }
}
