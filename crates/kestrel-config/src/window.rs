use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{DEFAULT_BACKGROUND, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::environment::Platform;

/// Standard menu item roles understood by shell runtimes.
#[derive(
    Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MenuRole {
    /// Close the focused window.
    Close,
    /// Quit the application.
    Quit,
    /// Platform edit menu container.
    EditMenu,
    /// Undo.
    Undo,
    /// Redo.
    Redo,
    /// Cut.
    Cut,
    /// Copy.
    Copy,
    /// Paste.
    Paste,
    /// Delete.
    Delete,
    /// Select all.
    SelectAll,
}

/// One entry of the application menu.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MenuSpec {
    /// Display label; runtimes supply a localised default when absent.
    pub label: Option<String>,
    /// Standard role, if any.
    pub role: Option<MenuRole>,
    /// Nested entries.
    pub submenu: Vec<MenuSpec>,
}

impl MenuSpec {
    /// Builds a leaf item with a standard role.
    #[must_use]
    pub fn role(role: MenuRole) -> Self {
        Self {
            label: None,
            role: Some(role),
            submenu: Vec::new(),
        }
    }

    /// Overrides the display label.
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches nested entries.
    #[must_use]
    pub fn with_submenu(mut self, submenu: Vec<MenuSpec>) -> Self {
        self.submenu = submenu;
        self
    }

    fn file_menu() -> Self {
        Self {
            label: Some("File".to_owned()),
            role: None,
            submenu: vec![
                Self::role(MenuRole::Close),
                Self::role(MenuRole::Quit).labelled("Quit Kestrel"),
            ],
        }
    }

    fn edit_menu() -> Self {
        Self::role(MenuRole::EditMenu).with_submenu(
            [
                MenuRole::Undo,
                MenuRole::Redo,
                MenuRole::Cut,
                MenuRole::Copy,
                MenuRole::Paste,
                MenuRole::Delete,
                MenuRole::SelectAll,
            ]
            .into_iter()
            .map(Self::role)
            .collect(),
        )
    }
}

/// Window size in logical pixels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct Geometry {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Description of the shell's main window.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WindowSpec {
    /// Resource loaded when the window opens.
    pub homepage: String,
    /// Initial size.
    pub geometry: Geometry,
    /// Background colour shown before the homepage renders.
    pub background: String,
    /// Developer tools availability.
    pub dev_tools: bool,
    /// Application menu.
    pub menu: Vec<MenuSpec>,
    /// Icon used on macOS.
    pub icon_darwin: Utf8PathBuf,
    /// Icon used elsewhere.
    pub icon_default: Utf8PathBuf,
}

impl WindowSpec {
    /// Builds the default window loading `homepage`.
    #[must_use]
    pub fn with_homepage(homepage: impl Into<String>) -> Self {
        Self {
            homepage: homepage.into(),
            geometry: Geometry::default(),
            background: DEFAULT_BACKGROUND.to_owned(),
            dev_tools: true,
            menu: vec![MenuSpec::file_menu(), MenuSpec::edit_menu()],
            icon_darwin: Utf8PathBuf::from("resources/icon.icns"),
            icon_default: Utf8PathBuf::from("resources/icon.png"),
        }
    }

    /// Icon resource for `platform`.
    #[must_use]
    pub fn icon_for(&self, platform: Platform) -> &Utf8Path {
        match platform {
            Platform::MacOs => self.icon_darwin.as_path(),
            Platform::Linux | Platform::Windows | Platform::Other => self.icon_default.as_path(),
        }
    }
}
