//! State definitions
//!
//! Main-screen UI state is one variant rather than independent flags, so
//! "editing with nothing selected" cannot be expressed.

use super::session::MainSession;

/// Top-level device state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Profile list visible
    Menu(MenuState),
    /// Operating a selected profile
    Main(MainSession),
}

impl DeviceState {
    pub fn is_menu(&self) -> bool {
        matches!(self, DeviceState::Menu(_))
    }

    pub fn is_main(&self) -> bool {
        matches!(self, DeviceState::Main(_))
    }
}

/// Profile list with a highlighted entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuState {
    /// Position in the profile list
    pub highlighted: usize,
}

impl MenuState {
    /// Next entry, wrapping to the first
    pub fn next(self, len: usize) -> Self {
        if len == 0 {
            return self;
        }
        Self {
            highlighted: (self.highlighted + 1) % len,
        }
    }

    /// Previous entry, wrapping to the last
    pub fn prev(self, len: usize) -> Self {
        if len == 0 {
            return self;
        }
        Self {
            highlighted: (self.highlighted + len - 1) % len,
        }
    }
}

/// Editable target field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Voltage,
    Current,
}

/// Main-screen selection cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cursor {
    #[default]
    None,
    Voltage,
    Current,
}

impl Cursor {
    /// None -> Voltage -> Current -> None
    pub fn next(self) -> Self {
        match self {
            Cursor::None => Cursor::Voltage,
            Cursor::Voltage => Cursor::Current,
            Cursor::Current => Cursor::None,
        }
    }

    /// None -> Current -> Voltage -> None
    pub fn prev(self) -> Self {
        match self {
            Cursor::None => Cursor::Current,
            Cursor::Voltage => Cursor::None,
            Cursor::Current => Cursor::Voltage,
        }
    }

    /// Field under the cursor
    pub fn field(self) -> Option<Field> {
        match self {
            Cursor::None => None,
            Cursor::Voltage => Some(Field::Voltage),
            Cursor::Current => Some(Field::Current),
        }
    }
}

impl From<Field> for Cursor {
    fn from(field: Field) -> Self {
        match field {
            Field::Voltage => Cursor::Voltage,
            Field::Current => Cursor::Current,
        }
    }
}

/// Main-screen interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MainMode {
    /// Rotation moves the cursor
    Browsing(Cursor),
    /// Rotation adjusts the field's pending target
    Editing(Field),
}

impl Default for MainMode {
    fn default() -> Self {
        MainMode::Browsing(Cursor::None)
    }
}

impl MainMode {
    pub fn cursor(self) -> Cursor {
        match self {
            MainMode::Browsing(cursor) => cursor,
            MainMode::Editing(field) => field.into(),
        }
    }

    pub fn is_editing(self) -> bool {
        matches!(self, MainMode::Editing(_))
    }
}

/// Voltage/current pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoint {
    pub voltage_mv: u16,
    pub current_ma: u16,
}

/// Regulation mode indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SupplyMode {
    /// Constant voltage
    #[default]
    Cv,
    /// Constant current
    Cc,
}

impl SupplyMode {
    pub const fn label(self) -> &'static str {
        match self {
            SupplyMode::Cv => "CV",
            SupplyMode::Cc => "CC",
        }
    }
}
