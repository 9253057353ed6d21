//! Device control state machine
//!
//! The device is either browsing the negotiated profiles (`Menu`) or
//! operating one of them (`Main`). All output decisions are a function of
//! the current state and an encoder event; the renderer only ever sees
//! value snapshots.

pub mod controller;
pub mod events;
pub mod session;
pub mod state;
pub mod view;

pub use controller::Controller;
pub use events::ControlEvent;
pub use session::MainSession;
pub use state::{Cursor, DeviceState, Field, MainMode, MenuState, Setpoint, SupplyMode};
pub use view::{MainView, Readings, View};
