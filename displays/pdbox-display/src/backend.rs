//! Display backend trait

use crate::frame::FrameBuffer;

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
}

/// A panel that can show a [`FrameBuffer`]
pub trait DisplayBackend {
    /// Send the power-up command sequence
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Push the frame's dirty pages to the panel and mark them clean
    ///
    /// Pages that fail to transfer stay dirty.
    fn flush(&mut self, frame: &mut FrameBuffer) -> Result<(), DisplayError>;
}
