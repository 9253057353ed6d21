//! SSD1306 OLED transport
//!
//! Driver for 128x64 SSD1306 panels via I2C. Holds no frame of its own;
//! it pushes the dirty pages of a [`FrameBuffer`].

use embedded_hal::i2c::I2c;

use crate::backend::{DisplayBackend, DisplayError};
use crate::frame::{FrameBuffer, PAGES, WIDTH};

/// SSD1306 I2C address (0x3C, or 0x3D with SA0 high)
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Control byte: command stream follows
const CONTROL_COMMAND: u8 = 0x00;
/// Control byte: GDDRAM data follows
const CONTROL_DATA: u8 = 0x40;

/// SSD1306 commands
#[allow(dead_code)]
mod cmd {
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_COLUMN_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const DEACTIVATE_SCROLL: u8 = 0x2E;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const DISPLAY_FOLLOW_RAM: u8 = 0xA4;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
}

const INIT_SEQUENCE: &[u8] = &[
    cmd::DISPLAY_OFF,
    cmd::SET_MEMORY_MODE,
    0x00, // Horizontal addressing
    cmd::SET_START_LINE,
    cmd::SET_SEG_REMAP,
    cmd::SET_MUX_RATIO,
    0x3F, // 64 lines
    cmd::SET_COM_SCAN_DEC,
    cmd::SET_DISPLAY_OFFSET,
    0x00,
    cmd::SET_COM_PINS,
    0x12,
    cmd::SET_CLOCK_DIV,
    0x80,
    cmd::SET_PRECHARGE,
    0xF1,
    cmd::SET_VCOM_DETECT,
    0x30,
    cmd::SET_CONTRAST,
    0xFF,
    cmd::DISPLAY_FOLLOW_RAM,
    cmd::SET_NORMAL,
    cmd::SET_CHARGE_PUMP,
    0x14, // Enable charge pump
    cmd::DEACTIVATE_SCROLL,
    cmd::DISPLAY_ON,
];

/// SSD1306 OLED driver
pub struct Ssd1306<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Ssd1306<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn commands(&mut self, cmds: &[u8]) -> Result<(), DisplayError> {
        let mut frame = [0u8; 8];
        for chunk in cmds.chunks(frame.len() - 1) {
            frame[0] = CONTROL_COMMAND;
            frame[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.address, &frame[..=chunk.len()])
                .map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    fn write_page(&mut self, page: u8, data: &[u8; WIDTH]) -> Result<(), DisplayError> {
        self.commands(&[
            cmd::SET_COLUMN_ADDR,
            0,
            (WIDTH - 1) as u8,
            cmd::SET_PAGE_ADDR,
            page,
            page,
        ])?;

        let mut buf = [0u8; WIDTH + 1];
        buf[0] = CONTROL_DATA;
        buf[1..].copy_from_slice(data);
        self.i2c
            .write(self.address, &buf)
            .map_err(|_| DisplayError::Communication)
    }

    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), DisplayError> {
        self.commands(&[cmd::SET_CONTRAST, contrast])
    }

    pub fn set_display_on(&mut self, on: bool) -> Result<(), DisplayError> {
        self.commands(&[if on { cmd::DISPLAY_ON } else { cmd::DISPLAY_OFF }])
    }
}

impl<I2C: I2c> DisplayBackend for Ssd1306<I2C> {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.commands(INIT_SEQUENCE)
    }

    fn flush(&mut self, frame: &mut FrameBuffer) -> Result<(), DisplayError> {
        for page in 0..PAGES {
            if !frame.is_page_dirty(page) {
                continue;
            }
            let data = *frame.page(page);
            self.write_page(page as u8, &data)?;
            frame.mark_clean(page);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// (control byte, first payload byte, length) per write
    type Record = (u8, u8, usize);

    #[derive(Default)]
    struct MockBus {
        writes: heapless::Vec<Record, 128>,
        /// Fail the write with this index
        fail_at: Option<usize>,
    }

    impl MockBus {
        fn data_writes(&self) -> usize {
            self.writes.iter().filter(|w| w.0 == CONTROL_DATA).count()
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, DEFAULT_ADDRESS);
            for op in operations {
                if let Operation::Write(bytes) = op {
                    if self.fail_at == Some(self.writes.len()) {
                        return Err(ErrorKind::Other);
                    }
                    self.writes.push((bytes[0], bytes[1], bytes.len())).unwrap();
                }
            }
            Ok(())
        }
    }

    fn clean_frame() -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        for page in 0..PAGES {
            frame.mark_clean(page);
        }
        frame
    }

    #[test]
    fn test_init_sends_command_stream() {
        let mut oled = Ssd1306::new(MockBus::default(), DEFAULT_ADDRESS);
        oled.init().unwrap();
        let bus = oled.release();
        assert!(bus.writes.iter().all(|w| w.0 == CONTROL_COMMAND));
        assert_eq!(bus.writes[0].1, cmd::DISPLAY_OFF);
        let sent: usize = bus.writes.iter().map(|w| w.2 - 1).sum();
        assert_eq!(sent, INIT_SEQUENCE.len());
    }

    #[test]
    fn test_first_flush_sends_every_page() {
        let mut oled = Ssd1306::new(MockBus::default(), DEFAULT_ADDRESS);
        let mut frame = FrameBuffer::new();
        oled.flush(&mut frame).unwrap();
        assert!(!frame.is_dirty());
        let bus = oled.release();
        assert_eq!(bus.data_writes(), PAGES);
        assert!(bus
            .writes
            .iter()
            .filter(|w| w.0 == CONTROL_DATA)
            .all(|w| w.2 == WIDTH + 1));
    }

    #[test]
    fn test_flush_sends_only_dirty_pages() {
        let mut oled = Ssd1306::new(MockBus::default(), DEFAULT_ADDRESS);
        let mut frame = clean_frame();
        frame.set_pixel(10, 40, true);
        oled.flush(&mut frame).unwrap();
        oled.flush(&mut frame).unwrap();
        let bus = oled.release();
        assert_eq!(bus.data_writes(), 1);
    }

    #[test]
    fn test_failed_page_stays_dirty() {
        let bus = MockBus {
            // Command frame for page 0 succeeds, data frame fails
            fail_at: Some(1),
            ..MockBus::default()
        };
        let mut oled = Ssd1306::new(bus, DEFAULT_ADDRESS);
        let mut frame = FrameBuffer::new();
        assert_eq!(oled.flush(&mut frame), Err(DisplayError::Communication));
        assert!(frame.is_page_dirty(0));
    }
}
