//! Screen renderer
//!
//! Every screen redraws the whole frame from a value snapshot; the frame
//! buffer's dirty tracking keeps unchanged pages off the bus.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_9X15};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use pdbox_core::control::{Field, MainView, Readings, SupplyMode, View};
use pdbox_core::pdo::Pdo;

use crate::frame::WIDTH;

const CENTER_X: i32 = WIDTH as i32 / 2;

/// Small font glyph height
const ROW_HEIGHT: i32 = 8;

/// Menu items per page
pub const MENU_ROWS: usize = 6;
const MENU_TOP: i32 = 16;

const MENU_TITLE: &str = "Available PDOs";

/// Boot progress shown on the loading screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadingStatus {
    /// Still waiting for the source; `progress` cycles the dots
    Waiting { progress: u8 },
    /// Capability table read with this many profiles
    Found(usize),
}

fn text<D>(
    target: &mut D,
    s: &str,
    at: Point,
    font: &MonoFont<'_>,
    alignment: Alignment,
    invert: bool,
) -> Result<Point, D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let builder = MonoTextStyleBuilder::new().font(font);
    let style = if invert {
        builder
            .text_color(BinaryColor::Off)
            .background_color(BinaryColor::On)
            .build()
    } else {
        builder.text_color(BinaryColor::On).build()
    };
    let layout = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(s, at, style, layout).draw(target)
}

fn small<D>(target: &mut D, s: &str, at: Point, invert: bool) -> Result<Point, D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    text(target, s, at, &FONT_5X8, Alignment::Left, invert)
}

/// Draw the current view
pub fn render<D>(target: &mut D, view: &View<'_>, readings: &Readings) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match view {
        View::Menu {
            profiles,
            highlighted,
        } => draw_menu(target, profiles, *highlighted),
        View::Main(main) => draw_main(target, main, readings),
    }
}

pub fn draw_loading<D>(target: &mut D, status: LoadingStatus) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;
    match status {
        LoadingStatus::Waiting { progress } => {
            let dots = &"..."[..(progress % 4) as usize];
            text(target, dots, Point::new(CENTER_X, 24), &FONT_9X15, Alignment::Center, false)?;
            text(target, "Loading PDOs", Point::new(CENTER_X, 48), &FONT_5X8, Alignment::Center, false)?;
        }
        LoadingStatus::Found(count) => {
            let mut line: String<24> = String::new();
            let _ = write!(line, "{} PDOs found", count);
            text(target, &line, Point::new(CENTER_X, 48), &FONT_5X8, Alignment::Center, false)?;
        }
    }
    Ok(())
}

/// Profile list with a page of [`MENU_ROWS`] items around the highlight
pub fn draw_menu<D>(target: &mut D, profiles: &[Pdo], highlighted: usize) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;

    let mut header: String<8> = String::new();
    let position = if profiles.is_empty() { 0 } else { highlighted + 1 };
    let _ = write!(header, "{}/{}", position, profiles.len());
    small(target, &header, Point::zero(), false)?;
    text(target, MENU_TITLE, Point::new(CENTER_X, 0), &FONT_5X8, Alignment::Center, false)?;

    let first = (highlighted / MENU_ROWS) * MENU_ROWS;
    let page = profiles.iter().enumerate().skip(first).take(MENU_ROWS);
    for (row, (index, pdo)) in page.enumerate() {
        let y = MENU_TOP + row as i32 * ROW_HEIGHT;
        let selected = index == highlighted;
        if selected {
            Rectangle::new(Point::new(0, y), Size::new(WIDTH as u32, ROW_HEIGHT as u32))
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(target)?;
        }
        let mut label: String<24> = String::new();
        let _ = write!(label, "{}", pdo);
        small(target, &label, Point::new(1, y), selected)?;
    }
    Ok(())
}

/// Write "VV.vv" followed by `unit` for a milli-unit value
fn write_measurement(out: &mut String<8>, milli: u32, unit: char) {
    let whole = (milli / 1000).min(99);
    let hundredths = (milli % 1000) / 10;
    let _ = write!(out, "{:02}.{:02}{}", whole, hundredths, unit);
}

/// "LABEL 00000mV" centered, with the digits inverted when highlighted
fn draw_target_line<D>(
    target: &mut D,
    y: i32,
    label: &str,
    digits: &str,
    unit: &str,
    highlighted: bool,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let glyph = FONT_5X8.character_size.width as i32;
    let width = (label.len() + digits.len() + unit.len()) as i32 * glyph;
    let at = Point::new((WIDTH as i32 - width) / 2, y);
    let at = small(target, label, at, false)?;
    let at = small(target, digits, at, highlighted)?;
    small(target, unit, at, false)?;
    Ok(())
}

/// Boxed indicator at the bottom row, filled when active
fn draw_indicator<D>(target: &mut D, x: i32, label: &str, active: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = if active {
        PrimitiveStyle::with_fill(BinaryColor::On)
    } else {
        PrimitiveStyle::with_stroke(BinaryColor::On, 1)
    };
    Rectangle::new(Point::new(x, 53), Size::new(20, 11))
        .into_styled(style)
        .draw(target)?;
    text(target, label, Point::new(x + 10, 55), &FONT_5X8, Alignment::Center, active)?;
    Ok(())
}

pub fn draw_main<D>(target: &mut D, view: &MainView, readings: &Readings) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;

    small(target, view.kind.label(), Point::zero(), false)?;

    let mut temperature: String<8> = String::new();
    match readings.temperature_c {
        Some(t) => {
            let _ = write!(temperature, "{}C", t);
        }
        None => {
            let _ = temperature.push_str("--C");
        }
    }
    text(target, &temperature, Point::new(WIDTH as i32, 0), &FONT_5X8, Alignment::Right, false)?;

    let mut voltage: String<8> = String::new();
    write_measurement(&mut voltage, readings.voltage_mv, 'V');
    text(target, &voltage, Point::new(CENTER_X, 0), &FONT_9X15, Alignment::Center, false)?;

    let mut digits: String<8> = String::new();
    let _ = write!(digits, "{:05}", view.target.voltage_mv);
    draw_target_line(target, 16, "TARGET ", &digits, "mV", view.is_highlighted(Field::Voltage))?;
    if view.unconfirmed {
        text(target, "?", Point::new(WIDTH as i32, 16), &FONT_5X8, Alignment::Right, false)?;
    }

    let mut current: String<8> = String::new();
    write_measurement(&mut current, readings.current_ma, 'A');
    text(target, &current, Point::new(CENTER_X, 25), &FONT_9X15, Alignment::Center, false)?;

    digits.clear();
    let _ = write!(digits, "{:04}", view.target.current_ma);
    draw_target_line(target, 41, "LIMIT ", &digits, "mA", view.is_highlighted(Field::Current))?;

    draw_indicator(target, 32, SupplyMode::Cv.label(), view.supply_mode == SupplyMode::Cv)?;
    draw_indicator(target, 53, SupplyMode::Cc.label(), view.supply_mode == SupplyMode::Cc)?;
    draw_indicator(target, 74, "EN", view.output_enabled)?;
    Ok(())
}

/// Fatal startup error
pub fn draw_fault<D>(target: &mut D, message: &str) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;
    text(target, "FAULT", Point::new(CENTER_X, 16), &FONT_9X15, Alignment::Center, false)?;
    text(target, message, Point::new(CENTER_X, 40), &FONT_5X8, Alignment::Center, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameBuffer;
    use pdbox_core::control::{Cursor, Setpoint};
    use pdbox_core::pdo::PdoKind;

    fn lit(frame: &FrameBuffer, x: core::ops::Range<usize>, y: core::ops::Range<usize>) -> usize {
        y.flat_map(|yy| x.clone().map(move |xx| (xx, yy)))
            .filter(|&(xx, yy)| frame.pixel(xx, yy))
            .count()
    }

    fn profiles(n: usize) -> heapless::Vec<Pdo, 13> {
        (0..n)
            .map(|i| Pdo {
                index: i as u8,
                kind: PdoKind::Fixed,
                voltage_min_mv: 5000,
                voltage_max_mv: 5000,
                voltage_step_mv: 0,
                current_min_ma: 1000,
                current_max_ma: 3000,
                current_step_ma: 250,
            })
            .collect()
    }

    fn main_view() -> MainView {
        MainView {
            kind: PdoKind::Pps,
            target: Setpoint {
                voltage_mv: 5000,
                current_ma: 1000,
            },
            unconfirmed: false,
            cursor: Cursor::None,
            editing: false,
            blink_visible: true,
            output_enabled: false,
            supply_mode: SupplyMode::Cv,
        }
    }

    fn readings() -> Readings {
        Readings {
            voltage_mv: 12_340,
            current_ma: 1_250,
            temperature_c: Some(37),
        }
    }

    #[test]
    fn test_loading_dots_cycle() {
        let mut frame = FrameBuffer::new();
        draw_loading(&mut frame, LoadingStatus::Waiting { progress: 0 }).unwrap();
        assert_eq!(lit(&frame, 0..128, 20..40), 0);
        assert!(lit(&frame, 0..128, 48..56) > 0);

        draw_loading(&mut frame, LoadingStatus::Waiting { progress: 3 }).unwrap();
        assert!(lit(&frame, 0..128, 20..40) > 0);
    }

    #[test]
    fn test_loading_found_replaces_dots() {
        let mut frame = FrameBuffer::new();
        draw_loading(&mut frame, LoadingStatus::Waiting { progress: 3 }).unwrap();
        draw_loading(&mut frame, LoadingStatus::Found(4)).unwrap();
        assert_eq!(lit(&frame, 0..128, 20..40), 0);
        assert!(lit(&frame, 0..128, 48..56) > 0);
    }

    #[test]
    fn test_menu_highlight_is_inverted() {
        let list = profiles(3);
        let mut frame = FrameBuffer::new();
        draw_menu(&mut frame, &list, 1).unwrap();

        let row = |r: usize| lit(&frame, 0..128, 16 + r * 8..24 + r * 8);
        assert!(row(1) > 128 * 8 / 2);
        assert!(row(0) > 0 && row(0) < 128 * 8 / 2);
        assert!(row(2) > 0 && row(2) < 128 * 8 / 2);
        assert_eq!(row(3), 0);
    }

    #[test]
    fn test_menu_pages() {
        let list = profiles(8);
        let mut frame = FrameBuffer::new();
        draw_menu(&mut frame, &list, 7).unwrap();

        let row = |r: usize| lit(&frame, 0..128, 16 + r * 8..24 + r * 8);
        // Second page holds items 6 and 7
        assert!(row(0) > 0);
        assert!(row(1) > 128 * 8 / 2);
        assert_eq!(row(2), 0);
    }

    #[test]
    fn test_main_indicators() {
        let mut frame = FrameBuffer::new();
        let mut view = main_view();
        draw_main(&mut frame, &view, &readings()).unwrap();
        let cv_off = lit(&frame, 32..52, 53..64);
        let cc_off = lit(&frame, 53..73, 53..64);
        let en_off = lit(&frame, 74..94, 53..64);
        assert!(cv_off > cc_off);
        assert!(en_off < 20 * 11 / 2);

        view.output_enabled = true;
        view.supply_mode = SupplyMode::Cc;
        draw_main(&mut frame, &view, &readings()).unwrap();
        assert!(lit(&frame, 74..94, 53..64) > 20 * 11 / 2);
        assert!(lit(&frame, 53..73, 53..64) > lit(&frame, 32..52, 53..64));
    }

    #[test]
    fn test_selected_target_is_inverted() {
        // "TARGET " is 7 glyphs of 14, digits start at x = 29 + 35
        let digits = (64, 89);
        let mut frame = FrameBuffer::new();
        let mut view = main_view();
        draw_main(&mut frame, &view, &readings()).unwrap();
        let plain = lit(&frame, digits.0..digits.1, 16..24);

        view.cursor = Cursor::Voltage;
        draw_main(&mut frame, &view, &readings()).unwrap();
        let selected = lit(&frame, digits.0..digits.1, 16..24);
        assert!(selected > plain);

        view.editing = true;
        view.blink_visible = false;
        draw_main(&mut frame, &view, &readings()).unwrap();
        assert_eq!(lit(&frame, digits.0..digits.1, 16..24), plain);
    }

    #[test]
    fn test_unconfirmed_target_is_marked() {
        let mut frame = FrameBuffer::new();
        let mut view = main_view();
        draw_main(&mut frame, &view, &readings()).unwrap();
        assert_eq!(lit(&frame, 118..128, 16..24), 0);

        view.unconfirmed = true;
        draw_main(&mut frame, &view, &readings()).unwrap();
        assert!(lit(&frame, 118..128, 16..24) > 0);
    }

    #[test]
    fn test_measurement_format() {
        let mut s: String<8> = String::new();
        write_measurement(&mut s, 12_345, 'V');
        assert_eq!(s.as_str(), "12.34V");
        s.clear();
        write_measurement(&mut s, 250, 'A');
        assert_eq!(s.as_str(), "00.25A");
        s.clear();
        write_measurement(&mut s, 150_000, 'V');
        assert_eq!(s.as_str(), "99.00V");
    }

    #[test]
    fn test_render_dispatch() {
        let list = profiles(2);
        let mut menu = FrameBuffer::new();
        render(
            &mut menu,
            &View::Menu {
                profiles: &list,
                highlighted: 0,
            },
            &Readings::default(),
        )
        .unwrap();
        let mut main = FrameBuffer::new();
        render(&mut main, &View::Main(main_view()), &readings()).unwrap();
        // Only the main screen has indicator boxes
        assert_eq!(lit(&menu, 32..94, 53..64), 0);
        assert!(lit(&main, 32..94, 53..64) > 0);
    }

    #[test]
    fn test_fault_screen() {
        let mut frame = FrameBuffer::new();
        draw_fault(&mut frame, "Sensor calibration").unwrap();
        assert!(lit(&frame, 0..128, 16..31) > 0);
        assert!(lit(&frame, 0..128, 40..48) > 0);
    }
}
