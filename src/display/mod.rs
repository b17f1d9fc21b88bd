//! Display module - console status block and Sense HAT LED matrix

mod console;
mod matrix;

pub use console::{
    alarm_lines, controls_line, header, parse_cpuinfo_serial, readings_line, render,
    run_console, setpoints_line, unit_serial,
};
pub use matrix::{
    bar_height, detect_device, render_status, Framebuffer, LedMatrix, Pattern, Rgb565, FRAMEBUFFER_BYTES,
    MATRIX_SIZE,
};
