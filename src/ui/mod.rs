//! User interface hardware - OLED display + physical buttons.
//!
//! Only the peripheral glue lives here; what is shown and how presses
//! are interpreted is decided by the core controller.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C, driven as 4×16 text rows
//! - **Buttons**: 4 tactile switches sampled every tick (B1..B4)

pub mod buttons;
pub mod display;
