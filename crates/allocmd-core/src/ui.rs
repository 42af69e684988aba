//! coloured status lines for the terminal

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    fn code(&self) -> &'static str {
        match self {
            Color::Red => "31",
            Color::Green => "32",
            Color::Yellow => "33",
            Color::Blue => "34",
            Color::Magenta => "35",
            Color::Cyan => "36",
            Color::White => "37",
        }
    }
}

fn enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn paint(text: impl Display, color: Color) -> String {
    if enabled() {
        format!("\x1b[{}m{}\x1b[0m", color.code(), text)
    } else {
        text.to_string()
    }
}

pub fn bold(text: impl Display, color: Color) -> String {
    if enabled() {
        format!("\x1b[1;{}m{}\x1b[0m", color.code(), text)
    } else {
        text.to_string()
    }
}

pub fn step(text: impl Display) {
    println!("{}", paint(text, Color::Yellow));
}

pub fn note(text: impl Display) {
    println!("{}", paint(text, Color::Cyan));
}

pub fn success(text: impl Display) {
    println!("{}", paint(text, Color::Green));
}

pub fn warn(text: impl Display) {
    eprintln!("{}", paint(text, Color::Magenta));
}

pub fn fatal(text: impl Display) {
    eprintln!("{}", bold(text, Color::Red));
}

pub const BANNER: &str = r#"
      __      ___      ___        ______     _______        __
     /""\    |"  |    |"  |      /    " \   /"      \      /""\
    /    \   ||  |    ||  |     // ____  \ |:        |    /    \
   /' /\  \  |:  |    |:  |    /  /    ) :)|_____/   )   /' /\  \
  //  __'  \  \  |___  \  |___(: (____/ //  //      /   //  __'  \
 /   /  \\  \( \_|:  \( \_|:  \\        /  |:  __   \  /   /  \\  \
(___/    \___)\_______)\_______)\"_____/   |__|  \___)(___/    \___)
"#;

pub fn banner() {
    println!("{}", bold(BANNER, Color::Blue));
}
