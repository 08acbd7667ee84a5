use convodeck_core::{CardBackColors, Category};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Add(Category, i64),
    Sub(Category, i64),
    Set(Category, i64),
    Back { design: String, hue: i64 },
    Colors(CardBackColors),
    Check,
    Summary(u32),
    Share(u32),
    Designs,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown category '{0}' (romantic, deep, naughty, friendship, playful)")]
    Category(String),
    #[error("'{0}' is not a number")]
    Number(String),
    #[error("colors must be #RRGGBB")]
    Color,
}

pub const COMMANDS: &[&str] = &[
    "show", "add", "sub", "set", "back", "colors", "check", "summary", "share", "designs",
    "reset", "help", "quit",
];

/// Parses one shell line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();
    let command = match (cmd.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("show" | "s" | "ls", []) => Command::Show,
        ("add" | "+", [category, n]) => Command::Add(category_arg(category)?, number(n)?),
        ("add" | "+", _) => return Err(ParseError::Usage("add <category> <n>")),
        ("sub" | "-", [category, n]) => Command::Sub(category_arg(category)?, number(n)?),
        ("sub" | "-", _) => return Err(ParseError::Usage("sub <category> <n>")),
        ("set", [category, n]) => Command::Set(category_arg(category)?, number(n)?),
        ("set", _) => return Err(ParseError::Usage("set <category> <n>")),
        ("back", [design]) => Command::Back {
            design: design.to_string(),
            hue: 0,
        },
        ("back", [design, hue]) => Command::Back {
            design: design.to_string(),
            hue: number(hue)?,
        },
        ("back", _) => return Err(ParseError::Usage("back <design> [hue]")),
        ("colors", [up, down, background]) => {
            let colors = CardBackColors::new(*up, *down, *background);
            if !colors.is_valid() {
                return Err(ParseError::Color);
            }
            Command::Colors(colors)
        }
        ("colors", _) => return Err(ParseError::Usage("colors <up> <down> <background>")),
        ("check", []) => Command::Check,
        ("summary", rest) => Command::Summary(quantity(rest)?),
        ("share", rest) => Command::Share(quantity(rest)?),
        ("designs", []) => Command::Designs,
        ("reset", []) => Command::Reset,
        ("help" | "h" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        (other, _) => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn category_arg(value: &str) -> Result<Category, ParseError> {
    Category::from_key(value).ok_or_else(|| ParseError::Category(value.to_string()))
}

fn number(value: &str) -> Result<i64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::Number(value.to_string()))
}

fn quantity(rest: &[&str]) -> Result<u32, ParseError> {
    match rest {
        [] => Ok(1),
        [n] => n.parse().map_err(|_| ParseError::Number(n.to_string())),
        _ => Err(ParseError::Usage("summary|share [quantity]")),
    }
}
