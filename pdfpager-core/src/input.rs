//! User commands and the keyboard / page-input mapping onto them.

/// Everything the controls can ask the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PreviousPage,
    NextPage,
    GoToPage(i64),
    ZoomIn,
    ZoomOut,
    ToggleFullscreen,
}

/// Keys the viewer reacts to, independent of any windowing toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Character(char),
    Other,
}

/// Conditions under which shortcuts are swallowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    /// The page number field has keyboard focus.
    pub text_input_focused: bool,
    /// A render or page transition is running.
    pub busy: bool,
}

impl InputContext {
    fn suppresses_shortcuts(&self) -> bool {
        self.text_input_focused || self.busy
    }
}

pub fn command_for_key(key: Key, context: InputContext) -> Option<Command> {
    if context.suppresses_shortcuts() {
        return None;
    }
    match key {
        Key::ArrowLeft => Some(Command::PreviousPage),
        Key::ArrowRight => Some(Command::NextPage),
        Key::Character('+') => Some(Command::ZoomIn),
        Key::Character('-') => Some(Command::ZoomOut),
        Key::Character('f' | 'F') => Some(Command::ToggleFullscreen),
        _ => None,
    }
}

/// What to do with the text typed into the page number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInput {
    Jump(i64),
    /// Not a number; put the current page back into the field.
    Revert,
}

/// Read a page number the way a lenient integer parser would: optional
/// surrounding whitespace, an optional sign, then the leading run of digits.
/// Anything after the digits is ignored, so `12abc` is page 12.
pub fn parse_page_input(raw: &str) -> PageInput {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return PageInput::Revert;
    }

    // Overlong inputs saturate; the navigator clamps them anyway.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    PageInput::Jump(if negative { -magnitude } else { magnitude })
}

pub fn command_for_page_input(raw: &str) -> Option<Command> {
    match parse_page_input(raw) {
        PageInput::Jump(page) => Some(Command::GoToPage(page)),
        PageInput::Revert => None,
    }
}
