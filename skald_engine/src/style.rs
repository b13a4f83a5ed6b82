//! Styling helpers for terminal output.
//!
//! The [`StoryStyle`] trait applies ANSI styling via the `colored` crate.
//! Implementations for `&str` and `String` are provided so string literals can
//! be styled directly.

use colored::{Color, ColoredString, Colorize};
use textwrap::Options;

/// Speaker colors, assigned by the speaker's position in the script's character list.
const SPEAKER_COLORS: [Color; 3] = [Color::Green, Color::Yellow, Color::Blue];

/// Convenience trait for applying color and style to story output.
pub trait StoryStyle {
    fn section_style(&self) -> ColoredString;
    fn speaker_style(&self, index: usize) -> ColoredString;
    fn body_style(&self) -> ColoredString;
    fn logic_style(&self) -> ColoredString;
    fn signal_style(&self) -> ColoredString;
    fn choice_style(&self) -> ColoredString;
    fn disabled_style(&self) -> ColoredString;
    fn transition_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn ended_style(&self) -> ColoredString;
    fn warning_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
    fn subheading_style(&self) -> ColoredString;
}

impl StoryStyle for &str {
    fn section_style(&self) -> ColoredString {
        let bracketed = format!("[{self}]");
        bracketed.truecolor(75, 80, 75)
    }
    fn speaker_style(&self, index: usize) -> ColoredString {
        self.color(SPEAKER_COLORS[index % SPEAKER_COLORS.len()]).bold()
    }
    fn body_style(&self) -> ColoredString {
        self.normal()
    }
    fn logic_style(&self) -> ColoredString {
        self.dimmed().italic()
    }
    fn signal_style(&self) -> ColoredString {
        self.italic().truecolor(75, 180, 255)
    }
    fn choice_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn disabled_style(&self) -> ColoredString {
        self.dimmed()
    }
    fn transition_style(&self) -> ColoredString {
        self.italic().truecolor(110, 220, 110)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(102, 208, 250)
    }
    fn ended_style(&self) -> ColoredString {
        self.bold().truecolor(220, 40, 220)
    }
    fn warning_style(&self) -> ColoredString {
        self.truecolor(230, 230, 30)
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
    fn subheading_style(&self) -> ColoredString {
        self.underline()
    }
}

impl StoryStyle for String {
    fn section_style(&self) -> ColoredString {
        self.as_str().section_style()
    }
    fn speaker_style(&self, index: usize) -> ColoredString {
        self.as_str().speaker_style(index)
    }
    fn body_style(&self) -> ColoredString {
        self.as_str().body_style()
    }
    fn logic_style(&self) -> ColoredString {
        self.as_str().logic_style()
    }
    fn signal_style(&self) -> ColoredString {
        self.as_str().signal_style()
    }
    fn choice_style(&self) -> ColoredString {
        self.as_str().choice_style()
    }
    fn disabled_style(&self) -> ColoredString {
        self.as_str().disabled_style()
    }
    fn transition_style(&self) -> ColoredString {
        self.as_str().transition_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn ended_style(&self) -> ColoredString {
        self.as_str().ended_style()
    }
    fn warning_style(&self) -> ColoredString {
        self.as_str().warning_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn subheading_style(&self) -> ColoredString {
        self.as_str().subheading_style()
    }
}

/// Wrap options for story text at the given width.
pub fn story_block(width: usize) -> Options<'static> {
    Options::new(width.min(100))
}

/// Wrap options for text shown under a choice or speaker.
pub fn indented_block(width: usize) -> Options<'static> {
    story_block(width).initial_indent("    ").subsequent_indent("    ")
}
