// Terminal spinner shown while a request is in flight. Rendering and the
// tick thread belong to `indicatif`; this module only picks frames and
// guarantees the spinner is cleared when the request finishes.

use crossterm::tty::IsTty;
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStyle {
    Default,
    Dots,
    Arrows,
    Bounce,
    Pulse,
    Braille,
    Emoji,
    Planet,
    Clock,
    Simple,
    Text,
    Matrix,
    None,
}

impl SpinnerStyle {
    pub const ALL: [SpinnerStyle; 13] = [
        SpinnerStyle::Default,
        SpinnerStyle::Dots,
        SpinnerStyle::Arrows,
        SpinnerStyle::Bounce,
        SpinnerStyle::Pulse,
        SpinnerStyle::Braille,
        SpinnerStyle::Emoji,
        SpinnerStyle::Planet,
        SpinnerStyle::Clock,
        SpinnerStyle::Simple,
        SpinnerStyle::Text,
        SpinnerStyle::Matrix,
        SpinnerStyle::None,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpinnerStyle::Default => "default",
            SpinnerStyle::Dots => "dots",
            SpinnerStyle::Arrows => "arrows",
            SpinnerStyle::Bounce => "bounce",
            SpinnerStyle::Pulse => "pulse",
            SpinnerStyle::Braille => "braille",
            SpinnerStyle::Emoji => "emoji",
            SpinnerStyle::Planet => "planet",
            SpinnerStyle::Clock => "clock",
            SpinnerStyle::Simple => "simple",
            SpinnerStyle::Text => "text",
            SpinnerStyle::Matrix => "matrix",
            SpinnerStyle::None => "none",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SpinnerStyle::Default => "Braille dots (⠋⠙⠹⠸⠼)",
            SpinnerStyle::Dots => "Heavy dots (⣾⣽⣻⢿⡿⣟⣯⣷)",
            SpinnerStyle::Arrows => "Rotating arrows (←↖↑↗→↘↓↙)",
            SpinnerStyle::Bounce => "Bouncing dots (⠁⠂⠄⡀⢀⠠⠐⠈)",
            SpinnerStyle::Pulse => "Pulsing bar (▁▂▃▄▅▆▇█)",
            SpinnerStyle::Braille => "Braille pattern (⠋⠙⠚⠒⠂⠒⠲⠴)",
            SpinnerStyle::Emoji => "Lightning and refresh (⚡🔄⏳)",
            SpinnerStyle::Planet => "Rotating Earth (🌍🌎🌏)",
            SpinnerStyle::Clock => "Clock faces (🕐🕑🕒...🕛)",
            SpinnerStyle::Simple => "Progressive dots (....)",
            SpinnerStyle::Text => "Loading bar ([=   ])",
            SpinnerStyle::Matrix => "Matrix characters (ｱｲｳｴｵ)",
            SpinnerStyle::None => "No spinner",
        }
    }

    pub fn from_name(name: &str) -> Option<SpinnerStyle> {
        let name = name.trim().to_ascii_lowercase();
        SpinnerStyle::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Like [`SpinnerStyle::from_name`], falling back to `default` for
    /// unknown names.
    pub fn resolve(name: &str) -> SpinnerStyle {
        SpinnerStyle::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown spinner style {:?}, using default", name);
            SpinnerStyle::Default
        })
    }

    fn frames(self) -> &'static [&'static str] {
        match self {
            SpinnerStyle::Default => &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            SpinnerStyle::Dots => &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"],
            SpinnerStyle::Arrows => &["←", "↖", "↑", "↗", "→", "↘", "↓", "↙"],
            SpinnerStyle::Bounce => &["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"],
            SpinnerStyle::Pulse => &["▁", "▂", "▃", "▄", "▅", "▆", "▇", "█", "▇", "▆", "▅", "▄", "▃", "▂"],
            SpinnerStyle::Braille => &["⠋", "⠙", "⠚", "⠒", "⠂", "⠂", "⠒", "⠲", "⠴", "⠦", "⠖", "⠒", "⠐", "⠐", "⠒", "⠓"],
            SpinnerStyle::Emoji => &["⚡", "🔄", "⏳"],
            SpinnerStyle::Planet => &["🌍", "🌎", "🌏"],
            SpinnerStyle::Clock => &[
                "🕐", "🕑", "🕒", "🕓", "🕔", "🕕", "🕖", "🕗", "🕘", "🕙", "🕚", "🕛",
            ],
            SpinnerStyle::Simple => &[".   ", "..  ", "... ", "...."],
            SpinnerStyle::Text => &["[=   ]", "[==  ]", "[=== ]", "[====]", "[ ===]", "[  ==]", "[   =]", "[    ]"],
            SpinnerStyle::Matrix => &["ｱ", "ｲ", "ｳ", "ｴ", "ｵ", "ｶ", "ｷ", "ｸ", "ｹ", "ｺ"],
            SpinnerStyle::None => &[],
        }
    }

    fn interval(self) -> Duration {
        match self {
            SpinnerStyle::Simple | SpinnerStyle::Emoji | SpinnerStyle::Planet => {
                Duration::from_millis(200)
            }
            _ => Duration::from_millis(100),
        }
    }
}

/// A running spinner. Stopping it, or dropping it, clears the line and
/// stops the tick thread.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    /// Starts a spinner on stderr. Nothing is drawn when `enabled` is false,
    /// the style is `none`, or stderr is not a terminal.
    pub fn start(style: SpinnerStyle, message: impl Into<Cow<'static, str>>, enabled: bool) -> Spinner {
        if !enabled || style == SpinnerStyle::None || !std::io::stderr().is_tty() {
            return Spinner::disabled();
        }

        // indicatif uses the last tick string for the finished state
        let mut ticks: Vec<&str> = style.frames().to_vec();
        ticks.push(" ");
        let template = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(template.tick_strings(&ticks));
        bar.set_message(message);
        bar.enable_steady_tick(style.interval());
        Spinner { bar: Some(bar) }
    }

    pub fn disabled() -> Spinner {
        Spinner { bar: None }
    }

    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    pub fn stop(mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.clear();
    }
}
