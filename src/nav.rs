//! Section navigation with hash-style identifiers and back/forward history.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Introduction,
    Puzzle,
    Shooter,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Introduction, Self::Puzzle, Self::Shooter];
    pub const DEFAULT: Self = Self::Introduction;

    pub fn id(self) -> &'static str {
        match self {
            Self::Introduction => "#introduction",
            Self::Puzzle => "#tetris",
            Self::Shooter => "#spacewar",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Introduction => "Introduction",
            Self::Puzzle => "Tetris",
            Self::Shooter => "Space War",
        }
    }

    /// Accepts the identifier with or without the leading `#`.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        let bare = id.strip_prefix('#').unwrap_or(id);
        Self::ALL
            .into_iter()
            .find(|s| s.id()[1..].eq_ignore_ascii_case(bare))
    }

    /// Next tab, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            Self::Introduction => Self::Puzzle,
            Self::Puzzle => Self::Shooter,
            Self::Shooter => Self::Introduction,
        }
    }
}

/// Exactly one active section; the history mirrors it like a browser address bar.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Section>,
    cursor: usize,
}

impl Navigator {
    /// Missing or unknown identifiers land on the default section.
    pub fn resolve(id: Option<&str>) -> Self {
        let section = id.and_then(Section::from_id).unwrap_or(Section::DEFAULT);
        Self {
            history: vec![section],
            cursor: 0,
        }
    }

    pub fn active(&self) -> Section {
        self.history[self.cursor]
    }

    /// Address-bar form of the active section.
    pub fn location(&self) -> &'static str {
        self.active().id()
    }

    /// Switches to `section`, dropping forward history. Re-activating the current section is a no-op.
    pub fn activate(&mut self, section: Section) -> Section {
        if section != self.active() {
            self.history.truncate(self.cursor + 1);
            self.history.push(section);
            self.cursor += 1;
            log::info!("navigated to {}", section.id());
        }
        self.active()
    }

    pub fn back(&mut self) -> Section {
        self.cursor = self.cursor.saturating_sub(1);
        self.active()
    }

    pub fn forward(&mut self) -> Section {
        if self.cursor + 1 < self.history.len() {
            self.cursor += 1;
        }
        self.active()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::resolve(None)
    }
}
