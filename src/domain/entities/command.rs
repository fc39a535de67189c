use std::fmt;

/// The finite set of commands the tracker understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Sleep,
    Wake,
    Quality,
    Notes,
    ChangeQuality,
    ChangeNotes,
    Delete,
    Average,
    Date,
}

impl Command {
    /// Every command in menu order
    pub const ALL: [Command; 11] = [
        Command::Start,
        Command::Help,
        Command::Sleep,
        Command::Wake,
        Command::Quality,
        Command::Notes,
        Command::ChangeQuality,
        Command::ChangeNotes,
        Command::Delete,
        Command::Average,
        Command::Date,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Sleep => "sleep",
            Command::Wake => "wake",
            Command::Quality => "quality",
            Command::Notes => "notes",
            Command::ChangeQuality => "change_quality",
            Command::ChangeNotes => "change_notes",
            Command::Delete => "delete",
            Command::Average => "average",
            Command::Date => "date",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Начать работу с ботом",
            Command::Help => "Список команд",
            Command::Sleep => "Отметить начало сна",
            Command::Wake => "Отметить пробуждение",
            Command::Quality => "Оценить качество сна",
            Command::Notes => "Оставить заметку о сне",
            Command::ChangeQuality => "Изменить последнюю оценку",
            Command::ChangeNotes => "Изменить последнюю заметку",
            Command::Delete => "Удалить незавершённую запись",
            Command::Average => "Средняя продолжительность и качество сна",
            Command::Date => "Параметры сна за дату",
        }
    }

    /// Usage line shown when the argument is missing or malformed
    pub fn usage(&self) -> Option<&'static str> {
        match self {
            Command::Quality => Some("/quality вставьте своё число"),
            Command::Notes => Some("/notes вставьте свой текст"),
            Command::ChangeQuality => Some("/change_quality вставьте своё число"),
            Command::ChangeNotes => Some("/change_notes вставьте свой текст"),
            Command::Date => Some("/date вставьте свою дату"),
            _ => None,
        }
    }

    /// Case-insensitive lookup by name, without the leading prefix
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}
