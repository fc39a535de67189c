//! Renders command outcomes into the text messages users see

use crate::application::messaging::arguments::DATE_FORMAT;
use crate::application::services::tracker::Outcome;
use crate::domain::entities::{Command, SleepRecord};
use crate::domain::rules::{DurationParts, Refusal};
use crate::domain::traits::KeyboardButton;

const TIME_FORMAT: &str = "%H:%M:%S";
const NO_QUALITY: &str = "оценка не была внесена";
const NO_NOTES: &str = "заметок нет";

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Vec<Vec<KeyboardButton>>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, rows: Vec<Vec<KeyboardButton>>) -> Self {
        self.keyboard = Some(rows);
        self
    }
}

/// Messages for an outcome, in the order they must be sent
pub fn render(outcome: &Outcome) -> Vec<Reply> {
    match outcome {
        Outcome::Welcome { name, .. } => vec![
            Reply::text(format!(
                "Привет, {name}! Я бот, который помогает отслеживать параметры сна. \
                 Используйте команды /sleep и /wake, чтобы отметить начало и окончание сна \
                 и команды /quality и /notes для оценки его качества."
            ))
            .with_keyboard(vec![vec![
                KeyboardButton::new(Command::Sleep.to_string()),
                KeyboardButton::new(Command::Wake.to_string()),
            ]]),
            Reply::text(help_text()),
        ],
        Outcome::Help => vec![Reply::text(help_text())],
        Outcome::SleepStarted(_) => vec![Reply::text(
            "Начали отсчёт сна, когда проснетесь, сообщите командой /wake",
        )],
        Outcome::Woke { interval, long_sleep_hours } => {
            let mut replies = vec![Reply::text(format!(
                "Доброе утро, Вы спали: {}.",
                DurationParts::from_secs(interval.duration_secs)
            ))];
            if let Some(hours) = long_sleep_hours {
                replies.push(Reply::text(format!(
                    "Ваша продолжительность сна больше {hours} часов. Вы уверены, что не пропускали команды? \
                     Если пропускали, нажмите /delete чтобы удалить некорректные данные из базы."
                )));
            }
            replies.push(Reply::text(
                "Пожалуйста, оцените качество сна целым числом от 1 до 10 с помощью команды /quality",
            ));
            replies
        }
        Outcome::QualitySaved => vec![Reply::text(
            "Оценка качества сохранена. Оставьте заметку о качестве сна командой /notes",
        )],
        Outcome::NotesSaved => vec![
            Reply::text("Заметка сохранена."),
            Reply::text(
                "Вы можете использовать команду /average чтобы узнать среднюю продолжительность \
                 и качество своего сна, а также команду /date дд.мм.гггг чтобы посмотреть \
                 параметры сна за конкретный день.",
            ),
        ],
        Outcome::QualityChanged => vec![Reply::text("Оценка качества сна успешно обновлена.")],
        Outcome::NotesChanged => vec![Reply::text("Заметка о качестве сна успешно обновлена.")],
        Outcome::Deleted { discarded: true } => vec![Reply::text(
            "Последние данные удалены. Используйте команду /sleep, чтобы начать отсчет времени сна.",
        )],
        Outcome::Deleted { discarded: false } => vec![Reply::text(
            "Удалять нечего. Оценённую запись можно исправить командами /change_quality и /change_notes.",
        )],
        Outcome::Averages(averages) => {
            let duration = match averages.duration_secs {
                Some(secs) => format!(
                    "Средняя продолжительность вашего сна: {}",
                    DurationParts::from_secs(secs)
                ),
                None => "Средняя продолжительность вашего сна: пока нет завершённых записей".to_string(),
            };
            let quality = match averages.quality {
                Some(q) => format!("Среднее качество вашего сна: {q:.1} из 10"),
                None => "Среднее качество вашего сна: вы ни разу не оценили свой сон".to_string(),
            };
            vec![Reply::text(duration), Reply::text(quality)]
        }
        Outcome::DayReport { records, .. } if records.is_empty() => {
            vec![Reply::text("Данных за эту дату не найдено.")]
        }
        Outcome::DayReport { records, .. } => records.iter().map(day_report).collect(),
        Outcome::Refused { command, refusal } => vec![Reply::text(refusal_text(*command, *refusal))],
        Outcome::BadArgument { command, .. } => vec![Reply::text(format!(
            "Команда ожидается в виде '{}'",
            command.usage().unwrap_or(command.name())
        ))],
        Outcome::UnknownCommand(name) => vec![Reply::text(format!(
            "Неизвестная команда: /{name}. Список команд: /help"
        ))],
        Outcome::NotACommand => vec![Reply::text("Я понимаю только команды. Список команд: /help")],
        Outcome::Failed => vec![Reply::text(
            "Не удалось выполнить команду. Попробуйте ещё раз позже.",
        )],
    }
}

fn help_text() -> String {
    let mut help = "Доступные команды:\n".to_string();
    for command in Command::ALL {
        help.push_str(&format!("{} - {}\n", command, command.description()));
    }
    help
}

fn day_report(record: &SleepRecord) -> Reply {
    let (Some(wake_time), Some(duration)) = (record.wake_time, record.duration_secs) else {
        return Reply::text("В этот день Вы ввели не все параметры.");
    };
    let quality = record
        .quality
        .map(|q| q.to_string())
        .unwrap_or_else(|| NO_QUALITY.to_string());

    Reply::text(format!(
        "Параметры сна за {}\nВремя отхода ко сну: {}\nВремя подъема: {}\n\
         Продолжительность сна: {}\nКачество сна: {}\nЗаметка: {}",
        wake_time.format(DATE_FORMAT),
        record.sleep_time.format(TIME_FORMAT),
        wake_time.format(TIME_FORMAT),
        DurationParts::from_secs(duration),
        quality,
        record.notes.as_deref().unwrap_or(NO_NOTES),
    ))
}

fn refusal_text(command: Command, refusal: Refusal) -> &'static str {
    match (refusal, command) {
        (Refusal::NotRegistered, _) => "Сначала отправьте /start, чтобы начать работу с ботом.",
        (Refusal::AlreadyAsleep, _) => {
            "Похоже вы забыли сообщить прошлое время пробуждения. Если это действительно так, \
             используйте /delete чтобы удалить неполную запись из базы данных."
        }
        (Refusal::NotAsleep, _) => "Вы не указали время начала сна",
        (Refusal::NotAwake, _) => "Вы забыли команду /wake",
        (Refusal::AlreadySet, Command::Notes | Command::ChangeNotes) => {
            "Вы уже вносили заметку о качестве сна. Чтобы заменить последнюю заметку используйте команду /change_notes"
        }
        (Refusal::AlreadySet, _) => {
            "Вы уже вносили оценку качества сна. Чтобы заменить последнюю оценку используйте команду /change_quality"
        }
        (Refusal::NoRecord, _) => "Записей о сне пока нет. Используйте /sleep и /wake, чтобы создать запись.",
        (Refusal::InvalidValue, _) => "Оценка должна быть целым числом от 1 до 10.",
    }
}
