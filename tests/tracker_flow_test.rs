//! End-to-end command flows against a real SQLite store
//! Run with: cargo test --test tracker_flow_test

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex, Once};
use std::thread;

use sleep_bot::application::messaging::MessageDispatcher;
use sleep_bot::application::replies::Reply;
use sleep_bot::application::services::{CommandRequest, Outcome, SleepTracker, TrackerSettings};
use sleep_bot::domain::entities::{Command, Sender, UserId, UserState};
use sleep_bot::domain::rules::Refusal;
use sleep_bot::domain::traits::{Clock, SleepStore};
use sleep_bot::infrastructure::database::Database;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

const ANNA: UserId = 1001;
const BORIS: UserId = 1002;

struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    fn starting(at: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self(Mutex::new(at)))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 14)
        .unwrap()
        .and_hms_opt(23, 30, 0)
        .unwrap()
}

struct Harness {
    store: Arc<Database>,
    clock: Arc<ManualClock>,
    dispatcher: MessageDispatcher,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(Database::open_in_memory().unwrap()), t0())
    }

    fn with_store(store: Arc<Database>, now: NaiveDateTime) -> Self {
        ensure_init();
        let clock = ManualClock::starting(now);
        let tracker = SleepTracker::new(store.clone(), clock.clone(), TrackerSettings::default());
        Self {
            store,
            clock,
            dispatcher: MessageDispatcher::new("/", tracker),
        }
    }

    fn send(&self, user: UserId, text: &str) -> Vec<String> {
        let sender = Sender::new(user).with_first_name(format!("user{user}"));
        self.dispatcher
            .process_text(user.to_string(), sender, text)
            .into_iter()
            .map(|r: Reply| r.text)
            .collect()
    }

    fn current_quality(&self, user: UserId) -> Option<i64> {
        let record = self.store.user(user).unwrap().unwrap().current_record.unwrap();
        self.store.record(record).unwrap().unwrap().quality.map(|q| q.value())
    }
}

#[test]
fn test_sleep_wake_reports_component_wise_duration() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    assert_eq!(
        h.send(ANNA, "/sleep"),
        vec!["Начали отсчёт сна, когда проснетесь, сообщите командой /wake".to_string()]
    );

    h.clock.advance(Duration::seconds(3661));
    let replies = h.send(ANNA, "/wake");
    assert_eq!(replies[0], "Доброе утро, Вы спали: 1 часов, 1 минут, 1 секунд.");
    assert_eq!(replies.len(), 2, "no long-sleep warning for an hour");

    let user = h.store.user(ANNA).unwrap().unwrap();
    let record = h.store.record(user.current_record.unwrap()).unwrap().unwrap();
    assert_eq!(record.duration_secs, Some(3661.0));
    assert!(!user.is_asleep);
}

#[test]
fn test_wake_without_sleep_is_refused_and_changes_nothing() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    let before = h.store.user(ANNA).unwrap();
    assert_eq!(h.send(ANNA, "/wake"), vec!["Вы не указали время начала сна".to_string()]);
    assert_eq!(h.store.user(ANNA).unwrap(), before);
}

#[test]
fn test_quality_twice_then_change() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(8));
    h.send(ANNA, "/wake");

    h.send(ANNA, "/quality 7");
    let refused = h.send(ANNA, "/quality 9");
    assert!(refused[0].starts_with("Вы уже вносили оценку качества сна."));
    assert_eq!(h.current_quality(ANNA), Some(7));

    assert_eq!(
        h.send(ANNA, "/change_quality 9"),
        vec!["Оценка качества сна успешно обновлена.".to_string()]
    );
    assert_eq!(h.current_quality(ANNA), Some(9));
}

#[test]
fn test_long_sleep_is_stored_with_warning() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(26) + Duration::seconds(5));
    let replies = h.send(ANNA, "/wake");
    assert_eq!(replies[0], "Доброе утро, Вы спали: 26 часов, 0 минут, 5 секунд.");
    assert!(replies[1].starts_with("Ваша продолжительность сна больше 24 часов."));

    let record = h.store.user(ANNA).unwrap().unwrap().current_record.unwrap();
    assert_eq!(
        h.store.record(record).unwrap().unwrap().duration_secs,
        Some(26.0 * 3600.0 + 5.0)
    );
}

#[test]
fn test_delete_after_long_sleep_warning_drops_the_interval() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(8));
    h.send(ANNA, "/wake");
    h.send(ANNA, "/quality 7");

    h.clock.advance(Duration::hours(14));
    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(30));
    let replies = h.send(ANNA, "/wake");
    assert!(replies[1].contains("/delete"));
    let bogus = h.store.user(ANNA).unwrap().unwrap().current_record.unwrap();

    assert_eq!(
        h.send(ANNA, "/delete"),
        vec!["Последние данные удалены. Используйте команду /sleep, чтобы начать отсчет времени сна.".to_string()]
    );
    assert!(h.store.record(bogus).unwrap().is_none());
    let user = h.store.user(ANNA).unwrap();
    assert_eq!(UserState::of(user.as_ref()), UserState::Awake { last_record: None });

    let replies = h.send(ANNA, "/average");
    assert_eq!(replies[0], "Средняя продолжительность вашего сна: 8 часов, 0 минут, 0 секунд");
    assert_eq!(replies[1], "Среднее качество вашего сна: 7.0 из 10");
}

#[test]
fn test_delete_keeps_rated_record() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(8));
    h.send(ANNA, "/wake");
    h.send(ANNA, "/quality 5");

    assert!(h.send(ANNA, "/delete")[0].starts_with("Удалять нечего."));
    assert_eq!(h.current_quality(ANNA), Some(5));
}

#[test]
fn test_average_without_ratings_is_distinct_from_zero() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(6));
    h.send(ANNA, "/wake");

    let replies = h.send(ANNA, "/average");
    assert_eq!(replies[0], "Средняя продолжительность вашего сна: 6 часов, 0 минут, 0 секунд");
    assert_eq!(replies[1], "Среднее качество вашего сна: вы ни разу не оценили свой сон");
}

#[test]
fn test_average_is_global_by_default() {
    let h = Harness::new();
    for (user, hours, quality) in [(ANNA, 6, "4"), (BORIS, 8, "8")] {
        h.send(user, "/start");
        h.send(user, "/sleep");
        h.clock.advance(Duration::hours(hours));
        h.send(user, "/wake");
        h.send(user, &format!("/quality {quality}"));
    }
    let replies = h.send(ANNA, "/average");
    assert_eq!(replies[0], "Средняя продолжительность вашего сна: 7 часов, 0 минут, 0 секунд");
    assert_eq!(replies[1], "Среднее качество вашего сна: 6.0 из 10");
}

#[test]
fn test_date_lookup() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    assert_eq!(h.send(ANNA, "/date 15.03.2024"), vec!["Данных за эту дату не найдено.".to_string()]);

    h.send(ANNA, "/sleep");
    h.clock.advance(Duration::hours(7) + Duration::minutes(45));
    h.send(ANNA, "/wake");
    h.send(ANNA, "/notes снились горы");

    let replies = h.send(ANNA, "/date 15.03.2024");
    assert_eq!(
        replies,
        vec!["Параметры сна за 15.03.2024\nВремя отхода ко сну: 23:30:00\nВремя подъема: 07:15:00\n\
              Продолжительность сна: 7 часов, 45 минут, 0 секунд\nКачество сна: оценка не была внесена\n\
              Заметка: снились горы"
            .to_string()]
    );

    // Matched on the wake date, not the sleep date
    assert_eq!(h.send(ANNA, "/date 14.03.2024"), vec!["Данных за эту дату не найдено.".to_string()]);
    assert_eq!(h.send(ANNA, "/date 2024-03-15"), vec!["Команда ожидается в виде '/date вставьте свою дату'".to_string()]);
}

#[test]
fn test_date_lookup_with_no_records_changes_nothing() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    let before = h.store.user(ANNA).unwrap();
    h.send(ANNA, "/date 15.03.2024");
    assert_eq!(h.store.user(ANNA).unwrap(), before);
}

#[test]
fn test_delete_with_no_open_record_is_a_no_op() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    let replies = h.send(ANNA, "/delete");
    assert_eq!(replies.len(), 1);
    let user = h.store.user(ANNA).unwrap().unwrap();
    assert!(!user.is_asleep);
    assert_eq!(user.current_record, None);
}

#[test]
fn test_forgotten_wake_recovered_with_delete() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    let warning = h.send(ANNA, "/sleep");
    assert!(warning[0].contains("/delete"));

    h.send(ANNA, "/delete");
    let user = h.store.user(ANNA).unwrap();
    assert_eq!(UserState::of(user.as_ref()), UserState::Awake { last_record: None });
    assert_eq!(h.send(ANNA, "/sleep").len(), 1);
    assert!(h.store.user(ANNA).unwrap().unwrap().is_asleep);
}

#[test]
fn test_notes_guards_and_change() {
    let h = Harness::new();
    h.send(ANNA, "/start");
    h.send(ANNA, "/sleep");
    assert_eq!(h.send(ANNA, "/notes рано"), vec!["Вы забыли команду /wake".to_string()]);
    h.clock.advance(Duration::hours(8));
    h.send(ANNA, "/wake");

    assert_eq!(h.send(ANNA, "/notes"), vec!["Команда ожидается в виде '/notes вставьте свой текст'".to_string()]);
    assert_eq!(h.send(ANNA, "/notes спал крепко").len(), 2);
    assert!(h.send(ANNA, "/notes ещё")[0].contains("/change_notes"));
    h.send(ANNA, "/change_notes спал очень крепко");

    let record = h.store.user(ANNA).unwrap().unwrap().current_record.unwrap();
    assert_eq!(
        h.store.record(record).unwrap().unwrap().notes.as_deref(),
        Some("спал очень крепко")
    );
}

#[test]
fn test_concurrent_sleep_opens_one_record() {
    ensure_init();
    let store = Arc::new(Database::open_in_memory().unwrap());
    store.register_user(ANNA, "Анна").unwrap();
    let tracker = Arc::new(SleepTracker::new(
        store.clone(),
        ManualClock::starting(t0()),
        TrackerSettings::default(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                tracker.handle(&CommandRequest {
                    user_id: ANNA,
                    display_name: "Анна",
                    command: "sleep",
                    args: "",
                })
            })
        })
        .collect();
    let outcomes: Vec<Outcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let started = outcomes.iter().filter(|o| matches!(o, Outcome::SleepStarted(_))).count();
    let refused = outcomes
        .iter()
        .filter(|o| {
            **o == Outcome::Refused {
                command: Command::Sleep,
                refusal: Refusal::AlreadyAsleep,
            }
        })
        .count();
    assert_eq!(started, 1);
    assert_eq!(refused, 7);
    assert!(store.user(ANNA).unwrap().unwrap().is_asleep);
}

#[test]
fn test_concurrent_users_do_not_block_each_other() {
    ensure_init();
    let store = Arc::new(Database::open_in_memory().unwrap());
    let tracker = Arc::new(SleepTracker::new(
        store.clone(),
        ManualClock::starting(t0()),
        TrackerSettings::default(),
    ));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                let user = 5000 + i;
                for command in ["start", "sleep", "wake"] {
                    tracker.handle(&CommandRequest {
                        user_id: user,
                        display_name: "user",
                        command,
                        args: "",
                    });
                }
                user
            })
        })
        .collect();

    for handle in handles {
        let user = handle.join().unwrap();
        let row = store.user(user).unwrap().unwrap();
        assert!(!row.is_asleep);
        let record = store.record(row.current_record.unwrap()).unwrap().unwrap();
        assert_eq!(record.duration_secs, Some(0.0));
    }
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sleep_bot.db");

    {
        let h = Harness::with_store(Arc::new(Database::new(&path).unwrap()), t0());
        h.send(ANNA, "/start");
        h.send(ANNA, "/sleep");
    }

    let h = Harness::with_store(Arc::new(Database::new(&path).unwrap()), t0() + Duration::hours(8));
    assert!(h.store.user(ANNA).unwrap().unwrap().is_asleep);
    let replies = h.send(ANNA, "/wake");
    assert_eq!(replies[0], "Доброе утро, Вы спали: 8 часов, 0 минут, 0 секунд.");
}
