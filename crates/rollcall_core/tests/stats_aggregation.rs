use chrono::{NaiveDate, NaiveDateTime};
use rollcall_core::db::open_db_in_memory;
use rollcall_core::{
    AbsenceAccounting, AttendanceRecord, AttendanceStore, PresenceStatus, SqliteAttendanceStore,
    SqlitePersonDirectory, StatsService,
};
use rusqlite::Connection;
use uuid::Uuid;

fn local(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn seed_person(conn: &Connection, name: &str) -> Uuid {
    let uuid = Uuid::new_v4();
    conn.execute(
        "INSERT INTO people (uuid, display_name, department) VALUES (?1, ?2, NULL);",
        rusqlite::params![uuid.to_string(), name],
    )
    .unwrap();
    uuid
}

fn seed_record(conn: &Connection, person: Uuid, status: PresenceStatus, at: NaiveDateTime) {
    let store = SqliteAttendanceStore::try_new(conn).unwrap();
    let record = AttendanceRecord::new(person, status, Uuid::new_v4(), at);
    store.create_if_absent(&record).unwrap();
}

fn stats_over<'conn>(
    conn: &'conn Connection,
    accounting: AbsenceAccounting,
) -> StatsService<SqlitePersonDirectory<'conn>, SqliteAttendanceStore<'conn>> {
    StatsService::new(
        SqlitePersonDirectory::try_new(conn).unwrap(),
        SqliteAttendanceStore::try_new(conn).unwrap(),
        accounting,
    )
}

#[test]
fn daily_stats_counts_match_raw_day_query() {
    let conn = open_db_in_memory().unwrap();
    let a = seed_person(&conn, "Ada");
    let b = seed_person(&conn, "Bea");
    let c = seed_person(&conn, "Cal");
    let d = seed_person(&conn, "Dee");
    seed_record(&conn, a, PresenceStatus::Present, local(10, 7, 50));
    seed_record(&conn, b, PresenceStatus::Present, local(10, 8, 5));
    seed_record(&conn, c, PresenceStatus::Late, local(10, 9, 0));
    seed_record(&conn, d, PresenceStatus::Absent, local(10, 17, 0));

    let stats = stats_over(&conn, AbsenceAccounting::ExplicitOnly);
    let aggregate = stats.daily_stats(day(10)).unwrap();

    assert_eq!(aggregate.present, 2);
    assert_eq!(aggregate.late, 1);
    assert_eq!(aggregate.absent, 1);
    assert_eq!(aggregate.total_persons, 4);

    // The aggregator must agree with counts derived from the raw store.
    let store = SqliteAttendanceStore::try_new(&conn).unwrap();
    let records = store.query_by_day(day(10)).unwrap();
    let raw_present = records
        .iter()
        .filter(|r| r.status == PresenceStatus::Present)
        .count() as u64;
    let raw_late = records
        .iter()
        .filter(|r| r.status == PresenceStatus::Late)
        .count() as u64;
    let raw_absent = records
        .iter()
        .filter(|r| r.status == PresenceStatus::Absent)
        .count() as u64;
    assert_eq!(aggregate.present, raw_present);
    assert_eq!(aggregate.late, raw_late);
    assert_eq!(aggregate.absent, raw_absent);
}

#[test]
fn explicit_only_accounting_ignores_unscanned_persons() {
    let conn = open_db_in_memory().unwrap();
    let scanned = seed_person(&conn, "Ada");
    seed_person(&conn, "Bea");
    seed_person(&conn, "Cal");
    seed_record(&conn, scanned, PresenceStatus::Present, local(10, 8, 0));

    let stats = stats_over(&conn, AbsenceAccounting::ExplicitOnly);
    let aggregate = stats.daily_stats(day(10)).unwrap();

    assert_eq!(aggregate.present, 1);
    assert_eq!(aggregate.absent, 0, "no-record persons are not absent");
    assert_eq!(aggregate.total_persons, 3);
}

#[test]
fn count_unscanned_accounting_adds_missing_persons_to_absent() {
    let conn = open_db_in_memory().unwrap();
    let present = seed_person(&conn, "Ada");
    let explicit_absent = seed_person(&conn, "Bea");
    seed_person(&conn, "Cal");
    seed_person(&conn, "Dee");
    seed_record(&conn, present, PresenceStatus::Present, local(10, 8, 0));
    seed_record(&conn, explicit_absent, PresenceStatus::Absent, local(10, 16, 30));

    let stats = stats_over(&conn, AbsenceAccounting::CountUnscanned);
    let aggregate = stats.daily_stats(day(10)).unwrap();

    // One explicit absent plus two persons with no record at all.
    assert_eq!(aggregate.present, 1);
    assert_eq!(aggregate.absent, 3);
    assert_eq!(aggregate.total_persons, 4);
}

#[test]
fn daily_stats_is_idempotent_without_intervening_writes() {
    let conn = open_db_in_memory().unwrap();
    let person = seed_person(&conn, "Ada");
    seed_record(&conn, person, PresenceStatus::Late, local(10, 9, 0));

    let stats = stats_over(&conn, AbsenceAccounting::ExplicitOnly);
    let first = stats.daily_stats(day(10)).unwrap();
    let second = stats.daily_stats(day(10)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn new_record_is_visible_to_the_next_daily_stats_read() {
    let conn = open_db_in_memory().unwrap();
    let a = seed_person(&conn, "Ada");
    let b = seed_person(&conn, "Bea");
    seed_record(&conn, a, PresenceStatus::Present, local(10, 8, 0));

    let stats = stats_over(&conn, AbsenceAccounting::ExplicitOnly);
    let before = stats.daily_stats(day(10)).unwrap();
    assert_eq!(before.present, 1);

    seed_record(&conn, b, PresenceStatus::Present, local(10, 8, 10));
    let after = stats.daily_stats(day(10)).unwrap();
    assert_eq!(after.present, before.present + 1);
}

#[test]
fn trend_returns_consecutive_days_oldest_first() {
    let conn = open_db_in_memory().unwrap();
    let person = seed_person(&conn, "Ada");
    seed_record(&conn, person, PresenceStatus::Present, local(9, 8, 0));
    seed_record(&conn, person, PresenceStatus::Late, local(11, 9, 0));

    let stats = stats_over(&conn, AbsenceAccounting::ExplicitOnly);
    let series = stats.trend(day(12), 7).unwrap();

    assert_eq!(series.len(), 7);
    assert_eq!(series[0].day, day(6));
    assert_eq!(series[6].day, day(12));

    let by_day = |d: NaiveDate| series.iter().find(|a| a.day == d).unwrap();
    assert_eq!(by_day(day(9)).present, 1);
    assert_eq!(by_day(day(11)).late, 1);
    assert_eq!(by_day(day(10)).present + by_day(day(10)).late + by_day(day(10)).absent, 0);
}

#[test]
fn trend_with_zero_days_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let stats = stats_over(&conn, AbsenceAccounting::ExplicitOnly);
    assert!(stats.trend(day(12), 0).unwrap().is_empty());
}
