// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn five_field_every_hour_on_the_hour() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    let next = schedule.next_fire(at("2026-01-01T00:05:00Z")).unwrap();
    assert_eq!(next, at("2026-01-01T01:00:00Z"));
}

#[test]
fn six_field_leading_seconds_is_parsed_but_ignored_for_scheduling() {
    let schedule = CronSchedule::parse("30 0 * * * *").unwrap();
    let next = schedule.next_fire(at("2026-01-01T00:05:00Z")).unwrap();
    assert_eq!(next, at("2026-01-01T01:00:00Z"));
}

#[test]
fn step_expression_matches_every_n_minutes() {
    let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
    let next = schedule.next_fire(at("2026-01-01T00:05:00Z")).unwrap();
    assert_eq!(next, at("2026-01-01T00:15:00Z"));
}

#[test]
fn range_and_list_fields_are_supported() {
    let schedule = CronSchedule::parse("0 9-17 * * 1,3,5").unwrap();
    assert!(schedule.next_fire(at("2026-01-01T00:00:00Z")).is_some());
}

#[test]
fn invalid_expression_is_rejected() {
    assert!(CronSchedule::parse("not a cron").is_err());
}

#[test]
fn wrong_field_count_is_rejected() {
    assert!(CronSchedule::parse("* * *").is_err());
}
