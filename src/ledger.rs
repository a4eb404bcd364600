use crate::models::{
    AttendanceRecord, Day, DayStats, Person, RosterPerson, RosterStats, Status, StatusFilter,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A person joined with their record for the day being shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceCard {
    pub person: Person,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
}

pub fn attendance_cards(
    people: &[Person],
    records: &[AttendanceRecord],
    day: Day,
) -> Vec<AttendanceCard> {
    let mut by_person = HashMap::new();
    for record in records.iter().filter(|record| record.day == day) {
        by_person.entry(record.person_id).or_insert(record);
    }

    people
        .iter()
        .map(|person| {
            let record = by_person.get(&person.id);
            AttendanceCard {
                person: person.clone(),
                check_in: record.and_then(|r| r.check_in),
                check_out: record.and_then(|r| r.check_out),
            }
        })
        .collect()
}

pub fn day_stats(people: &[Person], records: &[AttendanceRecord], day: Day) -> DayStats {
    let of_day = records.iter().filter(|record| record.day == day);
    let (check_ins, check_outs) = of_day.fold((0, 0), |(ins, outs), record| {
        (
            ins + usize::from(record.check_in.is_some()),
            outs + usize::from(record.check_out.is_some()),
        )
    });

    DayStats {
        day,
        total_people: people.len(),
        check_ins,
        check_outs,
    }
}

pub fn filter_roster(people: &[RosterPerson], filter: StatusFilter) -> Vec<RosterPerson> {
    people
        .iter()
        .filter(|person| filter.matches(person.status))
        .cloned()
        .collect()
}

pub fn roster_stats(people: &[RosterPerson]) -> RosterStats {
    let mut stats = RosterStats {
        total: people.len(),
        ..RosterStats::default()
    };
    for person in people {
        match person.status {
            Status::Pending => stats.pending += 1,
            Status::Attended => stats.attended += 1,
            Status::NotAttended => stats.not_attended += 1,
        }
    }
    stats
}
