//! Display buckets for the task list.
//!
//! A task lands in exactly one bucket, checked in this order:
//! completed tasks go to `Completed`, a due date already passed goes to
//! `Overdue`, a due date later today goes to `Today`, and everything
//! else (including tasks without a due date) goes to `Upcoming`.

use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::models::Task;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    Overdue,
    Today,
    Upcoming,
    Completed,
}

impl Bucket {
    /// Order the buckets are shown in.
    pub const DISPLAY_ORDER: [Bucket; 4] = [
        Bucket::Overdue,
        Bucket::Today,
        Bucket::Upcoming,
        Bucket::Completed,
    ];
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Bucket::Overdue => "Overdue",
            Bucket::Today => "Today",
            Bucket::Upcoming => "Upcoming",
            Bucket::Completed => "Completed",
        };
        f.write_str(label)
    }
}

/// `now` carries the time zone used to decide what "today" means.
pub fn bucket_for<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Bucket {
    if task.is_completed() {
        return Bucket::Completed;
    }
    match task.due_date {
        Some(due) if due < now.with_timezone(&chrono::Utc) => Bucket::Overdue,
        Some(due) if due.with_timezone(&now.timezone()).date_naive() == now.date_naive() => {
            Bucket::Today
        }
        _ => Bucket::Upcoming,
    }
}

#[derive(Debug, Default)]
pub struct Grouped<'a> {
    pub overdue: Vec<&'a Task>,
    pub today: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

impl<'a> Grouped<'a> {
    pub fn bucket(&self, bucket: Bucket) -> &[&'a Task] {
        match bucket {
            Bucket::Overdue => &self.overdue,
            Bucket::Today => &self.today,
            Bucket::Upcoming => &self.upcoming,
            Bucket::Completed => &self.completed,
        }
    }

    pub fn len(&self) -> usize {
        self.overdue.len() + self.today.len() + self.upcoming.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tasks in display order, tagged with their bucket.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &'a Task)> + '_ {
        Bucket::DISPLAY_ORDER
            .into_iter()
            .flat_map(move |bucket| self.bucket(bucket).iter().map(move |task| (bucket, *task)))
    }
}

/// Partitions `tasks` into buckets, keeping list order within each bucket.
pub fn group_tasks<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Grouped<'a> {
    let mut grouped = Grouped::default();
    for task in tasks {
        match bucket_for(task, now) {
            Bucket::Overdue => grouped.overdue.push(task),
            Bucket::Today => grouped.today.push(task),
            Bucket::Upcoming => grouped.upcoming.push(task),
            Bucket::Completed => grouped.completed.push(task),
        }
    }
    grouped
}
