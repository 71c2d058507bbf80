//! Dashboard statistics: overview, charts, calendar heat map, per-subject
//! progress, the leaderboard and the learning streak.
//!
//! The store is only asked for flat rows (creation times, statuses, counts);
//! bucketing and ranking happen in the pure functions below so that they can
//! be tested without a database.

use super::*;
use crate::period::{self, DateRange, Period};
use chrono::{Datelike, DateTime, Duration, Local, NaiveDate, Utc, Weekday};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

pub const RANKING_SIZE: usize = 10;
pub const SCORE_PER_MASTERED: i64 = 8;
pub const CALENDAR_DAYS: i64 = 21;
pub const WEEK_CHART_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsType {
    Overview,
    Chart,
    Calendar,
    Subjects,
    Rankings,
    All,
}

impl Default for StatsType {
    fn default() -> StatsType {
        StatsType::All
    }
}

impl StatsType {
    pub fn includes(&self, other: StatsType) -> bool {
        *self == StatsType::All || *self == other
    }
}

impl FromStr for StatsType {
    type Err = Error;

    fn from_str(s: &str) -> Result<StatsType> {
        match s {
            "overview" => Ok(StatsType::Overview),
            "chart" => Ok(StatsType::Chart),
            "calendar" => Ok(StatsType::Calendar),
            "subjects" => Ok(StatsType::Subjects),
            "rankings" => Ok(StatsType::Rankings),
            "all" => Ok(StatsType::All),
            other => Err(ErrorKind::InvalidInput(format!("unknown stats type {:?}", other)).into()),
        }
    }
}

/// One question as far as the statistics care: the local day it was created
/// on, and whether it is mastered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub day: NaiveDate,
    pub mastered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_questions: i64,
    pub mastered_questions: i64,
    pub pending_questions: i64,
    pub mastery_rate: i64,
}

impl Overview {
    pub fn from_counts(total_questions: i64, mastered_questions: i64) -> Overview {
        Overview {
            total_questions,
            mastered_questions,
            pending_questions: total_questions - mastered_questions,
            mastery_rate: percentage(mastered_questions, total_questions),
        }
    }
}

/// `round(part / whole * 100)`, zero for an empty whole.
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chart {
    pub labels: Vec<String>,
    pub collected: Vec<i64>,
    pub mastered: Vec<i64>,
}

struct Bucket {
    label: String,
    first: NaiveDate,
    last: NaiveDate,
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "周一",
        Weekday::Tue => "周二",
        Weekday::Wed => "周三",
        Weekday::Thu => "周四",
        Weekday::Fri => "周五",
        Weekday::Sat => "周六",
        Weekday::Sun => "周日",
    }
}

fn chart_buckets(period: Period, today: NaiveDate, oldest: Option<NaiveDate>) -> Vec<Bucket> {
    match period {
        Period::Week => period::trailing_days(today, WEEK_CHART_DAYS)
            .into_iter()
            .map(|day| Bucket { label: weekday_label(day.weekday()).to_string(), first: day, last: day })
            .collect(),
        Period::Month => (1..=period::days_in_month(today.year(), today.month()))
            .map(|d| {
                let day = NaiveDate::from_ymd(today.year(), today.month(), d);
                Bucket { label: format!("{}日", d), first: day, last: day }
            })
            .collect(),
        Period::Year => (1..=12)
            .map(|m| {
                let first = NaiveDate::from_ymd(today.year(), m, 1);
                let last = NaiveDate::from_ymd(today.year(), m, period::days_in_month(today.year(), m));
                Bucket { label: format!("{}月", m), first, last }
            })
            .collect(),
        Period::Total => {
            let first_year = oldest.map(|d| d.year()).unwrap_or_else(|| today.year()).min(today.year());
            (first_year..=today.year())
                .map(|y| Bucket {
                    label: format!("{}年", y),
                    first: NaiveDate::from_ymd(y, 1, 1),
                    last: NaiveDate::from_ymd(y, 12, 31),
                })
                .collect()
        }
    }
}

/// The days the chart of a period spans; the store only needs to be asked about these.
pub fn chart_span(period: Period, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match period {
        Period::Week => Some((today - Duration::days(WEEK_CHART_DAYS - 1), today)),
        Period::Month => Some((
            NaiveDate::from_ymd(today.year(), today.month(), 1),
            NaiveDate::from_ymd(today.year(), today.month(), period::days_in_month(today.year(), today.month())),
        )),
        Period::Year => Some((NaiveDate::from_ymd(today.year(), 1, 1), NaiveDate::from_ymd(today.year(), 12, 31))),
        Period::Total => None,
    }
}

pub fn chart(period: Period, today: NaiveDate, activity: &[Activity]) -> Chart {
    let oldest = activity.iter().map(|a| a.day).min();
    let buckets = chart_buckets(period, today, oldest);

    let mut chart = Chart {
        labels: Vec::with_capacity(buckets.len()),
        collected: Vec::with_capacity(buckets.len()),
        mastered: Vec::with_capacity(buckets.len()),
    };

    for bucket in buckets {
        let in_bucket = activity.iter().filter(|a| a.day >= bucket.first && a.day <= bucket.last);
        let (collected, mastered) = in_bucket.fold((0, 0), |(c, m), a| (c + 1, m + a.mastered as i64));
        chart.labels.push(bucket.label);
        chart.collected.push(collected);
        chart.mastered.push(mastered);
    }
    chart
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day: u32,
    pub is_empty: bool,
    pub error_count: i64,
    pub is_today: bool,
}

pub fn calendar_span(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(CALENDAR_DAYS - 1), today)
}

pub fn calendar(today: NaiveDate, activity: &[Activity]) -> Vec<CalendarDay> {
    let mut per_day: HashMap<NaiveDate, i64> = HashMap::new();
    for a in activity {
        *per_day.entry(a.day).or_insert(0) += 1;
    }

    period::trailing_days(today, CALENDAR_DAYS)
        .into_iter()
        .map(|date| CalendarDay {
            date,
            day: date.day(),
            is_empty: date.month() != today.month() || date.year() != today.year(),
            error_count: per_day.get(&date).cloned().unwrap_or(0),
            is_today: date == today,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub total_questions: i64,
    pub mastered_questions: i64,
    pub progress: i64,
}

impl SubjectProgress {
    pub fn new(subject: &Subject, total_questions: i64, mastered_questions: i64) -> SubjectProgress {
        let style = subject::style_for(&subject.name);
        SubjectProgress {
            id: subject.id,
            name: subject.name.clone(),
            icon: style.icon.to_string(),
            color: style.color.to_string(),
            total_questions,
            mastered_questions,
            progress: percentage(mastered_questions, total_questions),
        }
    }
}

/// Most questions first. The sort is stable, so ties keep the given order.
pub fn sort_subject_progress(progress: &mut Vec<SubjectProgress>) {
    progress.sort_by(|a, b| b.total_questions.cmp(&a.total_questions));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub user_id: i32,
    pub name: String,
    pub position: usize,
    pub mastered_count: i64,
    pub score: i64,
    pub is_current_user: bool,
}

/// A user's standing: id, display name, mastered count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub user_id: i32,
    pub name: String,
    pub mastered: i64,
}

/// Orders everyone by mastered count (ties by user id), keeps the top
/// `RANKING_SIZE`, and appends the current user's own entry when they fell
/// outside of it.
pub fn rankings(mut standings: Vec<Standing>, current_user: i32) -> Vec<RankingEntry> {
    standings.sort_by(|a, b| b.mastered.cmp(&a.mastered).then(a.user_id.cmp(&b.user_id)));

    let entry = |index: usize, s: &Standing| RankingEntry {
        user_id: s.user_id,
        name: s.name.clone(),
        position: index + 1,
        mastered_count: s.mastered,
        score: s.mastered * SCORE_PER_MASTERED,
        is_current_user: s.user_id == current_user,
    };

    let mut entries: Vec<RankingEntry> = standings.iter()
        .take(RANKING_SIZE)
        .enumerate()
        .map(|(i, s)| entry(i, s))
        .collect();

    if !entries.iter().any(|e| e.is_current_user) {
        match standings.iter().position(|s| s.user_id == current_user) {
            Some(index) => entries.push(entry(index, &standings[index])),
            None => {
                warn!("User {} is missing from the standings!", current_user);
                entries.push(RankingEntry {
                    user_id: current_user,
                    name: String::new(),
                    position: standings.len() + 1,
                    mastered_count: 0,
                    score: 0,
                    is_current_user: true,
                });
            }
        }
    }
    entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub current_streak: i64,
    pub best_streak: i64,
    pub has_activity_today: bool,
}

/// Consecutive active days ending today, or ending yesterday when nothing
/// has happened yet today. `best_streak` is the longest run ever.
pub fn streak(today: NaiveDate, days: &[NaiveDate]) -> Streak {
    let days: BTreeSet<NaiveDate> = days.iter().cloned().filter(|d| *d <= today).collect();
    let has_activity_today = days.contains(&today);

    let mut current = 0;
    let mut cursor = if has_activity_today { today } else { today - Duration::days(1) };
    while days.contains(&cursor) {
        current += 1;
        cursor = cursor - Duration::days(1);
    }

    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &day in &days {
        run = match previous {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    Streak { current_streak: current, best_streak: best.max(current), has_activity_today }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<Overview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<Chart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<Vec<CalendarDay>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<SubjectProgress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rankings: Option<Vec<RankingEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<Streak>,
}

pub fn count_questions(conn: &PgConnection, user_id: i32, range: &DateRange, mastered_only: bool) -> Result<i64> {
    use crate::schema::questions;

    let mut query = questions::table
        .filter(questions::user_id.eq(user_id))
        .filter(questions::created_at.ge(range.start))
        .filter(questions::created_at.le(range.end))
        .into_boxed();

    if mastered_only {
        query = query.filter(questions::status.eq(STATUS_SOLVED));
    }

    Ok(query.count().get_result(conn)?)
}

/// Creation day and mastery of the user's questions, optionally limited to a range.
pub fn load_activity(conn: &PgConnection, user_id: i32, range: Option<&DateRange>) -> Result<Vec<Activity>> {
    use crate::schema::questions;

    let mut query = questions::table
        .filter(questions::user_id.eq(user_id))
        .select((questions::created_at, questions::status))
        .order(questions::created_at.desc())
        .into_boxed();

    if let Some(range) = range {
        query = query
            .filter(questions::created_at.ge(range.start))
            .filter(questions::created_at.le(range.end));
    }

    let rows: Vec<(DateTime<Utc>, String)> = query.load(conn)?;

    Ok(rows.iter()
        .map(|(created, status)| Activity { day: period::local_day(created), mastered: is_mastered(status) })
        .collect())
}

pub fn overview(conn: &PgConnection, user_id: i32, range: &DateRange) -> Result<Overview> {
    let total = count_questions(conn, user_id, range, false)?;
    let mastered = count_questions(conn, user_id, range, true)?;
    Ok(Overview::from_counts(total, mastered))
}

pub fn subject_progress(conn: &PgConnection, user_id: i32, range: &DateRange) -> Result<Vec<SubjectProgress>> {
    use crate::schema::questions;

    let subjects = subject::all(conn, user_id)?;

    let rows: Vec<(i32, String)> = questions::table
        .filter(questions::user_id.eq(user_id))
        .filter(questions::created_at.ge(range.start))
        .filter(questions::created_at.le(range.end))
        .select((questions::subject_id, questions::status))
        .load(conn)?;

    let mut counts: HashMap<i32, (i64, i64)> = HashMap::new();
    for (subject_id, status) in &rows {
        let entry = counts.entry(*subject_id).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += is_mastered(status) as i64;
    }

    let mut progress: Vec<SubjectProgress> = subjects.iter()
        .map(|s| {
            let (total, mastered) = counts.get(&s.id).cloned().unwrap_or((0, 0));
            SubjectProgress::new(s, total, mastered)
        })
        .collect();

    sort_subject_progress(&mut progress);
    Ok(progress)
}

pub fn standings(conn: &PgConnection) -> Result<Vec<Standing>> {
    use crate::schema::{users, questions};
    use diesel::dsl::count_star;

    let all_users: Vec<(i32, String)> = users::table
        .select((users::id, users::email))
        .load(conn)?;

    let mastered: Vec<(i32, i64)> = questions::table
        .filter(questions::status.eq(STATUS_SOLVED))
        .group_by(questions::user_id)
        .select((questions::user_id, count_star()))
        .load(conn)?;
    let mastered: HashMap<i32, i64> = mastered.into_iter().collect();

    Ok(all_users.into_iter()
        .map(|(user_id, email)| Standing {
            user_id,
            name: user::display_name(&email).to_string(),
            mastered: mastered.get(&user_id).cloned().unwrap_or(0),
        })
        .collect())
}

pub fn load_streak(conn: &PgConnection, user_id: i32, today: NaiveDate) -> Result<Streak> {
    let days: Vec<NaiveDate> = load_activity(conn, user_id, None)?
        .into_iter()
        .map(|a| a.day)
        .collect();
    Ok(streak(today, &days))
}

/// Computes the requested parts of the dashboard. Any store failure fails the whole thing.
pub fn compute(conn: &PgConnection,
               user_id: i32,
               period: Period,
               stats_type: StatsType,
               now: DateTime<Local>)
               -> Result<StatsData> {

    let today = now.naive_local().date();
    let range = period.range(today);
    let mut data = StatsData::default();

    if stats_type.includes(StatsType::Overview) {
        data.overview = Some(time_it!("stats::overview", overview(conn, user_id, &range))?);
    }

    if stats_type.includes(StatsType::Chart) {
        let span = chart_span(period, today).map(|(first, last)| DateRange::days(first, last));
        let activity = time_it!("stats::chart", load_activity(conn, user_id, span.as_ref()))?;
        data.chart = Some(chart(period, today, &activity));
    }

    if stats_type.includes(StatsType::Calendar) {
        let (first, last) = calendar_span(today);
        let activity = time_it!("stats::calendar",
                                load_activity(conn, user_id, Some(&DateRange::days(first, last))))?;
        data.calendar = Some(calendar(today, &activity));
    }

    if stats_type.includes(StatsType::Subjects) {
        data.subjects = Some(time_it!("stats::subjects", subject_progress(conn, user_id, &range))?);
    }

    if stats_type.includes(StatsType::Rankings) {
        let standings = time_it!("stats::rankings", standings(conn))?;
        data.rankings = Some(rankings(standings, user_id));
    }

    if stats_type == StatsType::All {
        data.streak = Some(time_it!("stats::streak", load_streak(conn, user_id, today))?);
    }

    Ok(data)
}

#[cfg(test)]
fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd(y, m, d)
}

#[cfg(test)]
fn activity(day: NaiveDate, mastered: bool) -> Activity {
    Activity { day, mastered }
}

#[test]
fn test_overview_counts() {
    assert_eq!(Overview::from_counts(10, 7),
               Overview { total_questions: 10, mastered_questions: 7, pending_questions: 3, mastery_rate: 70 });
    assert_eq!(Overview::from_counts(0, 0),
               Overview { total_questions: 0, mastered_questions: 0, pending_questions: 0, mastery_rate: 0 });
    assert_eq!(Overview::from_counts(3, 1).mastery_rate, 33);
    assert_eq!(Overview::from_counts(3, 2).mastery_rate, 67);
    assert_eq!(Overview::from_counts(8, 8).mastery_rate, 100);
}

#[test]
fn test_overview_invariants() {
    for total in 0..30 {
        for mastered in 0..=total {
            let o = Overview::from_counts(total, mastered);
            assert_eq!(o.pending_questions + o.mastered_questions, o.total_questions);
            assert!(o.mastery_rate >= 0 && o.mastery_rate <= 100);
            assert_eq!(o.mastery_rate == 0, total == 0 || mastered == 0);
        }
    }
}

#[test]
fn test_stats_type_parsing() {
    assert_eq!("rankings".parse::<StatsType>().unwrap(), StatsType::Rankings);
    assert_eq!(StatsType::default(), StatsType::All);
    assert!("everything".parse::<StatsType>().is_err());
    assert!(StatsType::All.includes(StatsType::Chart));
    assert!(StatsType::Chart.includes(StatsType::Chart));
    assert!(!StatsType::Chart.includes(StatsType::Overview));
}

#[test]
fn test_week_chart() {
    let today = day(2026, 10, 16); // Friday
    let data = vec![
        activity(today, true),
        activity(today, false),
        activity(day(2026, 10, 10), false), // six days ago, the oldest bucket
        activity(day(2026, 10, 9), true),   // out of the window
    ];
    let c = chart(Period::Week, today, &data);
    assert_eq!(c.labels.len(), 7);
    assert_eq!(c.collected.len(), 7);
    assert_eq!(c.mastered.len(), 7);
    assert_eq!(c.labels[6], "周五");
    assert_eq!(c.labels[0], "周六");
    assert_eq!(c.collected, vec![1, 0, 0, 0, 0, 0, 2]);
    assert_eq!(c.mastered, vec![0, 0, 0, 0, 0, 0, 1]);
}

#[test]
fn test_week_chart_empty() {
    let c = chart(Period::Week, day(2026, 1, 1), &[]);
    assert_eq!(c.labels.len(), 7);
    assert!(c.collected.iter().all(|&n| n == 0));
}

#[test]
fn test_month_and_year_chart() {
    let today = day(2026, 2, 10);
    let data = vec![activity(day(2026, 2, 1), true), activity(day(2026, 2, 28), false), activity(day(2026, 1, 31), false)];

    let month = chart(Period::Month, today, &data);
    assert_eq!(month.labels.len(), 28);
    assert_eq!(month.labels[0], "1日");
    assert_eq!(month.labels[27], "28日");
    assert_eq!(month.collected[0], 1);
    assert_eq!(month.mastered[0], 1);
    assert_eq!(month.collected[27], 1);
    assert_eq!(month.collected.iter().sum::<i64>(), 2);

    let year = chart(Period::Year, today, &data);
    assert_eq!(year.labels.len(), 12);
    assert_eq!(year.labels[0], "1月");
    assert_eq!(year.collected[0], 1);
    assert_eq!(year.collected[1], 2);
    assert_eq!(year.mastered[1], 1);
}

#[test]
fn test_total_chart() {
    let today = day(2026, 10, 16);
    let data = vec![activity(day(2024, 5, 1), true), activity(day(2026, 1, 1), false)];
    let c = chart(Period::Total, today, &data);
    assert_eq!(c.labels, vec!["2024年", "2025年", "2026年"]);
    assert_eq!(c.collected, vec![1, 0, 1]);
    assert_eq!(c.mastered, vec![1, 0, 0]);

    let empty = chart(Period::Total, today, &[]);
    assert_eq!(empty.labels, vec!["2026年"]);
}

#[test]
fn test_calendar() {
    let today = day(2026, 10, 5);
    let data = vec![activity(today, false), activity(today, true), activity(day(2026, 9, 20), false)];
    let cal = calendar(today, &data);
    assert_eq!(cal.len(), 21);
    assert_eq!(cal.iter().filter(|d| d.is_today).count(), 1);
    assert!(cal[20].is_today);
    assert_eq!(cal[20].error_count, 2);
    assert_eq!(cal[0].date, day(2026, 9, 15));
    assert_eq!(cal[0].day, 15);
    assert!(cal[0].is_empty);
    assert_eq!(cal[5].error_count, 1);
    // October 1st onwards is in the current month
    assert!(!cal[16].is_empty);
    assert!(cal[15].is_empty);
}

#[test]
fn test_subject_progress_sorting() {
    use chrono::TimeZone;
    let subject = |id: i32, name: &str| Subject {
        id,
        user_id: 1,
        name: name.into(),
        color: "#000000".into(),
        icon: "x".into(),
        created_at: Utc.ymd(2026, 1, 1).and_hms(0, 0, 0),
    };
    let mut progress = vec![
        SubjectProgress::new(&subject(1, "物理"), 2, 1),
        SubjectProgress::new(&subject(2, "数学"), 5, 5),
        SubjectProgress::new(&subject(3, "Art"), 0, 0),
        SubjectProgress::new(&subject(4, "化学"), 2, 0),
    ];
    sort_subject_progress(&mut progress);
    let ids: Vec<i32> = progress.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 1, 4, 3]);
    assert_eq!(progress[0].progress, 100);
    assert_eq!(progress[0].icon, "calculator");
    assert_eq!(progress[1].progress, 50);
    assert_eq!(progress[3].progress, 0);
    assert_eq!(progress[3].icon, subject::DEFAULT_ICON);
    assert_eq!(progress[3].color, subject::DEFAULT_COLOR);
}

#[cfg(test)]
fn standing(user_id: i32, mastered: i64) -> Standing {
    Standing { user_id, name: format!("user{}", user_id), mastered }
}

#[test]
fn test_rankings_top() {
    let standings = vec![standing(1, 3), standing(2, 10), standing(3, 3), standing(4, 0)];
    let r = rankings(standings, 3);
    assert_eq!(r.len(), 4);
    let ids: Vec<i32> = r.iter().map(|e| e.user_id).collect();
    assert_eq!(ids, vec![2, 1, 3, 4]);
    assert_eq!(r.iter().filter(|e| e.is_current_user).count(), 1);
    assert!(r[2].is_current_user);
    for (i, e) in r.iter().enumerate() {
        assert_eq!(e.position, i + 1);
        assert_eq!(e.score, e.mastered_count * 8);
    }
    assert!(r.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_rankings_current_user_outside_top() {
    let standings: Vec<Standing> = (1..=15).map(|id| standing(id, 100 - i64::from(id))).collect();
    let r = rankings(standings, 14);
    assert_eq!(r.len(), 11);
    assert_eq!(r.iter().filter(|e| e.is_current_user).count(), 1);
    let last = &r[10];
    assert!(last.is_current_user);
    assert_eq!(last.user_id, 14);
    assert_eq!(last.position, 14);
    assert_eq!(last.score, 86 * 8);
}

#[test]
fn test_rankings_unknown_user() {
    let r = rankings(vec![standing(1, 2)], 99);
    assert_eq!(r.len(), 2);
    assert!(r[1].is_current_user);
    assert_eq!(r[1].position, 2);
    assert_eq!(r[1].score, 0);
}

#[test]
fn test_streak_none() {
    let s = streak(day(2026, 10, 16), &[]);
    assert_eq!(s, Streak { current_streak: 0, best_streak: 0, has_activity_today: false });
}

#[test]
fn test_streak_ending_today() {
    let today = day(2026, 10, 16);
    let days = vec![today, today, day(2026, 10, 15), day(2026, 10, 14), day(2026, 10, 12)];
    let s = streak(today, &days);
    assert!(s.has_activity_today);
    assert_eq!(s.current_streak, 3);
    assert_eq!(s.best_streak, 3);
}

#[test]
fn test_streak_ending_yesterday() {
    let today = day(2026, 10, 16);
    let days = vec![day(2026, 10, 15), day(2026, 10, 14)];
    let s = streak(today, &days);
    assert!(!s.has_activity_today);
    assert_eq!(s.current_streak, 2);
}

#[test]
fn test_streak_broken() {
    let today = day(2026, 10, 16);
    let days = vec![day(2026, 10, 14), day(2026, 10, 13)];
    assert_eq!(streak(today, &days).current_streak, 0);
}

#[test]
fn test_best_streak_from_history() {
    let today = day(2026, 10, 16);
    let mut days: Vec<NaiveDate> = (1..=9).map(|d| day(2026, 9, d)).collect();
    days.push(today);
    let s = streak(today, &days);
    assert_eq!(s.current_streak, 1);
    assert_eq!(s.best_streak, 9);
}

#[test]
fn test_streak_n_prior_days() {
    let today = day(2026, 3, 2);
    for n in 0..10 {
        let days = period::trailing_days(today, n + 1);
        assert_eq!(streak(today, &days).current_streak, n + 1);
    }
}

#[test]
fn test_stats_data_serialization_omits_missing() {
    let data = StatsData { overview: Some(Overview::from_counts(10, 7)), ..StatsData::default() };
    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json, serde_json::json!({
        "overview": { "totalQuestions": 10, "masteredQuestions": 7, "pendingQuestions": 3, "masteryRate": 70 }
    }));
}
