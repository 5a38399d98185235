// src/services/time_window.rs

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};

use crate::models::dashboard::{Granularity, WindowMode, WindowSelector, WindowSummary};

/// Trava contra laço descontrolado na geração da série.
pub const MAX_TREND_POINTS: usize = 366;

/// Intervalos custom maiores que isso viram série mensal (~2 meses).
const MONTHLY_THRESHOLD_DAYS: i64 = 62;

// Regra de inclusão já resolvida, sempre em datas locais (hora zerada)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateRule {
    Everything,
    Day(NaiveDate),
    Days { start: NaiveDate, end: NaiveDate },
    Month(NaiveDate), // primeiro dia do mês
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPlan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    start: NaiveDate,
    granularity: Granularity,
}

impl Bucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.granularity {
            Granularity::Day => date == self.start,
            Granularity::Month => same_month(date, self.start),
        }
    }
}

impl BucketPlan {
    /// Série de baldes de `start` até `end` (inclusive), no máximo
    /// `MAX_TREND_POINTS`. Início depois do fim = série vazia.
    pub fn buckets(&self) -> Vec<Bucket> {
        let mut buckets = Vec::new();

        match self.granularity {
            Granularity::Day => {
                let mut current = self.start;
                while current <= self.end && buckets.len() < MAX_TREND_POINTS {
                    buckets.push(Bucket {
                        label: current.day().to_string(),
                        start: current,
                        granularity: Granularity::Day,
                    });
                    match current.succ_opt() {
                        Some(next) => current = next,
                        None => break,
                    }
                }
            }
            Granularity::Month => {
                let mut current = shift_month(self.start, 0);
                while current <= self.end && buckets.len() < MAX_TREND_POINTS {
                    buckets.push(Bucket {
                        label: format!("{}/{:02}", current.month(), current.year().rem_euclid(100)),
                        start: current,
                        granularity: Granularity::Month,
                    });
                    current = shift_month(current, 1);
                }
            }
        }

        buckets
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    mode: WindowMode,
    rule: DateRule,
    plan: BucketPlan,
    today: NaiveDate,
    offset: FixedOffset,
}

impl ResolvedWindow {
    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn plan(&self) -> &BucketPlan {
        &self.plan
    }

    /// Data local (fuso da loja) de um instante.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.contains_date(self.local_date(at))
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        match self.rule {
            DateRule::Everything => true,
            DateRule::Day(day) => date == day,
            DateRule::Days { start, end } => date >= start && date <= end,
            DateRule::Month(first_day) => same_month(date, first_day),
        }
    }

    pub fn summary(&self) -> WindowSummary {
        WindowSummary {
            mode: self.mode,
            start: self.plan.start,
            end: self.plan.end,
            granularity: self.plan.granularity,
        }
    }
}

// --- Aritmética de calendário ---

/// Primeiro dia do mês `delta` meses depois (ou antes) do mês de `date`.
/// A virada de ano sai da normalização do índice de meses.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + delta;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1).unwrap_or(date)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

/// Traduz o filtro escolhido na tela num predicado + plano de baldes.
/// Nunca falha: custom sem uma das datas aceita tudo.
pub fn resolve(selector: &WindowSelector, now: DateTime<Utc>, offset: FixedOffset) -> ResolvedWindow {
    let today = now.with_timezone(&offset).date_naive();
    let yesterday = days_before(today, 1);

    let day_plan = |start: NaiveDate, end: NaiveDate| BucketPlan { start, end, granularity: Granularity::Day };

    let (rule, plan) = match selector.mode {
        WindowMode::All => (
            DateRule::Everything,
            BucketPlan { start: shift_month(today, -12), end: today, granularity: Granularity::Month },
        ),
        WindowMode::Today => (DateRule::Day(today), day_plan(today, today)),
        WindowMode::Yesterday => (DateRule::Day(yesterday), day_plan(yesterday, yesterday)),
        WindowMode::Last7Days => (
            DateRule::Days { start: days_before(today, 7), end: today },
            day_plan(days_before(today, 6), today),
        ),
        WindowMode::ThisMonth => (DateRule::Month(shift_month(today, 0)), day_plan(shift_month(today, 0), today)),
        WindowMode::LastMonth => {
            let first = shift_month(today, -1);
            let last = days_before(shift_month(today, 0), 1);
            (DateRule::Month(first), day_plan(first, last))
        }
        WindowMode::Custom => match (selector.custom_start, selector.custom_end) {
            (Some(start), Some(end)) => {
                let span_days = (end - start).num_days().abs() + 1;
                let granularity = if span_days > MONTHLY_THRESHOLD_DAYS {
                    Granularity::Month
                } else {
                    Granularity::Day
                };
                (DateRule::Days { start, end }, BucketPlan { start, end, granularity })
            }
            _ => (DateRule::Everything, day_plan(today, today)),
        },
    };

    ResolvedWindow { mode: selector.mode, rule, plan, today, offset }
}
