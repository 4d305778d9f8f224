use crate::utils::error::Result;
use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    DailyAt(NaiveTime),
    Every(ChronoDuration),
}

impl Trigger {
    /// 下一次觸發時間（嚴格晚於 `after`）
    pub fn next_after(&self, after: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Trigger::DailyAt(time) => {
                let today = after.date().and_time(time);
                if today > after {
                    today
                } else {
                    today + ChronoDuration::days(1)
                }
            }
            Trigger::Every(every) => after + every,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    DailyCycle,
    MiniGeneration,
    PriceOptimization,
    Upload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub trigger: Trigger,
    pub kind: JobKind,
    pub next_run: NaiveDateTime,
}

impl Job {
    pub fn new(name: &str, trigger: Trigger, kind: JobKind, now: NaiveDateTime) -> Self {
        Self {
            name: name.to_string(),
            trigger,
            kind,
            next_run: trigger.next_after(now),
        }
    }
}

/// 排程時間設定
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    pub daily_cycle_at: NaiveTime,
    pub mini_generation_every_hours: u32,
    pub price_optimization_at: NaiveTime,
    pub upload_every_hours: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            daily_cycle_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            mini_generation_every_hours: 2,
            price_optimization_at: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default(),
            upload_every_hours: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    jobs: Vec<Job>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard(settings: &ScheduleSettings, now: NaiveDateTime) -> Self {
        let hours = |h: u32| ChronoDuration::hours(h.max(1) as i64);

        let mut schedule = Self::new();
        schedule.add(Job::new(
            "daily automation",
            Trigger::DailyAt(settings.daily_cycle_at),
            JobKind::DailyCycle,
            now,
        ));
        schedule.add(Job::new(
            "mini generation",
            Trigger::Every(hours(settings.mini_generation_every_hours)),
            JobKind::MiniGeneration,
            now,
        ));
        schedule.add(Job::new(
            "price optimization",
            Trigger::DailyAt(settings.price_optimization_at),
            JobKind::PriceOptimization,
            now,
        ));
        schedule.add(Job::new(
            "upload pending products",
            Trigger::Every(hours(settings.upload_every_hours)),
            JobKind::Upload,
            now,
        ));
        schedule
    }

    pub fn add(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// 取出到期的工作（依註冊順序），並推進其下次執行時間
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<Job> {
        let mut due = Vec::new();
        for job in self.jobs.iter_mut() {
            if job.next_run <= now {
                due.push(job.clone());
                job.next_run = job.trigger.next_after(now);
            }
        }
        due
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            error_backoff: Duration::from_secs(300),
        }
    }
}

/// 每個 poll 週期執行到期工作，直到 `shutdown` 完成（執行中的工作會被中斷）。回傳成功執行的工作數
pub async fn run_loop<Sh, F, Fut>(
    schedule: &mut Schedule,
    timing: LoopTiming,
    shutdown: Sh,
    mut run_job: F,
) -> usize
where
    Sh: Future<Output = ()>,
    F: FnMut(JobKind) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    tokio::pin!(shutdown);

    let mut ticker = interval(timing.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0usize;

    info!("🔄 Automation schedules set up ({} jobs)", schedule.jobs().len());

    'outer: loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("🛑 Automation stopped by user");
                break;
            }
            _ = ticker.tick() => {}
        }

        let mut failed = false;
        let now = chrono::Local::now().naive_local();
        for job in schedule.due(now) {
            info!("⏰ Running scheduled job: {}", job.name);
            // 工作執行中也要能被中斷
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Automation stopped by user during '{}'", job.name);
                    break 'outer;
                }
                result = run_job(job.kind) => match result {
                    Ok(()) => completed += 1,
                    Err(e) => {
                        error!("❌ Scheduled job '{}' failed: {}", job.name, e);
                        failed = true;
                    }
                },
            }
        }

        if failed {
            warn!("⏳ Backing off for {:?}", timing.error_backoff);
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Automation stopped by user");
                    break;
                }
                _ = sleep(timing.error_backoff) => {
                    debug!("Resuming schedule");
                }
            }
        }
    }

    completed
}
