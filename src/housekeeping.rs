//! Recorded-video housekeeping.
//!
//! The enclosure camera writes `.mp4` clips into dated subdirectories of a
//! web root.  Periodically the controller prunes them:
//!
//! 1. clips younger than `min_age_hours` are never touched (still being
//!    written or viewed),
//! 2. of the rest, remove daytime clips (`day_start_hour <= hour < day_end_hour`),
//! 3. then clips below `min_size_bytes`,
//! 4. then clips older than `max_age_days`.
//!
//! A clip is counted under the first rule that matches.  Planning is pure
//! so it can be tested without touching the filesystem; [`apply`] does the
//! removal and only logs failures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDateTime, Timelike};
use log::{debug, info, warn};

use crate::config::HousekeepingConfig;

const VIDEO_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub min_age: Duration,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub min_size_bytes: u64,
    pub max_age: Duration,
}

impl From<&HousekeepingConfig> for RetentionPolicy {
    fn from(cfg: &HousekeepingConfig) -> Self {
        Self {
            min_age: Duration::try_milliseconds((cfg.min_age_hours * 3_600_000.0) as i64)
                .unwrap_or(Duration::MAX),
            day_start_hour: cfg.day_start_hour,
            day_end_hour: cfg.day_end_hour,
            min_size_bytes: cfg.min_size_bytes,
            max_age: Duration::days(i64::from(cfg.max_age_days)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Modification time, host local
    pub modified: NaiveDateTime,
    pub size: u64,
}

/// Why a clip was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Daytime,
    Undersized,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSummary {
    pub rule: Rule,
    pub count: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupPlan {
    /// Clips old enough to be considered
    pub checked: usize,
    pub removals: Vec<(Rule, PathBuf)>,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    pub fn count(&self, rule: Rule) -> usize {
        self.removals.iter().filter(|(r, _)| *r == rule).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

impl RetentionPolicy {
    fn classify(&self, file: &MediaFile, now: NaiveDateTime) -> Option<Rule> {
        let hour = file.modified.hour();
        if (self.day_start_hour..self.day_end_hour).contains(&hour) {
            Some(Rule::Daytime)
        } else if file.size < self.min_size_bytes {
            Some(Rule::Undersized)
        } else if now
            .checked_sub_signed(self.max_age)
            .is_some_and(|limit| file.modified < limit)
        {
            Some(Rule::Expired)
        } else {
            None
        }
    }
}

/// Select clips to remove and summarise each rule.
pub fn plan(
    files: &[MediaFile],
    now: NaiveDateTime,
    policy: &RetentionPolicy,
) -> (CleanupPlan, Vec<RuleSummary>) {
    let mut out = CleanupPlan::default();
    let mut summaries: Vec<RuleSummary> = [Rule::Daytime, Rule::Undersized, Rule::Expired]
        .into_iter()
        .map(|rule| RuleSummary {
            rule,
            count: 0,
            bytes: 0,
        })
        .collect();

    // An age that reaches past the calendar leaves nothing old enough.
    let Some(cutoff) = now.checked_sub_signed(policy.min_age) else {
        return (out, summaries);
    };
    for file in files.iter().filter(|f| f.modified < cutoff) {
        out.checked += 1;
        if let Some(rule) = policy.classify(file, now) {
            if let Some(s) = summaries.iter_mut().find(|s| s.rule == rule) {
                s.count += 1;
                s.bytes += file.size;
            }
            out.removals.push((rule, file.path.clone()));
        }
    }
    (out, summaries)
}

/// Collect `<root>/*/*.mp4`.
pub fn scan(root: &Path) -> io::Result<Vec<MediaFile>> {
    let mut files = Vec::new();
    for dir in fs::read_dir(root)? {
        let dir = match dir {
            Ok(d) => d.path(),
            Err(e) => {
                debug!("Housekeeping: skipping entry in {}: {}", root.display(), e);
                continue;
            }
        };
        if !dir.is_dir() {
            continue;
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Housekeeping: cannot read {}: {}", dir.display(), e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VIDEO_EXTENSION) {
                continue;
            }
            match entry.metadata().and_then(|m| Ok((m.modified()?, m.len()))) {
                Ok((mtime, size)) if entry.file_type().is_ok_and(|t| t.is_file()) => {
                    files.push(MediaFile {
                        path,
                        modified: DateTime::<Local>::from(mtime).naive_local(),
                        size,
                    });
                }
                Ok(_) => {}
                Err(e) => debug!("Housekeeping: {}: {}", path.display(), e),
            }
        }
    }
    Ok(files)
}

/// Remove every planned clip.  Failures are logged and counted.
pub fn apply(plan: &CleanupPlan) -> CleanupReport {
    let mut report = CleanupReport::default();
    for (_, path) in &plan.removals {
        match fs::remove_file(path) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!("Could not remove {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }
    info!("Housekeeping: removed {} files ({} failed)", report.removed, report.failed);
    report
}

/// Runs the cleanup once every `interval_ticks` control ticks.
pub struct Housekeeper {
    root: PathBuf,
    policy: RetentionPolicy,
    interval_ticks: u32,
    countdown: u32,
}

impl Housekeeper {
    pub fn new(cfg: &HousekeepingConfig) -> Self {
        Self {
            root: cfg.video_root.clone(),
            policy: RetentionPolicy::from(cfg),
            interval_ticks: cfg.interval_ticks.max(1),
            countdown: 0,
        }
    }

    /// Call once per control tick.  Returns a report on ticks where the
    /// cleanup ran (the first tick, then every `interval_ticks`).
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<CleanupReport> {
        if self.countdown > 0 {
            self.countdown -= 1;
            return None;
        }
        self.countdown = self.interval_ticks - 1;
        Some(self.run(now))
    }

    pub fn run(&self, now: NaiveDateTime) -> CleanupReport {
        let files = match scan(&self.root) {
            Ok(files) => files,
            Err(e) => {
                warn!("Housekeeping: cannot scan {}: {}", self.root.display(), e);
                return CleanupReport::default();
            }
        };
        let (plan, summaries) = plan(&files, now, &self.policy);
        if plan.is_empty() {
            debug!("Housekeeping: checked {} videos, nothing to remove", plan.checked);
            return CleanupReport::default();
        }
        info!("Housekeeping: checked {} videos", plan.checked);
        for s in summaries.iter().filter(|s| s.count > 0) {
            info!(
                "Housekeeping: removing {} {:?} files, {} KB",
                s.count,
                s.rule,
                s.bytes / 1024
            );
        }
        apply(&plan)
    }
}
