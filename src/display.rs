use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn red(&self) -> String {
            self.as_str().to_string()
        }
        fn yellow(&self) -> String {
            self.as_str().to_string()
        }
        fn green(&self) -> String {
            self.as_str().to_string()
        }
        fn dimmed(&self) -> String {
            self.as_str().to_string()
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::models::UsageSnapshot;

pub const WARNING_PERCENT: f64 = 70.0;
pub const CRITICAL_PERCENT: f64 = 90.0;

/// Shown in place of a segment when no usage data is available
pub const PLACEHOLDER: &str = "--";

const STALE_MARK: &str = " ~";

/// Compact countdown: `2h05m`, `45m`, or `0m` once elapsed
pub fn format_countdown(remaining: TimeDelta) -> String {
    if remaining <= TimeDelta::zero() {
        return "0m".to_string();
    }
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

/// 5-hour window, e.g. `42% 2h13m`
pub fn block_text(usage: Option<&UsageSnapshot>, now: DateTime<Utc>) -> String {
    let Some(u) = usage else {
        return PLACEHOLDER.to_string();
    };
    let mut text = format!("{:.0}%", u.block_percentage);
    if let Some(reset) = u.block_reset_time {
        text.push(' ');
        text.push_str(&format_countdown(reset - now));
    }
    if u.is_stale {
        text.push_str(STALE_MARK);
    }
    text
}

/// 7-day window, e.g. `31% 4d` or `O:12% S:20% 4d` when both families are in use
pub fn weekly_text(usage: Option<&UsageSnapshot>, now: DateTime<Utc>) -> String {
    let Some(u) = usage else {
        return PLACEHOLDER.to_string();
    };
    let mut text = if u.has_model_breakdown() {
        format!("O:{:.0}% S:{:.0}%", u.opus_percentage, u.sonnet_percentage)
    } else {
        format!("{:.0}%", u.weekly_percentage)
    };
    if let Some(reset) = u.week_reset_time {
        let days_left = (reset - now).num_days();
        if days_left > 0 {
            text.push_str(&format!(" {days_left}d"));
        }
    }
    if u.is_stale {
        text.push_str(STALE_MARK);
    }
    text
}

fn colorize_by_percent(text: String, pct: Option<f64>) -> String {
    match pct {
        None => text.dimmed().to_string(),
        Some(p) if p >= CRITICAL_PERCENT => text.red().to_string(),
        Some(p) if p >= WARNING_PERCENT => text.yellow().to_string(),
        Some(_) => text.green().to_string(),
    }
}

pub fn format_text_output(usage: Option<&UsageSnapshot>, now: DateTime<Utc>) -> String {
    let block = colorize_by_percent(block_text(usage, now), usage.map(|u| u.block_percentage));
    let weekly = colorize_by_percent(
        weekly_text(usage, now),
        usage.map(|u| {
            u.weekly_percentage
                .max(u.opus_percentage)
                .max(u.sonnet_percentage)
        }),
    );
    format!("{} {}  {} {}", "5h".dimmed(), block, "7d".dimmed(), weekly)
}

pub fn print_text_output(usage: Option<&UsageSnapshot>) {
    println!("{}", format_text_output(usage, Utc::now()));
}

pub fn build_json_output(usage: Option<&UsageSnapshot>, workspace: &str) -> Value {
    let now = Utc::now();
    json!({
        "workspace": workspace,
        "available": usage.is_some(),
        "stale": usage.map(|u| u.is_stale),
        "usage": usage,
        "text": {
            "block": block_text(usage, now),
            "weekly": weekly_text(usage, now),
        },
    })
}

pub fn print_json_output(usage: Option<&UsageSnapshot>, workspace: &str) -> anyhow::Result<()> {
    let value = build_json_output(usage, workspace);
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}
