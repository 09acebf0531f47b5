use anyhow::{Context, Result, bail};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// Directory name used under the cache root
pub const APP_DIR: &str = "claude-quota";

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

pub fn read_stdin() -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// Cache root: `$XDG_CACHE_HOME/claude-quota`, then `~/.cache/claude-quota`,
/// then the system temp dir.
pub fn default_cache_dir() -> PathBuf {
    if let Some(xdg) = env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    if let Some(base) = directories::BaseDirs::new() {
        return base.home_dir().join(".cache").join(APP_DIR);
    }
    env::temp_dir().join(APP_DIR)
}

/// `~/.claude/.credentials.json`, or `None` without a home directory
pub fn credentials_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".claude").join(".credentials.json"))
}

/// Parse a duration string such as `30s`, `1m30s`, `1.5h` or `250ms`.
///
/// Accepts the units `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`, in any
/// combination. A bare `0` is allowed; every other number needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        bail!("empty duration");
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            bail!("invalid duration {input:?}");
        }
        let (num, tail) = rest.split_at(num_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            "" => bail!("missing unit in duration {input:?}"),
            other => bail!("unknown unit {other:?} in duration {input:?}"),
        };
        total = total
            .checked_add(scaled(num, scale).with_context(|| format!("invalid duration {input:?}"))?)
            .context("duration overflow")?;
        rest = tail;
    }

    let nanos = u64::try_from(total).context("duration overflow")?;
    Ok(Duration::from_nanos(nanos))
}

fn scaled(num: &str, scale: u128) -> Result<u128> {
    let (int, frac) = num.split_once('.').unwrap_or((num, ""));
    if int.is_empty() && frac.is_empty() {
        bail!("missing number");
    }
    let whole: u128 = if int.is_empty() { 0 } else { int.parse()? };
    let mut value = whole.checked_mul(scale).context("duration overflow")?;
    let mut place = scale;
    for c in frac.chars() {
        let digit = c.to_digit(10).context("bad fraction digit")? as u128;
        place /= 10;
        value += digit * place;
    }
    Ok(value)
}

/// Inverse of [`parse_duration`]: `1h0m0s`, `1m30s`, `30s`, `1.5s`, `250ms`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_nanos();
    if total == 0 {
        return "0s".to_string();
    }
    if total < NANOS_PER_SEC {
        return if total < NANOS_PER_MICRO {
            format!("{total}ns")
        } else if total < NANOS_PER_MILLI {
            format!("{}µs", decimal(total, NANOS_PER_MICRO))
        } else {
            format!("{}ms", decimal(total, NANOS_PER_MILLI))
        };
    }

    let hours = total / NANOS_PER_HOUR;
    let minutes = (total % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = decimal(total % NANOS_PER_MIN, NANOS_PER_SEC);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

// value/unit with trailing fractional zeros trimmed
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
