use std::env;

/// Daily local-time windows gating sensitive actions.
///
/// Minutes are measured from local midnight, where "local" is defined by a
/// fixed UTC offset (default +05:30). Windows are half-open: `[start, end)`.
#[derive(Debug, Clone, Copy)]
pub struct AccessConfig {
    pub tz_offset_minutes: i32,
    /// Mobile/tablet clients may only authenticate inside this window.
    pub mobile_login_start: u32,
    pub mobile_login_end: u32,
    /// Subscription payments may only be created inside this window.
    pub payment_start: u32,
    pub payment_end: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            tz_offset_minutes: 330, // IST, UTC+5:30
            mobile_login_start: 10 * 60,
            mobile_login_end: 13 * 60,
            payment_start: 10 * 60,
            payment_end: 11 * 60,
        }
    }
}

impl AccessConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(offset) = env::var("ACCESS_TZ_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            cfg.tz_offset_minutes = offset;
        }

        if let Ok(raw) = env::var("MOBILE_LOGIN_WINDOW") {
            match parse_window(&raw) {
                Ok((start, end)) => {
                    cfg.mobile_login_start = start;
                    cfg.mobile_login_end = end;
                }
                Err(err) => tracing::warn!("Invalid MOBILE_LOGIN_WINDOW '{}': {}", raw, err),
            }
        }

        if let Ok(raw) = env::var("PAYMENT_WINDOW") {
            match parse_window(&raw) {
                Ok((start, end)) => {
                    cfg.payment_start = start;
                    cfg.payment_end = end;
                }
                Err(err) => tracing::warn!("Invalid PAYMENT_WINDOW '{}': {}", raw, err),
            }
        }

        cfg
    }
}

/// Parse "HH:MM-HH:MM" into minutes-of-day.
fn parse_window(raw: &str) -> Result<(u32, u32), String> {
    let (start_raw, end_raw) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("invalid window '{}', expected HH:MM-HH:MM", raw))?;
    let start = parse_minute(start_raw.trim())?;
    let end = parse_minute(end_raw.trim())?;
    if start >= end {
        return Err("window start must be before end".to_string());
    }
    Ok((start, end))
}

fn parse_minute(raw: &str) -> Result<u32, String> {
    let (h_raw, m_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid time '{}', expected HH:MM", raw))?;
    let h: u32 = h_raw
        .parse()
        .map_err(|_| format!("invalid hour '{}'", h_raw))?;
    let m: u32 = m_raw
        .parse()
        .map_err(|_| format!("invalid minute '{}'", m_raw))?;
    if h > 23 || m > 59 {
        return Err(format!("time '{}' out of range", raw));
    }
    Ok(h * 60 + m)
}
