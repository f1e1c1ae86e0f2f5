/// Coarse client classification from the User-Agent header.
///
/// Only the distinctions the access rules need: Edge before Chrome
/// (Chromium-based Edge advertises both), tablet before mobile (Android
/// tablets omit the "Mobile" token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub device: DeviceClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Desktop => "desktop",
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
        }
    }
}

impl ClientInfo {
    pub fn parse(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();

        let (browser_name, marker) = if ua.contains("edg/") || ua.contains("edge/") {
            (Some("Edge"), Some("edg"))
        } else if ua.contains("firefox/") {
            (Some("Firefox"), Some("firefox/"))
        } else if ua.contains("chrome/") {
            (Some("Chrome"), Some("chrome/"))
        } else if ua.contains("safari/") {
            (Some("Safari"), Some("version/"))
        } else {
            (None, None)
        };

        let browser_version = marker.and_then(|m| extract_version(&ua, m));

        let os_name = if ua.contains("windows") {
            Some("Windows")
        } else if ua.contains("android") {
            Some("Android")
        } else if ua.contains("iphone") || ua.contains("ipad") {
            Some("iOS")
        } else if ua.contains("mac os") {
            Some("macOS")
        } else if ua.contains("linux") {
            Some("Linux")
        } else {
            None
        };

        let device = if ua.contains("ipad") || ua.contains("tablet") {
            DeviceClass::Tablet
        } else if ua.contains("android") && !ua.contains("mobile") {
            DeviceClass::Tablet
        } else if ua.contains("mobi") || ua.contains("iphone") {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        };

        Self {
            browser_name: browser_name.map(str::to_string),
            browser_version,
            os_name: os_name.map(str::to_string),
            device,
        }
    }

    /// Mobile and tablet clients share the restricted-hours rule.
    pub fn is_restricted_device(&self) -> bool {
        matches!(self.device, DeviceClass::Mobile | DeviceClass::Tablet)
    }

    /// Chrome (and only Chrome — Chromium-based Edge is exempt) requires
    /// an emailed one-time code to complete login.
    pub fn requires_login_otp(&self) -> bool {
        self.browser_name.as_deref() == Some("Chrome")
    }
}

fn extract_version(ua: &str, marker: &str) -> Option<String> {
    let start = ua.find(marker)? + marker.len();
    let rest = &ua[start..];
    // skip to the first digit (handles the bare "edg" marker)
    let digits_at = rest.find(|c: char| c.is_ascii_digit())?;
    let rest = &rest[digits_at..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    let version = &rest[..end];
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X906C) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36";

    #[test]
    fn chrome_is_detected_and_needs_otp() {
        let info = ClientInfo::parse(CHROME_DESKTOP);
        assert_eq!(info.browser_name.as_deref(), Some("Chrome"));
        assert_eq!(info.os_name.as_deref(), Some("Windows"));
        assert_eq!(info.device, DeviceClass::Desktop);
        assert!(info.requires_login_otp());
    }

    #[test]
    fn edge_is_not_chrome() {
        let info = ClientInfo::parse(EDGE_DESKTOP);
        assert_eq!(info.browser_name.as_deref(), Some("Edge"));
        assert!(!info.requires_login_otp());
    }

    #[test]
    fn firefox_logs_in_directly() {
        let info = ClientInfo::parse(FIREFOX_LINUX);
        assert_eq!(info.browser_name.as_deref(), Some("Firefox"));
        assert_eq!(info.browser_version.as_deref(), Some("121.0"));
        assert_eq!(info.os_name.as_deref(), Some("Linux"));
        assert!(!info.requires_login_otp());
    }

    #[test]
    fn safari_mac_is_desktop() {
        let info = ClientInfo::parse(SAFARI_MAC);
        assert_eq!(info.browser_name.as_deref(), Some("Safari"));
        assert_eq!(info.os_name.as_deref(), Some("macOS"));
        assert_eq!(info.device, DeviceClass::Desktop);
        assert!(!info.is_restricted_device());
    }

    #[test]
    fn android_phone_is_mobile() {
        let info = ClientInfo::parse(CHROME_ANDROID);
        assert_eq!(info.device, DeviceClass::Mobile);
        assert!(info.is_restricted_device());
    }

    #[test]
    fn ipad_is_tablet() {
        let info = ClientInfo::parse(SAFARI_IPAD);
        assert_eq!(info.device, DeviceClass::Tablet);
        assert!(info.is_restricted_device());
    }

    #[test]
    fn android_without_mobile_token_is_tablet() {
        let info = ClientInfo::parse(ANDROID_TABLET);
        assert_eq!(info.device, DeviceClass::Tablet);
    }

    #[test]
    fn empty_user_agent_is_plain_desktop() {
        let info = ClientInfo::parse("");
        assert_eq!(info.browser_name, None);
        assert_eq!(info.device, DeviceClass::Desktop);
        assert!(!info.requires_login_otp());
    }

    #[test]
    fn chrome_version_extracted() {
        let info = ClientInfo::parse(CHROME_DESKTOP);
        assert_eq!(info.browser_version.as_deref(), Some("120.0.0.0"));
    }
}
