use std::env;

/// Best-effort facts about the installation the process runs on.
///
/// Every accessor may come back empty; callers substitute their own fallback.
pub trait PlatformInfo: Send + Sync {
    /// Identifier issued by the OS or app store for this installation.
    fn native_installation_id(&self) -> Option<String>;
    /// Present only when running inside a browser-like environment.
    fn browser_environment(&self) -> Option<BrowserEnvironment>;
    fn device_name(&self) -> Option<String>;
    fn os_name(&self) -> String;
    fn os_version(&self) -> Option<String>;
    fn app_version(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEnvironment {
    pub screen_width: u32,
    pub screen_height: u32,
    pub user_agent: String,
}

impl BrowserEnvironment {
    /// Parses a `WIDTHxHEIGHT` geometry string such as `390x844`.
    pub fn from_geometry(geometry: &str, user_agent: impl Into<String>) -> Option<Self> {
        let (w, h) = geometry.trim().split_once(['x', 'X'])?;
        let screen_width = w.trim().parse().ok()?;
        let screen_height = h.trim().parse().ok()?;
        Some(Self {
            screen_width,
            screen_height,
            user_agent: user_agent.into(),
        })
    }
}

/// Platform facts taken from the process environment.
#[derive(Debug, Clone, Default)]
pub struct HostPlatform {
    pub native_id: Option<String>,
    pub browser: Option<BrowserEnvironment>,
    pub device_name: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
}

impl HostPlatform {
    pub fn from_env() -> Self {
        let var = |name: &str| {
            dotenvy::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let browser = match (var("SOKO_SCREEN"), var("SOKO_USER_AGENT")) {
            (Some(screen), Some(ua)) => BrowserEnvironment::from_geometry(&screen, ua),
            _ => None,
        };

        Self {
            native_id: var("SOKO_NATIVE_DEVICE_ID"),
            browser,
            device_name: var("SOKO_DEVICE_NAME"),
            os_version: var("SOKO_OS_VERSION"),
            app_version: var("SOKO_APP_VERSION")
                .or_else(|| Some(env!("CARGO_PKG_VERSION").to_string())),
        }
    }
}

impl PlatformInfo for HostPlatform {
    fn native_installation_id(&self) -> Option<String> {
        self.native_id.clone()
    }

    fn browser_environment(&self) -> Option<BrowserEnvironment> {
        self.browser.clone()
    }

    fn device_name(&self) -> Option<String> {
        self.device_name.clone()
    }

    fn os_name(&self) -> String {
        if self.browser.is_some() && self.native_id.is_none() {
            return "web".to_string();
        }
        env::consts::OS.to_string()
    }

    fn os_version(&self) -> Option<String> {
        self.os_version.clone()
    }

    fn app_version(&self) -> Option<String> {
        self.app_version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_screen_geometry() {
        let env = BrowserEnvironment::from_geometry("390x844", "Mozilla/5.0").unwrap();
        assert_eq!(env.screen_width, 390);
        assert_eq!(env.screen_height, 844);

        assert!(BrowserEnvironment::from_geometry(" 1920X1080 ", "ua").is_some());
        assert!(BrowserEnvironment::from_geometry("wide", "ua").is_none());
        assert!(BrowserEnvironment::from_geometry("100x", "ua").is_none());
    }

    #[test]
    fn browser_only_platform_reports_web() {
        let platform = HostPlatform {
            browser: BrowserEnvironment::from_geometry("390x844", "ua"),
            ..Default::default()
        };
        assert_eq!(platform.os_name(), "web");

        let native = HostPlatform {
            native_id: Some("ios-123".into()),
            ..Default::default()
        };
        assert_eq!(native.os_name(), env::consts::OS);
    }
}
