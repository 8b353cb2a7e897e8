//! Static description of the client device, used to pick the starting tier.

use serde::{Deserialize, Serialize};

use crate::level::QualityLadder;

/// Effective network class as reported by the platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionClass {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    Fast,
    #[default]
    Unknown,
}

impl ConnectionClass {
    pub fn is_slow(self) -> bool {
        matches!(self, Self::Slow2g | Self::TwoG | Self::ThreeG)
    }

    pub fn is_fast(self) -> bool {
        matches!(self, Self::FourG | Self::Fast)
    }
}

/// Viewport width bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScreenSize {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl ScreenSize {
    pub fn is_small(self) -> bool {
        self <= Self::Sm
    }
}

/// Produced once by the host's platform detection and never mutated by the render loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub pixel_ratio: f32,
    pub connection: ConnectionClass,
    pub has_touch: bool,
    pub screen_size: ScreenSize,
}

impl DeviceProfile {
    /// Desktop-class device at 1x density with an unknown connection.
    pub fn desktop() -> Self {
        Self {
            is_mobile: false,
            is_tablet: false,
            pixel_ratio: 1.0,
            connection: ConnectionClass::Unknown,
            has_touch: false,
            screen_size: ScreenSize::Lg,
        }
    }

    /// High-density desktop display on a fast connection.
    pub fn hidpi() -> Self {
        Self {
            pixel_ratio: 2.0,
            connection: ConnectionClass::Fast,
            screen_size: ScreenSize::Xl,
            ..Self::desktop()
        }
    }

    pub fn tablet() -> Self {
        Self {
            is_tablet: true,
            pixel_ratio: 2.0,
            connection: ConnectionClass::FourG,
            has_touch: true,
            screen_size: ScreenSize::Md,
            ..Self::desktop()
        }
    }

    pub fn mobile() -> Self {
        Self {
            is_mobile: true,
            pixel_ratio: 3.0,
            connection: ConnectionClass::FourG,
            has_touch: true,
            screen_size: ScreenSize::Xs,
            ..Self::desktop()
        }
    }

    /// Look up a named preset (`desktop`, `hidpi`, `tablet`, `mobile`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "desktop" => Some(Self::desktop()),
            "hidpi" => Some(Self::hidpi()),
            "tablet" => Some(Self::tablet()),
            "mobile" => Some(Self::mobile()),
            _ => None,
        }
    }

    /// Starting ladder index for this device.
    ///
    /// Constrained devices start at the bottom, high-density displays on a
    /// fast link start at the top, everything else starts in the middle.
    pub fn initial_index(&self, ladder: &QualityLadder) -> usize {
        if self.is_mobile
            || self.is_tablet
            || self.screen_size.is_small()
            || self.connection.is_slow()
        {
            0
        } else if self.pixel_ratio >= 2.0 && self.connection.is_fast() {
            ladder.highest_index()
        } else {
            ladder.middle_index()
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::QualityLevel;

    /// A mobile device with an extra-small screen starts on the lowest tier.
    #[test]
    fn test_mobile_xs_starts_lowest() {
        let profile = DeviceProfile {
            is_mobile: true,
            screen_size: ScreenSize::Xs,
            ..DeviceProfile::desktop()
        };
        assert_eq!(profile.initial_index(&QualityLadder::default()), 0);
    }

    #[test]
    fn test_slow_connection_starts_lowest() {
        let profile = DeviceProfile {
            connection: ConnectionClass::ThreeG,
            pixel_ratio: 2.0,
            ..DeviceProfile::desktop()
        };
        assert_eq!(profile.initial_index(&QualityLadder::default()), 0);
    }

    #[test]
    fn test_small_screen_starts_lowest() {
        let profile = DeviceProfile {
            screen_size: ScreenSize::Sm,
            ..DeviceProfile::desktop()
        };
        assert_eq!(profile.initial_index(&QualityLadder::default()), 0);
    }

    #[test]
    fn test_hidpi_fast_starts_highest() {
        assert_eq!(DeviceProfile::hidpi().initial_index(&QualityLadder::default()), 2);
    }

    /// High density alone is not enough without a fast link.
    #[test]
    fn test_hidpi_unknown_connection_starts_middle() {
        let profile = DeviceProfile {
            connection: ConnectionClass::Unknown,
            ..DeviceProfile::hidpi()
        };
        assert_eq!(profile.initial_index(&QualityLadder::default()), 1);
    }

    #[test]
    fn test_middle_of_even_ladder_rounds_down() {
        let mut levels = QualityLadder::default().levels().to_vec();
        let mut ultra = QualityLevel::high();
        ultra.name = "ultra".into();
        levels.push(ultra);
        let ladder = QualityLadder::new(levels).unwrap();
        assert_eq!(DeviceProfile::desktop().initial_index(&ladder), 1);
    }

    #[test]
    fn test_presets() {
        assert_eq!(DeviceProfile::preset("Mobile"), Some(DeviceProfile::mobile()));
        assert!(DeviceProfile::preset("toaster").is_none());
    }
}
