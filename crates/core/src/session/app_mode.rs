/// Lifecycle state of the application.
///
/// ```text
/// Idle ─▶ Loading ─▶ ReadyCameraOff ⇄ ReadyCameraOn
///             └────▶ Error
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Idle,
    Loading,
    ReadyCameraOff,
    ReadyCameraOn,
    /// Models failed to load. Terminal.
    Error,
}

impl AppMode {
    /// Models are loaded and the camera can be toggled.
    pub fn is_ready(self) -> bool {
        matches!(self, AppMode::ReadyCameraOff | AppMode::ReadyCameraOn)
    }

    pub fn camera_on(self) -> bool {
        self == AppMode::ReadyCameraOn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppMode::Idle, false, false)]
    #[case(AppMode::Loading, false, false)]
    #[case(AppMode::ReadyCameraOff, true, false)]
    #[case(AppMode::ReadyCameraOn, true, true)]
    #[case(AppMode::Error, false, false)]
    fn test_mode_predicates(#[case] mode: AppMode, #[case] ready: bool, #[case] camera: bool) {
        assert_eq!(mode.is_ready(), ready);
        assert_eq!(mode.camera_on(), camera);
    }
}
