/// Initial window settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowProps {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowProps {
    fn default() -> Self {
        Self {
            title: "strata".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl WindowProps {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }
}
