use serde::{Deserialize, Serialize};

const LIGHT_PALETTE: [&str; 10] = [
    "#FF9AA2", "#A8D8B9", "#8AC6D1", "#FFDAC1", "#E2F0CB", "#B5EAD7", "#C7CEEA", "#F6D5E5",
    "#FFE5B4", "#D4A5A5",
];

const DARK_PALETTE: [&str; 10] = [
    "#E06C75", "#7FB58F", "#5FA3B3", "#E0A878", "#A9C27A", "#6FC2A8", "#8F9BD6", "#C98BB0",
    "#E5C07B", "#B07A7A",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub font_family: String,
    pub text_color: String,
    pub background: String,
    /// Ordinal palette indexed by top-level category.
    pub palette: Vec<String>,
    pub arc_stroke: String,
    pub center_fill: String,
    pub center_text_color: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
            palette: LIGHT_PALETTE.iter().map(|c| c.to_string()).collect(),
            arc_stroke: "#FFFFFF".to_string(),
            center_fill: "#F6F6F6".to_string(),
            center_text_color: "#1C2430".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#F0F0F0".to_string(),
            background: "#1E1E1E".to_string(),
            palette: DARK_PALETTE.iter().map(|c| c.to_string()).collect(),
            arc_stroke: "#1E1E1E".to_string(),
            center_fill: "#333333".to_string(),
            center_text_color: "#F0F0F0".to_string(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" | "default" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    /// Palette entry for an ordinal category; wraps around like an ordinal scale.
    pub fn category_color(&self, category: usize) -> &str {
        if self.palette.is_empty() {
            return self.text_color.as_str();
        }
        self.palette[category % self.palette.len()].as_str()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
