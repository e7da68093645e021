use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_COLOR: &str = "#3B82F6";
pub const DEFAULT_TITLE: &str = "Live Support";

/// Display settings supplied by the service.
///
/// Keys the client does not know about are kept in `extra` so front-ends can
/// still read them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WidgetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,

    #[serde(default)]
    pub settings: WidgetSettings,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WidgetSettings {
    #[serde(
        default,
        rename = "primaryColor",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_color: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WidgetConfig {
    pub fn primary_color(&self) -> &str {
        self.settings
            .primary_color
            .as_deref()
            .filter(|color| !color.is_empty())
            .unwrap_or(DEFAULT_PRIMARY_COLOR)
    }

    pub fn title(&self) -> &str {
        self.firm_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }
}
