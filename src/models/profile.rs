//! Company metadata as reported by the market-data provider

use serde::Serialize;

/// Company metadata, taken verbatim from the provider. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanyProfile {
    pub display_name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub currency: Option<String>,
}

impl CompanyProfile {
    /// Name used in chart titles, falling back to the ticker when the
    /// provider gave us nothing
    pub fn title_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        if self.display_name.trim().is_empty() {
            symbol
        } else {
            &self.display_name
        }
    }
}
