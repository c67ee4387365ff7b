use serde::{Deserialize, Serialize};

/// Identifier the subscription catalog uses for a purchasable duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

impl SubscriptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionType::Monthly => "monthly",
            SubscriptionType::Yearly => "yearly",
        }
    }
}

/// One of the two plans offered on the premium screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Monthly,
    #[default]
    Yearly,
}

impl Plan {
    /// Plans in the order the screen lists them.
    pub const DISPLAY_ORDER: [Plan; 2] = [Plan::Yearly, Plan::Monthly];

    pub fn subscription_type(self) -> SubscriptionType {
        match self {
            Plan::Monthly => SubscriptionType::Monthly,
            Plan::Yearly => SubscriptionType::Yearly,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Plan::Monthly => "Monthly",
            Plan::Yearly => "Yearly",
        }
    }

    pub fn price_suffix(self) -> &'static str {
        match self {
            Plan::Monthly => "/ month",
            Plan::Yearly => "/ year",
        }
    }

    pub fn badge(self) -> Option<&'static str> {
        match self {
            Plan::Monthly => None,
            Plan::Yearly => Some("MOST POPULAR"),
        }
    }

    pub fn savings(self) -> Option<&'static str> {
        match self {
            Plan::Monthly => None,
            Plan::Yearly => Some("Save 62%"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Plan::Monthly),
            "yearly" => Ok(Plan::Yearly),
            other => Err(format!("unknown plan '{other}' (expected monthly or yearly)")),
        }
    }
}

/// Catalog-resolved purchasable package. Opaque to the purchase flow; only the
/// catalog that produced it interprets the identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHandle {
    pub identifier: String,
    pub product_id: String,
    pub subscription_type: SubscriptionType,
}

impl PackageHandle {
    pub fn new(
        identifier: impl Into<String>,
        product_id: impl Into<String>,
        subscription_type: SubscriptionType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            product_id: product_id.into(),
            subscription_type,
        }
    }
}
