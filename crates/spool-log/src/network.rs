//! Network state attached to log events.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    NetworkNotConnected,
    NetworkEthernet,
    NetworkWifi,
    #[serde(rename = "network_2g")]
    Network2G,
    #[serde(rename = "network_3g")]
    Network3G,
    #[serde(rename = "network_4g")]
    Network4G,
    #[serde(rename = "network_5g")]
    Network5G,
    NetworkMobileOther,
    NetworkCellular,
    NetworkOther,
}

impl Connectivity {
    pub const ALL: [Connectivity; 10] = [
        Connectivity::NetworkNotConnected,
        Connectivity::NetworkEthernet,
        Connectivity::NetworkWifi,
        Connectivity::Network2G,
        Connectivity::Network3G,
        Connectivity::Network4G,
        Connectivity::Network5G,
        Connectivity::NetworkMobileOther,
        Connectivity::NetworkCellular,
        Connectivity::NetworkOther,
    ];

    /// Wire value, e.g. `network_wifi`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::NetworkNotConnected => "network_not_connected",
            Connectivity::NetworkEthernet => "network_ethernet",
            Connectivity::NetworkWifi => "network_wifi",
            Connectivity::Network2G => "network_2g",
            Connectivity::Network3G => "network_3g",
            Connectivity::Network4G => "network_4g",
            Connectivity::Network5G => "network_5g",
            Connectivity::NetworkMobileOther => "network_mobile_other",
            Connectivity::NetworkCellular => "network_cellular",
            Connectivity::NetworkOther => "network_other",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub connectivity: Connectivity,
    /// Omitted from the event when blank.
    pub carrier_name: Option<String>,
    /// Omitted from the event when unknown.
    pub carrier_id: Option<u32>,
}

impl NetworkInfo {
    pub fn new(connectivity: Connectivity) -> Self {
        NetworkInfo {
            connectivity,
            ..Default::default()
        }
    }

    pub fn with_carrier(mut self, name: impl Into<String>, id: u32) -> Self {
        self.carrier_name = Some(name.into());
        self.carrier_id = Some(id);
        self
    }
}
