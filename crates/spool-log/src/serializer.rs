//! Flat JSON encoding of log events.

use serde_json::{Map, Value};
use spool_common::Result;
use spool_store::Serializer;

use crate::model::Log;

pub const TAG_MESSAGE: &str = "message";
pub const TAG_SERVICE_NAME: &str = "service";
pub const TAG_STATUS: &str = "status";
pub const TAG_LOGGER_NAME: &str = "logger.name";
pub const TAG_THREAD_NAME: &str = "logger.thread_name";
pub const TAG_DATE: &str = "date";
pub const TAG_TAGS: &str = "ddtags";
pub const TAG_ERROR_KIND: &str = "error.kind";
pub const TAG_ERROR_MESSAGE: &str = "error.message";
pub const TAG_ERROR_STACK: &str = "error.stack";
pub const TAG_NETWORK_CONNECTIVITY: &str = "network.client.connectivity";
pub const TAG_NETWORK_CARRIER_NAME: &str = "network.client.sim_carrier.name";
pub const TAG_NETWORK_CARRIER_ID: &str = "network.client.sim_carrier.id";

/// Attribute keys owned by the serializer. User attributes with these keys
/// are dropped so they cannot overwrite event fields.
pub const RESERVED_ATTRIBUTES: [&str; 13] = [
    TAG_MESSAGE,
    TAG_SERVICE_NAME,
    TAG_STATUS,
    TAG_LOGGER_NAME,
    TAG_THREAD_NAME,
    TAG_DATE,
    TAG_TAGS,
    TAG_ERROR_KIND,
    TAG_ERROR_MESSAGE,
    TAG_ERROR_STACK,
    TAG_NETWORK_CONNECTIVITY,
    TAG_NETWORK_CARRIER_NAME,
    TAG_NETWORK_CARRIER_ID,
];

/// `yyyy-MM-ddTHH:mm:ss.SSSZ`, always UTC.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSerializer;

impl LogSerializer {
    /// Build the JSON object for one event.
    pub fn to_json(&self, log: &Log) -> Map<String, Value> {
        let mut json = Map::new();
        json.insert(TAG_MESSAGE.into(), log.message.clone().into());
        json.insert(TAG_SERVICE_NAME.into(), log.service_name.clone().into());
        json.insert(TAG_STATUS.into(), log.level.as_str().into());
        json.insert(TAG_LOGGER_NAME.into(), log.logger_name.clone().into());
        json.insert(TAG_THREAD_NAME.into(), log.thread_name.clone().into());
        json.insert(
            TAG_DATE.into(),
            log.timestamp.format(DATE_FORMAT).to_string().into(),
        );

        if let Some(info) = &log.network_info {
            json.insert(
                TAG_NETWORK_CONNECTIVITY.into(),
                info.connectivity.as_str().into(),
            );
            if let Some(name) = info.carrier_name.as_deref().filter(|n| !n.trim().is_empty()) {
                json.insert(TAG_NETWORK_CARRIER_NAME.into(), name.into());
            }
            if let Some(id) = info.carrier_id {
                json.insert(TAG_NETWORK_CARRIER_ID.into(), id.into());
            }
        }

        if let Some(error) = &log.error {
            json.insert(TAG_ERROR_KIND.into(), error.kind.clone().into());
            json.insert(TAG_ERROR_MESSAGE.into(), error.message.clone().into());
            json.insert(TAG_ERROR_STACK.into(), error.stack.clone().into());
        }

        for (key, value) in &log.attributes {
            if key.trim().is_empty() || RESERVED_ATTRIBUTES.contains(&key.as_str()) {
                continue;
            }
            json.insert(key.clone(), value.clone());
        }

        let tags: Vec<&str> = log
            .tags
            .iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            json.insert(TAG_TAGS.into(), tags.join(",").into());
        }

        json
    }
}

impl Serializer<Log> for LogSerializer {
    fn serialize(&self, log: &Log) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_json(log))?)
    }
}
