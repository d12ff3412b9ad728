use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` over the lowercase wire tokens.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Kafka,
    Amqp,
    Mqtt,
    Nats,
    Redis,
    Webhook,
    Http,
    Db,
}

string_enum!(Protocol, "protocol", {
    Kafka => "kafka",
    Amqp => "amqp",
    Mqtt => "mqtt",
    Nats => "nats",
    Redis => "redis",
    Webhook => "webhook",
    Http => "http",
    Db => "db",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    Read,
    Write,
    Readwrite,
}

string_enum!(ResourceMode, "mode", {
    Read => "read",
    Write => "write",
    Readwrite => "readwrite",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Topic,
    Exchange,
    Queue,
    Table,
    Endpoint,
}

string_enum!(ResourceType, "resource type", {
    Topic => "topic",
    Exchange => "exchange",
    Queue => "queue",
    Table => "table",
    Endpoint => "endpoint",
});

/// Whether an app publishes or consumes a message through a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sends,
    Receives,
}

string_enum!(Direction, "direction", {
    Sends => "sends",
    Receives => "receives",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Deleted,
}

string_enum!(EntityStatus, "status", {
    Active => "active",
    Deleted => "deleted",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Jsonschema,
}

string_enum!(SchemaType, "schema type", {
    Jsonschema => "jsonschema",
});
