//! Records carried by Docker's JSON progress streams.
//!
//! Every field is optional and unknown fields are ignored: the engine omits
//! most keys on most messages and adds new ones between API versions.

#![deny(missing_docs)]

use std::{collections::HashMap, fmt::Debug};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Progress counters attached to download, extract and upload messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressDetail {
    /// Bytes transferred so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    /// Total bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

/// Structured error reported in place of further progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    /// Engine error code, when one is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Human-readable error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Auxiliary payload of a build message; carries the built image ID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageId {
    /// Image ID, `sha256:` prefixed.
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One message from `POST /build`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildInfo {
    /// Layer or step the message refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Build output text. Older engines capitalise the key.
    #[serde(alias = "Stream", skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    /// Error text; no further progress follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured form of `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    /// Status line, such as `Downloading` or `Pull complete`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Rendered progress bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    /// Progress counters behind `progress`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_detail: Option<ProgressDetail>,
    /// Auxiliary payload; the final message carries the built image ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Option<ImageId>,
}

/// One message from `POST /images/create` (pull or import).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateImageInfo {
    /// Layer ID, or the tag being pulled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Error text; no further progress follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured form of `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    /// Status line, such as `Downloading` or `Pull complete`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Rendered progress bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    /// Progress counters behind `progress`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_detail: Option<ProgressDetail>,
}

/// One message from `POST /images/{name}/push`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushImageInfo {
    /// Error text; no further progress follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured form of `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    /// Status line, such as `Downloading` or `Pull complete`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Rendered progress bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    /// Progress counters behind `progress`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_detail: Option<ProgressDetail>,
}

/// The object an event refers to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventActor {
    /// ID of the object, such as a container ID.
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Object attributes, such as `name` and `image`.
    #[serde(rename = "Attributes", skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

/// One message from `GET /events`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMessage {
    /// Object class: `container`, `image`, `network`, `volume` and so on.
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// What happened: `create`, `start`, `die` and so on.
    #[serde(rename = "Action", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// The object the event refers to.
    #[serde(rename = "Actor", skip_serializing_if = "Option::is_none")]
    pub actor: Option<EventActor>,
    /// `local` or `swarm`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Unix timestamp, seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Unix timestamp, nanoseconds.
    #[serde(rename = "timeNano", skip_serializing_if = "Option::is_none")]
    pub time_nano: Option<i64>,
    // Pre-1.22 fields, still sent for containers.
    /// Legacy action field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Legacy actor ID field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Legacy image field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Which record type a JSON endpoint produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// [`BuildInfo`] from `POST /build`.
    Build,
    /// [`CreateImageInfo`] from `POST /images/create`.
    CreateImage,
    /// [`PushImageInfo`] from `POST /images/{name}/push`.
    Push,
    /// [`EventMessage`] from `GET /events`.
    Event,
}

impl RecordKind {
    /// Name of the record type for this kind.
    #[must_use]
    pub fn record_name(self) -> &'static str {
        match self {
            Self::Build => "BuildInfo",
            Self::CreateImage => "CreateImageInfo",
            Self::Push => "PushImageInfo",
            Self::Event => "EventMessage",
        }
    }
}

/// A record type decoded from a JSON progress stream.
pub trait Record: DeserializeOwned + Serialize + Debug + Send + 'static {
    /// The endpoint family producing this record.
    const KIND: RecordKind;
}

impl Record for BuildInfo {
    const KIND: RecordKind = RecordKind::Build;
}

impl Record for CreateImageInfo {
    const KIND: RecordKind = RecordKind::CreateImage;
}

impl Record for PushImageInfo {
    const KIND: RecordKind = RecordKind::Push;
}

impl Record for EventMessage {
    const KIND: RecordKind = RecordKind::Event;
}
