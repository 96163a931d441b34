//! Which decoder each streaming endpoint needs.
//!
//! A response is only handed to a frame reader when the engine actually
//! streamed it; error responses carry a plain JSON body instead.

use crate::models::RecordKind;

/// Content type of a raw (TTY) attach or exec stream.
pub const RAW_STREAM_CONTENT_TYPE: &str = "application/vnd.docker.raw-stream";
/// Content type of a multiplexed attach or exec stream.
pub const MULTIPLEXED_STREAM_CONTENT_TYPE: &str = "application/vnd.docker.multiplexed-stream";

/// Docker Engine endpoints with streaming response bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /containers/{id}/attach`
    ContainerAttach,
    /// `GET /containers/{id}/attach/ws`
    ContainerAttachWebsocket,
    /// `POST /exec/{id}/start`
    ExecStart,
    /// `GET /containers/{id}/logs`
    ContainerLogs,
    /// `POST /build`
    ImageBuild,
    /// `POST /images/create`
    ImageCreate,
    /// `POST /images/{name}/push`
    ImagePush,
    /// `GET /events`
    SystemEvents,
}

/// Framing of an endpoint's response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamFormat {
    /// Multiplexed stdout/stderr frames.
    Multiplexed,
    /// Websocket frames wrapping process output.
    WebSocket,
    /// Concatenated JSON records of the given kind.
    Json(RecordKind),
}

impl Endpoint {
    /// Framing used by this endpoint's streamed body.
    #[must_use]
    pub fn stream_format(self) -> StreamFormat {
        match self {
            Self::ContainerAttach | Self::ExecStart | Self::ContainerLogs => {
                StreamFormat::Multiplexed
            }
            Self::ContainerAttachWebsocket => StreamFormat::WebSocket,
            Self::ImageBuild => StreamFormat::Json(RecordKind::Build),
            Self::ImageCreate => StreamFormat::Json(RecordKind::CreateImage),
            Self::ImagePush => StreamFormat::Json(RecordKind::Push),
            Self::SystemEvents => StreamFormat::Json(RecordKind::Event),
        }
    }

    /// Returns true if a response with this status and content type is a
    /// stream to decode.
    ///
    /// ```
    /// use dockerframe::endpoint::{Endpoint, MULTIPLEXED_STREAM_CONTENT_TYPE};
    ///
    /// assert!(Endpoint::ContainerAttach.streams_response(200, Some(MULTIPLEXED_STREAM_CONTENT_TYPE)));
    /// assert!(!Endpoint::ContainerAttach.streams_response(404, Some("application/json")));
    /// ```
    #[must_use]
    pub fn streams_response(self, status: u16, content_type: Option<&str>) -> bool {
        match self {
            Self::ContainerAttach | Self::ExecStart => {
                status == 200 && content_type.is_some_and(is_stream_content_type)
            }
            Self::ContainerAttachWebsocket => status == 101,
            Self::ContainerLogs
            | Self::ImageBuild
            | Self::ImageCreate
            | Self::ImagePush
            | Self::SystemEvents => status == 200,
        }
    }
}

fn is_stream_content_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    media_type.eq_ignore_ascii_case(RAW_STREAM_CONTENT_TYPE)
        || media_type.eq_ignore_ascii_case(MULTIPLEXED_STREAM_CONTENT_TYPE)
}
