//! Job request payload.
//!
//! The remote endpoint takes a positional `data` array: two file references
//! followed by two string tokens. The order is fixed by the API.

use serde::Serialize;

use crate::config::JobSettings;

/// Metadata tag the API uses to recognise a file reference.
const FILE_DATA_TYPE: &str = "gradio.FileData";

/// A remote file handed to the API by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub path: String,
    pub meta: FileMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    #[serde(rename = "_type")]
    pub kind: &'static str,
}

impl FileRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            path: url.into(),
            meta: FileMeta {
                kind: FILE_DATA_TYPE,
            },
        }
    }
}

/// One positional argument of the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum Arg {
    File(FileRef),
    Token(String),
}

/// Immutable job submission body, identical across attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    image: FileRef,
    video: FileRef,
    model: String,
    tier: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    data: &'a [Arg],
}

impl JobRequest {
    pub fn new(
        image_url: impl Into<String>,
        video_url: impl Into<String>,
        model: impl Into<String>,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            image: FileRef::new(image_url),
            video: FileRef::new(video_url),
            model: model.into(),
            tier: tier.into(),
        }
    }

    pub fn from_settings(job: &JobSettings) -> Self {
        Self::new(&job.image_url, &job.video_url, &job.model, &job.tier)
    }

    pub fn image(&self) -> &FileRef {
        &self.image
    }

    pub fn video(&self) -> &FileRef {
        &self.video
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tier(&self) -> &str {
        &self.tier
    }
}

/// Serializes as the wire body: `{"data": [image, video, model, tier]}`.
impl Serialize for JobRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let args = [
            Arg::File(self.image.clone()),
            Arg::File(self.video.clone()),
            Arg::Token(self.model.clone()),
            Arg::Token(self.tier.clone()),
        ];
        Envelope { data: &args }.serialize(serializer)
    }
}
