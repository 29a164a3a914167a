//! Temporal action detector orchestrating the single-stage pipeline.
//!
//! Overview
//! - Generates per-position anchor points over the feature pyramid from the
//!   configured strides and regression ranges.
//! - At training time, assigns each point a classification target (center
//!   sampling plus per-level range restriction, shortest-duration tie-break)
//!   and a stride-normalized regression target, then reduces a batch of head
//!   outputs to focal classification and DIoU regression losses divided by a
//!   shared EMA positive-count normalizer.
//! - At inference time, scores every `(position, class)` pair, keeps the
//!   top candidates per level, decodes boundary offsets (directly or via the
//!   Trident boundary-distribution expectation), suppresses overlaps with
//!   hard or soft NMS plus score voting, and converts the survivors to
//!   second-based timestamps.
//!
//! Modules
//! - [`params`] – configuration types used by the detector and CLI.
//! - `pipeline` – the main [`ActionDetector`] implementation.
//! - [`postprocess`] – feature-grid to seconds conversion.
//!
//! Key Ideas
//! - A single canonical point index, shared verbatim by assignment and
//!   decoding, keeps training and inference aligned per position.
//! - Offset decoding is one code path for both phases, so losses are
//!   computed on exactly the quantities inference would produce.
//! - The loss normalizer is explicit state owned by the caller; every
//!   training step consumes one value and returns the next.

pub mod params;
mod pipeline;
pub mod postprocess;

pub use params::{
    CenterSampling, DetectorParams, ParamError, TestParams, TrainParams, TridentParams,
};
pub use pipeline::ActionDetector;
pub use postprocess::{grid_to_seconds, to_seconds};
