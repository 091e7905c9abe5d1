use emissions_core::{Metric, ScaleScope};
use serde::Deserialize;

/// Query accepted by `/` and `/map.json`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ViewQuery {
    pub(crate) metric: Option<Metric>,
    pub(crate) scope: Option<ScaleScope>,
}

/// Query accepted by `/upload`; the body carries the file itself.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadQuery {
    /// Original file name, used to infer archive vs spreadsheet.
    pub(crate) name: Option<String>,
    pub(crate) metric: Option<Metric>,
    pub(crate) scope: Option<ScaleScope>,
}
