//! Page templates and form bodies.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use serde::Deserialize;

use crate::pipeline::Artifact;
use crate::progress::ProgressSnapshot;

/// Body of `POST /generate`.
#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    pub(crate) message: String,
}

/// The home page: form, progress, and the current artifact if there is one.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) progress: ProgressSnapshot,
    pub(crate) artifact: Option<Arc<Artifact>>,
    /// Reload interval used while `progress` is active
    pub(crate) refresh_seconds: u32,
}
