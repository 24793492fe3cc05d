use serde::Deserialize;

/// `?filter=` parameter on listing endpoints; the handlers map the named
/// filter to the status sets each actor cares about.
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub filter: Option<String>,
}

impl StatusFilter {
    pub fn name(&self) -> &str {
        self.filter.as_deref().unwrap_or("all")
    }
}

#[derive(Debug, Deserialize)]
pub struct Reason {
    pub reason: Option<String>,
}
