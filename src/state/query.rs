//! Natural-language query form.

/// Queries offered as one-click examples.
pub const SAMPLE_QUERIES: [&str; 4] = [
    "What is the flood vulnerability in Miami-Dade County?",
    "Show building damage from Hurricane Ian in Lee County",
    "Analyze social vulnerability in New Orleans census tracts",
    "Power infrastructure impact in Puerto Rico after Maria",
];

#[derive(Debug, Default)]
pub struct QueryState {
    /// Text currently in the input box
    pub text: String,
    /// Query waiting to be sent by the update loop
    pending: Option<String>,
}

impl QueryState {
    /// Queues the typed query. Blank input is ignored.
    pub fn submit(&mut self) -> bool {
        let query = self.text.trim();
        if query.is_empty() {
            return false;
        }
        self.pending = Some(query.to_string());
        true
    }

    /// Fills the input with a sample query and queues it.
    pub fn submit_sample(&mut self, sample: &str) {
        self.text = sample.to_string();
        self.pending = Some(sample.to_string());
    }

    /// Takes the queued query, if any.
    pub fn take_submission(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
