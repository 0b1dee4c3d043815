use serde::Serialize;

/// Substring that marks a rejected input, matched case-insensitively
pub const FAILURE_MARKER: &str = "try again";

/// Result of checking the output of one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Continue,
    Found,
    Avoid,
}

/// Classifies states by the bytes they have written to stdout.
///
/// Failure markers are always checked before the success marker, so a
/// state whose output contains both is avoided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oracle {
    success: Vec<u8>,
    failures: Vec<Vec<u8>>,
}

impl Oracle {
    /// Oracle with the default failure marker
    pub fn new(success: &[u8]) -> Self {
        Oracle {
            success: success.to_owned(),
            failures: vec![FAILURE_MARKER.as_bytes().to_owned()],
        }
    }

    /// Oracle with a custom set of failure markers (possibly empty)
    pub fn with_failures(success: &[u8], failures: &[&[u8]]) -> Self {
        Oracle {
            success: success.to_owned(),
            failures: failures.iter().map(|f| f.to_ascii_lowercase()).collect(),
        }
    }

    pub fn success(&self) -> &[u8] {
        &self.success
    }

    pub fn classify(&self, output: &[u8]) -> Verdict {
        if !self.failures.is_empty() {
            let lowered = output.to_ascii_lowercase();
            if self.failures.iter().any(|f| contains(&lowered, f)) {
                return Verdict::Avoid;
            }
        }

        if contains(output, &self.success) {
            Verdict::Found
        } else {
            Verdict::Continue
        }
    }
}

/// naive substring search, outputs are short
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
