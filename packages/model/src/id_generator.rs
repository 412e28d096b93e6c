use std::collections::HashSet;

use crc32fast::Hasher;

/// Derive a per-session seed from a key and the current time using CRC32
pub fn session_seed(key: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();

    let mut hasher = Hasher::new();
    hasher.update(key.as_bytes());
    hasher.update(&nanos.to_le_bytes());
    format!("{:08x}", hasher.finalize())
}

/// Id generator for sections, columns and blocks within a document
///
/// Ids look like `text-1718000000000-3f9a1c2e-4`: kind, creation time in
/// milliseconds, session seed and a sequential counter. They only need to
/// be unique within one document.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: Option<String>,
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(key: &str) -> Self {
        Self::from_seed(session_seed(key))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            prefix: None,
            seed: seed.into(),
            count: 0,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Generate the next id for the given kind ("section", "text", ...)
    pub fn new_id(&mut self, kind: &str) -> String {
        self.count += 1;
        let millis = chrono::Utc::now().timestamp_millis();

        match &self.prefix {
            Some(prefix) => format!("{}-{}-{}-{}-{}", prefix, kind, millis, self.seed, self.count),
            None => format!("{}-{}-{}-{}", kind, millis, self.seed, self.count),
        }
    }

    /// Generate an id not present in `taken`, and reserve it
    pub fn new_unique_id(&mut self, kind: &str, taken: &mut HashSet<String>) -> String {
        loop {
            let id = self.new_id(kind);
            if taken.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
