//! The unit handed to uploaders.

use crate::id::BatchId;

/// One batch file's contents, wrapped for delivery.
///
/// The payload is opaque to the queue. For the default wire format it is a
/// JSON array of the fragments written into the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: BatchId,
    payload: Vec<u8>,
}

impl Batch {
    pub fn new(id: BatchId, payload: Vec<u8>) -> Self {
        Batch { id, payload }
    }

    /// Identifier to pass back to `drop_batch` once the upload is acknowledged.
    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// True when the batch carries no bytes at all (read failure).
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn into_parts(self) -> (BatchId, Vec<u8>) {
        (self.id, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_accessors() {
        let batch = Batch::new(BatchId::from_millis(42), b"[1,2]".to_vec());
        assert_eq!(batch.id(), BatchId::from_millis(42));
        assert_eq!(batch.payload(), b"[1,2]");
        assert_eq!(batch.len(), 5);
        assert!(!batch.is_empty());

        let (id, payload) = batch.into_parts();
        assert_eq!(id.to_string(), "42");
        assert_eq!(payload, b"[1,2]".to_vec());
    }

    #[test]
    fn test_empty_batch() {
        let batch = Batch::new(BatchId::from_millis(1), Vec::new());
        assert!(batch.is_empty());
    }
}
