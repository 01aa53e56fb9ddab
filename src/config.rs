/// Options applied when an image is loaded, mapped or wrapped from bytes.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Check the CRC-32 footer before accepting the image.
    ///
    /// Costs one pass over the whole image. Structural checks run either way.
    pub verify_checksum: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}
